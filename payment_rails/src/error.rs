use thiserror::Error;

#[derive(Debug, Error)]
pub enum RailApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("RPC call failed. Code {code}. {message}")]
    RpcError { code: i64, message: String },
    #[error("Invalid currency amount: {0}")]
    InvalidCurrencyAmount(String),
    #[error("The capture did not complete: {0}")]
    PaymentNotCompleted(String),
    #[error("The rail reports an amount of {actual}, but {expected} was expected")]
    AmountMismatch { expected: String, actual: String },
}
