use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use payment_rails::RailApiError;
use storefront_payment_engine::traits::{CommerceError, ExchangeRateError, OrderApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("Unauthorized. {0}")]
    Unauthorized(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request conflicts with the order's current state. {0}")]
    StateConflict(String),
    #[error("The payment rail could not complete the request. {0}")]
    RailUnavailable(String),
    #[error("The payment could not be accepted. {0}")]
    PaymentRejected(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::StateConflict(_) => StatusCode::BAD_REQUEST,
            Self::PaymentRejected(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::RailUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<CommerceError> for ServerError {
    fn from(e: CommerceError) -> Self {
        match e {
            CommerceError::OrderNotFound(_) |
            CommerceError::PaymentNotFound(_) |
            CommerceError::PaymentMissingForOrder(_) => Self::NoRecordFound(e.to_string()),
            CommerceError::DatabaseError(_) | CommerceError::QueryError(_) => Self::BackendError(e.to_string()),
            CommerceError::PricingError(_) |
            CommerceError::PaymentAmountMismatch { .. } |
            CommerceError::StockRaceLost { .. } |
            CommerceError::OrderNumberExhausted(_) => Self::InvalidRequestBody(e.to_string()),
            CommerceError::RefundNotEligible(_) |
            CommerceError::OverRefund { .. } |
            CommerceError::NonPositiveRefund(_) |
            CommerceError::MissingRefundReason |
            CommerceError::StatusChangeForbidden { .. } |
            CommerceError::StatusChangeNoOp(_) |
            CommerceError::PaymentNotReissuable(_) => Self::StateConflict(e.to_string()),
        }
    }
}

impl From<OrderApiError> for ServerError {
    fn from(e: OrderApiError) -> Self {
        Self::BackendError(e.to_string())
    }
}

impl From<ExchangeRateError> for ServerError {
    fn from(e: ExchangeRateError) -> Self {
        match e {
            ExchangeRateError::RateDoesNotExist(c) => {
                Self::StateConflict(format!("No exchange rate has been posted for {c}"))
            },
            ExchangeRateError::DatabaseError(e) => Self::BackendError(e),
        }
    }
}

impl From<RailApiError> for ServerError {
    fn from(e: RailApiError) -> Self {
        match e {
            RailApiError::PaymentNotCompleted(_) | RailApiError::AmountMismatch { .. } => {
                Self::PaymentRejected(e.to_string())
            },
            RailApiError::InvalidCurrencyAmount(_) => Self::InvalidRequestBody(e.to_string()),
            _ => Self::RailUnavailable(e.to_string()),
        }
    }
}
