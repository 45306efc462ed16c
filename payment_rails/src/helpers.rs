use spg_common::Pence;

use crate::RailApiError;

/// PayPal expresses money as decimal strings, e.g. "510.00".
pub fn parse_decimal_price(price: &str) -> Result<Pence, RailApiError> {
    let mut parts = price.split('.');
    let pounds = parts
        .next()
        .ok_or_else(|| RailApiError::InvalidCurrencyAmount(price.to_string()))?
        .parse::<i64>()
        .map_err(|e| RailApiError::InvalidCurrencyAmount(format!("Invalid price value: {price}. {e}.")))?;
    let pence = match parts.next() {
        None => 0,
        // "510.5" means 50p, not 5p
        Some(frac) if frac.len() <= 2 => {
            let v = frac
                .parse::<i64>()
                .map_err(|e| RailApiError::InvalidCurrencyAmount(format!("Invalid price value: {price}. {e}.")))?;
            if frac.len() == 1 {
                v * 10
            } else {
                v
            }
        },
        Some(_) => return Err(RailApiError::InvalidCurrencyAmount(format!("Sub-penny price: {price}"))),
    };
    Ok(Pence::from(100 * pounds + pence))
}

pub fn to_decimal_price(p: Pence) -> String {
    let v = p.value();
    format!("{}.{:02}", v / 100, v % 100)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decimal_strings_round_trip() {
        assert_eq!(parse_decimal_price("510.00").unwrap(), Pence::from(51_000));
        assert_eq!(parse_decimal_price("0.99").unwrap(), Pence::from(99));
        assert_eq!(parse_decimal_price("12.5").unwrap(), Pence::from(1_250));
        assert_eq!(parse_decimal_price("12").unwrap(), Pence::from(1_200));
        assert_eq!(to_decimal_price(Pence::from(51_000)), "510.00");
        assert_eq!(to_decimal_price(Pence::from(99)), "0.99");
        assert_eq!(to_decimal_price(Pence::from(1_205)), "12.05");
    }

    #[test]
    fn junk_prices_are_rejected(){
        assert!(parse_decimal_price("ten quid").is_err());
        assert!(parse_decimal_price("12.345").is_err());
        assert!(parse_decimal_price("").is_err());
    }
}
