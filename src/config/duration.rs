// src/config/duration.rs

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,

    #[error("'{0}' has no amount; write e.g. 30s")]
    MissingAmount(String),

    #[error("'{0}' has no unit; expected ms, s, m or h")]
    MissingUnit(String),

    #[error("unknown unit '{0}'; expected ms, s, m or h")]
    UnknownUnit(String),

    #[error("'{0}' is out of range")]
    Overflow(String),

    #[error("a timeout must be longer than zero")]
    Zero,
}

/// Parse a timeout such as `"250ms"`, `"30s"`, `"2m"` or `"1h"`.
pub fn parse_duration(raw: &str) -> Result<Duration, DurationError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(DurationError::Empty);
    }

    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| DurationError::MissingUnit(text.to_string()))?;
    let (amount, unit) = text.split_at(split);
    if amount.is_empty() {
        return Err(DurationError::MissingAmount(text.to_string()));
    }

    let amount: u64 = amount
        .parse()
        .map_err(|_| DurationError::Overflow(text.to_string()))?;
    let seconds_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "ms" => return non_zero(Duration::from_millis(amount)),
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        other => return Err(DurationError::UnknownUnit(other.to_string())),
    };

    let seconds = amount
        .checked_mul(seconds_per_unit)
        .ok_or_else(|| DurationError::Overflow(text.to_string()))?;
    non_zero(Duration::from_secs(seconds))
}

fn non_zero(duration: Duration) -> Result<Duration, DurationError> {
    if duration.is_zero() {
        Err(DurationError::Zero)
    } else {
        Ok(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration(" 3s "), Ok(Duration::from_secs(3)));
        assert_eq!(parse_duration("2M"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_duration(""), Err(DurationError::Empty));
        assert_eq!(
            parse_duration("30"),
            Err(DurationError::MissingUnit("30".into()))
        );
        assert_eq!(
            parse_duration("s"),
            Err(DurationError::MissingAmount("s".into()))
        );
        assert_eq!(
            parse_duration("5d"),
            Err(DurationError::UnknownUnit("d".into()))
        );
        assert_eq!(parse_duration("0s"), Err(DurationError::Zero));
        assert!(matches!(
            parse_duration("99999999999999999999h"),
            Err(DurationError::Overflow(_))
        ));
    }
}
