use std::fmt;
use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;
const NANOS_PER_MILLI: u128 = 1_000_000;

/// Parse a segment length such as `500ms`, `0.5s` or a bare `0.5` (seconds).
///
/// # Grammar
///
/// ```text
/// duration = number whitespace* [ unit ] ;
/// number   = digits [ "." digits ] ;
/// unit     = "ms" | "s" ;
/// ```
///
/// The value must be representable in whole nanoseconds and greater than zero.
/// Range checks beyond that belong to the caller.
pub fn parse_duration(value: &str) -> Result<Duration, DurationParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let unit_nanos = match unit.trim_start() {
        "" | "s" => NANOS_PER_SEC,
        "ms" => NANOS_PER_MILLI,
        other => return Err(DurationParseError::UnknownUnit(other.to_string())),
    };

    let (mantissa, scale) = parse_number(number)?;
    let product = mantissa
        .checked_mul(unit_nanos)
        .ok_or(DurationParseError::TooLarge)?;
    let pow10 = 10u128
        .checked_pow(scale)
        .ok_or(DurationParseError::TooPrecise)?;
    if product % pow10 != 0 {
        return Err(DurationParseError::TooPrecise);
    }

    let nanos = product / pow10;
    if nanos == 0 {
        return Err(DurationParseError::Zero);
    }
    let secs = u64::try_from(nanos / NANOS_PER_SEC).map_err(|_| DurationParseError::TooLarge)?;

    Ok(Duration::new(secs, (nanos % NANOS_PER_SEC) as u32))
}

/// Split `number` into an integer mantissa and its count of fractional digits.
fn parse_number(number: &str) -> Result<(u128, u32), DurationParseError> {
    let (whole, fraction) = match number.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (number, ""),
    };
    if whole.is_empty() {
        return Err(DurationParseError::ExpectedNumber);
    }
    if number.ends_with('.') {
        return Err(DurationParseError::MissingFractionDigits);
    }
    if fraction.contains('.') {
        return Err(DurationParseError::UnexpectedChar('.'));
    }

    let mantissa = format!("{whole}{fraction}")
        .parse::<u128>()
        .map_err(|_| DurationParseError::TooLarge)?;
    Ok((mantissa, fraction.len() as u32))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationParseError {
    Empty,
    ExpectedNumber,
    UnknownUnit(String),
    MissingFractionDigits,
    UnexpectedChar(char),
    TooPrecise,
    Zero,
    TooLarge,
}

impl std::error::Error for DurationParseError {}

impl fmt::Display for DurationParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationParseError::Empty => write!(f, "duration cannot be empty"),
            DurationParseError::ExpectedNumber => {
                write!(f, "duration must start with a number")
            }
            DurationParseError::UnknownUnit(unit) => {
                write!(f, "unknown unit '{unit}', expected 'ms' or 's'")
            }
            DurationParseError::MissingFractionDigits => {
                write!(f, "expected digits after the decimal point")
            }
            DurationParseError::UnexpectedChar(ch) => write!(f, "unexpected character '{ch}'"),
            DurationParseError::TooPrecise => {
                write!(f, "duration is more precise than one nanosecond")
            }
            DurationParseError::Zero => write!(f, "duration must be greater than zero"),
            DurationParseError::TooLarge => write!(f, "duration is too large"),
        }
    }
}
