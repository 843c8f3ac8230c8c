use std::fmt;
use std::time::Duration;

/// Parse an offset such as `2`, `2s`, `1500ms`, `1m30s` or `0.5s`.
///
/// # Grammar
///
/// ```text
/// offset    = seconds | component ( separators component )* ;
/// seconds   = digits ;
/// component = number separators? unit ;
/// number    = digits [ "." digits ] ;
/// unit      = "ms" | "s" | "m" | "h" ;
/// separators = { whitespace | "_" } ;
/// ```
///
/// A bare integer counts whole seconds. Each unit may appear at most once.
/// Fractions may not be finer than one nanosecond, and zero is rejected.
pub fn parse_duration(value: &str) -> Result<Duration, DurationParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DurationParseError::Empty);
    }

    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let seconds = trimmed
            .parse::<u64>()
            .map_err(|_| DurationParseError::TooLarge)?;
        return if seconds == 0 {
            Err(DurationParseError::Zero)
        } else {
            Ok(Duration::from_secs(seconds))
        };
    }

    if let Some((index, found)) = trimmed.char_indices().find(|(_, c)| !c.is_ascii()) {
        return Err(DurationParseError::UnexpectedChar { index, found });
    }

    let bytes = trimmed.as_bytes();
    let mut index = 0usize;
    let mut seen = [false; Unit::COUNT];
    let mut total_nanos: u128 = 0;

    while index < bytes.len() {
        let (mantissa, scale, consumed) = parse_number(bytes, index)?;
        index += consumed;
        skip_separators(bytes, &mut index);

        let (unit, consumed) = parse_unit(trimmed, index)?;
        index += consumed;
        skip_separators(bytes, &mut index);

        if std::mem::replace(&mut seen[unit as usize], true) {
            return Err(DurationParseError::DuplicateUnit { unit });
        }

        let divisor = 10u128
            .checked_pow(scale)
            .ok_or(DurationParseError::FractionTooPrecise { unit })?;
        let product = mantissa
            .checked_mul(unit.nanos())
            .ok_or(DurationParseError::TooLarge)?;
        if product % divisor != 0 {
            return Err(DurationParseError::FractionTooPrecise { unit });
        }

        total_nanos = total_nanos
            .checked_add(product / divisor)
            .ok_or(DurationParseError::TooLarge)?;
    }

    if total_nanos == 0 {
        return Err(DurationParseError::Zero);
    }

    let secs =
        u64::try_from(total_nanos / 1_000_000_000).map_err(|_| DurationParseError::TooLarge)?;
    Ok(Duration::new(secs, (total_nanos % 1_000_000_000) as u32))
}

fn parse_number(bytes: &[u8], start: usize) -> Result<(u128, u32, usize), DurationParseError> {
    let mut index = start;
    let mut mantissa: u128 = 0;
    let mut scale: u32 = 0;
    let mut decimal_at = None;

    while let Some(&byte) = bytes.get(index) {
        match byte {
            b'0'..=b'9' => {
                mantissa = mantissa
                    .checked_mul(10)
                    .and_then(|m| m.checked_add(u128::from(byte - b'0')))
                    .ok_or(DurationParseError::TooLarge)?;
                if decimal_at.is_some() {
                    scale += 1;
                }
            }
            b'.' if decimal_at.is_none() && index > start => decimal_at = Some(index),
            b'.' => return Err(DurationParseError::UnexpectedChar { index, found: '.' }),
            _ => break,
        }
        index += 1;
    }

    if index == start {
        return Err(DurationParseError::ExpectedNumber {
            index,
            found: bytes.get(index).map(|&b| b as char),
        });
    }
    if let (Some(dot), 0) = (decimal_at, scale) {
        return Err(DurationParseError::MissingFractionDigits { index: dot });
    }

    Ok((mantissa, scale, index - start))
}

fn parse_unit(input: &str, index: usize) -> Result<(Unit, usize), DurationParseError> {
    let rest = &input[index..];
    let word_len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .count();

    match &rest[..word_len] {
        "ms" => Ok((Unit::Millisecond, 2)),
        "s" => Ok((Unit::Second, 1)),
        "m" => Ok((Unit::Minute, 1)),
        "h" => Ok((Unit::Hour, 1)),
        "" => Err(DurationParseError::ExpectedUnit {
            index,
            found: rest.chars().next(),
        }),
        other => Err(DurationParseError::UnknownUnit {
            index,
            found: other.to_owned(),
        }),
    }
}

fn skip_separators(bytes: &[u8], index: &mut usize) {
    while bytes
        .get(*index)
        .is_some_and(|b| *b == b'_' || b.is_ascii_whitespace())
    {
        *index += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationParseError {
    Empty,
    ExpectedNumber { index: usize, found: Option<char> },
    ExpectedUnit { index: usize, found: Option<char> },
    UnknownUnit { index: usize, found: String },
    DuplicateUnit { unit: Unit },
    MissingFractionDigits { index: usize },
    FractionTooPrecise { unit: Unit },
    UnexpectedChar { index: usize, found: char },
    Zero,
    TooLarge,
}

impl std::error::Error for DurationParseError {}

impl fmt::Display for DurationParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationParseError::Empty => write!(f, "offset cannot be empty"),
            DurationParseError::ExpectedNumber { index, found } => match found {
                Some(ch) => write!(f, "expected a number at position {} but found '{ch}'", index + 1),
                None => write!(f, "expected a number at position {}", index + 1),
            },
            DurationParseError::ExpectedUnit { index, found } => match found {
                Some(ch) => write!(f, "expected a unit at position {} but found '{ch}'", index + 1),
                None => write!(f, "expected a unit at position {}", index + 1),
            },
            DurationParseError::UnknownUnit { index, found } => {
                write!(f, "unknown unit '{found}' at position {}", index + 1)
            }
            DurationParseError::DuplicateUnit { unit } => {
                write!(f, "unit '{}' appears more than once", unit.symbol())
            }
            DurationParseError::MissingFractionDigits { index } => write!(
                f,
                "expected digits after decimal point at position {}",
                index + 1
            ),
            DurationParseError::FractionTooPrecise { unit } => write!(
                f,
                "fraction of '{}' is finer than one nanosecond",
                unit.symbol()
            ),
            DurationParseError::UnexpectedChar { index, found } => write!(
                f,
                "unexpected character '{found}' at position {}",
                index + 1
            ),
            DurationParseError::Zero => write!(f, "offset must be greater than zero"),
            DurationParseError::TooLarge => write!(f, "offset is too large"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Unit {
    Millisecond,
    Second,
    Minute,
    Hour,
}

impl Unit {
    const COUNT: usize = 4;

    fn nanos(self) -> u128 {
        match self {
            Unit::Millisecond => 1_000_000,
            Unit::Second => 1_000_000_000,
            Unit::Minute => 60 * 1_000_000_000,
            Unit::Hour => 3_600 * 1_000_000_000,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Unit::Millisecond => "ms",
            Unit::Second => "s",
            Unit::Minute => "m",
            Unit::Hour => "h",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_duration(input: &str, expected: Duration) {
        let actual = parse_duration(input).unwrap();
        assert_eq!(actual, expected, "input: {input}");
    }

    #[test]
    fn bare_integers_are_seconds() {
        assert_duration("2", Duration::from_secs(2));
        assert_duration(" 15 ", Duration::from_secs(15));
    }

    #[test]
    fn parses_unit_components() {
        assert_duration("500ms", Duration::from_millis(500));
        assert_duration("30s", Duration::from_secs(30));
        assert_duration("1m30s", Duration::from_secs(90));
        assert_duration("1h 2m_3s", Duration::from_secs(3_723));
        assert_duration("2 s", Duration::from_secs(2));
    }

    #[test]
    fn parses_fractional_components() {
        assert_duration("0.5s", Duration::from_millis(500));
        assert_duration("1.25m", Duration::from_secs(75));
        assert_duration("0.000001ms", Duration::from_nanos(1));
    }

    #[test]
    fn rejects_zero_and_empty() {
        assert_eq!(parse_duration("0"), Err(DurationParseError::Zero));
        assert_eq!(parse_duration("0ms"), Err(DurationParseError::Zero));
        assert_eq!(parse_duration("   "), Err(DurationParseError::Empty));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            parse_duration("two"),
            Err(DurationParseError::ExpectedNumber { .. })
        ));
        assert!(matches!(
            parse_duration("5x"),
            Err(DurationParseError::UnknownUnit { .. })
        ));
        assert!(matches!(
            parse_duration("10S"),
            Err(DurationParseError::UnknownUnit { .. })
        ));
        assert!(matches!(
            parse_duration("1s 30"),
            Err(DurationParseError::ExpectedUnit { .. })
        ));
        assert!(matches!(
            parse_duration("1.s"),
            Err(DurationParseError::MissingFractionDigits { .. })
        ));
        assert!(matches!(
            parse_duration("-2s"),
            Err(DurationParseError::ExpectedNumber { .. })
        ));
    }

    #[test]
    fn rejects_repeated_units() {
        assert_eq!(
            parse_duration("1s2s"),
            Err(DurationParseError::DuplicateUnit { unit: Unit::Second })
        );
    }

    #[test]
    fn rejects_sub_nanosecond_fractions() {
        assert_eq!(
            parse_duration("0.0000001ms"),
            Err(DurationParseError::FractionTooPrecise {
                unit: Unit::Millisecond
            })
        );
    }

    #[test]
    fn detects_overflow() {
        assert_eq!(
            parse_duration("99999999999999999999999"),
            Err(DurationParseError::TooLarge)
        );
    }
}
