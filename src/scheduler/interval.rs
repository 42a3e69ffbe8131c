use std::time::Duration;

use crate::config::ConfigError;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Fractional digits beyond this cannot change a nanosecond count
const MAX_FRACTION_DIGITS: usize = 18;

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3_600 * NANOS_PER_SEC),
        _ => None,
    }
}

/// Parses a duration written the way `agg` takes it: `30s`, `1m`, `1h30m`,
/// `1.5h`, `500ms`.
///
/// Every number needs a unit (`ns`, `us`/`µs`, `ms`, `s`, `m`, `h`) and
/// components may be chained. The result must be positive.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use gator::scheduler::parse_interval;
///
/// assert_eq!(parse_interval("1h30m").unwrap(), Duration::from_secs(5400));
/// assert_eq!(parse_interval("1.5s").unwrap(), Duration::from_millis(1500));
/// assert!(parse_interval("10").is_err());
/// assert!(parse_interval("0s").is_err());
/// ```
pub fn parse_interval(input: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason| ConfigError::InvalidInterval {
        input: input.to_owned(),
        reason,
    };

    let mut rest = input.trim();
    if rest.is_empty() {
        return Err(invalid("empty duration"));
    }
    if rest.starts_with('-') {
        return Err(invalid("interval must be positive"));
    }
    if let Some(unsigned) = rest.strip_prefix('+') {
        rest = unsigned;
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("expected a number"));
        }
        if fraction.contains('.') {
            return Err(invalid("malformed number"));
        }

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);
        if unit.is_empty() {
            return Err(invalid("missing unit"));
        }
        let scale = unit_nanos(unit).ok_or_else(|| invalid("unknown unit"))?;

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("duration out of range"))?
        };
        let mut nanos = whole
            .checked_mul(scale)
            .ok_or_else(|| invalid("duration out of range"))?;

        let fraction = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
        if !fraction.is_empty() {
            // Both parts are ASCII digits here, so the parse cannot fail
            let digits: u128 = fraction.parse().unwrap_or(0);
            let divisor = 10u128.pow(fraction.len() as u32);
            nanos = nanos
                .checked_add(digits * scale / divisor)
                .ok_or_else(|| invalid("duration out of range"))?;
        }

        total = total
            .checked_add(nanos)
            .ok_or_else(|| invalid("duration out of range"))?;
        rest = next;
    }

    if total == 0 {
        return Err(invalid("interval must be positive"));
    }

    let nanos = u64::try_from(total).map_err(|_| invalid("duration out of range"))?;
    Ok(Duration::from_nanos(nanos))
}
