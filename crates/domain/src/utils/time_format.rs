//! Canonical wire encodings for durations and timestamps
//!
//! Both encodings are independent of the host locale and timezone:
//! - durations are `HH:MM:SS.mmm`, hours unbounded (never wrapped at 24)
//! - timestamps are UTC wall-clock values rendered through one configured
//!   pattern with millisecond precision and no offset suffix

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::errors::{CodetrailError, DecodeError};

/// Pattern used when no explicit timestamp format is configured.
pub const DEFAULT_TIMESTAMP_PATTERN: &str = "%Y-%m-%dT%H:%M:%S%.3f";

const DECODE_SECONDS_PATTERN: &str = "%Y-%m-%dT%H:%M:%S";

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;

/// Format a duration as `HH:MM:SS.mmm`.
///
/// The canonical encoding carries no sign; negative spans encode as zero.
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use codetrail_domain::utils::time_format::format_duration;
///
/// assert_eq!(format_duration(Duration::milliseconds(3_723_004)), "01:02:03.004");
/// assert_eq!(format_duration(Duration::hours(30)), "30:00:00.000");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_milliseconds().max(0);
    clock_string(total)
}

/// Format a duration for human display, prefixing `-` for negative spans.
///
/// Used by the tracking console only; the wire never sees a sign.
pub fn format_signed_duration(duration: Duration) -> String {
    let millis = duration.num_milliseconds();
    let sign = if millis < 0 { "-" } else { "" };
    format!("{sign}{}", clock_string(millis.saturating_abs()))
}

fn clock_string(total_millis: i64) -> String {
    let hours = total_millis / MILLIS_PER_HOUR;
    let minutes = (total_millis / MILLIS_PER_MINUTE) % 60;
    let seconds = (total_millis / MILLIS_PER_SECOND) % 60;
    let millis = total_millis % MILLIS_PER_SECOND;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Parse a duration token.
///
/// Accepts the canonical `HH:MM:SS.mmm` form produced by [`format_duration`]
/// and ISO-8601 durations such as `PT1H30M` or `P1DT0.5S`.
///
/// # Errors
/// Returns [`DecodeError::InvalidDuration`] for anything else.
pub fn parse_duration(input: &str) -> Result<Duration, DecodeError> {
    let invalid = || DecodeError::InvalidDuration(input.to_string());

    if input.starts_with(['P', 'p']) {
        return parse_iso_duration(input).ok_or_else(invalid);
    }
    parse_clock_duration(input).ok_or_else(invalid)
}

fn parse_clock_duration(input: &str) -> Option<Duration> {
    let (clock, millis) = input.split_once('.')?;
    let mut parts = clock.split(':');
    let hours = parts.next()?;
    let minutes = parts.next()?;
    let seconds = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    // Hours are zero-padded to two digits and otherwise unpadded.
    if hours.len() < 2 || (hours.len() > 2 && hours.starts_with('0')) {
        return None;
    }
    if minutes.len() != 2 || seconds.len() != 2 || millis.len() != 3 {
        return None;
    }

    let hours = parse_digits(hours)?;
    let minutes = parse_digits(minutes)?;
    let seconds = parse_digits(seconds)?;
    let millis = parse_digits(millis)?;
    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    let total = hours
        .checked_mul(MILLIS_PER_HOUR)?
        .checked_add(minutes * MILLIS_PER_MINUTE + seconds * MILLIS_PER_SECOND + millis)?;
    Duration::try_milliseconds(total)
}

fn parse_iso_duration(input: &str) -> Option<Duration> {
    let body = input.get(1..)?.to_ascii_uppercase();
    let (date_part, time_part) = match body.split_once('T') {
        Some((date, time)) => {
            if time.is_empty() {
                return None;
            }
            (date.to_string(), Some(time.to_string()))
        }
        None => (body, None),
    };

    let mut total = Duration::zero();
    let mut components = 0;

    if !date_part.is_empty() {
        let days = date_part.strip_suffix('D')?;
        total = total.checked_add(&Duration::try_days(parse_digits(days)?)?)?;
        components += 1;
    }

    if let Some(time) = time_part {
        let mut rest = time.as_str();
        for (unit, millis_per_unit) in [('H', MILLIS_PER_HOUR), ('M', MILLIS_PER_MINUTE)] {
            if let Some(index) = rest.find(unit) {
                let value = parse_digits(&rest[..index])?;
                let span = Duration::try_milliseconds(value.checked_mul(millis_per_unit)?)?;
                total = total.checked_add(&span)?;
                rest = &rest[index + 1..];
                components += 1;
            }
        }
        if !rest.is_empty() {
            let seconds = rest.strip_suffix('S')?;
            let (whole, fraction) = seconds.split_once('.').unwrap_or((seconds, ""));
            total = total.checked_add(&Duration::try_seconds(parse_digits(whole)?)?)?;
            if !fraction.is_empty() {
                if fraction.len() > 9 {
                    return None;
                }
                let nanos = parse_digits(fraction)? * 10_i64.pow(9 - fraction.len() as u32);
                total = total.checked_add(&Duration::nanoseconds(nanos))?;
            }
            components += 1;
        }
    }

    (components > 0).then_some(total)
}

fn parse_digits(value: &str) -> Option<i64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Timestamp formatter built once from configuration and shared by every
/// serializer in the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampFormat {
    pattern: String,
}

impl TimestampFormat {
    /// Validate and wrap a strftime-style pattern.
    ///
    /// # Errors
    /// Returns `CodetrailError::Config` when the pattern contains an
    /// unsupported specifier.
    pub fn new(pattern: impl Into<String>) -> Result<Self, CodetrailError> {
        let pattern = pattern.into();
        if pattern.is_empty() || StrftimeItems::new(&pattern).any(|item| item == Item::Error) {
            return Err(CodetrailError::Config(format!("invalid timestamp pattern '{pattern}'")));
        }
        Ok(Self { pattern })
    }

    /// The configured pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Render a timestamp as UTC wall-clock time without an offset suffix.
    pub fn format(&self, timestamp: &DateTime<Utc>) -> String {
        timestamp.naive_utc().format(&self.pattern).to_string()
    }
}

impl Default for TimestampFormat {
    fn default() -> Self {
        Self { pattern: DEFAULT_TIMESTAMP_PATTERN.to_string() }
    }
}

/// Parse a wire timestamp (`yyyy-MM-ddTHH:mm:ss.SSS`, UTC).
///
/// Fractions longer than three digits are truncated to milliseconds by integer
/// division before parsing, and a trailing `Z` is tolerated. Anything else is
/// rejected.
///
/// # Errors
/// Returns [`DecodeError::InvalidTimestamp`] for malformed input.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, DecodeError> {
    let invalid = || DecodeError::InvalidTimestamp(input.to_string());

    let trimmed = input.strip_suffix('Z').unwrap_or(input);
    let (seconds_part, fraction) = trimmed.split_once('.').ok_or_else(invalid)?;
    if fraction.len() < 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let millis = truncate_fraction_to_millis(fraction).ok_or_else(invalid)?;
    let naive = NaiveDateTime::parse_from_str(seconds_part, DECODE_SECONDS_PATTERN)
        .map_err(|_| invalid())?;

    Ok(naive.and_utc() + Duration::milliseconds(millis))
}

fn truncate_fraction_to_millis(fraction: &str) -> Option<i64> {
    // Only the first 18 digits can matter; anything beyond is below
    // nanosecond precision anyway.
    let significant = &fraction[..fraction.len().min(18)];
    let value: i64 = significant.parse().ok()?;
    let divisor = 10_i64.checked_pow(u32::try_from(significant.len() - 3).ok()?)?;
    Some(value / divisor)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn formats_zero_padded_clock() {
        assert_eq!(format_duration(Duration::zero()), "00:00:00.000");
        assert_eq!(format_duration(Duration::milliseconds(59_999)), "00:00:59.999");
        assert_eq!(format_duration(Duration::minutes(61)), "01:01:00.000");
    }

    #[test]
    fn hours_are_not_wrapped_at_a_day() {
        assert_eq!(format_duration(Duration::hours(100) + Duration::seconds(1)), "100:00:01.000");
    }

    #[test]
    fn negative_durations_have_no_sign_on_the_wire() {
        assert_eq!(format_duration(Duration::seconds(-5)), "00:00:00.000");
        assert_eq!(format_signed_duration(Duration::milliseconds(-5_250)), "-00:00:05.250");
        assert_eq!(format_signed_duration(Duration::seconds(5)), "00:00:05.000");
    }

    #[test]
    fn canonical_strings_round_trip() {
        for token in ["00:00:00.000", "01:02:03.004", "23:59:59.999", "24:00:00.000", "123:45:06.789"] {
            let parsed = parse_duration(token).unwrap();
            assert_eq!(format_duration(parsed), token);
        }
    }

    #[test]
    fn iso_durations_are_accepted() {
        assert_eq!(parse_duration("PT1H30M").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration("PT0.5S").unwrap(), Duration::milliseconds(500));
        assert_eq!(parse_duration("P1DT2S").unwrap(), Duration::days(1) + Duration::seconds(2));
        assert_eq!(parse_duration("pt10m").unwrap(), Duration::minutes(10));
    }

    #[test]
    fn garbage_durations_are_rejected() {
        for token in [
            "",
            "garbage",
            "1:00:00.000",
            "001:00:00.000",
            "00:60:00.000",
            "00:00:60.000",
            "00:00:00",
            "00:00:00.00",
            "00:00:00.0000",
            "-01:00:00.000",
            "aa:bb:cc.ddd",
            "P",
            "PT",
            "PT5X",
            "PTS",
            "P99999999999999D",
            "PT9999999999999999S",
            "PT9223372036854775807H",
            "P100000000000DT1000000000H",
        ] {
            assert_eq!(
                parse_duration(token),
                Err(DecodeError::InvalidDuration(token.to_string())),
                "token {token:?} should be rejected"
            );
        }
    }

    #[test]
    fn formats_timestamp_without_offset() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap() + Duration::milliseconds(42);
        assert_eq!(TimestampFormat::default().format(&ts), "2024-03-09T07:05:01.042");
    }

    #[test]
    fn custom_pattern_is_used() {
        let format = TimestampFormat::new("%Y/%m/%d %H:%M").unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(format.format(&ts), "2024/03/09 07:05");
        assert_eq!(format.pattern(), "%Y/%m/%d %H:%M");
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        assert!(matches!(TimestampFormat::new("%Q"), Err(CodetrailError::Config(_))));
        assert!(TimestampFormat::new("").is_err());
    }

    #[test]
    fn parses_millisecond_timestamps() {
        let parsed = parse_timestamp("2024-03-09T07:05:01.042").unwrap();
        let expected =
            Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap() + Duration::milliseconds(42);
        assert_eq!(parsed, expected);
        assert_eq!(parse_timestamp("2024-03-09T07:05:01.042Z").unwrap(), expected);
    }

    #[test]
    fn higher_precision_is_truncated_to_millis() {
        let micro = parse_timestamp("2024-03-09T07:05:01.042999").unwrap();
        let milli = parse_timestamp("2024-03-09T07:05:01.042").unwrap();
        assert_eq!(micro, milli);

        let ticks = parse_timestamp("2024-03-09T07:05:01.0429999Z").unwrap();
        assert_eq!(ticks, milli);
    }

    #[test]
    fn malformed_timestamps_are_rejected() {
        for token in [
            "",
            "2024-03-09",
            "2024-03-09T07:05:01",
            "2024-03-09T07:05:01.4",
            "2024-03-09T07:05:01.04x",
            "2024-13-09T07:05:01.000",
            "09/03/2024 07:05:01.000",
            "2024-03-09T07:05:01.000+02:00",
        ] {
            assert_eq!(
                parse_timestamp(token),
                Err(DecodeError::InvalidTimestamp(token.to_string())),
                "token {token:?} should be rejected"
            );
        }
    }

    #[test]
    fn format_then_parse_preserves_the_instant() {
        let ts = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap()
            + Duration::milliseconds(999);
        let encoded = TimestampFormat::default().format(&ts);
        assert_eq!(parse_timestamp(&encoded).unwrap(), ts);
    }
}
