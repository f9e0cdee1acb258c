//! Timestamp normalization into UNIX seconds (UTC).

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

/// String layouts tried in order when a textual timestamp is not all digits.
const TEXT_FORMATS: &[TextFormat] = &[
    TextFormat::Zoned("%Y-%m-%dT%H:%M:%S%z"),
    TextFormat::Naive("%Y-%m-%dT%H:%M:%S"),
    TextFormat::Naive("%Y-%m-%d %H:%M:%S"),
    TextFormat::Date("%Y-%m-%d"),
];

enum TextFormat {
    Zoned(&'static str),
    Naive(&'static str),
    Date(&'static str),
}

impl TextFormat {
    fn parse(&self, value: &str) -> Option<i64> {
        match self {
            Self::Zoned(fmt) => {
                let parsed = match value.strip_suffix('Z') {
                    Some(head) => DateTime::parse_from_str(&format!("{head}+0000"), fmt),
                    None => DateTime::parse_from_str(value, fmt),
                };
                parsed.ok().map(|dt| dt.timestamp())
            }
            Self::Naive(fmt) => NaiveDateTime::parse_from_str(value, fmt)
                .ok()
                .map(|naive| Utc.from_utc_datetime(&naive).timestamp()),
            Self::Date(fmt) => NaiveDate::parse_from_str(value, fmt)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| Utc.from_utc_datetime(&naive).timestamp()),
        }
    }
}

/// Any of the time representations the normalizer accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampInput {
    /// Already UNIX seconds.
    Seconds(i64),
    /// UNIX seconds with a fractional part; truncated.
    Fractional(f64),
    /// Date-time without an offset, taken as UTC.
    Naive(NaiveDateTime),
    /// Date-time with an explicit offset.
    Zoned(DateTime<FixedOffset>),
    /// Free-form text: digits or one of the supported layouts.
    Text(String),
}

impl From<i64> for TimestampInput {
    fn from(value: i64) -> Self {
        Self::Seconds(value)
    }
}

impl From<f64> for TimestampInput {
    fn from(value: f64) -> Self {
        Self::Fractional(value)
    }
}

impl From<NaiveDateTime> for TimestampInput {
    fn from(value: NaiveDateTime) -> Self {
        Self::Naive(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for TimestampInput {
    fn from(value: DateTime<Tz>) -> Self {
        Self::Zoned(value.fixed_offset())
    }
}

impl From<&str> for TimestampInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TimestampInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Current wall-clock time as UNIX seconds.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Normalizes `value` into UNIX seconds.
///
/// Inputs that match no supported representation resolve to [`now_timestamp`], so the result is
/// best-effort and never authoritative.
pub fn normalize(value: impl Into<TimestampInput>) -> i64 {
    let value = value.into();
    match try_normalize(&value) {
        Some(seconds) => seconds,
        None => {
            warn!(?value, "could not parse timestamp value, falling back to now");
            now_timestamp()
        }
    }
}

/// Like [`normalize`] but reports unparseable input as `None` instead of substituting now.
pub fn try_normalize(value: &TimestampInput) -> Option<i64> {
    match value {
        TimestampInput::Seconds(seconds) => Some(*seconds),
        TimestampInput::Fractional(seconds) if seconds.is_finite() => Some(seconds.trunc() as i64),
        TimestampInput::Fractional(_) => None,
        TimestampInput::Naive(naive) => Some(Utc.from_utc_datetime(naive).timestamp()),
        TimestampInput::Zoned(zoned) => Some(zoned.timestamp()),
        TimestampInput::Text(text) => parse_text(text.trim()),
    }
}

fn parse_text(value: &str) -> Option<i64> {
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(seconds) = value.parse::<i64>() {
            return Some(seconds);
        }
    }
    TEXT_FORMATS.iter().find_map(|format| format.parse(value))
}

/// Source of the `captured_at` stamp applied to extracted records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptureClock {
    /// Read the wall clock at extraction time.
    #[default]
    System,
    /// Use the same pinned timestamp for every record.
    Fixed(i64),
}

impl CaptureClock {
    /// Timestamp to stamp on the next record.
    pub fn now(&self) -> i64 {
        match self {
            Self::System => now_timestamp(),
            Self::Fixed(seconds) => *seconds,
        }
    }
}
