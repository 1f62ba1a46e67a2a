//! Expiry option vocabulary and duration resolution.
//!
//! Request-facing inputs are the literal strings `Never`, `1 hour`,
//! `4 hours`, `1 day`, or a custom token matching `^\d+[hmMdwy]$`. Unit
//! dispatch is case-sensitive: `m` is minutes, `M` is months.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Minimum effective custom duration. Sub-5-minute TTLs would race the
/// sweep interval, so shorter (or unparseable) requests are floored here.
const MINIMUM_MINUTES: i64 = 5;

/// Days per month/year for the calendar-free units
const MONTH_DAYS: i64 = 30;
const YEAR_DAYS: i64 = 365;

/// The default preset list, in display order. Configuration may override it;
/// the grammar itself is fixed.
pub const DEFAULT_PRESETS: [&str; 4] = ["Never", "1 hour", "4 hours", "1 day"];

/// A symbolic expiry request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryOption {
    /// No deadline; clears any existing one
    Never,

    /// Preset: one hour
    OneHour,

    /// Preset: four hours
    FourHours,

    /// Preset: one day
    OneDay,

    /// Custom `<integer><unit>` token, resolved by [`ExpiryOption::duration`]
    Custom(String),
}

impl ExpiryOption {
    /// Parse a request-facing option string. Anything outside the preset
    /// vocabulary is carried as a custom token; its validity is decided at
    /// duration-resolution time.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "Never" => ExpiryOption::Never,
            "1 hour" => ExpiryOption::OneHour,
            "4 hours" => ExpiryOption::FourHours,
            "1 day" => ExpiryOption::OneDay,
            other => ExpiryOption::Custom(other.to_string()),
        }
    }

    /// Resolve this option to a duration.
    ///
    /// `None` means "never expires". An unparseable custom token falls back
    /// to five minutes rather than failing the request; minute values below
    /// five are floored to five.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            ExpiryOption::Never => None,
            ExpiryOption::OneHour => Some(Duration::hours(1)),
            ExpiryOption::FourHours => Some(Duration::hours(4)),
            ExpiryOption::OneDay => Some(Duration::hours(24)),
            ExpiryOption::Custom(token) => {
                if token.is_empty() {
                    return None;
                }
                Some(parse_custom(token).unwrap_or(Duration::minutes(MINIMUM_MINUTES)))
            }
        }
    }
}

impl std::fmt::Display for ExpiryOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpiryOption::Never => write!(f, "Never"),
            ExpiryOption::OneHour => write!(f, "1 hour"),
            ExpiryOption::FourHours => write!(f, "4 hours"),
            ExpiryOption::OneDay => write!(f, "1 day"),
            ExpiryOption::Custom(token) => write!(f, "{}", token),
        }
    }
}

/// Parse a `<integer><unit>` token with unit in `[hmMdwy]`, case-sensitive.
///
/// Values large enough to overflow the duration type resolve to `None`, so
/// they take the same fallback as any other unusable token instead of
/// aborting the request.
fn parse_custom(token: &str) -> Option<Duration> {
    let unit = token.chars().last()?;
    let digits = &token[..token.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: i64 = digits.parse().ok()?;

    match unit {
        'm' => Duration::try_minutes(value.max(MINIMUM_MINUTES)),
        'h' => Duration::try_hours(value),
        'd' => Duration::try_days(value),
        'w' => Duration::try_weeks(value),
        'M' => Duration::try_days(value.checked_mul(MONTH_DAYS)?),
        'y' => Duration::try_days(value.checked_mul(YEAR_DAYS)?),
        _ => None,
    }
}
