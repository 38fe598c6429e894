use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Granularity ───────────────────────────────────────────────────────────────

/// Calendar unit used to bucket records for counting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Month,
    Year,
}

impl Granularity {
    /// Truncate `ts` to the first calendar day of its period (UTC).
    pub fn truncate(self, ts: DateTime<Utc>) -> NaiveDate {
        let date = ts.date_naive();
        match self {
            Granularity::Day => date,
            Granularity::Month => date.with_day(1).unwrap_or(date),
            Granularity::Year => date.with_ordinal(1).unwrap_or(date),
        }
    }

    /// Render a period key: `"2024-01-15"`, `"2024-01"` or `"2024"`.
    pub fn format_key(self, period: NaiveDate) -> String {
        let fmt = match self {
            Granularity::Day => "%Y-%m-%d",
            Granularity::Month => "%Y-%m",
            Granularity::Year => "%Y",
        };
        period.format(fmt).to_string()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Month => "month",
            Granularity::Year => "year",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" | "daily" | "d" => Ok(Granularity::Day),
            "month" | "monthly" | "m" => Ok(Granularity::Month),
            "year" | "yearly" | "y" => Ok(Granularity::Year),
            other => Err(format!("unknown granularity \"{}\"", other)),
        }
    }
}

// ── Epoch conversion ──────────────────────────────────────────────────────────

/// Convert a JSON millisecond epoch value into a UTC [`DateTime`].
///
/// Integers go through [`DateTime::from_timestamp_millis`]; floats are divided
/// by 1000 and split into whole seconds and nanoseconds. Strings, `null` and
/// values outside chrono's representable range yield `None`.
pub fn parse_epoch_millis(value: &Value) -> Option<DateTime<Utc>> {
    let Value::Number(n) = value else {
        return None;
    };

    if let Some(ms) = n.as_i64() {
        return DateTime::from_timestamp_millis(ms);
    }

    let secs_f = n.as_f64()? / 1000.0;
    if !secs_f.is_finite() {
        return None;
    }
    let secs = secs_f.floor();
    let nanos = ((secs_f - secs) * 1_000_000_000.0).round().min(999_999_999.0) as u32;
    if secs < i64::MIN as f64 || secs > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp(secs as i64, nanos)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
