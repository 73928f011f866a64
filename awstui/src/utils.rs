use aws_sdk_ec2::primitives::DateTime as SdkDateTime;
use chrono::{DateTime, Utc};

/// Format used for every timestamp shown in tables
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Placeholder for values that are not available
pub const MISSING: &str = "-";

/// Convert an SDK timestamp into a `chrono` UTC timestamp
///
/// All AWS SDK crates re-export the same smithy `DateTime`, so this applies to every service
pub fn to_utc(value: &SdkDateTime) -> Option<DateTime<Utc>> {
  DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

/// Parse the `LastModified` string Lambda returns, e.g. `2024-03-01T12:30:45.123+0000`
pub fn parse_lambda_timestamp(value: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z")
    .or_else(|_| DateTime::parse_from_rfc3339(value))
    .ok()
    .map(|ts| ts.with_timezone(&Utc))
}

pub fn format_timestamp(value: Option<&DateTime<Utc>>) -> String {
  match value {
    Some(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
    None => MISSING.to_owned(),
  }
}

/// Whole days from `now` until `target`, truncated toward zero
pub fn days_until(target: &DateTime<Utc>, now: &DateTime<Utc>) -> i64 {
  (*target - *now).num_days()
}

pub fn or_missing(value: Option<&str>) -> String {
  value.unwrap_or(MISSING).to_owned()
}
