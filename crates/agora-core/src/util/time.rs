//! Timestamp conversion for indexed dates.
//!
//! The search backend stores dates as Unix-timestamp integers; `chrono`
//! datetimes are converted once, at document conversion time.

use chrono::{DateTime, Utc};

/// Convert a datetime to a Unix timestamp in seconds.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use agora_core::util::time::to_timestamp;
///
/// let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// assert_eq!(to_timestamp(&date), 1_704_067_200);
/// ```
pub fn to_timestamp(date: &DateTime<Utc>) -> i64 {
    date.timestamp()
}
