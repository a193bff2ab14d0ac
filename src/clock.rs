//! Helpers for working out the current date in the server's configured
//! timezone.
//!
//! Goal windows are defined in terms of local calendar days, so "today" must
//! come from the configured timezone rather than UTC.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// Get the UTC offset that `canonical_timezone` has right now.
///
/// Returns `None` if `canonical_timezone` is not in the IANA timezone
/// database.
pub(crate) fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Get today's calendar date in `canonical_timezone`.
///
/// # Errors
///
/// Returns [Error::InvalidTimezoneError] if `canonical_timezone` is not in
/// the IANA timezone database.
pub(crate) fn today_in(canonical_timezone: &str) -> Result<Date, Error> {
    get_local_offset(canonical_timezone)
        .map(|offset| OffsetDateTime::now_utc().to_offset(offset).date())
        .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))
}
