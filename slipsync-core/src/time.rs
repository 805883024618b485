//! Time utilities: notification timestamps in a fixed civil time zone.

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

/// Zone the bank stamps its transfer slips in.
pub const DEFAULT_TIMEZONE: &str = "Asia/Bangkok";

/// Layout of the combined `date` + `time` notification fields.
pub const NOTIFICATION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {name}"))
}

/// Parse a local minute like "2024-01-02 09:30" in `tz`.
pub fn parse_local_minute(local: &str, tz: Tz) -> Result<DateTime<Tz>> {
    let ndt = NaiveDateTime::parse_from_str(local, NOTIFICATION_TIME_FORMAT)
        .map_err(|e| anyhow::anyhow!("invalid local datetime '{local}': {e}"))?;

    tz.from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| anyhow::anyhow!("ambiguous or invalid local time (DST?): {local} {tz}"))
}
