//! Transfer notification line parser
//!
//! Each line is a `;` separated list of `key=value` tokens:
//!   filename=r1.jpg;to=Jane;from=Me;amountTHB=120.00 THB;date=2024-01-02;time=09:30;bankref=B1;txref=T1
//!
//! Unknown keys are ignored, missing keys read as empty strings.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use slipsync_core::time::parse_local_minute;

use crate::types::NotificationRecord;

const AMOUNT_SUFFIX: &str = " THB";

/// Value of the first `key=` token, or "" when absent.
pub fn find_field<'a>(fields: &[&'a str], key: &str) -> &'a str {
    fields
        .iter()
        .copied()
        .find_map(|part| part.strip_prefix(key)?.strip_prefix('='))
        .unwrap_or("")
}

/// Parse one notification line, combining `date` and `time` in `tz`.
pub fn parse_notification_line(line: &str, tz: Tz) -> Result<NotificationRecord> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(';').collect();

    let date = find_field(&fields, "date");
    let time = find_field(&fields, "time");
    let txref = find_field(&fields, "txref");
    let timestamp = parse_local_minute(&format!("{date} {time}"), tz)
        .with_context(|| format!("notification txref={txref}"))?;

    Ok(NotificationRecord {
        filename: find_field(&fields, "filename").to_string(),
        to: find_field(&fields, "to").to_string(),
        from: find_field(&fields, "from").to_string(),
        amount: find_field(&fields, "amountTHB").replace(AMOUNT_SUFFIX, ""),
        date: date.to_string(),
        time: time.to_string(),
        timestamp,
        bankref: find_field(&fields, "bankref").to_string(),
        txref: txref.to_string(),
    })
}
