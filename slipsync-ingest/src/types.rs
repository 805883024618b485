use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;

/// One bank transfer notification (one line of the notification source)
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRecord {
    /// Receipt image the notification was extracted from
    pub filename: String,
    /// Recipient of the transfer
    pub to: String,
    pub from: String,
    /// Amount in THB with the unit suffix removed, e.g. "120.00"
    pub amount: String,
    /// Raw `date` field, YYYY-MM-DD
    pub date: String,
    /// Raw `time` field, HH:MM
    pub time: String,
    /// `date` + `time` in the notification's civil time zone
    pub timestamp: DateTime<Tz>,
    pub bankref: String,
    pub txref: String,
}

impl NotificationRecord {
    /// Local calendar day of the transfer.
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}
