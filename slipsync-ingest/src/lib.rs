//! slipsync-ingest: transfer notification records and where they are loaded from.

pub mod parsers;
pub mod source;
pub mod types;

pub use parsers::notification::{find_field, parse_notification_line};
pub use source::{NotificationSource, split_records};
pub use types::NotificationRecord;
