//! Messages sent to users.

use crate::error::RecordError;
use crate::record::{Record, Row};

/// A message delivered to one user. Append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Sequential id assigned when sent.
    pub notification_id: String,
    /// Id of the recipient.
    pub user_id: String,
    /// Message body.
    pub message: String,
    /// ISO-8601 time the message was sent.
    pub timestamp: String,
}

impl Record for Notification {
    const SCHEMA: &'static [&'static str] = &["notification_id", "user_id", "message", "timestamp"];

    fn to_row(&self) -> Result<Row, RecordError> {
        Ok(Row::new()
            .with("notification_id", self.notification_id.as_str())
            .with("user_id", self.user_id.as_str())
            .with("message", self.message.as_str())
            .with("timestamp", self.timestamp.as_str()))
    }

    fn from_row(row: &Row) -> Result<Self, RecordError> {
        Ok(Self {
            notification_id: row.required("notification_id")?,
            user_id: row.required("user_id")?,
            message: row.text("message").into_owned(),
            timestamp: row.text("timestamp").into_owned(),
        })
    }
}
