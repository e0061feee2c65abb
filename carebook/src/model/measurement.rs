//! Vital-sign measurements.

use crate::error::RecordError;
use crate::record::{Record, Row};

/// One recorded value of a vital-sign constant. Append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Id of the measured user.
    pub user_id: String,
    /// Vital-sign constant (e.g. `heart_rate`).
    pub constant: String,
    /// Measured value.
    pub value: f64,
    /// ISO-8601 timestamp supplied by the caller.
    pub timestamp: String,
}

impl Measurement {
    /// Creates a measurement.
    pub fn new(user_id: &str, constant: &str, value: f64, timestamp: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            constant: constant.to_string(),
            value,
            timestamp: timestamp.to_string(),
        }
    }
}

impl Record for Measurement {
    const SCHEMA: &'static [&'static str] = &["user_id", "constant", "value", "timestamp"];

    fn to_row(&self) -> Result<Row, RecordError> {
        Ok(Row::new()
            .with("user_id", self.user_id.as_str())
            .with("constant", self.constant.as_str())
            .with_number("value", self.value)
            .with("timestamp", self.timestamp.as_str()))
    }

    fn from_row(row: &Row) -> Result<Self, RecordError> {
        Ok(Self {
            user_id: row.required("user_id")?,
            constant: row.required("constant")?,
            value: row.number("value")?,
            timestamp: row.text("timestamp").into_owned(),
        })
    }
}
