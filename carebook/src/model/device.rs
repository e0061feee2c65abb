//! Monitoring devices.

use crate::error::RecordError;
use crate::record::{Record, Row};

/// A device registered to a user.
///
/// The device only records which constants it measures; measurements are
/// entered through [`crate::care::CareBook::record_measurement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Id of the owning user.
    pub user_id: String,
    /// Device model name.
    pub name: String,
    /// Serial number, unique per user.
    pub serial_number: String,
    /// Vital-sign constants the device measures.
    pub constants: Vec<String>,
    /// Seconds between samples.
    pub sampling_frequency: u64,
}

impl Device {
    /// Returns `true` if the device measures `constant`.
    pub fn monitors(&self, constant: &str) -> bool {
        self.constants.iter().any(|c| c == constant)
    }
}

impl Record for Device {
    const SCHEMA: &'static [&'static str] = &[
        "user_id",
        "name",
        "serial_number",
        "constants",
        "sampling_frequency",
    ];

    fn to_row(&self) -> Result<Row, RecordError> {
        Ok(Row::new()
            .with("user_id", self.user_id.as_str())
            .with("name", self.name.as_str())
            .with("serial_number", self.serial_number.as_str())
            .with_structured("constants", &self.constants)?
            .with_count("sampling_frequency", self.sampling_frequency))
    }

    fn from_row(row: &Row) -> Result<Self, RecordError> {
        Ok(Self {
            user_id: row.required("user_id")?,
            name: row.text("name").into_owned(),
            serial_number: row.required("serial_number")?,
            constants: row.structured("constants")?,
            sampling_frequency: row.count("sampling_frequency")?,
        })
    }
}
