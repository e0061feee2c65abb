//! Typed entity records.
//!
//! Each entity implements [`Record`](crate::record::Record) with a fixed
//! schema. Thresholds and alerts live in [`crate::threshold`] and
//! [`crate::alert`] next to the logic that uses them.

pub mod appointment;
pub mod device;
pub mod measurement;
pub mod network;
pub mod notification;
pub mod profile;
pub mod user;

pub use appointment::Appointment;
pub use device::Device;
pub use measurement::Measurement;
pub use network::{Member, MemberKind, MemberRole, SocialNetwork};
pub use notification::Notification;
pub use profile::{MedicalProfile, Medication};
pub use user::{User, UserKind, UserRole};

use chrono::{NaiveDate, NaiveTime};

use crate::error::RecordError;
use crate::record::Row;

/// Stored format of calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Stored format of times of day.
pub const TIME_FORMAT: &str = "%H:%M";

/// Reads a required `YYYY-MM-DD` field.
pub(crate) fn date_field(row: &Row, name: &str) -> Result<NaiveDate, RecordError> {
    let text = row.required(name)?;
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|_| RecordError::BadFormat {
        field: name.to_string(),
        value: text,
        expected: "a YYYY-MM-DD date",
    })
}

/// Reads a required `HH:MM` field.
pub(crate) fn time_field(row: &Row, name: &str) -> Result<NaiveTime, RecordError> {
    let text = row.required(name)?;
    NaiveTime::parse_from_str(text.trim(), TIME_FORMAT).map_err(|_| RecordError::BadFormat {
        field: name.to_string(),
        value: text,
        expected: "an HH:MM time",
    })
}
