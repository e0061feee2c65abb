//! Medical appointments.

use chrono::{NaiveDate, NaiveTime};

use super::{DATE_FORMAT, TIME_FORMAT, date_field, time_field};
use crate::error::RecordError;
use crate::record::{Record, Row};

/// A scheduled visit with a doctor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    /// Sequential id assigned when scheduled.
    pub appointment_id: String,
    /// Id of the patient.
    pub user_id: String,
    /// Name of the doctor.
    pub doctor: String,
    /// Medical specialty of the visit.
    pub specialty: String,
    /// Calendar date of the visit.
    pub date: NaiveDate,
    /// Time of day of the visit.
    pub time: NaiveTime,
    /// Free-text note for the doctor.
    pub medical_comment: Option<String>,
}

impl Record for Appointment {
    const SCHEMA: &'static [&'static str] = &[
        "appointment_id",
        "user_id",
        "doctor",
        "specialty",
        "date",
        "time",
        "medical_comment",
    ];

    const KEY: Option<&'static str> = Some("appointment_id");

    fn to_row(&self) -> Result<Row, RecordError> {
        Ok(Row::new()
            .with("appointment_id", self.appointment_id.as_str())
            .with("user_id", self.user_id.as_str())
            .with("doctor", self.doctor.as_str())
            .with("specialty", self.specialty.as_str())
            .with("date", self.date.format(DATE_FORMAT).to_string())
            .with("time", self.time.format(TIME_FORMAT).to_string())
            .with_opt("medical_comment", self.medical_comment.as_deref()))
    }

    fn from_row(row: &Row) -> Result<Self, RecordError> {
        Ok(Self {
            appointment_id: row.required("appointment_id")?,
            user_id: row.required("user_id")?,
            doctor: row.text("doctor").into_owned(),
            specialty: row.text("specialty").into_owned(),
            date: date_field(row, "date")?,
            time: time_field(row, "time")?,
            medical_comment: row.opt_text("medical_comment"),
        })
    }
}
