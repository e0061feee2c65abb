//! Medical profiles.

use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::record::{Record, Row};

/// One medication a patient takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    /// Medication name.
    pub name: String,
    /// How long the patient has taken or will take it.
    #[serde(default)]
    pub duration: String,
}

/// Medical details of a user. At most one per user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MedicalProfile {
    /// Id of the profiled user.
    pub user_id: String,
    /// Birth date as entered.
    pub birth_date: String,
    /// Gender as entered.
    pub gender: String,
    /// Blood group (e.g. `A+`).
    pub blood_group: String,
    /// Whether the user has known allergies.
    pub allergies: bool,
    /// Home address.
    pub address: String,
    /// Contact phone.
    pub phone: String,
    /// Free-text note.
    pub medical_comment: Option<String>,
    /// Current medications.
    pub medications: Vec<Medication>,
}

impl Record for MedicalProfile {
    const SCHEMA: &'static [&'static str] = &[
        "user_id",
        "birth_date",
        "gender",
        "blood_group",
        "allergies",
        "address",
        "phone",
        "medical_comment",
        "medications",
    ];

    const KEY: Option<&'static str> = Some("user_id");

    fn to_row(&self) -> Result<Row, RecordError> {
        Row::new()
            .with("user_id", self.user_id.as_str())
            .with("birth_date", self.birth_date.as_str())
            .with("gender", self.gender.as_str())
            .with("blood_group", self.blood_group.as_str())
            .with_bool("allergies", self.allergies)
            .with("address", self.address.as_str())
            .with("phone", self.phone.as_str())
            .with_opt("medical_comment", self.medical_comment.as_deref())
            .with_structured("medications", &self.medications)
    }

    fn from_row(row: &Row) -> Result<Self, RecordError> {
        Ok(Self {
            user_id: row.required("user_id")?,
            birth_date: row.text("birth_date").into_owned(),
            gender: row.text("gender").into_owned(),
            blood_group: row.text("blood_group").into_owned(),
            allergies: row.boolean("allergies")?,
            address: row.text("address").into_owned(),
            phone: row.text("phone").into_owned(),
            medical_comment: row.opt_text("medical_comment"),
            medications: row.structured("medications")?,
        })
    }
}
