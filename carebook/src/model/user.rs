//! Registered users and their roles.

use std::fmt;
use std::str::FromStr;

use crate::error::RecordError;
use crate::record::{Record, Row};

/// Role-specific data of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRole {
    /// A cared-for person.
    Patient {
        /// Free-text medical history.
        medical_record: Option<String>,
    },
    /// A physician.
    Doctor {
        /// Medical specialty.
        specialty: Option<String>,
        /// Professional registration number.
        collegiate_number: Option<String>,
    },
    /// A family member.
    Relative {
        /// Relationship to the patient.
        relationship: Option<String>,
    },
}

/// The kind of a user, without role data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserKind {
    /// See [`UserRole::Patient`].
    Patient,
    /// See [`UserRole::Doctor`].
    Doctor,
    /// See [`UserRole::Relative`].
    Relative,
}

impl UserKind {
    /// Stored name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            UserKind::Patient => "patient",
            UserKind::Doctor => "doctor",
            UserKind::Relative => "relative",
        }
    }
}

impl fmt::Display for UserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserKind {
    type Err = String;

    /// Parses a kind; also accepts the Catalan names and menu numbers used
    /// by older data files.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" | "pacient" | "1" => Ok(UserKind::Patient),
            "doctor" | "metge" | "2" => Ok(UserKind::Doctor),
            "relative" | "familiar" | "3" => Ok(UserKind::Relative),
            other => Err(format!("unknown user kind: {other:?}")),
        }
    }
}

impl UserRole {
    /// Returns the kind of this role.
    pub fn kind(&self) -> UserKind {
        match self {
            UserRole::Patient { .. } => UserKind::Patient,
            UserRole::Doctor { .. } => UserKind::Doctor,
            UserRole::Relative { .. } => UserKind::Relative,
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Sequential id assigned at registration.
    pub user_id: String,
    /// Display name.
    pub name: String,
    /// Login email; unique across users.
    pub email: String,
    /// Registration date formatted as `DD-Mon-YYYY`.
    pub registration_date: String,
    /// Role and role-specific data.
    pub role: UserRole,
}

impl Record for User {
    const SCHEMA: &'static [&'static str] = &[
        "user_id",
        "name",
        "email",
        "registration_date",
        "type",
        "medical_record",
        "specialty",
        "collegiate_number",
        "relationship",
    ];

    const KEY: Option<&'static str> = Some("user_id");

    fn to_row(&self) -> Result<Row, RecordError> {
        let row = Row::new()
            .with("user_id", self.user_id.as_str())
            .with("name", self.name.as_str())
            .with("email", self.email.as_str())
            .with("registration_date", self.registration_date.as_str())
            .with("type", self.role.kind().as_str());

        let row = match &self.role {
            UserRole::Patient { medical_record } => {
                row.with_opt("medical_record", medical_record.as_deref())
            }
            UserRole::Doctor {
                specialty,
                collegiate_number,
            } => row
                .with_opt("specialty", specialty.as_deref())
                .with_opt("collegiate_number", collegiate_number.as_deref()),
            UserRole::Relative { relationship } => {
                row.with_opt("relationship", relationship.as_deref())
            }
        };
        Ok(row)
    }

    fn from_row(row: &Row) -> Result<Self, RecordError> {
        let kind_text = row.text("type");
        let kind: UserKind = kind_text.parse().map_err(|_| RecordError::UnknownVariant {
            field: "type".to_string(),
            value: kind_text.clone().into_owned(),
        })?;

        let role = match kind {
            UserKind::Patient => UserRole::Patient {
                medical_record: row.opt_text("medical_record"),
            },
            UserKind::Doctor => UserRole::Doctor {
                specialty: row.opt_text("specialty"),
                // Older files spell the column with a single "l".
                collegiate_number: row
                    .opt_text("collegiate_number")
                    .or_else(|| row.opt_text("colegiate_number")),
            },
            UserKind::Relative => UserRole::Relative {
                relationship: row.opt_text("relationship"),
            },
        };

        Ok(Self {
            user_id: row.required("user_id")?,
            name: row.text("name").into_owned(),
            email: row.text("email").into_owned(),
            registration_date: row.text("registration_date").into_owned(),
            role,
        })
    }
}
