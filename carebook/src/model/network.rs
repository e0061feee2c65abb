//! Social networks and their members.
//!
//! Members are stored inside the network row as a structured list. Each
//! member is written as `{name, dni, phones, role, details}`, where the keys
//! of `details` depend on the role.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::record::{Record, Row};

/// Role of a network member and the details that go with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberRole {
    /// A relative of the patient.
    Family {
        /// Degree of kinship.
        relationship: String,
        /// Gender as entered.
        gender: String,
        /// Birth date, `YYYY-MM-DD`.
        birth_date: String,
    },
    /// A friend of the patient.
    Friend {
        /// Gender as entered.
        gender: String,
        /// Birth date, `YYYY-MM-DD`.
        birth_date: String,
        /// Hobbies shared with the patient.
        hobbies: Vec<String>,
    },
    /// A doctor in the care team.
    Doctor {
        /// Reference hospital or clinic.
        hospital: String,
        /// Professional registration number.
        collegiate_number: String,
        /// Medical specialty.
        specialty: Option<String>,
    },
    /// A nurse in the care team.
    Nurse {
        /// Reference hospital or clinic.
        hospital: String,
        /// Whether the nurse does home visits.
        home_assistance: bool,
    },
}

impl MemberRole {
    /// Stored name of the role.
    pub fn name(&self) -> &'static str {
        match self {
            MemberRole::Family { .. } => "family",
            MemberRole::Friend { .. } => "friend",
            MemberRole::Doctor { .. } => "doctor",
            MemberRole::Nurse { .. } => "nurse",
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Role names without details, for parsing user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// See [`MemberRole::Family`].
    Family,
    /// See [`MemberRole::Friend`].
    Friend,
    /// See [`MemberRole::Doctor`].
    Doctor,
    /// See [`MemberRole::Nurse`].
    Nurse,
}

impl FromStr for MemberKind {
    type Err = String;

    /// Parses a role name; also accepts the Catalan names of older files.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "family" | "família" | "familia" => Ok(MemberKind::Family),
            "friend" | "amics" | "amic" => Ok(MemberKind::Friend),
            "doctor" | "metge" => Ok(MemberKind::Doctor),
            "nurse" | "infermer" | "infermera" => Ok(MemberKind::Nurse),
            other => Err(format!("unknown member role: {other:?}")),
        }
    }
}

/// A person in a social network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredMember", into = "StoredMember")]
pub struct Member {
    /// Full name.
    pub name: String,
    /// National identity number.
    pub dni: String,
    /// Contact phones.
    pub phones: Vec<String>,
    /// Role and role-specific details.
    pub role: MemberRole,
}

/// Stored shape of a [`Member`].
#[derive(Serialize, Deserialize)]
struct StoredMember {
    name: String,
    #[serde(default)]
    dni: String,
    #[serde(default)]
    phones: Vec<String>,
    role: String,
    #[serde(default)]
    details: StoredDetails,
}

#[derive(Default, Serialize, Deserialize)]
struct StoredDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    relationship: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hobbies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hospital: Option<String>,
    #[serde(
        default,
        alias = "colegiate_number",
        skip_serializing_if = "Option::is_none"
    )]
    collegiate_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    specialty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    home_assistance: Option<bool>,
}

impl TryFrom<StoredMember> for Member {
    type Error = String;

    fn try_from(stored: StoredMember) -> Result<Self, Self::Error> {
        let details = stored.details;
        let role = match stored.role.parse::<MemberKind>()? {
            MemberKind::Family => MemberRole::Family {
                relationship: details.relationship.unwrap_or_default(),
                gender: details.gender.unwrap_or_default(),
                birth_date: details.birth_date.unwrap_or_default(),
            },
            MemberKind::Friend => MemberRole::Friend {
                gender: details.gender.unwrap_or_default(),
                birth_date: details.birth_date.unwrap_or_default(),
                hobbies: details.hobbies.unwrap_or_default(),
            },
            MemberKind::Doctor => MemberRole::Doctor {
                hospital: details.hospital.unwrap_or_default(),
                collegiate_number: details.collegiate_number.unwrap_or_default(),
                specialty: details.specialty.filter(|s| !s.trim().is_empty()),
            },
            MemberKind::Nurse => MemberRole::Nurse {
                hospital: details.hospital.unwrap_or_default(),
                home_assistance: details.home_assistance.unwrap_or(false),
            },
        };

        Ok(Member {
            name: stored.name,
            dni: stored.dni,
            phones: stored.phones,
            role,
        })
    }
}

impl From<Member> for StoredMember {
    fn from(member: Member) -> Self {
        let role = member.role.name().to_string();
        let details = match member.role {
            MemberRole::Family {
                relationship,
                gender,
                birth_date,
            } => StoredDetails {
                relationship: Some(relationship),
                gender: Some(gender),
                birth_date: Some(birth_date),
                ..StoredDetails::default()
            },
            MemberRole::Friend {
                gender,
                birth_date,
                hobbies,
            } => StoredDetails {
                gender: Some(gender),
                birth_date: Some(birth_date),
                hobbies: Some(hobbies),
                ..StoredDetails::default()
            },
            MemberRole::Doctor {
                hospital,
                collegiate_number,
                specialty,
            } => StoredDetails {
                hospital: Some(hospital),
                collegiate_number: Some(collegiate_number),
                specialty,
                ..StoredDetails::default()
            },
            MemberRole::Nurse {
                hospital,
                home_assistance,
            } => StoredDetails {
                hospital: Some(hospital),
                home_assistance: Some(home_assistance),
                ..StoredDetails::default()
            },
        };

        StoredMember {
            name: member.name,
            dni: member.dni,
            phones: member.phones,
            role,
            details,
        }
    }
}

/// A named group of people around a patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialNetwork {
    /// Sequential id assigned at creation.
    pub network_id: String,
    /// Display title.
    pub title: String,
    /// Creation date formatted as `DD-Mon-YYYY`.
    pub creation_date: String,
    /// Stored member count; kept equal to `members.len()` on update.
    pub members_count: u64,
    /// Members in insertion order.
    pub members: Vec<Member>,
}

impl SocialNetwork {
    /// Creates an empty network.
    pub fn new(network_id: &str, title: &str, creation_date: &str) -> Self {
        Self {
            network_id: network_id.to_string(),
            title: title.to_string(),
            creation_date: creation_date.to_string(),
            members_count: 0,
            members: Vec::new(),
        }
    }

    /// Adds a member and refreshes the stored count.
    pub fn add_member(&mut self, member: Member) {
        self.members.push(member);
        self.members_count = self.members.len() as u64;
    }
}

impl Record for SocialNetwork {
    const SCHEMA: &'static [&'static str] = &[
        "network_id",
        "title",
        "creation_date",
        "members_count",
        "members",
    ];

    const KEY: Option<&'static str> = Some("network_id");

    fn to_row(&self) -> Result<Row, RecordError> {
        Row::new()
            .with("network_id", self.network_id.as_str())
            .with("title", self.title.as_str())
            .with("creation_date", self.creation_date.as_str())
            .with_count("members_count", self.members_count)
            .with_structured("members", &self.members)
    }

    fn from_row(row: &Row) -> Result<Self, RecordError> {
        Ok(Self {
            network_id: row.required("network_id")?,
            title: row.text("title").into_owned(),
            creation_date: row.text("creation_date").into_owned(),
            members_count: row.count("members_count")?,
            members: row.structured("members")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Field;
    use serde_json::json;

    fn nurse() -> Member {
        Member {
            name: "Marta".to_string(),
            dni: "12345678Z".to_string(),
            phones: vec!["600111222".to_string()],
            role: MemberRole::Nurse {
                hospital: "Hospital del Mar".to_string(),
                home_assistance: true,
            },
        }
    }

    #[test]
    fn test_member_stored_shape() {
        let value = serde_json::to_value(nurse()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "Marta",
                "dni": "12345678Z",
                "phones": ["600111222"],
                "role": "nurse",
                "details": {"hospital": "Hospital del Mar", "home_assistance": true}
            })
        );
    }

    #[test]
    fn test_legacy_member_is_accepted() {
        let legacy = json!({
            "name": "Dr. Vila",
            "dni": "X",
            "phones": ["1", "2"],
            "role": "Metge",
            "details": {"hospital": "Clinic", "colegiate_number": "99", "specialty": ""}
        });
        let member: Member = serde_json::from_value(legacy).unwrap();
        assert_eq!(
            member.role,
            MemberRole::Doctor {
                hospital: "Clinic".to_string(),
                collegiate_number: "99".to_string(),
                specialty: None,
            }
        );
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let value = json!({"name": "X", "role": "neighbour"});
        assert!(serde_json::from_value::<Member>(value).is_err());
    }

    #[test]
    fn test_network_row_round_trip() {
        let mut network = SocialNetwork::new("1", "Família Puig", "02-Jan-2025");
        network.add_member(nurse());

        let row = network.to_row().unwrap();
        assert_eq!(row.text("members_count"), "1");
        assert!(matches!(row.get("members"), Some(Field::Structured(_))));
        assert_eq!(SocialNetwork::from_row(&row).unwrap(), network);
    }

    #[test]
    fn test_member_kind_names() {
        assert_eq!("Família".parse::<MemberKind>().unwrap(), MemberKind::Family);
        assert_eq!("amics".parse::<MemberKind>().unwrap(), MemberKind::Friend);
        assert_eq!("nurse".parse::<MemberKind>().unwrap(), MemberKind::Nurse);
    }
}
