//! Configuration for a carebook data directory.
//!
//! A [`CareConfig`] names the directory holding the backing files and the
//! file used for each [`Entity`]. It can be built in code or loaded from a
//! JSON file; every field has a default, so a config file only needs the
//! values it changes:
//!
//! ```json
//! {
//!     "data_dir": "/var/lib/carebook",
//!     "files": { "alerts": "alertes.csv" },
//!     "access_key_ttl_hours": 12
//! }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default lifetime of a medical-staff access key.
pub const DEFAULT_ACCESS_KEY_TTL_HOURS: u32 = 24;

/// The entity types persisted by carebook, one backing file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    /// Registered users.
    Users,
    /// Medical appointments.
    Appointments,
    /// Notifications sent to users.
    Notifications,
    /// Medical profiles.
    Profiles,
    /// Social networks and their members.
    Networks,
    /// Recorded vital-sign measurements.
    Measurements,
    /// IoT devices.
    Devices,
    /// Acceptable ranges per vital-sign constant.
    Thresholds,
    /// Generated alerts.
    Alerts,
}

impl Entity {
    /// Every entity, in display order.
    pub const ALL: [Entity; 9] = [
        Entity::Users,
        Entity::Appointments,
        Entity::Notifications,
        Entity::Profiles,
        Entity::Networks,
        Entity::Measurements,
        Entity::Devices,
        Entity::Thresholds,
        Entity::Alerts,
    ];

    /// Lower-case name of the entity.
    pub fn name(self) -> &'static str {
        match self {
            Entity::Users => "users",
            Entity::Appointments => "appointments",
            Entity::Notifications => "notifications",
            Entity::Profiles => "profiles",
            Entity::Networks => "networks",
            Entity::Measurements => "measurements",
            Entity::Devices => "devices",
            Entity::Thresholds => "thresholds",
            Entity::Alerts => "alerts",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// File names for each entity, relative to the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityFiles {
    /// Users file.
    pub users: String,
    /// Appointments file.
    pub appointments: String,
    /// Notifications file.
    pub notifications: String,
    /// Medical profiles file.
    pub profiles: String,
    /// Social networks file.
    pub networks: String,
    /// Measurements file.
    pub measurements: String,
    /// Devices file.
    pub devices: String,
    /// Thresholds file.
    pub thresholds: String,
    /// Alerts file.
    pub alerts: String,
}

impl Default for EntityFiles {
    fn default() -> Self {
        Self {
            users: "users.csv".to_string(),
            appointments: "appointments.csv".to_string(),
            notifications: "notifications.csv".to_string(),
            profiles: "profiles.csv".to_string(),
            networks: "networks.csv".to_string(),
            measurements: "measurements.csv".to_string(),
            devices: "devices.csv".to_string(),
            thresholds: "thresholds.csv".to_string(),
            alerts: "alerts.csv".to_string(),
        }
    }
}

impl EntityFiles {
    /// Returns the configured file name for `entity`.
    pub fn get(&self, entity: Entity) -> &str {
        match entity {
            Entity::Users => &self.users,
            Entity::Appointments => &self.appointments,
            Entity::Notifications => &self.notifications,
            Entity::Profiles => &self.profiles,
            Entity::Networks => &self.networks,
            Entity::Measurements => &self.measurements,
            Entity::Devices => &self.devices,
            Entity::Thresholds => &self.thresholds,
            Entity::Alerts => &self.alerts,
        }
    }
}

/// Location and naming of a carebook data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareConfig {
    /// Directory holding every backing file.
    pub data_dir: PathBuf,
    /// Per-entity file names.
    pub files: EntityFiles,
    /// Lifetime of medical-staff access keys, in hours.
    pub access_key_ttl_hours: u32,
}

impl Default for CareConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            files: EntityFiles::default(),
            access_key_ttl_hours: DEFAULT_ACCESS_KEY_TTL_HOURS,
        }
    }
}

impl CareConfig {
    /// Creates a default configuration rooted at `data_dir`.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Loads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Read`] if the file cannot be read
    /// - [`ConfigError::Parse`] if it is not valid JSON for this type
    /// - [`ConfigError::Invalid`] if validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a file name is empty, contains a
    /// path separator, is shared by two entities, or the key lifetime is zero.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| ConfigError::Invalid { reason };

        if self.access_key_ttl_hours == 0 {
            return Err(invalid("access_key_ttl_hours must be > 0".to_string()).into());
        }

        let mut seen = HashSet::new();
        for entity in Entity::ALL {
            let name = self.files.get(entity);
            if name.trim().is_empty() {
                return Err(invalid(format!("file name for {entity} is empty")).into());
            }
            if name.contains(['/', '\\']) {
                return Err(invalid(format!(
                    "file name for {entity} must not contain a path separator: {name:?}"
                ))
                .into());
            }
            if !seen.insert(name) {
                return Err(invalid(format!("file name {name:?} is used by more than one entity")).into());
            }
        }

        Ok(())
    }

    /// Returns the backing-file path for `entity`.
    pub fn path_for(&self, entity: Entity) -> PathBuf {
        self.data_dir.join(self.files.get(entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CarebookError;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = CareConfig::default();
        config.validate().unwrap();
        assert_eq!(config.path_for(Entity::Alerts), PathBuf::from("data/alerts.csv"));
    }

    #[test]
    fn test_load_partial_config() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("carebook.json");
        fs::write(
            &path,
            r#"{"data_dir": "/srv/care", "files": {"alerts": "alertes.csv"}}"#,
        )
        .unwrap();

        let config = CareConfig::load(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/care"));
        assert_eq!(config.files.alerts, "alertes.csv");
        assert_eq!(config.files.users, "users.csv");
        assert_eq!(config.access_key_ttl_hours, DEFAULT_ACCESS_KEY_TTL_HOURS);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = tempdir().unwrap();
        match CareConfig::load(temp_dir.path().join("nope.json")).unwrap_err() {
            CarebookError::Config(ConfigError::Read { .. }) => {}
            other => panic!("Expected Read error, got: {:?}", other),
        }
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("carebook.json");
        fs::write(&path, "{ invalid json }").unwrap();

        match CareConfig::load(&path).unwrap_err() {
            CarebookError::Config(ConfigError::Parse { .. }) => {}
            other => panic!("Expected Parse error, got: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_file_names_rejected() {
        let mut config = CareConfig::default();
        config.files.alerts = config.files.users.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_name_with_separator_rejected() {
        let mut config = CareConfig::default();
        config.files.devices = "../devices.csv".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = CareConfig {
            access_key_ttl_hours: 0,
            ..CareConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
