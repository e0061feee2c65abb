//! The care layer: user-facing operations over every entity table.
//!
//! [`CareBook`] bundles one typed table per entity, all obtained from a
//! single [`StoreRegistry`], together with the [`AlertPipeline`]. Each
//! operation validates its input, then reads and writes through the tables;
//! nothing is cached between calls.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use carebook::care::{CareBook, NewUser};
//! use carebook::config::CareConfig;
//! use carebook::model::UserRole;
//! use carebook::registry::StoreRegistry;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = StoreRegistry::new();
//! let book = CareBook::open(&registry, CareConfig::new("./data"));
//!
//! let today = chrono::Local::now().date_naive();
//! let user = book.register_user(
//!     NewUser::new("Montserrat", "montse@example.cat", UserRole::Patient { medical_record: None }),
//!     today,
//! )?;
//! book.add_device(&user.user_id, "Pulse 2", "SN-1", &["heart_rate"], 60)?;
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::rc::Rc;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};

use crate::alert::{Alert, AlertPipeline, AlertResponder, Evaluation};
use crate::config::{CareConfig, Entity};
use crate::error::{CareError, Result, StoreError};
use crate::model::{
    Appointment, DATE_FORMAT, Device, MedicalProfile, Measurement, Member, Notification,
    SocialNetwork, TIME_FORMAT, User, UserRole,
};
use crate::registry::StoreRegistry;
use crate::store::{RecordStore, Table, WriteSummary};
use crate::threshold::Threshold;

/// Display format of registration and creation dates (`05-Mar-2025`).
pub const DAY_FORMAT: &str = "%d-%b-%Y";

/// Input for [`CareBook::register_user`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Role and role-specific data.
    pub role: UserRole,
}

impl NewUser {
    /// Creates a registration request.
    pub fn new(name: &str, email: &str, role: UserRole) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            role,
        }
    }
}

/// Total members of one network id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkTotal {
    /// The network id.
    pub network_id: String,
    /// Title of the first row with that id.
    pub title: String,
    /// Sum of `members_count` over every row with that id.
    pub total_members: u64,
}

/// Size and row count of one backing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    /// The entity stored in the file.
    pub entity: Entity,
    /// The backing-file path.
    pub path: PathBuf,
    /// Number of stored rows.
    pub rows: usize,
    /// File size in bytes; zero if the file does not exist yet.
    pub bytes: u64,
}

/// Care-layer operations over a data directory.
#[derive(Debug, Clone)]
pub struct CareBook {
    config: CareConfig,
    users: Table<User>,
    appointments: Table<Appointment>,
    notifications: Table<Notification>,
    profiles: Table<MedicalProfile>,
    networks: Table<SocialNetwork>,
    devices: Table<Device>,
    pipeline: AlertPipeline,
}

impl CareBook {
    /// Opens every table named by `config` through `registry`.
    ///
    /// No I/O happens until the first operation.
    pub fn open(registry: &StoreRegistry, config: CareConfig) -> Self {
        let pipeline = AlertPipeline::open(registry, &config);
        Self {
            users: registry.table(config.path_for(Entity::Users)),
            appointments: registry.table(config.path_for(Entity::Appointments)),
            notifications: registry.table(config.path_for(Entity::Notifications)),
            profiles: registry.table(config.path_for(Entity::Profiles)),
            networks: registry.table(config.path_for(Entity::Networks)),
            devices: registry.table(config.path_for(Entity::Devices)),
            pipeline,
            config,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CareConfig {
        &self.config
    }

    /// Returns the alert pipeline.
    pub fn pipeline(&self) -> &AlertPipeline {
        &self.pipeline
    }

    // Users

    /// Registers a user with id `count + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`CareError::EmailTaken`] if another user has the same email
    /// (compared without regard to ASCII case), or a store error.
    pub fn register_user(&self, new: NewUser, today: NaiveDate) -> Result<User> {
        let email = new.email.trim().to_string();
        if self
            .users
            .find(|user| user.email.eq_ignore_ascii_case(&email))?
            .is_some()
        {
            return Err(CareError::EmailTaken(email).into());
        }

        let user = User {
            user_id: (self.users.count()? + 1).to_string(),
            name: new.name.trim().to_string(),
            email,
            registration_date: today.format(DAY_FORMAT).to_string(),
            role: new.role,
        };
        self.users.append(std::slice::from_ref(&user))?;
        tracing::info!(user_id = %user.user_id, kind = %user.role.kind(), "registered user");
        Ok(user)
    }

    /// Returns the user registered with `email`.
    ///
    /// # Errors
    ///
    /// Returns [`CareError::UnknownUser`] if no user has that email.
    pub fn login(&self, email: &str) -> Result<User> {
        let email = email.trim();
        self.users
            .find(|user| user.email.eq_ignore_ascii_case(email))?
            .ok_or_else(|| CareError::UnknownUser(email.to_string()).into())
    }

    /// Returns the user with `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CareError::UnknownUser`] if no user has that id.
    pub fn find_user(&self, user_id: &str) -> Result<User> {
        self.users
            .find(|user| user.user_id == user_id)?
            .ok_or_else(|| CareError::UnknownUser(user_id.to_string()).into())
    }

    /// Returns every registered user.
    ///
    /// # Errors
    ///
    /// Returns a store or record error.
    pub fn users(&self) -> Result<Vec<User>> {
        self.users.all()
    }

    // Appointments

    /// Schedules an appointment for an existing user.
    ///
    /// # Errors
    ///
    /// - [`CareError::UnknownUser`] if the user does not exist
    /// - [`CareError::InvalidDate`] unless `date` is `YYYY-MM-DD`
    /// - [`CareError::InvalidTime`] unless `time` is `HH:MM`
    pub fn schedule_appointment(
        &self,
        user_id: &str,
        doctor: &str,
        specialty: &str,
        date: &str,
        time: &str,
        medical_comment: Option<&str>,
    ) -> Result<Appointment> {
        self.find_user(user_id)?;
        let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .map_err(|_| CareError::InvalidDate(date.to_string()))?;
        let time = NaiveTime::parse_from_str(time.trim(), TIME_FORMAT)
            .map_err(|_| CareError::InvalidTime(time.to_string()))?;

        let appointment = Appointment {
            appointment_id: (self.appointments.count()? + 1).to_string(),
            user_id: user_id.to_string(),
            doctor: doctor.trim().to_string(),
            specialty: specialty.trim().to_string(),
            date,
            time,
            medical_comment: medical_comment
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        };
        self.appointments.append(std::slice::from_ref(&appointment))?;
        Ok(appointment)
    }

    /// Returns a user's appointments in file order.
    ///
    /// # Errors
    ///
    /// Returns a store or record error.
    pub fn appointments_for(&self, user_id: &str) -> Result<Vec<Appointment>> {
        self.appointments.filter(|a| a.user_id == user_id)
    }

    // Notifications

    /// Sends a notification to an existing user.
    ///
    /// # Errors
    ///
    /// Returns [`CareError::UnknownUser`] if the user does not exist.
    pub fn send_notification(
        &self,
        user_id: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<Notification> {
        self.find_user(user_id)?;
        let notification = Notification {
            notification_id: (self.notifications.count()? + 1).to_string(),
            user_id: user_id.to_string(),
            message: message.to_string(),
            timestamp: iso_timestamp(now),
        };
        self.notifications
            .append(std::slice::from_ref(&notification))?;
        Ok(notification)
    }

    /// Returns a user's notifications in file order.
    ///
    /// # Errors
    ///
    /// Returns a store or record error.
    pub fn notifications_for(&self, user_id: &str) -> Result<Vec<Notification>> {
        self.notifications.filter(|n| n.user_id == user_id)
    }

    // Medical profiles

    /// Stores the medical profile of an existing user.
    ///
    /// # Errors
    ///
    /// - [`CareError::UnknownUser`] if the user does not exist
    /// - [`CareError::ProfileExists`] if the user already has a profile
    pub fn create_medical_profile(&self, profile: &MedicalProfile) -> Result<()> {
        self.find_user(&profile.user_id)?;
        if self.medical_profile(&profile.user_id)?.is_some() {
            return Err(CareError::ProfileExists(profile.user_id.clone()).into());
        }
        self.profiles.update(profile)?;
        Ok(())
    }

    /// Returns a user's medical profile, if any.
    ///
    /// # Errors
    ///
    /// Returns a store or record error.
    pub fn medical_profile(&self, user_id: &str) -> Result<Option<MedicalProfile>> {
        self.profiles.find(|p| p.user_id == user_id)
    }

    // Social networks

    /// Creates an empty network with id `count + 1`.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn create_network(&self, title: &str, today: NaiveDate) -> Result<SocialNetwork> {
        let network = SocialNetwork::new(
            &(self.networks.count()? + 1).to_string(),
            title.trim(),
            &today.format(DAY_FORMAT).to_string(),
        );
        self.networks.append(std::slice::from_ref(&network))?;
        Ok(network)
    }

    /// Returns every network in file order.
    ///
    /// # Errors
    ///
    /// Returns a store or record error.
    pub fn networks(&self) -> Result<Vec<SocialNetwork>> {
        self.networks.all()
    }

    /// Adds a member to a network and rewrites its row.
    ///
    /// # Errors
    ///
    /// Returns [`CareError::UnknownNetwork`] if no network has that id.
    pub fn add_member(&self, network_id: &str, member: Member) -> Result<SocialNetwork> {
        let mut network = self
            .networks
            .find(|n| n.network_id == network_id)?
            .ok_or_else(|| CareError::UnknownNetwork(network_id.to_string()))?;

        let role = member.role.name();
        network.add_member(member);
        self.networks.update(&network)?;
        tracing::info!(
            network_id,
            role,
            members = network.members_count,
            "added network member"
        );
        Ok(network)
    }

    /// Returns the total members per network id, in first-seen order.
    ///
    /// Rows sharing an id (left by older versions that appended instead of
    /// replacing) are summed.
    ///
    /// # Errors
    ///
    /// Returns a store or record error.
    pub fn member_totals(&self) -> Result<Vec<NetworkTotal>> {
        let mut totals: Vec<NetworkTotal> = Vec::new();
        for network in self.networks.all()? {
            match totals.iter_mut().find(|t| t.network_id == network.network_id) {
                Some(total) => total.total_members += network.members_count,
                None => totals.push(NetworkTotal {
                    network_id: network.network_id,
                    title: network.title,
                    total_members: network.members_count,
                }),
            }
        }
        Ok(totals)
    }

    // Devices

    /// Registers a device for an existing user.
    ///
    /// Constant names are trimmed and empty ones dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CareError::UnknownUser`] if the user does not exist.
    pub fn add_device<S: AsRef<str>>(
        &self,
        user_id: &str,
        name: &str,
        serial_number: &str,
        constants: &[S],
        sampling_frequency: u64,
    ) -> Result<Device> {
        self.find_user(user_id)?;
        let device = Device {
            user_id: user_id.to_string(),
            name: name.trim().to_string(),
            serial_number: serial_number.trim().to_string(),
            constants: constants
                .iter()
                .map(|c| c.as_ref().trim())
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
            sampling_frequency,
        };
        self.devices.append(std::slice::from_ref(&device))?;
        Ok(device)
    }

    /// Returns a user's devices in file order.
    ///
    /// # Errors
    ///
    /// Returns a store or record error.
    pub fn devices_for(&self, user_id: &str) -> Result<Vec<Device>> {
        self.devices.filter(|d| d.user_id == user_id)
    }

    // Thresholds

    /// Stores a threshold. Lookup keeps using the first one per constant.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn configure_threshold(&self, threshold: &Threshold) -> Result<WriteSummary> {
        self.pipeline.thresholds().configure(threshold)
    }

    /// Returns every stored threshold.
    ///
    /// # Errors
    ///
    /// Returns a store or record error.
    pub fn thresholds(&self) -> Result<Vec<Threshold>> {
        self.pipeline.thresholds().all()
    }

    // Measurements and alerts

    /// Records a measurement taken by one of the user's devices and
    /// evaluates it against its threshold.
    ///
    /// # Errors
    ///
    /// - [`CareError::UnknownUser`] if the user does not exist
    /// - [`CareError::UnknownDevice`] if the user has no such device
    /// - [`CareError::UnmonitoredConstant`] if the device does not measure
    ///   `constant`
    /// - any error from [`AlertPipeline::evaluate`]
    pub fn record_measurement<R>(
        &self,
        user_id: &str,
        serial_number: &str,
        constant: &str,
        value: f64,
        now: DateTime<Utc>,
        responder: &mut R,
    ) -> Result<Evaluation>
    where
        R: AlertResponder + ?Sized,
    {
        self.find_user(user_id)?;
        let device = self
            .devices
            .find(|d| d.user_id == user_id && d.serial_number == serial_number)?
            .ok_or_else(|| CareError::UnknownDevice {
                user_id: user_id.to_string(),
                serial_number: serial_number.to_string(),
            })?;

        if !device.monitors(constant) {
            return Err(CareError::UnmonitoredConstant {
                serial_number: device.serial_number,
                constant: constant.to_string(),
                monitored: device.constants,
            }
            .into());
        }

        let measurement = Measurement::new(user_id, constant, value, &iso_timestamp(now));
        self.pipeline.ingest_at(&measurement, responder, now)
    }

    /// Returns a user's measurements in file order.
    ///
    /// # Errors
    ///
    /// Returns a store or record error.
    pub fn parameters(&self, user_id: &str) -> Result<Vec<Measurement>> {
        self.pipeline.measurements().filter(|m| m.user_id == user_id)
    }

    /// Returns a user's alerts in file order.
    ///
    /// # Errors
    ///
    /// Returns a store or record error.
    pub fn alerts_for(&self, user_id: &str) -> Result<Vec<Alert>> {
        self.pipeline.alerts().filter(|a| a.user_id == user_id)
    }

    // Files

    /// Returns row count and size of every backing file.
    ///
    /// # Errors
    ///
    /// Returns a store error if a file cannot be read.
    pub fn file_summaries(&self) -> Result<Vec<FileSummary>> {
        Entity::ALL
            .into_iter()
            .map(|entity| {
                let store = self.store_for(entity);
                let bytes = match fs::metadata(store.path()) {
                    Ok(meta) => meta.len(),
                    Err(e) if e.kind() == ErrorKind::NotFound => 0,
                    Err(e) => {
                        return Err(StoreError::Read {
                            path: store.path().to_path_buf(),
                            source: e,
                        }
                        .into());
                    }
                };
                Ok(FileSummary {
                    entity,
                    path: store.path().to_path_buf(),
                    rows: store.read()?.len(),
                    bytes,
                })
            })
            .collect()
    }

    fn store_for(&self, entity: Entity) -> &Rc<RecordStore> {
        match entity {
            Entity::Users => self.users.store(),
            Entity::Appointments => self.appointments.store(),
            Entity::Notifications => self.notifications.store(),
            Entity::Profiles => self.profiles.store(),
            Entity::Networks => self.networks.store(),
            Entity::Measurements => self.pipeline.measurements().store(),
            Entity::Devices => self.devices.store(),
            Entity::Thresholds => self.pipeline.thresholds().table().store(),
            Entity::Alerts => self.pipeline.alerts().store(),
        }
    }
}

/// Formats `now` as an ISO-8601 timestamp with microsecond precision.
pub fn iso_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Micros, true)
}
