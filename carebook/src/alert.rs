//! Threshold evaluation and alert generation.
//!
//! The [`AlertPipeline`] checks each measurement against the first stored
//! threshold for its constant. An out-of-range value produces an [`Alert`]
//! whose category and details are supplied by an [`AlertResponder`]
//! (interactive prompts in the CLI, fixed answers in tests and scripts).
//!
//! # Flow
//!
//! 1. No threshold for the constant: nothing happens (logged at `info`)
//! 2. A bound that is not a number: [`ValidationError::InvalidBound`]
//! 3. Value inside the inclusive range: nothing happens
//! 4. Otherwise the responder is asked for details and the alert is appended
//!    to the alerts store
//!
//! Every out-of-range measurement yields its own alert. There is no
//! suppression of repeated alerts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{CareConfig, Entity};
use crate::error::{AlertError, RecordError, Result, ValidationError};
use crate::model::Measurement;
use crate::record::{Record, Row};
use crate::registry::StoreRegistry;
use crate::store::Table;
use crate::threshold::{Bounds, Deviation, Threshold, ThresholdRegistry};

/// Who an alert is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertCategory {
    /// Emergency services.
    Urgent,
    /// The medical team, who get a time-limited access key.
    MedicalStaff,
    /// The patient's caregiver.
    Caregiver,
}

impl AlertCategory {
    /// All categories, in menu order.
    pub const ALL: [AlertCategory; 3] = [
        AlertCategory::Urgent,
        AlertCategory::MedicalStaff,
        AlertCategory::Caregiver,
    ];

    /// Returns the risk level assigned to alerts of this category.
    pub fn risk_level(self) -> RiskLevel {
        match self {
            AlertCategory::Urgent => RiskLevel::High,
            AlertCategory::MedicalStaff | AlertCategory::Caregiver => RiskLevel::Medium,
        }
    }

    /// Returns the category name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            AlertCategory::Urgent => "urgent",
            AlertCategory::MedicalStaff => "medical-staff",
            AlertCategory::Caregiver => "caregiver",
        }
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlertCategory {
    type Err = String;

    /// Parses a category name or its menu number (`1`, `2`, `3`).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "urgent" | "1" => Ok(AlertCategory::Urgent),
            "medical-staff" | "medical_staff" | "2" => Ok(AlertCategory::MedicalStaff),
            "caregiver" | "3" => Ok(AlertCategory::Caregiver),
            other => Err(format!(
                "unknown alert category {other:?} (expected urgent, medical-staff or caregiver)"
            )),
        }
    }
}

/// Severity recorded on an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    /// Immediate response required.
    High,
    /// Follow-up required.
    Medium,
}

impl RiskLevel {
    /// Stored name of the level.
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    /// Parses a level; also accepts the Catalan names of older files.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "High" | "high" | "Alt" => Ok(RiskLevel::High),
            "Medium" | "medium" | "Mitjà" => Ok(RiskLevel::Medium),
            other => Err(format!("unknown risk level {other:?}")),
        }
    }
}

/// Category-specific details stored with an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlertDetails {
    /// Details for [`AlertCategory::Urgent`].
    Urgent {
        /// Whether an ambulance must be sent.
        ambulance_required: bool,
        /// Code of the patient's clinical history.
        clinical_history_code: String,
    },
    /// Details for [`AlertCategory::MedicalStaff`].
    MedicalStaff {
        /// Time-limited access key, see [`AccessKey`].
        access_key: String,
        /// Description of the situation.
        message: String,
    },
    /// Details for [`AlertCategory::Caregiver`].
    Caregiver {
        /// What the caregiver should do.
        instructions: String,
    },
}

impl AlertDetails {
    /// Returns the category these details belong to.
    pub fn category(&self) -> AlertCategory {
        match self {
            AlertDetails::Urgent { .. } => AlertCategory::Urgent,
            AlertDetails::MedicalStaff { .. } => AlertCategory::MedicalStaff,
            AlertDetails::Caregiver { .. } => AlertCategory::Caregiver,
        }
    }
}

/// A generated alert. Created only by [`AlertPipeline`].
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    /// Id of the measured user.
    pub user_id: String,
    /// Constant that left its range.
    pub constant: String,
    /// The out-of-range value.
    pub value: f64,
    /// Severity.
    pub risk_level: RiskLevel,
    /// Phone number to call about the alert.
    pub contact_number: String,
    /// Category-specific details.
    pub details: AlertDetails,
    /// Timestamp of the triggering measurement.
    pub timestamp: String,
}

impl Alert {
    /// Returns the category of the alert.
    pub fn category(&self) -> AlertCategory {
        self.details.category()
    }
}

impl Record for Alert {
    const SCHEMA: &'static [&'static str] = &[
        "user_id",
        "constant",
        "value",
        "risk_level",
        "contact_number",
        "additional_info",
        "timestamp",
    ];

    fn to_row(&self) -> std::result::Result<Row, RecordError> {
        Ok(Row::new()
            .with("user_id", self.user_id.as_str())
            .with("constant", self.constant.as_str())
            .with_number("value", self.value)
            .with("risk_level", self.risk_level.as_str())
            .with("contact_number", self.contact_number.as_str())
            .with_structured("additional_info", &self.details)?
            .with("timestamp", self.timestamp.as_str()))
    }

    fn from_row(row: &Row) -> std::result::Result<Self, RecordError> {
        let risk_text = row.text("risk_level");
        let risk_level = risk_text.parse().map_err(|_| RecordError::UnknownVariant {
            field: "risk_level".to_string(),
            value: risk_text.clone().into_owned(),
        })?;

        let details = row
            .structured::<Option<AlertDetails>>("additional_info")?
            .ok_or_else(|| RecordError::MissingField {
                field: "additional_info".to_string(),
            })?;

        Ok(Self {
            user_id: row.required("user_id")?,
            constant: row.required("constant")?,
            value: row.number("value")?,
            risk_level,
            contact_number: row.text("contact_number").into_owned(),
            details,
            timestamp: row.text("timestamp").into_owned(),
        })
    }
}

/// A time-limited key granting the medical team access to a patient's data.
///
/// Rendered as `<uuid>.<expiry unix seconds>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessKey {
    token: Uuid,
    expires_at: DateTime<Utc>,
}

impl AccessKey {
    /// Issues a fresh key valid for `ttl` from `now`.
    pub fn issue(now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token: Uuid::new_v4(),
            expires_at: now + ttl,
        }
    }

    /// Parses a rendered key. Returns `None` for anything else, including
    /// placeholder keys found in older files.
    pub fn parse(text: &str) -> Option<Self> {
        let (token, expiry) = text.trim().split_once('.')?;
        let token = Uuid::parse_str(token).ok()?;
        let seconds = expiry.parse::<i64>().ok()?;
        let expires_at = Utc.timestamp_opt(seconds, 0).single()?;
        Some(Self { token, expires_at })
    }

    /// Returns the random part of the key.
    pub fn token(&self) -> Uuid {
        self.token
    }

    /// Returns the expiry time.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns `true` if the key has not expired at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl fmt::Display for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.token, self.expires_at.timestamp())
    }
}

/// An out-of-range measurement awaiting alert details.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// The measurement that left its range.
    pub measurement: Measurement,
    /// The threshold it was checked against.
    pub threshold: Threshold,
    /// Parsed bounds of the threshold.
    pub bounds: Bounds,
    /// Which side of the range the value fell on.
    pub deviation: Deviation,
}

/// What a responder chooses for an alert. The access key of a
/// medical-staff alert is issued by the pipeline, not the responder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertRequest {
    /// Raise an urgent alert.
    Urgent {
        /// Whether an ambulance must be sent.
        ambulance_required: bool,
        /// Code of the patient's clinical history.
        clinical_history_code: String,
    },
    /// Notify the medical team.
    MedicalStaff {
        /// Description of the situation.
        message: String,
    },
    /// Notify the caregiver.
    Caregiver {
        /// What the caregiver should do.
        instructions: String,
    },
}

impl AlertRequest {
    /// Returns the category of the request.
    pub fn category(&self) -> AlertCategory {
        match self {
            AlertRequest::Urgent { .. } => AlertCategory::Urgent,
            AlertRequest::MedicalStaff { .. } => AlertCategory::MedicalStaff,
            AlertRequest::Caregiver { .. } => AlertCategory::Caregiver,
        }
    }
}

/// A responder's answer for one violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertResponse {
    /// Phone number to call about the alert.
    pub contact_number: String,
    /// Category and category-specific details.
    pub request: AlertRequest,
}

/// Supplies the details of an alert once a violation is found.
pub trait AlertResponder {
    /// Returns the alert details for `violation`.
    ///
    /// # Errors
    ///
    /// Returns [`AlertError`] if the details cannot be collected; no alert
    /// is stored in that case.
    fn respond(&mut self, violation: &Violation) -> std::result::Result<AlertResponse, AlertError>;
}

impl<F> AlertResponder for F
where
    F: FnMut(&Violation) -> std::result::Result<AlertResponse, AlertError>,
{
    fn respond(&mut self, violation: &Violation) -> std::result::Result<AlertResponse, AlertError> {
        self(violation)
    }
}

/// Responder that gives the same answer to every violation.
#[derive(Debug, Clone)]
pub struct FixedResponder {
    response: AlertResponse,
    calls: usize,
}

impl FixedResponder {
    /// Creates a responder that always answers `response`.
    pub fn new(response: AlertResponse) -> Self {
        Self { response, calls: 0 }
    }

    /// Returns how many violations were answered.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl AlertResponder for FixedResponder {
    fn respond(&mut self, _violation: &Violation) -> std::result::Result<AlertResponse, AlertError> {
        self.calls += 1;
        Ok(self.response.clone())
    }
}

/// Outcome of evaluating one measurement.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// No threshold is configured for the constant.
    NoThreshold,
    /// The value lies within the inclusive range.
    WithinRange(Bounds),
    /// The value left its range and this alert was stored.
    Alerted(Alert),
}

impl Evaluation {
    /// Returns the stored alert, if one was raised.
    pub fn alert(&self) -> Option<&Alert> {
        match self {
            Evaluation::Alerted(alert) => Some(alert),
            _ => None,
        }
    }
}

/// Measurement ingestion, threshold evaluation and alert storage.
#[derive(Debug, Clone)]
pub struct AlertPipeline {
    thresholds: ThresholdRegistry,
    measurements: Table<Measurement>,
    alerts: Table<Alert>,
    access_key_ttl: Duration,
}

impl AlertPipeline {
    /// Creates a pipeline over the given tables.
    pub fn new(
        thresholds: ThresholdRegistry,
        measurements: Table<Measurement>,
        alerts: Table<Alert>,
        access_key_ttl: Duration,
    ) -> Self {
        Self {
            thresholds,
            measurements,
            alerts,
            access_key_ttl,
        }
    }

    /// Opens the pipeline over the configured files, sharing stores through
    /// `registry`.
    pub fn open(registry: &StoreRegistry, config: &CareConfig) -> Self {
        Self::new(
            ThresholdRegistry::open(registry, config.path_for(Entity::Thresholds)),
            registry.table(config.path_for(Entity::Measurements)),
            registry.table(config.path_for(Entity::Alerts)),
            Duration::hours(i64::from(config.access_key_ttl_hours)),
        )
    }

    /// Returns the threshold registry.
    pub fn thresholds(&self) -> &ThresholdRegistry {
        &self.thresholds
    }

    /// Returns the measurements table.
    pub fn measurements(&self) -> &Table<Measurement> {
        &self.measurements
    }

    /// Returns the alerts table.
    pub fn alerts(&self) -> &Table<Alert> {
        &self.alerts
    }

    /// Appends `measurement` and evaluates it.
    ///
    /// A comparable measurement is stored even if evaluation then fails.
    ///
    /// # Errors
    ///
    /// See [`AlertPipeline::evaluate`]; also fails if the measurement
    /// cannot be stored, and with [`ValidationError::AlreadyRecorded`] if
    /// an identical measurement is already stored. Nothing is evaluated in
    /// either case.
    pub fn ingest<R>(&self, measurement: &Measurement, responder: &mut R) -> Result<Evaluation>
    where
        R: AlertResponder + ?Sized,
    {
        self.ingest_at(measurement, responder, Utc::now())
    }

    /// [`AlertPipeline::ingest`] with an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`AlertPipeline::ingest`].
    pub fn ingest_at<R>(
        &self,
        measurement: &Measurement,
        responder: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Evaluation>
    where
        R: AlertResponder + ?Sized,
    {
        ensure_comparable(measurement)?;
        let summary = self.measurements.append(std::slice::from_ref(measurement))?;
        if summary.added == 0 {
            return Err(already_recorded("measurement", measurement).into());
        }
        self.evaluate_at(measurement, responder, now)
    }

    /// Checks `measurement` against its threshold and stores an alert if it
    /// is out of range.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::NotComparable`] if the value is NaN
    /// - [`ValidationError::InvalidBound`] if a stored bound is not a number
    /// - [`AlertError`] if the responder fails
    /// - [`ValidationError::AlreadyRecorded`] if an identical alert is
    ///   already stored
    /// - a store or record error if thresholds or alerts cannot be accessed
    pub fn evaluate<R>(&self, measurement: &Measurement, responder: &mut R) -> Result<Evaluation>
    where
        R: AlertResponder + ?Sized,
    {
        self.evaluate_at(measurement, responder, Utc::now())
    }

    /// [`AlertPipeline::evaluate`] with an explicit clock, used to stamp
    /// access-key expiry.
    ///
    /// # Errors
    ///
    /// See [`AlertPipeline::evaluate`].
    pub fn evaluate_at<R>(
        &self,
        measurement: &Measurement,
        responder: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Evaluation>
    where
        R: AlertResponder + ?Sized,
    {
        ensure_comparable(measurement)?;
        let constant = measurement.constant.as_str();

        let Some(threshold) = self.thresholds.lookup(constant)? else {
            tracing::info!(constant, "no threshold configured; skipping evaluation");
            return Ok(Evaluation::NoThreshold);
        };

        let bounds = threshold.bounds()?;
        let Some(deviation) = bounds.deviation(measurement.value) else {
            tracing::debug!(constant, value = measurement.value, "measurement within range");
            return Ok(Evaluation::WithinRange(bounds));
        };

        let violation = Violation {
            measurement: measurement.clone(),
            threshold,
            bounds,
            deviation,
        };
        let response = responder.respond(&violation)?;
        let category = response.request.category();

        let details = match response.request {
            AlertRequest::Urgent {
                ambulance_required,
                clinical_history_code,
            } => AlertDetails::Urgent {
                ambulance_required,
                clinical_history_code,
            },
            AlertRequest::MedicalStaff { message } => AlertDetails::MedicalStaff {
                access_key: AccessKey::issue(now, self.access_key_ttl).to_string(),
                message,
            },
            AlertRequest::Caregiver { instructions } => AlertDetails::Caregiver { instructions },
        };

        let alert = Alert {
            user_id: measurement.user_id.clone(),
            constant: measurement.constant.clone(),
            value: measurement.value,
            risk_level: category.risk_level(),
            contact_number: response.contact_number,
            details,
            timestamp: measurement.timestamp.clone(),
        };
        let summary = self.alerts.append(std::slice::from_ref(&alert))?;
        if summary.added == 0 {
            return Err(already_recorded("alert", measurement).into());
        }

        tracing::warn!(
            user_id = %alert.user_id,
            constant,
            value = alert.value,
            %category,
            ?deviation,
            "alert raised"
        );
        Ok(Evaluation::Alerted(alert))
    }
}

fn ensure_comparable(measurement: &Measurement) -> std::result::Result<(), ValidationError> {
    if measurement.value.is_nan() {
        return Err(ValidationError::NotComparable {
            constant: measurement.constant.clone(),
        });
    }
    Ok(())
}

fn already_recorded(entity: &'static str, measurement: &Measurement) -> ValidationError {
    ValidationError::AlreadyRecorded {
        entity,
        user_id: measurement.user_id.clone(),
        constant: measurement.constant.clone(),
        timestamp: measurement.timestamp.clone(),
    }
}
