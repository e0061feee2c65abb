//! Error types for the carebook record store and alert pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for all carebook operations.
///
/// Each variant wraps the error enum of one layer, so callers can match on
/// the layer that failed while still using `?` across layer boundaries.
#[derive(Error, Debug)]
pub enum CarebookError {
    /// Error reading or rewriting a backing file.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Error converting a stored row into a typed record.
    #[error("record error: {0}")]
    Record(#[from] RecordError),

    /// Error validating threshold bounds.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Error while synthesizing an alert.
    #[error("alert error: {0}")]
    Alert(#[from] AlertError),

    /// Error raised by a care-layer operation.
    #[error("care error: {0}")]
    Care(#[from] CareError),

    /// Error loading or validating configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that can occur while reading or writing a backing file.
///
/// A missing file is never an error on read; it reads as an empty store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing file exists but could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        /// The backing file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The backing file could not be rewritten.
    #[error("failed to write '{}': {source}", path.display())]
    Write {
        /// The path being written (the backing file or its staging file).
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file content is not a valid header-plus-rows document.
    #[error("'{}' is malformed at line {line}: {reason}", path.display())]
    Malformed {
        /// The backing file path.
        path: PathBuf,
        /// One-based line number where parsing failed.
        line: usize,
        /// Description of what was wrong.
        reason: String,
    },

    /// The schema passed to a write is empty or repeats a field.
    #[error("invalid schema {fields:?}: {reason}")]
    InvalidSchema {
        /// The offending field list.
        fields: Vec<String>,
        /// Why the schema is invalid.
        reason: String,
    },

    /// An upsert was requested on a field the schema does not contain.
    #[error("key field '{field}' is not part of schema {fields:?}")]
    UnknownKeyField {
        /// The requested key field.
        field: String,
        /// The schema fields.
        fields: Vec<String>,
    },
}

/// Errors that can occur when converting a row into a typed record.
#[derive(Error, Debug)]
pub enum RecordError {
    /// A field that must hold a number does not.
    #[error("field '{field}' is not a number: {value:?}")]
    NotANumber {
        /// The field name.
        field: String,
        /// The raw stored text.
        value: String,
    },

    /// A field that must hold a boolean does not.
    #[error("field '{field}' is not a boolean: {value:?}")]
    NotABoolean {
        /// The field name.
        field: String,
        /// The raw stored text.
        value: String,
    },

    /// A required field is absent or empty.
    #[error("required field '{field}' is missing")]
    MissingField {
        /// The field name.
        field: String,
    },

    /// A field holds a value outside its enumerated set.
    #[error("field '{field}' has unknown value {value:?}")]
    UnknownVariant {
        /// The field name.
        field: String,
        /// The raw stored text.
        value: String,
    },

    /// A field does not match its expected text format.
    #[error("field '{field}' value {value:?} is not {expected}")]
    BadFormat {
        /// The field name.
        field: String,
        /// The raw stored text.
        value: String,
        /// Description of the expected format.
        expected: &'static str,
    },

    /// A structured field could not be decoded into its expected shape.
    #[error("field '{field}' has an unexpected structure: {source}")]
    Structure {
        /// The field name.
        field: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised when threshold bounds cannot be interpreted.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A bound is present but is not a number.
    #[error("{bound} bound {value:?} for constant '{constant}' is not numeric")]
    InvalidBound {
        /// The vital-sign constant the threshold applies to.
        constant: String,
        /// Which bound failed (`min` or `max`).
        bound: &'static str,
        /// The stored text.
        value: String,
    },

    /// The measurement value is NaN and cannot be compared.
    #[error("measurement of '{constant}' is not a comparable number")]
    NotComparable {
        /// The vital-sign constant.
        constant: String,
    },

    /// An identical row is already stored, so the write added nothing.
    #[error("{entity} for user '{user_id}' ({constant} at {timestamp:?}) is already recorded")]
    AlreadyRecorded {
        /// What was being stored (`measurement` or `alert`).
        entity: &'static str,
        /// The measured user.
        user_id: String,
        /// The vital-sign constant.
        constant: String,
        /// Timestamp of the measurement.
        timestamp: String,
    },
}

/// Errors raised while collecting context for an alert.
#[derive(Error, Debug)]
pub enum AlertError {
    /// The responder gave up before supplying the alert details.
    #[error("alert for '{constant}' was not completed: {reason}")]
    Incomplete {
        /// The vital-sign constant that triggered the alert.
        constant: String,
        /// Why the responder stopped.
        reason: String,
    },

    /// The responder could not read from its input.
    #[error("failed to read alert details: {source}")]
    Input {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by care-layer operations.
#[derive(Error, Debug)]
pub enum CareError {
    /// No user has the given id or email.
    #[error("unknown user '{0}'")]
    UnknownUser(String),

    /// The email is already registered.
    #[error("email '{0}' is already registered")]
    EmailTaken(String),

    /// The user already has a medical profile.
    #[error("user '{0}' already has a medical profile")]
    ProfileExists(String),

    /// No social network has the given id.
    #[error("unknown social network '{0}'")]
    UnknownNetwork(String),

    /// The user owns no device with the given serial number.
    #[error("user '{user_id}' has no device with serial '{serial_number}'")]
    UnknownDevice {
        /// The user id.
        user_id: String,
        /// The requested serial number.
        serial_number: String,
    },

    /// The device does not monitor the requested constant.
    #[error("device '{serial_number}' does not monitor '{constant}' (monitors {monitored:?})")]
    UnmonitoredConstant {
        /// The device serial number.
        serial_number: String,
        /// The requested constant.
        constant: String,
        /// The constants the device does monitor.
        monitored: Vec<String>,
    },

    /// A date is not in `YYYY-MM-DD` form.
    #[error("invalid date {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// A time is not in `HH:MM` form.
    #[error("invalid time {0:?} (expected HH:MM)")]
    InvalidTime(String),
}

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        /// The config file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for [`crate::config::CareConfig`].
    #[error("failed to parse config '{}': {source}", path.display())]
    Parse {
        /// The config file path.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The configuration parsed but is not usable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Description of what is wrong.
        reason: String,
    },
}

/// Type alias for `Result<T, CarebookError>`.
pub type Result<T> = std::result::Result<T, CarebookError>;
