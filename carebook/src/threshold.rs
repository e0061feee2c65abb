//! Acceptable ranges for vital-sign constants.
//!
//! A [`Threshold`] stores its bounds as the text the operator entered, so a
//! bad value is kept and reported when a measurement is evaluated rather than
//! lost at configuration time. [`Threshold::bounds`] turns the text into a
//! numeric [`Bounds`].
//!
//! # Bound semantics
//!
//! - An absent or empty `min_level` means no lower bound (−∞)
//! - An absent or empty `max_level` means no upper bound (+∞)
//! - Both bounds are inclusive

use std::path::Path;

use crate::error::{RecordError, Result, ValidationError};
use crate::record::{Record, Row};
use crate::registry::StoreRegistry;
use crate::store::{Table, WriteSummary};

/// Configured acceptable range for one vital-sign constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    /// Name of the vital-sign constant (e.g. `heart_rate`).
    pub constant: String,
    /// Lower bound as entered, if any.
    pub min_level: Option<String>,
    /// Upper bound as entered, if any.
    pub max_level: Option<String>,
    /// Units of the constant, if any.
    pub units: Option<String>,
}

impl Threshold {
    /// Creates a threshold with numeric bounds.
    pub fn range(constant: &str, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            constant: constant.to_string(),
            min_level: min.map(|v| v.to_string()),
            max_level: max.map(|v| v.to_string()),
            units: None,
        }
    }

    /// Sets the units.
    #[must_use]
    pub fn with_units(mut self, units: &str) -> Self {
        self.units = Some(units.to_string());
        self
    }

    /// Parses the stored bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidBound`] if a bound is present but is
    /// not a finite number or not a number at all.
    pub fn bounds(&self) -> std::result::Result<Bounds, ValidationError> {
        let min = self.parse_bound("min", self.min_level.as_deref(), f64::NEG_INFINITY)?;
        let max = self.parse_bound("max", self.max_level.as_deref(), f64::INFINITY)?;
        Ok(Bounds { min, max })
    }

    fn parse_bound(
        &self,
        bound: &'static str,
        text: Option<&str>,
        unbounded: f64,
    ) -> std::result::Result<f64, ValidationError> {
        let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(unbounded);
        };

        match text.parse::<f64>() {
            Ok(value) if !value.is_nan() => Ok(value),
            _ => Err(ValidationError::InvalidBound {
                constant: self.constant.clone(),
                bound,
                value: text.to_string(),
            }),
        }
    }
}

impl Record for Threshold {
    const SCHEMA: &'static [&'static str] = &["constant", "min_level", "max_level", "units"];

    fn to_row(&self) -> std::result::Result<Row, RecordError> {
        Ok(Row::new()
            .with("constant", self.constant.as_str())
            .with_opt("min_level", self.min_level.as_deref())
            .with_opt("max_level", self.max_level.as_deref())
            .with_opt("units", self.units.as_deref()))
    }

    fn from_row(row: &Row) -> std::result::Result<Self, RecordError> {
        Ok(Self {
            constant: row.text("constant").into_owned(),
            min_level: row.opt_text("min_level"),
            max_level: row.opt_text("max_level"),
            units: row.opt_text("units"),
        })
    }
}

/// Numeric inclusive range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Lower bound (−∞ when unbounded).
    pub min: f64,
    /// Upper bound (+∞ when unbounded).
    pub max: f64,
}

/// Which side of its range an out-of-range value fell on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deviation {
    /// Strictly below the lower bound.
    Below,
    /// Strictly above the upper bound.
    Above,
}

impl Bounds {
    /// A range accepting every number.
    pub const UNBOUNDED: Bounds = Bounds {
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
    };

    /// Returns `true` if `value` lies within the inclusive range.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Returns the deviation of `value`, or `None` if it is in range.
    pub fn deviation(&self, value: f64) -> Option<Deviation> {
        if value < self.min {
            Some(Deviation::Below)
        } else if value > self.max {
            Some(Deviation::Above)
        } else {
            None
        }
    }
}

/// Store of [`Threshold`] records with first-match lookup.
#[derive(Debug, Clone)]
pub struct ThresholdRegistry {
    table: Table<Threshold>,
}

impl ThresholdRegistry {
    /// Wraps a threshold table.
    pub fn new(table: Table<Threshold>) -> Self {
        Self { table }
    }

    /// Opens the registry over the shared store for `path`.
    pub fn open<P: AsRef<Path>>(registry: &StoreRegistry, path: P) -> Self {
        Self::new(registry.table(path))
    }

    /// Returns the underlying table.
    pub fn table(&self) -> &Table<Threshold> {
        &self.table
    }

    /// Returns the first stored threshold for `constant`, in file order.
    ///
    /// Later thresholds for the same constant are ignored.
    ///
    /// # Errors
    ///
    /// Returns a store or record error if the thresholds cannot be read.
    pub fn lookup(&self, constant: &str) -> Result<Option<Threshold>> {
        self.table.find(|threshold| threshold.constant == constant)
    }

    /// Appends a threshold.
    ///
    /// A threshold for a constant that already has one is stored but never
    /// returned by [`ThresholdRegistry::lookup`].
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn configure(&self, threshold: &Threshold) -> Result<WriteSummary> {
        if self.lookup(&threshold.constant)?.is_some() {
            tracing::warn!(
                constant = %threshold.constant,
                "a threshold already exists for this constant; lookup keeps using the first one"
            );
        }
        self.table.append(std::slice::from_ref(threshold))
    }

    /// Returns every stored threshold, in file order.
    ///
    /// # Errors
    ///
    /// Returns a store or record error if the thresholds cannot be read.
    pub fn all(&self) -> Result<Vec<Threshold>> {
        self.table.all()
    }
}
