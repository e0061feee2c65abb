//! # carebook
//!
//! File-backed personal health records for elderly care.
//!
//! carebook keeps users, appointments, medical profiles, monitoring devices,
//! vital-sign measurements and social networks in plain per-entity record
//! files, and raises alerts when a measurement leaves its configured range.
//!
//! **Status**: This crate is in early development. The API is not yet stable.
//!
//! ## Key Properties
//!
//! - One header-plus-rows text file per entity, readable in any spreadsheet
//! - Merge-on-write: writing a row identical to a stored one never duplicates it
//! - Nested values (lists, mappings) round-trip as compact JSON
//! - Inclusive threshold bounds with first-match lookup per constant
//! - Single-threaded by construction: shared store handles are `Rc`-based
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use carebook::alert::{AlertPipeline, AlertRequest, AlertResponse, FixedResponder};
//! use carebook::config::CareConfig;
//! use carebook::model::Measurement;
//! use carebook::registry::StoreRegistry;
//! use carebook::threshold::Threshold;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = StoreRegistry::new();
//! let pipeline = AlertPipeline::open(&registry, &CareConfig::new("./data"));
//!
//! pipeline
//!     .thresholds()
//!     .configure(&Threshold::range("heart_rate", Some(60.0), Some(100.0)))?;
//!
//! let mut responder = FixedResponder::new(AlertResponse {
//!     contact_number: "600000000".to_string(),
//!     request: AlertRequest::Caregiver {
//!         instructions: "Call her and check the device".to_string(),
//!     },
//! });
//!
//! let outcome = pipeline.ingest(
//!     &Measurement::new("1", "heart_rate", 45.0, "2025-03-05T10:00:00Z"),
//!     &mut responder,
//! )?;
//! assert!(outcome.alert().is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`RecordStore`]: One backing file; read, merge-on-write, upsert
//! - [`StoreRegistry`]: Hands out one shared store per path
//! - [`Table`]: Typed view over a shared store for any [`Record`]
//! - [`ThresholdRegistry`]: First-match threshold lookup
//! - [`AlertPipeline`]: Measurement ingestion and alert generation
//! - [`CareBook`]: User-facing operations over every entity
//!
//! ## Modules
//!
//! - [`store`]: Record stores and typed tables
//! - [`registry`]: Shared store handles
//! - [`record`]: Rows, field values and the [`Record`] trait
//! - [`model`]: Entity records
//! - [`threshold`]: Thresholds and bounds
//! - [`alert`]: Alert categories, responders and the pipeline
//! - [`care`]: Care-layer operations
//! - [`config`]: Data directory configuration
//! - [`error`]: Error types

mod codec;

pub mod alert;
pub mod care;
pub mod config;
pub mod error;
pub mod model;
pub mod record;
pub mod registry;
pub mod store;
pub mod threshold;

// Re-export primary API types at crate root for convenience.
pub use alert::{AlertPipeline, AlertResponder, Evaluation};
pub use care::CareBook;
pub use config::CareConfig;
pub use error::{CarebookError, Result};
pub use record::{Record, Row};
pub use registry::StoreRegistry;
pub use store::{RecordStore, Table};
pub use threshold::ThresholdRegistry;
