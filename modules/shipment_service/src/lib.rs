//! Shipment Service Module
//!
//! Tracks humanitarian shipments from assembly to delivery: the
//! shipment/package status lifecycle, kit-based package creation, and the
//! polling pipeline that ingests field-collected survey submissions (GPS
//! scans and device bindings) to drive status forward.

// Public exports
pub mod contract;
pub use contract::{Package, PackageItem, Shipment, ShipmentStatus, TrackingError};

pub mod config;
pub use config::Config;

pub mod domain;
pub use domain::{Service, Stores};

pub mod ingest;
pub use ingest::{IngestPipeline, IngestScheduler, SurveyApiClient};

pub mod infra;
