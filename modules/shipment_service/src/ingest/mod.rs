//! Ingestion of field-collected survey submissions

pub mod api;
pub mod pipeline;
pub mod scheduler;
pub mod submission;

pub use api::{SurveyApi, SurveyApiClient, SurveyApiError};
pub use pipeline::{IngestPipeline, IngestSummary};
pub use scheduler::{spawn_delete_shipment, IngestScheduler};
pub use submission::{DeviceSubmission, FormDefinition, ScanSubmission};
