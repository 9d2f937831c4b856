//! Domain layer - business logic and services

pub mod reports;
pub mod repository;
pub mod service;

pub use repository::{
    CatalogRepository, CheckpointRepository, KitRepository, PackageItemRepository,
    PackageRepository, ReportRepository, ScanRepository, ShipmentRepository, Stores,
    SubmissionRepository, UserRepository,
};
pub use service::{GpsPoint, Service};
