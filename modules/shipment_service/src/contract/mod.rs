//! Public contract: domain models and errors

pub mod error;
pub mod model;

pub use error::TrackingError;
pub use model::{
    CatalogItem, Donor, DonorCategoryData, DonorShipmentData, FieldUser, FormRetrievalCheckpoint,
    FormSubmission, ItemCategory, Kit, KitItem, Package, PackageItem, PackageScan, Shipment,
    ShipmentStatus, Supplier, Transporter, UserRole,
};
