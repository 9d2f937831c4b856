//! Repository traits for data access
//!
//! These traits define the interface for data access operations.
//! Implementations are in infra/storage/repositories.rs

use crate::contract::{
    CatalogItem, Donor, DonorCategoryData, DonorShipmentData, FieldUser, FormRetrievalCheckpoint,
    FormSubmission, Kit, KitItem, Package, PackageItem, PackageScan, Shipment, ShipmentStatus,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Repository for shipment headers
#[async_trait]
pub trait ShipmentRepository: Send + Sync {
    /// Insert a new shipment, returning it with its assigned id
    async fn insert(&self, shipment: &Shipment) -> Result<Shipment>;

    /// Update an existing shipment
    async fn update(&self, shipment: &Shipment) -> Result<Shipment>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Shipment>>;

    /// Delete the shipment row only; cascades are handled by the caller
    async fn delete(&self, id: i64) -> Result<()>;
}

/// Repository for packages
#[async_trait]
pub trait PackageRepository: Send + Sync {
    /// Insert a batch of packages, each with its items, in one transaction.
    /// Item `package_id`s are fixed up to the assigned package ids.
    /// Returns the created packages.
    async fn create_with_items(
        &self,
        batch: Vec<(Package, Vec<PackageItem>)>,
    ) -> Result<Vec<Package>>;

    async fn update(&self, package: &Package) -> Result<Package>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Package>>;

    /// Look up a package by its unique external (QR) code
    async fn find_by_code(&self, code: &str) -> Result<Option<Package>>;

    async fn list_by_shipment(&self, shipment_id: i64) -> Result<Vec<Package>>;

    /// Highest number_in_shipment currently in use, if any packages exist
    async fn max_number_in_shipment(&self, shipment_id: i64) -> Result<Option<i32>>;

    /// Bulk-move packages of a shipment whose stored status is one of `from`
    /// (None matches packages with no stored status) to `to`.
    /// Returns the number of packages updated.
    async fn set_status_for_shipment(
        &self,
        shipment_id: i64,
        from: &[Option<ShipmentStatus>],
        to: ShipmentStatus,
    ) -> Result<u64>;

    /// Null out last-scan back-references for every package of a shipment
    async fn clear_last_scans_for_shipment(&self, shipment_id: i64) -> Result<u64>;

    async fn delete_by_shipment(&self, shipment_id: i64) -> Result<u64>;
}

/// Repository for package items
#[async_trait]
pub trait PackageItemRepository: Send + Sync {
    async fn insert(&self, item: &PackageItem) -> Result<PackageItem>;

    async fn update(&self, item: &PackageItem) -> Result<PackageItem>;

    async fn find_by_id(&self, id: i64) -> Result<Option<PackageItem>>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn list_by_package(&self, package_id: i64) -> Result<Vec<PackageItem>>;

    async fn list_by_shipment(&self, shipment_id: i64) -> Result<Vec<PackageItem>>;

    /// Items of one shipment attributed to one donor (None = no donor)
    async fn list_by_donor_and_shipment(
        &self,
        donor_id: Option<i64>,
        shipment_id: i64,
    ) -> Result<Vec<PackageItem>>;

    /// Items in one category attributed to one donor, across all shipments
    async fn list_by_donor_and_category(
        &self,
        donor_id: Option<i64>,
        category_id: Option<i64>,
    ) -> Result<Vec<PackageItem>>;

    async fn delete_by_shipment(&self, shipment_id: i64) -> Result<u64>;
}

/// Repository for package scans
#[async_trait]
pub trait ScanRepository: Send + Sync {
    /// Insert a scan unless one already exists for (package, when).
    /// Returns the stored scan, or None when the duplicate was skipped.
    async fn insert(&self, scan: &PackageScan) -> Result<Option<PackageScan>>;

    /// Most recent scan for a package, by observation time
    async fn latest_for_package(&self, package_id: i64) -> Result<Option<PackageScan>>;

    async fn delete_by_shipment(&self, shipment_id: i64) -> Result<u64>;
}

/// Repository for kits and their items
#[async_trait]
pub trait KitRepository: Send + Sync {
    async fn find_kit(&self, id: i64) -> Result<Option<Kit>>;

    async fn list_items(&self, kit_id: i64) -> Result<Vec<KitItem>>;

    /// All KitItem rows for one (kit, catalog item) pair. More than one row
    /// means legacy duplicates that need merging.
    async fn items_for_pair(&self, kit_id: i64, catalog_item_id: i64) -> Result<Vec<KitItem>>;

    async fn insert_item(&self, item: &KitItem) -> Result<KitItem>;

    async fn update_item(&self, item: &KitItem) -> Result<KitItem>;

    async fn delete_items(&self, ids: &[i64]) -> Result<u64>;
}

/// Repository for the catalog/entity store
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn find_item(&self, id: i64) -> Result<Option<CatalogItem>>;

    /// Donors by id, for resolving donor names on shipment summaries
    async fn find_donors(&self, ids: &[i64]) -> Result<Vec<Donor>>;
}

/// Repository for users known to the system
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<FieldUser>>;

    async fn find_by_code(&self, code: &str) -> Result<Option<FieldUser>>;

    /// Clear the given device id from every user currently holding it.
    /// Returns the number of users affected.
    async fn clear_device(&self, device_id: &str) -> Result<u64>;

    async fn update(&self, user: &FieldUser) -> Result<FieldUser>;
}

/// Repository for ingested form submissions
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn exists(&self, uuid: Uuid) -> Result<bool>;

    /// Insert unless the uuid is already present (conflict-tolerant).
    /// Returns true when a row was created.
    async fn insert(&self, submission: &FormSubmission) -> Result<bool>;

    /// Newest stored submission time for a form, used as the fetch cursor
    async fn latest_submission_time(&self, form_id: i64) -> Result<Option<DateTime<Utc>>>;
}

/// Repository for per-form retrieval checkpoints
#[async_trait]
pub trait CheckpointRepository: Send + Sync {
    /// Fetch the checkpoint for a form, creating it at the minimum
    /// timestamp when missing
    async fn get_or_create(&self, form_id: i64) -> Result<FormRetrievalCheckpoint>;

    async fn save(&self, checkpoint: &FormRetrievalCheckpoint) -> Result<()>;
}

/// Repository for materialized report aggregates
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn upsert_donor_shipment(&self, data: &DonorShipmentData) -> Result<()>;

    async fn delete_donor_shipment(&self, donor_id: Option<i64>, shipment_id: i64) -> Result<()>;

    async fn find_donor_shipment(
        &self,
        donor_id: Option<i64>,
        shipment_id: i64,
    ) -> Result<Option<DonorShipmentData>>;

    /// Remove every donor×shipment row for a shipment being deleted
    async fn delete_by_shipment(&self, shipment_id: i64) -> Result<u64>;

    async fn upsert_donor_category(&self, data: &DonorCategoryData) -> Result<()>;

    async fn delete_donor_category(
        &self,
        donor_id: Option<i64>,
        category_id: Option<i64>,
    ) -> Result<()>;

    async fn find_donor_category(
        &self,
        donor_id: Option<i64>,
        category_id: Option<i64>,
    ) -> Result<Option<DonorCategoryData>>;
}

/// Bundle of every store the domain service needs
#[derive(Clone)]
pub struct Stores {
    pub shipments: Arc<dyn ShipmentRepository>,
    pub packages: Arc<dyn PackageRepository>,
    pub package_items: Arc<dyn PackageItemRepository>,
    pub scans: Arc<dyn ScanRepository>,
    pub kits: Arc<dyn KitRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub users: Arc<dyn UserRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub checkpoints: Arc<dyn CheckpointRepository>,
    pub reports: Arc<dyn ReportRepository>,
}
