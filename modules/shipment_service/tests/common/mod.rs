//! Common test utilities: an in-memory store backing every repository
//! trait, a fake survey server, and fixture builders.
#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use serde_json::Value;
use shipment_service::config::{Config, SurveyConfig};
use shipment_service::contract::*;
use shipment_service::domain::repository::*;
use shipment_service::domain::Service;
use shipment_service::ingest::api::{SurveyApi, SurveyApiError, SUBMISSION_TIME_FORMAT};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub const PACKAGE_FORM_ID: i64 = 42;
pub const DEVICE_FORM_ID: i64 = 77;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn instant(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

pub fn test_config() -> Config {
    Config {
        survey: SurveyConfig {
            base_url: "http://survey.test".to_string(),
            api_token: "sekrit".to_string(),
            package_form_id: PACKAGE_FORM_ID,
            device_form_id: DEVICE_FORM_ID,
            poll_interval_secs: 300,
        },
        ..Config::default()
    }
}

/// Build a service over a fresh in-memory store
pub fn service_with_store() -> (Arc<Service>, Arc<MemStore>) {
    let store = Arc::new(MemStore::default());
    let service = Arc::new(Service::new(store.stores(), test_config()));
    (service, store)
}

// ===== In-memory store =====

#[derive(Default)]
struct Inner {
    next_id: i64,
    shipments: HashMap<i64, Shipment>,
    packages: HashMap<i64, Package>,
    package_items: HashMap<i64, PackageItem>,
    scans: HashMap<i64, PackageScan>,
    kits: HashMap<i64, Kit>,
    kit_items: HashMap<i64, KitItem>,
    catalog_items: HashMap<i64, CatalogItem>,
    donors: HashMap<i64, Donor>,
    users: HashMap<i64, FieldUser>,
    submissions: HashMap<Uuid, FormSubmission>,
    checkpoints: HashMap<i64, FormRetrievalCheckpoint>,
    donor_shipment: HashMap<(Option<i64>, i64), DonorShipmentData>,
    donor_category: HashMap<(Option<i64>, Option<i64>), DonorCategoryData>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// One struct implements every repository trait, so a single Arc serves as
/// the entire database.
#[derive(Default)]
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    pub fn stores(self: &Arc<Self>) -> Stores {
        Stores {
            shipments: self.clone(),
            packages: self.clone(),
            package_items: self.clone(),
            scans: self.clone(),
            kits: self.clone(),
            catalog: self.clone(),
            users: self.clone(),
            submissions: self.clone(),
            checkpoints: self.clone(),
            reports: self.clone(),
        }
    }

    // ----- fixtures -----

    pub fn add_donor(&self, name: &str) -> Donor {
        let mut inner = self.inner.write();
        let id = inner.next_id();
        let donor = Donor {
            id,
            name: name.to_string(),
        };
        inner.donors.insert(id, donor.clone());
        donor
    }

    pub fn add_catalog_item(
        &self,
        description: &str,
        price_usd: &str,
        category_id: i64,
        donor_id: Option<i64>,
    ) -> CatalogItem {
        let mut inner = self.inner.write();
        let id = inner.next_id();
        let item = CatalogItem {
            id,
            item_code: format!("C-{id}"),
            description: description.to_string(),
            unit: "each".to_string(),
            price_usd: price_usd.parse().unwrap(),
            price_local: Decimal::ZERO,
            item_category_id: category_id,
            donor_id,
            supplier_id: None,
            weight_grams: Some(250),
        };
        inner.catalog_items.insert(id, item.clone());
        item
    }

    pub fn add_kit(&self, name: &str) -> Kit {
        let mut inner = self.inner.write();
        let id = inner.next_id();
        let kit = Kit {
            id,
            name: name.to_string(),
            description: format!("{name} kit"),
        };
        inner.kits.insert(id, kit.clone());
        kit
    }

    /// Insert a KitItem row directly, bypassing the merge logic; used to
    /// fabricate legacy duplicate rows.
    pub fn add_kit_item(&self, kit_id: i64, catalog_item_id: i64, quantity: i32) -> KitItem {
        let mut inner = self.inner.write();
        let id = inner.next_id();
        let item = KitItem {
            id,
            kit_id,
            catalog_item_id,
            quantity,
        };
        inner.kit_items.insert(id, item.clone());
        item
    }

    pub fn add_user(&self, name: &str, code: &str, device_id: &str, role: UserRole) -> FieldUser {
        let mut inner = self.inner.write();
        let id = inner.next_id();
        let user = FieldUser {
            id,
            name: name.to_string(),
            code: code.to_string(),
            device_id: device_id.to_string(),
            role,
        };
        inner.users.insert(id, user.clone());
        user
    }

    pub fn add_shipment(&self, partner_id: i64, status: ShipmentStatus) -> Shipment {
        let mut inner = self.inner.write();
        let id = inner.next_id();
        let shipment = Shipment {
            id,
            description: format!("Shipment {id}"),
            shipment_date: day(2015, 3, 15),
            store_release: format!("SR-{id}"),
            status,
            transporter_id: None,
            partner_id,
            acceptable: false,
            status_note: String::new(),
            donor: None,
            last_scan_status_label: None,
            date_picked_up: None,
            date_in_transit: None,
            date_expected: None,
            date_received: None,
        };
        inner.shipments.insert(id, shipment.clone());
        shipment
    }

    pub fn add_package(
        &self,
        shipment_id: i64,
        number: i32,
        status: Option<ShipmentStatus>,
    ) -> Package {
        let mut inner = self.inner.write();
        let id = inner.next_id();
        let package = Package {
            id,
            shipment_id,
            name: format!("Package {number}"),
            description: String::new(),
            number_in_shipment: number,
            status,
            code: format!("/JO{shipment_id}.{number}"),
            kit_id: None,
            last_scan_id: None,
            last_scan_status_label: None,
            date_picked_up: None,
            date_in_transit: None,
            date_received: None,
        };
        inner.packages.insert(id, package.clone());
        package
    }

    pub fn add_package_item(
        &self,
        package_id: i64,
        donor_id: Option<i64>,
        category_id: Option<i64>,
        quantity: i32,
        price_usd: &str,
    ) -> PackageItem {
        let mut inner = self.inner.write();
        let id = inner.next_id();
        let item = PackageItem {
            id,
            package_id,
            catalog_item_id: None,
            description: "Loose item".to_string(),
            unit: "each".to_string(),
            price_usd: price_usd.parse().unwrap(),
            price_local: Decimal::ZERO,
            item_category_id: category_id,
            donor_id,
            supplier_id: None,
            weight_grams: None,
            quantity,
        };
        inner.package_items.insert(id, item.clone());
        item
    }

    // ----- inspection -----

    pub fn shipment(&self, id: i64) -> Shipment {
        self.inner.read().shipments.get(&id).cloned().unwrap()
    }

    pub fn package(&self, id: i64) -> Package {
        self.inner.read().packages.get(&id).cloned().unwrap()
    }

    pub fn package_by_code(&self, code: &str) -> Option<Package> {
        self.inner
            .read()
            .packages
            .values()
            .find(|p| p.code == code)
            .cloned()
    }

    pub fn packages_of(&self, shipment_id: i64) -> Vec<Package> {
        let mut packages: Vec<Package> = self
            .inner
            .read()
            .packages
            .values()
            .filter(|p| p.shipment_id == shipment_id)
            .cloned()
            .collect();
        packages.sort_by_key(|p| p.number_in_shipment);
        packages
    }

    pub fn items_of_package(&self, package_id: i64) -> Vec<PackageItem> {
        let mut items: Vec<PackageItem> = self
            .inner
            .read()
            .package_items
            .values()
            .filter(|i| i.package_id == package_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.id);
        items
    }

    pub fn scans_of_package(&self, package_id: i64) -> Vec<PackageScan> {
        let mut scans: Vec<PackageScan> = self
            .inner
            .read()
            .scans
            .values()
            .filter(|s| s.package_id == package_id)
            .cloned()
            .collect();
        scans.sort_by_key(|s| s.when);
        scans
    }

    pub fn scan_count(&self) -> usize {
        self.inner.read().scans.len()
    }

    pub fn submission_count(&self) -> usize {
        self.inner.read().submissions.len()
    }

    pub fn checkpoint_for(&self, form_id: i64) -> Option<FormRetrievalCheckpoint> {
        self.inner.read().checkpoints.get(&form_id).cloned()
    }

    pub fn user(&self, id: i64) -> FieldUser {
        self.inner.read().users.get(&id).cloned().unwrap()
    }

    pub fn kit_items_of(&self, kit_id: i64) -> Vec<KitItem> {
        let mut items: Vec<KitItem> = self
            .inner
            .read()
            .kit_items
            .values()
            .filter(|i| i.kit_id == kit_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.id);
        items
    }

    pub fn donor_shipment_row(
        &self,
        donor_id: Option<i64>,
        shipment_id: i64,
    ) -> Option<DonorShipmentData> {
        self.inner
            .read()
            .donor_shipment
            .get(&(donor_id, shipment_id))
            .cloned()
    }

    pub fn donor_category_row(
        &self,
        donor_id: Option<i64>,
        category_id: Option<i64>,
    ) -> Option<DonorCategoryData> {
        self.inner
            .read()
            .donor_category
            .get(&(donor_id, category_id))
            .cloned()
    }

    pub fn item_count(&self) -> usize {
        self.inner.read().package_items.len()
    }
}

#[async_trait]
impl ShipmentRepository for MemStore {
    async fn insert(&self, shipment: &Shipment) -> Result<Shipment> {
        let mut inner = self.inner.write();
        let mut shipment = shipment.clone();
        shipment.id = inner.next_id();
        inner.shipments.insert(shipment.id, shipment.clone());
        Ok(shipment)
    }

    async fn update(&self, shipment: &Shipment) -> Result<Shipment> {
        let mut inner = self.inner.write();
        if !inner.shipments.contains_key(&shipment.id) {
            bail!("no shipment {}", shipment.id);
        }
        inner.shipments.insert(shipment.id, shipment.clone());
        Ok(shipment.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Shipment>> {
        Ok(self.inner.read().shipments.get(&id).cloned())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.inner.write().shipments.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl PackageRepository for MemStore {
    async fn create_with_items(
        &self,
        batch: Vec<(Package, Vec<PackageItem>)>,
    ) -> Result<Vec<Package>> {
        let mut inner = self.inner.write();
        let mut created = Vec::with_capacity(batch.len());
        for (package, items) in batch {
            let mut package = package;
            package.id = inner.next_id();
            inner.packages.insert(package.id, package.clone());
            for item in items {
                let mut item = item;
                item.id = inner.next_id();
                item.package_id = package.id;
                inner.package_items.insert(item.id, item);
            }
            created.push(package);
        }
        Ok(created)
    }

    async fn update(&self, package: &Package) -> Result<Package> {
        let mut inner = self.inner.write();
        if !inner.packages.contains_key(&package.id) {
            bail!("no package {}", package.id);
        }
        inner.packages.insert(package.id, package.clone());
        Ok(package.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Package>> {
        Ok(self.inner.read().packages.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Package>> {
        Ok(self.package_by_code(code))
    }

    async fn list_by_shipment(&self, shipment_id: i64) -> Result<Vec<Package>> {
        Ok(self.packages_of(shipment_id))
    }

    async fn max_number_in_shipment(&self, shipment_id: i64) -> Result<Option<i32>> {
        Ok(self
            .inner
            .read()
            .packages
            .values()
            .filter(|p| p.shipment_id == shipment_id)
            .map(|p| p.number_in_shipment)
            .max())
    }

    async fn set_status_for_shipment(
        &self,
        shipment_id: i64,
        from: &[Option<ShipmentStatus>],
        to: ShipmentStatus,
    ) -> Result<u64> {
        let mut inner = self.inner.write();
        let mut updated = 0;
        for package in inner.packages.values_mut() {
            if package.shipment_id == shipment_id && from.contains(&package.status) {
                package.status = Some(to);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn clear_last_scans_for_shipment(&self, shipment_id: i64) -> Result<u64> {
        let mut inner = self.inner.write();
        let mut cleared = 0;
        for package in inner.packages.values_mut() {
            if package.shipment_id == shipment_id && package.last_scan_id.is_some() {
                package.last_scan_id = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn delete_by_shipment(&self, shipment_id: i64) -> Result<u64> {
        let mut inner = self.inner.write();
        let before = inner.packages.len();
        inner.packages.retain(|_, p| p.shipment_id != shipment_id);
        Ok((before - inner.packages.len()) as u64)
    }
}

#[async_trait]
impl PackageItemRepository for MemStore {
    async fn insert(&self, item: &PackageItem) -> Result<PackageItem> {
        let mut inner = self.inner.write();
        let mut item = item.clone();
        item.id = inner.next_id();
        inner.package_items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update(&self, item: &PackageItem) -> Result<PackageItem> {
        let mut inner = self.inner.write();
        if !inner.package_items.contains_key(&item.id) {
            bail!("no package item {}", item.id);
        }
        inner.package_items.insert(item.id, item.clone());
        Ok(item.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PackageItem>> {
        Ok(self.inner.read().package_items.get(&id).cloned())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.inner.write().package_items.remove(&id);
        Ok(())
    }

    async fn list_by_package(&self, package_id: i64) -> Result<Vec<PackageItem>> {
        Ok(self.items_of_package(package_id))
    }

    async fn list_by_shipment(&self, shipment_id: i64) -> Result<Vec<PackageItem>> {
        let inner = self.inner.read();
        let package_ids: Vec<i64> = inner
            .packages
            .values()
            .filter(|p| p.shipment_id == shipment_id)
            .map(|p| p.id)
            .collect();
        Ok(inner
            .package_items
            .values()
            .filter(|i| package_ids.contains(&i.package_id))
            .cloned()
            .collect())
    }

    async fn list_by_donor_and_shipment(
        &self,
        donor_id: Option<i64>,
        shipment_id: i64,
    ) -> Result<Vec<PackageItem>> {
        let items = PackageItemRepository::list_by_shipment(self, shipment_id).await?;
        Ok(items.into_iter().filter(|i| i.donor_id == donor_id).collect())
    }

    async fn list_by_donor_and_category(
        &self,
        donor_id: Option<i64>,
        category_id: Option<i64>,
    ) -> Result<Vec<PackageItem>> {
        Ok(self
            .inner
            .read()
            .package_items
            .values()
            .filter(|i| i.donor_id == donor_id && i.item_category_id == category_id)
            .cloned()
            .collect())
    }

    async fn delete_by_shipment(&self, shipment_id: i64) -> Result<u64> {
        let package_ids: Vec<i64> = self
            .inner
            .read()
            .packages
            .values()
            .filter(|p| p.shipment_id == shipment_id)
            .map(|p| p.id)
            .collect();
        let mut inner = self.inner.write();
        let before = inner.package_items.len();
        inner
            .package_items
            .retain(|_, i| !package_ids.contains(&i.package_id));
        Ok((before - inner.package_items.len()) as u64)
    }
}

#[async_trait]
impl ScanRepository for MemStore {
    async fn insert(&self, scan: &PackageScan) -> Result<Option<PackageScan>> {
        let mut inner = self.inner.write();
        let duplicate = inner
            .scans
            .values()
            .any(|s| s.package_id == scan.package_id && s.when == scan.when);
        if duplicate {
            return Ok(None);
        }
        let mut scan = scan.clone();
        scan.id = inner.next_id();
        inner.scans.insert(scan.id, scan.clone());
        Ok(Some(scan))
    }

    async fn latest_for_package(&self, package_id: i64) -> Result<Option<PackageScan>> {
        Ok(self
            .inner
            .read()
            .scans
            .values()
            .filter(|s| s.package_id == package_id)
            .max_by_key(|s| (s.when, s.id))
            .cloned())
    }

    async fn delete_by_shipment(&self, shipment_id: i64) -> Result<u64> {
        let mut inner = self.inner.write();
        let before = inner.scans.len();
        inner.scans.retain(|_, s| s.shipment_id != shipment_id);
        Ok((before - inner.scans.len()) as u64)
    }
}

#[async_trait]
impl KitRepository for MemStore {
    async fn find_kit(&self, id: i64) -> Result<Option<Kit>> {
        Ok(self.inner.read().kits.get(&id).cloned())
    }

    async fn list_items(&self, kit_id: i64) -> Result<Vec<KitItem>> {
        Ok(self.kit_items_of(kit_id))
    }

    async fn items_for_pair(&self, kit_id: i64, catalog_item_id: i64) -> Result<Vec<KitItem>> {
        Ok(self
            .kit_items_of(kit_id)
            .into_iter()
            .filter(|i| i.catalog_item_id == catalog_item_id)
            .collect())
    }

    async fn insert_item(&self, item: &KitItem) -> Result<KitItem> {
        let mut inner = self.inner.write();
        let mut item = item.clone();
        item.id = inner.next_id();
        inner.kit_items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update_item(&self, item: &KitItem) -> Result<KitItem> {
        let mut inner = self.inner.write();
        if !inner.kit_items.contains_key(&item.id) {
            bail!("no kit item {}", item.id);
        }
        inner.kit_items.insert(item.id, item.clone());
        Ok(item.clone())
    }

    async fn delete_items(&self, ids: &[i64]) -> Result<u64> {
        let mut inner = self.inner.write();
        let before = inner.kit_items.len();
        inner.kit_items.retain(|id, _| !ids.contains(id));
        Ok((before - inner.kit_items.len()) as u64)
    }
}

#[async_trait]
impl CatalogRepository for MemStore {
    async fn find_item(&self, id: i64) -> Result<Option<CatalogItem>> {
        Ok(self.inner.read().catalog_items.get(&id).cloned())
    }

    async fn find_donors(&self, ids: &[i64]) -> Result<Vec<Donor>> {
        Ok(self
            .inner
            .read()
            .donors
            .values()
            .filter(|d| ids.contains(&d.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserRepository for MemStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<FieldUser>> {
        Ok(self.inner.read().users.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<FieldUser>> {
        Ok(self
            .inner
            .read()
            .users
            .values()
            .find(|u| u.code == code)
            .cloned())
    }

    async fn clear_device(&self, device_id: &str) -> Result<u64> {
        let mut inner = self.inner.write();
        let mut cleared = 0;
        for user in inner.users.values_mut() {
            if user.device_id == device_id {
                user.device_id = String::new();
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn update(&self, user: &FieldUser) -> Result<FieldUser> {
        let mut inner = self.inner.write();
        if !inner.users.contains_key(&user.id) {
            bail!("no user {}", user.id);
        }
        inner.users.insert(user.id, user.clone());
        Ok(user.clone())
    }
}

#[async_trait]
impl SubmissionRepository for MemStore {
    async fn exists(&self, uuid: Uuid) -> Result<bool> {
        Ok(self.inner.read().submissions.contains_key(&uuid))
    }

    async fn insert(&self, submission: &FormSubmission) -> Result<bool> {
        let mut inner = self.inner.write();
        if inner.submissions.contains_key(&submission.uuid) {
            return Ok(false);
        }
        let mut submission = submission.clone();
        submission.id = inner.next_id();
        inner.submissions.insert(submission.uuid, submission);
        Ok(true)
    }

    async fn latest_submission_time(&self, form_id: i64) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .inner
            .read()
            .submissions
            .values()
            .filter(|s| s.form_id == form_id)
            .map(|s| s.submission_time)
            .max())
    }
}

#[async_trait]
impl CheckpointRepository for MemStore {
    async fn get_or_create(&self, form_id: i64) -> Result<FormRetrievalCheckpoint> {
        let mut inner = self.inner.write();
        let checkpoint = inner
            .checkpoints
            .entry(form_id)
            .or_insert_with(|| FormRetrievalCheckpoint::new(form_id));
        Ok(checkpoint.clone())
    }

    async fn save(&self, checkpoint: &FormRetrievalCheckpoint) -> Result<()> {
        self.inner
            .write()
            .checkpoints
            .insert(checkpoint.form_id, checkpoint.clone());
        Ok(())
    }
}

#[async_trait]
impl ReportRepository for MemStore {
    async fn upsert_donor_shipment(&self, data: &DonorShipmentData) -> Result<()> {
        self.inner
            .write()
            .donor_shipment
            .insert((data.donor_id, data.shipment_id), data.clone());
        Ok(())
    }

    async fn delete_donor_shipment(&self, donor_id: Option<i64>, shipment_id: i64) -> Result<()> {
        self.inner.write().donor_shipment.remove(&(donor_id, shipment_id));
        Ok(())
    }

    async fn find_donor_shipment(
        &self,
        donor_id: Option<i64>,
        shipment_id: i64,
    ) -> Result<Option<DonorShipmentData>> {
        Ok(self.donor_shipment_row(donor_id, shipment_id))
    }

    async fn delete_by_shipment(&self, shipment_id: i64) -> Result<u64> {
        let mut inner = self.inner.write();
        let before = inner.donor_shipment.len();
        inner.donor_shipment.retain(|(_, sid), _| *sid != shipment_id);
        Ok((before - inner.donor_shipment.len()) as u64)
    }

    async fn upsert_donor_category(&self, data: &DonorCategoryData) -> Result<()> {
        self.inner
            .write()
            .donor_category
            .insert((data.donor_id, data.category_id), data.clone());
        Ok(())
    }

    async fn delete_donor_category(
        &self,
        donor_id: Option<i64>,
        category_id: Option<i64>,
    ) -> Result<()> {
        self.inner.write().donor_category.remove(&(donor_id, category_id));
        Ok(())
    }

    async fn find_donor_category(
        &self,
        donor_id: Option<i64>,
        category_id: Option<i64>,
    ) -> Result<Option<DonorCategoryData>> {
        Ok(self.donor_category_row(donor_id, category_id))
    }
}

// ===== Fake survey server =====

#[derive(Default)]
struct FakeInner {
    definitions: HashMap<i64, Value>,
    submissions: HashMap<i64, Vec<Value>>,
    definition_calls: usize,
    submission_calls: usize,
    fail_submissions_with: Option<SurveyApiError>,
}

/// In-process stand-in for the survey server. Forms without a registered
/// definition answer with an empty object, the way a misconfigured form id
/// behaves.
#[derive(Default)]
pub struct FakeSurveyServer {
    inner: Mutex<FakeInner>,
}

impl FakeSurveyServer {
    pub fn set_definition(&self, form_id: i64, definition: Value) {
        self.inner.lock().definitions.insert(form_id, definition);
    }

    pub fn push_submission(&self, form_id: i64, payload: Value) {
        self.inner.lock().submissions.entry(form_id).or_default().push(payload);
    }

    pub fn fail_next_submissions(&self, error: SurveyApiError) {
        self.inner.lock().fail_submissions_with = Some(error);
    }

    pub fn definition_calls(&self) -> usize {
        self.inner.lock().definition_calls
    }

    pub fn submission_calls(&self) -> usize {
        self.inner.lock().submission_calls
    }
}

#[async_trait]
impl SurveyApi for FakeSurveyServer {
    async fn get_form_definition(&self, form_id: i64) -> Result<Value, SurveyApiError> {
        let mut inner = self.inner.lock();
        inner.definition_calls += 1;
        Ok(inner
            .definitions
            .get(&form_id)
            .cloned()
            .unwrap_or(Value::Object(serde_json::Map::new())))
    }

    async fn get_form_submissions(
        &self,
        form_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Value>, SurveyApiError> {
        let mut inner = self.inner.lock();
        inner.submission_calls += 1;
        if let Some(error) = inner.fail_submissions_with.take() {
            return Err(error);
        }
        let all = inner.submissions.get(&form_id).cloned().unwrap_or_default();
        let Some(since) = since else {
            return Ok(all);
        };
        Ok(all
            .into_iter()
            .filter(|payload| {
                payload
                    .get("_submission_time")
                    .and_then(Value::as_str)
                    .and_then(|t| {
                        chrono::NaiveDateTime::parse_from_str(t, SUBMISSION_TIME_FORMAT).ok()
                    })
                    .map(|t| t.and_utc() > since)
                    .unwrap_or(true)
            })
            .collect())
    }
}
