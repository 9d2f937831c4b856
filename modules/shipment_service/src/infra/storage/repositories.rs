//! SeaORM repository implementations

use crate::contract::{
    CatalogItem, Donor, DonorCategoryData, DonorShipmentData, FieldUser, FormRetrievalCheckpoint,
    FormSubmission, Kit, KitItem, Package, PackageItem, PackageScan, Shipment, ShipmentStatus,
};
use crate::domain::repository::{
    CatalogRepository, CheckpointRepository, KitRepository, PackageItemRepository,
    PackageRepository, ReportRepository, ScanRepository, ShipmentRepository, Stores,
    SubmissionRepository, UserRepository,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    prelude::Expr, sea_query::OnConflict, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use super::entity;

/// Wire every repository to one database connection
pub fn sea_orm_stores(db: Arc<DatabaseConnection>) -> Stores {
    Stores {
        shipments: Arc::new(SeaOrmShipmentRepository::new(db.clone())),
        packages: Arc::new(SeaOrmPackageRepository::new(db.clone())),
        package_items: Arc::new(SeaOrmPackageItemRepository::new(db.clone())),
        scans: Arc::new(SeaOrmScanRepository::new(db.clone())),
        kits: Arc::new(SeaOrmKitRepository::new(db.clone())),
        catalog: Arc::new(SeaOrmCatalogRepository::new(db.clone())),
        users: Arc::new(SeaOrmUserRepository::new(db.clone())),
        submissions: Arc::new(SeaOrmSubmissionRepository::new(db.clone())),
        checkpoints: Arc::new(SeaOrmCheckpointRepository::new(db.clone())),
        reports: Arc::new(SeaOrmReportRepository::new(db)),
    }
}

fn donor_condition<C: ColumnTrait>(column: C, donor_id: Option<i64>) -> Condition {
    match donor_id {
        Some(id) => Condition::all().add(column.eq(id)),
        None => Condition::all().add(column.is_null()),
    }
}

// ===== Shipment Repository =====

pub struct SeaOrmShipmentRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmShipmentRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ShipmentRepository for SeaOrmShipmentRepository {
    async fn insert(&self, shipment: &Shipment) -> Result<Shipment> {
        let active: entity::shipment::ActiveModel = shipment.into();
        let result = entity::shipment::Entity::insert(active)
            .exec_with_returning(&*self.db)
            .await?;
        result.try_into()
    }

    async fn update(&self, shipment: &Shipment) -> Result<Shipment> {
        let active: entity::shipment::ActiveModel = shipment.into();
        let result = entity::shipment::Entity::update(active).exec(&*self.db).await?;
        result.try_into()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Shipment>> {
        let result = entity::shipment::Entity::find_by_id(id).one(&*self.db).await?;
        result.map(TryInto::try_into).transpose()
    }

    async fn delete(&self, id: i64) -> Result<()> {
        entity::shipment::Entity::delete_by_id(id).exec(&*self.db).await?;
        Ok(())
    }
}

// ===== Package Repository =====

pub struct SeaOrmPackageRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmPackageRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PackageRepository for SeaOrmPackageRepository {
    async fn create_with_items(
        &self,
        batch: Vec<(Package, Vec<PackageItem>)>,
    ) -> Result<Vec<Package>> {
        let txn = self.db.begin().await?;
        let mut created = Vec::with_capacity(batch.len());
        for (package, items) in batch {
            let active: entity::package::ActiveModel = (&package).into();
            let stored = entity::package::Entity::insert(active)
                .exec_with_returning(&txn)
                .await?;
            let package_id = stored.id;
            if !items.is_empty() {
                let actives: Vec<entity::package_item::ActiveModel> = items
                    .iter()
                    .map(|item| {
                        let mut item = item.clone();
                        item.package_id = package_id;
                        (&item).into()
                    })
                    .collect();
                entity::package_item::Entity::insert_many(actives).exec(&txn).await?;
            }
            created.push(stored.try_into()?);
        }
        txn.commit().await?;
        Ok(created)
    }

    async fn update(&self, package: &Package) -> Result<Package> {
        let active: entity::package::ActiveModel = package.into();
        let result = entity::package::Entity::update(active).exec(&*self.db).await?;
        result.try_into()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Package>> {
        let result = entity::package::Entity::find_by_id(id).one(&*self.db).await?;
        result.map(TryInto::try_into).transpose()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Package>> {
        let result = entity::package::Entity::find()
            .filter(entity::package::Column::Code.eq(code))
            .one(&*self.db)
            .await?;
        result.map(TryInto::try_into).transpose()
    }

    async fn list_by_shipment(&self, shipment_id: i64) -> Result<Vec<Package>> {
        let results = entity::package::Entity::find()
            .filter(entity::package::Column::ShipmentId.eq(shipment_id))
            .order_by_asc(entity::package::Column::NumberInShipment)
            .all(&*self.db)
            .await?;
        results.into_iter().map(TryInto::try_into).collect()
    }

    async fn max_number_in_shipment(&self, shipment_id: i64) -> Result<Option<i32>> {
        let result = entity::package::Entity::find()
            .filter(entity::package::Column::ShipmentId.eq(shipment_id))
            .order_by_desc(entity::package::Column::NumberInShipment)
            .one(&*self.db)
            .await?;
        Ok(result.map(|p| p.number_in_shipment))
    }

    async fn set_status_for_shipment(
        &self,
        shipment_id: i64,
        from: &[Option<ShipmentStatus>],
        to: ShipmentStatus,
    ) -> Result<u64> {
        let mut matching = Condition::any();
        for status in from {
            matching = match status {
                Some(status) => matching.add(entity::package::Column::Status.eq(status.code())),
                None => matching.add(entity::package::Column::Status.is_null()),
            };
        }
        let result = entity::package::Entity::update_many()
            .col_expr(entity::package::Column::Status, Expr::value(to.code()))
            .filter(entity::package::Column::ShipmentId.eq(shipment_id))
            .filter(matching)
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn clear_last_scans_for_shipment(&self, shipment_id: i64) -> Result<u64> {
        let result = entity::package::Entity::update_many()
            .col_expr(
                entity::package::Column::LastScanId,
                Expr::value(Option::<i64>::None),
            )
            .filter(entity::package::Column::ShipmentId.eq(shipment_id))
            .filter(entity::package::Column::LastScanId.is_not_null())
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn delete_by_shipment(&self, shipment_id: i64) -> Result<u64> {
        let result = entity::package::Entity::delete_many()
            .filter(entity::package::Column::ShipmentId.eq(shipment_id))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

// ===== PackageItem Repository =====

pub struct SeaOrmPackageItemRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmPackageItemRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn package_ids_for_shipment(&self, shipment_id: i64) -> Result<Vec<i64>> {
        let packages = entity::package::Entity::find()
            .filter(entity::package::Column::ShipmentId.eq(shipment_id))
            .all(&*self.db)
            .await?;
        Ok(packages.into_iter().map(|p| p.id).collect())
    }
}

#[async_trait]
impl PackageItemRepository for SeaOrmPackageItemRepository {
    async fn insert(&self, item: &PackageItem) -> Result<PackageItem> {
        let active: entity::package_item::ActiveModel = item.into();
        let result = entity::package_item::Entity::insert(active)
            .exec_with_returning(&*self.db)
            .await?;
        Ok(result.into())
    }

    async fn update(&self, item: &PackageItem) -> Result<PackageItem> {
        let active: entity::package_item::ActiveModel = item.into();
        let result = entity::package_item::Entity::update(active).exec(&*self.db).await?;
        Ok(result.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PackageItem>> {
        let result = entity::package_item::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(result.map(Into::into))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        entity::package_item::Entity::delete_by_id(id).exec(&*self.db).await?;
        Ok(())
    }

    async fn list_by_package(&self, package_id: i64) -> Result<Vec<PackageItem>> {
        let results = entity::package_item::Entity::find()
            .filter(entity::package_item::Column::PackageId.eq(package_id))
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn list_by_shipment(&self, shipment_id: i64) -> Result<Vec<PackageItem>> {
        let package_ids = self.package_ids_for_shipment(shipment_id).await?;
        if package_ids.is_empty() {
            return Ok(Vec::new());
        }
        let results = entity::package_item::Entity::find()
            .filter(entity::package_item::Column::PackageId.is_in(package_ids))
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn list_by_donor_and_shipment(
        &self,
        donor_id: Option<i64>,
        shipment_id: i64,
    ) -> Result<Vec<PackageItem>> {
        let package_ids = self.package_ids_for_shipment(shipment_id).await?;
        if package_ids.is_empty() {
            return Ok(Vec::new());
        }
        let results = entity::package_item::Entity::find()
            .filter(entity::package_item::Column::PackageId.is_in(package_ids))
            .filter(donor_condition(entity::package_item::Column::DonorId, donor_id))
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn list_by_donor_and_category(
        &self,
        donor_id: Option<i64>,
        category_id: Option<i64>,
    ) -> Result<Vec<PackageItem>> {
        let category = match category_id {
            Some(id) => Condition::all().add(entity::package_item::Column::ItemCategoryId.eq(id)),
            None => Condition::all().add(entity::package_item::Column::ItemCategoryId.is_null()),
        };
        let results = entity::package_item::Entity::find()
            .filter(donor_condition(entity::package_item::Column::DonorId, donor_id))
            .filter(category)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn delete_by_shipment(&self, shipment_id: i64) -> Result<u64> {
        let package_ids = self.package_ids_for_shipment(shipment_id).await?;
        if package_ids.is_empty() {
            return Ok(0);
        }
        let result = entity::package_item::Entity::delete_many()
            .filter(entity::package_item::Column::PackageId.is_in(package_ids))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

// ===== Scan Repository =====

pub struct SeaOrmScanRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmScanRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ScanRepository for SeaOrmScanRepository {
    async fn insert(&self, scan: &PackageScan) -> Result<Option<PackageScan>> {
        // (package, when) is unique; duplicate submissions are not stored twice
        let existing = entity::package_scan::Entity::find()
            .filter(entity::package_scan::Column::PackageId.eq(scan.package_id))
            .filter(entity::package_scan::Column::When.eq(scan.when))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Ok(None);
        }
        let active: entity::package_scan::ActiveModel = scan.into();
        let result = entity::package_scan::Entity::insert(active)
            .exec_with_returning(&*self.db)
            .await?;
        Ok(Some(result.into()))
    }

    async fn latest_for_package(&self, package_id: i64) -> Result<Option<PackageScan>> {
        let result = entity::package_scan::Entity::find()
            .filter(entity::package_scan::Column::PackageId.eq(package_id))
            .order_by_desc(entity::package_scan::Column::When)
            .one(&*self.db)
            .await?;
        Ok(result.map(Into::into))
    }

    async fn delete_by_shipment(&self, shipment_id: i64) -> Result<u64> {
        let result = entity::package_scan::Entity::delete_many()
            .filter(entity::package_scan::Column::ShipmentId.eq(shipment_id))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

// ===== Kit Repository =====

pub struct SeaOrmKitRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmKitRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KitRepository for SeaOrmKitRepository {
    async fn find_kit(&self, id: i64) -> Result<Option<Kit>> {
        let result = entity::kit::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(result.map(Into::into))
    }

    async fn list_items(&self, kit_id: i64) -> Result<Vec<KitItem>> {
        let results = entity::kit_item::Entity::find()
            .filter(entity::kit_item::Column::KitId.eq(kit_id))
            .order_by_asc(entity::kit_item::Column::CatalogItemId)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn items_for_pair(&self, kit_id: i64, catalog_item_id: i64) -> Result<Vec<KitItem>> {
        let results = entity::kit_item::Entity::find()
            .filter(entity::kit_item::Column::KitId.eq(kit_id))
            .filter(entity::kit_item::Column::CatalogItemId.eq(catalog_item_id))
            .order_by_asc(entity::kit_item::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn insert_item(&self, item: &KitItem) -> Result<KitItem> {
        let active: entity::kit_item::ActiveModel = item.into();
        let result = entity::kit_item::Entity::insert(active)
            .exec_with_returning(&*self.db)
            .await?;
        Ok(result.into())
    }

    async fn update_item(&self, item: &KitItem) -> Result<KitItem> {
        let active: entity::kit_item::ActiveModel = item.into();
        let result = entity::kit_item::Entity::update(active).exec(&*self.db).await?;
        Ok(result.into())
    }

    async fn delete_items(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = entity::kit_item::Entity::delete_many()
            .filter(entity::kit_item::Column::Id.is_in(ids.to_vec()))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

// ===== Catalog Repository =====

pub struct SeaOrmCatalogRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmCatalogRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogRepository for SeaOrmCatalogRepository {
    async fn find_item(&self, id: i64) -> Result<Option<CatalogItem>> {
        let result = entity::catalog_item::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(result.map(Into::into))
    }

    async fn find_donors(&self, ids: &[i64]) -> Result<Vec<Donor>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let results = entity::donor::Entity::find()
            .filter(entity::donor::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(entity::donor::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }
}

// ===== User Repository =====

pub struct SeaOrmUserRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmUserRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<FieldUser>> {
        let result = entity::field_user::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(result.map(Into::into))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<FieldUser>> {
        let result = entity::field_user::Entity::find()
            .filter(entity::field_user::Column::Code.eq(code))
            .one(&*self.db)
            .await?;
        Ok(result.map(Into::into))
    }

    async fn clear_device(&self, device_id: &str) -> Result<u64> {
        let result = entity::field_user::Entity::update_many()
            .col_expr(entity::field_user::Column::DeviceId, Expr::value(""))
            .filter(entity::field_user::Column::DeviceId.eq(device_id))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn update(&self, user: &FieldUser) -> Result<FieldUser> {
        let active: entity::field_user::ActiveModel = user.into();
        let result = entity::field_user::Entity::update(active).exec(&*self.db).await?;
        Ok(result.into())
    }
}

// ===== Submission Repository =====

pub struct SeaOrmSubmissionRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmSubmissionRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubmissionRepository for SeaOrmSubmissionRepository {
    async fn exists(&self, uuid: Uuid) -> Result<bool> {
        let result = entity::form_submission::Entity::find()
            .filter(entity::form_submission::Column::Uuid.eq(uuid))
            .one(&*self.db)
            .await?;
        Ok(result.is_some())
    }

    async fn insert(&self, submission: &FormSubmission) -> Result<bool> {
        // The uuid carries a unique constraint; a concurrent run losing the
        // race degrades to inserting zero rows rather than failing.
        let active: entity::form_submission::ActiveModel = submission.into();
        let rows = entity::form_submission::Entity::insert(active)
            .on_conflict(
                OnConflict::column(entity::form_submission::Column::Uuid)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;
        Ok(rows > 0)
    }

    async fn latest_submission_time(&self, form_id: i64) -> Result<Option<DateTime<Utc>>> {
        let result = entity::form_submission::Entity::find()
            .filter(entity::form_submission::Column::FormId.eq(form_id))
            .order_by_desc(entity::form_submission::Column::SubmissionTime)
            .one(&*self.db)
            .await?;
        Ok(result.map(|s| s.submission_time))
    }
}

// ===== Checkpoint Repository =====

pub struct SeaOrmCheckpointRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmCheckpointRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CheckpointRepository for SeaOrmCheckpointRepository {
    async fn get_or_create(&self, form_id: i64) -> Result<FormRetrievalCheckpoint> {
        if let Some(existing) = entity::form_checkpoint::Entity::find_by_id(form_id)
            .one(&*self.db)
            .await?
        {
            return Ok(existing.into());
        }
        let checkpoint = FormRetrievalCheckpoint::new(form_id);
        let active: entity::form_checkpoint::ActiveModel = (&checkpoint).into();
        entity::form_checkpoint::Entity::insert(active)
            .on_conflict(
                OnConflict::column(entity::form_checkpoint::Column::FormId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;
        Ok(checkpoint)
    }

    async fn save(&self, checkpoint: &FormRetrievalCheckpoint) -> Result<()> {
        let exists = entity::form_checkpoint::Entity::find_by_id(checkpoint.form_id)
            .one(&*self.db)
            .await?
            .is_some();
        let active: entity::form_checkpoint::ActiveModel = checkpoint.into();
        if exists {
            entity::form_checkpoint::Entity::update(active).exec(&*self.db).await?;
        } else {
            entity::form_checkpoint::Entity::insert(active).exec(&*self.db).await?;
        }
        Ok(())
    }
}

// ===== Report Repository =====

pub struct SeaOrmReportRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmReportRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_donor_shipment_row(
        &self,
        donor_id: Option<i64>,
        shipment_id: i64,
    ) -> Result<Option<entity::donor_shipment_data::Model>> {
        let result = entity::donor_shipment_data::Entity::find()
            .filter(donor_condition(
                entity::donor_shipment_data::Column::DonorId,
                donor_id,
            ))
            .filter(entity::donor_shipment_data::Column::ShipmentId.eq(shipment_id))
            .one(&*self.db)
            .await?;
        Ok(result)
    }

    async fn find_donor_category_row(
        &self,
        donor_id: Option<i64>,
        category_id: Option<i64>,
    ) -> Result<Option<entity::donor_category_data::Model>> {
        let category = match category_id {
            Some(id) => {
                Condition::all().add(entity::donor_category_data::Column::CategoryId.eq(id))
            }
            None => Condition::all().add(entity::donor_category_data::Column::CategoryId.is_null()),
        };
        let result = entity::donor_category_data::Entity::find()
            .filter(donor_condition(
                entity::donor_category_data::Column::DonorId,
                donor_id,
            ))
            .filter(category)
            .one(&*self.db)
            .await?;
        Ok(result)
    }
}

#[async_trait]
impl ReportRepository for SeaOrmReportRepository {
    async fn upsert_donor_shipment(&self, data: &DonorShipmentData) -> Result<()> {
        use sea_orm::ActiveValue::{NotSet, Set};

        let existing = self.find_donor_shipment_row(data.donor_id, data.shipment_id).await?;
        let active = entity::donor_shipment_data::ActiveModel {
            id: existing.as_ref().map_or(NotSet, |row| Set(row.id)),
            donor_id: Set(data.donor_id),
            shipment_id: Set(data.shipment_id),
            package_count: Set(data.package_count as i32),
            item_count: Set(data.item_count as i32),
            delivered_count: Set(data.delivered_count as i32),
            percentage_of_shipment: Set(data.percentage_of_shipment),
            price_usd: Set(data.price_usd),
            price_local: Set(data.price_local),
        };
        if existing.is_some() {
            entity::donor_shipment_data::Entity::update(active).exec(&*self.db).await?;
        } else {
            entity::donor_shipment_data::Entity::insert(active).exec(&*self.db).await?;
        }
        Ok(())
    }

    async fn delete_donor_shipment(&self, donor_id: Option<i64>, shipment_id: i64) -> Result<()> {
        entity::donor_shipment_data::Entity::delete_many()
            .filter(donor_condition(
                entity::donor_shipment_data::Column::DonorId,
                donor_id,
            ))
            .filter(entity::donor_shipment_data::Column::ShipmentId.eq(shipment_id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    async fn find_donor_shipment(
        &self,
        donor_id: Option<i64>,
        shipment_id: i64,
    ) -> Result<Option<DonorShipmentData>> {
        let result = self.find_donor_shipment_row(donor_id, shipment_id).await?;
        Ok(result.map(Into::into))
    }

    async fn delete_by_shipment(&self, shipment_id: i64) -> Result<u64> {
        let result = entity::donor_shipment_data::Entity::delete_many()
            .filter(entity::donor_shipment_data::Column::ShipmentId.eq(shipment_id))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn upsert_donor_category(&self, data: &DonorCategoryData) -> Result<()> {
        use sea_orm::ActiveValue::{NotSet, Set};

        let existing = self.find_donor_category_row(data.donor_id, data.category_id).await?;
        let active = entity::donor_category_data::ActiveModel {
            id: existing.as_ref().map_or(NotSet, |row| Set(row.id)),
            donor_id: Set(data.donor_id),
            category_id: Set(data.category_id),
            item_count: Set(data.item_count as i32),
            total_quantity: Set(data.total_quantity as i64),
            price_usd: Set(data.price_usd),
            price_local: Set(data.price_local),
            first_date_shipped: Set(data.first_date_shipped),
            last_date_shipped: Set(data.last_date_shipped),
        };
        if existing.is_some() {
            entity::donor_category_data::Entity::update(active).exec(&*self.db).await?;
        } else {
            entity::donor_category_data::Entity::insert(active).exec(&*self.db).await?;
        }
        Ok(())
    }

    async fn delete_donor_category(
        &self,
        donor_id: Option<i64>,
        category_id: Option<i64>,
    ) -> Result<()> {
        let category = match category_id {
            Some(id) => {
                Condition::all().add(entity::donor_category_data::Column::CategoryId.eq(id))
            }
            None => Condition::all().add(entity::donor_category_data::Column::CategoryId.is_null()),
        };
        entity::donor_category_data::Entity::delete_many()
            .filter(donor_condition(
                entity::donor_category_data::Column::DonorId,
                donor_id,
            ))
            .filter(category)
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    async fn find_donor_category(
        &self,
        donor_id: Option<i64>,
        category_id: Option<i64>,
    ) -> Result<Option<DonorCategoryData>> {
        let result = self.find_donor_category_row(donor_id, category_id).await?;
        Ok(result.map(Into::into))
    }
}
