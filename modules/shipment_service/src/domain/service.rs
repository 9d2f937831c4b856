//! Domain service - business logic orchestration

use crate::config::Config;
use crate::contract::{
    FormRetrievalCheckpoint, FormSubmission, KitItem, Package, PackageItem, PackageScan, Shipment,
    ShipmentStatus, TrackingError,
};
use crate::domain::reports;
use crate::domain::repository::Stores;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// One GPS observation attached to a scan. Any field may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GpsPoint {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub accuracy: Option<f64>,
}

/// Domain service for shipment tracking
pub struct Service {
    stores: Stores,
    config: Config,
}

fn internal(err: anyhow::Error) -> TrackingError {
    tracing::error!(error = ?err, "storage error");
    TrackingError::Internal
}

impl Service {
    pub fn new(stores: Stores, config: Config) -> Self {
        Self { stores, config }
    }

    // ===== Shipment operations =====

    pub async fn get_shipment(&self, id: i64) -> Result<Shipment, TrackingError> {
        self.stores
            .shipments
            .find_by_id(id)
            .await
            .map_err(internal)?
            .ok_or_else(|| TrackingError::not_found("shipment", id))
    }

    pub async fn create_shipment(&self, shipment: Shipment) -> Result<Shipment, TrackingError> {
        let mut shipment = shipment;
        stamp_status_dates(&mut shipment);
        self.stores.shipments.insert(&shipment).await.map_err(internal)
    }

    /// Persist a shipment, applying the save side effects: recompute the
    /// donor summary and stamp the picked-up/in-transit dates the first time
    /// the matching status appears.
    pub async fn save_shipment(&self, shipment: Shipment) -> Result<Shipment, TrackingError> {
        let mut shipment = shipment;
        if shipment.id != 0 {
            shipment.donor = Some(self.compute_donor_summary(shipment.id).await?);
        }
        stamp_status_dates(&mut shipment);
        self.stores.shipments.update(&shipment).await.map_err(internal)
    }

    /// Finalize a shipment: mark it ready for pickup and move every package
    /// that has not started changing status yet along with it.
    pub async fn finalize_shipment(&self, id: i64) -> Result<Shipment, TrackingError> {
        let mut shipment = self.get_shipment(id).await?;
        if !shipment.may_finalize() {
            return Err(TrackingError::InvalidTransition {
                action: "finalize".to_string(),
                status: shipment.status.label().to_string(),
            });
        }
        shipment.status = ShipmentStatus::Ready;
        let shipment = self.save_shipment(shipment).await?;
        self.stores
            .packages
            .set_status_for_shipment(
                id,
                &[None, Some(ShipmentStatus::InProgress)],
                ShipmentStatus::Ready,
            )
            .await
            .map_err(internal)?;
        Ok(shipment)
    }

    pub async fn cancel_shipment(&self, id: i64) -> Result<Shipment, TrackingError> {
        let mut shipment = self.get_shipment(id).await?;
        if !shipment.may_cancel() {
            return Err(TrackingError::InvalidTransition {
                action: "cancel".to_string(),
                status: shipment.status.label().to_string(),
            });
        }
        shipment.status = ShipmentStatus::Canceled;
        self.save_shipment(shipment).await
    }

    /// Reopen a finalized shipment that has not shipped. Packages still at
    /// Ready revert to InProgress.
    pub async fn reopen_shipment(&self, id: i64) -> Result<Shipment, TrackingError> {
        let mut shipment = self.get_shipment(id).await?;
        if !shipment.may_reopen() {
            return Err(TrackingError::InvalidTransition {
                action: "reopen".to_string(),
                status: shipment.status.label().to_string(),
            });
        }
        shipment.status = ShipmentStatus::InProgress;
        let shipment = self.save_shipment(shipment).await?;
        self.stores
            .packages
            .set_status_for_shipment(
                id,
                &[Some(ShipmentStatus::Ready)],
                ShipmentStatus::InProgress,
            )
            .await
            .map_err(internal)?;
        Ok(shipment)
    }

    /// Mark a shipped shipment as lost, recording whether the loss was
    /// acceptable and a free-text note.
    pub async fn mark_shipment_lost(
        &self,
        id: i64,
        acceptable: bool,
        note: &str,
    ) -> Result<Shipment, TrackingError> {
        let mut shipment = self.get_shipment(id).await?;
        if !shipment.may_lose() {
            return Err(TrackingError::InvalidTransition {
                action: "lose".to_string(),
                status: shipment.status.label().to_string(),
            });
        }
        shipment.status = ShipmentStatus::Lost;
        shipment.acceptable = acceptable;
        shipment.status_note = note.to_string();
        self.save_shipment(shipment).await
    }

    /// Printing manifests or barcodes finalizes an in-progress shipment as a
    /// side effect; for any other status it is a no-op.
    pub async fn record_print(&self, id: i64) -> Result<Shipment, TrackingError> {
        let shipment = self.get_shipment(id).await?;
        if shipment.may_finalize() {
            return self.finalize_shipment(id).await;
        }
        Ok(shipment)
    }

    /// Status text with a completion percentage appended for partially
    /// complete shipments. The parenthetical only appears for Received and
    /// InTransit, only with at least one package, and only under 100%.
    pub async fn verbose_status(&self, id: i64) -> Result<String, TrackingError> {
        let shipment = self.get_shipment(id).await?;
        let mut text = shipment.status.label().to_string();
        if matches!(
            shipment.status,
            ShipmentStatus::Received | ShipmentStatus::InTransit
        ) {
            let packages = self
                .stores
                .packages
                .list_by_shipment(id)
                .await
                .map_err(internal)?;
            let matching = packages
                .iter()
                .filter(|p| p.status == Some(shipment.status))
                .count();
            if !packages.is_empty() && matching < packages.len() {
                text.push_str(&format!(" ({}%)", 100 * matching / packages.len()));
            }
        }
        Ok(text)
    }

    /// Delete a shipment and everything hanging off it.
    ///
    /// This can be slow for large shipments and is meant to run from a
    /// background task, never inline with a request. Every step skips rows
    /// that are already gone, so a crashed run can safely be repeated.
    pub async fn delete_shipment(&self, id: i64) -> Result<(), TrackingError> {
        self.get_shipment(id).await?;

        // Aggregates to recompute once the rows are gone
        let items = self
            .stores
            .package_items
            .list_by_shipment(id)
            .await
            .map_err(internal)?;
        let donor_categories: HashSet<(Option<i64>, Option<i64>)> = items
            .iter()
            .map(|i| (i.donor_id, i.item_category_id))
            .collect();

        self.stores
            .package_items
            .delete_by_shipment(id)
            .await
            .map_err(internal)?;
        self.stores
            .packages
            .clear_last_scans_for_shipment(id)
            .await
            .map_err(internal)?;
        self.stores.scans.delete_by_shipment(id).await.map_err(internal)?;
        self.stores
            .packages
            .delete_by_shipment(id)
            .await
            .map_err(internal)?;
        self.stores
            .reports
            .delete_by_shipment(id)
            .await
            .map_err(internal)?;
        self.stores.shipments.delete(id).await.map_err(internal)?;

        for (donor_id, category_id) in donor_categories {
            self.refresh_donor_category_data(donor_id, category_id).await?;
        }
        Ok(())
    }

    // ===== Package operations =====

    pub async fn get_package(&self, id: i64) -> Result<Package, TrackingError> {
        self.stores
            .packages
            .find_by_id(id)
            .await
            .map_err(internal)?
            .ok_or_else(|| TrackingError::not_found("package", id))
    }

    pub async fn find_package_by_code(&self, code: &str) -> Result<Option<Package>, TrackingError> {
        self.stores.packages.find_by_code(code).await.map_err(internal)
    }

    /// Next number to assign to a package in this shipment: one more than
    /// the highest ever used, never reusing numbers freed by deletion.
    pub async fn next_package_number(&self, shipment_id: i64) -> Result<i32, TrackingError> {
        let max = self
            .stores
            .packages
            .max_number_in_shipment(shipment_id)
            .await
            .map_err(internal)?;
        Ok(max.unwrap_or(0) + 1)
    }

    /// Persist a package, filling in its number and code when missing and
    /// ratcheting the parent shipment forward when the package has shipped.
    pub async fn save_package(&self, package: Package) -> Result<Package, TrackingError> {
        let mut package = package;
        if package.number_in_shipment == 0 {
            package.number_in_shipment = self.next_package_number(package.shipment_id).await?;
        }
        if package.code.is_empty() {
            package.code = self.package_code(package.shipment_id, package.number_in_shipment);
        }
        self.promote_shipment_for_package(&package).await?;
        if package.id == 0 {
            let created = self
                .stores
                .packages
                .create_with_items(vec![(package, Vec::new())])
                .await
                .map_err(internal)?;
            created
                .into_iter()
                .next()
                .ok_or(TrackingError::Internal)
        } else {
            self.stores.packages.update(&package).await.map_err(internal)
        }
    }

    /// Effective status of a package, folding in the parent shipment's
    /// expected date. See [`Package::effective_status`].
    pub async fn package_status(&self, package: &Package) -> Result<ShipmentStatus, TrackingError> {
        let shipment = self.get_shipment(package.shipment_id).await?;
        Ok(package.effective_status(shipment.date_expected, Utc::now().date_naive()))
    }

    fn package_code(&self, shipment_id: i64, number: i32) -> String {
        format!("{}{}.{}", self.config.package_code_prefix, shipment_id, number)
    }

    /// One-way ratchet: a package at or past PickedUp drags a shipment that
    /// has not reached PickedUp forward to it. Never demotes.
    async fn promote_shipment_for_package(&self, package: &Package) -> Result<(), TrackingError> {
        let Some(status) = package.status else {
            return Ok(());
        };
        if status < ShipmentStatus::PickedUp {
            return Ok(());
        }
        let shipment = self.get_shipment(package.shipment_id).await?;
        if shipment.status < ShipmentStatus::PickedUp {
            let mut shipment = shipment;
            shipment.status = ShipmentStatus::PickedUp;
            self.save_shipment(shipment).await?;
        }
        Ok(())
    }

    // ===== Kit expansion =====

    /// Create `count` packages in a shipment, stamping out items from the
    /// supplied kits.
    ///
    /// `kit_quantities` maps kit id to the number of copies of that kit per
    /// package. With exactly one kit the packages are tagged with it so its
    /// quantities can be bulk-edited later; with zero or several kits the
    /// tag is left unset. The batch is inserted in a single transaction.
    pub async fn create_packages_and_items(
        &self,
        shipment_id: i64,
        name: &str,
        description: &str,
        count: u32,
        kit_quantities: &BTreeMap<i64, i32>,
    ) -> Result<Vec<Package>, TrackingError> {
        if count == 0 {
            return Err(TrackingError::validation("number of packages must be positive"));
        }
        self.get_shipment(shipment_id).await?;
        let first_number = self.next_package_number(shipment_id).await?;
        let only_kit = if kit_quantities.len() == 1 {
            kit_quantities.keys().next().copied()
        } else {
            None
        };

        // Resolve kit contents and catalog snapshots once, up front
        let mut expansions: Vec<(i32, KitItem)> = Vec::new();
        for (&kit_id, &copies) in kit_quantities {
            if copies <= 0 {
                return Err(TrackingError::validation("kit quantity must be positive"));
            }
            self.stores
                .kits
                .find_kit(kit_id)
                .await
                .map_err(internal)?
                .ok_or_else(|| TrackingError::not_found("kit", kit_id))?;
            for kit_item in self.stores.kits.list_items(kit_id).await.map_err(internal)? {
                expansions.push((copies, kit_item));
            }
        }

        let mut batch = Vec::with_capacity(count as usize);
        for offset in 0..count as i32 {
            let number = first_number + offset;
            let package = Package {
                id: 0,
                shipment_id,
                name: name.to_string(),
                description: description.to_string(),
                number_in_shipment: number,
                status: Some(ShipmentStatus::InProgress),
                code: self.package_code(shipment_id, number),
                kit_id: only_kit,
                last_scan_id: None,
                last_scan_status_label: None,
                date_picked_up: None,
                date_in_transit: None,
                date_received: None,
            };
            let mut items = Vec::with_capacity(expansions.len());
            for (copies, kit_item) in &expansions {
                let catalog_item = self
                    .stores
                    .catalog
                    .find_item(kit_item.catalog_item_id)
                    .await
                    .map_err(internal)?
                    .ok_or_else(|| TrackingError::not_found("catalog item", kit_item.catalog_item_id))?;
                items.push(PackageItem::from_catalog_item(
                    0,
                    &catalog_item,
                    copies * kit_item.quantity,
                ));
            }
            batch.push((package, items));
        }

        let created = self
            .stores
            .packages
            .create_with_items(batch)
            .await
            .map_err(internal)?;

        self.refresh_aggregates_for_shipment(shipment_id).await?;
        let shipment = self.get_shipment(shipment_id).await?;
        self.save_shipment(shipment).await?;
        Ok(created)
    }

    /// Add some number of a catalog item to a kit, keeping at most one
    /// KitItem per (kit, catalog item) pair. Legacy duplicate rows are merged
    /// before the addition is applied. Returns the resulting total quantity.
    pub async fn add_item_to_kit(
        &self,
        kit_id: i64,
        catalog_item_id: i64,
        quantity: i32,
    ) -> Result<i32, TrackingError> {
        if quantity < 1 {
            return Err(TrackingError::validation("quantity must be at least 1"));
        }
        if quantity > self.config.max_kit_quantity {
            return Err(TrackingError::validation(format!(
                "quantity may not exceed {}",
                self.config.max_kit_quantity
            )));
        }
        self.stores
            .kits
            .find_kit(kit_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| TrackingError::not_found("kit", kit_id))?;
        self.stores
            .catalog
            .find_item(catalog_item_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| TrackingError::not_found("catalog item", catalog_item_id))?;

        let existing = self
            .stores
            .kits
            .items_for_pair(kit_id, catalog_item_id)
            .await
            .map_err(internal)?;

        let merged = match existing.split_first() {
            Some((first, rest)) => {
                let mut keep = first.clone();
                if !rest.is_empty() {
                    keep.quantity += rest.iter().map(|i| i.quantity).sum::<i32>();
                    let ids: Vec<i64> = rest.iter().map(|i| i.id).collect();
                    self.stores.kits.delete_items(&ids).await.map_err(internal)?;
                }
                Some(keep)
            }
            None => None,
        };

        let result = match merged {
            Some(mut item) => {
                item.quantity += quantity;
                self.stores.kits.update_item(&item).await.map_err(internal)?
            }
            None => {
                let item = KitItem {
                    id: 0,
                    kit_id,
                    catalog_item_id,
                    quantity,
                };
                self.stores.kits.insert_item(&item).await.map_err(internal)?
            }
        };
        Ok(result.quantity)
    }

    /// Add a quantity of a catalog item to an existing package, snapshotting
    /// the catalog values.
    pub async fn add_item_to_package(
        &self,
        package_id: i64,
        catalog_item_id: i64,
        quantity: i32,
    ) -> Result<PackageItem, TrackingError> {
        if quantity < 1 {
            return Err(TrackingError::validation("quantity must be at least 1"));
        }
        let package = self.get_package(package_id).await?;
        let catalog_item = self
            .stores
            .catalog
            .find_item(catalog_item_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| TrackingError::not_found("catalog item", catalog_item_id))?;
        let item = PackageItem::from_catalog_item(package_id, &catalog_item, quantity);
        let item = self.stores.package_items.insert(&item).await.map_err(internal)?;

        self.refresh_donor_shipment_data(item.donor_id, package.shipment_id)
            .await?;
        self.refresh_donor_category_data(item.donor_id, item.item_category_id)
            .await?;
        let shipment = self.get_shipment(package.shipment_id).await?;
        self.save_shipment(shipment).await?;
        Ok(item)
    }

    /// Remove a package item and refresh the aggregates it contributed to.
    pub async fn delete_package_item(&self, item_id: i64) -> Result<(), TrackingError> {
        let item = self
            .stores
            .package_items
            .find_by_id(item_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| TrackingError::not_found("package item", item_id))?;
        let package = self.get_package(item.package_id).await?;
        self.stores.package_items.delete(item_id).await.map_err(internal)?;

        self.refresh_donor_shipment_data(item.donor_id, package.shipment_id)
            .await?;
        self.refresh_donor_category_data(item.donor_id, item.item_category_id)
            .await?;
        let shipment = self.get_shipment(package.shipment_id).await?;
        self.save_shipment(shipment).await?;
        Ok(())
    }

    // ===== Scan ingestion support =====

    /// Record one field scan against a package identified by QR code.
    ///
    /// Creates the immutable scan row (duplicates by (package, when) are
    /// skipped), refreshes the last-scan pointer, applies the status from
    /// the location code with first-write-wins date markers, and ratchets
    /// the parent shipment forward.
    pub async fn record_package_scan(
        &self,
        code: &str,
        when: DateTime<Utc>,
        gps: GpsPoint,
        status_label: Option<String>,
        new_status: Option<ShipmentStatus>,
    ) -> Result<(), TrackingError> {
        let mut package = self
            .find_package_by_code(code)
            .await?
            .ok_or_else(|| TrackingError::not_found("package", code))?;

        let scan = PackageScan {
            id: 0,
            package_id: package.id,
            shipment_id: package.shipment_id,
            latitude: gps.latitude,
            longitude: gps.longitude,
            altitude: gps.altitude,
            accuracy: gps.accuracy,
            when,
            status_label: status_label.clone(),
        };
        if self.stores.scans.insert(&scan).await.map_err(internal)?.is_none() {
            tracing::debug!(code, %when, "duplicate scan skipped");
        }
        package.last_scan_id = self
            .stores
            .scans
            .latest_for_package(package.id)
            .await
            .map_err(internal)?
            .map(|s| s.id);

        if let Some(status) = new_status {
            package.last_scan_status_label = status_label.clone();
            if package.status != Some(status) {
                package.status = Some(status);
            }
            match status {
                ShipmentStatus::Received if package.date_received.is_none() => {
                    package.date_received = Some(when);
                }
                ShipmentStatus::PickedUp if package.date_picked_up.is_none() => {
                    package.date_picked_up = Some(when);
                }
                ShipmentStatus::InTransit if package.date_in_transit.is_none() => {
                    package.date_in_transit = Some(when);
                }
                _ => {}
            }
        }
        self.stores.packages.update(&package).await.map_err(internal)?;

        if new_status.is_some() {
            self.promote_shipment_for_package(&package).await?;
            let mut shipment = self.get_shipment(package.shipment_id).await?;
            if shipment.last_scan_status_label != status_label {
                shipment.last_scan_status_label = status_label;
                self.stores
                    .shipments
                    .update(&shipment)
                    .await
                    .map_err(internal)?;
            }
        }
        Ok(())
    }

    pub async fn find_user_by_code(
        &self,
        code: &str,
    ) -> Result<Option<crate::contract::FieldUser>, TrackingError> {
        self.stores.users.find_by_code(code).await.map_err(internal)
    }

    /// Bind a device to the user holding this QR code, stealing it from any
    /// previous owner. Device ids are 1:1 with users at any instant.
    pub async fn bind_device(&self, user_code: &str, device_id: &str) -> Result<(), TrackingError> {
        let user = self
            .stores
            .users
            .find_by_code(user_code)
            .await
            .map_err(internal)?
            .ok_or_else(|| TrackingError::not_found("user", user_code))?;
        self.stores.users.clear_device(device_id).await.map_err(internal)?;
        let mut user = user;
        user.device_id = device_id.to_string();
        self.stores.users.update(&user).await.map_err(internal)?;
        Ok(())
    }

    /// Store a form submission unless its uuid was already seen.
    /// Returns true when a new record was created.
    pub async fn record_form_submission(
        &self,
        submission: &FormSubmission,
    ) -> Result<bool, TrackingError> {
        if self
            .stores
            .submissions
            .exists(submission.uuid)
            .await
            .map_err(internal)?
        {
            return Ok(false);
        }
        self.stores.submissions.insert(submission).await.map_err(internal)
    }

    pub async fn latest_submission_time(
        &self,
        form_id: i64,
    ) -> Result<Option<DateTime<Utc>>, TrackingError> {
        self.stores
            .submissions
            .latest_submission_time(form_id)
            .await
            .map_err(internal)
    }

    pub async fn checkpoint(&self, form_id: i64) -> Result<FormRetrievalCheckpoint, TrackingError> {
        self.stores.checkpoints.get_or_create(form_id).await.map_err(internal)
    }

    pub async fn save_checkpoint(
        &self,
        checkpoint: &FormRetrievalCheckpoint,
    ) -> Result<(), TrackingError> {
        self.stores.checkpoints.save(checkpoint).await.map_err(internal)
    }

    // ===== Report aggregates =====

    /// Recompute the donor×shipment aggregate for one pair, deleting the row
    /// when no items remain.
    pub async fn refresh_donor_shipment_data(
        &self,
        donor_id: Option<i64>,
        shipment_id: i64,
    ) -> Result<(), TrackingError> {
        let items = self
            .stores
            .package_items
            .list_by_donor_and_shipment(donor_id, shipment_id)
            .await
            .map_err(internal)?;
        let total = self
            .stores
            .package_items
            .list_by_shipment(shipment_id)
            .await
            .map_err(internal)?
            .len();
        let received: HashSet<i64> = self
            .stores
            .packages
            .list_by_shipment(shipment_id)
            .await
            .map_err(internal)?
            .into_iter()
            .filter(|p| p.status == Some(ShipmentStatus::Received))
            .map(|p| p.id)
            .collect();
        match reports::donor_shipment_rollup(donor_id, shipment_id, &items, total, &received) {
            Some(data) => self
                .stores
                .reports
                .upsert_donor_shipment(&data)
                .await
                .map_err(internal),
            None => self
                .stores
                .reports
                .delete_donor_shipment(donor_id, shipment_id)
                .await
                .map_err(internal),
        }
    }

    /// Recompute the donor×category aggregate for one pair, deleting the row
    /// when no items remain.
    pub async fn refresh_donor_category_data(
        &self,
        donor_id: Option<i64>,
        category_id: Option<i64>,
    ) -> Result<(), TrackingError> {
        let items = self
            .stores
            .package_items
            .list_by_donor_and_category(donor_id, category_id)
            .await
            .map_err(internal)?;
        if items.is_empty() {
            return self
                .stores
                .reports
                .delete_donor_category(donor_id, category_id)
                .await
                .map_err(internal);
        }
        let mut shipment_ids = HashSet::new();
        for item in &items {
            if let Some(package) = self
                .stores
                .packages
                .find_by_id(item.package_id)
                .await
                .map_err(internal)?
            {
                shipment_ids.insert(package.shipment_id);
            }
        }
        let mut dates = Vec::new();
        for shipment_id in shipment_ids {
            if let Some(shipment) = self
                .stores
                .shipments
                .find_by_id(shipment_id)
                .await
                .map_err(internal)?
            {
                dates.push(shipment.shipment_date);
            }
        }
        match reports::donor_category_rollup(donor_id, category_id, &items, &dates) {
            Some(data) => self
                .stores
                .reports
                .upsert_donor_category(&data)
                .await
                .map_err(internal),
            None => Ok(()),
        }
    }

    /// Refresh every donor×shipment and donor×category pair touched by the
    /// items of one shipment.
    async fn refresh_aggregates_for_shipment(&self, shipment_id: i64) -> Result<(), TrackingError> {
        let items = self
            .stores
            .package_items
            .list_by_shipment(shipment_id)
            .await
            .map_err(internal)?;
        let donors: HashSet<Option<i64>> = items.iter().map(|i| i.donor_id).collect();
        let pairs: HashSet<(Option<i64>, Option<i64>)> = items
            .iter()
            .map(|i| (i.donor_id, i.item_category_id))
            .collect();
        for donor_id in donors {
            self.refresh_donor_shipment_data(donor_id, shipment_id).await?;
        }
        for (donor_id, category_id) in pairs {
            self.refresh_donor_category_data(donor_id, category_id).await?;
        }
        Ok(())
    }

    /// Donor summary across all items of a shipment.
    async fn compute_donor_summary(&self, shipment_id: i64) -> Result<String, TrackingError> {
        let items = self
            .stores
            .package_items
            .list_by_shipment(shipment_id)
            .await
            .map_err(internal)?;
        let donor_ids: Vec<i64> = items
            .iter()
            .filter_map(|i| i.donor_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let names: HashSet<String> = self
            .stores
            .catalog
            .find_donors(&donor_ids)
            .await
            .map_err(internal)?
            .into_iter()
            .map(|d| d.name)
            .collect();
        Ok(reports::donor_summary(&names))
    }

    /// True when a submission with this uuid has already been stored.
    pub async fn submission_exists(&self, uuid: Uuid) -> Result<bool, TrackingError> {
        self.stores.submissions.exists(uuid).await.map_err(internal)
    }
}

/// Stamp the shipment-level date markers the first time the matching status
/// is set. One-time and monotonic: an already-set marker is never changed.
fn stamp_status_dates(shipment: &mut Shipment) {
    let today = Utc::now().date_naive();
    if shipment.date_picked_up.is_none() && shipment.status == ShipmentStatus::PickedUp {
        shipment.date_picked_up = Some(today);
    }
    if shipment.date_in_transit.is_none() && shipment.status == ShipmentStatus::InTransit {
        shipment.date_in_transit = Some(today);
    }
}
