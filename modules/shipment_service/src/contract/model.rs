//! Contract models for the shipment service
//!
//! These models are transport-agnostic and used for inter-module communication.
//! NO serde derives - these are pure domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Status shared by shipments and packages.
///
/// The wire codes are stable and stored in the database. Comparisons follow
/// wire-code order, which is what the lifecycle guards rely on; `Overdue`,
/// `Lost` and `Canceled` are exception states that sit after `Received` in
/// that order but outside the normal forward progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i32)]
pub enum ShipmentStatus {
    InProgress = 1,
    Ready = 2,
    PickedUp = 3,
    InTransit = 4,
    Received = 5,
    Overdue = 6,
    Lost = 7,
    Canceled = 8,
}

impl ShipmentStatus {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::InProgress),
            2 => Some(Self::Ready),
            3 => Some(Self::PickedUp),
            4 => Some(Self::InTransit),
            5 => Some(Self::Received),
            6 => Some(Self::Overdue),
            7 => Some(Self::Lost),
            8 => Some(Self::Canceled),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::InProgress => "In progress",
            Self::Ready => "Ready for pickup",
            Self::PickedUp => "Picked up",
            Self::InTransit => "In transit",
            Self::Received => "Received",
            Self::Overdue => "Overdue",
            Self::Lost => "Lost",
            Self::Canceled => "Canceled",
        }
    }

    /// Map a `STATUS_*` constant name, as used in the prefix of field-form
    /// location codes, back to a status.
    pub fn from_constant_name(name: &str) -> Option<Self> {
        match name {
            "STATUS_IN_PROGRESS" => Some(Self::InProgress),
            "STATUS_READY" => Some(Self::Ready),
            "STATUS_PICKED_UP" => Some(Self::PickedUp),
            "STATUS_IN_TRANSIT" => Some(Self::InTransit),
            "STATUS_RECEIVED" => Some(Self::Received),
            "STATUS_OVERDUE" => Some(Self::Overdue),
            "STATUS_LOST" => Some(Self::Lost),
            "STATUS_CANCELED" => Some(Self::Canceled),
            _ => None,
        }
    }
}

/// Role of a person known to the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Coordinator,
    Officer,
    Partner,
}

/// A person known to the system: coordinators and officers who run
/// shipments, and partners who receive them. Field devices are bound to
/// users through the device-verification form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldUser {
    pub id: i64,
    pub name: String,
    /// QR code identifying this user to field forms.
    pub code: String,
    /// Identifier of the mobile device currently bound to this user.
    /// Empty when no device is bound. Device ids are 1:1 with users.
    pub device_id: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Donor {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transporter {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCategory {
    pub id: i64,
    pub name: String,
}

/// An item in the catalog. Prices and weight here are the current values;
/// package items take a snapshot of them at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: i64,
    pub item_code: String,
    pub description: String,
    pub unit: String,
    /// Price of one unit in US dollars.
    pub price_usd: Decimal,
    /// Price of one unit in local currency.
    pub price_local: Decimal,
    pub item_category_id: i64,
    pub donor_id: Option<i64>,
    pub supplier_id: Option<i64>,
    /// Weight of one unit in grams.
    pub weight_grams: Option<i64>,
}

/// A shipment: one or more packages sent to one partner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shipment {
    pub id: i64,
    pub description: String,
    pub shipment_date: NaiveDate,
    pub store_release: String,
    pub status: ShipmentStatus,
    pub transporter_id: Option<i64>,
    pub partner_id: i64,
    /// Whether the loss of this shipment was acceptable. Only meaningful
    /// once the shipment has been marked lost.
    pub acceptable: bool,
    pub status_note: String,
    /// Denormalized donor summary: a single donor name, "Multiple" or "None".
    pub donor: Option<String>,
    pub last_scan_status_label: Option<String>,
    pub date_picked_up: Option<NaiveDate>,
    pub date_in_transit: Option<NaiveDate>,
    pub date_expected: Option<NaiveDate>,
    pub date_received: Option<NaiveDate>,
}

impl Shipment {
    fn is_persisted(&self) -> bool {
        self.id != 0
    }

    pub fn is_finalized(&self) -> bool {
        self.status != ShipmentStatus::InProgress
    }

    pub fn is_canceled(&self) -> bool {
        self.status == ShipmentStatus::Canceled
    }

    pub fn is_lost(&self) -> bool {
        self.is_persisted() && self.status == ShipmentStatus::Lost
    }

    pub fn has_shipped(&self) -> bool {
        self.is_persisted() && self.status >= ShipmentStatus::PickedUp
    }

    pub fn may_finalize(&self) -> bool {
        self.is_persisted() && !self.is_finalized() && !self.is_canceled()
    }

    pub fn may_cancel(&self) -> bool {
        self.is_persisted()
            && !matches!(
                self.status,
                ShipmentStatus::Canceled | ShipmentStatus::Lost | ShipmentStatus::Received
            )
    }

    pub fn may_reopen(&self) -> bool {
        self.is_persisted() && self.is_finalized() && !self.is_canceled() && !self.has_shipped()
    }

    pub fn may_lose(&self) -> bool {
        self.is_persisted() && self.is_finalized() && self.has_shipped() && !self.is_lost()
    }

    /// Number of days from shipment date to expected delivery date.
    pub fn delivery_days(&self) -> Option<i64> {
        self.date_expected
            .map(|expected| (expected - self.shipment_date).num_days())
    }

    /// Display name. A shipment with a blank description falls back to
    /// "{partner}-{store_release}-{date}".
    pub fn display_name(&self, partner_name: &str) -> String {
        if self.description.trim().is_empty() {
            format!(
                "{}-{}-{}",
                partner_name,
                self.store_release,
                self.shipment_date.format("%Y-%m-%d")
            )
        } else {
            self.description.clone()
        }
    }
}

/// A package within a shipment, identified in the field by its QR code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub id: i64,
    pub shipment_id: i64,
    pub name: String,
    pub description: String,
    /// 1-based running number, unique within the shipment, never reused.
    pub number_in_shipment: i32,
    pub status: Option<ShipmentStatus>,
    /// Unique external code used for QR identification.
    pub code: String,
    /// Kit this package was generated from, when created from exactly one kit.
    pub kit_id: Option<i64>,
    /// Most recent scan, maintained whenever scans are created or removed.
    pub last_scan_id: Option<i64>,
    pub last_scan_status_label: Option<String>,
    pub date_picked_up: Option<DateTime<Utc>>,
    pub date_in_transit: Option<DateTime<Utc>>,
    pub date_received: Option<DateTime<Utc>>,
}

impl Package {
    /// Effective status of the package.
    ///
    /// The stored status field is only authoritative for Canceled, Lost and
    /// InProgress. For everything else the date markers decide, so the stored
    /// field and the markers can disagree; callers must use this and never
    /// branch on the raw field. `date_expected` comes from the parent
    /// shipment.
    pub fn effective_status(
        &self,
        date_expected: Option<NaiveDate>,
        today: NaiveDate,
    ) -> ShipmentStatus {
        if let Some(
            status @ (ShipmentStatus::Canceled | ShipmentStatus::Lost | ShipmentStatus::InProgress),
        ) = self.status
        {
            return status;
        }
        if self.date_received.is_some() {
            ShipmentStatus::Received
        } else if self.date_in_transit.is_some() {
            match date_expected {
                Some(expected) if today > expected => ShipmentStatus::Overdue,
                _ => ShipmentStatus::InTransit,
            }
        } else if self.date_picked_up.is_some() {
            ShipmentStatus::PickedUp
        } else {
            ShipmentStatus::Ready
        }
    }

    /// Name if not blank, else description if not blank, else blank.
    pub fn name_or_description(&self) -> &str {
        let name = self.name.trim();
        if !name.is_empty() {
            return name;
        }
        self.description.trim()
    }
}

/// Some quantity of one catalog item in a package.
///
/// Price, weight, category, donor and supplier are copied from the catalog
/// item at creation time so later catalog changes do not alter historical
/// shipments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageItem {
    pub id: i64,
    pub package_id: i64,
    pub catalog_item_id: Option<i64>,
    pub description: String,
    pub unit: String,
    /// Price of ONE unit; multiply by quantity for the extended price.
    pub price_usd: Decimal,
    pub price_local: Decimal,
    pub item_category_id: Option<i64>,
    pub donor_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub weight_grams: Option<i64>,
    pub quantity: i32,
}

impl PackageItem {
    /// Build an item for `package_id` by snapshotting the catalog item.
    pub fn from_catalog_item(package_id: i64, catalog_item: &CatalogItem, quantity: i32) -> Self {
        Self {
            id: 0,
            package_id,
            catalog_item_id: Some(catalog_item.id),
            description: catalog_item.description.clone(),
            unit: catalog_item.unit.clone(),
            price_usd: catalog_item.price_usd,
            price_local: catalog_item.price_local,
            item_category_id: Some(catalog_item.item_category_id),
            donor_id: catalog_item.donor_id,
            supplier_id: catalog_item.supplier_id,
            weight_grams: catalog_item.weight_grams,
            quantity,
        }
    }

    pub fn extended_price_usd(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price_usd
    }

    pub fn extended_price_local(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price_local
    }
}

/// A named template bundling catalog items with quantities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kit {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// An item in a kit. At most one row per (kit, catalog item) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitItem {
    pub id: i64,
    pub kit_id: i64,
    pub catalog_item_id: i64,
    pub quantity: i32,
}

/// An immutable geolocation + status-label observation for one package.
///
/// The shipment id is stored redundantly to speed up by-shipment queries.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageScan {
    pub id: i64,
    pub package_id: i64,
    pub shipment_id: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub accuracy: Option<f64>,
    pub when: DateTime<Utc>,
    pub status_label: Option<String>,
}

/// A de-duplicated record of one payload received from the field
/// data-collection system. Created once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSubmission {
    pub id: i64,
    pub form_id: i64,
    pub uuid: Uuid,
    pub data: serde_json::Value,
    /// Copied from the payload, used for ordering and checkpointing.
    pub submission_time: DateTime<Utc>,
}

/// Ingestion checkpoint: the most recent submission timestamp processed for
/// one external form. Advanced monotonically by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRetrievalCheckpoint {
    pub form_id: i64,
    pub timestamp: DateTime<Utc>,
}

impl FormRetrievalCheckpoint {
    /// A timestamp earlier than any form we will ever see (2010-01-01 UTC).
    pub fn minimum_timestamp() -> DateTime<Utc> {
        DateTime::from_timestamp(1_262_304_000, 0).unwrap_or_default()
    }

    pub fn new(form_id: i64) -> Self {
        Self {
            form_id,
            timestamp: Self::minimum_timestamp(),
        }
    }
}

/// Materialized rollup of package items grouped by donor and shipment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonorShipmentData {
    pub donor_id: Option<i64>,
    pub shipment_id: i64,
    /// Packages in the shipment containing at least one item from this donor.
    pub package_count: u32,
    /// Items in the shipment given by this donor.
    pub item_count: u32,
    /// Items from this donor whose package has been received.
    pub delivered_count: u32,
    /// Fraction of the shipment's items given by this donor, 0..=1.
    pub percentage_of_shipment: Decimal,
    pub price_usd: Decimal,
    pub price_local: Decimal,
}

/// Materialized rollup of package items grouped by donor and category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonorCategoryData {
    pub donor_id: Option<i64>,
    pub category_id: Option<i64>,
    pub item_count: u32,
    pub total_quantity: u64,
    pub price_usd: Decimal,
    pub price_local: Decimal,
    pub first_date_shipped: Option<NaiveDate>,
    pub last_date_shipped: Option<NaiveDate>,
}
