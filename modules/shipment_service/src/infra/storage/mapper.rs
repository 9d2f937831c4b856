//! Entity to model mappers
//!
//! Conversions between SeaORM entities and contract models

use super::entity;
use crate::contract::{
    CatalogItem, Donor, DonorCategoryData, DonorShipmentData, FieldUser, FormRetrievalCheckpoint,
    FormSubmission, ItemCategory, Kit, KitItem, Package, PackageItem, PackageScan, Shipment,
    ShipmentStatus, Supplier, Transporter, UserRole,
};
use anyhow::anyhow;
use sea_orm::ActiveValue::{NotSet, Set};

fn status_from_code(code: i32) -> anyhow::Result<ShipmentStatus> {
    ShipmentStatus::from_code(code).ok_or_else(|| anyhow!("unknown status code {code}"))
}

fn id_value(id: i64) -> sea_orm::ActiveValue<i64> {
    if id == 0 {
        NotSet
    } else {
        Set(id)
    }
}

// ===== Shipment =====

impl TryFrom<entity::shipment::Model> for Shipment {
    type Error = anyhow::Error;

    fn try_from(entity: entity::shipment::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            description: entity.description,
            shipment_date: entity.shipment_date,
            store_release: entity.store_release,
            status: status_from_code(entity.status)?,
            transporter_id: entity.transporter_id,
            partner_id: entity.partner_id,
            acceptable: entity.acceptable,
            status_note: entity.status_note,
            donor: entity.donor,
            last_scan_status_label: entity.last_scan_status_label,
            date_picked_up: entity.date_picked_up,
            date_in_transit: entity.date_in_transit,
            date_expected: entity.date_expected,
            date_received: entity.date_received,
        })
    }
}

impl From<&Shipment> for entity::shipment::ActiveModel {
    fn from(model: &Shipment) -> Self {
        Self {
            id: id_value(model.id),
            description: Set(model.description.clone()),
            shipment_date: Set(model.shipment_date),
            store_release: Set(model.store_release.clone()),
            status: Set(model.status.code()),
            transporter_id: Set(model.transporter_id),
            partner_id: Set(model.partner_id),
            acceptable: Set(model.acceptable),
            status_note: Set(model.status_note.clone()),
            donor: Set(model.donor.clone()),
            last_scan_status_label: Set(model.last_scan_status_label.clone()),
            date_picked_up: Set(model.date_picked_up),
            date_in_transit: Set(model.date_in_transit),
            date_expected: Set(model.date_expected),
            date_received: Set(model.date_received),
        }
    }
}

// ===== Package =====

impl TryFrom<entity::package::Model> for Package {
    type Error = anyhow::Error;

    fn try_from(entity: entity::package::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            shipment_id: entity.shipment_id,
            name: entity.name,
            description: entity.description,
            number_in_shipment: entity.number_in_shipment,
            status: entity.status.map(status_from_code).transpose()?,
            code: entity.code,
            kit_id: entity.kit_id,
            last_scan_id: entity.last_scan_id,
            last_scan_status_label: entity.last_scan_status_label,
            date_picked_up: entity.date_picked_up,
            date_in_transit: entity.date_in_transit,
            date_received: entity.date_received,
        })
    }
}

impl From<&Package> for entity::package::ActiveModel {
    fn from(model: &Package) -> Self {
        Self {
            id: id_value(model.id),
            shipment_id: Set(model.shipment_id),
            name: Set(model.name.clone()),
            description: Set(model.description.clone()),
            number_in_shipment: Set(model.number_in_shipment),
            status: Set(model.status.map(ShipmentStatus::code)),
            code: Set(model.code.clone()),
            kit_id: Set(model.kit_id),
            last_scan_id: Set(model.last_scan_id),
            last_scan_status_label: Set(model.last_scan_status_label.clone()),
            date_picked_up: Set(model.date_picked_up),
            date_in_transit: Set(model.date_in_transit),
            date_received: Set(model.date_received),
        }
    }
}

// ===== PackageItem =====

impl From<entity::package_item::Model> for PackageItem {
    fn from(entity: entity::package_item::Model) -> Self {
        Self {
            id: entity.id,
            package_id: entity.package_id,
            catalog_item_id: entity.catalog_item_id,
            description: entity.description,
            unit: entity.unit,
            price_usd: entity.price_usd,
            price_local: entity.price_local,
            item_category_id: entity.item_category_id,
            donor_id: entity.donor_id,
            supplier_id: entity.supplier_id,
            weight_grams: entity.weight_grams,
            quantity: entity.quantity,
        }
    }
}

impl From<&PackageItem> for entity::package_item::ActiveModel {
    fn from(model: &PackageItem) -> Self {
        Self {
            id: id_value(model.id),
            package_id: Set(model.package_id),
            catalog_item_id: Set(model.catalog_item_id),
            description: Set(model.description.clone()),
            unit: Set(model.unit.clone()),
            price_usd: Set(model.price_usd),
            price_local: Set(model.price_local),
            item_category_id: Set(model.item_category_id),
            donor_id: Set(model.donor_id),
            supplier_id: Set(model.supplier_id),
            weight_grams: Set(model.weight_grams),
            quantity: Set(model.quantity),
        }
    }
}

// ===== PackageScan =====

impl From<entity::package_scan::Model> for PackageScan {
    fn from(entity: entity::package_scan::Model) -> Self {
        Self {
            id: entity.id,
            package_id: entity.package_id,
            shipment_id: entity.shipment_id,
            latitude: entity.latitude,
            longitude: entity.longitude,
            altitude: entity.altitude,
            accuracy: entity.accuracy,
            when: entity.when,
            status_label: entity.status_label,
        }
    }
}

impl From<&PackageScan> for entity::package_scan::ActiveModel {
    fn from(model: &PackageScan) -> Self {
        Self {
            id: id_value(model.id),
            package_id: Set(model.package_id),
            shipment_id: Set(model.shipment_id),
            latitude: Set(model.latitude),
            longitude: Set(model.longitude),
            altitude: Set(model.altitude),
            accuracy: Set(model.accuracy),
            when: Set(model.when),
            status_label: Set(model.status_label.clone()),
        }
    }
}

// ===== Kit / KitItem =====

impl From<entity::kit::Model> for Kit {
    fn from(entity: entity::kit::Model) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
        }
    }
}

impl From<&Kit> for entity::kit::ActiveModel {
    fn from(model: &Kit) -> Self {
        Self {
            id: id_value(model.id),
            name: Set(model.name.clone()),
            description: Set(model.description.clone()),
        }
    }
}

impl From<entity::kit_item::Model> for KitItem {
    fn from(entity: entity::kit_item::Model) -> Self {
        Self {
            id: entity.id,
            kit_id: entity.kit_id,
            catalog_item_id: entity.catalog_item_id,
            quantity: entity.quantity,
        }
    }
}

impl From<&KitItem> for entity::kit_item::ActiveModel {
    fn from(model: &KitItem) -> Self {
        Self {
            id: id_value(model.id),
            kit_id: Set(model.kit_id),
            catalog_item_id: Set(model.catalog_item_id),
            quantity: Set(model.quantity),
        }
    }
}

// ===== Catalog =====

impl From<entity::catalog_item::Model> for CatalogItem {
    fn from(entity: entity::catalog_item::Model) -> Self {
        Self {
            id: entity.id,
            item_code: entity.item_code,
            description: entity.description,
            unit: entity.unit,
            price_usd: entity.price_usd,
            price_local: entity.price_local,
            item_category_id: entity.item_category_id,
            donor_id: entity.donor_id,
            supplier_id: entity.supplier_id,
            weight_grams: entity.weight_grams,
        }
    }
}

impl From<&CatalogItem> for entity::catalog_item::ActiveModel {
    fn from(model: &CatalogItem) -> Self {
        Self {
            id: id_value(model.id),
            item_code: Set(model.item_code.clone()),
            description: Set(model.description.clone()),
            unit: Set(model.unit.clone()),
            price_usd: Set(model.price_usd),
            price_local: Set(model.price_local),
            item_category_id: Set(model.item_category_id),
            donor_id: Set(model.donor_id),
            supplier_id: Set(model.supplier_id),
            weight_grams: Set(model.weight_grams),
        }
    }
}

impl From<entity::item_category::Model> for ItemCategory {
    fn from(entity: entity::item_category::Model) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
        }
    }
}

impl From<entity::donor::Model> for Donor {
    fn from(entity: entity::donor::Model) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
        }
    }
}

impl From<entity::supplier::Model> for Supplier {
    fn from(entity: entity::supplier::Model) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
        }
    }
}

impl From<entity::transporter::Model> for Transporter {
    fn from(entity: entity::transporter::Model) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
        }
    }
}

// ===== FieldUser =====

fn parse_role(role: &str) -> UserRole {
    match role {
        "COORDINATOR" => UserRole::Coordinator,
        "PARTNER" => UserRole::Partner,
        _ => UserRole::Officer,
    }
}

fn format_role(role: UserRole) -> String {
    match role {
        UserRole::Coordinator => "COORDINATOR",
        UserRole::Officer => "OFFICER",
        UserRole::Partner => "PARTNER",
    }
    .to_string()
}

impl From<entity::field_user::Model> for FieldUser {
    fn from(entity: entity::field_user::Model) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            code: entity.code,
            device_id: entity.device_id,
            role: parse_role(&entity.role),
        }
    }
}

impl From<&FieldUser> for entity::field_user::ActiveModel {
    fn from(model: &FieldUser) -> Self {
        Self {
            id: id_value(model.id),
            name: Set(model.name.clone()),
            code: Set(model.code.clone()),
            device_id: Set(model.device_id.clone()),
            role: Set(format_role(model.role)),
        }
    }
}

// ===== FormSubmission / checkpoint =====

impl From<entity::form_submission::Model> for FormSubmission {
    fn from(entity: entity::form_submission::Model) -> Self {
        Self {
            id: entity.id,
            form_id: entity.form_id,
            uuid: entity.uuid,
            data: entity.data,
            submission_time: entity.submission_time,
        }
    }
}

impl From<&FormSubmission> for entity::form_submission::ActiveModel {
    fn from(model: &FormSubmission) -> Self {
        Self {
            id: id_value(model.id),
            form_id: Set(model.form_id),
            uuid: Set(model.uuid),
            data: Set(model.data.clone()),
            submission_time: Set(model.submission_time),
        }
    }
}

impl From<entity::form_checkpoint::Model> for FormRetrievalCheckpoint {
    fn from(entity: entity::form_checkpoint::Model) -> Self {
        Self {
            form_id: entity.form_id,
            timestamp: entity.timestamp,
        }
    }
}

impl From<&FormRetrievalCheckpoint> for entity::form_checkpoint::ActiveModel {
    fn from(model: &FormRetrievalCheckpoint) -> Self {
        Self {
            form_id: Set(model.form_id),
            timestamp: Set(model.timestamp),
        }
    }
}

// ===== Report aggregates =====

impl From<entity::donor_shipment_data::Model> for DonorShipmentData {
    fn from(entity: entity::donor_shipment_data::Model) -> Self {
        Self {
            donor_id: entity.donor_id,
            shipment_id: entity.shipment_id,
            package_count: entity.package_count.max(0) as u32,
            item_count: entity.item_count.max(0) as u32,
            delivered_count: entity.delivered_count.max(0) as u32,
            percentage_of_shipment: entity.percentage_of_shipment,
            price_usd: entity.price_usd,
            price_local: entity.price_local,
        }
    }
}

impl From<entity::donor_category_data::Model> for DonorCategoryData {
    fn from(entity: entity::donor_category_data::Model) -> Self {
        Self {
            donor_id: entity.donor_id,
            category_id: entity.category_id,
            item_count: entity.item_count.max(0) as u32,
            total_quantity: entity.total_quantity.max(0) as u64,
            price_usd: entity.price_usd,
            price_local: entity.price_local,
            first_date_shipped: entity.first_date_shipped,
            last_date_shipped: entity.last_date_shipped,
        }
    }
}
