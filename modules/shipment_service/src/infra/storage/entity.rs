//! SeaORM entities for database tables

/// Shipments table
pub mod shipment {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "shipments")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub description: String,
        pub shipment_date: Date,
        pub store_release: String,
        pub status: i32,
        pub transporter_id: Option<i64>,
        pub partner_id: i64,
        pub acceptable: bool,
        pub status_note: String,
        /// Denormalized donor summary, recomputed on save
        pub donor: Option<String>,
        pub last_scan_status_label: Option<String>,
        pub date_picked_up: Option<Date>,
        pub date_in_transit: Option<Date>,
        pub date_expected: Option<Date>,
        pub date_received: Option<Date>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::package::Entity")]
        Packages,
    }

    impl Related<super::package::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Packages.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Packages table
pub mod package {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "packages")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub shipment_id: i64,
        pub name: String,
        pub description: String,
        pub number_in_shipment: i32,
        pub status: Option<i32>,
        /// Unique external code used for QR identification
        pub code: String,
        pub kit_id: Option<i64>,
        pub last_scan_id: Option<i64>,
        pub last_scan_status_label: Option<String>,
        pub date_picked_up: Option<DateTimeUtc>,
        pub date_in_transit: Option<DateTimeUtc>,
        pub date_received: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::shipment::Entity",
            from = "Column::ShipmentId",
            to = "super::shipment::Column::Id"
        )]
        Shipment,
        #[sea_orm(has_many = "super::package_item::Entity")]
        Items,
    }

    impl Related<super::shipment::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Shipment.def()
        }
    }

    impl Related<super::package_item::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Items.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Package items table
pub mod package_item {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "package_items")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub package_id: i64,
        pub catalog_item_id: Option<i64>,
        pub description: String,
        pub unit: String,
        /// Price of ONE unit in US dollars
        pub price_usd: Decimal,
        /// Price of ONE unit in local currency
        pub price_local: Decimal,
        pub item_category_id: Option<i64>,
        pub donor_id: Option<i64>,
        pub supplier_id: Option<i64>,
        pub weight_grams: Option<i64>,
        pub quantity: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::package::Entity",
            from = "Column::PackageId",
            to = "super::package::Column::Id"
        )]
        Package,
    }

    impl Related<super::package::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Package.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Package scans table
pub mod package_scan {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "package_scans")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub package_id: i64,
        /// Redundant copy of the package's shipment for by-shipment queries
        pub shipment_id: i64,
        pub latitude: Option<f64>,
        pub longitude: Option<f64>,
        pub altitude: Option<f64>,
        pub accuracy: Option<f64>,
        pub when: DateTimeUtc,
        pub status_label: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::package::Entity",
            from = "Column::PackageId",
            to = "super::package::Column::Id"
        )]
        Package,
    }

    impl Related<super::package::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Package.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Kits table
pub mod kit {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "kits")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub name: String,
        pub description: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::kit_item::Entity")]
        Items,
    }

    impl Related<super::kit_item::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Items.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Kit items table. No database uniqueness on (kit, catalog item): legacy
/// rows may hold duplicates, which the service merges on the next addition.
pub mod kit_item {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "kit_items")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub kit_id: i64,
        pub catalog_item_id: i64,
        pub quantity: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::kit::Entity",
            from = "Column::KitId",
            to = "super::kit::Column::Id"
        )]
        Kit,
    }

    impl Related<super::kit::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Kit.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Catalog items table
pub mod catalog_item {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "catalog_items")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub item_code: String,
        pub description: String,
        pub unit: String,
        pub price_usd: Decimal,
        pub price_local: Decimal,
        pub item_category_id: i64,
        pub donor_id: Option<i64>,
        pub supplier_id: Option<i64>,
        pub weight_grams: Option<i64>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Item categories table
pub mod item_category {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "item_categories")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Donors table
pub mod donor {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "donors")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Suppliers table
pub mod supplier {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "suppliers")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Transporters table
pub mod transporter {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "transporters")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Users table: coordinators, officers and partners
pub mod field_user {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "field_users")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub name: String,
        /// QR code identifying this user to field forms
        pub code: String,
        /// Device currently bound to this user; empty when none
        pub device_id: String,
        /// COORDINATOR, OFFICER or PARTNER
        pub role: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Form submissions table, de-duplicated by uuid
pub mod form_submission {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "form_submissions")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub form_id: i64,
        #[sea_orm(unique)]
        pub uuid: Uuid,
        /// The payload exactly as received
        pub data: Json,
        /// Copied from the payload, used for ordering and checkpointing
        pub submission_time: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Retrieval checkpoints, one row per external form
pub mod form_checkpoint {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "form_retrieval_timestamps")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub form_id: i64,
        pub timestamp: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Donor×shipment report aggregate
pub mod donor_shipment_data {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "donor_shipment_data")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub donor_id: Option<i64>,
        pub shipment_id: i64,
        pub package_count: i32,
        pub item_count: i32,
        pub delivered_count: i32,
        pub percentage_of_shipment: Decimal,
        pub price_usd: Decimal,
        pub price_local: Decimal,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Donor×category report aggregate
pub mod donor_category_data {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "donor_category_data")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub donor_id: Option<i64>,
        pub category_id: Option<i64>,
        pub item_count: i32,
        pub total_quantity: i64,
        pub price_usd: Decimal,
        pub price_local: Decimal,
        pub first_date_shipped: Option<Date>,
        pub last_date_shipped: Option<Date>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
