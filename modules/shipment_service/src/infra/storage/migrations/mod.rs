//! Database migrations for the shipment service

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_catalog::Migration),
            Box::new(m20250101_000002_create_kits::Migration),
            Box::new(m20250101_000003_create_shipments::Migration),
            Box::new(m20250101_000004_create_ingest::Migration),
            Box::new(m20250101_000005_create_report_aggregates::Migration),
        ]
    }
}

mod m20250101_000001_create_catalog {
    use super::*;

    #[derive(DeriveMigrationName)]
    pub struct Migration;

    /// Table of (id, unique name) pairs; donors, suppliers, transporters and
    /// item categories all share this shape
    fn named_entity_table(
        table: impl IntoTableRef,
        id: impl IntoIden,
        name: impl IntoIden,
    ) -> TableCreateStatement {
        Table::create()
            .table(table)
            .if_not_exists()
            .col(
                ColumnDef::new(id)
                    .big_integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(name).string().not_null().unique_key())
            .to_owned()
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(named_entity_table(Donors::Table, Donors::Id, Donors::Name))
                .await?;
            manager
                .create_table(named_entity_table(
                    Suppliers::Table,
                    Suppliers::Id,
                    Suppliers::Name,
                ))
                .await?;
            manager
                .create_table(named_entity_table(
                    Transporters::Table,
                    Transporters::Id,
                    Transporters::Name,
                ))
                .await?;
            manager
                .create_table(named_entity_table(
                    ItemCategories::Table,
                    ItemCategories::Id,
                    ItemCategories::Name,
                ))
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CatalogItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CatalogItems::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(CatalogItems::ItemCode).string().not_null())
                        .col(ColumnDef::new(CatalogItems::Description).string().not_null())
                        .col(ColumnDef::new(CatalogItems::Unit).string().not_null())
                        .col(
                            ColumnDef::new(CatalogItems::PriceUsd)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CatalogItems::PriceLocal)
                                .decimal_len(10, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CatalogItems::ItemCategoryId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CatalogItems::DonorId).big_integer())
                        .col(ColumnDef::new(CatalogItems::SupplierId).big_integer())
                        .col(ColumnDef::new(CatalogItems::WeightGrams).big_integer())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_catalog_items_category")
                                .from(CatalogItems::Table, CatalogItems::ItemCategoryId)
                                .to(ItemCategories::Table, ItemCategories::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_catalog_items_description")
                        .table(CatalogItems::Table)
                        .col(CatalogItems::Description)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(FieldUsers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FieldUsers::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(FieldUsers::Name).string().not_null())
                        .col(ColumnDef::new(FieldUsers::Code).string().not_null().unique_key())
                        .col(ColumnDef::new(FieldUsers::DeviceId).string().not_null())
                        .col(ColumnDef::new(FieldUsers::Role).string().not_null())
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(FieldUsers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CatalogItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ItemCategories::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Transporters::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Donors::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Donors {
        Table,
        Id,
        Name,
    }

    #[derive(DeriveIden)]
    enum Suppliers {
        Table,
        Id,
        Name,
    }

    #[derive(DeriveIden)]
    enum Transporters {
        Table,
        Id,
        Name,
    }

    #[derive(DeriveIden)]
    enum ItemCategories {
        Table,
        Id,
        Name,
    }

    #[derive(DeriveIden)]
    enum CatalogItems {
        Table,
        Id,
        ItemCode,
        Description,
        Unit,
        PriceUsd,
        PriceLocal,
        ItemCategoryId,
        DonorId,
        SupplierId,
        WeightGrams,
    }

    #[derive(DeriveIden)]
    enum FieldUsers {
        Table,
        Id,
        Name,
        Code,
        DeviceId,
        Role,
    }
}

mod m20250101_000002_create_kits {
    use super::*;

    #[derive(DeriveMigrationName)]
    pub struct Migration;

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Kits::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Kits::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Kits::Name).string().not_null().unique_key())
                        .col(ColumnDef::new(Kits::Description).string().not_null())
                        .to_owned(),
                )
                .await?;

            // No uniqueness on (kit, catalog item): legacy rows may hold
            // duplicates, which the service merges on the next addition.
            manager
                .create_table(
                    Table::create()
                        .table(KitItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(KitItems::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(KitItems::KitId).big_integer().not_null())
                        .col(ColumnDef::new(KitItems::CatalogItemId).big_integer().not_null())
                        .col(ColumnDef::new(KitItems::Quantity).integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_kit_items_kit")
                                .from(KitItems::Table, KitItems::KitId)
                                .to(Kits::Table, Kits::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_kit_items_kit_id")
                        .table(KitItems::Table)
                        .col(KitItems::KitId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(KitItems::Table).to_owned())
                .await?;
            manager.drop_table(Table::drop().table(Kits::Table).to_owned()).await
        }
    }

    #[derive(DeriveIden)]
    enum Kits {
        Table,
        Id,
        Name,
        Description,
    }

    #[derive(DeriveIden)]
    enum KitItems {
        Table,
        Id,
        KitId,
        CatalogItemId,
        Quantity,
    }
}

mod m20250101_000003_create_shipments {
    use super::*;

    #[derive(DeriveMigrationName)]
    pub struct Migration;

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Shipments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Shipments::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Shipments::Description).string().not_null())
                        .col(ColumnDef::new(Shipments::ShipmentDate).date().not_null())
                        .col(ColumnDef::new(Shipments::StoreRelease).string().not_null())
                        .col(ColumnDef::new(Shipments::Status).integer().not_null())
                        .col(ColumnDef::new(Shipments::TransporterId).big_integer())
                        .col(ColumnDef::new(Shipments::PartnerId).big_integer().not_null())
                        .col(ColumnDef::new(Shipments::Acceptable).boolean().not_null())
                        .col(ColumnDef::new(Shipments::StatusNote).text().not_null())
                        .col(ColumnDef::new(Shipments::Donor).string())
                        .col(ColumnDef::new(Shipments::LastScanStatusLabel).string())
                        .col(ColumnDef::new(Shipments::DatePickedUp).date())
                        .col(ColumnDef::new(Shipments::DateInTransit).date())
                        .col(ColumnDef::new(Shipments::DateExpected).date())
                        .col(ColumnDef::new(Shipments::DateReceived).date())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_shipments_status")
                        .table(Shipments::Table)
                        .col(Shipments::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Packages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Packages::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Packages::ShipmentId).big_integer().not_null())
                        .col(ColumnDef::new(Packages::Name).string().not_null())
                        .col(ColumnDef::new(Packages::Description).string().not_null())
                        .col(ColumnDef::new(Packages::NumberInShipment).integer().not_null())
                        .col(ColumnDef::new(Packages::Status).integer())
                        .col(ColumnDef::new(Packages::Code).string().not_null().unique_key())
                        .col(ColumnDef::new(Packages::KitId).big_integer())
                        .col(ColumnDef::new(Packages::LastScanId).big_integer())
                        .col(ColumnDef::new(Packages::LastScanStatusLabel).string())
                        .col(ColumnDef::new(Packages::DatePickedUp).timestamp_with_time_zone())
                        .col(ColumnDef::new(Packages::DateInTransit).timestamp_with_time_zone())
                        .col(ColumnDef::new(Packages::DateReceived).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_packages_shipment")
                                .from(Packages::Table, Packages::ShipmentId)
                                .to(Shipments::Table, Shipments::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_packages_shipment_number")
                        .table(Packages::Table)
                        .col(Packages::ShipmentId)
                        .col(Packages::NumberInShipment)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PackageItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PackageItems::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(PackageItems::PackageId).big_integer().not_null())
                        .col(ColumnDef::new(PackageItems::CatalogItemId).big_integer())
                        .col(ColumnDef::new(PackageItems::Description).string().not_null())
                        .col(ColumnDef::new(PackageItems::Unit).string().not_null())
                        .col(
                            ColumnDef::new(PackageItems::PriceUsd)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PackageItems::PriceLocal)
                                .decimal_len(10, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(PackageItems::ItemCategoryId).big_integer())
                        .col(ColumnDef::new(PackageItems::DonorId).big_integer())
                        .col(ColumnDef::new(PackageItems::SupplierId).big_integer())
                        .col(ColumnDef::new(PackageItems::WeightGrams).big_integer())
                        .col(ColumnDef::new(PackageItems::Quantity).integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_package_items_package")
                                .from(PackageItems::Table, PackageItems::PackageId)
                                .to(Packages::Table, Packages::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_package_items_package_id")
                        .table(PackageItems::Table)
                        .col(PackageItems::PackageId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PackageScans::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PackageScans::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(PackageScans::PackageId).big_integer().not_null())
                        .col(ColumnDef::new(PackageScans::ShipmentId).big_integer().not_null())
                        .col(ColumnDef::new(PackageScans::Latitude).double())
                        .col(ColumnDef::new(PackageScans::Longitude).double())
                        .col(ColumnDef::new(PackageScans::Altitude).double())
                        .col(ColumnDef::new(PackageScans::Accuracy).double())
                        .col(
                            ColumnDef::new(PackageScans::When)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PackageScans::StatusLabel).string())
                        .to_owned(),
                )
                .await?;

            // Duplicate submissions for the same package and time are not
            // stored twice
            manager
                .create_index(
                    Index::create()
                        .name("idx_package_scans_package_when")
                        .table(PackageScans::Table)
                        .col(PackageScans::PackageId)
                        .col(PackageScans::When)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_package_scans_shipment_id")
                        .table(PackageScans::Table)
                        .col(PackageScans::ShipmentId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PackageScans::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PackageItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Packages::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Shipments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Shipments {
        Table,
        Id,
        Description,
        ShipmentDate,
        StoreRelease,
        Status,
        TransporterId,
        PartnerId,
        Acceptable,
        StatusNote,
        Donor,
        LastScanStatusLabel,
        DatePickedUp,
        DateInTransit,
        DateExpected,
        DateReceived,
    }

    #[derive(DeriveIden)]
    enum Packages {
        Table,
        Id,
        ShipmentId,
        Name,
        Description,
        NumberInShipment,
        Status,
        Code,
        KitId,
        LastScanId,
        LastScanStatusLabel,
        DatePickedUp,
        DateInTransit,
        DateReceived,
    }

    #[derive(DeriveIden)]
    enum PackageItems {
        Table,
        Id,
        PackageId,
        CatalogItemId,
        Description,
        Unit,
        PriceUsd,
        PriceLocal,
        ItemCategoryId,
        DonorId,
        SupplierId,
        WeightGrams,
        Quantity,
    }

    #[derive(DeriveIden)]
    enum PackageScans {
        Table,
        Id,
        PackageId,
        ShipmentId,
        Latitude,
        Longitude,
        Altitude,
        Accuracy,
        When,
        StatusLabel,
    }
}

mod m20250101_000004_create_ingest {
    use super::*;

    #[derive(DeriveMigrationName)]
    pub struct Migration;

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(FormSubmissions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FormSubmissions::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(FormSubmissions::FormId).big_integer().not_null())
                        .col(
                            ColumnDef::new(FormSubmissions::Uuid)
                                .uuid()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(FormSubmissions::Data).json().not_null())
                        .col(
                            ColumnDef::new(FormSubmissions::SubmissionTime)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_form_submissions_form_time")
                        .table(FormSubmissions::Table)
                        .col(FormSubmissions::FormId)
                        .col(FormSubmissions::SubmissionTime)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(FormRetrievalTimestamps::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FormRetrievalTimestamps::FormId)
                                .big_integer()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(FormRetrievalTimestamps::Timestamp)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(FormRetrievalTimestamps::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(FormSubmissions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum FormSubmissions {
        Table,
        Id,
        FormId,
        Uuid,
        Data,
        SubmissionTime,
    }

    #[derive(DeriveIden)]
    enum FormRetrievalTimestamps {
        Table,
        FormId,
        Timestamp,
    }
}

mod m20250101_000005_create_report_aggregates {
    use super::*;

    #[derive(DeriveMigrationName)]
    pub struct Migration;

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DonorShipmentData::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DonorShipmentData::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(DonorShipmentData::DonorId).big_integer())
                        .col(
                            ColumnDef::new(DonorShipmentData::ShipmentId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DonorShipmentData::PackageCount)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DonorShipmentData::ItemCount).integer().not_null())
                        .col(
                            ColumnDef::new(DonorShipmentData::DeliveredCount)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DonorShipmentData::PercentageOfShipment)
                                .decimal_len(5, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DonorShipmentData::PriceUsd)
                                .decimal_len(16, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DonorShipmentData::PriceLocal)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_donor_shipment_data_pair")
                        .table(DonorShipmentData::Table)
                        .col(DonorShipmentData::DonorId)
                        .col(DonorShipmentData::ShipmentId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DonorCategoryData::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DonorCategoryData::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(DonorCategoryData::DonorId).big_integer())
                        .col(ColumnDef::new(DonorCategoryData::CategoryId).big_integer())
                        .col(ColumnDef::new(DonorCategoryData::ItemCount).integer().not_null())
                        .col(
                            ColumnDef::new(DonorCategoryData::TotalQuantity)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DonorCategoryData::PriceUsd)
                                .decimal_len(16, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DonorCategoryData::PriceLocal)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(DonorCategoryData::FirstDateShipped).date())
                        .col(ColumnDef::new(DonorCategoryData::LastDateShipped).date())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_donor_category_data_pair")
                        .table(DonorCategoryData::Table)
                        .col(DonorCategoryData::DonorId)
                        .col(DonorCategoryData::CategoryId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DonorCategoryData::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DonorShipmentData::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DonorShipmentData {
        Table,
        Id,
        DonorId,
        ShipmentId,
        PackageCount,
        ItemCount,
        DeliveredCount,
        PercentageOfShipment,
        PriceUsd,
        PriceLocal,
    }

    #[derive(DeriveIden)]
    enum DonorCategoryData {
        Table,
        Id,
        DonorId,
        CategoryId,
        ItemCount,
        TotalQuantity,
        PriceUsd,
        PriceLocal,
        FirstDateShipped,
        LastDateShipped,
    }
}
