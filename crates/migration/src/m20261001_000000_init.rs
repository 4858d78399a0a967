//! Initial schema migration - creates all tables from scratch.
//!
//! Reference catalog (read-only for the engine):
//!
//! - `denominations`: bills and coins with face value and bundle size
//! - `qualities`: grades a counted line can be tagged with
//! - `bank_entities`: issuers of checks and documents
//! - `incident_types`: incident codes with scope and signed category
//! - `points`: client points and the optional container kinds they accept
//! - `service_orders`: orders a shipment is checked in against
//!
//! Engine-owned rows:
//!
//! - `transactions`: declared shipment, counted aggregates and lifecycle
//! - `containers`: bags and envelopes
//! - `value_details`: counted lines of a container
//! - `incidents`: discrepancies and their adjudication

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Denominations {
    Table,
    Id,
    Currency,
    FaceValueMinor,
    BundleSize,
    IsHigh,
    MoneyKind,
    Description,
    Active,
}

#[derive(Iden)]
enum Qualities {
    Table,
    Id,
    Name,
    MoneyKind,
}

#[derive(Iden)]
enum BankEntities {
    Table,
    Id,
    Code,
    Name,
}

#[derive(Iden)]
enum IncidentTypes {
    Table,
    Id,
    Code,
    Description,
    AppliesTo,
    Category,
}

#[derive(Iden)]
enum Points {
    Table,
    Id,
    Name,
    AllowsEnvelopes,
    AllowsDocuments,
    AllowsChecks,
}

#[derive(Iden)]
enum ServiceOrders {
    Table,
    Id,
    Kind,
    OriginPointId,
    DestinationPointId,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    ServiceOrderId,
    RouteId,
    BranchId,
    Currency,
    Kind,
    DeclaredBags,
    DeclaredEnvelopes,
    DeclaredChecks,
    DeclaredDocuments,
    DeclaredBillMinor,
    DeclaredCoinMinor,
    DeclaredDocumentMinor,
    DeclaredTotalMinor,
    CountedBillHighMinor,
    CountedBillLowMinor,
    CountedCoinMinor,
    CountedCheckMinor,
    CountedDocumentMinor,
    CashSubtotalMinor,
    OverallMinor,
    ValueDifferenceMinor,
    DeclaredWords,
    CountedWords,
    OverallWords,
    Note,
    Custody,
    PointToPoint,
    Status,
    RegisteredBy,
    RegisteredAt,
    RegisteredIp,
    IdempotencyKey,
    ReviewedBy,
    ReviewedAt,
    Disposition,
    CancelledBy,
    CancelledAt,
}

#[derive(Iden)]
enum Containers {
    Table,
    Id,
    TransactionId,
    ParentId,
    ContainerType,
    EnvelopeKind,
    Code,
    DeclaredValueMinor,
    CountedValueMinor,
    Status,
    ProcessedBy,
    ProcessedAt,
    CashierId,
    CashierName,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum ValueDetails {
    Table,
    Id,
    ContainerId,
    ValueType,
    DenominationId,
    QualityId,
    Quantity,
    Bundles,
    Loose,
    UnitValueMinor,
    IsHigh,
    AmountMinor,
    BankEntityId,
    AccountNumber,
    CheckNumber,
    IssuedOn,
}

#[derive(Iden)]
enum Incidents {
    Table,
    Id,
    TransactionId,
    ContainerId,
    ValueDetailId,
    IncidentTypeId,
    IncidentTypeCode,
    DenominationId,
    Quantity,
    AmountMinor,
    Description,
    ReportedBy,
    ReportedAt,
    Status,
    ResolvedBy,
    ResolvedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Catalog
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Denominations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Denominations::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Denominations::Currency)
                            .string()
                            .not_null()
                            .default("COP"),
                    )
                    .col(
                        ColumnDef::new(Denominations::FaceValueMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Denominations::BundleSize).integer())
                    .col(
                        ColumnDef::new(Denominations::IsHigh)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Denominations::MoneyKind).string().not_null())
                    .col(ColumnDef::new(Denominations::Description).string().not_null())
                    .col(
                        ColumnDef::new(Denominations::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Qualities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Qualities::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Qualities::Name).string().not_null())
                    .col(ColumnDef::new(Qualities::MoneyKind).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BankEntities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BankEntities::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BankEntities::Code).string().not_null())
                    .col(ColumnDef::new(BankEntities::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(IncidentTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IncidentTypes::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(IncidentTypes::Code)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(IncidentTypes::Description).string().not_null())
                    .col(ColumnDef::new(IncidentTypes::AppliesTo).string().not_null())
                    .col(ColumnDef::new(IncidentTypes::Category).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Points::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Points::Id).integer().not_null().primary_key())
                    .col(ColumnDef::new(Points::Name).string().not_null())
                    .col(
                        ColumnDef::new(Points::AllowsEnvelopes)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Points::AllowsDocuments)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Points::AllowsChecks)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ServiceOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceOrders::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ServiceOrders::Kind).string().not_null())
                    .col(ColumnDef::new(ServiceOrders::OriginPointId).integer())
                    .col(ColumnDef::new(ServiceOrders::DestinationPointId).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-service_orders-origin_point_id")
                            .from(ServiceOrders::Table, ServiceOrders::OriginPointId)
                            .to(Points::Table, Points::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-service_orders-destination_point_id")
                            .from(ServiceOrders::Table, ServiceOrders::DestinationPointId)
                            .to(Points::Table, Points::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Transactions
        // ───────────────────────────────────────────────────────────────────
        let mut transactions = Table::create();
        transactions
            .table(Transactions::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Transactions::Id)
                    .string()
                    .not_null()
                    .primary_key(),
            )
            .col(
                ColumnDef::new(Transactions::ServiceOrderId)
                    .string()
                    .not_null(),
            )
            .col(ColumnDef::new(Transactions::RouteId).string())
            .col(ColumnDef::new(Transactions::BranchId).string())
            .col(
                ColumnDef::new(Transactions::Currency)
                    .string()
                    .not_null()
                    .default("COP"),
            )
            .col(ColumnDef::new(Transactions::Kind).string().not_null());
        for count in [
            Transactions::DeclaredBags,
            Transactions::DeclaredEnvelopes,
            Transactions::DeclaredChecks,
            Transactions::DeclaredDocuments,
        ] {
            transactions.col(ColumnDef::new(count).integer().not_null().default(0));
        }
        for amount in [
            Transactions::DeclaredBillMinor,
            Transactions::DeclaredCoinMinor,
            Transactions::DeclaredDocumentMinor,
            Transactions::DeclaredTotalMinor,
            Transactions::CountedBillHighMinor,
            Transactions::CountedBillLowMinor,
            Transactions::CountedCoinMinor,
            Transactions::CountedCheckMinor,
            Transactions::CountedDocumentMinor,
            Transactions::CashSubtotalMinor,
            Transactions::OverallMinor,
            Transactions::ValueDifferenceMinor,
        ] {
            transactions.col(ColumnDef::new(amount).big_integer().not_null().default(0));
        }
        for words in [
            Transactions::DeclaredWords,
            Transactions::CountedWords,
            Transactions::OverallWords,
        ] {
            transactions.col(ColumnDef::new(words).string().not_null().default(""));
        }
        transactions
            .col(ColumnDef::new(Transactions::Note).string())
            .col(
                ColumnDef::new(Transactions::Custody)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(
                ColumnDef::new(Transactions::PointToPoint)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(ColumnDef::new(Transactions::Status).string().not_null())
            .col(ColumnDef::new(Transactions::RegisteredBy).string().not_null())
            .col(
                ColumnDef::new(Transactions::RegisteredAt)
                    .timestamp()
                    .not_null(),
            )
            .col(ColumnDef::new(Transactions::RegisteredIp).string())
            .col(ColumnDef::new(Transactions::IdempotencyKey).string())
            .col(ColumnDef::new(Transactions::ReviewedBy).string())
            .col(ColumnDef::new(Transactions::ReviewedAt).timestamp())
            .col(ColumnDef::new(Transactions::Disposition).string())
            .col(ColumnDef::new(Transactions::CancelledBy).string())
            .col(ColumnDef::new(Transactions::CancelledAt).timestamp())
            .foreign_key(
                ForeignKey::create()
                    .name("fk-transactions-service_order_id")
                    .from(Transactions::Table, Transactions::ServiceOrderId)
                    .to(ServiceOrders::Table, ServiceOrders::Id),
            );
        manager.create_table(transactions.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-idempotency_key")
                    .table(Transactions::Table)
                    .col(Transactions::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-service_order_id")
                    .table(Transactions::Table)
                    .col(Transactions::ServiceOrderId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Containers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Containers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Containers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Containers::TransactionId).string().not_null())
                    .col(ColumnDef::new(Containers::ParentId).string())
                    .col(ColumnDef::new(Containers::ContainerType).string().not_null())
                    .col(ColumnDef::new(Containers::EnvelopeKind).string())
                    .col(ColumnDef::new(Containers::Code).string().not_null())
                    .col(ColumnDef::new(Containers::DeclaredValueMinor).big_integer())
                    .col(
                        ColumnDef::new(Containers::CountedValueMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Containers::Status).string().not_null())
                    .col(ColumnDef::new(Containers::ProcessedBy).string())
                    .col(ColumnDef::new(Containers::ProcessedAt).timestamp())
                    .col(ColumnDef::new(Containers::CashierId).string())
                    .col(ColumnDef::new(Containers::CashierName).string())
                    .col(ColumnDef::new(Containers::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Containers::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-containers-transaction_id")
                            .from(Containers::Table, Containers::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-containers-parent_id")
                            .from(Containers::Table, Containers::ParentId)
                            .to(Containers::Table, Containers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-containers-transaction_id")
                    .table(Containers::Table)
                    .col(Containers::TransactionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-containers-parent_id")
                    .table(Containers::Table)
                    .col(Containers::ParentId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Value details
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ValueDetails::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ValueDetails::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ValueDetails::ContainerId).string().not_null())
                    .col(ColumnDef::new(ValueDetails::ValueType).string().not_null())
                    .col(ColumnDef::new(ValueDetails::DenominationId).integer())
                    .col(ColumnDef::new(ValueDetails::QualityId).integer())
                    .col(ColumnDef::new(ValueDetails::Quantity).big_integer())
                    .col(
                        ColumnDef::new(ValueDetails::Bundles)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ValueDetails::Loose)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ValueDetails::UnitValueMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ValueDetails::IsHigh)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ValueDetails::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ValueDetails::BankEntityId).integer())
                    .col(ColumnDef::new(ValueDetails::AccountNumber).string())
                    .col(ColumnDef::new(ValueDetails::CheckNumber).string())
                    .col(ColumnDef::new(ValueDetails::IssuedOn).date())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-value_details-container_id")
                            .from(ValueDetails::Table, ValueDetails::ContainerId)
                            .to(Containers::Table, Containers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-value_details-denomination_id")
                            .from(ValueDetails::Table, ValueDetails::DenominationId)
                            .to(Denominations::Table, Denominations::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-value_details-quality_id")
                            .from(ValueDetails::Table, ValueDetails::QualityId)
                            .to(Qualities::Table, Qualities::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-value_details-bank_entity_id")
                            .from(ValueDetails::Table, ValueDetails::BankEntityId)
                            .to(BankEntities::Table, BankEntities::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-value_details-container_id")
                    .table(ValueDetails::Table)
                    .col(ValueDetails::ContainerId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Incidents
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Incidents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Incidents::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Incidents::TransactionId).string())
                    .col(ColumnDef::new(Incidents::ContainerId).string())
                    .col(ColumnDef::new(Incidents::ValueDetailId).string())
                    .col(ColumnDef::new(Incidents::IncidentTypeId).integer().not_null())
                    .col(
                        ColumnDef::new(Incidents::IncidentTypeCode)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Incidents::DenominationId).integer())
                    .col(
                        ColumnDef::new(Incidents::Quantity)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Incidents::AmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Incidents::Description).string())
                    .col(ColumnDef::new(Incidents::ReportedBy).string().not_null())
                    .col(ColumnDef::new(Incidents::ReportedAt).timestamp().not_null())
                    .col(ColumnDef::new(Incidents::Status).string().not_null())
                    .col(ColumnDef::new(Incidents::ResolvedBy).string())
                    .col(ColumnDef::new(Incidents::ResolvedAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-incidents-transaction_id")
                            .from(Incidents::Table, Incidents::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-incidents-incident_type_id")
                            .from(Incidents::Table, Incidents::IncidentTypeId)
                            .to(IncidentTypes::Table, IncidentTypes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-incidents-transaction_id")
                    .table(Incidents::Table)
                    .col(Incidents::TransactionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-incidents-container_id")
                    .table(Incidents::Table)
                    .col(Incidents::ContainerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        for table in [
            Incidents::Table.into_iden(),
            ValueDetails::Table.into_iden(),
            Containers::Table.into_iden(),
            Transactions::Table.into_iden(),
            ServiceOrders::Table.into_iden(),
            Points::Table.into_iden(),
            IncidentTypes::Table.into_iden(),
            BankEntities::Table.into_iden(),
            Qualities::Table.into_iden(),
            Denominations::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}
