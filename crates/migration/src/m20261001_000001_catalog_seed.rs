//! Reference catalog seed.
//!
//! Loads the denominations, qualities, bank entities, incident types, client
//! points and service orders a fresh cash center starts with. Face values are
//! stored in minor units (cents).

use sea_orm::{ConnectionTrait, DbErr};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

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

/// (id, currency, face value in units, bundle size, is high, kind, description)
type DenominationRow = (i32, &'static str, i64, Option<i32>, bool, &'static str, &'static str);

const DENOMINATIONS: &[DenominationRow] = &[
    (1, "COP", 2_000, Some(100), false, "bill", "Billete $2.000"),
    (2, "COP", 5_000, Some(100), false, "bill", "Billete $5.000"),
    (3, "COP", 10_000, Some(100), false, "bill", "Billete $10.000"),
    (4, "COP", 20_000, Some(100), false, "bill", "Billete $20.000"),
    (5, "COP", 50_000, Some(100), true, "bill", "Billete $50.000"),
    (6, "COP", 100_000, Some(100), true, "bill", "Billete $100.000"),
    (11, "COP", 50, None, false, "coin", "Moneda $50"),
    (12, "COP", 100, None, false, "coin", "Moneda $100"),
    (13, "COP", 200, None, false, "coin", "Moneda $200"),
    (14, "COP", 500, None, false, "coin", "Moneda $500"),
    (15, "COP", 1_000, None, false, "coin", "Moneda $1.000"),
    (21, "USD", 1, Some(100), false, "bill", "Billete US$1"),
    (22, "USD", 5, Some(100), false, "bill", "Billete US$5"),
    (23, "USD", 10, Some(100), false, "bill", "Billete US$10"),
    (24, "USD", 20, Some(100), false, "bill", "Billete US$20"),
    (25, "USD", 50, Some(100), true, "bill", "Billete US$50"),
    (26, "USD", 100, Some(100), true, "bill", "Billete US$100"),
];

const QUALITIES: &[(i32, &str, &str)] = &[
    (1, "APTO", "bill"),
    (2, "DETERIORADO", "bill"),
    (3, "MUTILADO", "bill"),
    (4, "APTO", "coin"),
    (5, "DETERIORADO", "coin"),
];

const BANK_ENTITIES: &[(i32, &str, &str)] = &[
    (1, "BOG", "Banco de Bogotá"),
    (2, "BCO", "Bancolombia"),
    (3, "DAV", "Davivienda"),
    (4, "BBVA", "BBVA Colombia"),
];

/// (id, code, description, applies to, category)
const INCIDENT_TYPES: &[(i32, &str, &str, &str, &str)] = &[
    (1, "FALTANTE", "Faltante de efectivo", "both", "shortage"),
    (2, "SOBRANTE", "Sobrante de efectivo", "both", "surplus"),
    (3, "BILLETE_FALSO", "Billete falso", "incident", "shortage"),
    (4, "BILLETE_MUTILADO", "Billete mutilado", "incident", "informational"),
    (5, "SELLO_ROTO", "Sello de seguridad roto", "service", "informational"),
];

/// (id, name, envelopes, documents, checks)
const POINTS: &[(i32, &str, bool, bool, bool)] = &[
    (1, "Sucursal Centro", true, true, true),
    (2, "Cajero Automático Norte", false, false, false),
    (3, "Oficina Recaudo Sur", true, false, false),
];

/// (id, kind, origin point, destination point)
const SERVICE_ORDERS: &[(&str, &str, Option<i32>, Option<i32>)] = &[
    ("OS-1001", "collection", Some(1), None),
    ("OS-1002", "provision", None, Some(2)),
    ("OS-1003", "audit", Some(3), None),
    ("OS-1004", "collection", Some(2), None),
    ("OS-1005", "collection", None, None),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        let mut stmt = Query::insert()
            .into_table(Denominations::Table)
            .columns([
                Denominations::Id,
                Denominations::Currency,
                Denominations::FaceValueMinor,
                Denominations::BundleSize,
                Denominations::IsHigh,
                Denominations::MoneyKind,
                Denominations::Description,
                Denominations::Active,
            ])
            .to_owned();
        for &(id, currency, face, bundle, is_high, kind, description) in DENOMINATIONS {
            stmt.values_panic([
                id.into(),
                currency.into(),
                (face * 100).into(),
                bundle.into(),
                is_high.into(),
                kind.into(),
                description.into(),
                true.into(),
            ]);
        }
        db.execute(backend.build(&stmt)).await?;

        let mut stmt = Query::insert()
            .into_table(Qualities::Table)
            .columns([Qualities::Id, Qualities::Name, Qualities::MoneyKind])
            .to_owned();
        for &(id, name, kind) in QUALITIES {
            stmt.values_panic([id.into(), name.into(), kind.into()]);
        }
        db.execute(backend.build(&stmt)).await?;

        let mut stmt = Query::insert()
            .into_table(BankEntities::Table)
            .columns([BankEntities::Id, BankEntities::Code, BankEntities::Name])
            .to_owned();
        for &(id, code, name) in BANK_ENTITIES {
            stmt.values_panic([id.into(), code.into(), name.into()]);
        }
        db.execute(backend.build(&stmt)).await?;

        let mut stmt = Query::insert()
            .into_table(IncidentTypes::Table)
            .columns([
                IncidentTypes::Id,
                IncidentTypes::Code,
                IncidentTypes::Description,
                IncidentTypes::AppliesTo,
                IncidentTypes::Category,
            ])
            .to_owned();
        for &(id, code, description, applies_to, category) in INCIDENT_TYPES {
            stmt.values_panic([
                id.into(),
                code.into(),
                description.into(),
                applies_to.into(),
                category.into(),
            ]);
        }
        db.execute(backend.build(&stmt)).await?;

        let mut stmt = Query::insert()
            .into_table(Points::Table)
            .columns([
                Points::Id,
                Points::Name,
                Points::AllowsEnvelopes,
                Points::AllowsDocuments,
                Points::AllowsChecks,
            ])
            .to_owned();
        for &(id, name, envelopes, documents, checks) in POINTS {
            stmt.values_panic([
                id.into(),
                name.into(),
                envelopes.into(),
                documents.into(),
                checks.into(),
            ]);
        }
        db.execute(backend.build(&stmt)).await?;

        let mut stmt = Query::insert()
            .into_table(ServiceOrders::Table)
            .columns([
                ServiceOrders::Id,
                ServiceOrders::Kind,
                ServiceOrders::OriginPointId,
                ServiceOrders::DestinationPointId,
            ])
            .to_owned();
        for &(id, kind, origin, destination) in SERVICE_ORDERS {
            stmt.values_panic([id.into(), kind.into(), origin.into(), destination.into()]);
        }
        db.execute(backend.build(&stmt)).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        let service_orders: Vec<&str> = SERVICE_ORDERS.iter().map(|row| row.0).collect();
        let stmt = Query::delete()
            .from_table(ServiceOrders::Table)
            .and_where(Expr::col(ServiceOrders::Id).is_in(service_orders))
            .to_owned();
        db.execute(backend.build(&stmt)).await?;

        let stmt = Query::delete()
            .from_table(Points::Table)
            .and_where(Expr::col(Points::Id).is_in(POINTS.iter().map(|row| row.0)))
            .to_owned();
        db.execute(backend.build(&stmt)).await?;

        let stmt = Query::delete()
            .from_table(IncidentTypes::Table)
            .and_where(Expr::col(IncidentTypes::Id).is_in(INCIDENT_TYPES.iter().map(|row| row.0)))
            .to_owned();
        db.execute(backend.build(&stmt)).await?;

        let stmt = Query::delete()
            .from_table(BankEntities::Table)
            .and_where(Expr::col(BankEntities::Id).is_in(BANK_ENTITIES.iter().map(|row| row.0)))
            .to_owned();
        db.execute(backend.build(&stmt)).await?;

        let stmt = Query::delete()
            .from_table(Qualities::Table)
            .and_where(Expr::col(Qualities::Id).is_in(QUALITIES.iter().map(|row| row.0)))
            .to_owned();
        db.execute(backend.build(&stmt)).await?;

        let stmt = Query::delete()
            .from_table(Denominations::Table)
            .and_where(Expr::col(Denominations::Id).is_in(DENOMINATIONS.iter().map(|row| row.0)))
            .to_owned();
        db.execute(backend.build(&stmt)).await?;

        Ok(())
    }
}
