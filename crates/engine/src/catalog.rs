//! Catalog gateway.
//!
//! Read-only lookups over the reference data maintained by the master-catalog
//! administration: denominations, quality grades, bank entities, incident
//! types, and the points/service orders that decide which optional container
//! kinds a shipment may carry. Nothing here writes.
//!
//! Missing reference rows are reported as [`EngineError::Unconfigured`]: they
//! mean master data needs updating, not that the caller sent bad input.

use std::collections::{BTreeSet, HashMap};

use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};

use crate::{EngineError, ResultEngine};

pub mod bank_entities;
pub mod denominations;
pub mod incident_types;
pub mod points;
pub mod qualities;
pub mod service_orders;

pub use bank_entities::BankEntity;
pub use denominations::{Denomination, MoneyKind};
pub use incident_types::{IncidentCategory, IncidentScope, IncidentType};
pub use points::PointCapabilities;
pub use qualities::Quality;
pub use service_orders::ServiceOrder;

/// Denomination source consumed by the value-detail calculator.
pub trait DenominationLookup {
    fn denomination(&self, id: i32) -> Option<&Denomination>;
}

/// Denominations loaded once per unit of work.
#[derive(Clone, Debug, Default)]
pub struct DenominationTable(HashMap<i32, Denomination>);

impl DenominationLookup for DenominationTable {
    fn denomination(&self, id: i32) -> Option<&Denomination> {
        self.0.get(&id)
    }
}

impl FromIterator<Denomination> for DenominationTable {
    fn from_iter<T: IntoIterator<Item = Denomination>>(iter: T) -> Self {
        Self(iter.into_iter().map(|d| (d.id, d)).collect())
    }
}

pub(crate) async fn denomination<C: ConnectionTrait>(db: &C, id: i32) -> ResultEngine<Denomination> {
    let model = denominations::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::Unconfigured(format!("denomination {id} not found")))?;
    Denomination::try_from(model)
}

/// Loads the given denominations. Unknown ids are simply absent from the table;
/// the calculator reports them when a line needs them.
pub(crate) async fn denomination_table<C, I>(db: &C, ids: I) -> ResultEngine<DenominationTable>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = i32>,
{
    let ids: BTreeSet<i32> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(DenominationTable::default());
    }
    let models = denominations::Entity::find()
        .filter(denominations::Column::Id.is_in(ids))
        .all(db)
        .await?;
    models
        .into_iter()
        .map(Denomination::try_from)
        .collect::<ResultEngine<DenominationTable>>()
}

pub(crate) async fn quality<C: ConnectionTrait>(db: &C, id: i32) -> ResultEngine<Quality> {
    let model = qualities::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::Unconfigured(format!("quality {id} not found")))?;
    Quality::try_from(model)
}

pub(crate) async fn bank_entity<C: ConnectionTrait>(db: &C, id: i32) -> ResultEngine<BankEntity> {
    bank_entities::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(BankEntity::from)
        .ok_or_else(|| EngineError::Unconfigured(format!("bank entity {id} not found")))
}

pub(crate) async fn incident_type<C: ConnectionTrait>(
    db: &C,
    code: &str,
) -> ResultEngine<IncidentType> {
    let code = code.trim();
    let model = incident_types::Entity::find()
        .filter(incident_types::Column::Code.eq(code.to_string()))
        .one(db)
        .await?
        .ok_or_else(|| EngineError::Unconfigured(format!("incident type {code} not configured")))?;
    IncidentType::try_from(model)
}

pub(crate) async fn incident_type_by_id<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> ResultEngine<IncidentType> {
    let model = incident_types::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::Unconfigured(format!("incident type {id} not configured")))?;
    IncidentType::try_from(model)
}

pub(crate) async fn service_order<C: ConnectionTrait>(
    db: &C,
    service_order_id: &str,
) -> ResultEngine<ServiceOrder> {
    let model = service_orders::Entity::find_by_id(service_order_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("service order not exists".to_string()))?;
    ServiceOrder::try_from(model)
}

/// Capabilities of the client point referenced by a service order. An order
/// without any point accepts no optional container kinds.
pub(crate) async fn point_capabilities<C: ConnectionTrait>(
    db: &C,
    service_order_id: &str,
) -> ResultEngine<PointCapabilities> {
    let order = service_order(db, service_order_id).await?;
    let Some(point_id) = order.client_point_id() else {
        return Ok(PointCapabilities::default());
    };
    let point = points::Entity::find_by_id(point_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::Unconfigured(format!("point {point_id} not found")))?;
    Ok(PointCapabilities::from(&point))
}
