//! Client points (branches, ATMs, cashier offices) served by the center.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Optional container kinds a point is configured to hand over or receive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointCapabilities {
    pub allows_envelopes: bool,
    pub allows_documents: bool,
    pub allows_checks: bool,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "points")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
    pub allows_envelopes: bool,
    pub allows_documents: bool,
    pub allows_checks: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Model> for PointCapabilities {
    fn from(model: &Model) -> Self {
        Self {
            allows_envelopes: model.allows_envelopes,
            allows_documents: model.allows_documents,
            allows_checks: model.allows_checks,
        }
    }
}
