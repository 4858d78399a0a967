//! Denominations catalog (read-only reference data).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, Money};

/// Physical form of a cash denomination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoneyKind {
    Bill,
    Coin,
}

impl MoneyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bill => "bill",
            Self::Coin => "coin",
        }
    }

    /// Pieces per bundle when the catalog entry does not say.
    pub const fn default_bundle_size(self) -> i64 {
        match self {
            Self::Bill => 100,
            Self::Coin => 1000,
        }
    }
}

impl TryFrom<&str> for MoneyKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "bill" => Ok(Self::Bill),
            "coin" => Ok(Self::Coin),
            other => Err(EngineError::corrupt_row(format!(
                "invalid money kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denomination {
    pub id: i32,
    pub currency: Currency,
    pub face_value: Money,
    pub bundle_size: Option<i64>,
    pub is_high: bool,
    pub kind: MoneyKind,
    pub description: String,
    pub active: bool,
}

impl Denomination {
    /// Bundle size from the catalog, or the default for the money kind.
    pub fn effective_bundle_size(&self) -> i64 {
        self.bundle_size
            .filter(|size| *size > 0)
            .unwrap_or_else(|| self.kind.default_bundle_size())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "denominations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub currency: String,
    pub face_value_minor: i64,
    pub bundle_size: Option<i32>,
    pub is_high: bool,
    pub money_kind: String,
    pub description: String,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Denomination {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            currency: Currency::try_from(model.currency.as_str())?,
            face_value: Money::new(model.face_value_minor),
            bundle_size: model.bundle_size.map(i64::from),
            is_high: model.is_high,
            kind: MoneyKind::try_from(model.money_kind.as_str())?,
            description: model.description,
            active: model.active,
        })
    }
}
