//! Counted lines of a container.
//!
//! The amount of a line is always derived by the calculator from its inputs
//! and the denomination catalog; it is never taken from a caller.

use chrono::NaiveDate;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, MoneyKind, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bill,
    Coin,
    Check,
    Document,
}

impl ValueType {
    pub const ALL: [ValueType; 4] = [Self::Bill, Self::Coin, Self::Check, Self::Document];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bill => "bill",
            Self::Coin => "coin",
            Self::Check => "check",
            Self::Document => "document",
        }
    }

    /// Money kind a denomination must have to be counted on this line.
    pub fn money_kind(self) -> Option<MoneyKind> {
        match self {
            Self::Bill => Some(MoneyKind::Bill),
            Self::Coin => Some(MoneyKind::Coin),
            Self::Check | Self::Document => None,
        }
    }

    pub fn is_cash(self) -> bool {
        self.money_kind().is_some()
    }
}

impl core::fmt::Display for ValueType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ValueType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "bill" => Ok(Self::Bill),
            "coin" => Ok(Self::Coin),
            "check" => Ok(Self::Check),
            "document" => Ok(Self::Document),
            other => Err(EngineError::corrupt_row(format!(
                "invalid value type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDetail {
    pub id: Uuid,
    pub container_id: Uuid,
    pub value_type: ValueType,
    pub denomination_id: Option<i32>,
    pub quality_id: Option<i32>,
    pub quantity: Option<i64>,
    pub bundles: i64,
    pub loose: i64,
    pub unit_value: Money,
    pub is_high: bool,
    pub amount: Money,
    pub bank_entity_id: Option<i32>,
    pub account_number: Option<String>,
    pub check_number: Option<String>,
    pub issued_on: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "value_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub container_id: String,
    pub value_type: String,
    pub denomination_id: Option<i32>,
    pub quality_id: Option<i32>,
    pub quantity: Option<i64>,
    pub bundles: i64,
    pub loose: i64,
    pub unit_value_minor: i64,
    pub is_high: bool,
    pub amount_minor: i64,
    pub bank_entity_id: Option<i32>,
    pub account_number: Option<String>,
    pub check_number: Option<String>,
    pub issued_on: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::containers::Entity",
        from = "Column::ContainerId",
        to = "super::containers::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Containers,
}

impl Related<super::containers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Containers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ValueDetail> for ActiveModel {
    fn from(detail: &ValueDetail) -> Self {
        Self {
            id: ActiveValue::Set(detail.id.to_string()),
            container_id: ActiveValue::Set(detail.container_id.to_string()),
            value_type: ActiveValue::Set(detail.value_type.as_str().to_string()),
            denomination_id: ActiveValue::Set(detail.denomination_id),
            quality_id: ActiveValue::Set(detail.quality_id),
            quantity: ActiveValue::Set(detail.quantity),
            bundles: ActiveValue::Set(detail.bundles),
            loose: ActiveValue::Set(detail.loose),
            unit_value_minor: ActiveValue::Set(detail.unit_value.minor()),
            is_high: ActiveValue::Set(detail.is_high),
            amount_minor: ActiveValue::Set(detail.amount.minor()),
            bank_entity_id: ActiveValue::Set(detail.bank_entity_id),
            account_number: ActiveValue::Set(detail.account_number.clone()),
            check_number: ActiveValue::Set(detail.check_number.clone()),
            issued_on: ActiveValue::Set(detail.issued_on),
        }
    }
}

impl TryFrom<Model> for ValueDetail {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "value detail")?,
            container_id: parse_uuid(&model.container_id, "container")?,
            value_type: ValueType::try_from(model.value_type.as_str())?,
            denomination_id: model.denomination_id,
            quality_id: model.quality_id,
            quantity: model.quantity,
            bundles: model.bundles,
            loose: model.loose,
            unit_value: Money::new(model.unit_value_minor),
            is_high: model.is_high,
            amount: Money::new(model.amount_minor),
            bank_entity_id: model.bank_entity_id,
            account_number: model.account_number,
            check_number: model.check_number,
            issued_on: model.issued_on,
        })
    }
}
