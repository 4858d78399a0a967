//! Physical counting containers.
//!
//! A shipment arrives as one or more **bags**. A bag may hold **envelopes**
//! (one level deep only), each declared as carrying cash, documents or checks.
//! Every container owns the value-detail lines counted out of it; its counted
//! value is always the sum of those lines.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine, ValueType,
    util::{parse_optional_uuid, parse_uuid},
    value_details::ValueDetail,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    Cash,
    Document,
    Check,
}

impl EnvelopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Document => "document",
            Self::Check => "check",
        }
    }

    /// Whether a line of the given value type may be counted out of this
    /// envelope.
    pub fn accepts(self, value_type: ValueType) -> bool {
        match self {
            Self::Cash => matches!(value_type, ValueType::Bill | ValueType::Coin),
            Self::Document => value_type == ValueType::Document,
            Self::Check => value_type == ValueType::Check,
        }
    }
}

impl TryFrom<&str> for EnvelopeKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "document" => Ok(Self::Document),
            "check" => Ok(Self::Check),
            other => Err(EngineError::corrupt_row(format!(
                "invalid envelope kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContainerKind {
    Bag,
    Envelope { parent_id: Uuid, subtype: EnvelopeKind },
}

impl ContainerKind {
    pub fn is_bag(&self) -> bool {
        matches!(self, Self::Bag)
    }

    pub fn parent_id(&self) -> Option<Uuid> {
        match self {
            Self::Bag => None,
            Self::Envelope { parent_id, .. } => Some(*parent_id),
        }
    }

    pub fn envelope_kind(&self) -> Option<EnvelopeKind> {
        match self {
            Self::Bag => None,
            Self::Envelope { subtype, .. } => Some(*subtype),
        }
    }

    fn type_str(&self) -> &'static str {
        match self {
            Self::Bag => "bag",
            Self::Envelope { .. } => "envelope",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerStatus {
    Pending,
    InProcess,
    Processed,
    Verified,
    WithIncident,
}

impl ContainerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProcess => "in_process",
            Self::Processed => "processed",
            Self::Verified => "verified",
            Self::WithIncident => "with_incident",
        }
    }

    /// Counting on this container has not been completed yet.
    pub fn is_incomplete(self) -> bool {
        matches!(self, Self::Pending | Self::InProcess)
    }

    /// Transition table of the container lifecycle.
    pub fn can_transition_to(self, next: Self) -> bool {
        use ContainerStatus::*;
        matches!(
            (self, next),
            (Pending, InProcess)
                | (Pending | InProcess, Processed)
                | (Processed, Verified)
                | (Pending | InProcess | Processed | Verified, WithIncident)
        )
    }

    pub(crate) fn transition(self, next: Self) -> ResultEngine<Self> {
        if !self.can_transition_to(next) {
            return Err(EngineError::invalid_state(
                self,
                format!("container cannot move to {next}"),
            ));
        }
        Ok(next)
    }
}

impl core::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ContainerStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "in_process" => Ok(Self::InProcess),
            "processed" => Ok(Self::Processed),
            "verified" => Ok(Self::Verified),
            "with_incident" => Ok(Self::WithIncident),
            other => Err(EngineError::corrupt_row(format!(
                "invalid container status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub kind: ContainerKind,
    /// Seal or bag number printed on the container.
    pub code: String,
    pub declared_value: Option<Money>,
    pub counted_value: Money,
    pub status: ContainerStatus,
    pub processed_by: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub cashier_id: Option<String>,
    pub cashier_name: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    /// Counted lines; only filled by the detailed accessors.
    pub details: Vec<ValueDetail>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "containers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub parent_id: Option<String>,
    pub container_type: String,
    pub envelope_kind: Option<String>,
    pub code: String,
    pub declared_value_minor: Option<i64>,
    pub counted_value_minor: i64,
    pub status: String,
    pub processed_by: Option<String>,
    pub processed_at: Option<DateTimeUtc>,
    pub cashier_id: Option<String>,
    pub cashier_name: Option<String>,
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Transactions,
    #[sea_orm(has_many = "super::value_details::Entity")]
    ValueDetails,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::value_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ValueDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Container> for ActiveModel {
    fn from(container: &Container) -> Self {
        Self {
            id: ActiveValue::Set(container.id.to_string()),
            transaction_id: ActiveValue::Set(container.transaction_id.to_string()),
            parent_id: ActiveValue::Set(container.kind.parent_id().map(|id| id.to_string())),
            container_type: ActiveValue::Set(container.kind.type_str().to_string()),
            envelope_kind: ActiveValue::Set(
                container
                    .kind
                    .envelope_kind()
                    .map(|kind| kind.as_str().to_string()),
            ),
            code: ActiveValue::Set(container.code.clone()),
            declared_value_minor: ActiveValue::Set(container.declared_value.map(Money::minor)),
            counted_value_minor: ActiveValue::Set(container.counted_value.minor()),
            status: ActiveValue::Set(container.status.as_str().to_string()),
            processed_by: ActiveValue::Set(container.processed_by.clone()),
            processed_at: ActiveValue::Set(container.processed_at),
            cashier_id: ActiveValue::Set(container.cashier_id.clone()),
            cashier_name: ActiveValue::Set(container.cashier_name.clone()),
            created_by: ActiveValue::Set(container.created_by.clone()),
            created_at: ActiveValue::Set(container.created_at),
        }
    }
}

impl TryFrom<Model> for Container {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let kind = match model.container_type.as_str() {
            "bag" => ContainerKind::Bag,
            "envelope" => {
                let parent_id = parse_optional_uuid(model.parent_id.as_deref(), "parent")?
                    .ok_or_else(|| {
                        EngineError::Invariant("envelope without parent bag".to_string())
                    })?;
                let subtype = model
                    .envelope_kind
                    .as_deref()
                    .map(EnvelopeKind::try_from)
                    .transpose()?
                    .ok_or_else(|| EngineError::corrupt_row("envelope without kind"))?;
                ContainerKind::Envelope { parent_id, subtype }
            }
            other => {
                return Err(EngineError::corrupt_row(format!(
                    "invalid container type: {other}"
                )));
            }
        };

        Ok(Self {
            id: parse_uuid(&model.id, "container")?,
            transaction_id: parse_uuid(&model.transaction_id, "transaction")?,
            kind,
            code: model.code,
            declared_value: model.declared_value_minor.map(Money::new),
            counted_value: Money::new(model.counted_value_minor),
            status: ContainerStatus::try_from(model.status.as_str())?,
            processed_by: model.processed_by,
            processed_at: model.processed_at,
            cashier_id: model.cashier_id,
            cashier_name: model.cashier_name,
            created_by: model.created_by,
            created_at: model.created_at,
            details: Vec::new(),
        })
    }
}
