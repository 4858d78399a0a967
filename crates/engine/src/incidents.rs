//! Incidents raised while counting a shipment.
//!
//! An incident hangs off a transaction, a container or a single counted line.
//! Only incidents adjudicated as [`IncidentStatus::Adjusted`] move money: their
//! amount, signed by the category of their type, is folded into the value
//! difference of the owning transaction.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine,
    util::{parse_optional_uuid, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Reported,
    UnderReview,
    Adjusted,
    Closed,
}

impl IncidentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reported => "reported",
            Self::UnderReview => "under_review",
            Self::Adjusted => "adjusted",
            Self::Closed => "closed",
        }
    }

    /// Still waiting for adjudication.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Reported | Self::UnderReview)
    }

    pub fn is_resolution(self) -> bool {
        matches!(self, Self::Adjusted | Self::Closed)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use IncidentStatus::*;
        matches!(
            (self, next),
            (Reported, UnderReview) | (Reported | UnderReview, Adjusted | Closed)
        )
    }

    pub(crate) fn transition(self, next: Self) -> ResultEngine<Self> {
        if !self.can_transition_to(next) {
            return Err(EngineError::invalid_state(
                self,
                format!("incident cannot move to {next}"),
            ));
        }
        Ok(next)
    }
}

impl core::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for IncidentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "reported" => Ok(Self::Reported),
            "under_review" => Ok(Self::UnderReview),
            "adjusted" => Ok(Self::Adjusted),
            "closed" => Ok(Self::Closed),
            other => Err(EngineError::corrupt_row(format!(
                "invalid incident status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub id: Uuid,
    pub transaction_id: Option<Uuid>,
    pub container_id: Option<Uuid>,
    pub value_detail_id: Option<Uuid>,
    pub incident_type_id: i32,
    pub incident_type_code: String,
    pub denomination_id: Option<i32>,
    pub quantity: i64,
    pub amount: Money,
    pub description: Option<String>,
    pub reported_by: String,
    pub reported_at: DateTime<Utc>,
    pub status: IncidentStatus,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "incidents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: Option<String>,
    pub container_id: Option<String>,
    pub value_detail_id: Option<String>,
    pub incident_type_id: i32,
    pub incident_type_code: String,
    pub denomination_id: Option<i32>,
    pub quantity: i64,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub reported_by: String,
    pub reported_at: DateTimeUtc,
    pub status: String,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Incident> for ActiveModel {
    fn from(incident: &Incident) -> Self {
        Self {
            id: ActiveValue::Set(incident.id.to_string()),
            transaction_id: ActiveValue::Set(incident.transaction_id.map(|id| id.to_string())),
            container_id: ActiveValue::Set(incident.container_id.map(|id| id.to_string())),
            value_detail_id: ActiveValue::Set(incident.value_detail_id.map(|id| id.to_string())),
            incident_type_id: ActiveValue::Set(incident.incident_type_id),
            incident_type_code: ActiveValue::Set(incident.incident_type_code.clone()),
            denomination_id: ActiveValue::Set(incident.denomination_id),
            quantity: ActiveValue::Set(incident.quantity),
            amount_minor: ActiveValue::Set(incident.amount.minor()),
            description: ActiveValue::Set(incident.description.clone()),
            reported_by: ActiveValue::Set(incident.reported_by.clone()),
            reported_at: ActiveValue::Set(incident.reported_at),
            status: ActiveValue::Set(incident.status.as_str().to_string()),
            resolved_by: ActiveValue::Set(incident.resolved_by.clone()),
            resolved_at: ActiveValue::Set(incident.resolved_at),
        }
    }
}

impl TryFrom<Model> for Incident {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "incident")?,
            transaction_id: parse_optional_uuid(model.transaction_id.as_deref(), "transaction")?,
            container_id: parse_optional_uuid(model.container_id.as_deref(), "container")?,
            value_detail_id: parse_optional_uuid(model.value_detail_id.as_deref(), "value detail")?,
            incident_type_id: model.incident_type_id,
            incident_type_code: model.incident_type_code,
            denomination_id: model.denomination_id,
            quantity: model.quantity,
            amount: Money::new(model.amount_minor),
            description: model.description,
            reported_by: model.reported_by,
            reported_at: model.reported_at,
            status: IncidentStatus::try_from(model.status.as_str())?,
            resolved_by: model.resolved_by,
            resolved_at: model.resolved_at,
        })
    }
}
