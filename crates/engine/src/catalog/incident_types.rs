//! Incident type definitions.
//!
//! Each type carries a category whose sign is applied when an adjudicated
//! incident is folded into the reconciled totals, and an applicability scope
//! telling whether it describes the whole service or a specific container or
//! counted line.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentCategory {
    Surplus,
    Shortage,
    Informational,
}

impl IncidentCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Surplus => "surplus",
            Self::Shortage => "shortage",
            Self::Informational => "informational",
        }
    }

    /// `+1` surplus, `-1` shortage, `0` informational.
    pub const fn sign(self) -> i64 {
        match self {
            Self::Surplus => 1,
            Self::Shortage => -1,
            Self::Informational => 0,
        }
    }
}

impl TryFrom<&str> for IncidentCategory {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "surplus" => Ok(Self::Surplus),
            "shortage" => Ok(Self::Shortage),
            "informational" => Ok(Self::Informational),
            other => Err(EngineError::Unconfigured(format!(
                "invalid incident category: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentScope {
    /// Applies to the service (transaction) as a whole.
    Service,
    /// Applies to a container or counted line.
    Incident,
    Both,
}

impl IncidentScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Incident => "incident",
            Self::Both => "both",
        }
    }

    pub fn allows_service_level(self) -> bool {
        matches!(self, Self::Service | Self::Both)
    }

    pub fn allows_container_level(self) -> bool {
        matches!(self, Self::Incident | Self::Both)
    }
}

impl TryFrom<&str> for IncidentScope {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "service" => Ok(Self::Service),
            "incident" => Ok(Self::Incident),
            "both" => Ok(Self::Both),
            other => Err(EngineError::Unconfigured(format!(
                "invalid incident scope: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentType {
    pub id: i32,
    pub code: String,
    pub description: String,
    pub scope: IncidentScope,
    pub category: IncidentCategory,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "incident_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    #[sea_orm(unique)]
    pub code: String,
    pub description: String,
    pub applies_to: String,
    pub category: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for IncidentType {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            code: model.code,
            description: model.description,
            scope: IncidentScope::try_from(model.applies_to.as_str())?,
            category: IncidentCategory::try_from(model.category.as_str())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_signs() {
        assert_eq!(IncidentCategory::Surplus.sign(), 1);
        assert_eq!(IncidentCategory::Shortage.sign(), -1);
        assert_eq!(IncidentCategory::Informational.sign(), 0);
    }

    #[test]
    fn scope_levels() {
        assert!(IncidentScope::Service.allows_service_level());
        assert!(!IncidentScope::Service.allows_container_level());
        assert!(IncidentScope::Incident.allows_container_level());
        assert!(IncidentScope::Both.allows_service_level());
        assert!(IncidentScope::Both.allows_container_level());
    }
}
