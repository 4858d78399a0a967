use chrono::{DateTime, Utc};
use sea_orm::{
    Condition, ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Incident, IncidentInput, IncidentPatch, IncidentStatus, IncidentType, Money,
    ResultEngine, ValueDetail, catalog, containers, incidents,
    util::{normalize_optional_text, require_non_negative},
    value_details,
};

use super::Engine;

/// What an approved-effect sum is computed over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum EffectScope {
    /// Incidents linked to the transaction directly or through its containers.
    Transaction(Uuid),
    /// Incidents linked to the container or one of its lines.
    Container(Uuid),
}

/// Links of an incident after inference.
struct IncidentLinks {
    transaction_id: Uuid,
    container_id: Option<Uuid>,
    value_detail: Option<ValueDetail>,
}

fn check_scope(incident_type: &IncidentType, container_level: bool) -> ResultEngine<()> {
    let fits = if container_level {
        incident_type.scope.allows_container_level()
    } else {
        incident_type.scope.allows_service_level()
    };
    if !fits {
        let level = if container_level {
            "containers or counted lines"
        } else {
            "a whole service"
        };
        return Err(EngineError::Invariant(format!(
            "incident type {} does not apply to {level}",
            incident_type.code
        )));
    }
    Ok(())
}

fn require_reported(incident: &Incident, action: &str) -> ResultEngine<()> {
    if incident.status != IncidentStatus::Reported {
        return Err(EngineError::invalid_state(
            incident.status,
            format!("only reported incidents can be {action}"),
        ));
    }
    Ok(())
}

impl Engine {
    pub(super) async fn require_incident<C: ConnectionTrait>(
        &self,
        db: &C,
        incident_id: Uuid,
    ) -> ResultEngine<Incident> {
        let model = incidents::Entity::find_by_id(incident_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("incident not exists".to_string()))?;
        Incident::try_from(model)
    }

    async fn require_value_detail<C: ConnectionTrait>(
        &self,
        db: &C,
        value_detail_id: Uuid,
    ) -> ResultEngine<ValueDetail> {
        let model = value_details::Entity::find_by_id(value_detail_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("value detail not exists".to_string()))?;
        ValueDetail::try_from(model)
    }

    /// Infers the missing upper links of an incident: a line implies its
    /// container, a container implies its transaction. Explicit links must
    /// agree with the inferred ones.
    async fn resolve_links<C: ConnectionTrait>(
        &self,
        db: &C,
        input: &IncidentInput,
    ) -> ResultEngine<IncidentLinks> {
        let value_detail = match input.value_detail_id {
            Some(id) => Some(self.require_value_detail(db, id).await?),
            None => None,
        };

        let container_id = match (&value_detail, input.container_id) {
            (Some(detail), Some(explicit)) if detail.container_id != explicit => {
                return Err(EngineError::Invariant(
                    "value detail does not belong to the given container".to_string(),
                ));
            }
            (Some(detail), _) => Some(detail.container_id),
            (None, explicit) => explicit,
        };

        let transaction_id = match container_id {
            Some(container_id) => {
                let container = self.require_container(db, container_id).await?;
                if input
                    .transaction_id
                    .is_some_and(|explicit| explicit != container.transaction_id)
                {
                    return Err(EngineError::Invariant(
                        "container does not belong to the given transaction".to_string(),
                    ));
                }
                container.transaction_id
            }
            None => input.transaction_id.ok_or_else(|| {
                EngineError::Invariant(
                    "incident must reference a transaction, container or value detail"
                        .to_string(),
                )
            })?,
        };

        Ok(IncidentLinks {
            transaction_id,
            container_id,
            value_detail,
        })
    }

    /// Transaction an incident input belongs to, resolved before locking.
    pub(super) async fn incident_owner<C: ConnectionTrait>(
        &self,
        db: &C,
        input: &IncidentInput,
    ) -> ResultEngine<Uuid> {
        Ok(self.resolve_links(db, input).await?.transaction_id)
    }

    /// Transaction a stored incident counts against.
    pub(super) async fn incident_transaction<C: ConnectionTrait>(
        &self,
        db: &C,
        incident: &Incident,
    ) -> ResultEngine<Uuid> {
        if let Some(transaction_id) = incident.transaction_id {
            return Ok(transaction_id);
        }
        match incident.container_id {
            Some(container_id) => Ok(self.require_container(db, container_id).await?.transaction_id),
            None => Err(EngineError::Invariant(format!(
                "incident {} has no owning transaction",
                incident.id
            ))),
        }
    }

    async fn affected_amount<C: ConnectionTrait>(
        &self,
        db: &C,
        amount: Option<Money>,
        denomination_id: Option<i32>,
        quantity: i64,
    ) -> ResultEngine<Money> {
        if let Some(amount) = amount {
            return require_non_negative(amount, "incident amount");
        }
        match denomination_id {
            Some(id) => Ok(catalog::denomination(db, id)
                .await?
                .face_value
                .times(quantity.max(0))),
            None => Ok(Money::ZERO),
        }
    }

    pub(super) async fn register_incident_in(
        &self,
        db_tx: &DatabaseTransaction,
        input: IncidentInput,
        actor: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Incident> {
        let links = self.resolve_links(db_tx, &input).await?;
        let transaction = self
            .require_transaction(db_tx, links.transaction_id)
            .await?;
        Self::require_open_for_counting(&transaction)?;

        let incident_type = catalog::incident_type(db_tx, &input.type_code).await?;
        check_scope(&incident_type, links.container_id.is_some())?;

        let denomination_id = input
            .denomination_id
            .or_else(|| links.value_detail.as_ref().and_then(|d| d.denomination_id));
        let quantity = input.quantity.unwrap_or(0).max(0);
        let amount = self
            .affected_amount(db_tx, input.amount, denomination_id, quantity)
            .await?;

        let incident = Incident {
            id: Uuid::new_v4(),
            transaction_id: Some(links.transaction_id),
            container_id: links.container_id,
            value_detail_id: links.value_detail.as_ref().map(|d| d.id),
            incident_type_id: incident_type.id,
            incident_type_code: incident_type.code.clone(),
            denomination_id,
            quantity,
            amount,
            description: normalize_optional_text(input.description.as_deref()),
            reported_by: actor.to_string(),
            reported_at: now,
            status: IncidentStatus::Reported,
            resolved_by: None,
            resolved_at: None,
        };
        incidents::ActiveModel::from(&incident).insert(db_tx).await?;

        if let Some(container_id) = incident.container_id {
            self.flag_container_incident(db_tx, container_id).await?;
        }
        tracing::info!(
            incident = %incident.id,
            transaction = %links.transaction_id,
            code = %incident.incident_type_code,
            amount = %incident.amount,
            "incident registered"
        );
        Ok(incident)
    }

    /// Moves an incident forward in its adjudication workflow.
    pub(super) async fn advance_incident_in(
        &self,
        db_tx: &DatabaseTransaction,
        incident_id: Uuid,
        next: IncidentStatus,
        actor: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Incident> {
        let mut incident = self.require_incident(db_tx, incident_id).await?;
        let transaction_id = self.incident_transaction(db_tx, &incident).await?;
        let transaction = self.require_transaction(db_tx, transaction_id).await?;
        Self::require_open_for_counting(&transaction)?;

        incident.status = incident.status.transition(next)?;
        if next.is_resolution() {
            incident.resolved_by = Some(actor.to_string());
            incident.resolved_at = Some(now);
        }
        incidents::ActiveModel::from(&incident)
            .update(db_tx)
            .await?;
        tracing::info!(
            incident = %incident.id,
            status = %incident.status,
            "incident status changed"
        );
        Ok(incident)
    }

    pub(super) async fn update_incident_in(
        &self,
        db_tx: &DatabaseTransaction,
        incident_id: Uuid,
        patch: IncidentPatch,
    ) -> ResultEngine<Incident> {
        let mut incident = self.require_incident(db_tx, incident_id).await?;
        require_reported(&incident, "edited")?;
        if patch.is_empty() {
            return Ok(incident);
        }

        if let Some(code) = patch.type_code.as_deref() {
            let incident_type = catalog::incident_type(db_tx, code).await?;
            check_scope(&incident_type, incident.container_id.is_some())?;
            incident.incident_type_id = incident_type.id;
            incident.incident_type_code = incident_type.code;
        }

        let recount = patch.denomination_id.is_some() || patch.quantity.is_some();
        if let Some(denomination_id) = patch.denomination_id {
            incident.denomination_id = Some(denomination_id);
        }
        if let Some(quantity) = patch.quantity {
            incident.quantity = quantity.max(0);
        }
        // without a denomination there is nothing to recount from
        if patch.amount.is_some() || (recount && incident.denomination_id.is_some()) {
            incident.amount = self
                .affected_amount(
                    db_tx,
                    patch.amount,
                    incident.denomination_id,
                    incident.quantity,
                )
                .await?;
        }
        if let Some(description) = patch.description.as_deref() {
            incident.description = normalize_optional_text(Some(description));
        }

        incidents::ActiveModel::from(&incident)
            .update(db_tx)
            .await?;
        Ok(incident)
    }

    pub(super) async fn delete_incident_in(
        &self,
        db_tx: &DatabaseTransaction,
        incident_id: Uuid,
    ) -> ResultEngine<Incident> {
        let incident = self.require_incident(db_tx, incident_id).await?;
        require_reported(&incident, "deleted")?;
        incidents::Entity::delete_by_id(incident_id.to_string())
            .exec(db_tx)
            .await?;
        tracing::info!(incident = %incident.id, "incident deleted");
        Ok(incident)
    }

    /// Clears the container and line links of incidents reported on a
    /// container that is being deleted. They keep counting against the
    /// transaction.
    pub(super) async fn detach_container_incidents(
        &self,
        db_tx: &DatabaseTransaction,
        transaction_id: Uuid,
        container_id: Uuid,
        line_ids: Vec<String>,
    ) -> ResultEngine<u64> {
        let mut referenced =
            Condition::any().add(incidents::Column::ContainerId.eq(container_id.to_string()));
        if !line_ids.is_empty() {
            referenced = referenced.add(incidents::Column::ValueDetailId.is_in(line_ids));
        }
        let result = incidents::Entity::update_many()
            .col_expr(
                incidents::Column::TransactionId,
                Expr::value(transaction_id.to_string()),
            )
            .col_expr(incidents::Column::ContainerId, Expr::value(Option::<String>::None))
            .col_expr(incidents::Column::ValueDetailId, Expr::value(Option::<String>::None))
            .filter(referenced)
            .exec(db_tx)
            .await?;
        Ok(result.rows_affected)
    }

    /// Clears the line link of incidents whose value details are dropped by a
    /// line replacement. The container link stays.
    pub(super) async fn detach_line_incidents(
        &self,
        db_tx: &DatabaseTransaction,
        line_ids: Vec<String>,
    ) -> ResultEngine<u64> {
        if line_ids.is_empty() {
            return Ok(0);
        }
        let result = incidents::Entity::update_many()
            .col_expr(incidents::Column::ValueDetailId, Expr::value(Option::<String>::None))
            .filter(incidents::Column::ValueDetailId.is_in(line_ids))
            .exec(db_tx)
            .await?;
        Ok(result.rows_affected)
    }

    async fn scope_condition<C: ConnectionTrait>(
        &self,
        db: &C,
        scope: EffectScope,
    ) -> ResultEngine<Condition> {
        match scope {
            EffectScope::Transaction(transaction_id) => {
                let container_ids: Vec<String> = containers::Entity::find()
                    .filter(containers::Column::TransactionId.eq(transaction_id.to_string()))
                    .all(db)
                    .await?
                    .into_iter()
                    .map(|model| model.id)
                    .collect();
                let mut condition = Condition::any()
                    .add(incidents::Column::TransactionId.eq(transaction_id.to_string()));
                if !container_ids.is_empty() {
                    condition = condition.add(incidents::Column::ContainerId.is_in(container_ids));
                }
                Ok(condition)
            }
            EffectScope::Container(container_id) => {
                let line_ids: Vec<String> = value_details::Entity::find()
                    .filter(value_details::Column::ContainerId.eq(container_id.to_string()))
                    .all(db)
                    .await?
                    .into_iter()
                    .map(|model| model.id)
                    .collect();
                let mut condition = Condition::any()
                    .add(incidents::Column::ContainerId.eq(container_id.to_string()));
                if !line_ids.is_empty() {
                    condition = condition.add(incidents::Column::ValueDetailId.is_in(line_ids));
                }
                Ok(condition)
            }
        }
    }

    pub(super) async fn incidents_in_scope<C: ConnectionTrait>(
        &self,
        db: &C,
        scope: EffectScope,
    ) -> ResultEngine<Vec<Incident>> {
        let condition = self.scope_condition(db, scope).await?;
        incidents::Entity::find()
            .filter(condition)
            .order_by_asc(incidents::Column::ReportedAt)
            .all(db)
            .await?
            .into_iter()
            .map(Incident::try_from)
            .collect()
    }

    /// Σ sign(category) × amount over the adjusted incidents in scope.
    pub(super) async fn sum_approved_effect<C: ConnectionTrait>(
        &self,
        db: &C,
        scope: EffectScope,
    ) -> ResultEngine<Money> {
        let condition = self.scope_condition(db, scope).await?;
        let adjusted = incidents::Entity::find()
            .filter(condition)
            .filter(incidents::Column::Status.eq(IncidentStatus::Adjusted.as_str()))
            .all(db)
            .await?;

        let mut effect = Money::ZERO;
        for model in adjusted {
            let incident = Incident::try_from(model)?;
            let incident_type = catalog::incident_type_by_id(db, incident.incident_type_id).await?;
            let amount = if incident.amount.is_zero() {
                self.affected_amount(db, None, incident.denomination_id, incident.quantity)
                    .await?
            } else {
                incident.amount
            };
            effect += amount.times(incident_type.category.sign());
        }
        Ok(effect)
    }

    pub(super) async fn any_pending_incident<C: ConnectionTrait>(
        &self,
        db: &C,
        transaction_id: Uuid,
    ) -> ResultEngine<bool> {
        let condition = self
            .scope_condition(db, EffectScope::Transaction(transaction_id))
            .await?;
        let pending = incidents::Entity::find()
            .filter(condition)
            .filter(incidents::Column::Status.is_in([
                IncidentStatus::Reported.as_str(),
                IncidentStatus::UnderReview.as_str(),
            ]))
            .count(db)
            .await?;
        Ok(pending > 0)
    }
}
