use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Container, ContainerEdit, ContainerStatus, EngineError, Money, ResultEngine,
    Transaction, ValueDetail, ValueDetailEdit, ValueTypePolicy,
    calculator::calculate,
    catalog, containers,
    util::{normalize_optional_text, require_non_negative},
    value_details,
};

use super::Engine;

/// A validated container edit, ready to be written.
struct PreparedContainer {
    container: Container,
    is_new: bool,
    lines: Vec<ValueDetail>,
}

impl Engine {
    pub(super) async fn require_container<C: ConnectionTrait>(
        &self,
        db: &C,
        container_id: Uuid,
    ) -> ResultEngine<Container> {
        let model = containers::Entity::find_by_id(container_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("container not exists".to_string()))?;
        Container::try_from(model)
    }

    pub(super) async fn containers_of<C: ConnectionTrait>(
        &self,
        db: &C,
        transaction_id: Uuid,
    ) -> ResultEngine<Vec<Container>> {
        containers::Entity::find()
            .filter(containers::Column::TransactionId.eq(transaction_id.to_string()))
            .order_by_asc(containers::Column::CreatedAt)
            .order_by_asc(containers::Column::Code)
            .all(db)
            .await?
            .into_iter()
            .map(Container::try_from)
            .collect()
    }

    pub(super) async fn lines_of<C: ConnectionTrait>(
        &self,
        db: &C,
        container_id: Uuid,
    ) -> ResultEngine<Vec<ValueDetail>> {
        value_details::Entity::find()
            .filter(value_details::Column::ContainerId.eq(container_id.to_string()))
            .order_by_asc(value_details::Column::ValueType)
            .order_by_asc(value_details::Column::DenominationId)
            .all(db)
            .await?
            .into_iter()
            .map(ValueDetail::try_from)
            .collect()
    }

    pub(super) async fn container_with_lines<C: ConnectionTrait>(
        &self,
        db: &C,
        container_id: Uuid,
    ) -> ResultEngine<Container> {
        let mut container = self.require_container(db, container_id).await?;
        container.details = self.lines_of(db, container_id).await?;
        Ok(container)
    }

    /// Validates every edit, then writes containers and replaces their lines.
    /// Nothing is written when any edit is rejected.
    pub(super) async fn upsert_containers(
        &self,
        db_tx: &DatabaseTransaction,
        transaction: &Transaction,
        edits: Vec<ContainerEdit>,
        actor: &str,
        policy: &ValueTypePolicy,
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<Uuid>> {
        let prepared = self
            .prepare_containers(db_tx, transaction, edits, actor, policy, now)
            .await?;
        let ids: Vec<Uuid> = prepared.iter().map(|p| p.container.id).collect();

        // parents first so envelopes always reference a stored bag
        let (bags, envelopes): (Vec<_>, Vec<_>) = prepared
            .into_iter()
            .partition(|p| p.container.kind.is_bag());
        for item in bags.into_iter().chain(envelopes) {
            self.write_container(db_tx, item).await?;
        }
        for id in &ids {
            self.refresh_container(db_tx, *id, actor, now).await?;
        }
        Ok(ids)
    }

    async fn prepare_containers(
        &self,
        db_tx: &DatabaseTransaction,
        transaction: &Transaction,
        edits: Vec<ContainerEdit>,
        actor: &str,
        policy: &ValueTypePolicy,
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<PreparedContainer>> {
        if edits.is_empty() {
            return Err(EngineError::Invariant(
                "at least one container edit is required".to_string(),
            ));
        }

        let existing: HashMap<Uuid, Container> = self
            .containers_of(db_tx, transaction.id)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let edits: Vec<(Uuid, ContainerEdit)> = edits
            .into_iter()
            .map(|edit| (edit.id.unwrap_or_else(Uuid::new_v4), edit))
            .collect();

        let mut seen = HashSet::with_capacity(edits.len());
        for (id, _) in &edits {
            if !seen.insert(*id) {
                return Err(EngineError::Invariant(format!(
                    "container {id} appears twice in the same request"
                )));
            }
            if !existing.contains_key(id)
                && containers::Entity::find_by_id(id.to_string())
                    .one(db_tx)
                    .await?
                    .is_some()
            {
                return Err(EngineError::Invariant(format!(
                    "container {id} belongs to another transaction"
                )));
            }
        }

        let bag_ids: HashSet<Uuid> = existing
            .values()
            .filter(|c| c.kind.is_bag())
            .map(|c| c.id)
            .chain(
                edits
                    .iter()
                    .filter(|(_, edit)| edit.kind.is_bag())
                    .map(|(id, _)| *id),
            )
            .collect();

        let line_owners = self.line_owners(db_tx, &edits).await?;
        let denominations = catalog::denomination_table(
            db_tx,
            edits
                .iter()
                .flat_map(|(_, edit)| edit.lines.iter())
                .filter_map(|line| line.denomination_id),
        )
        .await?;

        let mut prepared = Vec::with_capacity(edits.len());
        for (id, edit) in edits {
            let current = existing.get(&id);
            if let Some(current) = current {
                if current.kind.is_bag() != edit.kind.is_bag() {
                    return Err(EngineError::Invariant(format!(
                        "container {} cannot change between bag and envelope",
                        current.code
                    )));
                }
                if current.status == ContainerStatus::Verified {
                    return Err(EngineError::invalid_state(
                        current.status,
                        format!("container {} is already verified", current.code),
                    ));
                }
            }
            if let Some(parent_id) = edit.kind.parent_id()
                && !bag_ids.contains(&parent_id)
            {
                return Err(EngineError::Invariant(
                    "envelope parent must be a bag of the same transaction".to_string(),
                ));
            }
            policy.check_container(&edit.kind)?;

            let code = edit.code.trim();
            if code.is_empty() {
                return Err(EngineError::Invariant(
                    "container code must not be empty".to_string(),
                ));
            }
            let declared_value = edit
                .declared_value
                .map(|value| require_non_negative(value, "declared value"))
                .transpose()?;

            let mut lines = Vec::with_capacity(edit.lines.len());
            let mut line_ids = HashSet::with_capacity(edit.lines.len());
            for line in &edit.lines {
                policy.check_line(&edit.kind, line.value_type)?;
                let line_id = line.id.unwrap_or_else(Uuid::new_v4);
                if !line_ids.insert(line_id) {
                    return Err(EngineError::Invariant(format!(
                        "value detail {line_id} appears twice in container {code}"
                    )));
                }
                if line_owners.get(&line_id).is_some_and(|owner| *owner != id) {
                    return Err(EngineError::Invariant(format!(
                        "value detail {line_id} belongs to another container"
                    )));
                }
                self.check_line_references(db_tx, line).await?;
                let calculation = calculate(line, transaction.currency, &denominations)?;
                lines.push(ValueDetail {
                    id: line_id,
                    container_id: id,
                    value_type: line.value_type,
                    denomination_id: line.denomination_id,
                    quality_id: line.quality_id,
                    quantity: line.quantity.map(|quantity| quantity.max(0)),
                    bundles: line.bundles.unwrap_or(0).max(0),
                    loose: line.loose.unwrap_or(0).max(0),
                    unit_value: calculation.unit_value,
                    is_high: calculation.is_high,
                    amount: calculation.amount,
                    bank_entity_id: line.bank_entity_id,
                    account_number: normalize_optional_text(line.account_number.as_deref()),
                    check_number: normalize_optional_text(line.check_number.as_deref()),
                    issued_on: line.issued_on,
                });
            }

            let container = match current {
                Some(current) => Container {
                    kind: edit.kind,
                    code: code.to_string(),
                    declared_value,
                    cashier_id: normalize_optional_text(edit.cashier_id.as_deref()),
                    cashier_name: normalize_optional_text(edit.cashier_name.as_deref()),
                    details: Vec::new(),
                    ..current.clone()
                },
                None => Container {
                    id,
                    transaction_id: transaction.id,
                    kind: edit.kind,
                    code: code.to_string(),
                    declared_value,
                    counted_value: Money::ZERO,
                    status: ContainerStatus::Pending,
                    processed_by: None,
                    processed_at: None,
                    cashier_id: normalize_optional_text(edit.cashier_id.as_deref()),
                    cashier_name: normalize_optional_text(edit.cashier_name.as_deref()),
                    created_by: actor.to_string(),
                    created_at: now,
                    details: Vec::new(),
                },
            };
            prepared.push(PreparedContainer {
                container,
                is_new: current.is_none(),
                lines,
            });
        }
        Ok(prepared)
    }

    /// Current owner of every line id named by the edits.
    async fn line_owners(
        &self,
        db_tx: &DatabaseTransaction,
        edits: &[(Uuid, ContainerEdit)],
    ) -> ResultEngine<HashMap<Uuid, Uuid>> {
        let ids: Vec<String> = edits
            .iter()
            .flat_map(|(_, edit)| edit.lines.iter())
            .filter_map(|line| line.id)
            .map(|id| id.to_string())
            .collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        value_details::Entity::find()
            .filter(value_details::Column::Id.is_in(ids))
            .all(db_tx)
            .await?
            .into_iter()
            .map(|model| -> ResultEngine<(Uuid, Uuid)> {
                let detail = ValueDetail::try_from(model)?;
                Ok((detail.id, detail.container_id))
            })
            .collect()
    }

    async fn check_line_references(
        &self,
        db_tx: &DatabaseTransaction,
        line: &ValueDetailEdit,
    ) -> ResultEngine<()> {
        if let Some(quality_id) = line.quality_id {
            let quality = catalog::quality(db_tx, quality_id).await?;
            if line.value_type.money_kind() != Some(quality.kind) {
                return Err(EngineError::Invariant(format!(
                    "quality {} does not grade {} lines",
                    quality.name, line.value_type
                )));
            }
        }
        if let Some(bank_entity_id) = line.bank_entity_id {
            catalog::bank_entity(db_tx, bank_entity_id).await?;
        }
        Ok(())
    }

    async fn write_container(
        &self,
        db_tx: &DatabaseTransaction,
        prepared: PreparedContainer,
    ) -> ResultEngine<()> {
        let PreparedContainer {
            container,
            is_new,
            lines,
        } = prepared;
        let active = containers::ActiveModel::from(&container);
        if is_new {
            active.insert(db_tx).await?;
        } else {
            active.update(db_tx).await?;
        }

        let stored: HashSet<Uuid> = self
            .lines_of(db_tx, container.id)
            .await?
            .into_iter()
            .map(|line| line.id)
            .collect();
        let keep: HashSet<Uuid> = lines.iter().map(|line| line.id).collect();
        let stale: Vec<String> = stored
            .difference(&keep)
            .map(ToString::to_string)
            .collect();
        if !stale.is_empty() {
            self.detach_line_incidents(db_tx, stale.clone()).await?;
            value_details::Entity::delete_many()
                .filter(value_details::Column::Id.is_in(stale))
                .exec(db_tx)
                .await?;
        }

        for line in &lines {
            let active = value_details::ActiveModel::from(line);
            if stored.contains(&line.id) {
                active.update(db_tx).await?;
            } else {
                active.insert(db_tx).await?;
            }
        }
        Ok(())
    }

    /// Sums the stored lines of a container into its counted value and
    /// advances its status once something has been counted.
    async fn refresh_container(
        &self,
        db_tx: &DatabaseTransaction,
        container_id: Uuid,
        actor: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Container> {
        let mut container = self.require_container(db_tx, container_id).await?;
        let lines = self.lines_of(db_tx, container_id).await?;
        let subtotal: Money = lines.iter().map(|line| line.amount).sum();

        container.counted_value = subtotal;
        if container.status.is_incomplete() && subtotal.is_positive() {
            container.status = container.status.transition(ContainerStatus::Processed)?;
            container.processed_by = Some(actor.to_string());
            container.processed_at = Some(now);
        } else if container.status == ContainerStatus::Pending && !lines.is_empty() {
            container.status = container.status.transition(ContainerStatus::InProcess)?;
        }

        containers::ActiveModel::from(&container)
            .update(db_tx)
            .await?;
        tracing::debug!(
            container = %container.id,
            status = %container.status,
            counted = %container.counted_value,
            "container refreshed"
        );
        container.details = lines;
        Ok(container)
    }

    pub(super) async fn delete_container_in(
        &self,
        db_tx: &DatabaseTransaction,
        transaction: &Transaction,
        container_id: Uuid,
    ) -> ResultEngine<()> {
        let container = self.require_container(db_tx, container_id).await?;
        if container.transaction_id != transaction.id {
            return Err(EngineError::KeyNotFound("container not exists".to_string()));
        }

        let siblings = self.containers_of(db_tx, transaction.id).await?;
        if container.kind.is_bag() {
            let bags = siblings.iter().filter(|c| c.kind.is_bag()).count();
            if bags <= 1 {
                return Err(EngineError::Invariant(
                    "cannot delete the only bag of a transaction".to_string(),
                ));
            }
            if siblings
                .iter()
                .any(|c| c.kind.parent_id() == Some(container.id))
            {
                return Err(EngineError::Invariant(format!(
                    "bag {} still holds envelopes",
                    container.code
                )));
            }
        }

        let line_ids: Vec<String> = self
            .lines_of(db_tx, container_id)
            .await?
            .into_iter()
            .map(|line| line.id.to_string())
            .collect();
        let detached = self
            .detach_container_incidents(db_tx, transaction.id, container_id, line_ids)
            .await?;

        value_details::Entity::delete_many()
            .filter(value_details::Column::ContainerId.eq(container_id.to_string()))
            .exec(db_tx)
            .await?;
        containers::Entity::delete_by_id(container_id.to_string())
            .exec(db_tx)
            .await?;
        tracing::info!(
            transaction = %transaction.id,
            container = %container.id,
            code = %container.code,
            detached_incidents = detached,
            "container deleted"
        );
        Ok(())
    }

    pub(super) async fn verify_container_in(
        &self,
        db_tx: &DatabaseTransaction,
        container_id: Uuid,
    ) -> ResultEngine<Container> {
        let mut container = self.require_container(db_tx, container_id).await?;
        container.status = container.status.transition(ContainerStatus::Verified)?;
        containers::ActiveModel::from(&container)
            .update(db_tx)
            .await?;
        Ok(container)
    }

    /// Moves a container to `WithIncident` unless it already is.
    pub(super) async fn flag_container_incident(
        &self,
        db_tx: &DatabaseTransaction,
        container_id: Uuid,
    ) -> ResultEngine<()> {
        let mut container = self.require_container(db_tx, container_id).await?;
        if container.status == ContainerStatus::WithIncident {
            return Ok(());
        }
        container.status = container.status.transition(ContainerStatus::WithIncident)?;
        containers::ActiveModel::from(&container)
            .update(db_tx)
            .await?;
        Ok(())
    }
}
