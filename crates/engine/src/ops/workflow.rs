//! Public entry points.
//!
//! Each mutation is one unit of work: it takes the per-transaction lock, opens
//! a database transaction, applies its change, recomputes the totals from the
//! stored rows and commits. Any error rolls everything back.

use chrono::Utc;
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{
    Container, ContainerEdit, DeclaredShipment, EngineError, Incident, IncidentInput,
    IncidentPatch, IncidentStatus, Money, PointCapabilities, ResultEngine, ReviewDisposition,
    Transaction, ValueTypePolicy, catalog,
};

use super::{EffectScope, Engine, Totals, require_actor, with_tx};

impl Engine {
    /// Registers a declared shipment against a service order and returns the
    /// new transaction id.
    ///
    /// Replaying a checkin with the same idempotency key returns the
    /// transaction created the first time.
    pub async fn checkin(&self, shipment: DeclaredShipment, actor: &str) -> ResultEngine<Uuid> {
        let actor = require_actor(actor)?;
        with_tx!(self, |db_tx| {
            self.checkin_in(&db_tx, shipment, &actor, Utc::now()).await
        })
    }

    /// Creates or updates containers of a transaction and replaces their
    /// counted lines, then recomputes the totals.
    ///
    /// The allowed value types come from the transaction kind narrowed by the
    /// client point of its service order. Every edit is validated before the
    /// first write; a rejected edit leaves the transaction untouched.
    pub async fn save_containers(
        &self,
        transaction_id: Uuid,
        edits: Vec<ContainerEdit>,
        actor: &str,
    ) -> ResultEngine<Vec<Uuid>> {
        let actor = require_actor(actor)?;
        let _guard = self.locks.acquire(transaction_id).await;
        with_tx!(self, |db_tx| {
            let mut transaction = self.require_transaction(&db_tx, transaction_id).await?;
            self.begin_counting(&db_tx, &mut transaction).await?;
            let point = catalog::point_capabilities(&db_tx, &transaction.service_order_id).await?;
            let policy = ValueTypePolicy::for_kind(transaction.kind, point);
            let ids = self
                .upsert_containers(&db_tx, &transaction, edits, &actor, &policy, Utc::now())
                .await?;
            self.recompute_totals_in(&db_tx, transaction_id).await?;
            Ok(ids)
        })
    }

    /// Deletes a leaf container and its lines.
    ///
    /// Fails when it is the only bag, still holds envelopes, or has
    /// incidents.
    pub async fn delete_container(
        &self,
        transaction_id: Uuid,
        container_id: Uuid,
        actor: &str,
    ) -> ResultEngine<Totals> {
        let actor = require_actor(actor)?;
        let _guard = self.locks.acquire(transaction_id).await;
        with_tx!(self, |db_tx| {
            let mut transaction = self.require_transaction(&db_tx, transaction_id).await?;
            self.begin_counting(&db_tx, &mut transaction).await?;
            self.delete_container_in(&db_tx, &transaction, container_id)
                .await?;
            tracing::debug!(actor = %actor, container = %container_id, "delete requested");
            self.recompute_totals_in(&db_tx, transaction_id).await
        })
    }

    /// Marks a processed container as verified.
    pub async fn verify_container(&self, container_id: Uuid, actor: &str) -> ResultEngine<Container> {
        let actor = require_actor(actor)?;
        let transaction_id = self
            .require_container(&self.database, container_id)
            .await?
            .transaction_id;
        let _guard = self.locks.acquire(transaction_id).await;
        with_tx!(self, |db_tx| {
            let transaction = self.require_transaction(&db_tx, transaction_id).await?;
            Self::require_open_for_counting(&transaction)?;
            let container = self.verify_container_in(&db_tx, container_id).await?;
            tracing::info!(container = %container.id, actor = %actor, "container verified");
            Ok(container)
        })
    }

    /// Records an incident and returns its id.
    pub async fn register_incident(
        &self,
        input: IncidentInput,
        actor: &str,
    ) -> ResultEngine<Uuid> {
        let actor = require_actor(actor)?;
        let transaction_id = self.incident_owner(&self.database, &input).await?;
        let _guard = self.locks.acquire(transaction_id).await;
        with_tx!(self, |db_tx| {
            let incident = self
                .register_incident_in(&db_tx, input, &actor, Utc::now())
                .await?;
            self.recompute_totals_in(&db_tx, transaction_id).await?;
            Ok(incident.id)
        })
    }

    /// `Reported` → `UnderReview`.
    pub async fn start_incident_review(
        &self,
        incident_id: Uuid,
        actor: &str,
    ) -> ResultEngine<Incident> {
        self.advance_incident(incident_id, IncidentStatus::UnderReview, actor)
            .await
    }

    /// Adjudicates an incident as `Adjusted` or `Closed` and recomputes the
    /// owning transaction.
    pub async fn resolve_incident(
        &self,
        incident_id: Uuid,
        status: IncidentStatus,
        actor: &str,
    ) -> ResultEngine<Incident> {
        if !status.is_resolution() {
            return Err(EngineError::Invariant(format!(
                "incidents resolve to adjusted or closed, not {status}"
            )));
        }
        self.advance_incident(incident_id, status, actor).await
    }

    async fn advance_incident(
        &self,
        incident_id: Uuid,
        next: IncidentStatus,
        actor: &str,
    ) -> ResultEngine<Incident> {
        let actor = require_actor(actor)?;
        let transaction_id = self.locked_incident_owner(incident_id).await?;
        let _guard = self.locks.acquire(transaction_id).await;
        with_tx!(self, |db_tx| {
            let incident = self
                .advance_incident_in(&db_tx, incident_id, next, &actor, Utc::now())
                .await?;
            self.recompute_totals_in(&db_tx, transaction_id).await?;
            Ok(incident)
        })
    }

    /// Edits an incident that has not entered adjudication yet.
    pub async fn update_incident(
        &self,
        incident_id: Uuid,
        patch: IncidentPatch,
        actor: &str,
    ) -> ResultEngine<Incident> {
        let actor = require_actor(actor)?;
        let transaction_id = self.locked_incident_owner(incident_id).await?;
        let _guard = self.locks.acquire(transaction_id).await;
        with_tx!(self, |db_tx| {
            let transaction = self.require_transaction(&db_tx, transaction_id).await?;
            Self::require_open_for_counting(&transaction)?;
            let incident = self.update_incident_in(&db_tx, incident_id, patch).await?;
            tracing::info!(incident = %incident.id, actor = %actor, "incident updated");
            self.recompute_totals_in(&db_tx, transaction_id).await?;
            Ok(incident)
        })
    }

    /// Removes an incident that has not entered adjudication yet.
    pub async fn delete_incident(&self, incident_id: Uuid, actor: &str) -> ResultEngine<()> {
        let actor = require_actor(actor)?;
        let transaction_id = self.locked_incident_owner(incident_id).await?;
        let _guard = self.locks.acquire(transaction_id).await;
        with_tx!(self, |db_tx| {
            let transaction = self.require_transaction(&db_tx, transaction_id).await?;
            Self::require_open_for_counting(&transaction)?;
            self.delete_incident_in(&db_tx, incident_id).await?;
            tracing::debug!(actor = %actor, incident = %incident_id, "delete requested");
            self.recompute_totals_in(&db_tx, transaction_id).await?;
            Ok(())
        })
    }

    async fn locked_incident_owner(&self, incident_id: Uuid) -> ResultEngine<Uuid> {
        let incident = self.require_incident(&self.database, incident_id).await?;
        self.incident_transaction(&self.database, &incident).await
    }

    /// Closes counting: `Checkin`/`InProcess` → `PendingReview`.
    ///
    /// Requires at least one container, none of them pending or in process,
    /// and no incident awaiting adjudication. Otherwise fails with
    /// [`EngineError::Incomplete`] and nothing changes.
    pub async fn finalize(&self, transaction_id: Uuid, actor: &str) -> ResultEngine<Totals> {
        let actor = require_actor(actor)?;
        let _guard = self.locks.acquire(transaction_id).await;
        with_tx!(self, |db_tx| {
            let totals = self.finalize_in(&db_tx, transaction_id).await?;
            tracing::info!(transaction = %transaction_id, actor = %actor, "transaction finalized");
            Ok(totals)
        })
    }

    /// Approves or rejects a transaction pending review.
    pub async fn review(
        &self,
        transaction_id: Uuid,
        disposition: ReviewDisposition,
        reviewer: &str,
    ) -> ResultEngine<Transaction> {
        let reviewer = require_actor(reviewer)?;
        let _guard = self.locks.acquire(transaction_id).await;
        with_tx!(self, |db_tx| {
            self.review_in(&db_tx, transaction_id, disposition, &reviewer, Utc::now())
                .await
        })
    }

    /// Cancels a transaction that has not been reviewed yet.
    pub async fn cancel(&self, transaction_id: Uuid, actor: &str) -> ResultEngine<Transaction> {
        let actor = require_actor(actor)?;
        let _guard = self.locks.acquire(transaction_id).await;
        with_tx!(self, |db_tx| {
            self.cancel_in(&db_tx, transaction_id, &actor, Utc::now())
                .await
        })
    }

    /// Rebuilds the totals of a transaction from its stored lines. Running it
    /// again without changes yields the same figures.
    pub async fn recompute_totals(&self, transaction_id: Uuid) -> ResultEngine<Totals> {
        let _guard = self.locks.acquire(transaction_id).await;
        with_tx!(self, |db_tx| {
            self.recompute_totals_in(&db_tx, transaction_id).await
        })
    }

    pub async fn totals(&self, transaction_id: Uuid) -> ResultEngine<Totals> {
        self.totals_of(&self.database, transaction_id).await
    }

    pub async fn transaction(&self, transaction_id: Uuid) -> ResultEngine<Transaction> {
        self.require_transaction(&self.database, transaction_id)
            .await
    }

    /// Containers of a transaction, without their lines.
    pub async fn containers(&self, transaction_id: Uuid) -> ResultEngine<Vec<Container>> {
        self.require_transaction(&self.database, transaction_id)
            .await?;
        self.containers_of(&self.database, transaction_id).await
    }

    /// A container with its counted lines.
    pub async fn container_with_detail(&self, container_id: Uuid) -> ResultEngine<Container> {
        self.container_with_lines(&self.database, container_id)
            .await
    }

    /// Incidents linked to a transaction directly or through its containers.
    pub async fn incidents(&self, transaction_id: Uuid) -> ResultEngine<Vec<Incident>> {
        self.require_transaction(&self.database, transaction_id)
            .await?;
        self.incidents_in_scope(&self.database, EffectScope::Transaction(transaction_id))
            .await
    }

    /// Signed effect of the adjusted incidents in scope.
    pub async fn approved_effect(&self, scope: EffectScope) -> ResultEngine<Money> {
        self.sum_approved_effect(&self.database, scope).await
    }

    /// Whether any incident of the transaction still awaits adjudication.
    pub async fn has_pending_incidents(&self, transaction_id: Uuid) -> ResultEngine<bool> {
        self.any_pending_incident(&self.database, transaction_id)
            .await
    }

    pub async fn point_capabilities(&self, service_order_id: &str) -> ResultEngine<PointCapabilities> {
        catalog::point_capabilities(&self.database, service_order_id.trim()).await
    }
}
