//! Transaction lifecycle and totals.
//!
//! This is the only place that writes the aggregate fields of a transaction.
//! Totals are always rebuilt from the value-detail rows stored inside the
//! current database transaction, so recomputing twice yields the same result.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, JoinType, QueryFilter, QuerySelect,
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Container, ContainerStatus, CountedValues, Currency, DeclaredShipment, DeclaredValues,
    EngineError, Money, ResultEngine, ReviewDisposition, Transaction, TransactionKind,
    TransactionStatus, ValueDetail, ValueType, catalog, containers, transactions,
    util::{normalize_optional_text, require_non_negative, require_non_negative_count},
    value_details,
    words::amount_in_words,
};

use super::{Engine, incidents::EffectScope};

/// Whether a container still holds back finalization. A bag used only to
/// carry envelopes never gets lines of its own and stays `Pending`; it is
/// complete once every envelope inside it is.
fn holds_back_finalize(container: &Container, all: &[Container]) -> bool {
    if !container.status.is_incomplete() {
        return false;
    }
    if container.kind.is_bag() && container.status == ContainerStatus::Pending {
        let mut envelopes = all
            .iter()
            .filter(|c| c.kind.parent_id() == Some(container.id))
            .peekable();
        if envelopes.peek().is_some() {
            return envelopes.any(|envelope| envelope.status.is_incomplete());
        }
    }
    true
}

/// Reconciled figures of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub transaction_id: Uuid,
    pub currency: Currency,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub declared: DeclaredValues,
    /// Declared amount the counted cash is compared against.
    pub declared_cash: Money,
    pub counted: CountedValues,
    pub approved_effect: Money,
    /// `cash subtotal - declared cash + approved effect`.
    pub difference: Money,
    pub declared_words: String,
    pub counted_words: String,
    pub overall_words: String,
}

impl Totals {
    fn new(transaction: &Transaction, approved_effect: Money) -> Self {
        Self {
            transaction_id: transaction.id,
            currency: transaction.currency,
            kind: transaction.kind,
            status: transaction.status,
            declared: transaction.declared.clone(),
            declared_cash: transaction.declared.cash(transaction.kind),
            counted: transaction.counted.clone(),
            approved_effect,
            difference: transaction.value_difference,
            declared_words: transaction.declared_words.clone(),
            counted_words: transaction.counted_words.clone(),
            overall_words: transaction.overall_words.clone(),
        }
    }
}

/// Folds counted lines into the per-type aggregates.
fn fold_counted<'a>(lines: impl IntoIterator<Item = &'a ValueDetail>) -> CountedValues {
    let mut counted = CountedValues::default();
    for line in lines {
        match line.value_type {
            ValueType::Bill if line.is_high => counted.bill_high += line.amount,
            ValueType::Bill => counted.bill_low += line.amount,
            ValueType::Coin => counted.coin += line.amount,
            ValueType::Check => counted.check += line.amount,
            ValueType::Document => counted.document += line.amount,
        }
    }
    counted.cash_subtotal = counted.bill() + counted.coin;
    counted.overall = counted.cash_subtotal + counted.check + counted.document;
    counted
}

impl Engine {
    pub(super) async fn find_by_idempotency_key<C: ConnectionTrait>(
        &self,
        db: &C,
        key: &str,
    ) -> ResultEngine<Option<Transaction>> {
        transactions::Entity::find()
            .filter(transactions::Column::IdempotencyKey.eq(key.to_string()))
            .one(db)
            .await?
            .map(Transaction::try_from)
            .transpose()
    }

    pub(super) async fn checkin_in(
        &self,
        db_tx: &DatabaseTransaction,
        shipment: DeclaredShipment,
        actor: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        let idempotency_key = normalize_optional_text(shipment.idempotency_key.as_deref());
        if let Some(key) = idempotency_key.as_deref()
            && let Some(existing) = self.find_by_idempotency_key(db_tx, key).await?
        {
            if existing.service_order_id != shipment.service_order_id.trim() {
                return Err(EngineError::Invariant(
                    "idempotency key already used for another service order".to_string(),
                ));
            }
            return Ok(existing.id);
        }

        let order = catalog::service_order(db_tx, shipment.service_order_id.trim()).await?;
        let bill = require_non_negative(shipment.bill, "declared bill value")?;
        let coin = require_non_negative(shipment.coin, "declared coin value")?;
        let document = require_non_negative(shipment.document, "declared document value")?;
        let total = match shipment.total {
            Some(total) => require_non_negative(total, "declared total")?,
            None => bill + coin + document,
        };
        let declared = DeclaredValues {
            bags: require_non_negative_count(shipment.bags, "declared bags")?,
            envelopes: require_non_negative_count(shipment.envelopes, "declared envelopes")?,
            checks: require_non_negative_count(shipment.checks, "declared checks")?,
            documents: require_non_negative_count(shipment.documents, "declared documents")?,
            bill,
            coin,
            document,
            total,
        };

        let transaction = Transaction {
            id: Uuid::new_v4(),
            service_order_id: order.id,
            route_id: normalize_optional_text(shipment.route_id.as_deref()),
            branch_id: normalize_optional_text(shipment.branch_id.as_deref()),
            currency: shipment.currency,
            kind: order.kind,
            declared,
            counted: CountedValues::default(),
            value_difference: Money::ZERO,
            declared_words: String::new(),
            counted_words: String::new(),
            overall_words: String::new(),
            note: normalize_optional_text(shipment.note.as_deref()),
            custody: shipment.custody,
            point_to_point: shipment.point_to_point,
            status: TransactionStatus::Checkin,
            registered_by: actor.to_string(),
            registered_at: now,
            registered_ip: normalize_optional_text(shipment.registered_ip.as_deref()),
            idempotency_key,
            reviewed_by: None,
            reviewed_at: None,
            disposition: None,
            cancelled_by: None,
            cancelled_at: None,
        };
        transactions::ActiveModel::from(&transaction)
            .insert(db_tx)
            .await?;
        self.recompute_totals_in(db_tx, transaction.id).await?;
        tracing::info!(
            transaction = %transaction.id,
            service_order = %transaction.service_order_id,
            kind = transaction.kind.as_str(),
            "transaction checked in"
        );
        Ok(transaction.id)
    }

    /// Rebuilds counted values, difference and amount-in-words renderings
    /// from the stored lines and adjusted incidents.
    pub(super) async fn recompute_totals_in(
        &self,
        db_tx: &DatabaseTransaction,
        transaction_id: Uuid,
    ) -> ResultEngine<Totals> {
        let mut transaction = self.require_transaction(db_tx, transaction_id).await?;

        let lines: Vec<ValueDetail> = value_details::Entity::find()
            .join(JoinType::InnerJoin, value_details::Relation::Containers.def())
            .filter(containers::Column::TransactionId.eq(transaction_id.to_string()))
            .all(db_tx)
            .await?
            .into_iter()
            .map(ValueDetail::try_from)
            .collect::<ResultEngine<_>>()?;
        let counted = fold_counted(&lines);
        let approved_effect = self
            .sum_approved_effect(db_tx, EffectScope::Transaction(transaction_id))
            .await?;
        let declared_cash = transaction.declared.cash(transaction.kind);

        transaction.value_difference = counted.cash_subtotal - declared_cash + approved_effect;
        transaction.declared_words = amount_in_words(declared_cash, transaction.currency);
        transaction.counted_words = amount_in_words(counted.cash_subtotal, transaction.currency);
        transaction.overall_words = amount_in_words(counted.overall, transaction.currency);
        transaction.counted = counted;

        let active = transactions::ActiveModel {
            id: ActiveValue::Set(transaction.id.to_string()),
            counted_bill_high_minor: ActiveValue::Set(transaction.counted.bill_high.minor()),
            counted_bill_low_minor: ActiveValue::Set(transaction.counted.bill_low.minor()),
            counted_coin_minor: ActiveValue::Set(transaction.counted.coin.minor()),
            counted_check_minor: ActiveValue::Set(transaction.counted.check.minor()),
            counted_document_minor: ActiveValue::Set(transaction.counted.document.minor()),
            cash_subtotal_minor: ActiveValue::Set(transaction.counted.cash_subtotal.minor()),
            overall_minor: ActiveValue::Set(transaction.counted.overall.minor()),
            value_difference_minor: ActiveValue::Set(transaction.value_difference.minor()),
            declared_words: ActiveValue::Set(transaction.declared_words.clone()),
            counted_words: ActiveValue::Set(transaction.counted_words.clone()),
            overall_words: ActiveValue::Set(transaction.overall_words.clone()),
            ..Default::default()
        };
        active.update(db_tx).await?;

        tracing::debug!(
            transaction = %transaction.id,
            cash_subtotal = %transaction.counted.cash_subtotal,
            approved_effect = %approved_effect,
            difference = %transaction.value_difference,
            "totals recomputed"
        );
        Ok(Totals::new(&transaction, approved_effect))
    }

    pub(super) async fn totals_of<C: ConnectionTrait>(
        &self,
        db: &C,
        transaction_id: Uuid,
    ) -> ResultEngine<Totals> {
        let transaction = self.require_transaction(db, transaction_id).await?;
        let approved_effect = self
            .sum_approved_effect(db, EffectScope::Transaction(transaction_id))
            .await?;
        Ok(Totals::new(&transaction, approved_effect))
    }

    /// Counting started: `Checkin` becomes `InProcess`.
    pub(super) async fn begin_counting(
        &self,
        db_tx: &DatabaseTransaction,
        transaction: &mut Transaction,
    ) -> ResultEngine<()> {
        Self::require_open_for_counting(transaction)?;
        if transaction.status == TransactionStatus::Checkin {
            self.set_status(db_tx, transaction, TransactionStatus::InProcess)
                .await?;
        }
        Ok(())
    }

    async fn set_status(
        &self,
        db_tx: &DatabaseTransaction,
        transaction: &mut Transaction,
        next: TransactionStatus,
    ) -> ResultEngine<()> {
        let previous = transaction.status;
        transaction.status = previous.transition(next)?;
        transactions::ActiveModel {
            id: ActiveValue::Set(transaction.id.to_string()),
            status: ActiveValue::Set(transaction.status.as_str().to_string()),
            ..Default::default()
        }
        .update(db_tx)
        .await?;
        tracing::info!(
            transaction = %transaction.id,
            from = %previous,
            to = %transaction.status,
            "transaction status changed"
        );
        Ok(())
    }

    pub(super) async fn finalize_in(
        &self,
        db_tx: &DatabaseTransaction,
        transaction_id: Uuid,
    ) -> ResultEngine<Totals> {
        let mut transaction = self.require_transaction(db_tx, transaction_id).await?;
        if !transaction
            .status
            .can_transition_to(TransactionStatus::PendingReview)
        {
            return Err(EngineError::invalid_state(
                transaction.status,
                "transaction cannot be finalized",
            ));
        }

        let containers = self.containers_of(db_tx, transaction_id).await?;
        if containers.is_empty() {
            return Err(EngineError::Incomplete(
                "transaction has no containers".to_string(),
            ));
        }
        let open = containers
            .iter()
            .filter(|c| holds_back_finalize(c, &containers))
            .count();
        if open > 0 {
            return Err(EngineError::Incomplete(format!(
                "{open} container(s) still pending or in process"
            )));
        }
        if self.any_pending_incident(db_tx, transaction_id).await? {
            return Err(EngineError::Incomplete(
                "transaction has incidents awaiting adjudication".to_string(),
            ));
        }

        let totals = self.recompute_totals_in(db_tx, transaction_id).await?;
        self.set_status(db_tx, &mut transaction, TransactionStatus::PendingReview)
            .await?;
        Ok(Totals {
            status: transaction.status,
            ..totals
        })
    }

    pub(super) async fn review_in(
        &self,
        db_tx: &DatabaseTransaction,
        transaction_id: Uuid,
        disposition: ReviewDisposition,
        reviewer: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        let mut transaction = self.require_transaction(db_tx, transaction_id).await?;
        if transaction.status != TransactionStatus::PendingReview {
            return Err(EngineError::invalid_state(
                transaction.status,
                "only transactions pending review can be reviewed",
            ));
        }
        self.set_status(db_tx, &mut transaction, disposition.status())
            .await?;
        transaction.reviewed_by = Some(reviewer.to_string());
        transaction.reviewed_at = Some(now);
        transaction.disposition = Some(disposition);
        transactions::ActiveModel {
            id: ActiveValue::Set(transaction.id.to_string()),
            reviewed_by: ActiveValue::Set(transaction.reviewed_by.clone()),
            reviewed_at: ActiveValue::Set(transaction.reviewed_at),
            disposition: ActiveValue::Set(Some(disposition.as_str().to_string())),
            ..Default::default()
        }
        .update(db_tx)
        .await?;
        Ok(transaction)
    }

    pub(super) async fn cancel_in(
        &self,
        db_tx: &DatabaseTransaction,
        transaction_id: Uuid,
        actor: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        let mut transaction = self.require_transaction(db_tx, transaction_id).await?;
        self.set_status(db_tx, &mut transaction, TransactionStatus::Cancelled)
            .await?;
        transaction.cancelled_by = Some(actor.to_string());
        transaction.cancelled_at = Some(now);
        transactions::ActiveModel {
            id: ActiveValue::Set(transaction.id.to_string()),
            cancelled_by: ActiveValue::Set(transaction.cancelled_by.clone()),
            cancelled_at: ActiveValue::Set(transaction.cancelled_at),
            ..Default::default()
        }
        .update(db_tx)
        .await?;
        Ok(transaction)
    }
}
