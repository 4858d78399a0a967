//! Cash-processing transactions.
//!
//! A `Transaction` is one processing episode: a declared shipment checked in
//! against a service order, counted container by container, reconciled and
//! finally reviewed. Its aggregate counted fields are derived and only ever
//! written by the reconciliation engine.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, Money, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Cash picked up at a client point and brought to the center.
    Collection,
    /// Cash prepared at the center and delivered to a client point.
    Provision,
    /// Recount of cash already in custody.
    Audit,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Provision => "provision",
            Self::Audit => "audit",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "collection" => Ok(Self::Collection),
            "provision" => Ok(Self::Provision),
            "audit" => Ok(Self::Audit),
            other => Err(EngineError::corrupt_row(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Checkin,
    InProcess,
    PendingReview,
    Approved,
    Rejected,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checkin => "checkin",
            Self::InProcess => "in_process",
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Cancelled)
    }

    /// Containers and incidents may only change while counting is open.
    pub fn is_open_for_counting(self) -> bool {
        matches!(self, Self::Checkin | Self::InProcess)
    }

    /// Transition table of the transaction lifecycle.
    pub fn can_transition_to(self, next: Self) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, next),
            (Checkin, InProcess)
                | (Checkin, PendingReview)
                | (InProcess, PendingReview)
                | (PendingReview, Approved)
                | (PendingReview, Rejected)
                | (Checkin | InProcess | PendingReview, Cancelled)
        )
    }

    pub(crate) fn transition(self, next: Self) -> ResultEngine<Self> {
        if !self.can_transition_to(next) {
            return Err(EngineError::invalid_state(
                self,
                format!("transaction cannot move to {next}"),
            ));
        }
        Ok(next)
    }
}

impl core::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "checkin" => Ok(Self::Checkin),
            "in_process" => Ok(Self::InProcess),
            "pending_review" => Ok(Self::PendingReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::corrupt_row(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

/// Outcome chosen by the reviewer of a `PendingReview` transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDisposition {
    Approved,
    Rejected,
}

impl ReviewDisposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn status(self) -> TransactionStatus {
        match self {
            Self::Approved => TransactionStatus::Approved,
            Self::Rejected => TransactionStatus::Rejected,
        }
    }
}

impl TryFrom<&str> for ReviewDisposition {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(EngineError::corrupt_row(format!(
                "invalid review disposition: {other}"
            ))),
        }
    }
}

/// Values stated at checkin, before any physical counting.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredValues {
    pub bags: i32,
    pub envelopes: i32,
    pub checks: i32,
    pub documents: i32,
    pub bill: Money,
    pub coin: Money,
    pub document: Money,
    pub total: Money,
}

impl DeclaredValues {
    /// Declared cash the counted cash is compared against: collections declare
    /// a single total, provisions and audits declare bills and coins apart.
    pub fn cash(&self, kind: TransactionKind) -> Money {
        match kind {
            TransactionKind::Collection => self.total,
            TransactionKind::Provision | TransactionKind::Audit => self.bill + self.coin,
        }
    }
}

/// Derived values, recomputed from the persisted value-detail lines.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountedValues {
    pub bill_high: Money,
    pub bill_low: Money,
    pub coin: Money,
    pub check: Money,
    pub document: Money,
    pub cash_subtotal: Money,
    pub overall: Money,
}

impl CountedValues {
    pub fn bill(&self) -> Money {
        self.bill_high + self.bill_low
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub service_order_id: String,
    pub route_id: Option<String>,
    pub branch_id: Option<String>,
    pub currency: Currency,
    pub kind: TransactionKind,
    pub declared: DeclaredValues,
    pub counted: CountedValues,
    pub value_difference: Money,
    pub declared_words: String,
    pub counted_words: String,
    pub overall_words: String,
    pub note: Option<String>,
    pub custody: bool,
    pub point_to_point: bool,
    pub status: TransactionStatus,
    pub registered_by: String,
    pub registered_at: DateTime<Utc>,
    pub registered_ip: Option<String>,
    pub idempotency_key: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub disposition: Option<ReviewDisposition>,
    pub cancelled_by: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub service_order_id: String,
    pub route_id: Option<String>,
    pub branch_id: Option<String>,
    pub currency: String,
    pub kind: String,
    pub declared_bags: i32,
    pub declared_envelopes: i32,
    pub declared_checks: i32,
    pub declared_documents: i32,
    pub declared_bill_minor: i64,
    pub declared_coin_minor: i64,
    pub declared_document_minor: i64,
    pub declared_total_minor: i64,
    pub counted_bill_high_minor: i64,
    pub counted_bill_low_minor: i64,
    pub counted_coin_minor: i64,
    pub counted_check_minor: i64,
    pub counted_document_minor: i64,
    pub cash_subtotal_minor: i64,
    pub overall_minor: i64,
    pub value_difference_minor: i64,
    pub declared_words: String,
    pub counted_words: String,
    pub overall_words: String,
    pub note: Option<String>,
    pub custody: bool,
    pub point_to_point: bool,
    pub status: String,
    pub registered_by: String,
    pub registered_at: DateTimeUtc,
    pub registered_ip: Option<String>,
    pub idempotency_key: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTimeUtc>,
    pub disposition: Option<String>,
    pub cancelled_by: Option<String>,
    pub cancelled_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::containers::Entity")]
    Containers,
}

impl Related<super::containers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Containers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            service_order_id: ActiveValue::Set(tx.service_order_id.clone()),
            route_id: ActiveValue::Set(tx.route_id.clone()),
            branch_id: ActiveValue::Set(tx.branch_id.clone()),
            currency: ActiveValue::Set(tx.currency.code().to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            declared_bags: ActiveValue::Set(tx.declared.bags),
            declared_envelopes: ActiveValue::Set(tx.declared.envelopes),
            declared_checks: ActiveValue::Set(tx.declared.checks),
            declared_documents: ActiveValue::Set(tx.declared.documents),
            declared_bill_minor: ActiveValue::Set(tx.declared.bill.minor()),
            declared_coin_minor: ActiveValue::Set(tx.declared.coin.minor()),
            declared_document_minor: ActiveValue::Set(tx.declared.document.minor()),
            declared_total_minor: ActiveValue::Set(tx.declared.total.minor()),
            counted_bill_high_minor: ActiveValue::Set(tx.counted.bill_high.minor()),
            counted_bill_low_minor: ActiveValue::Set(tx.counted.bill_low.minor()),
            counted_coin_minor: ActiveValue::Set(tx.counted.coin.minor()),
            counted_check_minor: ActiveValue::Set(tx.counted.check.minor()),
            counted_document_minor: ActiveValue::Set(tx.counted.document.minor()),
            cash_subtotal_minor: ActiveValue::Set(tx.counted.cash_subtotal.minor()),
            overall_minor: ActiveValue::Set(tx.counted.overall.minor()),
            value_difference_minor: ActiveValue::Set(tx.value_difference.minor()),
            declared_words: ActiveValue::Set(tx.declared_words.clone()),
            counted_words: ActiveValue::Set(tx.counted_words.clone()),
            overall_words: ActiveValue::Set(tx.overall_words.clone()),
            note: ActiveValue::Set(tx.note.clone()),
            custody: ActiveValue::Set(tx.custody),
            point_to_point: ActiveValue::Set(tx.point_to_point),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            registered_by: ActiveValue::Set(tx.registered_by.clone()),
            registered_at: ActiveValue::Set(tx.registered_at),
            registered_ip: ActiveValue::Set(tx.registered_ip.clone()),
            idempotency_key: ActiveValue::Set(tx.idempotency_key.clone()),
            reviewed_by: ActiveValue::Set(tx.reviewed_by.clone()),
            reviewed_at: ActiveValue::Set(tx.reviewed_at),
            disposition: ActiveValue::Set(tx.disposition.map(|d| d.as_str().to_string())),
            cancelled_by: ActiveValue::Set(tx.cancelled_by.clone()),
            cancelled_at: ActiveValue::Set(tx.cancelled_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            service_order_id: model.service_order_id,
            route_id: model.route_id,
            branch_id: model.branch_id,
            currency: Currency::try_from(model.currency.as_str())?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            declared: DeclaredValues {
                bags: model.declared_bags,
                envelopes: model.declared_envelopes,
                checks: model.declared_checks,
                documents: model.declared_documents,
                bill: Money::new(model.declared_bill_minor),
                coin: Money::new(model.declared_coin_minor),
                document: Money::new(model.declared_document_minor),
                total: Money::new(model.declared_total_minor),
            },
            counted: CountedValues {
                bill_high: Money::new(model.counted_bill_high_minor),
                bill_low: Money::new(model.counted_bill_low_minor),
                coin: Money::new(model.counted_coin_minor),
                check: Money::new(model.counted_check_minor),
                document: Money::new(model.counted_document_minor),
                cash_subtotal: Money::new(model.cash_subtotal_minor),
                overall: Money::new(model.overall_minor),
            },
            value_difference: Money::new(model.value_difference_minor),
            declared_words: model.declared_words,
            counted_words: model.counted_words,
            overall_words: model.overall_words,
            note: model.note,
            custody: model.custody,
            point_to_point: model.point_to_point,
            status: TransactionStatus::try_from(model.status.as_str())?,
            registered_by: model.registered_by,
            registered_at: model.registered_at,
            registered_ip: model.registered_ip,
            idempotency_key: model.idempotency_key,
            reviewed_by: model.reviewed_by,
            reviewed_at: model.reviewed_at,
            disposition: model
                .disposition
                .as_deref()
                .map(ReviewDisposition::try_from)
                .transpose()?,
            cancelled_by: model.cancelled_by,
            cancelled_at: model.cancelled_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_transitions() {
        use TransactionStatus::*;
        assert!(Checkin.can_transition_to(InProcess));
        assert!(InProcess.can_transition_to(PendingReview));
        assert!(PendingReview.can_transition_to(Approved));
        assert!(PendingReview.can_transition_to(Rejected));
        assert!(InProcess.can_transition_to(Cancelled));
        assert!(PendingReview.can_transition_to(Cancelled));

        assert!(!PendingReview.can_transition_to(PendingReview));
        assert!(!InProcess.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(InProcess));
        assert!(!Rejected.can_transition_to(Approved));
    }

    #[test]
    fn invalid_transition_carries_current_state() {
        let err = TransactionStatus::Approved
            .transition(TransactionStatus::Rejected)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidState {
                current: "approved".to_string(),
                message: "transaction cannot move to rejected".to_string(),
            }
        );
    }

    #[test]
    fn declared_cash_depends_on_kind() {
        let declared = DeclaredValues {
            bill: Money::major(700),
            coin: Money::major(300),
            total: Money::major(5_000),
            ..Default::default()
        };
        assert_eq!(declared.cash(TransactionKind::Collection), Money::major(5_000));
        assert_eq!(declared.cash(TransactionKind::Provision), Money::major(1_000));
        assert_eq!(declared.cash(TransactionKind::Audit), Money::major(1_000));
    }

    #[test]
    fn unreadable_stored_status_is_a_storage_error() {
        let err = TransactionStatus::try_from("finished").unwrap_err();
        assert!(matches!(err, EngineError::Database(_)));
        let err = ReviewDisposition::try_from("maybe").unwrap_err();
        assert!(matches!(err, EngineError::Database(_)));
    }
}
