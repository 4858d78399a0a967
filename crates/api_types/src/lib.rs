use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Cop,
    Usd,
    Eur,
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Collection,
        Provision,
        Audit,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionStatus {
        Checkin,
        InProcess,
        PendingReview,
        Approved,
        Rejected,
        Cancelled,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ReviewDisposition {
        Approved,
        Rejected,
    }

    /// Request body for `POST /transactions`.
    ///
    /// Amounts are integer minor units. When `declared_total_minor` is omitted
    /// it defaults to bill + coin + document.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CheckinNew {
        pub service_order_id: String,
        #[serde(default)]
        pub currency: Option<Currency>,
        #[serde(default)]
        pub route_id: Option<String>,
        #[serde(default)]
        pub branch_id: Option<String>,
        #[serde(default)]
        pub declared_bags: i32,
        #[serde(default)]
        pub declared_envelopes: i32,
        #[serde(default)]
        pub declared_checks: i32,
        #[serde(default)]
        pub declared_documents: i32,
        #[serde(default)]
        pub declared_bill_minor: i64,
        #[serde(default)]
        pub declared_coin_minor: i64,
        #[serde(default)]
        pub declared_document_minor: i64,
        #[serde(default)]
        pub declared_total_minor: Option<i64>,
        #[serde(default)]
        pub note: Option<String>,
        #[serde(default)]
        pub custody: bool,
        #[serde(default)]
        pub point_to_point: bool,
        #[serde(default)]
        pub idempotency_key: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionCreated {
        pub id: Uuid,
    }

    /// Request body for `POST /transactions/{id}/review`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReviewRequest {
        pub disposition: ReviewDisposition,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DeclaredView {
        pub bags: i32,
        pub envelopes: i32,
        pub checks: i32,
        pub documents: i32,
        pub bill_minor: i64,
        pub coin_minor: i64,
        pub document_minor: i64,
        pub total_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CountedView {
        pub bill_high_minor: i64,
        pub bill_low_minor: i64,
        pub coin_minor: i64,
        pub check_minor: i64,
        pub document_minor: i64,
        pub cash_subtotal_minor: i64,
        pub overall_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub service_order_id: String,
        pub route_id: Option<String>,
        pub branch_id: Option<String>,
        pub currency: Currency,
        pub kind: TransactionKind,
        pub status: TransactionStatus,
        pub declared: DeclaredView,
        pub counted: CountedView,
        pub value_difference_minor: i64,
        pub declared_words: String,
        pub counted_words: String,
        pub overall_words: String,
        pub note: Option<String>,
        pub custody: bool,
        pub point_to_point: bool,
        pub registered_by: String,
        pub registered_at: DateTime<Utc>,
        pub reviewed_by: Option<String>,
        pub reviewed_at: Option<DateTime<Utc>>,
        pub disposition: Option<ReviewDisposition>,
        pub cancelled_by: Option<String>,
        pub cancelled_at: Option<DateTime<Utc>>,
    }

    /// Reconciled figures, as returned by totals, finalize and container
    /// deletion.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TotalsView {
        pub transaction_id: Uuid,
        pub currency: Currency,
        pub kind: TransactionKind,
        pub status: TransactionStatus,
        pub declared_cash_minor: i64,
        pub counted: CountedView,
        pub approved_effect_minor: i64,
        pub difference_minor: i64,
        pub declared_words: String,
        pub counted_words: String,
        pub overall_words: String,
    }
}

pub mod container {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EnvelopeKind {
        Cash,
        Document,
        Check,
    }

    /// `{"type": "bag"}` or
    /// `{"type": "envelope", "parent_id": "...", "subtype": "cash"}`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum ContainerKind {
        Bag,
        Envelope { parent_id: Uuid, subtype: EnvelopeKind },
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ContainerStatus {
        Pending,
        InProcess,
        Processed,
        Verified,
        WithIncident,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ValueType {
        Bill,
        Coin,
        Check,
        Document,
    }

    /// One counted line. The amount is always computed server side.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ValueDetailUpsert {
        #[serde(default)]
        pub id: Option<Uuid>,
        pub value_type: ValueType,
        #[serde(default)]
        pub denomination_id: Option<i32>,
        #[serde(default)]
        pub quality_id: Option<i32>,
        #[serde(default)]
        pub quantity: Option<i64>,
        #[serde(default)]
        pub bundles: Option<i64>,
        #[serde(default)]
        pub loose: Option<i64>,
        #[serde(default)]
        pub unit_value_minor: Option<i64>,
        #[serde(default)]
        pub bank_entity_id: Option<i32>,
        #[serde(default)]
        pub account_number: Option<String>,
        #[serde(default)]
        pub check_number: Option<String>,
        #[serde(default)]
        pub issued_on: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContainerUpsert {
        #[serde(default)]
        pub id: Option<Uuid>,
        #[serde(flatten)]
        pub kind: ContainerKind,
        pub code: String,
        #[serde(default)]
        pub declared_value_minor: Option<i64>,
        #[serde(default)]
        pub cashier_id: Option<String>,
        #[serde(default)]
        pub cashier_name: Option<String>,
        #[serde(default)]
        pub lines: Vec<ValueDetailUpsert>,
    }

    /// Request body for `PUT /transactions/{id}/containers`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContainersSave {
        pub containers: Vec<ContainerUpsert>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContainersSaved {
        pub ids: Vec<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ValueDetailView {
        pub id: Uuid,
        pub value_type: ValueType,
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
        pub issued_on: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContainerView {
        pub id: Uuid,
        pub transaction_id: Uuid,
        #[serde(flatten)]
        pub kind: ContainerKind,
        pub code: String,
        pub declared_value_minor: Option<i64>,
        pub counted_value_minor: i64,
        pub status: ContainerStatus,
        pub processed_by: Option<String>,
        pub processed_at: Option<DateTime<Utc>>,
        pub cashier_id: Option<String>,
        pub cashier_name: Option<String>,
        /// Empty when listing the containers of a transaction.
        pub lines: Vec<ValueDetailView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContainerListResponse {
        pub containers: Vec<ContainerView>,
    }
}

pub mod incident {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum IncidentStatus {
        Reported,
        UnderReview,
        Adjusted,
        Closed,
    }

    /// Request body for `POST /incidents`. At least one of the three links is
    /// required; the missing upper links are inferred.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct IncidentNew {
        pub type_code: String,
        #[serde(default)]
        pub transaction_id: Option<Uuid>,
        #[serde(default)]
        pub container_id: Option<Uuid>,
        #[serde(default)]
        pub value_detail_id: Option<Uuid>,
        #[serde(default)]
        pub denomination_id: Option<i32>,
        #[serde(default)]
        pub quantity: Option<i64>,
        #[serde(default)]
        pub amount_minor: Option<i64>,
        #[serde(default)]
        pub description: Option<String>,
    }

    /// Request body for `PATCH /incidents/{id}`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct IncidentUpdate {
        #[serde(default)]
        pub type_code: Option<String>,
        #[serde(default)]
        pub denomination_id: Option<i32>,
        #[serde(default)]
        pub quantity: Option<i64>,
        #[serde(default)]
        pub amount_minor: Option<i64>,
        #[serde(default)]
        pub description: Option<String>,
    }

    /// Request body for `POST /incidents/{id}/resolve`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct IncidentResolve {
        pub status: IncidentStatus,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct IncidentCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct IncidentView {
        pub id: Uuid,
        pub transaction_id: Option<Uuid>,
        pub container_id: Option<Uuid>,
        pub value_detail_id: Option<Uuid>,
        pub type_code: String,
        pub denomination_id: Option<i32>,
        pub quantity: i64,
        pub amount_minor: i64,
        pub description: Option<String>,
        pub reported_by: String,
        pub reported_at: DateTime<Utc>,
        pub status: IncidentStatus,
        pub resolved_by: Option<String>,
        pub resolved_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct IncidentListResponse {
        pub incidents: Vec<IncidentView>,
    }
}

pub mod catalog {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PointCapabilities {
        pub allows_envelopes: bool,
        pub allows_documents: bool,
        pub allows_checks: bool,
    }
}
