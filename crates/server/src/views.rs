//! Conversions between engine types and the wire DTOs.

use api_types::{
    container::{
        ContainerKind as ApiContainerKind, ContainerStatus as ApiContainerStatus, ContainerView,
        EnvelopeKind as ApiEnvelopeKind, ValueDetailView, ValueType as ApiValueType,
    },
    incident::{IncidentStatus as ApiIncidentStatus, IncidentView},
    transaction::{
        CountedView, DeclaredView, ReviewDisposition as ApiDisposition, TotalsView,
        TransactionKind as ApiKind, TransactionStatus as ApiStatus, TransactionView,
    },
};
use engine::{
    Container, ContainerKind, ContainerStatus, CountedValues, Currency, EnvelopeKind, Incident,
    IncidentStatus, ReviewDisposition, Totals, Transaction, TransactionKind, TransactionStatus,
    ValueDetail, ValueType,
};

pub(crate) fn map_currency(currency: Currency) -> api_types::Currency {
    match currency {
        Currency::Cop => api_types::Currency::Cop,
        Currency::Usd => api_types::Currency::Usd,
        Currency::Eur => api_types::Currency::Eur,
    }
}

pub(crate) fn currency_from_api(currency: api_types::Currency) -> Currency {
    match currency {
        api_types::Currency::Cop => Currency::Cop,
        api_types::Currency::Usd => Currency::Usd,
        api_types::Currency::Eur => Currency::Eur,
    }
}

fn map_kind(kind: TransactionKind) -> ApiKind {
    match kind {
        TransactionKind::Collection => ApiKind::Collection,
        TransactionKind::Provision => ApiKind::Provision,
        TransactionKind::Audit => ApiKind::Audit,
    }
}

fn map_status(status: TransactionStatus) -> ApiStatus {
    match status {
        TransactionStatus::Checkin => ApiStatus::Checkin,
        TransactionStatus::InProcess => ApiStatus::InProcess,
        TransactionStatus::PendingReview => ApiStatus::PendingReview,
        TransactionStatus::Approved => ApiStatus::Approved,
        TransactionStatus::Rejected => ApiStatus::Rejected,
        TransactionStatus::Cancelled => ApiStatus::Cancelled,
    }
}

fn map_disposition(disposition: ReviewDisposition) -> ApiDisposition {
    match disposition {
        ReviewDisposition::Approved => ApiDisposition::Approved,
        ReviewDisposition::Rejected => ApiDisposition::Rejected,
    }
}

pub(crate) fn disposition_from_api(disposition: ApiDisposition) -> ReviewDisposition {
    match disposition {
        ApiDisposition::Approved => ReviewDisposition::Approved,
        ApiDisposition::Rejected => ReviewDisposition::Rejected,
    }
}

fn counted_view(counted: &CountedValues) -> CountedView {
    CountedView {
        bill_high_minor: counted.bill_high.minor(),
        bill_low_minor: counted.bill_low.minor(),
        coin_minor: counted.coin.minor(),
        check_minor: counted.check.minor(),
        document_minor: counted.document.minor(),
        cash_subtotal_minor: counted.cash_subtotal.minor(),
        overall_minor: counted.overall.minor(),
    }
}

pub(crate) fn transaction_view(tx: Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        service_order_id: tx.service_order_id,
        route_id: tx.route_id,
        branch_id: tx.branch_id,
        currency: map_currency(tx.currency),
        kind: map_kind(tx.kind),
        status: map_status(tx.status),
        declared: DeclaredView {
            bags: tx.declared.bags,
            envelopes: tx.declared.envelopes,
            checks: tx.declared.checks,
            documents: tx.declared.documents,
            bill_minor: tx.declared.bill.minor(),
            coin_minor: tx.declared.coin.minor(),
            document_minor: tx.declared.document.minor(),
            total_minor: tx.declared.total.minor(),
        },
        counted: counted_view(&tx.counted),
        value_difference_minor: tx.value_difference.minor(),
        declared_words: tx.declared_words,
        counted_words: tx.counted_words,
        overall_words: tx.overall_words,
        note: tx.note,
        custody: tx.custody,
        point_to_point: tx.point_to_point,
        registered_by: tx.registered_by,
        registered_at: tx.registered_at,
        reviewed_by: tx.reviewed_by,
        reviewed_at: tx.reviewed_at,
        disposition: tx.disposition.map(map_disposition),
        cancelled_by: tx.cancelled_by,
        cancelled_at: tx.cancelled_at,
    }
}

pub(crate) fn totals_view(totals: Totals) -> TotalsView {
    TotalsView {
        transaction_id: totals.transaction_id,
        currency: map_currency(totals.currency),
        kind: map_kind(totals.kind),
        status: map_status(totals.status),
        declared_cash_minor: totals.declared_cash.minor(),
        counted: counted_view(&totals.counted),
        approved_effect_minor: totals.approved_effect.minor(),
        difference_minor: totals.difference.minor(),
        declared_words: totals.declared_words,
        counted_words: totals.counted_words,
        overall_words: totals.overall_words,
    }
}

fn map_envelope_kind(kind: EnvelopeKind) -> ApiEnvelopeKind {
    match kind {
        EnvelopeKind::Cash => ApiEnvelopeKind::Cash,
        EnvelopeKind::Document => ApiEnvelopeKind::Document,
        EnvelopeKind::Check => ApiEnvelopeKind::Check,
    }
}

pub(crate) fn container_kind_from_api(kind: ApiContainerKind) -> ContainerKind {
    match kind {
        ApiContainerKind::Bag => ContainerKind::Bag,
        ApiContainerKind::Envelope { parent_id, subtype } => ContainerKind::Envelope {
            parent_id,
            subtype: match subtype {
                ApiEnvelopeKind::Cash => EnvelopeKind::Cash,
                ApiEnvelopeKind::Document => EnvelopeKind::Document,
                ApiEnvelopeKind::Check => EnvelopeKind::Check,
            },
        },
    }
}

fn map_container_status(status: ContainerStatus) -> ApiContainerStatus {
    match status {
        ContainerStatus::Pending => ApiContainerStatus::Pending,
        ContainerStatus::InProcess => ApiContainerStatus::InProcess,
        ContainerStatus::Processed => ApiContainerStatus::Processed,
        ContainerStatus::Verified => ApiContainerStatus::Verified,
        ContainerStatus::WithIncident => ApiContainerStatus::WithIncident,
    }
}

fn map_value_type(value_type: ValueType) -> ApiValueType {
    match value_type {
        ValueType::Bill => ApiValueType::Bill,
        ValueType::Coin => ApiValueType::Coin,
        ValueType::Check => ApiValueType::Check,
        ValueType::Document => ApiValueType::Document,
    }
}

pub(crate) fn value_type_from_api(value_type: ApiValueType) -> ValueType {
    match value_type {
        ApiValueType::Bill => ValueType::Bill,
        ApiValueType::Coin => ValueType::Coin,
        ApiValueType::Check => ValueType::Check,
        ApiValueType::Document => ValueType::Document,
    }
}

fn value_detail_view(line: ValueDetail) -> ValueDetailView {
    ValueDetailView {
        id: line.id,
        value_type: map_value_type(line.value_type),
        denomination_id: line.denomination_id,
        quality_id: line.quality_id,
        quantity: line.quantity,
        bundles: line.bundles,
        loose: line.loose,
        unit_value_minor: line.unit_value.minor(),
        is_high: line.is_high,
        amount_minor: line.amount.minor(),
        bank_entity_id: line.bank_entity_id,
        account_number: line.account_number,
        check_number: line.check_number,
        issued_on: line.issued_on,
    }
}

pub(crate) fn container_view(container: Container) -> ContainerView {
    ContainerView {
        id: container.id,
        transaction_id: container.transaction_id,
        kind: match container.kind {
            ContainerKind::Bag => ApiContainerKind::Bag,
            ContainerKind::Envelope { parent_id, subtype } => ApiContainerKind::Envelope {
                parent_id,
                subtype: map_envelope_kind(subtype),
            },
        },
        code: container.code,
        declared_value_minor: container.declared_value.map(|value| value.minor()),
        counted_value_minor: container.counted_value.minor(),
        status: map_container_status(container.status),
        processed_by: container.processed_by,
        processed_at: container.processed_at,
        cashier_id: container.cashier_id,
        cashier_name: container.cashier_name,
        lines: container.details.into_iter().map(value_detail_view).collect(),
    }
}

fn map_incident_status(status: IncidentStatus) -> ApiIncidentStatus {
    match status {
        IncidentStatus::Reported => ApiIncidentStatus::Reported,
        IncidentStatus::UnderReview => ApiIncidentStatus::UnderReview,
        IncidentStatus::Adjusted => ApiIncidentStatus::Adjusted,
        IncidentStatus::Closed => ApiIncidentStatus::Closed,
    }
}

pub(crate) fn incident_status_from_api(status: ApiIncidentStatus) -> IncidentStatus {
    match status {
        ApiIncidentStatus::Reported => IncidentStatus::Reported,
        ApiIncidentStatus::UnderReview => IncidentStatus::UnderReview,
        ApiIncidentStatus::Adjusted => IncidentStatus::Adjusted,
        ApiIncidentStatus::Closed => IncidentStatus::Closed,
    }
}

pub(crate) fn incident_view(incident: Incident) -> IncidentView {
    IncidentView {
        id: incident.id,
        transaction_id: incident.transaction_id,
        container_id: incident.container_id,
        value_detail_id: incident.value_detail_id,
        type_code: incident.incident_type_code,
        denomination_id: incident.denomination_id,
        quantity: incident.quantity,
        amount_minor: incident.amount.minor(),
        description: incident.description,
        reported_by: incident.reported_by,
        reported_at: incident.reported_at,
        status: map_incident_status(incident.status),
        resolved_by: incident.resolved_by,
        resolved_at: incident.resolved_at,
    }
}
