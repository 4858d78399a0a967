//! Command structs for engine operations.
//!
//! These types group parameters for write operations (checkin, container
//! edits, incident registration), keeping call sites readable and avoiding
//! long argument lists. None of them carries a derived amount: counted values
//! are always computed by the engine.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{ContainerKind, Currency, EnvelopeKind, Money, ValueType};

/// Shipment declared at checkin.
#[derive(Clone, Debug)]
pub struct DeclaredShipment {
    pub service_order_id: String,
    pub currency: Currency,
    pub route_id: Option<String>,
    pub branch_id: Option<String>,
    pub bags: i32,
    pub envelopes: i32,
    pub checks: i32,
    pub documents: i32,
    pub bill: Money,
    pub coin: Money,
    pub document: Money,
    /// Defaults to `bill + coin + document` when not given.
    pub total: Option<Money>,
    pub note: Option<String>,
    pub custody: bool,
    pub point_to_point: bool,
    pub registered_ip: Option<String>,
    pub idempotency_key: Option<String>,
}

impl DeclaredShipment {
    #[must_use]
    pub fn new(service_order_id: impl Into<String>) -> Self {
        Self {
            service_order_id: service_order_id.into(),
            currency: Currency::default(),
            route_id: None,
            branch_id: None,
            bags: 0,
            envelopes: 0,
            checks: 0,
            documents: 0,
            bill: Money::ZERO,
            coin: Money::ZERO,
            document: Money::ZERO,
            total: None,
            note: None,
            custody: false,
            point_to_point: false,
            registered_ip: None,
            idempotency_key: None,
        }
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    #[must_use]
    pub fn route(mut self, route_id: impl Into<String>) -> Self {
        self.route_id = Some(route_id.into());
        self
    }

    #[must_use]
    pub fn branch(mut self, branch_id: impl Into<String>) -> Self {
        self.branch_id = Some(branch_id.into());
        self
    }

    #[must_use]
    pub fn counts(mut self, bags: i32, envelopes: i32, checks: i32, documents: i32) -> Self {
        self.bags = bags;
        self.envelopes = envelopes;
        self.checks = checks;
        self.documents = documents;
        self
    }

    #[must_use]
    pub fn bill(mut self, amount: Money) -> Self {
        self.bill = amount;
        self
    }

    #[must_use]
    pub fn coin(mut self, amount: Money) -> Self {
        self.coin = amount;
        self
    }

    #[must_use]
    pub fn document(mut self, amount: Money) -> Self {
        self.document = amount;
        self
    }

    #[must_use]
    pub fn total(mut self, amount: Money) -> Self {
        self.total = Some(amount);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn custody(mut self, custody: bool) -> Self {
        self.custody = custody;
        self
    }

    #[must_use]
    pub fn point_to_point(mut self, point_to_point: bool) -> Self {
        self.point_to_point = point_to_point;
        self
    }

    #[must_use]
    pub fn registered_ip(mut self, ip: impl Into<String>) -> Self {
        self.registered_ip = Some(ip.into());
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Desired state of one container and its full set of counted lines.
///
/// Lines absent from `lines` are deleted when the edit is applied.
#[derive(Clone, Debug)]
pub struct ContainerEdit {
    pub id: Option<Uuid>,
    pub kind: ContainerKind,
    pub code: String,
    pub declared_value: Option<Money>,
    pub cashier_id: Option<String>,
    pub cashier_name: Option<String>,
    pub lines: Vec<ValueDetailEdit>,
}

impl ContainerEdit {
    #[must_use]
    pub fn bag(code: impl Into<String>) -> Self {
        Self::new(ContainerKind::Bag, code)
    }

    #[must_use]
    pub fn envelope(parent_id: Uuid, subtype: EnvelopeKind, code: impl Into<String>) -> Self {
        Self::new(ContainerKind::Envelope { parent_id, subtype }, code)
    }

    #[must_use]
    pub fn new(kind: ContainerKind, code: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            code: code.into(),
            declared_value: None,
            cashier_id: None,
            cashier_name: None,
            lines: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn declared_value(mut self, amount: Money) -> Self {
        self.declared_value = Some(amount);
        self
    }

    #[must_use]
    pub fn cashier(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.cashier_id = Some(id.into());
        self.cashier_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn line(mut self, line: ValueDetailEdit) -> Self {
        self.lines.push(line);
        self
    }

    #[must_use]
    pub fn lines(mut self, lines: impl IntoIterator<Item = ValueDetailEdit>) -> Self {
        self.lines.extend(lines);
        self
    }
}

/// Inputs of one counted line. Numeric inputs are optional; missing or
/// negative values count as zero.
#[derive(Clone, Debug)]
pub struct ValueDetailEdit {
    pub id: Option<Uuid>,
    pub value_type: ValueType,
    pub denomination_id: Option<i32>,
    pub quality_id: Option<i32>,
    pub quantity: Option<i64>,
    pub bundles: Option<i64>,
    pub loose: Option<i64>,
    pub unit_value: Option<Money>,
    pub bank_entity_id: Option<i32>,
    pub account_number: Option<String>,
    pub check_number: Option<String>,
    pub issued_on: Option<NaiveDate>,
}

impl ValueDetailEdit {
    #[must_use]
    pub fn new(value_type: ValueType) -> Self {
        Self {
            id: None,
            value_type,
            denomination_id: None,
            quality_id: None,
            quantity: None,
            bundles: None,
            loose: None,
            unit_value: None,
            bank_entity_id: None,
            account_number: None,
            check_number: None,
            issued_on: None,
        }
    }

    #[must_use]
    pub fn bill(denomination_id: i32) -> Self {
        Self::new(ValueType::Bill).denomination(denomination_id)
    }

    #[must_use]
    pub fn coin(denomination_id: i32) -> Self {
        Self::new(ValueType::Coin).denomination(denomination_id)
    }

    #[must_use]
    pub fn check(unit_value: Money) -> Self {
        Self::new(ValueType::Check).unit_value(unit_value)
    }

    #[must_use]
    pub fn document(unit_value: Money) -> Self {
        Self::new(ValueType::Document).unit_value(unit_value)
    }

    #[must_use]
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn denomination(mut self, denomination_id: i32) -> Self {
        self.denomination_id = Some(denomination_id);
        self
    }

    #[must_use]
    pub fn quality(mut self, quality_id: i32) -> Self {
        self.quality_id = Some(quality_id);
        self
    }

    #[must_use]
    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    #[must_use]
    pub fn bundles(mut self, bundles: i64) -> Self {
        self.bundles = Some(bundles);
        self
    }

    #[must_use]
    pub fn loose(mut self, loose: i64) -> Self {
        self.loose = Some(loose);
        self
    }

    #[must_use]
    pub fn unit_value(mut self, unit_value: Money) -> Self {
        self.unit_value = Some(unit_value);
        self
    }

    #[must_use]
    pub fn bank_entity(mut self, bank_entity_id: i32) -> Self {
        self.bank_entity_id = Some(bank_entity_id);
        self
    }

    #[must_use]
    pub fn account_number(mut self, account_number: impl Into<String>) -> Self {
        self.account_number = Some(account_number.into());
        self
    }

    #[must_use]
    pub fn check_number(mut self, check_number: impl Into<String>) -> Self {
        self.check_number = Some(check_number.into());
        self
    }

    #[must_use]
    pub fn issued_on(mut self, date: NaiveDate) -> Self {
        self.issued_on = Some(date);
        self
    }
}

/// Register an incident. At least one of transaction, container or
/// value-detail must be given; the missing upper links are inferred.
#[derive(Clone, Debug)]
pub struct IncidentInput {
    pub type_code: String,
    pub transaction_id: Option<Uuid>,
    pub container_id: Option<Uuid>,
    pub value_detail_id: Option<Uuid>,
    pub denomination_id: Option<i32>,
    pub quantity: Option<i64>,
    /// Takes precedence over `denomination face × quantity`.
    pub amount: Option<Money>,
    pub description: Option<String>,
}

impl IncidentInput {
    #[must_use]
    pub fn new(type_code: impl Into<String>) -> Self {
        Self {
            type_code: type_code.into(),
            transaction_id: None,
            container_id: None,
            value_detail_id: None,
            denomination_id: None,
            quantity: None,
            amount: None,
            description: None,
        }
    }

    #[must_use]
    pub fn transaction(mut self, transaction_id: Uuid) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    #[must_use]
    pub fn container(mut self, container_id: Uuid) -> Self {
        self.container_id = Some(container_id);
        self
    }

    #[must_use]
    pub fn value_detail(mut self, value_detail_id: Uuid) -> Self {
        self.value_detail_id = Some(value_detail_id);
        self
    }

    #[must_use]
    pub fn denomination(mut self, denomination_id: i32, quantity: i64) -> Self {
        self.denomination_id = Some(denomination_id);
        self.quantity = Some(quantity);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update of a still-reported incident. `None` keeps the current value.
#[derive(Clone, Debug, Default)]
pub struct IncidentPatch {
    pub type_code: Option<String>,
    pub denomination_id: Option<i32>,
    pub quantity: Option<i64>,
    pub amount: Option<Money>,
    pub description: Option<String>,
}

impl IncidentPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn type_code(mut self, code: impl Into<String>) -> Self {
        self.type_code = Some(code.into());
        self
    }

    #[must_use]
    pub fn denomination(mut self, denomination_id: i32, quantity: i64) -> Self {
        self.denomination_id = Some(denomination_id);
        self.quantity = Some(quantity);
        self
    }

    /// Affected pieces. Recounts the amount only when a denomination is set.
    #[must_use]
    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.type_code.is_none()
            && self.denomination_id.is_none()
            && self.quantity.is_none()
            && self.amount.is_none()
            && self.description.is_none()
    }
}
