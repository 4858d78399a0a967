//! Which value types and container kinds a transaction may carry.

use std::collections::BTreeSet;

use crate::{ContainerKind, EngineError, PointCapabilities, ResultEngine, TransactionKind, ValueType};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueTypePolicy {
    allowed: BTreeSet<ValueType>,
    allows_envelopes: bool,
}

impl ValueTypePolicy {
    /// Collections may bring anything; provisions only deliver cash; audits
    /// recount cash and documents held in custody. The client point can only
    /// narrow that set.
    pub fn for_kind(kind: TransactionKind, point: PointCapabilities) -> Self {
        let base: &[ValueType] = match kind {
            TransactionKind::Collection => &ValueType::ALL,
            TransactionKind::Provision => &[ValueType::Bill, ValueType::Coin],
            TransactionKind::Audit => &[ValueType::Bill, ValueType::Coin, ValueType::Document],
        };
        let allowed = base
            .iter()
            .copied()
            .filter(|value_type| match value_type {
                ValueType::Document => point.allows_documents,
                ValueType::Check => point.allows_checks,
                ValueType::Bill | ValueType::Coin => true,
            })
            .collect();
        Self {
            allowed,
            allows_envelopes: point.allows_envelopes,
        }
    }

    /// Policy allowing everything; for callers that enforce their own rules.
    pub fn permissive() -> Self {
        Self {
            allowed: ValueType::ALL.into_iter().collect(),
            allows_envelopes: true,
        }
    }

    pub fn allows(&self, value_type: ValueType) -> bool {
        self.allowed.contains(&value_type)
    }

    pub fn allows_envelopes(&self) -> bool {
        self.allows_envelopes
    }

    pub fn allowed(&self) -> impl Iterator<Item = ValueType> + '_ {
        self.allowed.iter().copied()
    }

    pub(crate) fn check_container(&self, kind: &ContainerKind) -> ResultEngine<()> {
        if !kind.is_bag() && !self.allows_envelopes {
            return Err(EngineError::Invariant(
                "envelopes are not allowed for this service".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn check_line(&self, kind: &ContainerKind, value_type: ValueType) -> ResultEngine<()> {
        if !self.allows(value_type) {
            return Err(EngineError::Invariant(format!(
                "value type {value_type} is not allowed for this service"
            )));
        }
        if let Some(subtype) = kind.envelope_kind()
            && !subtype.accepts(value_type)
        {
            return Err(EngineError::Invariant(format!(
                "{} envelope cannot hold {value_type} lines",
                subtype.as_str()
            )));
        }
        Ok(())
    }
}
