//! Value-detail calculator.
//!
//! Computes the amount of one counted line from its inputs and the
//! denomination catalog. It is a pure function: callers load a
//! [`DenominationLookup`] up front and persist the result themselves.
//!
//! - document: flat unit value
//! - check: unit value × max(quantity, 1)
//! - bill / coin: face value × pieces, where pieces is the explicit quantity
//!   or `bundles × bundle size + loose`
//!
//! Missing or negative numeric inputs count as zero and arithmetic saturates.
//! Cash lines must use denominations of the transaction currency.

use crate::{Currency, DenominationLookup, EngineError, Money, ResultEngine, ValueDetailEdit, ValueType};

/// Derived values of a counted line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Calculation {
    pub amount: Money,
    /// Face value for cash lines, the given unit value otherwise.
    pub unit_value: Money,
    pub is_high: bool,
}

fn floor(value: Option<i64>) -> i64 {
    value.unwrap_or(0).max(0)
}

pub fn calculate(
    detail: &ValueDetailEdit,
    currency: Currency,
    lookup: &impl DenominationLookup,
) -> ResultEngine<Calculation> {
    match detail.value_type {
        ValueType::Document => {
            let unit_value = detail.unit_value.unwrap_or_default().clamp_non_negative();
            Ok(Calculation {
                amount: unit_value,
                unit_value,
                is_high: false,
            })
        }
        ValueType::Check => {
            let unit_value = detail.unit_value.unwrap_or_default().clamp_non_negative();
            Ok(Calculation {
                amount: unit_value.times(floor(detail.quantity).max(1)),
                unit_value,
                is_high: false,
            })
        }
        ValueType::Bill | ValueType::Coin => {
            let denomination_id = detail.denomination_id.ok_or_else(|| {
                EngineError::Invariant(format!(
                    "{} line requires a denomination",
                    detail.value_type
                ))
            })?;
            let denomination = lookup.denomination(denomination_id).ok_or_else(|| {
                EngineError::Unconfigured(format!("denomination {denomination_id} not found"))
            })?;
            if detail.value_type.money_kind() != Some(denomination.kind) {
                return Err(EngineError::Invariant(format!(
                    "denomination {denomination_id} is not a {}",
                    detail.value_type
                )));
            }
            if denomination.currency != currency {
                return Err(EngineError::Invariant(format!(
                    "denomination {denomination_id} is not a {currency} denomination"
                )));
            }

            let pieces = match detail.quantity {
                Some(quantity) => quantity.max(0),
                None => floor(detail.bundles)
                    .saturating_mul(denomination.effective_bundle_size())
                    .saturating_add(floor(detail.loose)),
            };
            let face_value = denomination.face_value.clamp_non_negative();
            Ok(Calculation {
                amount: face_value.times(pieces),
                unit_value: face_value,
                is_high: denomination.is_high,
            })
        }
    }
}
