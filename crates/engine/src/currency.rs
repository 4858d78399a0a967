use serde::{Deserialize, Serialize};

use crate::EngineError;

/// ISO currency code of a shipment and of the denominations counted for it.
///
/// The processing center works mostly in Colombian pesos (`COP`), which is the
/// default. Foreign currency shipments (`USD`, `EUR`) are counted with their own
/// denomination catalog.
///
/// ## Minor units
///
/// The engine stores monetary values as an `i64` number of **minor units** (see
/// `Money`). Every supported currency uses two decimal digits, so
/// `10,000.00 COP` is stored as `1000000`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Cop,
    Usd,
    Eur,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Cop => "COP",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    /// Spanish names used by the amount-in-words rendering, `(singular, plural)`.
    #[must_use]
    pub const fn spoken_names(self) -> (&'static str, &'static str) {
        match self {
            Currency::Cop => ("PESO", "PESOS"),
            Currency::Usd => ("DOLAR", "DOLARES"),
            Currency::Eur => ("EURO", "EUROS"),
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "COP" => Ok(Currency::Cop),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            other => Err(EngineError::Unconfigured(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}
