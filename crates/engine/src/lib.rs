//! Cash reconciliation engine.
//!
//! Takes a declared cash/valuables shipment, splits it into bags and
//! envelopes, counts each container down to denominations, reconciles the
//! counted cash against the declared value and folds adjudicated incidents
//! back into the difference.
//!
//! Everything goes through [`Engine`]; every mutation is a single database
//! unit of work serialized per transaction.

pub use calculator::{Calculation, calculate};
pub use catalog::{
    BankEntity, Denomination, DenominationLookup, DenominationTable, IncidentCategory,
    IncidentScope, IncidentType, MoneyKind, PointCapabilities, Quality, ServiceOrder,
};
pub use commands::{ContainerEdit, DeclaredShipment, IncidentInput, IncidentPatch, ValueDetailEdit};
pub use containers::{Container, ContainerKind, ContainerStatus, EnvelopeKind};
pub use currency::Currency;
pub use error::EngineError;
pub use incidents::{Incident, IncidentStatus};
pub use money::Money;
pub use ops::{EffectScope, Engine, EngineBuilder, Totals};
pub use policy::ValueTypePolicy;
pub use transactions::{
    CountedValues, DeclaredValues, ReviewDisposition, Transaction, TransactionKind,
    TransactionStatus,
};
pub use value_details::{ValueDetail, ValueType};
pub use words::{amount_in_words, number_in_words};

mod calculator;
mod catalog;
mod commands;
mod containers;
mod currency;
mod error;
mod incidents;
mod locks;
mod money;
mod ops;
mod policy;
mod transactions;
mod util;
mod value_details;
mod words;

type ResultEngine<T> = Result<T, EngineError>;
