use sea_orm::{ConnectionTrait, DatabaseConnection, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Transaction, locks::TransactionLocks, transactions};

mod containers;
mod incidents;
mod reconciliation;
mod workflow;

pub use incidents::EffectScope;
pub use reconciliation::Totals;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    locks: TransactionLocks,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    async fn require_transaction<C: ConnectionTrait>(
        &self,
        db: &C,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
        Transaction::try_from(model)
    }

    /// Containers and incidents only change while the transaction is counting.
    fn require_open_for_counting(transaction: &Transaction) -> ResultEngine<()> {
        if !transaction.status.is_open_for_counting() {
            return Err(EngineError::invalid_state(
                transaction.status,
                "transaction is closed for counting",
            ));
        }
        Ok(())
    }
}

fn require_actor(actor: &str) -> ResultEngine<String> {
    let trimmed = actor.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidId(
            "actor id must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            locks: TransactionLocks::default(),
        })
    }
}
