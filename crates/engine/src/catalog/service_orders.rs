//! Service orders issued by the operations layer. A transaction is always
//! checked in against one of them.

use sea_orm::entity::prelude::*;

use crate::{EngineError, TransactionKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceOrder {
    pub id: String,
    pub kind: TransactionKind,
    pub origin_point_id: Option<i32>,
    pub destination_point_id: Option<i32>,
}

impl ServiceOrder {
    /// The client point whose configuration applies to the counting: the
    /// origin of a collection or audit, the destination of a provision. Falls
    /// back to the other side when the preferred one is empty.
    pub fn client_point_id(&self) -> Option<i32> {
        match self.kind {
            TransactionKind::Collection | TransactionKind::Audit => {
                self.origin_point_id.or(self.destination_point_id)
            }
            TransactionKind::Provision => self.destination_point_id.or(self.origin_point_id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "service_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub origin_point_id: Option<i32>,
    pub destination_point_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for ServiceOrder {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            origin_point_id: model.origin_point_id,
            destination_point_id: model.destination_point_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(kind: TransactionKind, origin: Option<i32>, destination: Option<i32>) -> ServiceOrder {
        ServiceOrder {
            id: "OS-1".to_string(),
            kind,
            origin_point_id: origin,
            destination_point_id: destination,
        }
    }

    #[test]
    fn client_point_depends_on_kind() {
        assert_eq!(
            order(TransactionKind::Collection, Some(1), Some(2)).client_point_id(),
            Some(1)
        );
        assert_eq!(
            order(TransactionKind::Provision, Some(1), Some(2)).client_point_id(),
            Some(2)
        );
        assert_eq!(
            order(TransactionKind::Provision, Some(1), None).client_point_id(),
            Some(1)
        );
        assert_eq!(order(TransactionKind::Audit, None, None).client_point_id(), None);
    }
}
