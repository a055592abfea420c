use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    /// Unique in the schema: a cart produces at most one order.
    pub cart_id: Uuid,
    pub status: OrderStatus,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "shipped")]
    Shipped,
}

impl OrderStatus {
    /// The full transition table. `rejected` and `shipped` are terminal.
    pub fn can_become(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Accepted)
                | (OrderStatus::Pending, OrderStatus::Rejected)
                | (OrderStatus::Accepted, OrderStatus::Shipped)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Shipped => "shipped",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::carts::Entity",
        from = "Column::CartId",
        to = "super::carts::Column::Id"
    )]
    Carts,
}

impl Related<super::carts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Carts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;

    #[test]
    fn pending_can_be_accepted_or_rejected() {
        assert!(Pending.can_become(Accepted));
        assert!(Pending.can_become(Rejected));
    }

    #[test]
    fn shipping_requires_acceptance_first() {
        assert!(!Pending.can_become(Shipped));
        assert!(Accepted.can_become(Shipped));
    }

    #[test]
    fn rejected_and_shipped_are_terminal() {
        for next in [Pending, Accepted, Rejected, Shipped] {
            assert!(!Rejected.can_become(next));
            assert!(!Shipped.can_become(next));
        }
    }

    #[test]
    fn no_self_transitions() {
        for status in [Pending, Accepted, Rejected, Shipped] {
            assert!(!status.can_become(status));
        }
    }
}
