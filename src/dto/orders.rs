use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::orders::OrderStatus;
use crate::models::OrderDetail;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderDetail>,
}
