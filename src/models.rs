use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{articles::ArticleStatus, orders::OrderStatus};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Feature {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
}

/// One row of the append-only price ledger, oldest first in `ArticleDetail`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PriceEntry {
    pub id: Uuid,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeatureValue {
    pub feature_id: Uuid,
    pub feature_name: String,
    pub value: String,
}

/// The fully hydrated catalog aggregate. Services never hand out an article
/// without its category, feature values and complete price history.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArticleDetail {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub excerpt: String,
    pub description: String,
    pub status: ArticleStatus,
    pub is_promoted: bool,
    pub created_at: DateTime<Utc>,
    pub category: Category,
    pub features: Vec<FeatureValue>,
    pub prices: Vec<PriceEntry>,
    pub current_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartLineDetail {
    pub id: Uuid,
    pub quantity: i32,
    pub article: ArticleDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartDetail {
    pub id: Uuid,
    pub user: UserPublic,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<CartLineDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderDetail {
    pub id: Uuid,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub cart: CartDetail,
    /// Sum of quantity times current article price over all lines.
    pub total: Decimal,
}
