use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::articles::ArticleStatus;
use crate::models::ArticleDetail;
use crate::routes::params::SortOrder;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct FeaturePair {
    pub feature_id: Uuid,
    pub value: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateArticleRequest {
    pub name: String,
    pub category_id: Uuid,
    pub excerpt: String,
    pub description: String,
    pub price: Decimal,
    pub features: Vec<FeaturePair>,
}

/// Same shape as create plus status and the promoted flag. `features` is
/// tri-state: absent/null leaves assignments untouched, `[]` clears them,
/// a non-empty list replaces the whole set.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EditArticleRequest {
    pub name: String,
    pub category_id: Uuid,
    pub excerpt: String,
    pub description: String,
    pub status: ArticleStatus,
    pub is_promoted: bool,
    pub price: Decimal,
    pub features: Option<Vec<FeaturePair>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FeatureFilter {
    pub feature_id: Uuid,
    pub values: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ArticleSortBy {
    Name,
    Price,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchArticleRequest {
    pub category_id: Uuid,
    pub keywords: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub features: Option<Vec<FeatureFilter>>,
    pub order_by: Option<ArticleSortBy>,
    pub order_direction: Option<SortOrder>,
    /// 0-based.
    pub page: Option<u64>,
    pub items_per_page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArticleList {
    pub items: Vec<ArticleDetail>,
}
