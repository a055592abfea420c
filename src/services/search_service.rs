use rust_decimal::Decimal;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Alias, Expr, Query, SelectStatement};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Select,
};
use uuid::Uuid;

use crate::{
    config::CatalogConfig,
    dto::articles::{ArticleList, ArticleSortBy, FeatureFilter, SearchArticleRequest},
    entity::{ArticlePrices, Articles, article_features, article_prices, articles},
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    routes::params::SortOrder,
    services::catalog_service::load_article_aggregates,
    state::AppState,
};

/// Normalized search criteria. Building one validates the request against the
/// configured page sizes, so a `SearchSpec` in hand is always executable.
#[derive(Debug)]
pub struct SearchSpec {
    pub category_id: Uuid,
    pub keyword: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub features: Vec<FeatureFilter>,
    pub order_by: ArticleSortBy,
    pub direction: SortOrder,
    pub page: u64,
    pub per_page: u64,
}

impl SearchSpec {
    pub fn from_request(
        request: SearchArticleRequest,
        config: &CatalogConfig,
    ) -> AppResult<Self> {
        let per_page = match request.items_per_page {
            None => config.default_page_size,
            Some(size) if config.page_sizes.contains(&size) => size,
            Some(size) => {
                return Err(AppError::Validation(format!(
                    "items_per_page must be one of {:?}, got {size}",
                    config.page_sizes
                )));
            }
        };

        let keyword = request
            .keywords
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Ok(Self {
            category_id: request.category_id,
            keyword,
            price_min: request.price_min,
            price_max: request.price_max,
            features: request.features.unwrap_or_default(),
            order_by: request.order_by.unwrap_or(ArticleSortBy::Name),
            direction: request.order_direction.unwrap_or(SortOrder::Asc),
            page: request.page.unwrap_or(0),
            per_page,
        })
    }

    pub fn offset(&self) -> u64 {
        self.page * self.per_page
    }
}

pub async fn search_articles(
    state: &AppState,
    payload: SearchArticleRequest,
) -> AppResult<ApiResponse<ArticleList>> {
    let spec = SearchSpec::from_request(payload, &state.catalog)?;

    let finder = build_search_query(&spec);
    let total = finder.clone().count(&state.orm).await? as i64;

    let ids: Vec<Uuid> = finder
        .offset(spec.offset())
        .limit(spec.per_page)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|article| article.id)
        .collect();

    // Hydration preserves the query's page order.
    let items = load_article_aggregates(&state.orm, &ids).await?;

    let meta = Meta::new(spec.page as i64, spec.per_page as i64, total);
    Ok(ApiResponse::success(
        "Articles",
        ArticleList { items },
        Some(meta),
    ))
}

/// Emit the complete parameterized query for a `SearchSpec`: category scope,
/// latest ledger entry join, keyword/price/facet predicates, ordering.
/// Pagination is applied by the caller so the same query can be counted.
pub fn build_search_query(spec: &SearchSpec) -> Select<articles::Entity> {
    let mut finder = Articles::find()
        .join(JoinType::InnerJoin, articles::Relation::ArticlePrices.def())
        .filter(
            Expr::col((ArticlePrices, article_prices::Column::CreatedAt))
                .in_subquery(latest_entry_subquery()),
        )
        .filter(articles::Column::CategoryId.eq(spec.category_id));

    if let Some(keyword) = &spec.keyword {
        let pattern = format!("%{}%", keyword);
        finder = finder.filter(
            Condition::any()
                .add(Expr::col((Articles, articles::Column::Name)).ilike(pattern.clone()))
                .add(Expr::col((Articles, articles::Column::Excerpt)).ilike(pattern.clone()))
                .add(Expr::col((Articles, articles::Column::Description)).ilike(pattern)),
        );
    }

    if let Some(min) = spec.price_min {
        finder = finder.filter(Expr::col((ArticlePrices, article_prices::Column::Price)).gte(min));
    }
    if let Some(max) = spec.price_max {
        finder = finder.filter(Expr::col((ArticlePrices, article_prices::Column::Price)).lte(max));
    }

    // Each facet filter must hold independently, so each gets its own
    // assignment subquery rather than sharing one joined alias.
    for filter in &spec.features {
        finder = finder.filter(articles::Column::Id.in_subquery(facet_subquery(filter)));
    }

    let direction: sea_orm::Order = spec.direction.into();
    finder = match spec.order_by {
        ArticleSortBy::Name => finder.order_by(articles::Column::Name, direction),
        ArticleSortBy::Price => finder.order_by(article_prices::Column::Price, direction),
    };
    // Deterministic tie-break keeps pages disjoint between requests.
    finder.order_by(articles::Column::Id, sea_orm::Order::Asc)
}

/// Correlated `MAX(created_at)` over the price ledger for the outer article.
fn latest_entry_subquery() -> SelectStatement {
    let ledger = Alias::new("price_ledger");
    Query::select()
        .expr(Expr::col((ledger.clone(), article_prices::Column::CreatedAt)).max())
        .from_as(ArticlePrices, ledger.clone())
        .and_where(
            Expr::col((ledger, article_prices::Column::ArticleId))
                .equals((Articles, articles::Column::Id)),
        )
        .to_owned()
}

fn facet_subquery(filter: &FeatureFilter) -> SelectStatement {
    Query::select()
        .column(article_features::Column::ArticleId)
        .from(article_features::Entity)
        .and_where(Expr::col(article_features::Column::FeatureId).eq(filter.feature_id))
        .and_where(Expr::col(article_features::Column::Value).is_in(filter.values.clone()))
        .to_owned()
}
