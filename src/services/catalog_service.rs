use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::articles::{CreateArticleRequest, EditArticleRequest, FeaturePair},
    entity::{
        ArticleFeatures, ArticlePrices, Articles, Categories, Features,
        article_features, article_prices, articles,
        articles::ArticleStatus,
        categories, features,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{ArticleDetail, Category, FeatureValue, PriceEntry},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn create_full_article(
    state: &AppState,
    user: &AuthUser,
    payload: CreateArticleRequest,
) -> AppResult<ApiResponse<ArticleDetail>> {
    ensure_admin(user)?;
    validate_article_fields(
        &payload.name,
        &payload.excerpt,
        &payload.description,
        payload.price,
        state.catalog.money_scale,
    )?;
    validate_feature_pairs(&payload.features)?;

    ensure_category_exists(&state.orm, payload.category_id).await?;
    ensure_features_exist(&state.orm, payload.features.iter().map(|f| f.feature_id)).await?;

    let article_id = Uuid::new_v4();

    let txn = state.orm.begin().await?;
    let written: Result<(), DbErr> = async {
        articles::ActiveModel {
            id: Set(article_id),
            category_id: Set(payload.category_id),
            name: Set(payload.name.clone()),
            excerpt: Set(payload.excerpt.clone()),
            description: Set(payload.description.clone()),
            status: Set(ArticleStatus::Available),
            is_promoted: Set(false),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        article_prices::ActiveModel {
            id: Set(Uuid::new_v4()),
            article_id: Set(article_id),
            price: Set(payload.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        for pair in &payload.features {
            article_features::ActiveModel {
                id: Set(Uuid::new_v4()),
                article_id: Set(article_id),
                feature_id: Set(pair.feature_id),
                value: Set(pair.value.clone()),
            }
            .insert(&txn)
            .await?;
        }

        Ok(())
    }
    .await;

    match written {
        // Dropping the transaction without commit rolls everything back.
        Err(err) => return Err(AppError::AggregateWrite(err)),
        Ok(()) => txn.commit().await.map_err(AppError::AggregateWrite)?,
    }

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "article_create",
        Some("articles"),
        Some(serde_json::json!({ "article_id": article_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let article = load_one_aggregate(&state.orm, article_id).await?;
    Ok(ApiResponse::success(
        "Article created",
        article,
        Some(Meta::empty()),
    ))
}

pub async fn edit_full_article(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: EditArticleRequest,
) -> AppResult<ApiResponse<ArticleDetail>> {
    ensure_admin(user)?;
    validate_article_fields(
        &payload.name,
        &payload.excerpt,
        &payload.description,
        payload.price,
        state.catalog.money_scale,
    )?;
    if let Some(features) = &payload.features {
        validate_feature_pairs(features)?;
    }

    let existing = Articles::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    ensure_category_exists(&state.orm, payload.category_id).await?;
    if let Some(features) = &payload.features {
        ensure_features_exist(&state.orm, features.iter().map(|f| f.feature_id)).await?;
    }

    let current_price = current_price_of(&state.orm, id).await?;

    let txn = state.orm.begin().await?;
    let written: Result<(), DbErr> = async {
        let mut active: articles::ActiveModel = existing.into();
        active.name = Set(payload.name.clone());
        active.category_id = Set(payload.category_id);
        active.excerpt = Set(payload.excerpt.clone());
        active.description = Set(payload.description.clone());
        active.status = Set(payload.status);
        active.is_promoted = Set(payload.is_promoted);
        active.update(&txn).await?;

        if price_changed(current_price, payload.price, state.catalog.money_scale) {
            article_prices::ActiveModel {
                id: Set(Uuid::new_v4()),
                article_id: Set(id),
                price: Set(payload.price),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
        }

        // None leaves assignments untouched; an empty list is an explicit
        // "clear all features" instruction.
        if let Some(features) = &payload.features {
            ArticleFeatures::delete_many()
                .filter(article_features::Column::ArticleId.eq(id))
                .exec(&txn)
                .await?;

            for pair in features {
                article_features::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    article_id: Set(id),
                    feature_id: Set(pair.feature_id),
                    value: Set(pair.value.clone()),
                }
                .insert(&txn)
                .await?;
            }
        }

        Ok(())
    }
    .await;

    match written {
        Err(err) => return Err(AppError::AggregateWrite(err)),
        Ok(()) => txn.commit().await.map_err(AppError::AggregateWrite)?,
    }

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "article_edit",
        Some("articles"),
        Some(serde_json::json!({ "article_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let article = load_one_aggregate(&state.orm, id).await?;
    Ok(ApiResponse::success("Article updated", article, None))
}

pub async fn get_article(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ArticleDetail>> {
    let article = load_one_aggregate(&state.orm, id).await?;
    Ok(ApiResponse::success("Article", article, None))
}

/// Amount of the newest ledger entry. Every article gets its first entry at
/// creation; a missing history means the aggregate is corrupt.
async fn current_price_of(conn: &DatabaseConnection, article_id: Uuid) -> AppResult<Decimal> {
    let latest = ArticlePrices::find()
        .filter(article_prices::Column::ArticleId.eq(article_id))
        .order_by_desc(article_prices::Column::CreatedAt)
        .one(conn)
        .await?;

    match latest {
        Some(entry) => Ok(entry.price),
        None => Err(AppError::Internal(anyhow::anyhow!(
            "article {article_id} has no price history"
        ))),
    }
}

pub(crate) fn price_changed(current: Decimal, new: Decimal, scale: u32) -> bool {
    current.round_dp(scale) != new.round_dp(scale)
}

fn validate_article_fields(
    name: &str,
    excerpt: &str,
    description: &str,
    price: Decimal,
    money_scale: u32,
) -> AppResult<()> {
    validate_length("name", name, 5, 128)?;
    validate_length("excerpt", excerpt, 10, 255)?;
    validate_length("description", description, 64, 10_000)?;

    if price <= Decimal::ZERO {
        return Err(AppError::Validation("price must be positive".into()));
    }
    if price.normalize().scale() > money_scale {
        return Err(AppError::Validation(format!(
            "price must have at most {money_scale} decimal places"
        )));
    }
    Ok(())
}

fn validate_feature_pairs(features: &[FeaturePair]) -> AppResult<()> {
    for pair in features {
        validate_length("feature value", &pair.value, 1, 255)?;
    }
    Ok(())
}

fn validate_length(field: &str, value: &str, min: usize, max: usize) -> AppResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AppError::Validation(format!(
            "{field} must be between {min} and {max} characters, got {len}"
        )));
    }
    Ok(())
}

async fn ensure_category_exists(conn: &DatabaseConnection, category_id: Uuid) -> AppResult<()> {
    Categories::find_by_id(category_id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(())
}

async fn ensure_features_exist(
    conn: &DatabaseConnection,
    feature_ids: impl Iterator<Item = Uuid>,
) -> AppResult<()> {
    let wanted: HashSet<Uuid> = feature_ids.collect();
    if wanted.is_empty() {
        return Ok(());
    }
    let found = Features::find()
        .filter(features::Column::Id.is_in(wanted.iter().copied()))
        .all(conn)
        .await?;
    if found.len() != wanted.len() {
        return Err(AppError::NotFound);
    }
    Ok(())
}

async fn load_one_aggregate(conn: &DatabaseConnection, id: Uuid) -> AppResult<ArticleDetail> {
    load_article_aggregates(conn, &[id])
        .await?
        .into_iter()
        .next()
        .ok_or(AppError::NotFound)
}

/// Read-your-write hydration over a handful of queries instead of one joined
/// row explosion. Returns the aggregates in the same order as `ids`; ids that
/// match no article are silently dropped.
pub async fn load_article_aggregates(
    conn: &DatabaseConnection,
    ids: &[Uuid],
) -> AppResult<Vec<ArticleDetail>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let articles = Articles::find()
        .filter(articles::Column::Id.is_in(ids.iter().copied()))
        .all(conn)
        .await?;

    let category_ids: HashSet<Uuid> = articles.iter().map(|a| a.category_id).collect();
    let categories: HashMap<Uuid, categories::Model> = Categories::find()
        .filter(categories::Column::Id.is_in(category_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let mut price_history: HashMap<Uuid, Vec<PriceEntry>> = HashMap::new();
    let price_rows = ArticlePrices::find()
        .filter(article_prices::Column::ArticleId.is_in(ids.iter().copied()))
        .order_by_asc(article_prices::Column::CreatedAt)
        .all(conn)
        .await?;
    for row in price_rows {
        price_history
            .entry(row.article_id)
            .or_default()
            .push(PriceEntry {
                id: row.id,
                price: row.price,
                created_at: row.created_at.with_timezone(&Utc),
            });
    }

    let assignments = ArticleFeatures::find()
        .filter(article_features::Column::ArticleId.is_in(ids.iter().copied()))
        .all(conn)
        .await?;
    let feature_ids: HashSet<Uuid> = assignments.iter().map(|a| a.feature_id).collect();
    let feature_catalog: HashMap<Uuid, features::Model> = if feature_ids.is_empty() {
        HashMap::new()
    } else {
        Features::find()
            .filter(features::Column::Id.is_in(feature_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|f| (f.id, f))
            .collect()
    };
    let mut feature_values: HashMap<Uuid, Vec<FeatureValue>> = HashMap::new();
    for assignment in assignments {
        let feature = feature_catalog
            .get(&assignment.feature_id)
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "assignment {} references unknown feature",
                    assignment.id
                ))
            })?;
        feature_values
            .entry(assignment.article_id)
            .or_default()
            .push(FeatureValue {
                feature_id: assignment.feature_id,
                feature_name: feature.name.clone(),
                value: assignment.value,
            });
    }

    let mut by_id: HashMap<Uuid, articles::Model> =
        articles.into_iter().map(|a| (a.id, a)).collect();

    let mut details = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(article) = by_id.remove(id) else {
            continue;
        };
        let category = categories.get(&article.category_id).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "article {} references unknown category",
                article.id
            ))
        })?;
        let prices = price_history.remove(&article.id).unwrap_or_default();
        let current_price = prices
            .last()
            .map(|entry| entry.price)
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "article {} has no price history",
                    article.id
                ))
            })?;

        details.push(ArticleDetail {
            id: article.id,
            category_id: article.category_id,
            name: article.name,
            excerpt: article.excerpt,
            description: article.description,
            status: article.status,
            is_promoted: article.is_promoted,
            created_at: article.created_at.with_timezone(&Utc),
            category: Category {
                id: category.id,
                name: category.name.clone(),
                created_at: category.created_at.with_timezone(&Utc),
            },
            features: feature_values.remove(&article.id).unwrap_or_default(),
            prices,
            current_price,
        });
    }

    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valid_description() -> String {
        "d".repeat(64)
    }

    #[test]
    fn rejects_short_name() {
        let err = validate_article_fields("ab", "a proper excerpt", &valid_description(), dec!(10), 2)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rejects_non_positive_price() {
        for price in [dec!(0), dec!(-3.50)] {
            let err = validate_article_fields(
                "Widget A",
                "a proper excerpt",
                &valid_description(),
                price,
                2,
            )
            .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[test]
    fn rejects_sub_cent_precision() {
        let err = validate_article_fields(
            "Widget A",
            "a proper excerpt",
            &valid_description(),
            dec!(9.999),
            2,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn trailing_zeros_do_not_count_as_extra_precision() {
        assert!(
            validate_article_fields(
                "Widget A",
                "a proper excerpt",
                &valid_description(),
                dec!(9.9900),
                2,
            )
            .is_ok()
        );
    }

    #[test]
    fn excerpt_and_description_bounds() {
        assert!(
            validate_article_fields("Widget A", "too short", &valid_description(), dec!(1), 2)
                .is_err()
        );
        assert!(
            validate_article_fields("Widget A", "a proper excerpt", "too short", dec!(1), 2)
                .is_err()
        );
    }

    #[test]
    fn price_comparison_happens_at_two_decimals() {
        assert!(!price_changed(dec!(10.00), dec!(10), 2));
        assert!(!price_changed(dec!(10.00), dec!(10.004), 2));
        assert!(price_changed(dec!(10.00), dec!(12.50), 2));
        assert!(price_changed(dec!(10.00), dec!(10.01), 2));
    }
}
