use sea_orm::sea_query::{Expr, Query, SelectStatement};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::cart::AddToCartRequest,
    entity::{Articles, CartItems, Carts, Users, cart_items, carts, orders},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartDetail, CartLineDetail, UserPublic},
    response::{ApiResponse, Meta},
    services::catalog_service::load_article_aggregates,
    state::AppState,
};

/// The user's newest cart that has not produced an order yet. Carts are
/// created on demand; a cart with an order attached is sealed.
pub async fn active_cart(state: &AppState, user: &AuthUser) -> AppResult<carts::Model> {
    let open = Carts::find()
        .filter(carts::Column::UserId.eq(user.user_id))
        .filter(Expr::col((Carts, carts::Column::Id)).not_in_subquery(ordered_cart_ids()))
        .order_by_desc(carts::Column::CreatedAt)
        .one(&state.orm)
        .await?;

    if let Some(cart) = open {
        return Ok(cart);
    }

    let cart = carts::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(cart)
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartDetail>> {
    let cart = active_cart(state, user).await?;
    let detail = load_cart_detail(&state.orm, cart.id).await?;
    Ok(ApiResponse::success("Cart", detail, None))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartDetail>> {
    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }

    Articles::find_by_id(payload.article_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let cart = active_cart(state, user).await?;

    let existing = CartItems::find()
        .filter(cart_items::Column::CartId.eq(cart.id))
        .filter(cart_items::Column::ArticleId.eq(payload.article_id))
        .one(&state.orm)
        .await?;

    match existing {
        Some(line) => {
            let mut active: cart_items::ActiveModel = line.into();
            active.quantity = Set(payload.quantity);
            active.update(&state.orm).await?;
        }
        None => {
            cart_items::ActiveModel {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                article_id: Set(payload.article_id),
                quantity: Set(payload.quantity),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await?;
        }
    }

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({
            "cart_id": cart.id,
            "article_id": payload.article_id,
            "quantity": payload.quantity,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let detail = load_cart_detail(&state.orm, cart.id).await?;
    Ok(ApiResponse::success("Cart updated", detail, None))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    article_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let cart = active_cart(state, user).await?;

    let result = CartItems::delete_many()
        .filter(cart_items::Column::CartId.eq(cart.id))
        .filter(cart_items::Column::ArticleId.eq(article_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "cart_id": cart.id, "article_id": article_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Full cart aggregate: owner plus every line with its hydrated article.
pub async fn load_cart_detail(conn: &DatabaseConnection, cart_id: Uuid) -> AppResult<CartDetail> {
    let cart = Carts::find_by_id(cart_id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;

    let owner = Users::find_by_id(cart.user_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("cart {cart_id} references unknown user"))
        })?;

    let lines = CartItems::find()
        .filter(cart_items::Column::CartId.eq(cart.id))
        .order_by_asc(cart_items::Column::CreatedAt)
        .all(conn)
        .await?;

    let article_ids: Vec<Uuid> = lines.iter().map(|line| line.article_id).collect();
    let articles = load_article_aggregates(conn, &article_ids).await?;

    let lines = lines
        .into_iter()
        .map(|line| {
            let article = articles
                .iter()
                .find(|article| article.id == line.article_id)
                .cloned()
                .ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!(
                        "cart line {} references unknown article",
                        line.id
                    ))
                })?;
            Ok(CartLineDetail {
                id: line.id,
                quantity: line.quantity,
                article,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(CartDetail {
        id: cart.id,
        user: UserPublic {
            id: owner.id,
            email: owner.email,
            role: owner.role,
        },
        created_at: cart.created_at.with_timezone(&chrono::Utc),
        lines,
    })
}

fn ordered_cart_ids() -> SelectStatement {
    Query::select()
        .column(orders::Column::CartId)
        .from(orders::Entity)
        .to_owned()
}
