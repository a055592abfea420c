use rust_decimal::Decimal;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{ChangeOrderStatusRequest, OrderList},
    entity::{CartItems, Carts, Orders, cart_items, orders, orders::OrderStatus},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ROLE_ADMIN, ensure_admin},
    models::OrderDetail,
    notify,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::cart_service::load_cart_detail,
    state::AppState,
};

/// Convert a cart into its one and only order. The uniqueness pre-check gives
/// a friendly error on the common path; the unique index on `orders.cart_id`
/// settles concurrent callers, and its violation surfaces as the same
/// conflict.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    cart_id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let txn = state.orm.begin().await?;

    let existing = Orders::find()
        .filter(orders::Column::CartId.eq(cart_id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "An order for this cart has already been placed".into(),
        ));
    }

    let cart = Carts::find_by_id(cart_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if cart.user_id != user.user_id && user.role != ROLE_ADMIN {
        return Err(AppError::Forbidden);
    }

    let line_count = CartItems::find()
        .filter(cart_items::Column::CartId.eq(cart_id))
        .count(&txn)
        .await?;
    if line_count == 0 {
        return Err(AppError::EmptyCart);
    }

    let order = orders::ActiveModel {
        id: Set(Uuid::new_v4()),
        cart_id: Set(cart_id),
        status: Set(OrderStatus::Pending),
        created_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(
            "An order for this cart has already been placed".into(),
        ),
        _ => AppError::AggregateWrite(err),
    })?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "order_place",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "cart_id": cart_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let detail = load_order_detail(&state.orm, order.id).await?;
    notify::dispatch(state.notifier.clone(), detail.clone());

    Ok(ApiResponse::success(
        "Order placed",
        detail,
        Some(Meta::empty()),
    ))
}

pub async fn change_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ChangeOrderStatusRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(orders::Column::Id.eq(id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if !order.status.can_become(payload.status) {
        return Err(AppError::InvalidTransition {
            from: order.status,
            to: payload.status,
        });
    }

    let mut active: orders::ActiveModel = order.into();
    active.status = Set(payload.status);
    let order = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "order_status_change",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let detail = load_order_detail(&state.orm, order.id).await?;
    // One dispatch per successful transition; delivery never blocks the caller.
    notify::dispatch(state.notifier.clone(), detail.clone());

    Ok(ApiResponse::success(
        "Order status updated",
        detail,
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let detail = load_order_detail(&state.orm, id).await?;

    if detail.cart.user.id != user.user_id && user.role != ROLE_ADMIN {
        return Err(AppError::Forbidden);
    }

    Ok(ApiResponse::success("Order", detail, None))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(orders::Column::Status.eq(status));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(orders::Column::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(orders::Column::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let rows = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(load_order_detail(&state.orm, row.id).await?);
    }

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

/// Hydrated order: cart, owner, every line's article with category and
/// current price, and the order total computed from current prices.
pub async fn load_order_detail(conn: &DatabaseConnection, id: Uuid) -> AppResult<OrderDetail> {
    let order = Orders::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;

    let cart = load_cart_detail(conn, order.cart_id).await?;

    let total: Decimal = cart
        .lines
        .iter()
        .map(|line| line.article.current_price * Decimal::from(line.quantity))
        .sum();

    Ok(OrderDetail {
        id: order.id,
        status: order.status,
        created_at: order.created_at.with_timezone(&chrono::Utc),
        cart,
        total,
    })
}
