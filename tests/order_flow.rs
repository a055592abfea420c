mod common;

use rust_decimal_macros::dec;
use uuid::Uuid;

use axum_catalog_api::{
    dto::{
        articles::CreateArticleRequest,
        cart::AddToCartRequest,
        orders::ChangeOrderStatusRequest,
    },
    entity::orders::OrderStatus,
    error::AppError,
    services::{cart_service, catalog_service, order_service},
};

// Cart to order to shipped, with every guard along the way.
#[tokio::test]
async fn checkout_and_status_lifecycle() -> anyhow::Result<()> {
    let _db = common::DB_LOCK.lock().await;
    let Some(state) = common::try_setup_state().await? else {
        return Ok(());
    };

    let admin = common::create_admin(&state).await?;
    let customer = common::create_customer(&state).await?;
    let category_id = common::create_category(&state, "Widgets").await?;

    let article = catalog_service::create_full_article(
        &state,
        &admin,
        CreateArticleRequest {
            name: "Widget A".into(),
            category_id,
            excerpt: "Short pitch for Widget A".into(),
            description: "Widget A: this demo description is padded until it clears the sixty-four character minimum.".into(),
            price: dec!(10.00),
            features: vec![],
        },
    )
    .await?
    .data
    .unwrap();

    // An empty cart cannot be ordered.
    let empty_cart = cart_service::active_cart(&state, &customer).await?;
    let err = order_service::place_order(&state, &customer, empty_cart.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmptyCart));

    // A missing cart is NotFound.
    let err = order_service::place_order(&state, &customer, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            article_id: article.id,
            quantity: 2,
        },
    )
    .await?;

    let cart = cart_service::active_cart(&state, &customer).await?;
    let order = order_service::place_order(&state, &customer, cart.id)
        .await?
        .data
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.cart.id, cart.id);
    assert_eq!(order.cart.user.id, customer.user_id);
    assert_eq!(order.cart.lines.len(), 1);
    assert_eq!(order.cart.lines[0].quantity, 2);
    assert_eq!(order.cart.lines[0].article.current_price, dec!(10.00));
    assert_eq!(order.total, dec!(20.00));

    // One order per cart.
    let err = order_service::place_order(&state, &customer, cart.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // The cart is sealed now; a fresh one is served for new shopping.
    let next_cart = cart_service::active_cart(&state, &customer).await?;
    assert_ne!(next_cart.id, cart.id);

    // Skipping acceptance is rejected and nothing is applied.
    let err = order_service::change_status(
        &state,
        &admin,
        order.id,
        ChangeOrderStatusRequest {
            status: OrderStatus::Shipped,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Shipped
        }
    ));
    let still_pending = order_service::get_order(&state, &admin, order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(still_pending.status, OrderStatus::Pending);

    // pending -> accepted -> shipped succeeds in sequence.
    let accepted = order_service::change_status(
        &state,
        &admin,
        order.id,
        ChangeOrderStatusRequest {
            status: OrderStatus::Accepted,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(accepted.status, OrderStatus::Accepted);

    let shipped = order_service::change_status(
        &state,
        &admin,
        order.id,
        ChangeOrderStatusRequest {
            status: OrderStatus::Shipped,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(shipped.status, OrderStatus::Shipped);

    // Shipped is terminal.
    let err = order_service::change_status(
        &state,
        &admin,
        order.id,
        ChangeOrderStatusRequest {
            status: OrderStatus::Accepted,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    // Status changes are gated on the administrator role.
    let err = order_service::change_status(
        &state,
        &customer,
        order.id,
        ChangeOrderStatusRequest {
            status: OrderStatus::Accepted,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Unknown order id.
    let err = order_service::change_status(
        &state,
        &admin,
        Uuid::new_v4(),
        ChangeOrderStatusRequest {
            status: OrderStatus::Accepted,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

// Two checkouts racing on the same cart: the unique constraint on
// orders.cart_id lets exactly one insert through.
#[tokio::test]
async fn concurrent_checkout_creates_exactly_one_order() -> anyhow::Result<()> {
    let _db = common::DB_LOCK.lock().await;
    let Some(state) = common::try_setup_state().await? else {
        return Ok(());
    };

    let admin = common::create_admin(&state).await?;
    let customer = common::create_customer(&state).await?;
    let category_id = common::create_category(&state, "Widgets").await?;

    let article = catalog_service::create_full_article(
        &state,
        &admin,
        CreateArticleRequest {
            name: "Widget B".into(),
            category_id,
            excerpt: "Short pitch for Widget B".into(),
            description: "Widget B: this demo description is padded until it clears the sixty-four character minimum.".into(),
            price: dec!(5.00),
            features: vec![],
        },
    )
    .await?
    .data
    .unwrap();

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            article_id: article.id,
            quantity: 1,
        },
    )
    .await?;
    let cart = cart_service::active_cart(&state, &customer).await?;

    let first = order_service::place_order(&state, &customer, cart.id);
    let second = order_service::place_order(&state, &customer, cart.id);
    let (first, second) = tokio::join!(first, second);

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one checkout may win");
    for result in [first, second] {
        if let Err(err) = result {
            assert!(matches!(err, AppError::Conflict(_)));
        }
    }

    Ok(())
}
