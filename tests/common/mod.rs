use std::sync::Arc;

use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

use axum_catalog_api::{
    config::CatalogConfig,
    db::{create_orm_conn, run_migrations},
    entity::{categories, features, users},
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_USER},
    notify::LogNotifier,
    state::AppState,
};

/// Tests in one binary share the database; take this before `try_setup_state`
/// so a test's TRUNCATE cannot race another test's assertions.
pub static DB_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

/// Returns `None` when no database is configured so callers can skip.
pub async fn try_setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE orders, cart_items, carts, article_features, article_prices, articles, features, categories, audit_logs, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(Some(AppState {
        orm,
        catalog: CatalogConfig::default(),
        notifier: Arc::new(LogNotifier),
    }))
}

pub async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<AuthUser> {
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

pub async fn create_admin(state: &AppState) -> anyhow::Result<AuthUser> {
    create_user(state, ROLE_ADMIN, "admin@example.com").await
}

pub async fn create_customer(state: &AppState) -> anyhow::Result<AuthUser> {
    create_user(state, ROLE_USER, "user@example.com").await
}

pub async fn create_category(state: &AppState, name: &str) -> anyhow::Result<Uuid> {
    let category = categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(category.id)
}

pub async fn create_feature(
    state: &AppState,
    category_id: Uuid,
    name: &str,
) -> anyhow::Result<Uuid> {
    let feature = features::ActiveModel {
        id: Set(Uuid::new_v4()),
        category_id: Set(category_id),
        name: Set(name.to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(feature.id)
}
