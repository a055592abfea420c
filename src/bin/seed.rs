use std::sync::Arc;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use axum_catalog_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::articles::{CreateArticleRequest, FeaturePair},
    entity::{Articles, Categories, Features, Users, articles, categories, features, users},
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_USER},
    notify::LogNotifier,
    services::catalog_service,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let state = AppState {
        orm,
        catalog: config.catalog.clone(),
        notifier: Arc::new(LogNotifier),
    };

    let admin_id = ensure_user(&state, "admin@example.com", "admin123", ROLE_ADMIN).await?;
    ensure_user(&state, "user@example.com", "user123", ROLE_USER).await?;

    let storage = ensure_category(&state, "Storage").await?;
    let capacity = ensure_feature(&state, storage, "Capacity").await?;
    let interface = ensure_feature(&state, storage, "Interface").await?;

    let admin = AuthUser {
        user_id: admin_id,
        role: ROLE_ADMIN.to_string(),
    };

    let demo_articles = [
        ("ACME SSD HD11 1TB", "56.78", "1TB", "SATA"),
        ("ACME SSD HD12 2TB", "92.00", "2TB", "NVMe"),
    ];

    for (name, price, capacity_value, interface_value) in demo_articles {
        let already_seeded = Articles::find()
            .filter(articles::Column::Name.eq(name))
            .one(&state.orm)
            .await?
            .is_some();
        if already_seeded {
            println!("Article {name} already present");
            continue;
        }

        let created = catalog_service::create_full_article(
            &state,
            &admin,
            CreateArticleRequest {
                name: name.to_string(),
                category_id: storage,
                excerpt: format!("Solid state drive {name}"),
                description: format!(
                    "{name} is a demo catalog entry seeded for local development. \
                     It ships with a realistic price history and feature set."
                ),
                price: price.parse::<Decimal>()?,
                features: vec![
                    FeaturePair {
                        feature_id: capacity,
                        value: capacity_value.to_string(),
                    },
                    FeaturePair {
                        feature_id: interface,
                        value: interface_value.to_string(),
                    },
                ],
            },
        )
        .await;

        match created {
            Ok(_) => println!("Seeded article {name}"),
            Err(err) => println!("Skipping article {name}: {err}"),
        }
    }

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_user(
    state: &AppState,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(users::Column::Email.eq(email))
        .one(&state.orm)
        .await?
    {
        return Ok(existing.id);
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        role: Set(role.to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user.id)
}

async fn ensure_category(state: &AppState, name: &str) -> anyhow::Result<Uuid> {
    if let Some(existing) = Categories::find()
        .filter(categories::Column::Name.eq(name))
        .one(&state.orm)
        .await?
    {
        return Ok(existing.id);
    }

    let category = categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(category.id)
}

async fn ensure_feature(state: &AppState, category_id: Uuid, name: &str) -> anyhow::Result<Uuid> {
    if let Some(existing) = Features::find()
        .filter(features::Column::CategoryId.eq(category_id))
        .filter(features::Column::Name.eq(name))
        .one(&state.orm)
        .await?
    {
        return Ok(existing.id);
    }

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
