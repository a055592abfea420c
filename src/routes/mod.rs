use axum::Router;

use crate::state::AppState;

pub mod articles;
pub mod auth;
pub mod cart;
pub mod doc;
pub mod features;
pub mod health;
pub mod orders;
pub mod params;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/articles", articles::router())
        .nest("/auth", auth::router())
        .nest("/cart", cart::router())
        .nest("/features", features::router())
        .nest("/orders", orders::router())
}
