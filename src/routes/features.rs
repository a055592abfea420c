use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{Features, features},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Feature,
    response::ApiResponse,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct FeatureListQuery {
    pub category_id: Uuid,
}

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct FeatureList {
    pub items: Vec<Feature>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_features))
}

#[utoipa::path(
    get,
    path = "/api/features",
    params(
        ("category_id" = Uuid, Query, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Features available in a category", body = ApiResponse<FeatureList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Articles"
)]
pub async fn list_features(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<FeatureListQuery>,
) -> AppResult<Json<ApiResponse<FeatureList>>> {
    let items = Features::find()
        .filter(features::Column::CategoryId.eq(query.category_id))
        .order_by_asc(features::Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|model| Feature {
            id: model.id,
            category_id: model.category_id,
            name: model.name,
        })
        .collect();

    Ok(Json(ApiResponse::success(
        "Features",
        FeatureList { items },
        None,
    )))
}
