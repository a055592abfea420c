use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::articles::{ArticleList, CreateArticleRequest, EditArticleRequest, SearchArticleRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::ArticleDetail,
    response::ApiResponse,
    services::{catalog_service, search_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_article))
        .route("/search", post(search_articles))
        .route("/{id}", get(get_article))
        .route("/{id}", patch(edit_article))
}

#[utoipa::path(
    post,
    path = "/api/articles",
    request_body = CreateArticleRequest,
    responses(
        (status = 200, description = "Create article with price and features", body = ApiResponse<ArticleDetail>),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Category or feature not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Articles"
)]
pub async fn create_article(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateArticleRequest>,
) -> AppResult<Json<ApiResponse<ArticleDetail>>> {
    let resp = catalog_service::create_full_article(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/articles/{id}",
    params(
        ("id" = Uuid, Path, description = "Article ID")
    ),
    request_body = EditArticleRequest,
    responses(
        (status = 200, description = "Edit article, reconcile price history and features", body = ApiResponse<ArticleDetail>),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Articles"
)]
pub async fn edit_article(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditArticleRequest>,
) -> AppResult<Json<ApiResponse<ArticleDetail>>> {
    let resp = catalog_service::edit_full_article(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/articles/{id}",
    params(
        ("id" = Uuid, Path, description = "Article ID")
    ),
    responses(
        (status = 200, description = "Get fully hydrated article", body = ApiResponse<ArticleDetail>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Articles"
)]
pub async fn get_article(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ArticleDetail>>> {
    let resp = catalog_service::get_article(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/articles/search",
    request_body = SearchArticleRequest,
    responses(
        (status = 200, description = "Faceted search within a category", body = ApiResponse<ArticleList>),
        (status = 400, description = "Invalid page size"),
    ),
    security(("bearer_auth" = [])),
    tag = "Articles"
)]
pub async fn search_articles(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<SearchArticleRequest>,
) -> AppResult<Json<ApiResponse<ArticleList>>> {
    let resp = search_service::search_articles(&state, payload).await?;
    Ok(Json(resp))
}
