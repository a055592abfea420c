use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        articles::{
            ArticleList, ArticleSortBy, CreateArticleRequest, EditArticleRequest, FeatureFilter,
            FeaturePair, SearchArticleRequest,
        },
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::AddToCartRequest,
        orders::{ChangeOrderStatusRequest, OrderList},
    },
    entity::{articles::ArticleStatus, orders::OrderStatus},
    models::{
        ArticleDetail, CartDetail, CartLineDetail, Category, Feature, FeatureValue, OrderDetail,
        PriceEntry, UserPublic,
    },
    response::{ApiResponse, Meta},
    routes::{articles, auth, cart, features, health, orders, params},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        articles::create_article,
        articles::edit_article,
        articles::get_article,
        articles::search_articles,
        cart::list_cart,
        cart::add_to_cart,
        cart::remove_from_cart,
        features::list_features,
        orders::checkout,
        orders::get_order,
        orders::list_orders,
        orders::change_status
    ),
    components(
        schemas(
            UserPublic,
            Category,
            Feature,
            FeatureValue,
            PriceEntry,
            ArticleDetail,
            ArticleStatus,
            ArticleList,
            ArticleSortBy,
            CreateArticleRequest,
            EditArticleRequest,
            FeaturePair,
            FeatureFilter,
            SearchArticleRequest,
            AddToCartRequest,
            CartDetail,
            CartLineDetail,
            OrderDetail,
            OrderStatus,
            OrderList,
            ChangeOrderStatusRequest,
            LoginRequest,
            LoginResponse,
            RegisterRequest,
            features::FeatureList,
            params::Pagination,
            params::OrderListQuery,
            Meta,
            ApiResponse<ArticleDetail>,
            ApiResponse<ArticleList>,
            ApiResponse<CartDetail>,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Articles", description = "Catalog aggregate and faceted search endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order lifecycle endpoints"),
        (name = "Auth", description = "Authentication endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
