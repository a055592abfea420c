mod common;

use rust_decimal_macros::dec;
use uuid::Uuid;

use axum_catalog_api::{
    dto::articles::{
        ArticleSortBy, CreateArticleRequest, EditArticleRequest, FeatureFilter, FeaturePair,
        SearchArticleRequest,
    },
    entity::articles::ArticleStatus,
    error::AppError,
    models::ArticleDetail,
    routes::params::SortOrder,
    services::{catalog_service, search_service},
    state::AppState,
};

fn description(text: &str) -> String {
    format!("{text}: this demo description is padded until it clears the sixty-four character minimum.")
}

fn create_request(
    name: &str,
    category_id: Uuid,
    price: rust_decimal::Decimal,
    features: Vec<FeaturePair>,
) -> CreateArticleRequest {
    CreateArticleRequest {
        name: name.to_string(),
        category_id,
        excerpt: format!("Short pitch for {name}"),
        description: description(name),
        price,
        features,
    }
}

fn edit_request(article: &ArticleDetail, price: rust_decimal::Decimal) -> EditArticleRequest {
    EditArticleRequest {
        name: article.name.clone(),
        category_id: article.category_id,
        excerpt: article.excerpt.clone(),
        description: article.description.clone(),
        status: ArticleStatus::Available,
        is_promoted: article.is_promoted,
        price,
        features: None,
    }
}

fn search_request(category_id: Uuid) -> SearchArticleRequest {
    SearchArticleRequest {
        category_id,
        keywords: None,
        price_min: None,
        price_max: None,
        features: None,
        order_by: None,
        order_direction: None,
        page: None,
        items_per_page: None,
    }
}

async fn search_ids(state: &AppState, request: SearchArticleRequest) -> anyhow::Result<Vec<Uuid>> {
    let resp = search_service::search_articles(state, request).await?;
    Ok(resp
        .data
        .unwrap()
        .items
        .into_iter()
        .map(|article| article.id)
        .collect())
}

// Full aggregate lifecycle: create with ledger + features, edit with price
// reconciliation and feature replacement, then search against current prices.
#[tokio::test]
async fn create_edit_and_search_flow() -> anyhow::Result<()> {
    let _db = common::DB_LOCK.lock().await;
    let Some(state) = common::try_setup_state().await? else {
        return Ok(());
    };

    let admin = common::create_admin(&state).await?;
    let category_id = common::create_category(&state, "Widgets").await?;
    let other_category_id = common::create_category(&state, "Gadgets").await?;
    let color = common::create_feature(&state, category_id, "Color").await?;
    let size = common::create_feature(&state, category_id, "Size").await?;

    // Create: exactly one ledger entry carrying the input price.
    let created = catalog_service::create_full_article(
        &state,
        &admin,
        create_request(
            "Widget A",
            category_id,
            dec!(10.00),
            vec![FeaturePair {
                feature_id: color,
                value: "red".into(),
            }],
        ),
    )
    .await?
    .data
    .unwrap();

    assert_eq!(created.prices.len(), 1);
    assert_eq!(created.prices[0].price, dec!(10.00));
    assert_eq!(created.current_price, dec!(10.00));
    assert_eq!(created.status, ArticleStatus::Available);
    assert!(!created.is_promoted);
    assert_eq!(created.category.id, category_id);
    assert_eq!(created.features.len(), 1);
    assert_eq!(created.features[0].value, "red");
    assert_eq!(created.features[0].feature_name, "Color");

    // Same price at 2-decimal scale: no ledger growth.
    let unchanged = catalog_service::edit_full_article(
        &state,
        &admin,
        created.id,
        edit_request(&created, dec!(10)),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(unchanged.prices.len(), 1);
    // features = None leaves the assignment set untouched
    assert_eq!(unchanged.features.len(), 1);

    // New price: exactly one appended entry which becomes current.
    let repriced = catalog_service::edit_full_article(
        &state,
        &admin,
        created.id,
        edit_request(&created, dec!(12.50)),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(repriced.prices.len(), 2);
    assert_eq!(repriced.prices[0].price, dec!(10.00));
    assert_eq!(repriced.prices[1].price, dec!(12.50));
    assert_eq!(repriced.current_price, dec!(12.50));

    // Replace the whole feature set.
    let mut replace = edit_request(&created, dec!(12.50));
    replace.features = Some(vec![
        FeaturePair {
            feature_id: color,
            value: "blue".into(),
        },
        FeaturePair {
            feature_id: size,
            value: "XL".into(),
        },
    ]);
    let replaced = catalog_service::edit_full_article(&state, &admin, created.id, replace)
        .await?
        .data
        .unwrap();
    assert_eq!(replaced.features.len(), 2);
    assert!(replaced.features.iter().all(|f| f.value != "red"));

    // Empty list is an explicit clear, distinct from None.
    let mut clear = edit_request(&created, dec!(12.50));
    clear.features = Some(vec![]);
    let cleared = catalog_service::edit_full_article(&state, &admin, created.id, clear)
        .await?
        .data
        .unwrap();
    assert!(cleared.features.is_empty());
    // ...and the ledger did not grow during feature-only edits.
    assert_eq!(cleared.prices.len(), 2);

    // Search uses the current price, not historical entries.
    let mut min11 = search_request(category_id);
    min11.price_min = Some(dec!(11));
    assert_eq!(search_ids(&state, min11).await?, vec![created.id]);

    let mut max9 = search_request(category_id);
    max9.price_max = Some(dec!(9));
    assert!(search_ids(&state, max9).await?.is_empty());

    // Category scoping.
    assert!(search_ids(&state, search_request(other_category_id)).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn search_keywords_facets_and_pagination() -> anyhow::Result<()> {
    let _db = common::DB_LOCK.lock().await;
    let Some(state) = common::try_setup_state().await? else {
        return Ok(());
    };

    let admin = common::create_admin(&state).await?;
    let category_id = common::create_category(&state, "Drives").await?;
    let interface = common::create_feature(&state, category_id, "Interface").await?;

    let mut ids = Vec::new();
    for (index, price) in [dec!(10), dec!(20), dec!(30), dec!(40), dec!(50), dec!(60)]
        .into_iter()
        .enumerate()
    {
        let value = if index % 2 == 0 { "SATA" } else { "NVMe" };
        let article = catalog_service::create_full_article(
            &state,
            &admin,
            create_request(
                &format!("Drive {:02}", index),
                category_id,
                price,
                vec![FeaturePair {
                    feature_id: interface,
                    value: value.into(),
                }],
            ),
        )
        .await?
        .data
        .unwrap();
        ids.push(article.id);
    }

    // Keyword matches the name, case-insensitively.
    let mut keyword = search_request(category_id);
    keyword.keywords = Some("drive 03".into());
    assert_eq!(search_ids(&state, keyword).await?, vec![ids[3]]);

    // Facet filter: only articles carrying one of the accepted values.
    let mut facet = search_request(category_id);
    facet.features = Some(vec![FeatureFilter {
        feature_id: interface,
        values: vec!["NVMe".into()],
    }]);
    let nvme_ids = search_ids(&state, facet).await?;
    assert_eq!(nvme_ids, vec![ids[1], ids[3], ids[5]]);

    // Price sort descending.
    let mut by_price = search_request(category_id);
    by_price.order_by = Some(ArticleSortBy::Price);
    by_price.order_direction = Some(SortOrder::Desc);
    let sorted = search_ids(&state, by_price).await?;
    assert_eq!(sorted.first(), Some(&ids[5]));
    assert_eq!(sorted.last(), Some(&ids[0]));

    // Pages are disjoint slices of a deterministic ordering.
    let mut page0 = search_request(category_id);
    page0.items_per_page = Some(5);
    page0.page = Some(0);
    let first_page = search_ids(&state, page0).await?;

    let mut page1 = search_request(category_id);
    page1.items_per_page = Some(5);
    page1.page = Some(1);
    let second_page = search_ids(&state, page1).await?;

    assert_eq!(first_page.len(), 5);
    assert_eq!(second_page.len(), 1);
    assert!(first_page.iter().all(|id| !second_page.contains(id)));

    let mut rerun = search_request(category_id);
    rerun.items_per_page = Some(5);
    rerun.page = Some(0);
    assert_eq!(search_ids(&state, rerun).await?, first_page);

    // Page sizes outside the configured set are rejected up front.
    let mut bad_size = search_request(category_id);
    bad_size.items_per_page = Some(7);
    let err = search_service::search_articles(&state, bad_size)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn validation_failures_leave_no_partial_aggregate() -> anyhow::Result<()> {
    let _db = common::DB_LOCK.lock().await;
    let Some(state) = common::try_setup_state().await? else {
        return Ok(());
    };

    let admin = common::create_admin(&state).await?;
    let category_id = common::create_category(&state, "Widgets").await?;

    // Name too short: rejected before any write.
    let err = catalog_service::create_full_article(
        &state,
        &admin,
        create_request("abc", category_id, dec!(10.00), vec![]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Sub-cent precision: rejected.
    let err = catalog_service::create_full_article(
        &state,
        &admin,
        create_request("Widget B", category_id, dec!(9.999), vec![]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Unknown category: rejected before any write.
    let err = catalog_service::create_full_article(
        &state,
        &admin,
        create_request("Widget B", Uuid::new_v4(), dec!(10.00), vec![]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let all = search_ids(&state, search_request(category_id)).await?;
    assert!(all.is_empty(), "no partial aggregate should survive");

    // Editing a missing article is NotFound.
    let phantom = catalog_service::create_full_article(
        &state,
        &admin,
        create_request("Widget C", category_id, dec!(10.00), vec![]),
    )
    .await?
    .data
    .unwrap();
    let err = catalog_service::edit_full_article(
        &state,
        &admin,
        Uuid::new_v4(),
        edit_request(&phantom, dec!(10.00)),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}
