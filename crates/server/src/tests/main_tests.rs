use super::*;
use axum::{body, body::Body, http::Request};
use chrono::{Duration, TimeZone, Utc};
use storage::NewArticle;
use tower::ServiceExt;

async fn test_app(go_articles: usize) -> Router {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.create_tag("Go", "go").await.expect("tag");
    storage.create_tag("C++", "c++").await.expect("tag");
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    for i in 0..go_articles {
        storage
            .create_article(&NewArticle {
                title: format!("go-{i}"),
                summary: String::new(),
                cover: None,
                tags: vec!["go".into()],
                views: 0,
                status: ArticleStatus::Publish,
                publish_at: base + Duration::minutes(i as i64),
            })
            .await
            .expect("article");
    }
    build_router(Arc::new(AppState {
        api: ApiContext { storage },
    }))
}

async fn get_json<T: serde::de::DeserializeOwned>(app: Router, uri: &str) -> (StatusCode, T) {
    let request = Request::get(uri).body(Body::empty()).expect("request");
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, serde_json::from_slice(&body).expect("json"))
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let app = test_app(0).await;
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn tag_route_returns_articles_and_total_pair() {
    let app = test_app(20).await;
    let (status, value): (_, serde_json::Value) =
        get_json(app, "/article/tag/go?page=2&pageSize=12&status=publish").await;
    assert_eq!(status, StatusCode::OK);

    let pair = value.as_array().expect("pair");
    assert_eq!(pair.len(), 2);
    assert_eq!(pair[0].as_array().expect("articles").len(), 8);
    assert_eq!(pair[1], 20);
}

#[tokio::test]
async fn tag_route_defaults_to_first_client_page() {
    let app = test_app(20).await;
    let (status, page): (_, ArticlePage) = get_json(app, "/article/tag/go").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page.articles().len(), PAGE_SIZE as usize);
    assert_eq!(page.articles()[0].title, "go-19");
}

#[tokio::test]
async fn tag_route_rejects_unknown_status() {
    let app = test_app(1).await;
    let (status, err): (_, ApiError) = get_json(app, "/article/tag/go?status=archived").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn tag_route_decodes_percent_encoded_tag() {
    let app = test_app(0).await;
    let (status, page): (_, ArticlePage) = get_json(app, "/article/tag/c%2B%2B").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page.total(), 0);
}

#[tokio::test]
async fn seed_route_prefetches_initial_page() {
    let app = test_app(20).await;
    let (status, seed): (_, TagPageSeed) = get_json(app.clone(), "/tag-page?tag=go").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seed.tag, "go");
    assert_eq!(seed.total, 20);
    assert_eq!(seed.articles.len(), 8);

    let (status, seed): (_, TagPageSeed) = get_json(app, "/tag-page").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seed.tag, "");
    assert!(seed.articles.is_empty());
}

#[tokio::test]
async fn sidebar_routes_list_tags_and_recommendations() {
    let app = test_app(3).await;
    let (status, tags): (_, Vec<TagSummary>) = get_json(app.clone(), "/tag").await;
    assert_eq!(status, StatusCode::OK);
    let values: Vec<_> = tags.iter().map(|t| t.value.as_str()).collect();
    assert_eq!(values, vec!["c++", "go"]);

    let (status, articles): (_, Vec<Article>) =
        get_json(app, "/article/recommend?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(articles.len(), 2);
}
