use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use server_api::{articles_by_tag, list_tags, recommended_articles, tag_page_seed, ApiContext};
use shared::{
    domain::{Article, ArticleStatus, TagSummary, PAGE_SIZE},
    error::{ApiError, ErrorCode},
    protocol::{ArticlePage, PageQuery, RecommendQuery, TagPageSeed},
};
use storage::Storage;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, prepare_database_url};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagPageParams {
    page: Option<u32>,
    page_size: Option<u32>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeedParams {
    tag: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .init();

    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(
        %addr,
        public_url = settings.server_public_url.as_deref().unwrap_or("-"),
        "blog server listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/article/tag/:tag", get(http_articles_by_tag))
        .route("/article/recommend", get(http_recommended_articles))
        .route("/tag", get(http_list_tags))
        .route("/tag-page", get(http_tag_page_seed))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.api.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(err) => {
            error!(error = %err, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

async fn http_articles_by_tag(
    State(state): State<Arc<AppState>>,
    Path(tag): Path<String>,
    Query(q): Query<TagPageParams>,
) -> ApiResult<ArticlePage> {
    let status = match q.status.as_deref() {
        None => ArticleStatus::Publish,
        Some(raw) => ArticleStatus::parse(raw).ok_or_else(|| {
            error_response(ApiError::validation(format!("unknown status '{raw}'")))
        })?,
    };
    let query = PageQuery {
        page: q.page.unwrap_or(1),
        page_size: q.page_size.unwrap_or(PAGE_SIZE),
        status,
    };

    let page = articles_by_tag(&state.api, &tag, query)
        .await
        .map_err(error_response)?;
    Ok(Json(page))
}

async fn http_tag_page_seed(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SeedParams>,
) -> ApiResult<TagPageSeed> {
    let seed = tag_page_seed(&state.api, q.tag.as_deref())
        .await
        .map_err(error_response)?;
    info!(tag = %seed.tag, total = seed.total, "prefetched tag page");
    Ok(Json(seed))
}

async fn http_recommended_articles(
    State(state): State<Arc<AppState>>,
    Query(q): Query<RecommendQuery>,
) -> ApiResult<Vec<Article>> {
    let articles = recommended_articles(&state.api, q.limit)
        .await
        .map_err(error_response)?;
    Ok(Json(articles))
}

async fn http_list_tags(State(state): State<Arc<AppState>>) -> ApiResult<Vec<TagSummary>> {
    let tags = list_tags(&state.api).await.map_err(error_response)?;
    Ok(Json(tags))
}

fn error_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
