use shared::{
    domain::{Article, TagSummary},
    error::ApiError,
    protocol::{ArticlePage, PageQuery, TagPageSeed},
};
use storage::Storage;
use tracing::warn;

/// Largest page a client may request from the tag listing.
pub const MAX_PAGE_SIZE: u32 = 50;
pub const DEFAULT_RECOMMEND_LIMIT: u32 = 6;
const MAX_RECOMMEND_LIMIT: u32 = 20;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn articles_by_tag(
    ctx: &ApiContext,
    tag: &str,
    query: PageQuery,
) -> Result<ArticlePage, ApiError> {
    if query.page == 0 {
        return Err(ApiError::validation("page must be at least 1"));
    }
    if query.page_size == 0 || query.page_size > MAX_PAGE_SIZE {
        return Err(ApiError::validation(format!(
            "pageSize must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    let (articles, total) = ctx
        .storage
        .articles_by_tag(tag, query.page, query.page_size, query.status)
        .await
        .map_err(internal)?;
    Ok(ArticlePage(articles, total))
}

/// Server-side prefetch for a tag page: the first page with the initial page
/// size. A missing tag is treated as the empty tag.
pub async fn tag_page_seed(ctx: &ApiContext, tag: Option<&str>) -> Result<TagPageSeed, ApiError> {
    let tag = tag.unwrap_or_default().to_string();
    let (articles, total) = articles_by_tag(ctx, &tag, PageQuery::initial())
        .await?
        .into_parts();
    Ok(TagPageSeed {
        articles,
        total,
        tag,
    })
}

pub async fn recommended_articles(
    ctx: &ApiContext,
    limit: Option<u32>,
) -> Result<Vec<Article>, ApiError> {
    let limit = limit
        .unwrap_or(DEFAULT_RECOMMEND_LIMIT)
        .clamp(1, MAX_RECOMMEND_LIMIT);
    ctx.storage
        .recommended_articles(limit)
        .await
        .map_err(internal)
}

pub async fn list_tags(ctx: &ApiContext) -> Result<Vec<TagSummary>, ApiError> {
    ctx.storage.list_tags().await.map_err(internal)
}

fn internal(err: anyhow::Error) -> ApiError {
    warn!(error = %err, "storage request failed");
    ApiError::internal(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use shared::{
        domain::{ArticleStatus, INITIAL_PAGE_SIZE},
        error::ErrorCode,
    };
    use storage::NewArticle;

    async fn setup(go_articles: usize) -> ApiContext {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        storage.create_tag("Go", "go").await.expect("tag");
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        for i in 0..go_articles {
            storage
                .create_article(&NewArticle {
                    title: format!("go-{i}"),
                    summary: String::new(),
                    cover: None,
                    tags: vec!["go".into()],
                    views: i as i64,
                    status: ArticleStatus::Publish,
                    publish_at: base + Duration::hours(i as i64),
                })
                .await
                .expect("article");
        }
        ApiContext { storage }
    }

    #[tokio::test]
    async fn seed_uses_initial_page_size_and_full_total() {
        let ctx = setup(20).await;
        let seed = tag_page_seed(&ctx, Some("go")).await.expect("seed");
        assert_eq!(seed.tag, "go");
        assert_eq!(seed.total, 20);
        assert_eq!(seed.articles.len(), INITIAL_PAGE_SIZE as usize);
    }

    #[tokio::test]
    async fn seed_without_tag_is_empty_tag_page() {
        let ctx = setup(3).await;
        let seed = tag_page_seed(&ctx, None).await.expect("seed");
        assert_eq!(seed.tag, "");
        assert_eq!(seed.total, 0);
        assert!(seed.articles.is_empty());
    }

    #[tokio::test]
    async fn rejects_zero_page_and_oversized_page() {
        let ctx = setup(1).await;
        let err = articles_by_tag(
            &ctx,
            "go",
            PageQuery {
                page: 0,
                ..PageQuery::client_page(1)
            },
        )
        .await
        .expect_err("page 0");
        assert_eq!(err.code, ErrorCode::Validation);

        let err = articles_by_tag(
            &ctx,
            "go",
            PageQuery {
                page_size: MAX_PAGE_SIZE + 1,
                ..PageQuery::client_page(1)
            },
        )
        .await
        .expect_err("too large");
        assert_eq!(err.code, ErrorCode::Validation);
    }

    #[tokio::test]
    async fn client_page_two_returns_remaining_slice() {
        let ctx = setup(20).await;
        let page = articles_by_tag(&ctx, "go", PageQuery::client_page(2))
            .await
            .expect("page");
        assert_eq!(page.total(), 20);
        assert_eq!(page.articles().len(), 8);
    }

    #[tokio::test]
    async fn recommend_limit_is_clamped() {
        let ctx = setup(25).await;
        let articles = recommended_articles(&ctx, Some(500)).await.expect("recommend");
        assert_eq!(articles.len(), MAX_RECOMMEND_LIMIT as usize);
        assert_eq!(articles[0].title, "go-24");

        let articles = recommended_articles(&ctx, None).await.expect("recommend");
        assert_eq!(articles.len(), DEFAULT_RECOMMEND_LIMIT as usize);
    }
}
