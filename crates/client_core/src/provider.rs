use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Article, TagSummary},
    error::ApiError,
    protocol::{ArticlePage, PageQuery, TagPageSeed},
};
use tracing::debug;
use url::Url;

use crate::error::ProviderError;

/// Source of tag listings and sidebar data.
#[async_trait]
pub trait ArticleProvider: Send + Sync {
    /// `total` in the returned page is the size of the whole match set,
    /// regardless of the requested page.
    async fn articles_by_tag(&self, tag: &str, query: PageQuery)
        -> Result<ArticlePage, ProviderError>;
    /// Server-prefetched first page of a tag.
    async fn tag_page_seed(&self, tag: Option<&str>) -> Result<TagPageSeed, ProviderError>;
    async fn recommended_articles(&self, limit: u32) -> Result<Vec<Article>, ProviderError>;
    async fn tags(&self) -> Result<Vec<TagSummary>, ProviderError>;
}

#[derive(Clone)]
pub struct HttpArticleProvider {
    http: Client,
    base_url: Url,
}

impl HttpArticleProvider {
    pub fn new(server_url: &str) -> Result<Self, ProviderError> {
        let base_url =
            Url::parse(server_url).map_err(|_| ProviderError::InvalidUrl(server_url.into()))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::InvalidUrl(server_url.into()));
        }
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded path segments to the base url.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        request: RequestBuilder,
    ) -> Result<T, ProviderError> {
        let response = request
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(match response.json::<ApiError>().await {
                Ok(error) => ProviderError::api(status.as_u16(), error),
                Err(_) => ProviderError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                },
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| ProviderError::Decode {
                url: url.to_string(),
                source,
            })
    }
}

#[async_trait]
impl ArticleProvider for HttpArticleProvider {
    async fn articles_by_tag(
        &self,
        tag: &str,
        query: PageQuery,
    ) -> Result<ArticlePage, ProviderError> {
        let url = self.endpoint(&["article", "tag", tag])?;
        debug!(%tag, page = query.page, page_size = query.page_size, "fetching tag page");
        let request = self.http.get(url.clone()).query(&query);
        self.fetch_json(&url, request).await
    }

    async fn tag_page_seed(&self, tag: Option<&str>) -> Result<TagPageSeed, ProviderError> {
        let url = self.endpoint(&["tag-page"])?;
        let mut request = self.http.get(url.clone());
        if let Some(tag) = tag {
            request = request.query(&[("tag", tag)]);
        }
        self.fetch_json(&url, request).await
    }

    async fn recommended_articles(&self, limit: u32) -> Result<Vec<Article>, ProviderError> {
        let url = self.endpoint(&["article", "recommend"])?;
        let request = self.http.get(url.clone()).query(&[("limit", limit)]);
        self.fetch_json(&url, request).await
    }

    async fn tags(&self) -> Result<Vec<TagSummary>, ProviderError> {
        let url = self.endpoint(&["tag"])?;
        let request = self.http.get(url.clone());
        self.fetch_json(&url, request).await
    }
}
