use serde::{Deserialize, Serialize};

use crate::domain::{Article, ArticleStatus, INITIAL_PAGE_SIZE, PAGE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: u32,
    pub page_size: u32,
    #[serde(default)]
    pub status: ArticleStatus,
}

impl PageQuery {
    /// Query issued by the server-side prefetch of a tag page.
    pub fn initial() -> Self {
        Self {
            page: 1,
            page_size: INITIAL_PAGE_SIZE,
            status: ArticleStatus::Publish,
        }
    }

    /// Query issued by the client for any page after the first.
    pub fn client_page(page: u32) -> Self {
        Self {
            page,
            page_size: PAGE_SIZE,
            status: ArticleStatus::Publish,
        }
    }
}

/// One page of a tag listing plus the full match count, on the wire as
/// `[articles, total]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ArticlePage(pub Vec<Article>, pub u64);

impl ArticlePage {
    pub fn articles(&self) -> &[Article] {
        &self.0
    }

    pub fn total(&self) -> u64 {
        self.1
    }

    pub fn into_parts(self) -> (Vec<Article>, u64) {
        (self.0, self.1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TagPageSeed {
    pub articles: Vec<Article>,
    pub total: u64,
    pub tag: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecommendQuery {
    #[serde(default)]
    pub limit: Option<u32>,
}
