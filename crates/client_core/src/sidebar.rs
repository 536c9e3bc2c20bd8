use shared::domain::{Article, TagSummary};

use crate::{error::ProviderError, provider::ArticleProvider};

pub const RECOMMEND_LIMIT: u32 = 6;

/// Data behind the tag page aside: recommended reading and the tag cloud.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SidebarData {
    pub recommended: Vec<Article>,
    pub tags: Vec<TagSummary>,
}

pub async fn load_sidebar<P>(provider: &P) -> Result<SidebarData, ProviderError>
where
    P: ArticleProvider + ?Sized,
{
    let (recommended, tags) = futures::try_join!(
        provider.recommended_articles(RECOMMEND_LIMIT),
        provider.tags()
    )?;
    Ok(SidebarData { recommended, tags })
}
