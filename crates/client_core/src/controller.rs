//! Pagination state for a single tag listing page.
//!
//! The controller is owned by one view. It is seeded with the
//! server-prefetched first page and grows strictly by appending client-loaded
//! pages. Fetches are split into [`TagPageController::begin_next_page`] and
//! [`TagPageController::complete_page`] so that the view can run the provider
//! call wherever its runtime lives and hand the result back later.

use std::time::{Duration, Instant};

use shared::{
    domain::{Article, AFFIX_OFFSET, PAGE_SIZE},
    protocol::{ArticlePage, PageQuery, TagPageSeed},
};
use tracing::{debug, info, warn};

use crate::{
    error::ProviderError,
    provider::ArticleProvider,
    scroll::{ScrollObserver, ScrollSubscription},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    /// Delay before the first retry after a failed page load. Doubles per
    /// consecutive failure. Zero disables backoff.
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
    /// Consecutive failures after which [`TagPageController::load_error`]
    /// reports a message.
    pub failure_banner_threshold: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            retry_base_delay: Duration::from_millis(500),
            retry_max_delay: Duration::from_secs(8),
            failure_banner_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagPageState {
    pub tag: String,
    pub page: u32,
    pub total: u64,
    pub articles: Vec<Article>,
    pub is_affixed: bool,
}

/// A page load handed out by [`TagPageController::begin_next_page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFetch {
    pub tag: String,
    pub page: u32,
    generation: u64,
}

impl PageFetch {
    pub fn query(&self) -> PageQuery {
        PageQuery::client_page(self.page)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Appended { page: u32, added: usize },
    Failed { consecutive_failures: u32 },
    /// The result belonged to a previous tag or an unmounted view.
    Discarded,
    /// No fetch was issued.
    Skipped,
}

#[derive(Debug)]
pub struct TagPageController {
    state: TagPageState,
    config: PaginationConfig,
    generation: u64,
    mounted: bool,
    in_flight: bool,
    consecutive_failures: u32,
    retry_not_before: Option<Instant>,
    scroll: Option<ScrollSubscription>,
}

impl TagPageController {
    pub fn new(seed: TagPageSeed) -> Self {
        Self::with_config(seed, PaginationConfig::default())
    }

    pub fn with_config(seed: TagPageSeed, config: PaginationConfig) -> Self {
        let mut controller = Self {
            state: TagPageState::default(),
            config,
            generation: 0,
            mounted: true,
            in_flight: false,
            consecutive_failures: 0,
            retry_not_before: None,
            scroll: None,
        };
        controller.initialize(seed.tag, seed.articles, seed.total);
        controller
    }

    /// Resets the page to a freshly prefetched seed. Any fetch still in
    /// flight for the previous state is discarded when it completes. An
    /// unmounted controller stays unmounted until [`Self::mount`].
    pub fn initialize(&mut self, tag: impl Into<String>, articles: Vec<Article>, total: u64) {
        self.generation += 1;
        self.state.tag = tag.into();
        self.state.page = 1;
        self.state.total = total;
        self.state.articles = articles;
        self.in_flight = false;
        self.consecutive_failures = 0;
        self.retry_not_before = None;
        info!(
            tag = %self.state.tag,
            total,
            seeded = self.state.articles.len(),
            "tag page initialized"
        );
    }

    pub fn reseed(&mut self, seed: TagPageSeed) {
        self.initialize(seed.tag, seed.articles, seed.total);
    }

    /// Subscribes to `observer`. The subscription is released by
    /// [`Self::unmount`] or when the controller is dropped.
    pub fn mount(&mut self, observer: &ScrollObserver) {
        self.scroll = Some(observer.subscribe());
        self.mounted = true;
    }

    pub fn unmount(&mut self) {
        self.scroll = None;
        self.mounted = false;
        self.in_flight = false;
        self.generation += 1;
        debug!(tag = %self.state.tag, "tag page unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Applies the newest offset from the scroll subscription. Returns false
    /// when nothing was published since the last poll.
    pub fn poll_scroll(&mut self) -> bool {
        let Some(offset_y) = self.scroll.as_mut().and_then(ScrollSubscription::take_latest) else {
            return false;
        };
        self.on_scroll(offset_y);
        true
    }

    pub fn on_scroll(&mut self, offset_y: f32) {
        self.state.is_affixed = offset_y > AFFIX_OFFSET;
    }

    /// Computed with the client page size even though the seed page was
    /// smaller.
    pub fn has_more(&self) -> bool {
        u64::from(self.state.page) * u64::from(PAGE_SIZE) < self.state.total
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub fn begin_next_page(&mut self) -> Option<PageFetch> {
        self.begin_next_page_at(Instant::now())
    }

    pub fn begin_next_page_at(&mut self, now: Instant) -> Option<PageFetch> {
        if !self.mounted || self.in_flight || !self.has_more() {
            return None;
        }
        if let Some(not_before) = self.retry_not_before {
            if now < not_before {
                debug!(tag = %self.state.tag, "next page held back by retry backoff");
                return None;
            }
        }

        self.in_flight = true;
        let fetch = PageFetch {
            tag: self.state.tag.clone(),
            page: self.state.page + 1,
            generation: self.generation,
        };
        debug!(tag = %fetch.tag, page = fetch.page, "requesting next page");
        Some(fetch)
    }

    pub fn complete_page(
        &mut self,
        fetch: PageFetch,
        result: Result<ArticlePage, ProviderError>,
    ) -> PageOutcome {
        self.complete_page_at(fetch, result, Instant::now())
    }

    pub fn complete_page_at(
        &mut self,
        fetch: PageFetch,
        result: Result<ArticlePage, ProviderError>,
        now: Instant,
    ) -> PageOutcome {
        if !self.is_current(&fetch) {
            debug!(tag = %fetch.tag, page = fetch.page, "discarding stale page result");
            return PageOutcome::Discarded;
        }
        self.in_flight = false;

        match result {
            Ok(page) => {
                // `total` stays as seeded; the page's own count is ignored.
                let (articles, _) = page.into_parts();
                let added = articles.len();
                self.state.articles.extend(articles);
                self.state.page = fetch.page;
                self.consecutive_failures = 0;
                self.retry_not_before = None;
                debug!(
                    tag = %fetch.tag,
                    page = fetch.page,
                    added,
                    loaded = self.state.articles.len(),
                    "appended page"
                );
                PageOutcome::Appended {
                    page: fetch.page,
                    added,
                }
            }
            Err(err) => {
                self.consecutive_failures += 1;
                let delay = self.backoff_delay();
                self.retry_not_before = (!delay.is_zero()).then(|| now + delay);
                warn!(
                    tag = %fetch.tag,
                    page = fetch.page,
                    error = %err,
                    failures = self.consecutive_failures,
                    retry_in_ms = delay.as_millis() as u64,
                    "failed to load next page"
                );
                PageOutcome::Failed {
                    consecutive_failures: self.consecutive_failures,
                }
            }
        }
    }

    /// Releases the in-flight slot of a fetch that was never sent.
    pub fn abandon_page(&mut self, fetch: PageFetch) {
        if self.is_current(&fetch) {
            self.in_flight = false;
        }
    }

    /// Only the fetch handed out for the next page of the current generation
    /// may settle the in-flight slot, and only once.
    fn is_current(&self, fetch: &PageFetch) -> bool {
        self.mounted
            && self.in_flight
            && fetch.generation == self.generation
            && fetch.page == self.state.page + 1
    }

    /// Issues and applies the next page load in one step.
    pub async fn request_next_page<P>(&mut self, provider: &P) -> PageOutcome
    where
        P: ArticleProvider + ?Sized,
    {
        let Some(fetch) = self.begin_next_page() else {
            return PageOutcome::Skipped;
        };
        let result = provider.articles_by_tag(&fetch.tag, fetch.query()).await;
        self.complete_page(fetch, result)
    }

    pub fn load_error(&self) -> Option<String> {
        let threshold = self.config.failure_banner_threshold.max(1);
        (self.consecutive_failures >= threshold).then(|| {
            format!(
                "Could not load more articles for \"{}\" after {} attempts. Keep scrolling to retry.",
                self.state.tag, self.consecutive_failures
            )
        })
    }

    fn backoff_delay(&self) -> Duration {
        let exponent = self.consecutive_failures.saturating_sub(1);
        let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.config
            .retry_base_delay
            .saturating_mul(factor)
            .min(self.config.retry_max_delay)
    }

    pub fn state(&self) -> &TagPageState {
        &self.state
    }

    pub fn tag(&self) -> &str {
        &self.state.tag
    }

    pub fn page(&self) -> u32 {
        self.state.page
    }

    pub fn total(&self) -> u64 {
        self.state.total
    }

    pub fn articles(&self) -> &[Article] {
        &self.state.articles
    }

    pub fn is_affixed(&self) -> bool {
        self.state.is_affixed
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
