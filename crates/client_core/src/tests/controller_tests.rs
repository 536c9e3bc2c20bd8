use super::*;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use shared::domain::{ArticleId, ArticleStatus, TagSummary};
use std::{collections::VecDeque, sync::Mutex};
use uuid::Uuid;

fn article(n: u128) -> Article {
    Article {
        id: ArticleId(Uuid::from_u128(n)),
        title: format!("article-{n}"),
        summary: String::new(),
        cover: None,
        tags: vec!["go".into()],
        views: 0,
        status: ArticleStatus::Publish,
        publish_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn articles(range: std::ops::Range<u128>) -> Vec<Article> {
    range.map(article).collect()
}

fn seed(tag: &str, articles: Vec<Article>, total: u64) -> TagPageSeed {
    TagPageSeed {
        articles,
        total,
        tag: tag.to_string(),
    }
}

fn no_backoff() -> PaginationConfig {
    PaginationConfig {
        retry_base_delay: Duration::ZERO,
        ..PaginationConfig::default()
    }
}

fn unavailable() -> ProviderError {
    ProviderError::Status {
        status: 503,
        url: "http://blog.test/article/tag/go".into(),
    }
}

#[derive(Default)]
struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<ArticlePage, ProviderError>>>,
    calls: Mutex<Vec<(String, PageQuery)>>,
}

impl ScriptedProvider {
    fn with(responses: Vec<Result<ArticlePage, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, PageQuery)> {
        self.calls.lock().expect("calls").clone()
    }
}

#[async_trait]
impl ArticleProvider for ScriptedProvider {
    async fn articles_by_tag(
        &self,
        tag: &str,
        query: PageQuery,
    ) -> Result<ArticlePage, ProviderError> {
        self.calls
            .lock()
            .expect("calls")
            .push((tag.to_string(), query));
        self.responses
            .lock()
            .expect("responses")
            .pop_front()
            .unwrap_or_else(|| Err(unavailable()))
    }

    async fn tag_page_seed(&self, _tag: Option<&str>) -> Result<TagPageSeed, ProviderError> {
        Err(unavailable())
    }

    async fn recommended_articles(&self, _limit: u32) -> Result<Vec<Article>, ProviderError> {
        Ok(Vec::new())
    }

    async fn tags(&self) -> Result<Vec<TagSummary>, ProviderError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn go_seed_then_single_page_exhausts_listing() {
    let mut controller = TagPageController::new(seed("go", articles(0..8), 20));
    assert_eq!(controller.page(), 1);
    assert!(controller.has_more());

    let provider = ScriptedProvider::with(vec![Ok(ArticlePage(articles(8..20), 20))]);
    let outcome = controller.request_next_page(&provider).await;

    assert_eq!(outcome, PageOutcome::Appended { page: 2, added: 12 });
    assert_eq!(controller.page(), 2);
    assert_eq!(controller.articles().len(), 20);
    assert!(!controller.has_more());
    assert_eq!(
        provider.calls(),
        vec![(
            "go".to_string(),
            PageQuery {
                page: 2,
                page_size: 12,
                status: ArticleStatus::Publish,
            }
        )]
    );
}

#[tokio::test]
async fn failed_fetch_leaves_state_untouched_and_retry_succeeds() {
    let mut controller = TagPageController::with_config(seed("go", articles(0..8), 20), no_backoff());
    let provider = ScriptedProvider::with(vec![
        Err(unavailable()),
        Ok(ArticlePage(articles(8..20), 20)),
    ]);

    let outcome = controller.request_next_page(&provider).await;
    assert_eq!(
        outcome,
        PageOutcome::Failed {
            consecutive_failures: 1
        }
    );
    assert_eq!(controller.page(), 1);
    assert_eq!(controller.articles(), articles(0..8).as_slice());
    assert!(controller.has_more());
    assert!(!controller.is_loading());

    let outcome = controller.request_next_page(&provider).await;
    assert_eq!(outcome, PageOutcome::Appended { page: 2, added: 12 });
    assert_eq!(controller.consecutive_failures(), 0);
    let pages: Vec<u32> = provider.calls().iter().map(|(_, q)| q.page).collect();
    assert_eq!(pages, vec![2, 2]);
}

#[tokio::test]
async fn appended_batches_keep_load_order() {
    let mut controller = TagPageController::new(seed("go", articles(0..8), 100));
    let provider = ScriptedProvider::with(vec![
        Ok(ArticlePage(articles(8..20), 100)),
        Ok(ArticlePage(articles(20..32), 100)),
        Ok(ArticlePage(articles(32..37), 100)),
    ]);

    let mut lengths = vec![controller.articles().len()];
    for _ in 0..3 {
        controller.request_next_page(&provider).await;
        lengths.push(controller.articles().len());
    }

    assert_eq!(lengths, vec![8, 20, 32, 37]);
    assert_eq!(controller.articles(), articles(0..37).as_slice());
    assert_eq!(controller.page(), 4);
}

#[test]
fn has_more_uses_client_page_size() {
    let exact = TagPageController::new(seed("go", articles(0..8), 12));
    assert!(!exact.has_more(), "1 * 12 >= 12 even though only 8 are loaded");

    let one_over = TagPageController::new(seed("go", articles(0..8), 13));
    assert!(one_over.has_more());

    let empty = TagPageController::new(seed("", Vec::new(), 0));
    assert!(!empty.has_more());
}

#[tokio::test]
async fn no_fetch_once_listing_is_exhausted() {
    let mut controller = TagPageController::new(seed("go", articles(0..8), 8));
    let provider = ScriptedProvider::default();

    assert_eq!(controller.request_next_page(&provider).await, PageOutcome::Skipped);
    assert!(controller.begin_next_page().is_none());
    assert!(provider.calls().is_empty());
}

#[test]
fn affix_threshold_is_strictly_greater_than_100() {
    let mut controller = TagPageController::new(seed("go", Vec::new(), 0));
    controller.on_scroll(100.0);
    assert!(!controller.is_affixed());
    controller.on_scroll(101.0);
    assert!(controller.is_affixed());
    controller.on_scroll(101.0);
    assert!(controller.is_affixed());
    controller.on_scroll(100.5);
    assert!(controller.is_affixed());
    controller.on_scroll(0.0);
    assert!(!controller.is_affixed());
}

#[tokio::test]
async fn initialize_replaces_previous_tag_state() {
    let mut controller = TagPageController::new(seed("go", articles(0..8), 40));
    let provider = ScriptedProvider::with(vec![Ok(ArticlePage(articles(8..20), 40))]);
    controller.request_next_page(&provider).await;
    assert_eq!(controller.page(), 2);

    controller.initialize("rust", articles(100..103), 3);
    assert_eq!(controller.tag(), "rust");
    assert_eq!(controller.page(), 1);
    assert_eq!(controller.total(), 3);
    assert_eq!(controller.articles(), articles(100..103).as_slice());
}

#[test]
fn only_one_page_is_in_flight_at_a_time() {
    let mut controller = TagPageController::new(seed("go", articles(0..8), 50));
    let fetch = controller.begin_next_page().expect("first fetch");
    assert_eq!(fetch.page, 2);
    assert!(controller.is_loading());
    assert!(controller.begin_next_page().is_none());

    controller.complete_page(fetch, Ok(ArticlePage(articles(8..20), 50)));
    let next = controller.begin_next_page().expect("second fetch");
    assert_eq!(next.page, 3);
}

#[test]
fn completing_the_same_fetch_twice_appends_once() {
    let mut controller = TagPageController::new(seed("go", articles(0..8), 50));
    let fetch = controller.begin_next_page().expect("fetch");

    let first = controller.complete_page(fetch.clone(), Ok(ArticlePage(articles(8..20), 50)));
    let second = controller.complete_page(fetch, Ok(ArticlePage(articles(8..20), 50)));

    assert_eq!(first, PageOutcome::Appended { page: 2, added: 12 });
    assert_eq!(second, PageOutcome::Discarded);
    assert_eq!(controller.page(), 2);
    assert_eq!(controller.articles(), articles(0..20).as_slice());
}

#[test]
fn late_duplicate_does_not_settle_the_next_fetch() {
    let mut controller = TagPageController::new(seed("go", articles(0..8), 50));
    let page_two = controller.begin_next_page().expect("page 2");
    controller.complete_page(page_two.clone(), Ok(ArticlePage(articles(8..20), 50)));
    let page_three = controller.begin_next_page().expect("page 3");

    let duplicate = controller.complete_page(page_two, Ok(ArticlePage(articles(8..20), 50)));
    assert_eq!(duplicate, PageOutcome::Discarded);
    assert!(controller.is_loading());
    assert_eq!(controller.articles().len(), 20);

    let outcome = controller.complete_page(page_three, Ok(ArticlePage(articles(20..32), 50)));
    assert_eq!(outcome, PageOutcome::Appended { page: 3, added: 12 });
}

#[test]
fn initialize_after_unmount_waits_for_mount() {
    let observer = ScrollObserver::new();
    let mut controller = TagPageController::new(seed("go", articles(0..8), 50));
    controller.mount(&observer);
    controller.unmount();

    controller.initialize("rust", articles(100..108), 30);
    assert!(!controller.is_mounted());
    assert!(controller.begin_next_page().is_none());

    controller.mount(&observer);
    observer.publish(150.0);
    assert!(controller.poll_scroll());
    assert!(controller.is_affixed());
    assert_eq!(controller.begin_next_page().map(|f| f.page), Some(2));
}

#[test]
fn abandoned_fetch_frees_the_slot() {
    let mut controller = TagPageController::new(seed("go", articles(0..8), 50));
    let fetch = controller.begin_next_page().expect("fetch");
    controller.abandon_page(fetch);
    assert!(!controller.is_loading());
    assert_eq!(controller.page(), 1);
    assert_eq!(controller.begin_next_page().map(|f| f.page), Some(2));
}

#[test]
fn result_for_previous_tag_is_discarded() {
    let mut controller = TagPageController::new(seed("go", articles(0..8), 50));
    let stale = controller.begin_next_page().expect("fetch");

    controller.reseed(seed("rust", articles(100..108), 30));
    let outcome = controller.complete_page(stale, Ok(ArticlePage(articles(8..20), 50)));

    assert_eq!(outcome, PageOutcome::Discarded);
    assert_eq!(controller.articles(), articles(100..108).as_slice());
    assert_eq!(controller.page(), 1);
    let fresh = controller.begin_next_page().expect("new tag can load");
    assert_eq!(fresh.tag, "rust");
}

#[test]
fn page_total_does_not_replace_seeded_total() {
    let mut controller = TagPageController::new(seed("go", articles(0..8), 30));
    let fetch = controller.begin_next_page().expect("fetch");
    controller.complete_page(fetch, Ok(ArticlePage(articles(8..20), 500)));
    assert_eq!(controller.total(), 30);
}

#[test]
fn unmount_releases_scroll_subscription_and_drops_late_results() {
    let observer = ScrollObserver::new();
    let mut controller = TagPageController::new(seed("go", articles(0..8), 50));
    controller.mount(&observer);
    assert_eq!(observer.listener_count(), 1);

    let fetch = controller.begin_next_page().expect("fetch");
    controller.unmount();
    assert_eq!(observer.listener_count(), 0);
    assert!(!controller.is_mounted());

    let outcome = controller.complete_page(fetch, Ok(ArticlePage(articles(8..20), 50)));
    assert_eq!(outcome, PageOutcome::Discarded);
    assert_eq!(controller.articles().len(), 8);
    assert!(controller.begin_next_page().is_none());
}

#[test]
fn poll_scroll_applies_latest_published_offset() {
    let observer = ScrollObserver::new();
    let mut controller = TagPageController::new(seed("go", Vec::new(), 0));
    assert!(!controller.poll_scroll(), "not subscribed yet");

    controller.mount(&observer);
    observer.publish(20.0);
    observer.publish(240.0);
    assert!(controller.poll_scroll());
    assert!(controller.is_affixed());
    assert!(!controller.poll_scroll());

    observer.publish(80.0);
    assert!(controller.poll_scroll());
    assert!(!controller.is_affixed());
}

#[test]
fn failures_back_off_exponentially() {
    let mut controller = TagPageController::new(seed("go", articles(0..8), 50));
    let start = Instant::now();

    let fetch = controller.begin_next_page_at(start).expect("fetch");
    controller.complete_page_at(fetch, Err(unavailable()), start);
    assert!(controller
        .begin_next_page_at(start + Duration::from_millis(499))
        .is_none());

    let retry_at = start + Duration::from_millis(500);
    let fetch = controller.begin_next_page_at(retry_at).expect("first retry");
    controller.complete_page_at(fetch, Err(unavailable()), retry_at);
    assert!(controller
        .begin_next_page_at(retry_at + Duration::from_millis(999))
        .is_none());
    assert!(controller
        .begin_next_page_at(retry_at + Duration::from_secs(1))
        .is_some());
}

#[test]
fn backoff_is_capped() {
    let config = PaginationConfig {
        retry_base_delay: Duration::from_secs(1),
        retry_max_delay: Duration::from_secs(4),
        failure_banner_threshold: 3,
    };
    let mut controller = TagPageController::with_config(seed("go", articles(0..8), 50), config);
    let mut now = Instant::now();
    for _ in 0..6 {
        let fetch = controller.begin_next_page_at(now).expect("fetch");
        controller.complete_page_at(fetch, Err(unavailable()), now);
        now += Duration::from_secs(4);
    }
    assert_eq!(controller.consecutive_failures(), 6);
}

#[tokio::test]
async fn repeated_failures_surface_inline_error_until_success() {
    let mut controller = TagPageController::with_config(seed("go", articles(0..8), 50), no_backoff());
    let provider = ScriptedProvider::with(vec![
        Err(unavailable()),
        Err(unavailable()),
        Err(unavailable()),
        Ok(ArticlePage(articles(8..20), 50)),
    ]);

    controller.request_next_page(&provider).await;
    controller.request_next_page(&provider).await;
    assert!(controller.load_error().is_none());

    controller.request_next_page(&provider).await;
    let message = controller.load_error().expect("banner");
    assert!(message.contains("\"go\""));
    assert!(message.contains("3 attempts"));

    controller.request_next_page(&provider).await;
    assert!(controller.load_error().is_none());
    assert_eq!(controller.page(), 2);
}
