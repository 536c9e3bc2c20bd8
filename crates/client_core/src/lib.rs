pub mod controller;
pub mod error;
pub mod provider;
pub mod scroll;
pub mod sidebar;
pub mod trigger;

pub use controller::{PageFetch, PageOutcome, PaginationConfig, TagPageController, TagPageState};
pub use error::ProviderError;
pub use provider::{ArticleProvider, HttpArticleProvider};
pub use scroll::{ScrollObserver, ScrollSubscription};
pub use sidebar::{load_sidebar, SidebarData};
pub use trigger::{InfiniteScrollTrigger, ScrollMetrics};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
