/// Distance from the end of the list, in pixels, at which the next page is
/// requested.
pub const DEFAULT_LOAD_THRESHOLD: f32 = 250.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub offset_y: f32,
    pub viewport_height: f32,
    pub content_height: f32,
}

impl ScrollMetrics {
    /// Content left below the bottom edge of the viewport.
    pub fn remaining(&self) -> f32 {
        (self.content_height - self.offset_y - self.viewport_height).max(0.0)
    }
}

/// Decides when the reader is close enough to the end of the rendered list
/// that another page should be loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfiniteScrollTrigger {
    threshold: f32,
}

impl InfiniteScrollTrigger {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.max(0.0),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn should_load(&self, metrics: ScrollMetrics, has_more: bool) -> bool {
        has_more && metrics.remaining() < self.threshold
    }
}

impl Default for InfiniteScrollTrigger {
    fn default() -> Self {
        Self::new(DEFAULT_LOAD_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(offset_y: f32) -> ScrollMetrics {
        ScrollMetrics {
            offset_y,
            viewport_height: 600.0,
            content_height: 2000.0,
        }
    }

    #[test]
    fn fires_only_within_threshold_of_the_end() {
        let trigger = InfiniteScrollTrigger::default();
        assert!(!trigger.should_load(metrics(0.0), true));
        assert!(!trigger.should_load(metrics(1150.0), true));
        assert!(trigger.should_load(metrics(1151.0), true));
        assert!(trigger.should_load(metrics(1400.0), true));
    }

    #[test]
    fn never_fires_without_more_pages() {
        let trigger = InfiniteScrollTrigger::default();
        assert!(!trigger.should_load(metrics(1400.0), false));
    }

    #[test]
    fn short_content_fills_viewport() {
        let trigger = InfiniteScrollTrigger::default();
        let short = ScrollMetrics {
            offset_y: 0.0,
            viewport_height: 900.0,
            content_height: 300.0,
        };
        assert_eq!(short.remaining(), 0.0);
        assert!(trigger.should_load(short, true));
    }
}
