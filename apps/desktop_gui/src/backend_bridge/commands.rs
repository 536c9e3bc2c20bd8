//! Backend commands queued from UI to backend worker.

use client_core::PageFetch;

pub enum BackendCommand {
    /// Fetches the prefetched first page of a tag. `None` lets the server
    /// pick its default tag.
    LoadTag {
        request_id: u64,
        tag: Option<String>,
    },
    LoadNextPage(PageFetch),
    LoadSidebar,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::LoadTag { .. } => "load_tag",
            BackendCommand::LoadNextPage(_) => "load_next_page",
            BackendCommand::LoadSidebar => "load_sidebar",
        }
    }
}
