//! UI/backend events and error modeling for the reader window.

use client_core::{PageFetch, ProviderError, SidebarData};
use shared::protocol::{ArticlePage, TagPageSeed};

pub enum UiEvent {
    SeedLoaded {
        request_id: u64,
        seed: TagPageSeed,
    },
    PageLoaded {
        fetch: PageFetch,
        result: Result<ArticlePage, ProviderError>,
    },
    SidebarLoaded(SidebarData),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    Server,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    LoadTag,
    Sidebar,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Unknown,
            context,
            message: message.into(),
        }
    }

    pub fn from_provider(context: UiErrorContext, err: &ProviderError) -> Self {
        let category = match err {
            ProviderError::Transport { .. } => UiErrorCategory::Transport,
            ProviderError::InvalidUrl(_) => UiErrorCategory::Validation,
            ProviderError::Api { status, .. } | ProviderError::Status { status, .. }
                if (400..500).contains(status) =>
            {
                UiErrorCategory::Validation
            }
            ProviderError::Api { .. } | ProviderError::Status { .. } => UiErrorCategory::Server,
            ProviderError::Decode { .. } => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Text for the status banner.
    pub fn summary(&self) -> String {
        let what = match self.context {
            UiErrorContext::BackendStartup => "Reader could not start",
            UiErrorContext::LoadTag => "Could not open tag",
            UiErrorContext::Sidebar => "Could not load sidebar",
        };
        match self.category {
            UiErrorCategory::Transport => {
                format!("{what}: server unreachable; check the URL and network")
            }
            _ => format!("{what}: {}", self.message),
        }
    }
}
