//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{load_sidebar, ArticleProvider, HttpArticleProvider};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(server_url: String, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("failed to build backend runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        let provider = match HttpArticleProvider::new(&server_url) {
            Ok(provider) => Arc::new(provider),
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_provider(
                    UiErrorContext::BackendStartup,
                    &err,
                )));
                tracing::error!("invalid server url: {err}");
                return;
            }
        };
        tracing::info!(%server_url, "backend worker ready");

        runtime.block_on(async move {
            while let Ok(cmd) = cmd_rx.recv() {
                let provider = Arc::clone(&provider);
                let ui_tx = ui_tx.clone();
                // Each command runs on its own task so a slow sidebar never
                // holds back the next page.
                tokio::spawn(async move {
                    let event = match cmd {
                        BackendCommand::LoadTag { request_id, tag } => {
                            match provider.tag_page_seed(tag.as_deref()).await {
                                Ok(seed) => UiEvent::SeedLoaded { request_id, seed },
                                Err(err) => {
                                    tracing::warn!(?tag, "backend: tag seed failed: {err}");
                                    UiEvent::Error(UiError::from_provider(
                                        UiErrorContext::LoadTag,
                                        &err,
                                    ))
                                }
                            }
                        }
                        BackendCommand::LoadNextPage(fetch) => {
                            let result = provider.articles_by_tag(&fetch.tag, fetch.query()).await;
                            UiEvent::PageLoaded { fetch, result }
                        }
                        BackendCommand::LoadSidebar => match load_sidebar(provider.as_ref()).await {
                            Ok(sidebar) => UiEvent::SidebarLoaded(sidebar),
                            Err(err) => {
                                tracing::warn!("backend: sidebar failed: {err}");
                                UiEvent::Error(UiError::from_provider(
                                    UiErrorContext::Sidebar,
                                    &err,
                                ))
                            }
                        },
                    };
                    let _ = tokio::task::spawn_blocking(move || deliver(&ui_tx, event)).await;
                });
            }
            tracing::debug!("ui command queue closed; backend worker exiting");
        });
    });
}

/// Hands an event to the UI. Page results wait for queue space because the
/// controller keeps its single-flight slot until the result arrives; other
/// events are dropped when the queue is full.
fn deliver(ui_tx: &Sender<UiEvent>, event: UiEvent) -> bool {
    let outcome = match event {
        event @ UiEvent::PageLoaded { .. } => ui_tx.send(event).map_err(|err| err.to_string()),
        event => ui_tx.try_send(event).map_err(|err| err.to_string()),
    };
    match outcome {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!("dropping backend event: {err}");
            false
        }
    }
}
