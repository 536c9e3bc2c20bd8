use client_core::{
    InfiniteScrollTrigger, ScrollMetrics, ScrollObserver, SidebarData, TagPageController,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::Article;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiError, UiEvent},
    orchestration::dispatch_backend_command,
};

const ASIDE_WIDTH: f32 = 280.0;

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub server_url: String,
    pub tag: Option<String>,
}

pub struct BlogReaderApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    server_url: String,
    /// Id of the newest `LoadTag` request; older seeds are ignored.
    seed_request: u64,
    page: Option<TagPageController>,
    scroll: ScrollObserver,
    last_offset: Option<f32>,
    trigger: InfiniteScrollTrigger,
    sidebar: Option<SidebarData>,
    status: String,
    status_banner: Option<UiError>,
}

impl BlogReaderApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: StartupConfig,
    ) -> Self {
        let mut app = Self {
            cmd_tx,
            ui_rx,
            server_url: startup.server_url,
            seed_request: 0,
            page: None,
            scroll: ScrollObserver::new(),
            last_offset: None,
            trigger: InfiniteScrollTrigger::default(),
            sidebar: None,
            status: String::new(),
            status_banner: None,
        };
        app.open_tag(startup.tag);
        app.dispatch(BackendCommand::LoadSidebar);
        app
    }

    fn dispatch(&mut self, cmd: BackendCommand) -> bool {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status)
    }

    fn open_tag(&mut self, tag: Option<String>) {
        self.seed_request += 1;
        self.status = match &tag {
            Some(tag) => format!("Opening {tag}..."),
            None => "Opening default tag...".to_string(),
        };
        self.dispatch(BackendCommand::LoadTag {
            request_id: self.seed_request,
            tag,
        });
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::SeedLoaded { request_id, seed } => {
                    if request_id != self.seed_request {
                        tracing::debug!(tag = %seed.tag, "ignoring superseded tag seed");
                        continue;
                    }
                    self.status = format!("{} articles tagged {}", seed.total, seed.tag);
                    self.status_banner = None;
                    match self.page.as_mut() {
                        Some(page) => page.reseed(seed),
                        None => {
                            let mut page = TagPageController::new(seed);
                            page.mount(&self.scroll);
                            self.page = Some(page);
                        }
                    }
                    self.last_offset = None;
                }
                UiEvent::PageLoaded { fetch, result } => {
                    if let Some(page) = self.page.as_mut() {
                        page.complete_page(fetch, result);
                    }
                }
                UiEvent::SidebarLoaded(sidebar) => {
                    self.sidebar = Some(sidebar);
                }
                UiEvent::Error(err) => {
                    tracing::warn!(context = ?err.context(), "{}", err.message());
                    self.status = err.summary();
                    self.status_banner = Some(err);
                }
            }
        }
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        let tags: Vec<(String, String)> = self
            .sidebar
            .as_ref()
            .map(|sidebar| {
                sidebar
                    .tags
                    .iter()
                    .map(|tag| (tag.label.clone(), tag.value.clone()))
                    .collect()
            })
            .unwrap_or_default();
        let current = self.page.as_ref().map(|page| page.tag().to_string());

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.heading("Blog");
                ui.separator();
                let mut picked = None;
                for (label, value) in &tags {
                    let selected = current.as_deref() == Some(value.as_str());
                    if ui.selectable_label(selected, label).clicked() && !selected {
                        picked = Some(value.clone());
                    }
                }
                if let Some(tag) = picked {
                    self.open_tag(Some(tag));
                }
            });
            if let Some(err) = &self.status_banner {
                ui.colored_label(ui.visuals().error_fg_color, err.summary());
            }
        });
    }

    fn show_aside(&mut self, ctx: &egui::Context) {
        let affixed = self.page.as_ref().is_some_and(TagPageController::is_affixed);
        let mut picked = None;

        egui::SidePanel::right("aside")
            .resizable(false)
            .exact_width(ASIDE_WIDTH)
            .show(ctx, |ui| {
                let mut frame = egui::Frame::group(ui.style());
                if affixed {
                    frame = frame
                        .fill(ui.visuals().faint_bg_color)
                        .stroke(ui.visuals().selection.stroke);
                }
                frame.show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    if affixed {
                        ui.small("pinned");
                    }
                    let Some(sidebar) = &self.sidebar else {
                        ui.add(egui::Spinner::new());
                        return;
                    };

                    ui.strong("Recommended");
                    for article in &sidebar.recommended {
                        ui.label(&article.title);
                        ui.small(format!("{} views", article.views));
                    }
                    ui.separator();

                    ui.strong("Tags");
                    ui.horizontal_wrapped(|ui| {
                        for tag in &sidebar.tags {
                            let text = format!("{} ({})", tag.label, tag.article_count);
                            if ui.link(text).clicked() {
                                picked = Some(tag.value.clone());
                            }
                        }
                    });
                    ui.separator();

                    ui.small(format!("Reading from {}", self.server_url));
                });
            });

        if let Some(tag) = picked {
            self.open_tag(Some(tag));
        }
    }

    fn show_listing(&mut self, ctx: &egui::Context) {
        let mut fetch = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(page) = self.page.as_mut() else {
                ui.centered_and_justified(|ui| {
                    ui.label(&self.status);
                });
                return;
            };

            ui.horizontal(|ui| {
                ui.heading(page.tag());
                ui.weak(format!("{} of {}", page.articles().len(), page.total()));
            });
            ui.separator();

            let output = egui::ScrollArea::vertical()
                .id_salt("tag-listing")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for article in page.articles() {
                        article_card(ui, article);
                    }
                    if page.is_loading() {
                        ui.horizontal(|ui| {
                            ui.add(egui::Spinner::new());
                            ui.label("Fetching articles...");
                        });
                    }
                    if let Some(message) = page.load_error() {
                        ui.colored_label(ui.visuals().warn_fg_color, message);
                    }
                    if !page.has_more() && !page.articles().is_empty() {
                        ui.weak("No more articles");
                    }
                });

            let offset_y = output.state.offset.y;
            if self.last_offset != Some(offset_y) {
                self.last_offset = Some(offset_y);
                self.scroll.publish(offset_y);
            }
            page.poll_scroll();

            let metrics = ScrollMetrics {
                offset_y,
                viewport_height: output.inner_rect.height(),
                content_height: output.content_size.y,
            };
            if self.trigger.should_load(metrics, page.has_more()) {
                fetch = page.begin_next_page();
            }
        });

        if let Some(fetch) = fetch {
            if !self.dispatch(BackendCommand::LoadNextPage(fetch.clone())) {
                if let Some(page) = self.page.as_mut() {
                    page.abandon_page(fetch);
                }
            }
        }
    }
}

fn article_card(ui: &mut egui::Ui, article: &Article) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.label(egui::RichText::new(&article.title).strong().size(16.0));
        if !article.summary.is_empty() {
            ui.label(&article.summary);
        }
        ui.horizontal_wrapped(|ui| {
            ui.weak(article.publish_at.format("%Y-%m-%d").to_string());
            ui.weak(format!("{} views", article.views));
            for tag in &article.tags {
                ui.small(format!("#{tag}"));
            }
        });
    });
    ui.add_space(6.0);
}

impl eframe::App for BlogReaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        self.show_header(ctx);
        self.show_aside(ctx);
        self.show_listing(ctx);

        let loading = self.page.as_ref().is_some_and(TagPageController::is_loading);
        if loading {
            ctx.request_repaint_after(std::time::Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
