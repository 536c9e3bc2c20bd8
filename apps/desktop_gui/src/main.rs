mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::{BlogReaderApp, StartupConfig};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "BLOG_SERVER_URL", default_value = "http://127.0.0.1:8443")]
    server_url: String,
    /// Tag to open first. The server default applies when omitted.
    #[arg(long)]
    tag: Option<String>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(args.server_url.clone(), cmd_rx, ui_tx);

    let startup = StartupConfig {
        server_url: args.server_url,
        tag: args.tag,
    };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Blog Reader")
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Blog Reader",
        options,
        Box::new(|_cc| Ok(Box::new(BlogReaderApp::new(cmd_tx, ui_rx, startup)))),
    )
}
