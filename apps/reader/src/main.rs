use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use client_core::{
    load_sidebar, ArticleProvider, HttpArticleProvider, PageOutcome, TagPageController,
};
use shared::domain::Article;
use tracing_subscriber::EnvFilter;

/// Prints a tag listing page by page, the way the tag page reveals it.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "BLOG_SERVER_URL", default_value = "http://127.0.0.1:8443")]
    server_url: String,
    /// Tag value to list. The server default applies when omitted.
    tag: Option<String>,
    /// Client pages to load after the prefetched first page.
    #[arg(long, default_value_t = 1)]
    pages: u32,
    #[arg(long)]
    sidebar: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
    let args = Args::parse();

    let provider = HttpArticleProvider::new(&args.server_url)?;
    let seed = provider.tag_page_seed(args.tag.as_deref()).await?;
    let mut controller = TagPageController::new(seed);
    println!(
        "tag={:?} total={} (page 1, {} articles)",
        controller.tag(),
        controller.total(),
        controller.articles().len()
    );
    print_articles(controller.articles());

    let mut loaded = 0;
    while loaded < args.pages {
        let before = controller.articles().len();
        match controller.request_next_page(&provider).await {
            PageOutcome::Appended { page, added } => {
                loaded += 1;
                println!("-- page {page}: {added} more");
                print_articles(&controller.articles()[before..]);
            }
            PageOutcome::Failed { .. } => {
                if let Some(message) = controller.load_error() {
                    bail!(message);
                }
            }
            PageOutcome::Skipped if !controller.has_more() => {
                println!("-- no more articles");
                break;
            }
            // Held back by retry backoff.
            PageOutcome::Skipped => tokio::time::sleep(Duration::from_millis(250)).await,
            PageOutcome::Discarded => break,
        }
    }

    if args.sidebar {
        let sidebar = load_sidebar(&provider).await?;
        println!("recommended:");
        print_articles(&sidebar.recommended);
        println!("tags:");
        for tag in sidebar.tags {
            println!("  {} ({}) {}", tag.label, tag.value, tag.article_count);
        }
    }

    Ok(())
}

fn print_articles(articles: &[Article]) {
    for article in articles {
        println!(
            "  {}  {}  [{}] views={}",
            article.publish_at.format("%Y-%m-%d"),
            article.title,
            article.tags.join(", "),
            article.views
        );
    }
}
