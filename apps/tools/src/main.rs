use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use shared::domain::ArticleStatus;
use storage::{NewArticle, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/blog.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateTag {
        label: String,
        value: String,
    },
    CreateArticle {
        title: String,
        #[arg(long, default_value = "")]
        summary: String,
        #[arg(long)]
        cover: Option<String>,
        #[arg(long = "tag", required = true)]
        tags: Vec<String>,
        #[arg(long, default_value = "publish")]
        status: String,
        #[arg(long, default_value_t = 0)]
        views: i64,
    },
    /// Imports a JSON array of articles.
    Import { path: PathBuf },
    /// Fills a tag with numbered articles, one minute apart.
    SeedDemo {
        #[arg(long, default_value = "go")]
        tag: String,
        #[arg(long, default_value_t = 20)]
        count: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::CreateTag { label, value } => {
            storage.create_tag(&label, &value).await?;
            println!("created tag value={value}");
        }
        Command::CreateArticle {
            title,
            summary,
            cover,
            tags,
            status,
            views,
        } => {
            let Some(status) = ArticleStatus::parse(&status) else {
                bail!("unknown status '{status}', expected draft or publish");
            };
            let id = storage
                .create_article(&NewArticle {
                    title,
                    summary,
                    cover,
                    tags,
                    views,
                    status,
                    publish_at: Utc::now(),
                })
                .await?;
            println!("created article_id={}", id.0);
        }
        Command::Import { path } => {
            let raw = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let articles: Vec<NewArticle> = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            for article in &articles {
                storage.create_article(article).await?;
            }
            println!("imported {} articles", articles.len());
        }
        Command::SeedDemo { tag, count } => {
            storage.create_tag(&tag, &tag).await?;
            let start = Utc::now() - Duration::minutes(i64::from(count));
            for i in 0..count {
                storage
                    .create_article(&NewArticle {
                        title: format!("{tag} article #{}", i + 1),
                        summary: format!("Demo entry {} for the {tag} tag.", i + 1),
                        cover: None,
                        tags: vec![tag.clone()],
                        views: i64::from(i * 7 % 50),
                        status: ArticleStatus::Publish,
                        publish_at: start + Duration::minutes(i64::from(i)),
                    })
                    .await?;
            }
            println!("seeded {count} articles under tag={tag}");
        }
    }

    Ok(())
}
