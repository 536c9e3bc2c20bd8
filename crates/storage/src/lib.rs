use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use uuid::Uuid;

use shared::domain::{Article, ArticleId, ArticleStatus, TagSummary};

/// Separator used when folding an article's tag values into one column.
const TAG_SEPARATOR: char = '\u{1f}';

const ARTICLE_COLUMNS: &str = "a.id, a.title, a.summary, a.cover, a.views, a.status, a.publish_at,
     (SELECT GROUP_CONCAT(t2.value, char(31))
        FROM article_tags at2
        JOIN tags t2 ON t2.id = at2.tag_id
       WHERE at2.article_id = a.id) AS tag_values";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewArticle {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub status: ArticleStatus,
    #[serde(default = "Utc::now")]
    pub publish_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        // Every connection to `sqlite::memory:` opens its own database, so keep exactly one alive.
        let pool_options = if database_url.starts_with("sqlite::memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_tag(&self, label: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO tags (label, value) VALUES (?, ?)
             ON CONFLICT(value) DO UPDATE SET label = excluded.label",
        )
        .bind(label)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to upsert tag '{value}'"))?;
        Ok(())
    }

    pub async fn create_article(&self, article: &NewArticle) -> Result<ArticleId> {
        let article_id = ArticleId::new();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO articles (id, title, summary, cover, views, status, publish_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(article_id.0.to_string())
        .bind(&article.title)
        .bind(&article.summary)
        .bind(article.cover.as_deref())
        .bind(article.views)
        .bind(article.status.as_str())
        .bind(article.publish_at)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to insert article '{}'", article.title))?;

        for tag in &article.tags {
            let tag_id: Option<i64> = sqlx::query_scalar("SELECT id FROM tags WHERE value = ?")
                .bind(tag)
                .fetch_optional(&mut *tx)
                .await?;
            let tag_id = tag_id.ok_or_else(|| anyhow!("unknown tag '{tag}'"))?;
            sqlx::query("INSERT OR IGNORE INTO article_tags (article_id, tag_id) VALUES (?, ?)")
                .bind(article_id.0.to_string())
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(article_id)
    }

    /// Returns the requested slice of `tag`'s articles and the size of the
    /// whole match set, newest first.
    pub async fn articles_by_tag(
        &self,
        tag: &str,
        page: u32,
        page_size: u32,
        status: ArticleStatus,
    ) -> Result<(Vec<Article>, u64)> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)
               FROM articles a
               JOIN article_tags at ON at.article_id = a.id
               JOIN tags t ON t.id = at.tag_id
              WHERE t.value = ? AND a.status = ?",
        )
        .bind(tag)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to count articles for tag '{tag}'"))?;

        let rows = sqlx::query(&format!(
            "SELECT {ARTICLE_COLUMNS}
               FROM articles a
               JOIN article_tags at ON at.article_id = a.id
               JOIN tags t ON t.id = at.tag_id
              WHERE t.value = ? AND a.status = ?
              ORDER BY a.publish_at DESC, a.id
              LIMIT ? OFFSET ?"
        ))
        .bind(tag)
        .bind(status.as_str())
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to load page {page} for tag '{tag}'"))?;

        let articles = rows.iter().map(article_from_row).collect::<Result<_>>()?;
        Ok((articles, total.max(0) as u64))
    }

    pub async fn recommended_articles(&self, limit: u32) -> Result<Vec<Article>> {
        let rows = sqlx::query(&format!(
            "SELECT {ARTICLE_COLUMNS}
               FROM articles a
              WHERE a.status = 'publish'
              ORDER BY a.views DESC, a.publish_at DESC
              LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .context("failed to load recommended articles")?;

        rows.iter().map(article_from_row).collect()
    }

    pub async fn list_tags(&self) -> Result<Vec<TagSummary>> {
        let rows = sqlx::query(
            "SELECT t.label, t.value, COUNT(a.id)
               FROM tags t
               LEFT JOIN article_tags at ON at.tag_id = t.id
               LEFT JOIN articles a ON a.id = at.article_id AND a.status = 'publish'
              GROUP BY t.id
              ORDER BY t.label",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list tags")?;

        Ok(rows
            .into_iter()
            .map(|r| TagSummary {
                label: r.get::<String, _>(0),
                value: r.get::<String, _>(1),
                article_count: r.get::<i64, _>(2).max(0) as u64,
            })
            .collect())
    }
}

fn article_from_row(row: &SqliteRow) -> Result<Article> {
    let raw_id: String = row.try_get("id")?;
    let id = Uuid::parse_str(&raw_id).with_context(|| format!("invalid article id '{raw_id}'"))?;
    let raw_status: String = row.try_get("status")?;
    let status = ArticleStatus::parse(&raw_status)
        .ok_or_else(|| anyhow!("invalid status '{raw_status}' for article {raw_id}"))?;
    let mut tags: Vec<String> = row
        .try_get::<Option<String>, _>("tag_values")?
        .map(|joined| {
            joined
                .split(TAG_SEPARATOR)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    tags.sort();

    Ok(Article {
        id: ArticleId(id),
        title: row.try_get("title")?,
        summary: row.try_get("summary")?,
        cover: row.try_get("cover")?,
        tags,
        views: row.try_get("views")?,
        status,
        publish_at: row.try_get("publish_at")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
