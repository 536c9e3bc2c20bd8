use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use config::{Config, Environment, File, Map};
use serde::Deserialize;

pub const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    pub database_url: String,
    #[serde(default)]
    pub server_public_url: Option<String>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8443".into(),
            database_url: "sqlite://./data/blog.db".into(),
            server_public_url: None,
            log_filter: "info".into(),
        }
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(SETTINGS_FILE))
}

/// Layers defaults, the optional settings file, and `APP__*` environment
/// variables, in that order. `SERVER_BIND` and `DATABASE_URL` still apply
/// when their `APP__` counterparts are unset.
pub fn load_settings_from(path: &Path) -> anyhow::Result<Settings> {
    load_settings_with(path, env::vars().collect())
}

fn load_settings_with(path: &Path, vars: Map<String, String>) -> anyhow::Result<Settings> {
    let defaults = Settings::default();
    let mut settings: Settings = Config::builder()
        .set_default("bind_addr", defaults.bind_addr)?
        .set_default("database_url", defaults.database_url)?
        .set_default("log_filter", defaults.log_filter)?
        .add_source(File::from(path).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("__")
                .source(Some(vars.clone())),
        )
        .build()
        .with_context(|| format!("failed to load settings from '{}'", path.display()))?
        .try_deserialize()
        .context("invalid server settings")?;

    apply_legacy_overrides(&mut settings, |key| vars.get(key).cloned());
    Ok(settings)
}

fn apply_legacy_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if lookup("APP__BIND_ADDR").is_none() {
        if let Some(v) = lookup("SERVER_BIND") {
            settings.bind_addr = v;
        }
    }
    if lookup("APP__DATABASE_URL").is_none() {
        if let Some(v) = lookup("DATABASE_URL") {
            settings.database_url = v;
        }
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
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
#[path = "tests/config_tests.rs"]
mod tests;
