use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;
use vodimport_core::import::load_descriptors;

use crate::{AppContext, DisplayFallback};

pub fn execute(context: &AppContext) -> Vec<HealthEntry> {
    let config = context.config();
    let mut results = vec![HealthEntry::ok(
        "importer.toml",
        format!("{}", context.config_path().display()),
    )];
    results.push(check_input(&config.input_path()));
    results.push(check_checkpoint_dir(&config.checkpoint_path()));
    results.push(check_api_key(&config.api.api_key_env));
    results
}

fn check_input(path: &Path) -> HealthEntry {
    if !path.exists() {
        return HealthEntry::error("input", format!("{} missing", path.display()));
    }
    match load_descriptors(path) {
        Ok(descriptors) if descriptors.is_empty() => {
            HealthEntry::warn("input", format!("{} has no items", path.display()))
        }
        Ok(descriptors) => HealthEntry::ok(
            "input",
            format!("{} ({} items)", path.display(), descriptors.len()),
        ),
        Err(err) => HealthEntry::error("input", err.to_string()),
    }
}

fn check_checkpoint_dir(path: &Path) -> HealthEntry {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    match fs::metadata(&dir) {
        Ok(meta) if !meta.is_dir() => {
            HealthEntry::error("checkpoint", format!("{} is not a directory", dir.display()))
        }
        Ok(meta) if meta.permissions().readonly() => {
            HealthEntry::error("checkpoint", format!("{} is read-only", dir.display()))
        }
        Ok(_) if path.exists() => HealthEntry::warn(
            "checkpoint",
            format!("{} exists and will be overwritten", path.display()),
        ),
        Ok(_) => HealthEntry::ok("checkpoint", format!("{}", path.display())),
        Err(_) => HealthEntry::error("checkpoint", format!("{} not found", dir.display())),
    }
}

fn check_api_key(variable: &str) -> HealthEntry {
    match std::env::var(variable) {
        Ok(value) if !value.trim().is_empty() => HealthEntry::ok("api key", variable.to_string()),
        _ => HealthEntry::error("api key", format!("{variable} is not set")),
    }
}

#[derive(Debug, Serialize)]
pub struct HealthEntry {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub enum CheckStatus {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CheckStatus::Ok => "OK",
            CheckStatus::Warn => "WARN",
            CheckStatus::Error => "ERROR",
        };
        write!(f, "{}", label)
    }
}

impl HealthEntry {
    fn ok(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Ok,
            detail: detail.into(),
        }
    }

    fn warn(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Warn,
            detail: detail.into(),
        }
    }

    fn error(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Error,
            detail: detail.into(),
        }
    }
}

impl DisplayFallback for HealthEntry {
    fn display(&self) -> String {
        format!(
            "[{status}] {name}: {detail}",
            status = self.status,
            name = self.name,
            detail = self.detail
        )
    }
}
