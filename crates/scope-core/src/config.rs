use crate::paths::{home_dir, project_dirs, resolve_user_path};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PAGE_SIZE: usize = 15;
pub const DEFAULT_EDITOR: &str = "code";

const DEFAULT_ROOTS: &[&str] = &["~/code", "~/projects"];
const DEFAULT_IGNORE: &[&str] = &[
    "node_modules",
    ".next",
    "dist",
    "build",
    "target",
    ".venv",
    "vendor",
];

/// Directories under home that commonly hold checkouts, probed in order when
/// there is no config file.
const COMMON_ROOTS: &[&str] = &[
    "code",
    "Code",
    "projects",
    "Projects",
    "dev",
    "Dev",
    "work",
    "Work",
    "repos",
    "Repos",
    "src",
    "Developer",
    "Documents/GitHub",
    "Desktop/projects",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub roots: Vec<PathBuf>,
    pub ignore: Vec<String>,
    pub editor: String,
    pub page_size: usize,
    pub cache_max_age_secs: u64,
    pub status_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            roots: DEFAULT_ROOTS.iter().map(|root| resolve_user_path(root)).collect(),
            ignore: DEFAULT_IGNORE.iter().map(|name| name.to_string()).collect(),
            editor: DEFAULT_EDITOR.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            cache_max_age_secs: 300,
            status_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path).context("read config")?;
        let mut config: Self = serde_json::from_str(&data).context("parse config")?;
        config.roots = expand_roots(&config.roots);
        Ok(config)
    }

    /// Like [`AppConfig::load`], but without a config file the roots come from
    /// probing common directories under home.
    pub fn load_or_detect(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        let cwd = std::env::current_dir().context("resolve current directory")?;
        Ok(Self {
            roots: detect_default_roots(home_dir().as_deref(), &cwd),
            ..Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("create config directory")?;
        }
        let data = serde_json::to_string_pretty(self).context("serialize config")?;
        fs::write(path, data).context("write config")?;
        Ok(())
    }

    /// Command-line directories replace the configured roots.
    pub fn override_roots(&mut self, dirs: &[String]) {
        if dirs.is_empty() {
            return;
        }
        self.roots = dirs.iter().map(|dir| resolve_user_path(dir)).collect();
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs.max(1))
    }

    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_secs)
    }

    pub fn page_size(&self) -> usize {
        self.page_size.max(1)
    }
}

fn expand_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    roots
        .iter()
        .map(|root| resolve_user_path(&root.to_string_lossy()))
        .collect()
}

/// Existing common developer directories under `home`, or `cwd` when none
/// exist.
pub fn detect_default_roots(home: Option<&Path>, cwd: &Path) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let found: Vec<PathBuf> = home
        .map(|home| {
            COMMON_ROOTS
                .iter()
                .map(|dir| home.join(dir))
                .filter(|dir| dir.is_dir())
                // `code` and `Code` are one directory on case-insensitive filesystems.
                .filter(|dir| seen.insert(fs::canonicalize(dir).unwrap_or_else(|_| dir.clone())))
                .collect()
        })
        .unwrap_or_default();
    if found.is_empty() {
        vec![cwd.to_path_buf()]
    } else {
        found
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let project = project_dirs().context("resolve project dirs")?;
    Ok(project.config_dir().join("config.json"))
}
