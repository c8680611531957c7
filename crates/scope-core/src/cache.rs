use crate::error::CacheError;
use crate::model::Repo;
use crate::paths::project_dirs;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheRecord {
    /// RFC 3339, UTC.
    pub produced_at: String,
    pub roots: Vec<PathBuf>,
    pub repos: Vec<Repo>,
}

impl CacheRecord {
    pub fn new(
        repos: Vec<Repo>,
        roots: Vec<PathBuf>,
        produced_at: OffsetDateTime,
    ) -> Result<Self, CacheError> {
        let produced_at = produced_at
            .format(&Rfc3339)
            .map_err(|err| CacheError::Timestamp(err.to_string()))?;
        Ok(Self {
            produced_at,
            roots,
            repos,
        })
    }

    pub fn produced_at(&self) -> Result<OffsetDateTime, CacheError> {
        OffsetDateTime::parse(&self.produced_at, &Rfc3339)
            .map_err(|err| CacheError::Timestamp(err.to_string()))
    }

    pub fn is_valid(&self, max_age: Duration) -> bool {
        self.is_valid_at(OffsetDateTime::now_utc(), max_age)
    }

    /// A record stamped in the future (clock moved backwards) counts as fresh.
    pub fn is_valid_at(&self, now: OffsetDateTime, max_age: Duration) -> bool {
        let Ok(produced_at) = self.produced_at() else {
            return false;
        };
        let elapsed = now - produced_at;
        elapsed < max_age
    }

    /// Element-wise and order-sensitive.
    pub fn is_same_roots(&self, roots: &[PathBuf]) -> bool {
        self.roots == roots
    }
}

/// The on-disk copy of the most recent scan. Reads that fail behave as a miss.
#[derive(Debug)]
pub struct ResultCache {
    path: PathBuf,
    record: Option<CacheRecord>,
}

impl ResultCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path, record: None }
    }

    pub fn load(&mut self) -> Option<&CacheRecord> {
        self.record = match read_record(&self.path) {
            Ok(record) => Some(record),
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "cache miss");
                None
            }
        };
        self.record.as_ref()
    }

    pub fn is_valid(&self, max_age: Duration) -> bool {
        self.record
            .as_ref()
            .is_some_and(|record| record.is_valid(max_age))
    }

    pub fn is_same_roots(&self, roots: &[PathBuf]) -> bool {
        self.record
            .as_ref()
            .is_some_and(|record| record.is_same_roots(roots))
    }

    /// Replaces any previous record.
    pub fn save(&mut self, repos: &[Repo], roots: &[PathBuf]) -> Result<(), CacheError> {
        let record =
            CacheRecord::new(repos.to_vec(), roots.to_vec(), OffsetDateTime::now_utc())?;
        write_record(&self.path, &record)?;
        self.record = Some(record);
        Ok(())
    }
}

fn read_record(path: &Path) -> Result<CacheRecord, CacheError> {
    let data = fs::read_to_string(path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut record: CacheRecord = serde_json::from_str(&data)?;
    for repo in &mut record.repos {
        repo.status.refresh_dirty();
    }
    Ok(record)
}

fn write_record(path: &Path, record: &CacheRecord) -> Result<(), CacheError> {
    let io_err = |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let data = serde_json::to_string_pretty(record)?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, data).map_err(io_err)?;
    fs::rename(&staging, path).map_err(io_err)?;
    Ok(())
}

pub fn default_cache_path() -> anyhow::Result<PathBuf> {
    let project = project_dirs().context("resolve project dirs")?;
    Ok(project.cache_dir().join("cache.json"))
}
