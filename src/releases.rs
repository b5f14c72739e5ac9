use crate::error::{Error, Result};
use crate::listing::{position, Listing};
use crate::source;
use crate::types::ReleaseEntry;
use reqwest::Client;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub const CACHE_FILE_NAME: &str = "releases.json";
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(60 * 60);

/// Single JSON file holding the release array exactly as fetched. A refresh
/// deletes the old file first and never merges.
pub struct ReleaseCache {
    path: PathBuf,
    source_url: String,
    client: Client,
    freshness: Duration,
    clock: fn() -> SystemTime,
    records: Vec<Value>,
}

impl ReleaseCache {
    pub fn new(path: PathBuf, source_url: impl Into<String>) -> Self {
        Self {
            path,
            source_url: source_url.into(),
            client: Client::new(),
            freshness: DEFAULT_FRESHNESS,
            clock: SystemTime::now,
            records: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the release records, refreshing the cache file when forced,
    /// missing or older than the freshness window.
    pub async fn load(&mut self, force: bool) -> Result<()> {
        self.records.clear();

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::io(format!("Could not create cache dir {}", parent.display()), e)
            })?;
        }

        if !force && !self.is_expired() {
            match self.read_cached() {
                Ok(records) => return self.accept(records),
                Err(e) => tracing::warn!("{} Refreshing.", e),
            }
        }

        self.refresh().await
    }

    /// Missing file is expired. Timestamps that can't be read count as fresh.
    pub fn is_expired(&self) -> bool {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(_) => return true,
        };
        let anchor = match metadata.created().or_else(|_| metadata.modified()) {
            Ok(anchor) => anchor,
            Err(_) => return false,
        };
        let age = (self.clock)()
            .duration_since(anchor)
            .unwrap_or_default();
        is_expired_age(age, self.freshness)
    }

    async fn refresh(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Deleted cache file {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::io(
                    format!("Could not delete cache file {}", self.path.display()),
                    e,
                ))
            }
        }

        tracing::info!("Downloading release database.");
        let body = source::fetch_releases(&self.client, &self.source_url).await?;
        fs::write(&self.path, &body).map_err(|e| {
            Error::io(format!("Could not write cache file {}", self.path.display()), e)
        })?;

        match parse_records(&body) {
            Ok(records) => self.accept(records),
            Err(reason) => {
                let _ = fs::remove_file(&self.path);
                Err(Error::CacheCorrupt {
                    path: self.path.clone(),
                    reason,
                })
            }
        }
    }

    fn read_cached(&self) -> Result<Vec<Value>> {
        let content = fs::read(&self.path).map_err(|e| {
            Error::io(format!("Could not read cache file {}", self.path.display()), e)
        })?;
        parse_records(&content).map_err(|reason| Error::CacheCorrupt {
            path: self.path.clone(),
            reason,
        })
    }

    fn accept(&mut self, records: Vec<Value>) -> Result<()> {
        if records.is_empty() {
            return Err(Error::EmptyResult);
        }
        tracing::debug!("Loaded {} release records", records.len());
        self.records = records;
        Ok(())
    }

    /// Lazily normalizes the first `limit` records. Each position yields
    /// `None` when its record can't be parsed, so positions line up with
    /// [`Listing::by_index`].
    pub fn list(&self, limit: usize) -> impl Iterator<Item = Option<ReleaseEntry>> + '_ {
        self.records.iter().take(limit).map(ReleaseEntry::from_record)
    }
}

impl Listing for ReleaseCache {
    type Entry = ReleaseEntry;

    fn by_tag(&self, tag: &str) -> Option<ReleaseEntry> {
        let record = self
            .records
            .iter()
            .find(|record| record.get("tag_name").and_then(Value::as_str) == Some(tag))?;
        normalize_or_log(record)
    }

    fn by_index(&self, index: i64, limit: usize) -> Option<ReleaseEntry> {
        let pos = position(index, limit, self.records.len())?;
        normalize_or_log(&self.records[pos])
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

fn normalize_or_log(record: &Value) -> Option<ReleaseEntry> {
    let entry = ReleaseEntry::from_record(record);
    if entry.is_none() {
        tracing::error!("Could not parse data from Github API.");
    }
    entry
}

fn parse_records(content: &[u8]) -> std::result::Result<Vec<Value>, String> {
    serde_json::from_slice::<Vec<Value>>(content).map_err(|e| e.to_string())
}

/// Whole minutes of age are compared against the window.
pub fn is_expired_age(age: Duration, window: Duration) -> bool {
    age.as_secs() / 60 > window.as_secs() / 60
}
