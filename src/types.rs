use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

pub const TAG_PREFIX: &str = "GE-Proton";

/// Per-invocation presentation and prompt settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub quiet: bool,
    pub assume_yes: bool,
    pub prompt_timeout: Duration,
    pub max_entries: usize,
    pub compact: bool,
    pub human_readable: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quiet: false,
            assume_yes: false,
            prompt_timeout: Duration::from_secs(20),
            max_entries: 9,
            compact: false,
            human_readable: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    url: String,
    html_url: String,
    author: GitHubAuthor,
    name: String,
    tag_name: String,
    published_at: String,
    created_at: String,
    body: String,
    assets: Vec<GitHubAsset>,
}

#[derive(Debug, Deserialize)]
struct GitHubAuthor {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GitHubAsset {
    content_type: String,
    name: String,
    browser_download_url: String,
    size: u64,
}

/// Normalized, immutable view of one release record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEntry {
    pub tag_name: String,
    pub title: String,
    pub author: String,
    pub publish_time: DateTime<Utc>,
    pub creation_time: DateTime<Utc>,
    pub description: String,
    pub json_url: String,
    pub html_url: String,
    pub download_url: String,
    pub filename: String,
    pub size: u64,
    pub checksum: Option<ChecksumAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumAsset {
    pub download_url: String,
    pub filename: String,
    pub size: u64,
}

impl ReleaseEntry {
    /// Normalizes a raw record. Any missing or malformed field rejects the
    /// whole record.
    pub fn from_record(record: &Value) -> Option<Self> {
        let raw = match GitHubRelease::deserialize(record) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("Rejected release record: {}", e);
                return None;
            }
        };

        let publish_time = parse_time(&raw.published_at)?;
        let creation_time = parse_time(&raw.created_at)?;

        let mut download_url = String::new();
        let mut filename = String::new();
        let mut size = 0;
        let mut checksum = None;

        for asset in &raw.assets {
            let content_type = asset.content_type.trim();
            let name = asset.name.trim();
            if content_type == "application/gzip" || name.contains(".tar.gz") {
                download_url = asset.browser_download_url.trim().to_string();
                filename = name.to_string();
                size = asset.size;
            } else if matches!(
                content_type,
                "application/octet-stream" | "binary/octet-stream"
            ) {
                checksum = Some(ChecksumAsset {
                    download_url: asset.browser_download_url.trim().to_string(),
                    filename: name.to_string(),
                    size: asset.size,
                });
            }
        }

        Some(Self {
            tag_name: raw.tag_name.trim().to_string(),
            title: raw.name.trim().to_string(),
            author: raw.author.login.trim().to_string(),
            publish_time,
            creation_time,
            description: raw.body.lines().collect::<Vec<_>>().join("\n"),
            json_url: raw.url.trim().to_string(),
            html_url: raw.html_url.trim().to_string(),
            download_url,
            filename,
            size,
            checksum,
        })
    }

    pub fn is_installable(&self) -> bool {
        !self.download_url.is_empty() && !self.filename.is_empty()
    }
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    value.trim().parse::<DateTime<Utc>>().ok()
}

/// A recognized installation directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    pub tag_name: String,
    pub path: PathBuf,
}
