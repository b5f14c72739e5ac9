use crate::error::{Error, Result};
use crate::listing::{position, Listing};
use crate::types::LocalEntry;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const DIR_MARKER: &str = "Proton";
pub const LAUNCHER_FILE: &str = "proton";
pub const VERSION_FILE: &str = "version";
pub const FIXTURES_DIR: &str = "protonfixes";

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"GE-Proton[0-9]+-[0-9]+").expect("valid tag pattern"))
}

/// Structural fingerprint of an installation directory.
pub fn is_install_dir(path: &Path) -> bool {
    let named = path
        .file_name()
        .map(|name| name.to_string_lossy().contains(DIR_MARKER))
        .unwrap_or(false);

    named
        && path.is_dir()
        && path.join(LAUNCHER_FILE).is_file()
        && path.join(VERSION_FILE).is_file()
        && path.join(FIXTURES_DIR).is_dir()
}

/// Reads the tag from `<dir>/version`, expected as `<unix_timestamp> <TAG>`.
pub fn read_version_tag(dir: &Path) -> Option<String> {
    let content = match fs::read_to_string(dir.join(VERSION_FILE)) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("Could not read version file in {}: {}", dir.display(), e);
            return None;
        }
    };
    tag_pattern()
        .find(content.trim())
        .map(|m| m.as_str().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalInstalls {
    basedir: PathBuf,
    installs: BTreeMap<String, PathBuf>,
}

impl LocalInstalls {
    /// Creates `basedir` if needed and scans its immediate subdirectories.
    pub fn scan(basedir: &Path) -> Result<Self> {
        fs::create_dir_all(basedir).map_err(|source| Error::BaseDirUnavailable {
            path: basedir.to_path_buf(),
            source,
        })?;
        let dir_entries = fs::read_dir(basedir).map_err(|source| Error::BaseDirUnavailable {
            path: basedir.to_path_buf(),
            source,
        })?;

        let mut installs = BTreeMap::new();
        for dir_entry in dir_entries.flatten() {
            let path = dir_entry.path();
            if !is_install_dir(&path) {
                continue;
            }
            match read_version_tag(&path) {
                Some(tag) => {
                    tracing::debug!("Found install {} at {}", tag, path.display());
                    installs.insert(tag, path);
                }
                None => tracing::debug!("Ignoring {}: no tag in version file", path.display()),
            }
        }

        Ok(Self {
            basedir: basedir.to_path_buf(),
            installs,
        })
    }

    pub fn basedir(&self) -> &Path {
        &self.basedir
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.installs.contains_key(tag)
    }

    /// Installs in ascending tag order, truncated to `limit`.
    pub fn list(&self, limit: usize) -> impl Iterator<Item = LocalEntry> + '_ {
        self.installs
            .iter()
            .take(limit)
            .map(|(tag, path)| LocalEntry {
                tag_name: tag.clone(),
                path: path.clone(),
            })
    }

    /// Tag lookup restricted to the listing truncated to `limit`.
    pub fn by_tag_within(&self, tag: &str, limit: usize) -> Option<LocalEntry> {
        self.list(limit).find(|entry| entry.tag_name == tag)
    }

    /// Deletes the installation after re-checking that the path is still a
    /// recognized installation and not a symlink.
    pub fn remove(&self, entry: &LocalEntry) -> Result<()> {
        let is_symlink = fs::symlink_metadata(&entry.path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);
        if is_symlink || !is_install_dir(&entry.path) {
            return Err(Error::NotAnInstall {
                path: entry.path.clone(),
            });
        }

        tracing::debug!("Deleting {}", entry.path.display());
        fs::remove_dir_all(&entry.path).map_err(|source| Error::DeleteFailed {
            path: entry.path.clone(),
            source,
        })
    }
}

impl Listing for LocalInstalls {
    type Entry = LocalEntry;

    fn by_tag(&self, tag: &str) -> Option<LocalEntry> {
        self.installs.get(tag).map(|path| LocalEntry {
            tag_name: tag.to_string(),
            path: path.clone(),
        })
    }

    fn by_index(&self, index: i64, limit: usize) -> Option<LocalEntry> {
        let pos = position(index, limit, self.installs.len())?;
        self.list(limit).nth(pos)
    }

    fn len(&self) -> usize {
        self.installs.len()
    }
}
