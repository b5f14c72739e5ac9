use crate::error::{Error, Result};
use crate::listing::Listing;
use crate::local::LocalInstalls;
use crate::releases::ReleaseCache;
use crate::types::{LocalEntry, ReleaseEntry, TAG_PREFIX};

/// What the user asked for, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Entry(ReleaseEntry),
    Tag(String),
    Index(i64),
    Default,
}

/// Which listing index and tag lookups run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Releases,
    Installs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Release(ReleaseEntry),
    /// An installation, with the matching release when the database has it.
    Local {
        install: LocalEntry,
        release: Option<ReleaseEntry>,
    },
}

impl Resolved {
    pub fn tag_name(&self) -> &str {
        match self {
            Resolved::Release(entry) => &entry.tag_name,
            Resolved::Local { install, .. } => &install.tag_name,
        }
    }

    pub fn release(&self) -> Option<&ReleaseEntry> {
        match self {
            Resolved::Release(entry) => Some(entry),
            Resolved::Local { release, .. } => release.as_ref(),
        }
    }
}

/// Expands shorthand such as `7-53` into `GE-Proton7-53`. Anything with a
/// letter in it is taken as a full tag.
pub fn normalize_tag(tag: &str) -> String {
    if !tag.is_empty() && !tag.chars().any(char::is_alphabetic) {
        format!("{}{}", TAG_PREFIX, tag)
    } else {
        tag.to_string()
    }
}

pub struct Resolver<'a> {
    releases: &'a ReleaseCache,
    installs: &'a LocalInstalls,
    target: Target,
    limit: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(
        releases: &'a ReleaseCache,
        installs: &'a LocalInstalls,
        target: Target,
        limit: usize,
    ) -> Self {
        Self {
            releases,
            installs,
            target,
            limit,
        }
    }

    pub fn resolve(&self, selection: Selection) -> Result<Resolved> {
        match selection {
            Selection::Entry(entry) => Ok(Resolved::Release(entry)),
            Selection::Tag(tag) => {
                let tag = normalize_tag(&tag);
                let found = match self.target {
                    Target::Releases => self.releases.by_tag(&tag).map(Resolved::Release),
                    Target::Installs => self
                        .installs
                        .by_tag_within(&tag, self.limit)
                        .map(|i| self.with_release(i)),
                };
                found.ok_or(Error::EntryNotFound(tag))
            }
            Selection::Index(index) => {
                let found = match self.target {
                    Target::Releases => self
                        .releases
                        .by_index(index, self.limit)
                        .map(Resolved::Release),
                    Target::Installs => self
                        .installs
                        .by_index(index, self.limit)
                        .map(|i| self.with_release(i)),
                };
                found.ok_or_else(|| Error::EntryNotFound(format!("index {}", index)))
            }
            Selection::Default => self.resolve(Selection::Index(1)),
        }
    }

    fn with_release(&self, install: LocalEntry) -> Resolved {
        let release = self.releases.by_tag(&install.tag_name);
        if release.is_none() {
            tracing::debug!("{} is not in the release database", install.tag_name);
        }
        Resolved::Local { install, release }
    }
}
