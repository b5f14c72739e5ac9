use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed connection to Github API ({url}): {source}")]
    SourceUnavailable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Could not parse release database at {}: {reason}", path.display())]
    CacheCorrupt { path: PathBuf, reason: String },

    #[error("Release database is empty, nothing to select from")]
    EmptyResult,

    #[error("Requested entry not found: {0}")]
    EntryNotFound(String),

    #[error("Installation not possible for {tag}. No source available.")]
    NoSourceAvailable { tag: String },

    #[error("No checksum file published for {tag}. Use --force to install without verification.")]
    MissingChecksum { tag: String },

    #[error("{tag} is already installed at {}. Operation aborted.", path.display())]
    AlreadyInstalled { tag: String, path: PathBuf },

    #[error("Failed to download {url}: {source}")]
    DownloadFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Verification of downloaded content failed for {file}. Expected {expected}, got {actual}.")]
    VerificationFailed {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("Unpacking failed ({reason}). GE-Proton folder may be incomplete, delete manually: {}", path.display())]
    UnpackFailed { path: PathBuf, reason: String },

    #[error("Can't delete non Proton folder: {}", path.display())]
    RefusedForeignDelete { path: PathBuf },

    #[error("{} is not a Proton directory. Abort without deletion.", path.display())]
    NotAnInstall { path: PathBuf },

    #[error("Failed to delete {}: {source}", path.display())]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Install dir could not be created or can't be accessed: {}", path.display())]
    BaseDirUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
