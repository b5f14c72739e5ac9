use crate::download::{compute_sha512, download_file, expected_digest, extract_archive};
use crate::error::{Error, Result};
use crate::interface::Interface;
use crate::local::is_install_dir;
use crate::types::ReleaseEntry;
use reqwest::Client;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed(PathBuf),
    Cancelled,
}

/// Downloads land in a `TempDir` under the staging root, removed on every
/// exit path when it drops. A partially unpacked target is never removed.
pub struct Installer {
    basedir: PathBuf,
    staging_root: PathBuf,
    client: Client,
    interrupt: Option<watch::Receiver<bool>>,
}

impl Installer {
    pub fn new(basedir: &Path) -> Self {
        Self {
            basedir: basedir.to_path_buf(),
            staging_root: std::env::temp_dir(),
            client: Client::new(),
            interrupt: None,
        }
    }

    pub fn with_staging_root(mut self, staging_root: PathBuf) -> Self {
        self.staging_root = staging_root;
        self
    }

    #[cfg(test)]
    fn with_interrupt(mut self, raised: watch::Receiver<bool>) -> Self {
        self.interrupt = Some(raised);
        self
    }

    pub async fn install(
        &self,
        entry: &ReleaseEntry,
        force: bool,
        ui: &mut Interface,
    ) -> Result<InstallOutcome> {
        let tag = &entry.tag_name;
        let archive_name = plain_file_name(&entry.filename)
            .filter(|_| entry.is_installable())
            .ok_or_else(|| Error::NoSourceAvailable { tag: tag.clone() })?;

        let target = self.basedir.join(tag);
        let exists = target.exists();
        if exists && !force {
            return Err(Error::AlreadyInstalled {
                tag: tag.clone(),
                path: target,
            });
        }

        let checksum = if force {
            None
        } else {
            let checksum = entry
                .checksum
                .as_ref()
                .ok_or_else(|| Error::MissingChecksum { tag: tag.clone() })?;
            let name = plain_file_name(&checksum.filename)
                .ok_or_else(|| Error::MissingChecksum { tag: tag.clone() })?;
            tracing::debug!("Checksum file {} ({} bytes)", name, checksum.size);
            Some((checksum.download_url.as_str(), name))
        };

        let action = if exists { "+-Reinstall" } else { "+Install" };
        let mut message = format!("{}: {}", action, tag);
        if !ui.settings().compact {
            message.push_str(&format!("\n\t{}\n", entry.download_url));
        }
        tracing::info!("{}", message);

        if !ui.ask_to_proceed(None) {
            return Ok(InstallOutcome::Cancelled);
        }

        let interrupt = match &self.interrupt {
            Some(raised) => Interrupt::from_receiver(raised.clone()),
            None => Interrupt::listen(),
        };

        fs::create_dir_all(&self.staging_root).map_err(|e| {
            Error::io(
                format!("Could not create staging dir {}", self.staging_root.display()),
                e,
            )
        })?;
        let staging = TempDir::new_in(&self.staging_root)
            .map_err(|e| Error::io("Could not create temporary download dir", e))?;
        let archive_path = staging.path().join(archive_name);

        tracing::info!("Downloading.");
        let show_progress = !ui.settings().quiet;
        let download = download_file(&self.client, &entry.download_url, &archive_path, show_progress);
        match interrupt.guard(download).await {
            Some(result) => result?,
            None => {
                tracing::info!("Download stopped.");
                return Ok(InstallOutcome::Cancelled);
            }
        }

        if let Some((url, name)) = checksum {
            let checksum_path = staging.path().join(name);
            match interrupt.guard(download_file(&self.client, url, &checksum_path, false)).await {
                Some(result) => result?,
                None => {
                    tracing::info!("Download stopped.");
                    return Ok(InstallOutcome::Cancelled);
                }
            }

            let archive = archive_path.clone();
            let verifying = tokio::task::spawn_blocking(move || verify(&archive, &checksum_path));
            match interrupt.guard(verifying).await {
                Some(joined) => joined
                    .map_err(|e| Error::io("Checksum verification did not finish", e.into()))??,
                None => {
                    tracing::info!("Verification stopped.");
                    return Ok(InstallOutcome::Cancelled);
                }
            }
        }

        // Last point where stopping leaves the install dir untouched
        if interrupt.is_raised() {
            tracing::info!("Install stopped.");
            return Ok(InstallOutcome::Cancelled);
        }

        if exists {
            replace(&target)?;
        }

        tracing::info!("Unpacking.");
        self.unpack(&archive_path, &target, &interrupt).await?;
        if !is_install_dir(&target) {
            tracing::warn!(
                "Unpacked archive did not produce a Proton directory at {}",
                target.display()
            );
        }

        if let Err(e) = staging.close() {
            tracing::warn!("Could not remove temporary download dir: {}", e);
        }
        tracing::info!("Done.");
        Ok(InstallOutcome::Installed(target))
    }

    async fn unpack(&self, archive: &Path, target: &Path, interrupt: &Interrupt) -> Result<()> {
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let archive = archive.to_path_buf();
        let basedir = self.basedir.clone();
        let mut task =
            tokio::task::spawn_blocking(move || extract_archive(&archive, &basedir, &flag));

        let joined = tokio::select! {
            joined = &mut task => joined,
            _ = interrupt.wait() => {
                cancel.store(true, Ordering::SeqCst);
                task.await
            }
        };

        let reason = match joined {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => e.to_string(),
            Err(e) => e.to_string(),
        };
        Err(Error::UnpackFailed {
            path: target.to_path_buf(),
            reason,
        })
    }
}

/// Latched Ctrl-C for one install. A signal that arrives while a step runs
/// outside any `select!` stays raised for the next checkpoint.
struct Interrupt {
    raised: watch::Receiver<bool>,
    listener: Option<JoinHandle<()>>,
}

impl Interrupt {
    fn listen() -> Self {
        let (tx, raised) = watch::channel(false);
        let listener = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(true);
            }
        });
        Self {
            raised,
            listener: Some(listener),
        }
    }

    fn from_receiver(raised: watch::Receiver<bool>) -> Self {
        Self {
            raised,
            listener: None,
        }
    }

    fn is_raised(&self) -> bool {
        *self.raised.borrow()
    }

    /// Resolves once raised. Never resolves if no signal can arrive.
    async fn wait(&self) {
        let mut raised = self.raised.clone();
        if raised.wait_for(|raised| *raised).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// `None` when interrupted before or while `future` runs.
    async fn guard<F: Future>(&self, future: F) -> Option<F::Output> {
        if self.is_raised() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.wait() => None,
            output = future => Some(output),
        }
    }
}

impl Drop for Interrupt {
    fn drop(&mut self) {
        if let Some(listener) = &self.listener {
            listener.abort();
        }
    }
}

/// Rejects names that would place a download outside the staging dir.
fn plain_file_name(name: &str) -> Option<&str> {
    let file_name = Path::new(name).file_name()?.to_str()?;
    (file_name == name).then_some(file_name)
}

fn verify(archive: &Path, checksum_file: &Path) -> Result<()> {
    let content = fs::read_to_string(checksum_file).map_err(|e| {
        Error::io(format!("Could not read {}", checksum_file.display()), e)
    })?;
    let expected = expected_digest(&content).unwrap_or_default();
    let actual = compute_sha512(archive)
        .map_err(|e| Error::io(format!("Could not hash {}", archive.display()), e))?;

    if actual != expected {
        return Err(Error::VerificationFailed {
            file: archive
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            expected: expected.to_string(),
            actual,
        });
    }
    tracing::debug!("Checksum verified: {}", actual);
    Ok(())
}

fn replace(target: &Path) -> Result<()> {
    if !is_install_dir(target) {
        return Err(Error::RefusedForeignDelete {
            path: target.to_path_buf(),
        });
    }
    tracing::debug!("Deleting previous install at {}", target.display());
    fs::remove_dir_all(target).map_err(|source| Error::DeleteFailed {
        path: target.to_path_buf(),
        source,
    })
}
