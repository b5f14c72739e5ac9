use crate::error::{Error, Result};
use crate::source::user_agent;
use flate2::read::GzDecoder;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use sha2::{Digest, Sha512};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tar::Archive;

pub async fn download_file(
    client: &Client,
    url: &str,
    local_path: &Path,
    show_progress: bool,
) -> Result<()> {
    let filename = local_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    tracing::debug!("Downloading {} to {}", url, local_path.display());

    let failed = |source| Error::DownloadFailed {
        url: url.to_string(),
        source,
    };
    let response = client
        .get(url)
        .header("User-Agent", user_agent())
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(failed)?;
    let total_size = response.content_length().unwrap_or(0);

    let pb = if show_progress {
        ProgressBar::new(total_size)
    } else {
        ProgressBar::hidden()
    };
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(filename);

    let mut file = fs::File::create(local_path)
        .map_err(|e| Error::io(format!("Could not create {}", local_path.display()), e))?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(failed)?;
        file.write_all(&chunk)
            .map_err(|e| Error::io(format!("Could not write {}", local_path.display()), e))?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    pb.finish_and_clear();
    Ok(())
}

/// Hex encoded SHA-512 digest of a file.
pub fn compute_sha512(path: &Path) -> io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha512::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// First whitespace delimited token of a checksum file, e.g. `sha512sum` output.
pub fn expected_digest(checksum_content: &str) -> Option<&str> {
    checksum_content.split_whitespace().next()
}

/// Unpacks a `.tar.gz`, `.tgz` or `.tar.xz` archive into `extract_dir`.
/// `cancel` is checked between entries; a raised flag aborts with
/// [`io::ErrorKind::Interrupted`].
pub fn extract_archive(archive_path: &Path, extract_dir: &Path, cancel: &AtomicBool) -> io::Result<()> {
    tracing::debug!(
        "Extracting {} into {}",
        archive_path.display(),
        extract_dir.display()
    );

    let name = archive_path.to_string_lossy();
    let file = fs::File::open(archive_path)?;
    let decoder: Box<dyn Read> = if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Box::new(GzDecoder::new(file))
    } else if name.ends_with(".tar.xz") {
        Box::new(xz2::read::XzDecoder::new(file))
    } else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Unsupported archive format: {}", archive_path.display()),
        ));
    };

    let mut archive = Archive::new(decoder);
    for entry in archive.entries()? {
        if cancel.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted"));
        }
        let mut entry = entry?;
        if !entry.unpack_in(extract_dir)? {
            let path = entry.path()?.display().to_string();
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Archive entry escapes target directory: {}", path),
            ));
        }
    }

    Ok(())
}
