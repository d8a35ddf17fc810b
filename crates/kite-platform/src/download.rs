//! Release download.

use kite_core::{HealthState, InstallOptions, InstallStep, KiteAdapter, KiteError, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Streams `url` into `dest`, reporting progress through `options`.
///
/// Redirects are followed. The body is written next to `dest` and only
/// renamed into place once complete, so `dest` never holds a partial
/// installer. Returns the number of bytes written.
///
/// # Errors
/// Returns a request error on a transport failure or a non-2xx final
/// status, and an I/O error if `dest` cannot be written.
pub async fn stream_download(url: &str, dest: &Path, options: &InstallOptions) -> Result<u64> {
    let mut response = reqwest::get(url)
        .await
        .map_err(|e| KiteError::request(format!("unable to download {url}: {e}"), None))?;

    let status = response.status();
    if !status.is_success() {
        return Err(KiteError::request(
            format!("download of {url} failed with status {status}"),
            Some(status.as_u16()),
        ));
    }

    let total = response.content_length().unwrap_or(0);
    debug!(url, dest = %dest.display(), total, "download started");

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let part = partial_path(dest);
    let downloaded = match write_body(&mut response, url, &part, total, options).await {
        Ok(downloaded) => downloaded,
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&part).await {
                debug!(path = %part.display(), error = %rm, "unable to remove partial download");
            }
            warn!(url, error = %e, "download failed");
            return Err(e);
        }
    };
    tokio::fs::rename(&part, dest).await?;

    info!(url, bytes = downloaded, "download complete");
    Ok(downloaded)
}

async fn write_body(
    response: &mut reqwest::Response,
    url: &str,
    path: &Path,
    total: u64,
    options: &InstallOptions,
) -> Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut downloaded = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| KiteError::request(format!("download of {url} interrupted: {e}"), None))?
    {
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
        options.progress(downloaded, total);
    }
    file.flush().await?;
    Ok(downloaded)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Downloads an installer to the adapter's download path, fires the
/// `Download` hook, then installs when `options.install` is set.
///
/// # Errors
/// Returns [`HealthState::Unsupported`] when the adapter has no download
/// path, otherwise the download error or the install error.
pub async fn download_and_install<A>(adapter: &A, url: &str, options: &InstallOptions) -> Result<()>
where
    A: KiteAdapter + ?Sized,
{
    let dest = adapter.download_path().ok_or_else(|| {
        KiteError::bad_state(HealthState::Unsupported, "no download location on this platform")
    })?;
    stream_download(url, &dest, options).await?;
    options.notify(InstallStep::Download);
    if options.install {
        adapter.install(options).await?;
    }
    Ok(())
}
