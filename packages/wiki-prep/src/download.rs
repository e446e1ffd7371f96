//! Resumable HTTP download of dump archives.
//!
//! Bytes are streamed into `<dest>.part`. If a `.part` file is already there
//! the request asks for the remainder with a `Range` header and appends to it.
//! The final path only appears, via rename, once the body has been read to
//! the end, so an interrupted transfer never looks like a finished archive.
//!
//! The `ETag` (or `Last-Modified`) of the response that started the `.part`
//! file is kept in `<dest>.part.validator` and sent back as `If-Range`. When
//! the remote file has been replaced in the meantime the server answers with
//! the whole new file and the stale prefix is discarded. A `.part` file with
//! no stored validator is never resumed.

use reqwest::header::{HeaderMap, HeaderName, ETAG, IF_RANGE, LAST_MODIFIED, RANGE, USER_AGENT};
use reqwest::StatusCode;
use std::path::Path;
use std::time::Duration;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::layout::{partial_path, validator_path};

/// Log progress every this many bytes.
const PROGRESS_INTERVAL: u64 = 256 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Bytes received in this call
    pub downloaded: u64,
    /// Bytes already on disk that were kept
    pub resumed_from: u64,
}

impl DownloadOutcome {
    pub fn total(&self) -> u64 {
        self.downloaded + self.resumed_from
    }
}

pub struct Downloader {
    client: reqwest::Client,
    user_agent: String,
}

impl Downloader {
    pub fn new(user_agent: impl Into<String>, connect_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| PipelineError::Download {
                url: String::new(),
                source: Box::new(e),
            })?;
        Ok(Self {
            client,
            user_agent: user_agent.into(),
        })
    }

    /// Download `url` to `dest`, resuming a previous partial transfer.
    pub async fn fetch(&self, url: &str, dest: &Path) -> Result<DownloadOutcome> {
        let part = partial_path(dest);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::io(parent, e))?;
        }

        let existing = match fs::metadata(&part).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };
        let validator_file = validator_path(dest);
        let stored = read_validator(&validator_file).await;

        let mut request = self.client.get(url).header(USER_AGENT, &self.user_agent);
        let offset = match &stored {
            Some(validator) if existing > 0 => {
                debug!(url = %url, offset = existing, validator = %validator, "resuming download");
                request = request
                    .header(RANGE, format!("bytes={}-", existing))
                    .header(IF_RANGE, validator.as_str());
                existing
            }
            None if existing > 0 => {
                info!(url = %url, bytes = existing, "partial download has no validator, restarting");
                0
            }
            _ => 0,
        };

        let mut response = request.send().await.map_err(|e| download_error(url, e))?;
        let status = response.status();

        let resumed_from = match status {
            StatusCode::PARTIAL_CONTENT if offset > 0 => offset,
            StatusCode::RANGE_NOT_SATISFIABLE if offset > 0 => {
                // Validator matched and nothing is left to send.
                info!(url = %url, bytes = offset, "partial download already complete");
                finish(&part, dest).await?;
                return Ok(DownloadOutcome {
                    downloaded: 0,
                    resumed_from: offset,
                });
            }
            s if s.is_success() => {
                if offset > 0 {
                    info!(url = %url, "remote file changed, restarting download");
                }
                0
            }
            s => {
                return Err(PipelineError::Http {
                    url: url.to_string(),
                    status: s.as_u16(),
                })
            }
        };

        if resumed_from == 0 {
            match response_validator(response.headers()) {
                Some(validator) => fs::write(&validator_file, validator)
                    .await
                    .map_err(|e| PipelineError::io(&validator_file, e))?,
                None => remove_if_exists(&validator_file).await?,
            }
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if resumed_from > 0 {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let mut file = options
            .open(&part)
            .await
            .map_err(|e| PipelineError::io(&part, e))?;

        info!(
            url = %url,
            dest = %dest.display(),
            resumed_from,
            size = ?response.content_length(),
            "downloading"
        );

        let mut downloaded: u64 = 0;
        let mut next_report = PROGRESS_INTERVAL;
        loop {
            let chunk = match response.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    // keep what arrived for the next attempt to resume from
                    file.flush().await.map_err(|e| PipelineError::io(&part, e))?;
                    return Err(download_error(url, e));
                }
            };
            file.write_all(&chunk)
                .await
                .map_err(|e| PipelineError::io(&part, e))?;
            downloaded += chunk.len() as u64;
            if downloaded >= next_report {
                info!(url = %url, bytes = downloaded + resumed_from, "download progress");
                next_report += PROGRESS_INTERVAL;
            }
        }

        file.flush().await.map_err(|e| PipelineError::io(&part, e))?;
        file.sync_all().await.map_err(|e| PipelineError::io(&part, e))?;
        drop(file);

        finish(&part, dest).await?;
        info!(dest = %dest.display(), bytes = downloaded + resumed_from, "download complete");

        Ok(DownloadOutcome {
            downloaded,
            resumed_from,
        })
    }
}

async fn finish(part: &Path, dest: &Path) -> Result<()> {
    fs::rename(part, dest)
        .await
        .map_err(|e| PipelineError::io(dest, e))?;
    remove_if_exists(&validator_path(dest)).await
}

async fn read_validator(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).await.ok()?;
    let validator = content.trim();
    (!validator.is_empty()).then(|| validator.to_string())
}

/// Strong `ETag`, else `Last-Modified`. Weak tags cannot be used in `If-Range`.
fn response_validator(headers: &HeaderMap) -> Option<String> {
    let header = |name: HeaderName| headers.get(name).and_then(|v| v.to_str().ok());
    match header(ETAG) {
        Some(etag) if !etag.starts_with("W/") => Some(etag.to_string()),
        _ => header(LAST_MODIFIED).map(str::to_string),
    }
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PipelineError::io(path, e)),
    }
}

fn download_error(url: &str, e: reqwest::Error) -> PipelineError {
    PipelineError::Download {
        url: url.to_string(),
        source: Box::new(e),
    }
}
