//! Source document the seeds are extracted from.

use reqwest::Client;
use std::path::PathBuf;

use crate::error::{FrontierError, Result};

/// Where to read the note from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteSource {
    Url(String),
    Path(PathBuf),
}

impl NoteSource {
    /// Fetch or read the note text.
    pub async fn load(&self, client: &Client) -> Result<String> {
        match self {
            NoteSource::Path(path) => {
                log::info!("Reading note from {}", path.display());
                Ok(tokio::fs::read_to_string(path).await?)
            }
            NoteSource::Url(url) => {
                log::info!("Downloading note from {}", url);
                let response = client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| FrontierError::Http(format!("GET {}: {}", url, e)))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FrontierError::Http(format!("GET {} returned {}", url, status)));
                }
                response
                    .text()
                    .await
                    .map_err(|e| FrontierError::Http(format!("reading {}: {}", url, e)))
            }
        }
    }
}
