// Page acquisition: fetch over HTTP or read from disk

use linkward_scanner::ScanError;
use linkward_scanner::error::Result;
use reqwest::Client;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Raw document plus the address it is resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSource {
    pub html: String,
    pub url: String,
}

impl PageSource {
    pub fn new(html: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            url: url.into(),
        }
    }

    /// Download a page. The address after redirects becomes the page address.
    pub async fn fetch(url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;

        let client = Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        info!("Fetching page {}", url);
        let response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::PageStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let html = response.text().await?;
        debug!("Fetched {} bytes from {}", html.len(), final_url);

        Ok(Self {
            html,
            url: final_url,
        })
    }

    /// Read a saved page. Without `page_url` the file's own `file://` address is used.
    pub fn from_file(path: &Path, page_url: Option<&str>) -> Result<Self> {
        let html = fs::read_to_string(path)?;

        let url = match page_url {
            Some(url) => {
                Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
                url.to_string()
            }
            None => {
                let absolute = fs::canonicalize(path)?;
                Url::from_file_path(&absolute)
                    .map_err(|_| ScanError::InvalidUrl(absolute.display().to_string()))?
                    .to_string()
            }
        };

        debug!("Read {} bytes from {}", html.len(), path.display());
        Ok(Self { html, url })
    }

    /// Whether `source` names a remote page rather than a file
    pub fn is_remote(source: &str) -> bool {
        source.starts_with("http://") || source.starts_with("https://")
    }
}
