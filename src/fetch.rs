use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use crate::config::FetchConfig;
use crate::error::{AppError, AppResult};

/// Downloads source images over HTTP
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: Client,
}

impl ImageFetcher {
    pub fn new(config: &FetchConfig) -> AppResult<Self> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self { client })
    }

    /// GET `url` once. A non-2xx status is an error carrying that status.
    pub async fn fetch(&self, url: &str) -> AppResult<Bytes> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ImageDownload {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        debug!("Downloaded {} bytes from {}", body.len(), url);
        Ok(body)
    }
}
