//! Remote image fetching.
//!
//! [`RemoteFetcher`] is the seam the ingestion pipeline uses for
//! `ingest_from_url`. [`HttpFetcher`] implements it with `reqwest`. The
//! canvas runs on a single thread, so the trait is `?Send`.

use crate::config::FetchConfig;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid URL {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("server answered {status}")]
    Status { status: u16 },
    #[error("client setup failed: {0}")]
    Client(String),
}

/// Bytes fetched from a remote source.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedImage {
    /// The `Content-Type` header, when the server sent one.
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait(?Send)]
pub trait RemoteFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError>;
}

/// `reqwest`-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait(?Send)]
impl RemoteFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        debug!(%url, "fetching image");

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        Ok(FetchedImage {
            media_type,
            bytes: bytes.to_vec(),
        })
    }
}
