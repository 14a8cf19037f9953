//! Fetching the schedule and trips feeds.
//!
//! A source is either an `http(s)://` URL or a filesystem path. Both feeds of
//! a pair are fetched concurrently and the pair fails as a unit.

use std::fmt;
use std::path::PathBuf;

use log::debug;

use crate::config::FeedSettings;
use crate::db::checksum::calculate_checksum;
use crate::models::feed::FeedDocument;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[cfg(feature = "http-feeds")]
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to read feed file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Feed from {source_name} is not valid JSON: {source}")]
    Decode {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Feed source {0} is not supported by this build")]
    Unsupported(String),

    #[error("Feed sources are not configured")]
    NotConfigured,
}

/// Where one feed is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Http(String),
    File(PathBuf),
}

impl FeedSource {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            FeedSource::Http(raw.to_string())
        } else {
            FeedSource::File(PathBuf::from(raw.strip_prefix("file://").unwrap_or(raw)))
        }
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedSource::Http(url) => f.write_str(url),
            FeedSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One fetched and decoded feed body.
#[derive(Debug, Clone)]
pub struct RawFeed {
    pub source: String,
    pub document: FeedDocument,
    /// SHA-256 of the raw body.
    pub checksum: String,
}

impl RawFeed {
    pub fn from_bytes(source: impl Into<String>, body: &[u8]) -> Result<Self, FeedError> {
        let source = source.into();
        let document = FeedDocument::from_slice(body).map_err(|e| FeedError::Decode {
            source_name: source.clone(),
            source: e,
        })?;
        Ok(Self {
            checksum: calculate_checksum(body),
            source,
            document,
        })
    }

    /// Change marker: `meta.generated_at` when the feed carries one, the body
    /// checksum otherwise.
    pub fn fingerprint(&self) -> String {
        match self.document.meta.generated_at.as_deref() {
            Some(at) => format!("generated_at:{}", at),
            None => format!("sha256:{}", self.checksum),
        }
    }
}

/// A fetched schedule/trips pair.
#[derive(Debug, Clone)]
pub struct FeedPair {
    pub schedule: RawFeed,
    pub trips: RawFeed,
}

pub struct FeedClient {
    schedule: FeedSource,
    trips: FeedSource,
    #[cfg(feature = "http-feeds")]
    http: reqwest::Client,
}

impl FeedClient {
    pub fn new(settings: &FeedSettings) -> Result<Self, FeedError> {
        if !settings.is_configured() {
            return Err(FeedError::NotConfigured);
        }

        #[cfg(feature = "http-feeds")]
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| FeedError::Http {
                url: settings.schedule.clone(),
                source: e,
            })?;

        Ok(Self {
            schedule: FeedSource::parse(&settings.schedule),
            trips: FeedSource::parse(&settings.trips),
            #[cfg(feature = "http-feeds")]
            http,
        })
    }

    pub fn schedule_source(&self) -> &FeedSource {
        &self.schedule
    }

    pub fn trips_source(&self) -> &FeedSource {
        &self.trips
    }

    /// Fetch both feeds concurrently. Either failure fails the pair.
    pub async fn fetch_pair(&self) -> Result<FeedPair, FeedError> {
        let (schedule, trips) = tokio::try_join!(self.fetch(&self.schedule), self.fetch(&self.trips))?;
        Ok(FeedPair { schedule, trips })
    }

    pub async fn fetch(&self, source: &FeedSource) -> Result<RawFeed, FeedError> {
        let body = match source {
            FeedSource::File(path) => tokio::fs::read(path).await.map_err(|e| FeedError::Io {
                path: path.clone(),
                source: e,
            })?,
            FeedSource::Http(url) => self.fetch_http(url).await?,
        };
        debug!("Fetched {} bytes from {}", body.len(), source);
        RawFeed::from_bytes(source.to_string(), &body)
    }

    #[cfg(feature = "http-feeds")]
    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>, FeedError> {
        let http_err = |e| FeedError::Http {
            url: url.to_string(),
            source: e,
        };
        let response = self.http.get(url).send().await.map_err(http_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(http_err)?;
        Ok(body.to_vec())
    }

    #[cfg(not(feature = "http-feeds"))]
    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>, FeedError> {
        Err(FeedError::Unsupported(url.to_string()))
    }
}
