//! Fetch-validate-decode pipeline.
//!
//! Performs an HTTP GET, validates the response status, and decodes the JSON
//! body into a caller-provided type. Network access goes through the
//! [`Transport`] trait so the HTTP client can be swapped for a mock in tests.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The input string was not a valid absolute URL.
    #[error("Invalid URL: {0}")]
    BadUrl(String),

    /// Reserved for request construction failures (headers, method). No
    /// current code path produces it.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The transport result was not recognizable as an HTTP response.
    #[error("Did not get a recognizable HTTP response")]
    BadResponse,

    /// The response status code was outside the 2xx success range.
    #[error("HTTP status {status} outside the success range")]
    BadStatus { status: u16 },

    /// The body could not be decoded into the target type. The concrete
    /// decode failure is kept as the source for diagnostics.
    #[error("Failed to decode response into the given type")]
    FailedToDecodeResponse(#[source] serde_json::Error),

    /// A transport-level failure (connectivity, DNS, TLS, timeout), passed
    /// through unmodified.
    #[error("{0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(Box::new(err))
    }
}

/// Raw response handed back by a transport: status code plus body bytes.
///
/// Consumed only by the pipeline, never exposed to callers.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// A transport capable of performing a GET request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a GET against `url` with the given extra headers.
    async fn perform(
        &self,
        url: &Url,
        headers: &HashMap<String, String>,
    ) -> Result<RawResponse, FetchError>;
}

/// Configuration for the reqwest-backed transport.
///
/// Timeouts live here: the pipeline itself imposes no time bound.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Request timeout; `None` leaves requests unbounded
    pub timeout: Option<Duration>,

    /// User agent string
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            user_agent: "typed-fetch/0.1.0".to_string(),
        }
    }
}

/// HTTP transport backed by a shared reqwest client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the given configuration.
    pub fn new(config: TransportConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("typed-fetch/0.1.0")),
        );

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client })
    }

    /// Create a transport with default configuration.
    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(TransportConfig::default())
    }

    /// Convert string headers into a reqwest header map, skipping any pair
    /// not representable as an HTTP header name/value.
    fn header_map(headers: &HashMap<String, String>) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    map.insert(name, value);
                }
                _ => warn!("Skipping unrepresentable header {}", name),
            }
        }
        map
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn perform(
        &self,
        url: &Url,
        headers: &HashMap<String, String>,
    ) -> Result<RawResponse, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .headers(Self::header_map(headers))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Client orchestrating the fetch-validate-decode pipeline.
///
/// Holds no mutable state; calls are independent and may run concurrently.
/// Dropping an in-flight future aborts the underlying request without
/// attempting a partial decode.
pub struct FetchClient<T: Transport = HttpTransport> {
    transport: T,
}

impl FetchClient<HttpTransport> {
    /// Create a client with the default HTTP transport.
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            transport: HttpTransport::with_defaults()?,
        })
    }

    /// Create a client with a configured HTTP transport.
    pub fn with_config(config: TransportConfig) -> Result<Self, FetchError> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }
}

impl<T: Transport> FetchClient<T> {
    /// Create a client over any transport.
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// Strict fetch: GET `url` and decode the JSON body into `D`.
    ///
    /// Every failure is propagated with its classified kind; transport-level
    /// failures pass through unmodified. No retries at this layer.
    pub async fn fetch_one<D: DeserializeOwned>(
        &self,
        url: &str,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<D, FetchError> {
        let empty = HashMap::new();
        let headers = headers.unwrap_or(&empty);

        let url = Url::parse(url).map_err(|_| FetchError::BadUrl(url.to_string()))?;

        debug!("Fetching {}", url);
        let raw = self.transport.perform(&url, headers).await?;

        let status = StatusCode::from_u16(raw.status).map_err(|_| FetchError::BadResponse)?;
        if !status.is_success() {
            debug!("Fetch of {} returned status {}", url, raw.status);
            return Err(FetchError::BadStatus { status: raw.status });
        }

        serde_json::from_slice(&raw.body).map_err(|err| {
            warn!("Failed to decode response from {}: {}", url, err);
            FetchError::FailedToDecodeResponse(err)
        })
    }

    /// Lenient fetch: GET `url` and decode the JSON body into a list of `D`.
    ///
    /// Never fails: any failure along the pipeline is logged and yields an
    /// empty vec. Use [`Self::fetch_one`] when the caller needs to
    /// distinguish failure causes.
    pub async fn fetch_all<D: DeserializeOwned>(&self, url: &str) -> Vec<D> {
        match self.fetch_one::<Vec<D>>(url, None).await {
            Ok(items) => items,
            Err(err) => {
                warn!("Fetch of {} failed, returning no items: {}", url, err);
                Vec::new()
            }
        }
    }
}
