//! HTTP backend for a real video generation API.

use super::backend::VideoBackend;
use super::types::ApiResponse;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use shared::config::ApiConfig;
use shared::{
    AnalyticsEvent, GenerateVideoRequest, GenerationError, VideoDescriptor, VideoMetadata,
    VideoStatus,
};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Video API client
pub struct HttpBackend {
    /// HTTP client
    client: Client,
    /// Base URL, without trailing slash
    base_url: String,
    /// Retries for analytics delivery
    max_retries: u32,
    /// Base delay for retry (exponential backoff)
    retry_delay_ms: u64,
}

impl HttpBackend {
    /// Create a new client from the `[api]` config section
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .user_agent(concat!("video-generator/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.retry_attempts,
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Make a single request and decode the JSON envelope
    async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse<T>, GenerationError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(endpoint);
        debug!(method = %method, url = %url, "Making API request");

        let mut builder = self.client.request(method, &url);
        if let Some(body) = body {
            // `json` also sets Content-Type: application/json
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();

        if !status.is_success() {
            warn!(url = %url, status = %status, "Request failed");
            return Err(http_error(status));
        }

        response.json::<ApiResponse<T>>().await.map_err(|e| {
            warn!(url = %url, error = %e, "Failed to parse response");
            GenerationError::Network(format!("Failed to parse response: {}", e))
        })
    }

    /// Whether a failed delivery is worth another attempt
    fn is_retryable(error: &GenerationError) -> bool {
        matches!(error, GenerationError::Network(_))
    }
}

fn transport_error(error: reqwest::Error) -> GenerationError {
    if error.is_timeout() {
        GenerationError::Network("Request timeout".to_string())
    } else {
        GenerationError::Network(error.to_string())
    }
}

fn http_error(status: StatusCode) -> GenerationError {
    GenerationError::Network(format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown status")
    ))
}

#[async_trait]
impl VideoBackend for HttpBackend {
    async fn generate_video(
        &self,
        request: &GenerateVideoRequest,
    ) -> Result<VideoDescriptor, GenerationError> {
        info!(query = %request.query, "Submitting generation request");
        self.request::<VideoDescriptor, _>(Method::POST, "/videos/generate", Some(request))
            .await?
            .into_result("Failed to generate video")
    }

    async fn video_status(&self, video_id: &str) -> Result<VideoStatus, GenerationError> {
        self.request::<VideoStatus, ()>(Method::GET, &format!("/videos/{}/status", video_id), None)
            .await?
            .into_result("Failed to get video status")
    }

    async fn video_metadata(&self, video_id: &str) -> Result<VideoMetadata, GenerationError> {
        self.request::<VideoMetadata, ()>(Method::GET, &format!("/videos/{}", video_id), None)
            .await?
            .into_result("Failed to get video metadata")
    }

    async fn track_event(&self, event: &AnalyticsEvent) -> Result<(), GenerationError> {
        let mut attempt = 0;
        loop {
            let result = self
                .request::<serde_json::Value, _>(Method::POST, "/analytics/events", Some(event))
                .await;

            match result {
                Ok(_) => return Ok(()),
                Err(e) if attempt < self.max_retries && Self::is_retryable(&e) => {
                    let delay = Duration::from_millis(self.retry_delay_ms * 2u64.pow(attempt));
                    debug!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying analytics delivery"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
