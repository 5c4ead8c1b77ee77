//! Video service: validation in front of an injected backend.

use super::backend::VideoBackend;
use super::client::HttpBackend;
use super::simulated::SimulatedBackend;
use crate::catalog::Catalog;
use crate::validation::check_query;
use anyhow::{Context, Result};
use shared::{
    AnalyticsEvent, BackendMode, Config, GenerateVideoRequest, GenerateVideoResponse,
    GenerationError, VideoDescriptor, VideoMetadata, VideoStatus,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Entry point for generation, status, metadata and analytics calls
#[derive(Clone)]
pub struct VideoService {
    backend: Arc<dyn VideoBackend>,
}

impl VideoService {
    /// Wrap an already-built backend
    pub fn new(backend: Arc<dyn VideoBackend>) -> Self {
        Self { backend }
    }

    /// Build the service and its backend from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend: Arc<dyn VideoBackend> = match config.api.mode {
            BackendMode::Simulated => {
                let catalog = Catalog::from_config(config).context("Failed to load catalog")?;
                Arc::new(SimulatedBackend::new(
                    Arc::new(catalog),
                    config.simulation.clone(),
                ))
            }
            BackendMode::Http => Arc::new(
                HttpBackend::new(&config.api).context("Failed to create HTTP backend")?,
            ),
        };

        info!(
            backend = backend.name(),
            base_url = %config.api.base_url,
            "Video service initialized"
        );

        Ok(Self::new(backend))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Validate and submit a request
    pub async fn try_generate(
        &self,
        request: &GenerateVideoRequest,
    ) -> Result<VideoDescriptor, GenerationError> {
        check_query(&request.query)?;

        info!(query = %request.query, backend = self.backend.name(), "Generating video");
        let result = self.backend.generate_video(request).await;

        match &result {
            Ok(video) => info!(video_id = %video.video_id, "Video generation accepted"),
            Err(e) if e.is_rejection() => {
                warn!(code = e.code(), error = %e, "Video generation rejected")
            }
            Err(e) => error!(code = e.code(), error = %e, "Video generation failed"),
        }

        result
    }

    /// Validate and submit a request, answering with a response envelope
    pub async fn generate_video(&self, request: &GenerateVideoRequest) -> GenerateVideoResponse {
        self.try_generate(request).await.into()
    }

    /// Current status of a video
    pub async fn video_status(&self, video_id: &str) -> Result<VideoStatus, GenerationError> {
        self.backend.video_status(video_id).await.map_err(|e| {
            error!(video_id, error = %e, "Failed to get video status");
            e
        })
    }

    /// Metadata of a finished video
    pub async fn video_metadata(&self, video_id: &str) -> Result<VideoMetadata, GenerationError> {
        self.backend.video_metadata(video_id).await.map_err(|e| {
            error!(video_id, error = %e, "Failed to get video metadata");
            e
        })
    }

    /// Deliver an analytics event; failures are logged and dropped
    pub async fn track_event(&self, event: &AnalyticsEvent) {
        if let Err(e) = self.backend.track_event(event).await {
            warn!(event_type = %event.event_type, error = %e, "Analytics tracking failed");
        }
    }
}
