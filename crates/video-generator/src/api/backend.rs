//! Backend strategy seam.
//!
//! A [`VideoBackend`] answers the four calls the generation flow makes. The
//! simulated and HTTP implementations are picked once, when the service is built.

use async_trait::async_trait;
use shared::{
    AnalyticsEvent, GenerateVideoRequest, GenerationError, VideoDescriptor, VideoMetadata,
    VideoStatus,
};

#[async_trait]
pub trait VideoBackend: Send + Sync {
    /// Submit a (validated) request and get the video being produced
    async fn generate_video(
        &self,
        request: &GenerateVideoRequest,
    ) -> Result<VideoDescriptor, GenerationError>;

    /// Current production status of a video
    async fn video_status(&self, video_id: &str) -> Result<VideoStatus, GenerationError>;

    /// Metadata of a finished video
    async fn video_metadata(&self, video_id: &str) -> Result<VideoMetadata, GenerationError>;

    /// Deliver an analytics event
    async fn track_event(&self, event: &AnalyticsEvent) -> Result<(), GenerationError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}
