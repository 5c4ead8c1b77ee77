//! In-process backend that "generates" videos by matching the demo catalog.
//!
//! Every call sleeps for a network-like delay. Status progress is random but
//! biased toward completion: roughly one sample in six reports `ready`.

use super::backend::VideoBackend;
use crate::catalog::Catalog;
use crate::storage;
use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::config::SimulationConfig;
use shared::{
    AnalyticsEvent, CatalogEntry, GenerateVideoRequest, GenerationError, VideoDescriptor,
    VideoMetadata, VideoStatus, VideoStatusKind,
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

const DEMO_PREFIX: &str = "demo_";

/// Simulated video backend
pub struct SimulatedBackend {
    catalog: Arc<Catalog>,
    timings: SimulationConfig,
    rng: Mutex<StdRng>,
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl SimulatedBackend {
    /// Create a simulated backend over a catalog
    pub fn new(catalog: Arc<Catalog>, timings: SimulationConfig) -> Self {
        let rng = match timings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            catalog,
            timings,
            rng: Mutex::new(rng),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Analytics events received so far
    pub fn recorded_events(&self) -> Vec<AnalyticsEvent> {
        self.events().clone()
    }

    fn events(&self) -> MutexGuard<'_, Vec<AnalyticsEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run a closure with the backend's RNG (never held across an await)
    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    fn submit_delay(&self) -> Duration {
        let min = self.timings.submit_delay_min_ms;
        let max = self.timings.submit_delay_max_ms.max(min);
        Duration::from_millis(self.with_rng(|rng| rng.gen_range(min..=max)))
    }

    fn describe(&self, entry: &CatalogEntry) -> VideoDescriptor {
        let estimated_time = self.with_rng(|rng| rng.gen_range(0.8..2.0));

        VideoDescriptor {
            video_id: format!("{}{}_{}", DEMO_PREFIX, entry.id, Utc::now().timestamp_millis()),
            title: entry.title.clone(),
            description: entry.description.clone(),
            teacher: entry.teacher.clone(),
            duration: entry.duration,
            video_url: storage::direct_url(&entry.storage_id),
            thumbnail_url: storage::thumbnail_url(&entry.storage_id),
            status: VideoStatusKind::Generating,
            estimated_time: Some(estimated_time),
        }
    }

    /// Catalog entry a `demo_{entry}_{millis}` identifier was minted from
    fn entry_for(&self, video_id: &str) -> Option<&CatalogEntry> {
        let rest = video_id.strip_prefix(DEMO_PREFIX)?;
        let (entry_id, _millis) = rest.rsplit_once('_')?;
        self.catalog.get(entry_id)
    }
}

#[async_trait]
impl VideoBackend for SimulatedBackend {
    async fn generate_video(
        &self,
        request: &GenerateVideoRequest,
    ) -> Result<VideoDescriptor, GenerationError> {
        sleep(self.submit_delay()).await;

        match self.catalog.find_match(&request.query) {
            Some(entry) => {
                let descriptor = self.describe(entry);
                info!(
                    video_id = %descriptor.video_id,
                    teacher = %descriptor.teacher,
                    "Simulated generation started"
                );
                Ok(descriptor)
            }
            None => Err(GenerationError::NoMatchingContent),
        }
    }

    async fn video_status(&self, video_id: &str) -> Result<VideoStatus, GenerationError> {
        sleep(Duration::from_millis(self.timings.status_delay_ms)).await;

        let raw: f64 = self.with_rng(|rng| rng.gen_range(0.0_f64..120.0)).min(100.0);
        let complete = raw >= 100.0;

        debug!(video_id, progress = raw.round(), "Simulated status");

        Ok(VideoStatus {
            video_id: video_id.to_string(),
            status: if complete {
                VideoStatusKind::Ready
            } else {
                VideoStatusKind::Generating
            },
            progress: Some(raw.round()),
            estimated_time_remaining: Some(if complete {
                0.0
            } else {
                ((100.0 - raw) * 0.5).round()
            }),
            error: None,
        })
    }

    async fn video_metadata(&self, video_id: &str) -> Result<VideoMetadata, GenerationError> {
        sleep(Duration::from_millis(self.timings.metadata_delay_ms)).await;

        let metadata = match self.entry_for(video_id) {
            Some(entry) => {
                let (views, likes) =
                    self.with_rng(|rng| (rng.gen_range(500..1500), rng.gen_range(50..150)));
                VideoMetadata {
                    video_id: video_id.to_string(),
                    title: entry.title.clone(),
                    description: entry.description.clone(),
                    teacher: entry.teacher.clone(),
                    query: entry.topics.first().cloned().unwrap_or_default(),
                    duration: entry.duration,
                    created_at: Utc::now(),
                    views,
                    likes,
                    video_url: storage::direct_url(&entry.storage_id),
                    thumbnail_url: storage::thumbnail_url(&entry.storage_id),
                }
            }
            None => {
                let (views, likes) = self.with_rng(|rng| (rng.gen_range(0..1000), rng.gen_range(0..100)));
                VideoMetadata {
                    video_id: video_id.to_string(),
                    title: "Educational Video".to_string(),
                    description: "A comprehensive explanation by Master Maagne".to_string(),
                    teacher: "Master Maagne".to_string(),
                    query: "general topic".to_string(),
                    duration: 90,
                    created_at: Utc::now(),
                    views,
                    likes,
                    video_url: format!("https://example.com/videos/{}.mp4", video_id),
                    thumbnail_url: format!("https://example.com/thumbnails/{}.jpg", video_id),
                }
            }
        };

        Ok(metadata)
    }

    async fn track_event(&self, event: &AnalyticsEvent) -> Result<(), GenerationError> {
        info!(
            event_type = %event.event_type,
            video_id = ?event.video_id,
            query = ?event.query,
            teacher = ?event.teacher,
            "Analytics event"
        );

        self.events().push(event.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}
