//! Generation state machine.
//!
//! Drives one question through `idle → generating → polling → ready | failed`
//! (or `rejected` when the request is refused) and publishes every state change
//! on a watch channel for the front-end.
//!
//! Each submission gets a new epoch and a cancellation token. Starting another
//! submission or calling [`VideoGenerator::reset`] cancels the token and bumps
//! the epoch; state writes carrying an older epoch are dropped, so a request
//! that resolves after a reset cannot resurrect its result.

use crate::api::VideoService;
use crate::validation::check_query;
use serde::Serialize;
use shared::config::GenerationConfig;
use shared::{
    AnalyticsEvent, GenerateVideoRequest, GenerationError, VideoDescriptor, VideoMetadata,
    VideoStatusKind,
};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

/// Where a generation currently stands
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GenerationPhase {
    #[default]
    Idle,
    Generating,
    Polling,
    Ready,
    Failed,
    Rejected,
}

impl GenerationPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GenerationPhase::Ready | GenerationPhase::Failed | GenerationPhase::Rejected
        )
    }
}

impl std::fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationPhase::Idle => write!(f, "idle"),
            GenerationPhase::Generating => write!(f, "generating"),
            GenerationPhase::Polling => write!(f, "polling"),
            GenerationPhase::Ready => write!(f, "ready"),
            GenerationPhase::Failed => write!(f, "failed"),
            GenerationPhase::Rejected => write!(f, "rejected"),
        }
    }
}

/// Error recorded in the state for display
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StateError {
    pub message: String,
    pub code: String,
}

impl From<&GenerationError> for StateError {
    fn from(error: &GenerationError) -> Self {
        Self {
            message: error.to_string(),
            code: error.code().to_string(),
        }
    }
}

/// Snapshot of a generation as seen by the front-end
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationState {
    pub phase: GenerationPhase,
    /// 0-100, never decreases while polling
    pub progress: u8,
    /// Seconds until the video should be ready
    pub estimated_time: f64,
    pub error: Option<StateError>,
    pub video_data: Option<VideoDescriptor>,
    pub video_metadata: Option<VideoMetadata>,
}

impl GenerationState {
    pub fn is_generating(&self) -> bool {
        matches!(
            self.phase,
            GenerationPhase::Generating | GenerationPhase::Polling
        )
    }

    pub fn is_polling(&self) -> bool {
        self.phase == GenerationPhase::Polling
    }

    fn generating() -> Self {
        Self {
            phase: GenerationPhase::Generating,
            ..Default::default()
        }
    }

    /// Record a submission error; refusals become `Rejected`
    fn fail(&mut self, error: &GenerationError) {
        let phase = if error.is_rejection() {
            GenerationPhase::Rejected
        } else {
            GenerationPhase::Failed
        };
        self.end(phase, error);
    }

    fn end(&mut self, phase: GenerationPhase, error: &GenerationError) {
        self.phase = phase;
        self.error = Some(StateError::from(error));
    }
}

#[derive(Default)]
struct Control {
    cancel: Option<CancellationToken>,
    last_request: Option<GenerateVideoRequest>,
    /// Polling tasks that may still be running, analytics delivery included
    tasks: Vec<JoinHandle<()>>,
}

struct Inner {
    service: VideoService,
    poll_interval: Duration,
    default_estimated_time: f64,
    state: watch::Sender<GenerationState>,
    epoch: AtomicU64,
    control: Mutex<Control>,
    /// Parent of every per-generation token
    root: CancellationToken,
}

impl Inner {
    fn control(&self) -> MutexGuard<'_, Control> {
        self.control
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Apply `update` unless a newer generation (or a reset) has started
    fn apply(&self, epoch: u64, update: impl FnOnce(&mut GenerationState)) -> bool {
        self.state.send_if_modified(|state| {
            if self.current_epoch() != epoch {
                return false;
            }
            update(state);
            true
        })
    }

    fn fail(&self, epoch: u64, error: &GenerationError) {
        if self.apply(epoch, |state| state.fail(error)) {
            info!(epoch, code = error.code(), error = %error, "Generation ended with error");
        }
    }

    /// Once polling has started every error is a failure, whatever its kind
    fn fail_polling(&self, epoch: u64, error: &GenerationError) {
        if self.apply(epoch, |state| state.end(GenerationPhase::Failed, error)) {
            info!(epoch, code = error.code(), error = %error, "Polling ended with error");
        }
    }
}

/// What a polling task needs to finish a generation
struct PollJob {
    epoch: u64,
    token: CancellationToken,
    video_id: String,
    query: String,
    teacher: String,
}

/// Run `future` unless `token` is cancelled first
async fn unless_cancelled<F: Future>(token: &CancellationToken, future: F) -> Option<F::Output> {
    tokio::select! {
        _ = token.cancelled() => None,
        output = future => Some(output),
    }
}

/// Front-end handle on the generation state machine.
///
/// Cheap to clone; all clones share one state. Dropping the last clone cancels
/// any polling still in flight.
#[derive(Clone)]
pub struct VideoGenerator {
    inner: Arc<Inner>,
    _shutdown: Arc<DropGuard>,
}

impl VideoGenerator {
    pub fn new(service: VideoService, config: &GenerationConfig) -> Self {
        let (state, _) = watch::channel(GenerationState::default());
        let root = CancellationToken::new();

        Self {
            _shutdown: Arc::new(root.clone().drop_guard()),
            inner: Arc::new(Inner {
                service,
                poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
                default_estimated_time: config.default_estimated_time_secs,
                state,
                epoch: AtomicU64::new(0),
                control: Mutex::new(Control::default()),
                root,
            }),
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> GenerationState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.inner.state.subscribe()
    }

    /// Wait until nothing is generating and return the settled state
    pub async fn wait_until_settled(&self) -> GenerationState {
        let mut rx = self.subscribe();
        let settled = match rx.wait_for(|state| !state.is_generating()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    /// Submit a request, superseding any generation in flight.
    ///
    /// Returns once the submission itself has resolved: the state is then
    /// `polling` (and a background task keeps polling), or terminal.
    pub async fn submit(&self, request: GenerateVideoRequest) -> GenerationState {
        let (epoch, token) = self.begin(&request);
        info!(epoch, query = %request.query, "Starting video generation");

        if let Err(e) = check_query(&request.query) {
            self.inner.fail(epoch, &e);
            return self.state();
        }

        let Some(result) = unless_cancelled(&token, self.inner.service.try_generate(&request)).await
        else {
            debug!(epoch, "Submission superseded, discarding result");
            return self.state();
        };

        match result {
            Ok(video) => {
                let job = PollJob {
                    epoch,
                    token,
                    video_id: video.video_id.clone(),
                    query: request.query.clone(),
                    teacher: video.teacher.clone(),
                };
                let default_estimate = self.inner.default_estimated_time;

                let started = self.inner.apply(epoch, |state| {
                    state.estimated_time = video.estimated_time.unwrap_or(default_estimate);
                    state.video_data = Some(video);
                    state.phase = GenerationPhase::Polling;
                });

                if started {
                    info!(epoch, video_id = %job.video_id, "Polling video status");
                    let task = tokio::spawn(poll_until_settled(Arc::clone(&self.inner), job));
                    let mut control = self.inner.control();
                    control.tasks.retain(|task| !task.is_finished());
                    control.tasks.push(task);
                } else {
                    debug!(epoch, "Submission superseded, discarding result");
                }
            }
            Err(e) => self.inner.fail(epoch, &e),
        }

        self.state()
    }

    /// Re-submit the most recent request; `None` when there is none
    pub async fn retry(&self) -> Option<GenerationState> {
        let request = self.inner.control().last_request.clone()?;
        info!(query = %request.query, "Retrying video generation");
        Some(self.submit(request).await)
    }

    /// Wait for background polling to finish, including analytics delivery.
    ///
    /// `wait_until_settled` returns as soon as the state is terminal; call this
    /// before shutting the runtime down so the `video_generated` event is not
    /// cut off.
    pub async fn finished(&self) {
        let tasks = {
            let mut control = self.inner.control();
            std::mem::take(&mut control.tasks)
        };
        for task in tasks {
            if let Err(e) = task.await {
                if e.is_panic() {
                    warn!(error = %e, "Polling task panicked");
                }
            }
        }
    }

    /// Cancel any polling, forget the last request and return to idle
    pub fn reset(&self) {
        let mut control = self.inner.control();
        if let Some(token) = control.cancel.take() {
            token.cancel();
        }
        control.last_request = None;
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);

        let cleared = self.inner.state.send_if_modified(|state| {
            if *state == GenerationState::default() {
                return false;
            }
            *state = GenerationState::default();
            true
        });

        if cleared {
            info!("Generation state reset");
        }
    }

    /// Cancel the previous generation and open a new epoch
    fn begin(&self, request: &GenerateVideoRequest) -> (u64, CancellationToken) {
        let mut control = self.inner.control();
        if let Some(previous) = control.cancel.take() {
            debug!("Cancelling generation in flight");
            previous.cancel();
        }

        let token = self.inner.root.child_token();
        control.cancel = Some(token.clone());
        control.last_request = Some(request.clone());

        let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.state.send_replace(GenerationState::generating());

        (epoch, token)
    }
}

/// Poll status until ready or failed, then fetch metadata and emit analytics
async fn poll_until_settled(inner: Arc<Inner>, job: PollJob) {
    let PollJob {
        epoch,
        token,
        video_id,
        query,
        teacher,
    } = job;

    let mut ticker = interval(inner.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // First tick fires immediately
        let Some(status) = unless_cancelled(&token, async {
            ticker.tick().await;
            inner.service.video_status(&video_id).await
        })
        .await
        else {
            debug!(epoch, video_id = %video_id, "Polling cancelled");
            return;
        };

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                inner.fail_polling(epoch, &e);
                return;
            }
        };

        let progress = status.progress_percent();
        let remaining = status.remaining_secs();
        let current = inner.apply(epoch, |state| {
            state.progress = state.progress.max(progress);
            state.estimated_time = remaining;
        });
        if !current {
            return;
        }

        debug!(epoch, video_id = %video_id, progress, status = %status.status, "Status polled");

        match status.status {
            VideoStatusKind::Ready => break,
            VideoStatusKind::Generating if progress >= 100 => break,
            VideoStatusKind::Generating => continue,
            VideoStatusKind::Failed => {
                let message = status
                    .error
                    .unwrap_or_else(|| "Video generation failed".to_string());
                inner.fail_polling(epoch, &GenerationError::GenerationFailed(message));
                return;
            }
        }
    }

    let Some(metadata) = unless_cancelled(&token, inner.service.video_metadata(&video_id)).await
    else {
        debug!(epoch, video_id = %video_id, "Metadata fetch cancelled");
        return;
    };

    let metadata = match metadata {
        Ok(metadata) => metadata,
        Err(e) => {
            inner.fail_polling(epoch, &e);
            return;
        }
    };

    let ready = inner.apply(epoch, |state| {
        state.phase = GenerationPhase::Ready;
        state.progress = 100;
        state.estimated_time = 0.0;
        state.video_metadata = Some(metadata);
    });

    if !ready {
        warn!(epoch, video_id = %video_id, "Video finished after being superseded");
        return;
    }

    info!(epoch, video_id = %video_id, "Video ready");
    inner
        .service
        .track_event(&AnalyticsEvent::video_generated(&video_id, &query, &teacher))
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{SimulatedBackend, VideoBackend};
    use crate::catalog::Catalog;
    use async_trait::async_trait;
    use chrono::Utc;
    use shared::config::SimulationConfig;
    use shared::{VideoMetadata, VideoStatus};
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    /// Backend replaying canned status responses
    #[derive(Default)]
    struct ScriptedBackend {
        generate_delay: Duration,
        track_delay: Duration,
        statuses: Mutex<VecDeque<Result<VideoStatus, GenerationError>>>,
        generate_calls: AtomicUsize,
        events: Mutex<Vec<AnalyticsEvent>>,
    }

    impl ScriptedBackend {
        fn with_statuses(statuses: Vec<Result<VideoStatus, GenerationError>>) -> Self {
            Self {
                statuses: Mutex::new(statuses.into()),
                ..Default::default()
            }
        }

        fn events(&self) -> Vec<AnalyticsEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    fn status(kind: VideoStatusKind, progress: u8) -> Result<VideoStatus, GenerationError> {
        Ok(VideoStatus {
            video_id: "scripted".to_string(),
            status: kind,
            progress: Some(f64::from(progress)),
            estimated_time_remaining: Some(f64::from(100 - progress) / 2.0),
            error: None,
        })
    }

    #[async_trait]
    impl VideoBackend for ScriptedBackend {
        async fn generate_video(
            &self,
            request: &GenerateVideoRequest,
        ) -> Result<VideoDescriptor, GenerationError> {
            let call = self.generate_calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.generate_delay).await;

            Ok(VideoDescriptor {
                video_id: format!("scripted_{}", call),
                title: request.query.clone(),
                description: String::new(),
                teacher: "Raju Master".to_string(),
                duration: 60,
                video_url: String::new(),
                thumbnail_url: String::new(),
                status: VideoStatusKind::Generating,
                estimated_time: None,
            })
        }

        async fn video_status(&self, video_id: &str) -> Result<VideoStatus, GenerationError> {
            let next = self.statuses.lock().unwrap().pop_front();
            next.unwrap_or_else(|| status(VideoStatusKind::Ready, 100))
                .map(|mut status| {
                    status.video_id = video_id.to_string();
                    status
                })
        }

        async fn video_metadata(&self, video_id: &str) -> Result<VideoMetadata, GenerationError> {
            Ok(VideoMetadata {
                video_id: video_id.to_string(),
                title: "Scripted".to_string(),
                description: String::new(),
                teacher: "Raju Master".to_string(),
                query: "scripted".to_string(),
                duration: 60,
                created_at: Utc::now(),
                views: 0,
                likes: 0,
                video_url: String::new(),
                thumbnail_url: String::new(),
            })
        }

        async fn track_event(&self, event: &AnalyticsEvent) -> Result<(), GenerationError> {
            tokio::time::sleep(self.track_delay).await;
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn generator_over(backend: Arc<dyn VideoBackend>) -> VideoGenerator {
        VideoGenerator::new(VideoService::new(backend), &GenerationConfig::default())
    }

    fn simulated(seed: u64) -> (Arc<SimulatedBackend>, VideoGenerator) {
        let backend = Arc::new(SimulatedBackend::new(
            Arc::new(Catalog::builtin().clone()),
            SimulationConfig {
                seed: Some(seed),
                ..Default::default()
            },
        ));
        let generator = generator_over(backend.clone());
        (backend, generator)
    }

    fn assert_invariant(state: &GenerationState) {
        if state.is_polling() {
            assert!(state.is_generating(), "polling without generating: {:?}", state);
        }
        if !state.is_generating() {
            assert!(!state.is_polling());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_matching_question_becomes_ready() {
        let (backend, generator) = simulated(21);

        let submitted = generator
            .submit(GenerateVideoRequest::new("Explain organic chemistry"))
            .await;

        assert_eq!(submitted.phase, GenerationPhase::Polling);
        assert!(submitted.is_generating());
        let video = submitted.video_data.clone().unwrap();
        assert_eq!(video.teacher, "Master Maagne");
        assert!((0.8..=2.0).contains(&submitted.estimated_time));

        let settled = generator.wait_until_settled().await;
        assert_eq!(settled.phase, GenerationPhase::Ready);
        assert_eq!(settled.progress, 100);
        assert_eq!(settled.estimated_time, 0.0);
        assert!(settled.error.is_none());
        assert_eq!(settled.video_metadata.unwrap().video_id, video.video_id);
        assert_invariant(&generator.state());

        // Analytics is sent right after the ready transition
        tokio::time::sleep(Duration::from_millis(10)).await;
        let events = backend.recorded_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].video_id.as_deref(), Some(video.video_id.as_str()));
        assert_eq!(events[0].query.as_deref(), Some("Explain organic chemistry"));
        assert_eq!(events[0].teacher.as_deref(), Some("Master Maagne"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmatched_question_is_rejected() {
        let (_, generator) = simulated(22);

        let state = generator
            .submit(GenerateVideoRequest::new("xyz completely unrelated"))
            .await;

        assert_eq!(state.phase, GenerationPhase::Rejected);
        assert_eq!(state.error.as_ref().unwrap().code, "AI_CREDIT_LIMIT_EXCEEDED");
        assert!(!state.is_generating());
        assert!(!state.is_polling());
        assert!(state.video_data.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_query_never_reaches_backend() {
        let backend = Arc::new(ScriptedBackend::default());
        let generator = generator_over(backend.clone());

        let state = generator.submit(GenerateVideoRequest::new("ab")).await;
        assert_eq!(state.phase, GenerationPhase::Rejected);
        assert_eq!(state.error.as_ref().unwrap().code, "QUERY_TOO_SHORT");

        let state = generator
            .submit(GenerateVideoRequest::new("q".repeat(201)))
            .await;
        assert_eq!(state.error.as_ref().unwrap().code, "QUERY_TOO_LONG");

        assert_eq!(backend.generate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_never_decreases() {
        let backend = Arc::new(ScriptedBackend::with_statuses(vec![
            status(VideoStatusKind::Generating, 40),
            status(VideoStatusKind::Generating, 10),
        ]));
        let generator = generator_over(backend);
        let mut rx = generator.subscribe();

        generator
            .submit(GenerateVideoRequest::new("Explain organic chemistry"))
            .await;

        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            assert_invariant(&state);
            let terminal = state.phase.is_terminal();
            seen.push(state);
            if terminal {
                break;
            }
        }

        let polled: Vec<u8> = seen
            .iter()
            .filter(|s| s.is_polling())
            .map(|s| s.progress)
            .collect();
        assert!(polled.windows(2).all(|w| w[0] <= w[1]), "{:?}", polled);
        assert_eq!(seen.last().unwrap().phase, GenerationPhase::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_100_counts_as_ready() {
        let backend = Arc::new(ScriptedBackend::with_statuses(vec![status(
            VideoStatusKind::Generating,
            100,
        )]));
        let generator = generator_over(backend);

        generator
            .submit(GenerateVideoRequest::new("Explain organic chemistry"))
            .await;
        let state = generator.wait_until_settled().await;

        assert_eq!(state.phase, GenerationPhase::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_failure_while_polling() {
        let mut failed = status(VideoStatusKind::Failed, 55).unwrap();
        failed.error = Some("Renderer crashed".to_string());
        let backend = Arc::new(ScriptedBackend::with_statuses(vec![
            status(VideoStatusKind::Generating, 55),
            Ok(failed),
        ]));
        let generator = generator_over(backend.clone());

        generator
            .submit(GenerateVideoRequest::new("Explain organic chemistry"))
            .await;
        let state = generator.wait_until_settled().await;

        assert_eq!(state.phase, GenerationPhase::Failed);
        assert!(!state.is_polling());
        assert_eq!(state.progress, 55);
        let error = state.error.as_ref().unwrap();
        assert_eq!(error.message, "Renderer crashed");
        assert_eq!(error.code, "GENERATION_FAILED");
        assert!(state.video_metadata.is_none());
        assert!(backend.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_status_without_message() {
        let mut failed = status(VideoStatusKind::Failed, 0).unwrap();
        failed.error = None;
        let generator = generator_over(Arc::new(ScriptedBackend::with_statuses(vec![Ok(failed)])));

        generator
            .submit(GenerateVideoRequest::new("Explain organic chemistry"))
            .await;
        let state = generator.wait_until_settled().await;

        assert_eq!(state.error.as_ref().unwrap().message, "Video generation failed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_while_polling() {
        let backend = Arc::new(ScriptedBackend::with_statuses(vec![Err(
            GenerationError::Network("Request timeout".to_string()),
        )]));
        let generator = generator_over(backend);

        generator
            .submit(GenerateVideoRequest::new("Explain organic chemistry"))
            .await;
        let state = generator.wait_until_settled().await;

        assert_eq!(state.phase, GenerationPhase::Failed);
        let error = state.error.as_ref().unwrap();
        assert_eq!(error.code, "NETWORK_ERROR");
        assert_eq!(error.message, "Request timeout");
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_while_polling_is_a_failure() {
        let backend = Arc::new(ScriptedBackend::with_statuses(vec![
            status(VideoStatusKind::Generating, 20),
            Err(GenerationError::from_code("NOT_FOUND", "Unknown video")),
        ]));
        let generator = generator_over(backend.clone());

        generator
            .submit(GenerateVideoRequest::new("Explain organic chemistry"))
            .await;
        let state = generator.wait_until_settled().await;

        assert_eq!(state.phase, GenerationPhase::Failed);
        assert_eq!(state.progress, 20);
        let error = state.error.as_ref().unwrap();
        assert_eq!(error.code, "NOT_FOUND");
        assert_eq!(error.message, "Unknown video");
        assert!(backend.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_code_while_polling_is_a_failure() {
        let backend = Arc::new(ScriptedBackend::with_statuses(vec![Err(
            GenerationError::NoMatchingContent,
        )]));
        let generator = generator_over(backend);

        generator
            .submit(GenerateVideoRequest::new("Explain organic chemistry"))
            .await;
        let state = generator.wait_until_settled().await;

        assert_eq!(state.phase, GenerationPhase::Failed);
        assert_eq!(state.error.as_ref().unwrap().code, "AI_CREDIT_LIMIT_EXCEEDED");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fractional_progress_is_rounded() {
        let mut halfway = status(VideoStatusKind::Generating, 0).unwrap();
        halfway.progress = Some(42.5);
        halfway.estimated_time_remaining = Some(28.75);
        let backend = Arc::new(ScriptedBackend::with_statuses(vec![
            Ok(halfway),
            status(VideoStatusKind::Generating, 60),
        ]));
        let generator = generator_over(backend);
        let mut rx = generator.subscribe();

        generator
            .submit(GenerateVideoRequest::new("Explain organic chemistry"))
            .await;

        let state = rx
            .wait_for(|state| state.is_polling() && state.progress > 0)
            .await
            .unwrap()
            .clone();
        assert_eq!(state.progress, 43);
        assert_eq!(state.estimated_time, 28.75);

        assert_eq!(generator.wait_until_settled().await.phase, GenerationPhase::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_waits_for_analytics() {
        let backend = Arc::new(ScriptedBackend {
            track_delay: Duration::from_secs(3),
            ..Default::default()
        });
        let generator = generator_over(backend.clone());

        generator
            .submit(GenerateVideoRequest::new("Explain organic chemistry"))
            .await;
        let settled = generator.wait_until_settled().await;
        assert_eq!(settled.phase, GenerationPhase::Ready);
        assert!(backend.events().is_empty());

        generator.finished().await;
        let events = backend.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].query.as_deref(), Some("Explain organic chemistry"));

        // Nothing left to wait for
        generator.finished().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_is_idempotent() {
        let (_, generator) = simulated(23);
        generator
            .submit(GenerateVideoRequest::new("Explain organic chemistry"))
            .await;
        assert!(generator.state().is_polling());

        generator.reset();
        let once = generator.state();
        generator.reset();
        let twice = generator.state();

        assert_eq!(once, GenerationState::default());
        assert_eq!(once, twice);
        assert_eq!(twice.phase, GenerationPhase::Idle);

        // The cancelled polling task must not write anything afterwards
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(generator.state(), GenerationState::default());
        assert!(generator.retry().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_submission_is_discarded_after_reset() {
        let backend = Arc::new(ScriptedBackend {
            generate_delay: Duration::from_secs(5),
            ..Default::default()
        });
        let generator = generator_over(backend);

        let pending = {
            let generator = generator.clone();
            tokio::spawn(async move {
                generator
                    .submit(GenerateVideoRequest::new("Explain organic chemistry"))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(generator.state().phase, GenerationPhase::Generating);
        generator.reset();

        pending.await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(generator.state(), GenerationState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_submission_supersedes_polling() {
        let backend = Arc::new(ScriptedBackend::with_statuses(vec![
            status(VideoStatusKind::Generating, 5),
            status(VideoStatusKind::Generating, 6),
            status(VideoStatusKind::Generating, 7),
        ]));
        let generator = generator_over(backend.clone());

        let first = generator
            .submit(GenerateVideoRequest::new("Explain organic chemistry"))
            .await;
        let second = generator
            .submit(GenerateVideoRequest::new("What are organic compounds?"))
            .await;

        assert_eq!(first.video_data.unwrap().video_id, "scripted_1");
        assert_eq!(second.video_data.as_ref().unwrap().video_id, "scripted_2");
        assert_eq!(second.progress, 0);

        let settled = generator.wait_until_settled().await;
        assert_eq!(settled.phase, GenerationPhase::Ready);
        assert_eq!(settled.video_metadata.unwrap().video_id, "scripted_2");

        tokio::time::sleep(Duration::from_secs(5)).await;
        let events = backend.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].video_id.as_deref(), Some("scripted_2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_resubmits_last_request() {
        let backend = Arc::new(ScriptedBackend::default());
        let generator = generator_over(backend.clone());

        assert!(generator.retry().await.is_none());

        generator
            .submit(GenerateVideoRequest::new("Explain organic chemistry"))
            .await;
        generator.wait_until_settled().await;

        let retried = generator.retry().await.unwrap();
        assert_eq!(retried.phase, GenerationPhase::Polling);
        assert_eq!(retried.video_data.unwrap().title, "Explain organic chemistry");
        assert_eq!(backend.generate_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_estimate_when_backend_gives_none() {
        let generator = generator_over(Arc::new(ScriptedBackend::default()));

        let state = generator
            .submit(GenerateVideoRequest::new("Explain organic chemistry"))
            .await;

        assert_eq!(state.estimated_time, 30.0);
    }

    #[test]
    fn test_terminal_phases() {
        assert!(GenerationPhase::Ready.is_terminal());
        assert!(GenerationPhase::Rejected.is_terminal());
        assert!(!GenerationPhase::Polling.is_terminal());
        assert!(!GenerationPhase::Idle.is_terminal());
    }
}
