//! Data models for the project.
//!
//! This module defines the catalog records, the request/response shapes
//! exchanged with a video backend, and the analytics event payload.
//! Everything that crosses the wire is serialized with camelCase names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Difficulty tag attached to a catalog video
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "beginner"),
            Difficulty::Intermediate => write!(f, "intermediate"),
            Difficulty::Advanced => write!(f, "advanced"),
        }
    }
}

/// Pre-recorded demo video with the metadata used for matching
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Presenter name shown to users
    pub teacher: String,
    pub topics: Vec<String>,
    pub keywords: Vec<String>,
    /// Length in seconds
    pub duration: u32,
    /// Opaque identifier in external storage
    pub storage_id: String,
    pub difficulty: Difficulty,
}

/// Presenter persona a user may ask for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Presenter {
    MaagneBudo,
    RajuMaster,
    Dhurmusey,
    Einstein,
    SteveJobs,
}

impl std::fmt::Display for Presenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Presenter::MaagneBudo => write!(f, "maagne-budo"),
            Presenter::RajuMaster => write!(f, "raju-master"),
            Presenter::Dhurmusey => write!(f, "dhurmusey"),
            Presenter::Einstein => write!(f, "einstein"),
            Presenter::SteveJobs => write!(f, "steve-jobs"),
        }
    }
}

impl std::str::FromStr for Presenter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maagne-budo" => Ok(Presenter::MaagneBudo),
            "raju-master" => Ok(Presenter::RajuMaster),
            "dhurmusey" => Ok(Presenter::Dhurmusey),
            "einstein" => Ok(Presenter::Einstein),
            "steve-jobs" => Ok(Presenter::SteveJobs),
            _ => Err(anyhow::anyhow!("Invalid presenter: {}", s)),
        }
    }
}

/// Narration language
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Nepali,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::English => write!(f, "english"),
            Language::Nepali => write!(f, "nepali"),
        }
    }
}

impl std::str::FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "english" => Ok(Language::English),
            "nepali" => Ok(Language::Nepali),
            _ => Err(anyhow::anyhow!("Invalid language: {}", s)),
        }
    }
}

/// Requested video length: short (30s), medium (60s), long (120s)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VideoLength {
    Short,
    Medium,
    Long,
}

impl std::fmt::Display for VideoLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoLength::Short => write!(f, "short"),
            VideoLength::Medium => write!(f, "medium"),
            VideoLength::Long => write!(f, "long"),
        }
    }
}

impl std::str::FromStr for VideoLength {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" => Ok(VideoLength::Short),
            "medium" => Ok(VideoLength::Medium),
            "long" => Ok(VideoLength::Long),
            _ => Err(anyhow::anyhow!("Invalid video length: {}", s)),
        }
    }
}

/// Delivery style of the lesson
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Educational,
    Conversational,
    Motivational,
}

impl std::fmt::Display for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Style::Educational => write!(f, "educational"),
            Style::Conversational => write!(f, "conversational"),
            Style::Motivational => write!(f, "motivational"),
        }
    }
}

impl std::str::FromStr for Style {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "educational" => Ok(Style::Educational),
            "conversational" => Ok(Style::Conversational),
            "motivational" => Ok(Style::Motivational),
            _ => Err(anyhow::anyhow!("Invalid style: {}", s)),
        }
    }
}

/// A question plus optional presentation preferences.
///
/// The preferences are forwarded to the backend but do not influence
/// matching against the demo catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<Presenter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<VideoLength>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
}

impl GenerateVideoRequest {
    /// Request with only a query and no preferences
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

/// Backend-side status of a video
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatusKind {
    Generating,
    Ready,
    Failed,
}

impl std::fmt::Display for VideoStatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoStatusKind::Generating => write!(f, "generating"),
            VideoStatusKind::Ready => write!(f, "ready"),
            VideoStatusKind::Failed => write!(f, "failed"),
        }
    }
}

/// Video returned by a successful submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoDescriptor {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub teacher: String,
    pub duration: u32,
    pub video_url: String,
    pub thumbnail_url: String,
    pub status: VideoStatusKind,
    /// Seconds until the video should be ready
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<f64>,
}

/// Error body inside a [`GenerateVideoResponse`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorInfo {
    pub message: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Outcome of a submission in envelope form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateVideoResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<VideoDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl From<Result<VideoDescriptor, crate::GenerationError>> for GenerateVideoResponse {
    fn from(result: Result<VideoDescriptor, crate::GenerationError>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(e) => Self {
                success: false,
                data: None,
                error: Some(ErrorInfo {
                    message: e.to_string(),
                    code: e.code().to_string(),
                    details: None,
                }),
            },
        }
    }
}

/// One status sample while a video is being produced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatus {
    pub video_id: String,
    pub status: VideoStatusKind,
    /// Nominally 0-100; backends may send fractions or stray values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VideoStatus {
    /// Progress rounded and clamped to 0..=100; missing or NaN reads as 0
    pub fn progress_percent(&self) -> u8 {
        match self.progress {
            Some(p) if !p.is_nan() => p.clamp(0.0, 100.0).round() as u8,
            _ => 0,
        }
    }

    /// Remaining seconds, never negative
    pub fn remaining_secs(&self) -> f64 {
        match self.estimated_time_remaining {
            Some(secs) if secs.is_finite() => secs.max(0.0),
            _ => 0.0,
        }
    }
}

/// Full record of a finished video
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub teacher: String,
    pub query: String,
    pub duration: u32,
    pub created_at: DateTime<Utc>,
    pub views: u32,
    pub likes: u32,
    pub video_url: String,
    pub thumbnail_url: String,
}

/// Kind of analytics event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsEventType {
    VideoGenerated,
    VideoPlayed,
    VideoLiked,
    VideoShared,
}

impl std::fmt::Display for AnalyticsEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyticsEventType::VideoGenerated => write!(f, "video_generated"),
            AnalyticsEventType::VideoPlayed => write!(f, "video_played"),
            AnalyticsEventType::VideoLiked => write!(f, "video_liked"),
            AnalyticsEventType::VideoShared => write!(f, "video_shared"),
        }
    }
}

/// Fire-and-forget analytics payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub event_type: AnalyticsEventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl AnalyticsEvent {
    /// Event emitted once a video has finished generating
    pub fn video_generated(video_id: &str, query: &str, teacher: &str) -> Self {
        Self {
            event_type: AnalyticsEventType::VideoGenerated,
            video_id: Some(video_id.to_string()),
            query: Some(query.to_string()),
            teacher: Some(teacher.to_string()),
            metadata: None,
        }
    }
}
