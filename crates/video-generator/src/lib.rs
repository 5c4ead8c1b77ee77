//! Video generator library: turns a free-text question into a demo video lesson.
//!
//! This library matches questions against a catalog of pre-recorded lessons,
//! talks to a (simulated or HTTP) video backend, and drives the generation
//! state machine a front-end renders.

pub mod api;
pub mod catalog;
pub mod generation;
pub mod matcher;
pub mod storage;
pub mod validation;

pub use api::{HttpBackend, SimulatedBackend, VideoBackend, VideoService};
pub use catalog::{example_queries, Catalog};
pub use generation::{GenerationPhase, GenerationState, StateError, VideoGenerator};
pub use matcher::find_matching_video;
pub use validation::{check_query, validate_query, QueryValidation};
