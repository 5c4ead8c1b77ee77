//! Video backends and the service that fronts them.
//!
//! A simulated responder and an HTTP client implement the same
//! [`VideoBackend`] trait; [`VideoService`] picks one from configuration.

pub mod backend;
pub mod client;
pub mod service;
pub mod simulated;
pub mod types;

pub use backend::VideoBackend;
pub use client::HttpBackend;
pub use service::VideoService;
pub use simulated::SimulatedBackend;
pub use types::*;
