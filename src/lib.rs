//! Kino - Video Hosting Backend
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (renditions, catalog records, jobs)
//! - ports/: Trait definitions
//! - adapters/: Concrete implementations
//! - application/: Orchestration and the transcoding worker pool
//! - hls/: Artifact layout and playlist handling
//! - http/: Inbound HTTP surface (catalog + playback)
//! - config: Environment configuration
//!
//! Uploaded MP4 sources are converted into segmented HLS renditions by a
//! background worker pool and served back per video id, resolution and
//! segment name.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod hls;
pub mod http;
pub mod ports;

// Re-exports for convenience
pub use config::AppConfig;
pub use error::AppError;
