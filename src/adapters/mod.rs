//! Adapters - Concrete implementations of ports.

pub mod channel_queue;
pub mod ffmpeg;
pub mod memory;
pub mod token_auth;

pub use channel_queue::ChannelQueue;
pub use ffmpeg::FfmpegEncoder;
pub use memory::{InMemoryCatalog, InMemoryJobStatus};
pub use token_auth::StaticTokenAuth;
