pub mod jobs;
pub mod rendition;
pub mod video;
