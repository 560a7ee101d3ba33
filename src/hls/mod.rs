pub mod layout;
pub mod playlist;

pub use layout::{HlsLayout, PLAYLIST_NAME};
pub use playlist::{MediaPlaylist, MediaSegment};
