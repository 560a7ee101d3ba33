use serde::{Deserialize, Serialize};
use std::fmt;

/// One resolution-specific encode of a source video.
///
/// The set is fixed; every video gets the same three renditions. Parsing is
/// strict: only the exact labels resolve, which keeps arbitrary path input
/// out of the artifact tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rendition {
    #[serde(rename = "480p")]
    R480p,
    #[serde(rename = "720p")]
    R720p,
    #[serde(rename = "1080p")]
    R1080p,
}

impl Rendition {
    /// All renditions, in processing order.
    pub const ALL: [Rendition; 3] = [Rendition::R480p, Rendition::R720p, Rendition::R1080p];

    pub fn label(&self) -> &'static str {
        match self {
            Rendition::R480p => "480p",
            Rendition::R720p => "720p",
            Rendition::R1080p => "1080p",
        }
    }

    /// Target dimensions as (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Rendition::R480p => (854, 480),
            Rendition::R720p => (1280, 720),
            Rendition::R1080p => (1920, 1080),
        }
    }

    pub fn from_label(label: &str) -> Option<Rendition> {
        Rendition::ALL.iter().copied().find(|r| r.label() == label)
    }

    /// Segment filename pattern handed to the encoder, e.g. `480p%d.ts`.
    pub fn segment_pattern(&self) -> String {
        format!("{}%d.ts", self.label())
    }
}

impl fmt::Display for Rendition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
