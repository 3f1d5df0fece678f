//! Clips produced by a completed job.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One rendered output clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Clip {
    /// Server-assigned clip identifier
    pub clip_id: String,

    /// Signed URL the rendered MP4 can be fetched from
    pub download_url: String,

    /// Clip duration in seconds
    #[serde(default)]
    pub duration: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Virality score (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virality_score: Option<f64>,

    /// Why the backend picked this segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl Clip {
    /// File name used when saving the clip locally.
    pub fn file_name(&self) -> String {
        format!("clip-{}.mp4", self.clip_id)
    }

    /// Virality score rounded to a whole percent.
    ///
    /// A missing or zero score is treated as unscored.
    pub fn virality_percent(&self) -> Option<u32> {
        self.virality_score
            .filter(|score| *score > 0.0)
            .map(|score| score.round().clamp(0.0, 100.0) as u32)
    }
}

/// Result payload attached to a completed job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobResult {
    /// Clips in the order the backend ranked them
    #[serde(default)]
    pub clips: Vec<Clip>,
}

/// The clip currently chosen for preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedClip {
    pub id: String,
    pub url: String,
}

impl From<&Clip> for SelectedClip {
    fn from(clip: &Clip) -> Self {
        Self {
            id: clip.clip_id.clone(),
            url: clip.download_url.clone(),
        }
    }
}
