//! `POST /generate` request body.
//!
//! Optional fields are `Option`s skipped during serialization, so an unset
//! field is absent from the JSON rather than sent as `null`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    CaptionAnimation, CaptionPosition, CropStrategy, EffectSet, Language, PromptStyle,
    QualityPreset, Resolution, TextCase,
};

/// Full generation request, a snapshot of the form at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationRequest {
    /// Source video (YouTube, TikTok, Twitch or direct URL)
    pub source_url: String,
    pub config: VideoConfig,
    pub content: ContentConfig,
    pub visuals: VisualConfig,
    pub audio: AudioConfig,
    /// Callback invoked by the backend when the job finishes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

/// Output shape of the rendered clips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoConfig {
    pub resolution: Resolution,
    pub clips_count: u32,
    /// Seconds
    pub min_duration: u32,
    /// Seconds
    pub max_duration: u32,
    pub quality_preset: QualityPreset,
}

/// What the backend should look for in the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContentConfig {
    pub prompt_style: PromptStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VisualConfig {
    pub face_tracking: bool,
    pub crop_strategy: CropStrategy,
    pub captions: CaptionConfig,
    pub effects: EffectSet,
}

/// Caption styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CaptionConfig {
    pub enabled: bool,
    pub font: String,
    pub fontsize: u32,
    pub bold: bool,
    pub italic: bool,
    /// Fill color, `#RRGGBB`
    pub color: String,
    pub stroke_color: String,
    pub stroke_width: f32,
    pub position: CaptionPosition,
    /// Pixel offset overriding the anchor horizontally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_x: Option<i32>,
    /// Pixel offset overriding the anchor vertically
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_y: Option<i32>,
    pub animation: CaptionAnimation,
    pub text_case: TextCase,
    pub words_per_caption: u32,
    pub highlight_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AudioConfig {
    /// Present only when a music source was supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_music: Option<BackgroundMusicConfig>,
    /// 1.0 is unity gain
    pub voiceover_volume: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BackgroundMusicConfig {
    pub source_url: String,
    pub volume: f32,
    #[serde(rename = "loop")]
    pub loop_audio: bool,
}
