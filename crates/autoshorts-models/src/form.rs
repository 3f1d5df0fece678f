//! Editable generation form and the request builder.
//!
//! The form holds every option with the console defaults. Slider-backed
//! fields are range-checked with `validator`; `build_request` turns the form
//! into a [`GenerationRequest`] snapshot, dropping optional parts whose
//! gating value is empty.

use validator::{Validate, ValidationError};

use crate::error::{FormError, FormResult};
use crate::utils::{is_hex_color, non_empty};
use crate::{
    AudioConfig, BackgroundMusicConfig, CaptionAnimation, CaptionConfig, CaptionPosition,
    ContentConfig, CropStrategy, Effect, EffectSet, GenerationRequest, Hardware, Language,
    PromptStyle, QualityPreset, Resolution, TextCase, UserProfile, VideoConfig, VisualConfig,
};

/// Form state backing a generation request.
#[derive(Debug, Clone, Validate)]
pub struct GenerationForm {
    pub source_url: String,

    // Video
    pub resolution: Resolution,
    #[validate(range(min = 1, max = 10))]
    pub clips_count: u32,
    #[validate(range(min = 5, max = 300))]
    pub min_duration: u32,
    #[validate(range(min = 10, max = 300))]
    pub max_duration: u32,
    pub quality_preset: QualityPreset,
    pub hardware: Hardware,

    // Captions
    pub captions_enabled: bool,
    pub caption_font: String,
    #[validate(range(min = 20, max = 80))]
    pub caption_font_size: u32,
    pub caption_bold: bool,
    pub caption_italic: bool,
    #[validate(custom(function = "validate_hex_color"))]
    pub caption_color: String,
    #[validate(custom(function = "validate_hex_color"))]
    pub stroke_color: String,
    #[validate(range(min = 0.0, max = 10.0))]
    pub stroke_width: f32,
    pub caption_position: CaptionPosition,
    pub position_x: Option<i32>,
    pub position_y: Option<i32>,
    pub caption_animation: CaptionAnimation,
    pub text_case: TextCase,
    #[validate(range(min = 1, max = 10))]
    pub words_per_caption: u32,
    #[validate(custom(function = "validate_hex_color"))]
    pub highlight_color: String,

    // Visuals
    pub face_tracking: bool,
    pub crop_strategy: CropStrategy,
    pub effects: EffectSet,

    // Audio
    pub music_url: String,
    #[validate(range(min = 0.0, max = 1.0))]
    pub music_volume: f32,
    pub music_loop: bool,
    #[validate(range(min = 0.0, max = 2.0))]
    pub voiceover_volume: f32,

    // Content
    pub prompt_style: PromptStyle,
    pub custom_prompt: String,
    pub language: Language,

    pub webhook_url: String,
}

impl Default for GenerationForm {
    fn default() -> Self {
        Self {
            source_url: String::new(),
            resolution: Resolution::Full1080,
            clips_count: 1,
            min_duration: 15,
            max_duration: 60,
            quality_preset: QualityPreset::Balanced,
            hardware: Hardware::Cpu,
            captions_enabled: true,
            caption_font: "Inter".to_string(),
            caption_font_size: 40,
            caption_bold: true,
            caption_italic: false,
            caption_color: "#FFFFFF".to_string(),
            stroke_color: "#000000".to_string(),
            stroke_width: 3.0,
            caption_position: CaptionPosition::Center,
            position_x: None,
            position_y: None,
            caption_animation: CaptionAnimation::WordBox,
            text_case: TextCase::Uppercase,
            words_per_caption: 3,
            highlight_color: "#3b82f6".to_string(),
            face_tracking: true,
            crop_strategy: CropStrategy::SmartCenter,
            effects: EffectSet::new(),
            music_url: String::new(),
            music_volume: 0.15,
            music_loop: true,
            voiceover_volume: 1.0,
            prompt_style: PromptStyle::ViralHook,
            custom_prompt: String::new(),
            language: Language::Auto,
            webhook_url: String::new(),
        }
    }
}

impl GenerationForm {
    /// Create a form with defaults for the given source.
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            ..Default::default()
        }
    }

    /// Toggle an effect on or off. Returns whether it is now enabled.
    pub fn toggle_effect(&mut self, effect: Effect) -> bool {
        self.effects.toggle(effect)
    }

    /// Select the compute tier, refusing the GPU for ineligible accounts.
    ///
    /// The selection stays unchanged when refused.
    pub fn select_hardware(&mut self, hardware: Hardware, user: &UserProfile) -> FormResult<()> {
        if hardware == Hardware::Gpu && !user.gpu_eligible() {
            return Err(FormError::HardwareNotAvailable {
                tier: user.tier_label().to_string(),
            });
        }
        self.hardware = hardware;
        Ok(())
    }

    /// Check the source URL only.
    ///
    /// This is the guard applied before a submission leaves the idle state.
    pub fn check_source(&self) -> FormResult<String> {
        non_empty(&self.source_url).ok_or(FormError::MissingSourceUrl)
    }

    /// Build the request snapshot.
    ///
    /// Fails on an empty source URL, out-of-range values, malformed colors or
    /// an unsupported font.
    pub fn build_request(&self) -> FormResult<GenerationRequest> {
        let source_url = self.check_source()?;
        self.validate()?;
        let font = crate::options::canonical_font(&self.caption_font)
            .ok_or_else(|| FormError::UnknownFont(self.caption_font.clone()))?;

        let background_music = non_empty(&self.music_url).map(|source_url| BackgroundMusicConfig {
            source_url,
            volume: self.music_volume,
            loop_audio: self.music_loop,
        });

        Ok(GenerationRequest {
            source_url,
            config: VideoConfig {
                resolution: self.resolution,
                clips_count: self.clips_count,
                min_duration: self.min_duration,
                max_duration: self.max_duration,
                quality_preset: self.quality_preset,
            },
            content: ContentConfig {
                prompt_style: self.prompt_style,
                custom_prompt: non_empty(&self.custom_prompt),
                language: self.language,
            },
            visuals: VisualConfig {
                face_tracking: self.face_tracking,
                crop_strategy: self.crop_strategy,
                effects: self.effects.clone(),
                captions: CaptionConfig {
                    enabled: self.captions_enabled,
                    font: font.to_string(),
                    fontsize: self.caption_font_size,
                    bold: self.caption_bold,
                    italic: self.caption_italic,
                    color: self.caption_color.clone(),
                    stroke_color: self.stroke_color.clone(),
                    stroke_width: self.stroke_width,
                    position: self.caption_position,
                    position_x: self.position_x,
                    position_y: self.position_y,
                    animation: self.caption_animation,
                    text_case: self.text_case,
                    words_per_caption: self.words_per_caption,
                    highlight_color: self.highlight_color.clone(),
                },
            },
            audio: AudioConfig {
                background_music,
                voiceover_volume: self.voiceover_volume,
            },
            webhook_url: non_empty(&self.webhook_url),
        })
    }
}

fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    if is_hex_color(value) {
        Ok(())
    } else {
        Err(ValidationError::new("hex_color"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn to_json(form: &GenerationForm) -> Value {
        serde_json::to_value(form.build_request().unwrap()).unwrap()
    }

    #[test]
    fn test_empty_source_url_is_rejected() {
        let form = GenerationForm::new("   ");
        assert!(matches!(form.build_request(), Err(FormError::MissingSourceUrl)));
        assert_eq!(
            form.build_request().unwrap_err().to_string(),
            "Source URL is required"
        );
    }

    #[test]
    fn test_optional_fields_are_absent_when_empty() {
        let json = to_json(&GenerationForm::new("https://youtu.be/abc"));

        assert!(json["content"].get("custom_prompt").is_none());
        assert!(json["audio"].get("background_music").is_none());
        assert!(json.get("webhook_url").is_none());
        assert!(json["visuals"]["captions"].get("position_x").is_none());
        assert!(json["visuals"]["captions"].get("position_y").is_none());
    }

    #[test]
    fn test_optional_fields_are_present_when_set() {
        let mut form = GenerationForm::new("https://youtu.be/abc");
        form.prompt_style = PromptStyle::Custom;
        form.custom_prompt = "Focus only on technical jokes".into();
        form.music_url = "https://cdn.example.com/lofi.mp3".into();
        form.webhook_url = "https://hooks.example.com/done".into();
        form.position_y = Some(0);

        let json = to_json(&form);
        assert_eq!(json["content"]["custom_prompt"], "Focus only on technical jokes");
        assert_eq!(
            json["audio"]["background_music"],
            serde_json::json!({
                "source_url": "https://cdn.example.com/lofi.mp3",
                "volume": 0.15f32,
                "loop": true
            })
        );
        assert_eq!(json["webhook_url"], "https://hooks.example.com/done");
        // An explicit zero offset is a real value, not an absent one.
        assert_eq!(json["visuals"]["captions"]["position_y"], 0);
    }

    #[test]
    fn test_defaults_on_the_wire() {
        let json = to_json(&GenerationForm::new("https://youtu.be/abc"));

        assert_eq!(json["config"]["resolution"], "1080p");
        assert_eq!(json["config"]["clips_count"], 1);
        assert_eq!(json["config"]["min_duration"], 15);
        assert_eq!(json["config"]["max_duration"], 60);
        assert_eq!(json["content"]["prompt_style"], "viral_hook");
        assert_eq!(json["content"]["language"], "auto");
        assert_eq!(json["visuals"]["crop_strategy"], "smart_center");
        assert_eq!(json["visuals"]["captions"]["animation"], "word_box");
        assert_eq!(json["visuals"]["effects"], serde_json::json!([]));
        assert_eq!(json["audio"]["voiceover_volume"], 1.0);
        assert!(json.get("hardware").is_none());
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let mut form = GenerationForm::new("https://youtu.be/abc");
        form.clips_count = 11;
        assert!(matches!(form.build_request(), Err(FormError::Validation(_))));

        let mut form = GenerationForm::new("https://youtu.be/abc");
        form.voiceover_volume = 2.5;
        assert!(matches!(form.build_request(), Err(FormError::Validation(_))));
    }

    #[test]
    fn test_min_duration_above_max_is_allowed() {
        let mut form = GenerationForm::new("https://youtu.be/abc");
        form.min_duration = 120;
        form.max_duration = 30;
        assert!(form.build_request().is_ok());
    }

    #[test]
    fn test_bad_color_and_font_are_rejected() {
        let mut form = GenerationForm::new("https://youtu.be/abc");
        form.caption_color = "white".into();
        assert!(matches!(form.build_request(), Err(FormError::Validation(_))));

        let mut form = GenerationForm::new("https://youtu.be/abc");
        form.caption_font = "Comic Sans".into();
        assert!(matches!(form.build_request(), Err(FormError::UnknownFont(_))));
    }

    #[test]
    fn test_font_is_sent_in_catalog_spelling() {
        let mut form = GenerationForm::new("https://youtu.be/abc");
        form.caption_font = "courier new".into();
        let request = form.build_request().unwrap();
        assert_eq!(request.visuals.captions.font, "Courier New");
    }

    #[test]
    fn test_gpu_requires_eligible_tier() {
        let mut form = GenerationForm::default();
        let free = UserProfile {
            tier: Some("Free".into()),
            ..Default::default()
        };
        let pro = UserProfile {
            tier: Some("Pro".into()),
            ..Default::default()
        };

        assert!(form.select_hardware(Hardware::Gpu, &free).is_err());
        assert_eq!(form.hardware, Hardware::Cpu);
        form.select_hardware(Hardware::Gpu, &pro).unwrap();
        assert_eq!(form.hardware, Hardware::Gpu);
    }

    #[test]
    fn test_effects_follow_toggle_order() {
        let mut form = GenerationForm::new("https://youtu.be/abc");
        form.toggle_effect(Effect::Vintage);
        form.toggle_effect(Effect::SpeedUp);
        form.toggle_effect(Effect::Vintage);
        form.toggle_effect(Effect::Mirror);

        let json = to_json(&form);
        assert_eq!(json["visuals"]["effects"], serde_json::json!(["speed_up", "mirror"]));
    }
}
