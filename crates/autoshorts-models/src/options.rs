//! Rendering option enums exposed by the generation form.
//!
//! Every option serializes to the exact string the backend expects and can be
//! parsed back from it (case-insensitive), which is what the CLI relies on.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string does not name a known option value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: {value}")]
pub struct OptionParseError {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a wire-string enum with `as_str`, `ALL`, `Display` and `FromStr`.
///
/// The optional `default = Variant` clause also implements `Default`.
macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal, default = $default:ident {
            $($body:tt)+
        }
    ) => {
        option_enum! {
            $(#[$meta])*
            $name, $kind {
                $($body)+
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }
    };
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $wire:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = OptionParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lower = s.trim().to_lowercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == lower)
                    .ok_or_else(|| OptionParseError {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

option_enum! {
    /// Output resolution of rendered clips.
    Resolution, "resolution", default = Full1080 {
        Full1080 => "1080p",
        Hd720 => "720p",
    }
}

option_enum! {
    /// Encoder quality preset.
    QualityPreset, "quality preset", default = Balanced {
        Balanced => "balanced",
        /// Labelled "Maximum" in the console
        Best => "best",
    }
}

option_enum! {
    /// Prompt style steering which moments the backend picks.
    PromptStyle, "prompt style", default = ViralHook {
        /// High-energy hooks
        ViralHook => "viral_hook",
        Storytelling => "storytelling",
        Educational => "educational",
        /// Hype/growth
        Aggressive => "aggressive",
        Funny => "funny",
        Inspirational => "inspirational",
        News => "news",
        /// Free-text prompt supplied by the user
        Custom => "custom",
    }
}

impl PromptStyle {
    /// Whether the free-text custom prompt is meaningful for this style.
    pub fn uses_custom_prompt(&self) -> bool {
        matches!(self, PromptStyle::Custom)
    }
}

option_enum! {
    /// Transcription language.
    Language, "language", default = Auto {
        /// Let the backend detect the language
        Auto => "auto",
        English => "en",
        Spanish => "es",
        French => "fr",
        German => "de",
        Portuguese => "pt",
        Italian => "it",
        Dutch => "nl",
    }
}

impl Language {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Language::Auto => "Auto Detect",
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
            Language::Portuguese => "Portuguese",
            Language::Italian => "Italian",
            Language::Dutch => "Dutch",
        }
    }
}

option_enum! {
    /// Strategy used to reframe landscape footage to portrait.
    CropStrategy, "crop strategy", default = SmartCenter {
        SmartCenter => "smart_center",
        Center => "center",
    }
}

option_enum! {
    /// Vertical anchor of the caption block.
    CaptionPosition, "caption position", default = Center {
        Top => "top",
        Center => "center",
        Bottom => "bottom",
    }
}

option_enum! {
    /// Caption entry animation.
    CaptionAnimation, "caption animation", default = WordBox {
        None => "none",
        Fade => "fade",
        Pop => "pop",
        Bounce => "bounce",
        ScaleUp => "scale_up",
        Karaoke => "karaoke",
        Glow => "glow",
        Highlight => "highlight",
        WordBox => "word_box",
    }
}

option_enum! {
    /// Case transform applied to caption text.
    TextCase, "text case", default = Uppercase {
        Uppercase => "uppercase",
        Lowercase => "lowercase",
        Original => "original",
    }
}

option_enum! {
    /// Compute tier the job should run on.
    ///
    /// This is a console-side selection gated by the account tier; see
    /// [`crate::UserProfile::gpu_eligible`].
    Hardware, "hardware", default = Cpu {
        Cpu => "cpu",
        Gpu => "gpu",
    }
}

option_enum! {
    /// Post-processing effect applied to every clip.
    Effect, "effect" {
        Vignette => "vignette",
        Glitch => "glitch",
        Shake => "shake",
        Vintage => "vintage",
        BlackWhite => "blackwhite",
        SoftGlow => "soft_glow",
        Sharpen => "sharpen",
        Blur => "blur",
        SlowZoomIn => "slow_zoom_in",
        FadeIn => "fadein",
        FadeOut => "fadeout",
        Mirror => "mirror",
        InvertColors => "invert_colors",
        SpeedUp => "speed_up",
        SlowDown => "slow_down",
    }
}

/// Caption fonts offered by the backend renderer.
pub const FONTS: &[&str] = &[
    "Arial",
    "Inter",
    "Roboto",
    "Montserrat",
    "Impact",
    "Verdana",
    "Georgia",
    "Courier New",
];

/// Catalog spelling of a font name, matched case-insensitively.
pub fn canonical_font(font: &str) -> Option<&'static str> {
    let font = font.trim();
    FONTS.iter().copied().find(|f| f.eq_ignore_ascii_case(font))
}
