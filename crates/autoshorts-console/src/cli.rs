//! Command-line surface.

use std::path::PathBuf;

use autoshorts_models::{
    CaptionAnimation, CaptionPosition, CropStrategy, Effect, FormResult, GenerationForm, Hardware,
    Language, PromptStyle, QualityPreset, Resolution, TextCase, UserProfile, FONTS,
};
use clap::builder::PossibleValuesParser;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "autoshorts", version, about = "Generate short clips from long videos")]
pub struct Cli {
    /// Base URL of the generation API
    #[arg(long, global = true, env = "AUTOSHORTS_API_BASE_URL")]
    pub base_url: Option<String>,

    /// Credential file location
    #[arg(long, global = true, env = "AUTOSHORTS_CREDENTIAL_FILE")]
    pub credential_file: Option<PathBuf>,

    /// Log progress details to stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate and store an API key
    Login(LoginArgs),
    /// Remove the stored API key
    Logout,
    /// Show the account behind the stored key
    Whoami,
    /// Submit a generation job and follow it to completion
    Generate(GenerateArgs),
    /// Show the status of a job
    Status(StatusArgs),
    /// Download the clips of a completed job
    Download(DownloadArgs),
    /// Print a JSON schema of the wire types
    Schema(SchemaArgs),
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// API key; read from stdin when omitted
    #[arg(long, env = "AUTOSHORTS_API_KEY", hide_env_values = true)]
    pub key: Option<String>,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    pub job_id: String,

    /// Keep polling until the job finishes
    #[arg(long)]
    pub watch: bool,
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    pub job_id: String,

    /// Only this clip
    #[arg(long)]
    pub clip: Option<String>,

    /// Destination directory
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaKind {
    Request,
    Job,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    #[arg(value_enum, default_value_t = SchemaKind::Request)]
    pub kind: SchemaKind,
}

/// Generation options. Anything not given keeps the form default.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Video to cut clips from
    pub source_url: String,

    // Video
    #[arg(long, help_heading = "Video")]
    pub resolution: Option<Resolution>,
    #[arg(long, help_heading = "Video")]
    pub clips: Option<u32>,
    #[arg(long, help_heading = "Video")]
    pub min_duration: Option<u32>,
    #[arg(long, help_heading = "Video")]
    pub max_duration: Option<u32>,
    #[arg(long, help_heading = "Video")]
    pub quality: Option<QualityPreset>,
    /// Compute tier; gpu requires a Pro, Premium, Scale or Enterprise plan
    #[arg(long, help_heading = "Video")]
    pub hardware: Option<Hardware>,

    // Captions
    #[arg(long, help_heading = "Captions")]
    pub no_captions: bool,
    #[arg(long, help_heading = "Captions", value_parser = font_value_parser())]
    pub font: Option<String>,
    #[arg(long, help_heading = "Captions")]
    pub font_size: Option<u32>,
    #[arg(long, help_heading = "Captions")]
    pub no_bold: bool,
    #[arg(long, help_heading = "Captions")]
    pub italic: bool,
    #[arg(long, help_heading = "Captions")]
    pub caption_color: Option<String>,
    #[arg(long, help_heading = "Captions")]
    pub stroke_color: Option<String>,
    #[arg(long, help_heading = "Captions")]
    pub stroke_width: Option<f32>,
    #[arg(long, help_heading = "Captions")]
    pub position: Option<CaptionPosition>,
    /// Horizontal pixel offset
    #[arg(long, help_heading = "Captions", allow_hyphen_values = true)]
    pub position_x: Option<i32>,
    /// Vertical pixel offset
    #[arg(long, help_heading = "Captions", allow_hyphen_values = true)]
    pub position_y: Option<i32>,
    #[arg(long, help_heading = "Captions")]
    pub animation: Option<CaptionAnimation>,
    #[arg(long, help_heading = "Captions")]
    pub text_case: Option<TextCase>,
    #[arg(long, help_heading = "Captions")]
    pub words_per_caption: Option<u32>,
    #[arg(long, help_heading = "Captions")]
    pub highlight_color: Option<String>,

    // Visuals
    #[arg(long, help_heading = "Visuals")]
    pub no_face_tracking: bool,
    #[arg(long, help_heading = "Visuals")]
    pub crop: Option<CropStrategy>,
    /// Effect to apply; repeat for several
    #[arg(long = "effect", help_heading = "Visuals")]
    pub effects: Vec<Effect>,

    // Audio
    /// Background music track
    #[arg(long, help_heading = "Audio")]
    pub music_url: Option<String>,
    #[arg(long, help_heading = "Audio")]
    pub music_volume: Option<f32>,
    #[arg(long, help_heading = "Audio")]
    pub no_music_loop: bool,
    #[arg(long, help_heading = "Audio")]
    pub voiceover_volume: Option<f32>,

    // Content
    #[arg(long, help_heading = "Content")]
    pub style: Option<PromptStyle>,
    /// Free-form instructions for picking moments
    #[arg(long, help_heading = "Content")]
    pub prompt: Option<String>,
    #[arg(long, help_heading = "Content")]
    pub language: Option<Language>,

    /// Notified by the backend when the job finishes
    #[arg(long)]
    pub webhook: Option<String>,

    /// Print the job id and exit instead of following the job
    #[arg(long)]
    pub no_wait: bool,

    /// Download the clips here once the job completes
    #[arg(long, conflicts_with = "no_wait")]
    pub download: Option<PathBuf>,
}

fn font_value_parser() -> PossibleValuesParser {
    PossibleValuesParser::new(FONTS.iter().copied())
}

impl GenerateArgs {
    /// Fill a form from the defaults plus the given options.
    ///
    /// Hardware is checked against the account tier here; the remaining
    /// validation happens when the request is built.
    pub fn to_form(&self, user: &UserProfile) -> FormResult<GenerationForm> {
        let mut form = GenerationForm::new(self.source_url.clone());

        macro_rules! set {
            ($($field:ident <- $arg:expr),+ $(,)?) => {
                $(if let Some(value) = $arg.clone() {
                    form.$field = value;
                })+
            };
        }

        set! {
            resolution <- self.resolution,
            clips_count <- self.clips,
            min_duration <- self.min_duration,
            max_duration <- self.max_duration,
            quality_preset <- self.quality,
            caption_font <- self.font,
            caption_font_size <- self.font_size,
            caption_color <- self.caption_color,
            stroke_color <- self.stroke_color,
            stroke_width <- self.stroke_width,
            caption_position <- self.position,
            caption_animation <- self.animation,
            text_case <- self.text_case,
            words_per_caption <- self.words_per_caption,
            highlight_color <- self.highlight_color,
            crop_strategy <- self.crop,
            music_url <- self.music_url,
            music_volume <- self.music_volume,
            voiceover_volume <- self.voiceover_volume,
            prompt_style <- self.style,
            custom_prompt <- self.prompt,
            language <- self.language,
            webhook_url <- self.webhook,
        }

        form.position_x = self.position_x;
        form.position_y = self.position_y;
        form.captions_enabled = !self.no_captions;
        form.caption_bold = !self.no_bold;
        form.caption_italic = self.italic;
        form.face_tracking = !self.no_face_tracking;
        form.music_loop = !self.no_music_loop;
        for effect in &self.effects {
            form.effects.insert(*effect);
        }

        if let Some(hardware) = self.hardware {
            form.select_hardware(hardware, user)?;
        }

        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoshorts_models::FormError;
    use clap::CommandFactory;

    fn parse_generate(args: &[&str]) -> GenerateArgs {
        let mut argv = vec!["autoshorts", "generate"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Generate(args) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    fn user(tier: &str) -> UserProfile {
        UserProfile {
            tier: Some(tier.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_match_form_defaults() {
        let args = parse_generate(&["https://youtu.be/abc"]);
        let form = args.to_form(&user("Free")).unwrap();

        let defaults = GenerationForm::new("https://youtu.be/abc");
        assert_eq!(form.clips_count, defaults.clips_count);
        assert_eq!(form.caption_font, "Inter");
        assert!(form.captions_enabled);
        assert!(form.caption_bold);
        assert!(form.music_loop);
        assert_eq!(form.hardware, Hardware::Cpu);
        assert!(form.position_x.is_none());
    }

    #[test]
    fn test_options_are_applied() {
        let args = parse_generate(&[
            "https://youtu.be/abc",
            "--resolution",
            "720p",
            "--clips",
            "4",
            "--font",
            "Montserrat",
            "--position-x",
            "-20",
            "--effect",
            "glitch",
            "--effect",
            "vignette",
            "--effect",
            "glitch",
            "--style",
            "custom",
            "--prompt",
            "only the punchlines",
            "--no-music-loop",
        ]);
        let form = args.to_form(&user("Free")).unwrap();

        assert_eq!(form.resolution, Resolution::Hd720);
        assert_eq!(form.clips_count, 4);
        assert_eq!(form.caption_font, "Montserrat");
        assert_eq!(form.position_x, Some(-20));
        assert_eq!(form.effects.len(), 2);
        assert!(form.effects.contains(Effect::Glitch));
        assert_eq!(form.prompt_style, PromptStyle::Custom);
        assert_eq!(form.custom_prompt, "only the punchlines");
        assert!(!form.music_loop);
    }

    #[test]
    fn test_unknown_values_are_rejected_by_parser() {
        let argv = ["autoshorts", "generate", "u", "--font", "Comic Sans"];
        assert!(Cli::try_parse_from(argv).is_err());

        let argv = ["autoshorts", "generate", "u", "--effect", "sparkles"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_gpu_requires_eligible_tier() {
        let args = parse_generate(&["https://youtu.be/abc", "--hardware", "gpu"]);

        let err = args.to_form(&user("Free")).unwrap_err();
        assert!(matches!(err, FormError::HardwareNotAvailable { .. }));

        let form = args.to_form(&user("Enterprise")).unwrap();
        assert_eq!(form.hardware, Hardware::Gpu);
    }

    #[test]
    fn test_download_conflicts_with_no_wait() {
        let argv = ["autoshorts", "generate", "u", "--no-wait", "--download", "out"];
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
