use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::error::Result;
use crate::request::{ConfigurationForm, ModelSize, SubtitleFormat};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Transcription parameters; unset values come from the `[defaults]` config section.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ParamArgs {
    /// Spoken language code, or "auto"
    #[arg(short, long)]
    pub language: Option<String>,

    /// Model size: base or medium
    #[arg(short, long)]
    pub model: Option<String>,

    /// Subtitle format: srt, vtt or txt
    #[arg(short, long)]
    pub format: Option<String>,

    /// Number of speakers (1-5)
    #[arg(short, long)]
    pub speakers: Option<u8>,

    /// Translate to English
    #[arg(short, long)]
    pub translate: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload a video, generate subtitles and save them
    Generate {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        params: ParamArgs,

        /// Also download the video with burned-in subtitles
        #[arg(long)]
        with_video: bool,

        /// Output directory for downloaded files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Burn an existing subtitle file into a video
    Mux {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Subtitle file (srt, vtt or txt)
        #[arg(short = 'S', long)]
        subtitles: PathBuf,

        /// Output directory for the video
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Interactive session: upload, generate, edit and download
    Shell {
        /// Output directory for downloaded files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// List supported language codes
    Languages,

    /// Check that the backend is up and which models it has loaded
    Health,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write the default configuration to a file
    Init {
        /// Destination path
        #[arg(short, long, default_value = "config.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl ParamArgs {
    /// Apply the flags that were given on top of the form's current values.
    pub fn apply_to(&self, form: &mut ConfigurationForm) -> Result<()> {
        if let Some(language) = &self.language {
            form.set_language(language.clone());
        }
        if let Some(model) = &self.model {
            form.set_model_size(model.parse::<ModelSize>()?);
        }
        if let Some(format) = &self.format {
            form.set_format(format.parse::<SubtitleFormat>()?);
        }
        if let Some(speakers) = self.speakers {
            form.set_num_speakers(speakers);
        }
        if self.translate {
            form.set_translate(true);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::TranscriptionRequest;

    #[test]
    fn parses_generate_with_params() {
        let args = Args::try_parse_from([
            "subgenius", "generate", "-i", "clip.mp4", "-l", "en", "-m", "medium", "-f", "vtt",
            "-s", "3", "--translate", "--with-video",
        ])
        .unwrap();

        let Commands::Generate {
            input,
            params,
            with_video,
            output_dir,
        } = args.command
        else {
            panic!("expected generate");
        };
        assert_eq!(input, PathBuf::from("clip.mp4"));
        assert!(with_video);
        assert!(output_dir.is_none());

        let mut form = ConfigurationForm::new("clip.mp4", TranscriptionRequest::default());
        params.apply_to(&mut form).unwrap();
        let request = form.params();
        assert_eq!(request.language, "en");
        assert_eq!(request.model_size, ModelSize::Medium);
        assert_eq!(request.format, SubtitleFormat::Vtt);
        assert_eq!(request.num_speakers, 3);
        assert!(request.translate);
    }

    #[test]
    fn unset_params_keep_defaults() {
        let mut form = ConfigurationForm::new("clip.mp4", TranscriptionRequest::default());
        ParamArgs::default().apply_to(&mut form).unwrap();
        assert_eq!(form.params(), &TranscriptionRequest::default());
    }

    #[test]
    fn bad_model_is_rejected() {
        let params = ParamArgs {
            model: Some("huge".to_string()),
            ..ParamArgs::default()
        };
        let mut form = ConfigurationForm::new("clip.mp4", TranscriptionRequest::default());
        assert!(params.apply_to(&mut form).is_err());
    }
}
