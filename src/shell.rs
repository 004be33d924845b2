//! Line-oriented front end for the workflow.
//!
//! Each command maps onto one user gesture of the upload, player or editor
//! view; the [`Controller`] decides whether it is allowed in the current state.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::error::{Result, SubGeniusError};
use crate::language::SUPPORTED_LANGUAGES;
use crate::media::{UploadCandidate, UploadPanel};
use crate::notice::{DOWNLOADING_VIDEO, FORMATS_HINT, GENERATING, MAX_SIZE_HINT};
use crate::progress::loading_indicator;
use crate::request::{ConfigurationForm, ModelSize, SubtitleFormat, TranscriptionRequest};
use crate::subtitle::SubtitleEditor;
use crate::workflow::{Controller, View};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Help,
    Status,
    Quit,
    Reset,
    Dismiss,
    // upload view
    Select(PathBuf),
    Remove,
    Confirm,
    // player view
    Language(String),
    Model(ModelSize),
    Format(SubtitleFormat),
    Speakers(u8),
    Translate(bool),
    Generate,
    // editor view
    Show,
    Edit,
    Load(PathBuf),
    Save,
    Cancel,
    Export,
    Video,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let need_arg = |what: &str| required(word, rest, what);

        let command = match word.to_lowercase().as_str() {
            "help" | "?" => Self::Help,
            "status" => Self::Status,
            "quit" | "exit" => Self::Quit,
            "reset" | "new" => Self::Reset,
            "ok" | "dismiss" => Self::Dismiss,
            "select" | "drop" | "open" => Self::Select(PathBuf::from(need_arg("a file path")?)),
            "remove" => Self::Remove,
            "confirm" | "upload" => Self::Confirm,
            "language" | "lang" => Self::Language(need_arg("a language code")?.to_string()),
            "model" => Self::Model(need_arg("base or medium")?.parse()?),
            "format" => Self::Format(need_arg("srt, vtt or txt")?.parse()?),
            "speakers" => Self::Speakers(need_arg("a number")?.parse().map_err(|_| {
                SubGeniusError::InvalidState(format!("'{}' is not a speaker count", rest))
            })?),
            "translate" => Self::Translate(match need_arg("on or off")? {
                "on" | "true" | "yes" => true,
                "off" | "false" | "no" => false,
                other => {
                    return Err(SubGeniusError::InvalidState(format!(
                        "'{}' is not on/off",
                        other
                    )));
                }
            }),
            "generate" | "create" => Self::Generate,
            "show" => Self::Show,
            "edit" => Self::Edit,
            "load" => Self::Load(PathBuf::from(need_arg("a file path")?)),
            "save" => Self::Save,
            "cancel" => Self::Cancel,
            "export" => Self::Export,
            "video" => Self::Video,
            other => {
                return Err(SubGeniusError::InvalidState(format!(
                    "Unknown command '{}', try 'help'",
                    other
                )));
            }
        };
        Ok(command)
    }
}

fn required<'a>(word: &str, rest: &'a str, what: &str) -> Result<&'a str> {
    if rest.is_empty() {
        Err(SubGeniusError::InvalidState(format!("'{}' needs {}", word, what)))
    } else {
        Ok(rest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell {
    controller: Controller,
    panel: UploadPanel,
    form: Option<ConfigurationForm>,
    defaults: TranscriptionRequest,
    output_dir: PathBuf,
}

impl Shell {
    pub fn new(controller: Controller, defaults: TranscriptionRequest, output_dir: PathBuf) -> Self {
        Self {
            controller,
            panel: UploadPanel::new(),
            form: None,
            defaults,
            output_dir,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn form(&self) -> Option<&ConfigurationForm> {
        self.form.as_ref()
    }

    /// Read commands from stdin until `quit` or end of input.
    pub async fn run(&mut self) -> Result<()> {
        println!("{}", self.describe());
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let command = match ShellCommand::parse(&line) {
                Ok(command) => command,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            };
            match self.execute(command).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => println!("{}", e),
            }
            println!("{}", self.describe());
        }
        Ok(())
    }

    pub async fn execute(&mut self, command: ShellCommand) -> Result<Flow> {
        debug!("Shell command {:?} in {} view", command, self.controller.view());
        match command {
            ShellCommand::Help => println!("{}", help_text(self.controller.view())),
            ShellCommand::Status => {}
            ShellCommand::Quit => return Ok(Flow::Quit),
            ShellCommand::Reset => {
                self.controller.reset();
                self.panel = UploadPanel::new();
                self.form = None;
            }
            ShellCommand::Dismiss => {
                self.panel.dismiss();
                self.controller.dismiss_notice();
            }
            ShellCommand::Select(path) => {
                self.expect_view(View::Upload)?;
                self.panel.select(UploadCandidate::from_path(&path)?)?;
            }
            ShellCommand::Remove => {
                self.expect_view(View::Upload)?;
                self.panel.remove();
            }
            ShellCommand::Confirm => {
                self.expect_view(View::Upload)?;
                let candidate = self.panel.confirm().ok_or_else(|| {
                    SubGeniusError::InvalidState("Select a video first".to_string())
                })?;
                let name = candidate.name.clone();
                self.controller.upload(candidate)?;
                self.form = Some(ConfigurationForm::new(name, self.defaults.clone()));
            }
            ShellCommand::Language(code) => self.form_mut()?.set_language(code),
            ShellCommand::Model(model) => self.form_mut()?.set_model_size(model),
            ShellCommand::Format(format) => self.form_mut()?.set_format(format),
            ShellCommand::Speakers(n) => self.form_mut()?.set_num_speakers(n),
            ShellCommand::Translate(on) => self.form_mut()?.set_translate(on),
            ShellCommand::Generate => {
                let busy = self.controller.is_generating();
                let request = self.form_mut()?.submit(busy)?;
                let pb = loading_indicator(GENERATING);
                let outcome = self.controller.generate(request).await;
                pb.finish_and_clear();
                outcome?;
            }
            ShellCommand::Show => {
                let editor = self.editor()?;
                println!("{}", editor.draft());
            }
            ShellCommand::Edit => {
                self.expect_view(View::Editor)?;
                if let Some(editor) = self.controller.editor_mut() {
                    editor.toggle_edit();
                }
            }
            ShellCommand::Load(path) => {
                let text = tokio::fs::read_to_string(&path).await.map_err(|_| {
                    SubGeniusError::FileNotFound(path.display().to_string())
                })?;
                self.expect_view(View::Editor)?;
                if let Some(editor) = self.controller.editor_mut() {
                    editor.set_draft(text)?;
                }
            }
            ShellCommand::Save => {
                let editing = self.editor()?.is_editing();
                if !editing {
                    return Err(SubGeniusError::InvalidState(
                        "Nothing to save, use 'edit' first".to_string(),
                    ));
                }
                self.controller.save_edits()?;
            }
            ShellCommand::Cancel => self.controller.cancel_edits()?,
            ShellCommand::Export => {
                let path = self
                    .controller
                    .export_subtitles()?
                    .save_into(&self.output_dir)
                    .await?;
                println!("Saved subtitles to {}", path.display());
            }
            ShellCommand::Video => {
                let pb = loading_indicator(DOWNLOADING_VIDEO);
                let outcome = self.controller.download_video_with_subtitles().await;
                pb.finish_and_clear();
                if let Some(download) = outcome? {
                    let path = download.save_into(&self.output_dir).await?;
                    println!("Saved video to {}", path.display());
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn expect_view(&self, view: View) -> Result<()> {
        let current = self.controller.view();
        if current == view {
            Ok(())
        } else {
            Err(SubGeniusError::InvalidState(format!(
                "Not available in the {} view",
                current
            )))
        }
    }

    fn form_mut(&mut self) -> Result<&mut ConfigurationForm> {
        self.expect_view(View::Player)?;
        self.form
            .as_mut()
            .ok_or_else(|| SubGeniusError::InvalidState("No video loaded".to_string()))
    }

    fn editor(&self) -> Result<&SubtitleEditor> {
        self.controller
            .editor()
            .ok_or_else(|| SubGeniusError::InvalidState("No subtitles yet".to_string()))
    }

    /// Status block for the current view.
    pub fn describe(&self) -> String {
        let mut out = Vec::new();
        if let Some(notice) = self.controller.notice() {
            out.push(notice.to_string());
        }

        match self.controller.view() {
            View::Upload => {
                out.push("-- Upload video --".to_string());
                out.push(format!("{} | {}", FORMATS_HINT, MAX_SIZE_HINT));
                if let Some(selected) = self.panel.selected() {
                    out.push(format!("Selected: {} ({} MB)", selected.name, selected.size_mb()));
                }
                if let Some(notice) = self.panel.notice() {
                    out.push(notice.to_string());
                }
            }
            View::Player => {
                out.push("-- Subtitle settings --".to_string());
                if let Some(asset) = self.controller.state().asset() {
                    out.push(format!("Video: {} [{}]", asset.name, asset.preview_url()));
                }
                if let Some(form) = &self.form {
                    let p = form.params();
                    out.push(format!(
                        "language={} model={} format={} speakers={} translate={}",
                        p.language, p.model_size, p.format, p.num_speakers, p.translate
                    ));
                    if let Some(warning) = form.extension_warning() {
                        out.push(warning);
                    }
                }
            }
            View::Editor => {
                out.push("-- Subtitle editor --".to_string());
                if let Some(result) = self.controller.state().result() {
                    out.push(format!(
                        "Format: {} | {} segments | {:.2}s",
                        result.format.as_str().to_uppercase(),
                        result.segments_count,
                        result.duration
                    ));
                }
                if let Some(editor) = self.controller.editor() {
                    let mode = if editor.is_editing() { "editing" } else { "read-only" };
                    out.push(format!("Mode: {}", mode));
                }
            }
        }
        out.join("\n")
    }
}

fn help_text(view: View) -> String {
    let common = "status | reset | dismiss | help | quit";
    let specific = match view {
        View::Upload => "select <path> | remove | confirm",
        View::Player => {
            "language <code> | model base|medium | format srt|vtt|txt | speakers <1-5> | translate on|off | generate"
        }
        View::Editor => "show | edit | load <file> | save | cancel | export | video",
    };
    format!("{}\n{}", specific, common)
}

/// Supported codes for the `languages` command, fifteen per line.
pub fn language_table() -> String {
    SUPPORTED_LANGUAGES
        .chunks(15)
        .map(|chunk| chunk.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-shot flow used by the `generate` command.
pub async fn generate_once(
    controller: &mut Controller,
    input: &Path,
    form_defaults: TranscriptionRequest,
    apply: impl FnOnce(&mut ConfigurationForm) -> Result<()>,
) -> Result<()> {
    let mut panel = UploadPanel::new();
    panel.select(UploadCandidate::from_path(input)?)?;
    let candidate = panel
        .confirm()
        .ok_or_else(|| SubGeniusError::InvalidState("No video selected".to_string()))?;

    let mut form = ConfigurationForm::new(candidate.name.clone(), form_defaults);
    controller.upload(candidate)?;
    apply(&mut form)?;

    let request = form.submit(controller.is_generating())?;
    let pb = loading_indicator(GENERATING);
    let outcome = controller.generate(request).await;
    pb.finish_and_clear();
    outcome?;

    if let Some(notice) = controller.notice() {
        info!("{}", notice);
    }
    Ok(())
}
