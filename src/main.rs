//! SubGenius - Video to Subtitle Workflow
//!
//! Command-line entry point: one-shot generation, burn-in of an existing
//! subtitle file, an interactive session and a few service utilities.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::{Level, info, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use subgenius::backend::{BackendFactory, MuxRequest, SubtitleBackend, VideoUpload};
use subgenius::cli::{Args, Commands, ConfigAction};
use subgenius::config::Config;
use subgenius::error::SubGeniusError;
use subgenius::media::UploadCandidate;
use subgenius::notice::DOWNLOADING_VIDEO;
use subgenius::progress::loading_indicator;
use subgenius::request::SubtitleFormat;
use subgenius::shell::{Shell, generate_once, language_table};
use subgenius::workflow::Controller;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Console and file logging; the guard flushes the file writer on exit
    let _log_guard = setup_logging(args.verbose)?;
    info!("Starting SubGenius");

    let config = Config::load(args.config.as_deref())?;

    match args.command {
        Commands::Generate {
            input,
            params,
            with_video,
            output_dir,
        } => {
            let output_dir = output_dir.unwrap_or_else(|| config.output.dir.clone());
            let backend = BackendFactory::create_http(&config.backend)?;
            let mut controller = Controller::new(backend, config.backend.mux_language.clone());

            let outcome = generate_once(
                &mut controller,
                &input,
                config.defaults.to_request(),
                |form| params.apply_to(form),
            )
            .await;
            if let Err(e) = outcome {
                print_notice(&controller);
                return Err(e.into());
            }
            print_notice(&controller);

            if let Some(result) = controller.state().result() {
                println!(
                    "Generated {} segments ({:.2}s of audio)",
                    result.segments_count, result.duration
                );
            }
            let path = controller
                .export_subtitles()?
                .save_into(&output_dir)
                .await?;
            println!("Subtitles saved to {}", path.display());

            if with_video {
                let pb = loading_indicator(DOWNLOADING_VIDEO);
                let outcome = controller.download_video_with_subtitles().await;
                pb.finish_and_clear();
                match outcome {
                    Ok(Some(download)) => {
                        let path = download.save_into(&output_dir).await?;
                        println!("Video saved to {}", path.display());
                    }
                    Ok(None) => {}
                    Err(e) => {
                        print_notice(&controller);
                        return Err(e.into());
                    }
                }
            }
        }
        Commands::Mux {
            input,
            subtitles,
            output_dir,
        } => {
            let output_dir = output_dir.unwrap_or_else(|| config.output.dir.clone());
            let backend = BackendFactory::create_http(&config.backend)?;
            let path = mux_existing(
                backend.as_ref(),
                &input,
                &subtitles,
                &config.backend.mux_language,
                &output_dir,
            )
            .await?;
            println!("Video saved to {}", path.display());
        }
        Commands::Shell { output_dir } => {
            let output_dir = output_dir.unwrap_or_else(|| config.output.dir.clone());
            let backend = BackendFactory::create_http(&config.backend)?;
            let controller = Controller::new(backend, config.backend.mux_language.clone());
            let mut shell = Shell::new(controller, config.defaults.to_request(), output_dir);
            shell.run().await?;
        }
        Commands::Languages => {
            println!("Supported languages (anything else falls back to ru):");
            println!("{}", language_table());
        }
        Commands::Health => {
            let backend = BackendFactory::create_http(&config.backend)?;
            let report = backend.health().await?;
            println!("Backend {}: {}", config.backend.url, report.status);
            for model in &report.models_loaded {
                let state = if model.loaded { "loaded" } else { "not loaded" };
                println!("  {:<10} {}", model.size, state);
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => {
                if path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists, pass --force to overwrite",
                        path.display()
                    );
                }
                Config::default().save_to_file(&path)?;
                println!("Wrote default configuration to {}", path.display());
            }
            ConfigAction::Show => {
                let content = toml::to_string_pretty(&config)
                    .map_err(|e| SubGeniusError::Config(e.to_string()))?;
                println!("{}", content);
            }
        },
    }

    Ok(())
}

/// Send an existing subtitle file with the video and save the burned-in copy.
async fn mux_existing(
    backend: &dyn SubtitleBackend,
    input: &Path,
    subtitles: &Path,
    language: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    let candidate = UploadCandidate::from_path(input)?;
    let subs_content = tokio::fs::read_to_string(subtitles)
        .await
        .map_err(|_| SubGeniusError::FileNotFound(subtitles.display().to_string()))?;
    let subs_format = SubtitleFormat::from_path(subtitles)?;

    if !candidate.is_accepted() {
        warn!(
            "{} has MIME type {}, the backend may refuse it",
            candidate.name, candidate.mime
        );
    }

    let video = VideoUpload {
        path: candidate.path,
        name: candidate.name.clone(),
        mime: candidate.mime,
        size: candidate.size,
    };
    let request = MuxRequest {
        subs_content,
        subs_format,
        language: language.to_string(),
        filename: candidate.name,
    };

    let pb = loading_indicator(DOWNLOADING_VIDEO);
    let outcome = backend.generate_video_with_subs(&video, &request).await;
    pb.finish_and_clear();
    let bytes = outcome?;

    tokio::fs::create_dir_all(output_dir).await?;
    let target = output_dir.join(format!("with_subs_{}", video.name));
    tokio::fs::write(&target, bytes).await?;
    Ok(target)
}

fn print_notice(controller: &Controller) {
    if let Some(notice) = controller.notice() {
        println!("{}", notice);
    }
}

fn setup_logging(verbose: bool) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".subgenius").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "subgenius.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("subgenius.log").display()
    );

    Ok(guard)
}
