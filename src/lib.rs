//! SubGenius - Video to Subtitle Workflow
//!
//! Client side of a subtitle generation service: pick a video, choose
//! transcription parameters, send both to the backend, review and edit the
//! returned subtitles, then download them or a copy of the video with the
//! subtitles burned in.

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod language;
pub mod media;
pub mod notice;
pub mod object_url;
pub mod progress;
pub mod request;
pub mod shell;
pub mod subtitle;
pub mod workflow;
