//! Groovebox: a voice-channel music bot.
//!
//! Users queue tracks with `/play`, and the bot streams them one after another into the
//! voice channel. The interesting part lives in [`commands::music::utils`], which owns the
//! per-guild sessions, their queues and the playback state machine.

use std::sync::{Arc, LazyLock};

pub mod commands;
pub mod config;

use commands::music::utils::music_manager::MusicManager;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// User data, stored and accessible in all command invocations
pub struct Data {
    pub music: Arc<MusicManager>,
}

/// Shared HTTP client for the Spotify Web API and songbird stream inputs.
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);
