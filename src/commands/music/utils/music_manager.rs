use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::commands::music::audio_sources::{TrackMetadata, TrackResolver};

use super::playback_controller::{PlayOutcome, PlaybackState};
use super::queue_manager::QueueEntry;
use super::session_registry::SessionRegistry;
use super::voice_transport::VoiceTransport;

/// Errors that can occur during music operations
#[derive(Error, Debug)]
pub enum MusicError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("User is not in a voice channel")]
    UserNotInVoiceChannel,

    #[error("Failed to join voice channel: {0}")]
    JoinError(String),

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Nothing is playing")]
    NothingPlaying,

    #[error("Audio source error: {0}")]
    AudioSourceError(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Stream error: {0}")]
    StreamError(String),
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

/// Entry point for the music commands.
///
/// Owns the session registry plus the resolver and transport every session shares.
pub struct MusicManager {
    registry: SessionRegistry,
    resolver: Arc<dyn TrackResolver>,
    transport: Arc<dyn VoiceTransport>,
}

impl MusicManager {
    pub fn new(resolver: Arc<dyn TrackResolver>, transport: Arc<dyn VoiceTransport>) -> Self {
        Self {
            registry: SessionRegistry::new(),
            resolver,
            transport,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Resolve `reference` and either start it or queue it.
    ///
    /// `user_channel` is the voice channel the requester is in. It is only needed when the
    /// bot has no live connection in the guild yet. Resolution happens before any join, so a
    /// reference that cannot be resolved never creates a session.
    pub async fn play(
        &self,
        guild_id: GuildId,
        user_channel: Option<ChannelId>,
        reference: &str,
    ) -> MusicResult<PlayOutcome> {
        if user_channel.is_none() && !self.has_live_session(guild_id).await {
            return Err(MusicError::UserNotInVoiceChannel);
        }

        debug!("Resolving '{}' for guild {}", reference, guild_id);
        let track = self.resolver.resolve(reference).await?;

        let transport = Arc::clone(&self.transport);
        let mut cell = self
            .registry
            .get_or_create(guild_id, || async move {
                let channel_id = user_channel.ok_or(MusicError::UserNotInVoiceChannel)?;
                transport.join(guild_id, channel_id).await
            })
            .await?;

        cell.request_play(track).await
    }

    /// Stop the current track; the queue advances on its own once the stream ends.
    pub async fn skip(&self, guild_id: GuildId) -> MusicResult<TrackMetadata> {
        let mut cell = self
            .registry
            .lock_existing(guild_id)
            .await
            .ok_or(MusicError::NothingPlaying)?;

        cell.request_skip().await
    }

    /// Clear the queue, leave voice and forget the guild's session.
    pub async fn leave(&self, guild_id: GuildId) -> MusicResult<()> {
        let mut cell = self
            .registry
            .lock_existing(guild_id)
            .await
            .ok_or(MusicError::NotConnected)?;

        let result = cell.request_leave().await;
        self.registry.detach(&mut cell);
        info!("Session for guild {} released", guild_id);

        result
    }

    /// Pending tracks, not including the one playing. Empty when there is no session.
    pub async fn list_queue(&self, guild_id: GuildId) -> Vec<QueueEntry> {
        match self.registry.lock_existing(guild_id).await {
            Some(cell) => cell.list_queue(),
            None => Vec::new(),
        }
    }

    pub async fn now_playing(&self, guild_id: GuildId) -> Option<TrackMetadata> {
        let cell = self.registry.lock_existing(guild_id).await?;
        cell.now_playing().cloned()
    }

    pub async fn playback_state(&self, guild_id: GuildId) -> Option<PlaybackState> {
        let cell = self.registry.lock_existing(guild_id).await?;
        cell.playback_state()
    }

    async fn has_live_session(&self, guild_id: GuildId) -> bool {
        let Some(cell) = self.registry.lock_existing(guild_id).await else {
            return false;
        };
        match cell.session() {
            Some(session) => session.connection.is_connected().await,
            None => false,
        }
    }
}
