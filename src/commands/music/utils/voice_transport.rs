//! The seam between the playback controller and the outbound audio link.
//!
//! [`VoiceTransport`] joins voice channels; the resulting [`VoiceConnection`] is owned by a
//! session and is only ever driven from inside that session's lock. The songbird-backed
//! implementation lives here as well.

use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use serenity::prelude::Mutex as SerenityMutex;
use songbird::input::{HttpRequest, Input};
use songbird::tracks::{ControlError, TrackHandle};
use songbird::{Call, Event, Songbird, TrackEvent};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::HTTP_CLIENT;

use super::event_handlers::{CompletionSignal, SongEndNotifier};
use super::music_manager::{MusicError, MusicResult};

/// Opens voice connections.
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    async fn join(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> MusicResult<Box<dyn VoiceConnection>>;
}

/// A live outbound audio link to one voice channel.
///
/// `start` must arrange for `on_complete` to fire exactly once, after `start` returns,
/// whether the stream ends naturally, fails, or is stopped.
#[async_trait]
pub trait VoiceConnection: Send + Sync {
    async fn is_connected(&self) -> bool;

    async fn start(&self, uri: &str, on_complete: CompletionSignal) -> MusicResult<()>;

    /// Ends the current stream, if any. Its completion signal still fires.
    async fn stop(&self);

    async fn disconnect(&self);
}

/// The handle of a track that finished on its own refuses further control with `Finished`.
fn track_already_ended(err: &ControlError) -> bool {
    matches!(err, ControlError::Finished)
}

/// Joins voice channels through songbird.
pub struct SongbirdTransport {
    songbird: Arc<Songbird>,
}

impl SongbirdTransport {
    pub fn new(songbird: Arc<Songbird>) -> Self {
        Self { songbird }
    }
}

#[async_trait]
impl VoiceTransport for SongbirdTransport {
    async fn join(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> MusicResult<Box<dyn VoiceConnection>> {
        info!("Joining voice channel {} in guild {}", channel_id, guild_id);

        let call = self
            .songbird
            .join(guild_id, channel_id)
            .await
            .map_err(|e| MusicError::JoinError(e.to_string()))?;

        Ok(Box::new(SongbirdConnection {
            guild_id,
            songbird: Arc::clone(&self.songbird),
            call,
            current: Mutex::new(None),
        }))
    }
}

/// A songbird call plus the handle of the track it is currently streaming.
pub struct SongbirdConnection {
    guild_id: GuildId,
    songbird: Arc<Songbird>,
    call: Arc<SerenityMutex<Call>>,
    current: Mutex<Option<TrackHandle>>,
}

#[async_trait]
impl VoiceConnection for SongbirdConnection {
    async fn is_connected(&self) -> bool {
        self.call.lock().await.current_connection().is_some()
    }

    async fn start(&self, uri: &str, on_complete: CompletionSignal) -> MusicResult<()> {
        let input: Input = HttpRequest::new(HTTP_CLIENT.clone(), uri.to_string()).into();

        let track_handle = {
            let mut handler = self.call.lock().await;
            handler.play_input(input)
        };

        // End and Error can both fire for one track; the notifier forwards only the first.
        let notifier = SongEndNotifier::new(on_complete);
        let registered = track_handle
            .add_event(Event::Track(TrackEvent::End), notifier.clone())
            .and_then(|_| track_handle.add_event(Event::Track(TrackEvent::Error), notifier));

        if let Err(e) = registered {
            let _ = track_handle.stop();
            return Err(MusicError::StreamError(format!(
                "Failed to watch track for completion: {}",
                e
            )));
        }

        debug!("Stream started for guild {}", self.guild_id);
        *self.current.lock().await = Some(track_handle);

        Ok(())
    }

    async fn stop(&self) {
        if let Some(track_handle) = self.current.lock().await.take() {
            match track_handle.stop() {
                Ok(()) => {}
                Err(e) if track_already_ended(&e) => {
                    debug!("Track in guild {} had already ended", self.guild_id);
                }
                Err(e) => warn!("Failed to stop track in guild {}: {}", self.guild_id, e),
            }
        }
    }

    async fn disconnect(&self) {
        self.stop().await;

        if let Err(e) = self.songbird.remove(self.guild_id).await {
            warn!(
                "Failed to leave voice channel in guild {}: {}",
                self.guild_id, e
            );
        }
    }
}
