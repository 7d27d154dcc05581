//! The playback state machine for one session.
//!
//! ```text
//! Idle    --request_play-------------------------> Playing
//! Playing --on_stream_complete, queue empty------> Idle
//! Playing --on_stream_complete, queue non-empty--> Playing (next track)
//! Idle | Playing --request_leave-----------------> Released
//! ```
//!
//! All of these run on a locked [`SessionCell`], so for one guild they are strictly
//! sequential. Skipping only stops the current stream; the completion it triggers performs
//! the advance, which keeps a single advance path.

use tracing::{debug, error, info, warn};

use crate::commands::music::audio_sources::TrackMetadata;

use super::event_handlers::CompletionSignal;
use super::music_manager::{MusicError, MusicResult};
use super::queue_manager::QueueEntry;
use super::session_registry::SessionCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
}

/// What `request_play` did with the track.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    /// Nothing was playing; the track is streaming now.
    StartedNow(TrackMetadata),
    /// Something was playing; the track waits at `position` (1-indexed) in the queue.
    Enqueued {
        track: TrackMetadata,
        position: usize,
    },
}

impl SessionCell {
    pub fn playback_state(&self) -> Option<PlaybackState> {
        self.session.as_ref().map(|session| session.state)
    }

    pub fn now_playing(&self) -> Option<&TrackMetadata> {
        self.session.as_ref()?.now_playing.as_ref()
    }

    pub fn list_queue(&self) -> Vec<QueueEntry> {
        self.session
            .as_ref()
            .map(|session| session.queue.entries())
            .unwrap_or_default()
    }

    /// Start the track if idle, otherwise append it to the queue.
    ///
    /// If the stream cannot be started the session stays idle and the error is returned.
    pub async fn request_play(&mut self, track: TrackMetadata) -> MusicResult<PlayOutcome> {
        let session = self.session.as_mut().ok_or(MusicError::NotConnected)?;

        if session.state == PlaybackState::Playing {
            session.queue.push(track.clone());
            let position = session.queue.len();
            info!(
                "Queued '{}' at position {} for guild {}",
                track.title, position, self.guild_id
            );
            return Ok(PlayOutcome::Enqueued { track, position });
        }

        self.start(track.clone()).await?;
        info!("Now playing '{}' in guild {}", track.title, self.guild_id);
        Ok(PlayOutcome::StartedNow(track))
    }

    /// Advance after the stream started under `generation` ended.
    ///
    /// Transport errors are logged and otherwise treated like a normal end. Completions for
    /// a released session, or for anything but the most recent start, are ignored.
    pub async fn on_stream_complete(&mut self, generation: u64, error: Option<String>) {
        if self.released {
            debug!(
                "Ignoring completion for released session in guild {}",
                self.guild_id
            );
            return;
        }
        if generation != self.generation {
            debug!(
                "Ignoring stale completion {} (current {}) in guild {}",
                generation, self.generation, self.guild_id
            );
            return;
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.state != PlaybackState::Playing {
            return;
        }

        if let Some(error) = error {
            warn!("Playback error in guild {}: {}", self.guild_id, error);
        }

        session.state = PlaybackState::Idle;
        session.now_playing = None;

        loop {
            let next = match self.session.as_mut() {
                Some(session) => session.queue.pop(),
                None => return,
            };

            let Some(next) = next else {
                info!("Queue finished for guild {}, going idle", self.guild_id);
                return;
            };

            let title = next.title.clone();
            match self.start(next).await {
                Ok(()) => {
                    info!("Now playing '{}' in guild {}", title, self.guild_id);
                    return;
                }
                Err(e) => {
                    error!(
                        "Failed to start '{}' in guild {}, skipping: {}",
                        title, self.guild_id, e
                    );
                }
            }
        }
    }

    /// Ask the transport to end the current stream and return the track being skipped.
    pub async fn request_skip(&mut self) -> MusicResult<TrackMetadata> {
        let session = self
            .session
            .as_ref()
            .filter(|session| session.state == PlaybackState::Playing)
            .ok_or(MusicError::NothingPlaying)?;

        let current = session
            .now_playing
            .clone()
            .ok_or(MusicError::NothingPlaying)?;

        info!("Skipping '{}' in guild {}", current.title, self.guild_id);
        session.connection.stop().await;

        Ok(current)
    }

    /// Clear the queue and release the connection. Terminal for this slot.
    ///
    /// The slot is marked released before anything awaits, so a completion that is already
    /// waiting on the lock finds nothing to advance.
    pub async fn request_leave(&mut self) -> MusicResult<()> {
        if self.released {
            return Err(MusicError::NotConnected);
        }
        let mut session = self.session.take().ok_or(MusicError::NotConnected)?;

        self.released = true;
        self.generation += 1;
        session.queue.clear();
        session.now_playing = None;

        info!("Leaving voice in guild {}", self.guild_id);
        session.connection.disconnect().await;

        Ok(())
    }

    /// Issue the stream start for `track` and mark the session playing.
    async fn start(&mut self, track: TrackMetadata) -> MusicResult<()> {
        self.generation += 1;
        let signal = CompletionSignal::new(self.guild_id, self.generation, self.this.clone());

        let session = self.session.as_mut().ok_or(MusicError::NotConnected)?;
        session.connection.start(&track.playable_url, signal).await?;

        session.state = PlaybackState::Playing;
        session.now_playing = Some(track);
        Ok(())
    }
}
