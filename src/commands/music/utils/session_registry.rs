//! Maps guilds to their voice sessions.
//!
//! Every guild gets one slot, an `Arc<Mutex<SessionCell>>`. Locking the slot is the
//! per-session exclusion scope: commands and stream completions for a guild all run while
//! holding it, and different guilds never contend.

use dashmap::DashMap;
use serenity::model::id::GuildId;
use std::future::Future;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::commands::music::audio_sources::TrackMetadata;

use super::music_manager::MusicResult;
use super::playback_controller::PlaybackState;
use super::queue_manager::PlaybackQueue;
use super::voice_transport::VoiceConnection;

pub type SharedSession = Arc<Mutex<SessionCell>>;

/// The bot's presence in one voice channel.
pub struct Session {
    pub(crate) connection: Box<dyn VoiceConnection>,
    pub(crate) queue: PlaybackQueue,
    pub(crate) state: PlaybackState,
    pub(crate) now_playing: Option<TrackMetadata>,
}

impl Session {
    pub fn new(connection: Box<dyn VoiceConnection>) -> Self {
        Self {
            connection,
            queue: PlaybackQueue::new(),
            state: PlaybackState::Idle,
            now_playing: None,
        }
    }
}

/// The contents of a guild's slot.
///
/// `released` is terminal: once set, the slot has been detached from the registry and
/// anything still holding it must treat the guild as having no session.
pub struct SessionCell {
    pub(crate) guild_id: GuildId,
    pub(crate) session: Option<Session>,
    pub(crate) released: bool,
    /// Bumped on every stream start and on release; completions carry the value they were
    /// issued with.
    pub(crate) generation: u64,
    pub(crate) this: Weak<Mutex<SessionCell>>,
}

impl SessionCell {
    pub(crate) fn shared(guild_id: GuildId) -> SharedSession {
        Arc::new_cyclic(|this| {
            Mutex::new(SessionCell {
                guild_id,
                session: None,
                released: false,
                generation: 0,
                this: this.clone(),
            })
        })
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }
}

/// Guild id to session slot.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<GuildId, SharedSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, guild_id: GuildId) -> Option<SharedSession> {
        self.sessions
            .get(&guild_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, guild_id: GuildId) -> bool {
        self.sessions.contains_key(&guild_id)
    }

    fn slot(&self, guild_id: GuildId) -> SharedSession {
        Arc::clone(
            self.sessions
                .entry(guild_id)
                .or_insert_with(|| SessionCell::shared(guild_id))
                .value(),
        )
    }

    /// Lock the guild's slot, skipping slots that were released while we waited.
    pub async fn lock(&self, guild_id: GuildId) -> OwnedMutexGuard<SessionCell> {
        loop {
            let cell = self.slot(guild_id).lock_owned().await;
            if !cell.released {
                return cell;
            }
            debug!("Slot for guild {} was released, retrying", guild_id);
        }
    }

    /// Return the guild's session locked, joining voice first if there is no usable one.
    ///
    /// A session whose connection reports disconnected is torn down and replaced with a
    /// fresh one (empty queue, idle). `join` runs inside the slot lock, so concurrent
    /// callers for the same guild join at most once. If `join` fails no session is left
    /// behind.
    pub async fn get_or_create<F, Fut>(
        &self,
        guild_id: GuildId,
        join: F,
    ) -> MusicResult<OwnedMutexGuard<SessionCell>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MusicResult<Box<dyn VoiceConnection>>>,
    {
        let mut cell = self.lock(guild_id).await;

        if let Some(session) = &cell.session {
            if session.connection.is_connected().await {
                return Ok(cell);
            }

            warn!(
                "Voice connection for guild {} dropped, discarding its session",
                guild_id
            );
            if let Some(stale) = cell.session.take() {
                cell.generation += 1;
                stale.connection.disconnect().await;
            }
        }

        match join().await {
            Ok(connection) => {
                info!("Created voice session for guild {}", guild_id);
                cell.session = Some(Session::new(connection));
                Ok(cell)
            }
            Err(err) => {
                self.detach(&mut cell);
                Err(err)
            }
        }
    }

    /// Mark a locked slot released and remove it from the map.
    ///
    /// Called with the slot still locked and after the connection has been torn down, so
    /// nobody can join the guild again while the old connection is still alive. Only removes
    /// the entry if it still points at this slot.
    pub(crate) fn detach(&self, cell: &mut SessionCell) {
        cell.released = true;
        cell.generation += 1;

        if let Some(this) = cell.this.upgrade() {
            self.sessions
                .remove_if(&cell.guild_id, |_, slot| Arc::ptr_eq(slot, &this));
        }
    }

    /// Lock the guild's slot only if the guild already has one.
    pub async fn lock_existing(&self, guild_id: GuildId) -> Option<OwnedMutexGuard<SessionCell>> {
        loop {
            let cell = self.get(guild_id)?.lock_owned().await;
            if !cell.released {
                return Some(cell);
            }
        }
    }
}
