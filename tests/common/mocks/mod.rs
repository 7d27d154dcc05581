//! In-memory stand-ins for the resolver and the voice transport
//!
//! The fake transport never completes a stream on its own. Tests fire completions explicitly,
//! in the order the streams were started, the way songbird would once a track ends.

use async_trait::async_trait;
use groovebox::commands::music::audio_sources::{TrackMetadata, TrackResolver};
use groovebox::commands::music::utils::event_handlers::CompletionSignal;
use groovebox::commands::music::utils::music_manager::{MusicError, MusicResult};
use groovebox::commands::music::utils::voice_transport::{VoiceConnection, VoiceTransport};
use poise::serenity_prelude::{ChannelId, GuildId};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use super::fixtures::{UNRESOLVABLE, track};

/// Resolves every reference to [`track`], except [`UNRESOLVABLE`]
pub struct StaticResolver;

#[async_trait]
impl TrackResolver for StaticResolver {
    async fn resolve(&self, reference: &str) -> MusicResult<TrackMetadata> {
        if reference == UNRESOLVABLE {
            return Err(MusicError::AudioSourceError("No results found.".to_string()));
        }
        Ok(track(reference))
    }
}

/// Everything the fake transport saw
#[derive(Default)]
pub struct TransportLog {
    pub joins: Vec<(GuildId, ChannelId)>,
    pub started: Vec<String>,
    pub pending: VecDeque<CompletionSignal>,
    pub stops: usize,
    pub disconnects: usize,
    pub connected: HashSet<GuildId>,
    pub fail_join: bool,
    pub fail_uris: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeTransport {
    log: Arc<Mutex<TransportLog>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, TransportLog> {
        self.log.lock().unwrap()
    }

    pub fn join_count(&self) -> usize {
        self.log().joins.len()
    }

    pub fn started(&self) -> Vec<String> {
        self.log().started.clone()
    }

    /// Pretend the voice gateway dropped us
    pub fn drop_connection(&self, guild_id: GuildId) {
        self.log().connected.remove(&guild_id);
    }

    /// Complete the oldest stream that has not completed yet
    pub async fn finish_stream(&self, error: Option<&str>) {
        let signal = self
            .log()
            .pending
            .pop_front()
            .expect("no stream is waiting for completion");
        signal.complete(error.map(str::to_string)).await;
    }

    pub fn pending_completions(&self) -> usize {
        self.log().pending.len()
    }
}

#[async_trait]
impl VoiceTransport for FakeTransport {
    async fn join(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> MusicResult<Box<dyn VoiceConnection>> {
        // Give a concurrent caller the chance to race us
        tokio::task::yield_now().await;

        let mut log = self.log();
        if log.fail_join {
            return Err(MusicError::JoinError("gateway timed out".to_string()));
        }
        log.joins.push((guild_id, channel_id));
        log.connected.insert(guild_id);

        Ok(Box::new(FakeConnection {
            guild_id,
            log: Arc::clone(&self.log),
        }))
    }
}

pub struct FakeConnection {
    guild_id: GuildId,
    log: Arc<Mutex<TransportLog>>,
}

#[async_trait]
impl VoiceConnection for FakeConnection {
    async fn is_connected(&self) -> bool {
        self.log.lock().unwrap().connected.contains(&self.guild_id)
    }

    async fn start(&self, uri: &str, on_complete: CompletionSignal) -> MusicResult<()> {
        let mut log = self.log.lock().unwrap();
        if log.fail_uris.iter().any(|bad| bad == uri) {
            return Err(MusicError::StreamError(format!("could not open {}", uri)));
        }
        log.started.push(uri.to_string());
        log.pending.push_back(on_complete);
        Ok(())
    }

    async fn stop(&self) {
        self.log.lock().unwrap().stops += 1;
    }

    async fn disconnect(&self) {
        let mut log = self.log.lock().unwrap();
        log.disconnects += 1;
        log.connected.remove(&self.guild_id);
    }
}
