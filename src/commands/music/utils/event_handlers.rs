use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::model::id::GuildId;
use songbird::tracks::PlayMode;
use tokio::sync::Mutex;
use tracing::debug;

use super::session_registry::SessionCell;

/// Delivers the end of one stream back into its session.
///
/// Each signal belongs to exactly one `start` call, identified by the session generation at
/// the time. It holds the session only weakly, so a released session is never kept alive
/// or revived by a late completion.
#[derive(Debug)]
pub struct CompletionSignal {
    guild_id: GuildId,
    generation: u64,
    session: Weak<Mutex<SessionCell>>,
}

impl CompletionSignal {
    pub(crate) fn new(guild_id: GuildId, generation: u64, session: Weak<Mutex<SessionCell>>) -> Self {
        Self {
            guild_id,
            generation,
            session,
        }
    }

    /// Report that the stream ended, with the transport error if it failed.
    ///
    /// Runs the advance inside the session lock, so it never interleaves with a command for
    /// the same guild.
    pub async fn complete(self, error: Option<String>) {
        let Some(session) = self.session.upgrade() else {
            debug!(
                "Dropping completion for guild {}: session no longer exists",
                self.guild_id
            );
            return;
        };

        let mut cell = session.lock().await;
        cell.on_stream_complete(self.generation, error).await;
    }
}

/// Event handler for when a song ends or fails
#[derive(Clone)]
pub struct SongEndNotifier {
    signal: Arc<std::sync::Mutex<Option<CompletionSignal>>>,
    fired: Arc<AtomicBool>,
}

impl SongEndNotifier {
    pub fn new(signal: CompletionSignal) -> Self {
        Self {
            signal: Arc::new(std::sync::Mutex::new(Some(signal))),
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    fn take_signal(&self) -> Option<CompletionSignal> {
        if self.fired.swap(true, Ordering::SeqCst) {
            return None;
        }
        self.signal.lock().ok().and_then(|mut slot| slot.take())
    }
}

#[async_trait]
impl songbird::EventHandler for SongEndNotifier {
    async fn act(&self, ctx: &songbird::EventContext<'_>) -> Option<songbird::Event> {
        if let songbird::EventContext::Track(tracks) = ctx {
            let error = tracks.iter().find_map(|(state, _)| match &state.playing {
                PlayMode::Errored(e) => Some(format!("{:?}", e)),
                _ => None,
            });

            if let Some(signal) = self.take_signal() {
                // Hand off so the songbird event thread never waits on a session lock.
                tokio::spawn(signal.complete(error));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifier_clones_hand_out_signal_once() {
        let slot = SessionCell::shared(GuildId::new(5));
        let signal = CompletionSignal::new(GuildId::new(5), 1, Arc::downgrade(&slot));

        // One clone per registered track event, as `start` does for End and Error
        let on_end = SongEndNotifier::new(signal);
        let on_error = on_end.clone();

        assert!(on_end.take_signal().is_some());
        assert!(on_error.take_signal().is_none());
        assert!(on_end.take_signal().is_none());
    }
}
