//! This module turns a free-form reference (search text, a direct link, or a Spotify track
//! link) into a playable [`TrackMetadata`]. Resolution never touches sessions or queues.

/// Submodule implementing Spotify track lookups.
pub mod spotify;
/// Submodule defining the `TrackMetadata` struct used across audio sources.
pub mod track_metadata;
/// Submodule implementing resolution through `yt-dlp`.
pub mod youtube;

use crate::commands::music::utils::music_manager::{MusicError, MusicResult};
use crate::config::BotConfig;
use serenity::async_trait;
use spotify::SpotifyApi;
use tracing::info;
use url::Url;
use youtube::YoutubeApi;

pub use track_metadata::TrackMetadata;

/// A specialized `Result` type for operations within the `audio_sources` module.
pub type AudioSourceResult<T> = Result<T, MusicError>;

/// Produces a playable track for a user-supplied reference.
///
/// Implementations may take seconds (network, subprocesses) but must not have side effects
/// on sessions or queues.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve(&self, reference: &str) -> MusicResult<TrackMetadata>;
}

/// Resolver that dispatches between Spotify links and `yt-dlp`.
pub struct AudioSource {
    youtube: YoutubeApi,
    spotify: Option<SpotifyApi>,
}

impl AudioSource {
    pub fn new(youtube: YoutubeApi, spotify: Option<SpotifyApi>) -> Self {
        Self { youtube, spotify }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        let youtube = YoutubeApi::new(config.ytdlp_path.clone(), config.ytdlp_cookies.clone());
        let spotify = config.spotify.as_ref().map(|credentials| {
            SpotifyApi::new(
                credentials.client_id.clone(),
                credentials.client_secret.clone(),
            )
        });

        Self::new(youtube, spotify)
    }

    /// Checks if the input is an absolute http(s) link.
    /// Does not validate if the URL is actually reachable or supported by any source.
    pub fn is_url(input: &str) -> bool {
        Url::parse(input).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
    }
}

#[async_trait]
impl TrackResolver for AudioSource {
    async fn resolve(&self, reference: &str) -> MusicResult<TrackMetadata> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(MusicError::AudioSourceError(
                "Nothing to search for.".to_string(),
            ));
        }

        if let Some(track_id) = SpotifyApi::extract_track_id(reference) {
            let spotify = self.spotify.as_ref().ok_or_else(|| {
                MusicError::ConfigError(
                    "Spotify support not available (missing credentials).".to_string(),
                )
            })?;

            let track = spotify.get_track(&track_id).await?;
            let query = SpotifyApi::get_youtube_search_query(&track);
            info!("Searching YouTube for Spotify track: {}", query);

            return self.youtube.extract(&query).await;
        }

        self.youtube.extract(reference).await
    }
}
