//! Resolves search text and direct links into playable tracks.
//! Uses the `yt-dlp` command-line tool for extracting information.

use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info};

use crate::commands::music::utils::music_manager::MusicError;

use super::{AudioSource, AudioSourceResult, TrackMetadata};

/// Runs `yt-dlp` to turn a reference into a `TrackMetadata`.
#[derive(Debug, Clone)]
pub struct YoutubeApi {
    ytdlp_path: String,
    cookies: Option<PathBuf>,
}

impl YoutubeApi {
    pub fn new(ytdlp_path: impl Into<String>, cookies: Option<PathBuf>) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
            cookies,
        }
    }

    /// Links are handed to `yt-dlp` unchanged; anything else becomes a single-result search.
    pub fn extraction_target(reference: &str) -> String {
        if AudioSource::is_url(reference) {
            reference.to_string()
        } else {
            format!("ytsearch1:{}", reference)
        }
    }

    /// Fetches metadata and the direct audio stream URL for a link or search phrase.
    pub async fn extract(&self, reference: &str) -> AudioSourceResult<TrackMetadata> {
        let target = Self::extraction_target(reference);
        info!("Extracting audio for: {}", target);

        let mut command = Command::new(&self.ytdlp_path);
        command.args([
            "-j",            // Output as JSON
            "--no-playlist", // Don't process playlists
            "-f",
            "bestaudio/best",
        ]);
        if let Some(cookies) = &self.cookies {
            command.arg("--cookies").arg(cookies);
        }
        command.arg(&target);

        let output = command.output().await.map_err(|e| {
            MusicError::AudioSourceError(format!("Failed to run {}: {}", self.ytdlp_path, e))
        })?;

        let metadata = TrackMetadata::try_from(output)?;
        debug!(
            "Resolved '{}' to '{}' ({:?})",
            reference, metadata.title, metadata.external_id
        );

        Ok(metadata)
    }
}
