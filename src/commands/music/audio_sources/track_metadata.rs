//! Defines the `TrackMetadata` struct, the resolved and ready-to-stream description of a track,
//! along with the conversion from `yt-dlp --dump-json` output.

use crate::commands::music::utils::music_manager::{MusicError, MusicResult};
use serde::Deserialize;
use std::process::Output;
use std::time::Duration;

/// Immutable description of a playable track, produced by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetadata {
    /// The title shown to users.
    pub title: String,
    /// Direct media URL handed to the voice transport.
    pub playable_url: String,
    /// Upstream video id, if the source exposes one.
    pub external_id: Option<String>,
    /// Human-facing page for the track (e.g. the YouTube watch URL).
    pub page_url: Option<String>,
    /// The duration of the track, if available.
    pub duration: Option<Duration>,
}

impl TrackMetadata {
    /// URL to a thumbnail image for the track, if available.
    pub fn thumbnail(&self) -> Option<String> {
        self.external_id
            .as_ref()
            .map(|id| format!("https://img.youtube.com/vi/{}/hqdefault.jpg", id))
    }

    /// Parse the JSON document printed by `yt-dlp -j`.
    ///
    /// Search results arrive wrapped in an `entries` array; the first entry is used.
    /// The first audio-only format wins, falling back to the top-level `url`.
    pub fn from_ytdlp_json(json: &str) -> MusicResult<Self> {
        let mut info: YtDlpInfo = serde_json::from_str(json).map_err(|e| {
            MusicError::AudioSourceError(format!("Failed to parse video metadata: {}", e))
        })?;

        let info = match info.entries.take() {
            Some(entries) => entries
                .into_iter()
                .next()
                .ok_or_else(|| MusicError::AudioSourceError("No results found.".to_string()))?,
            None => info,
        };

        let audio_url = info
            .formats
            .iter()
            .find(|format| format.is_audio_only())
            .and_then(|format| format.url.clone())
            .or(info.url)
            .ok_or_else(|| {
                MusicError::AudioSourceError("No playable audio stream found.".to_string())
            })?;

        Ok(Self {
            title: info
                .title
                .map(|title| html_escape::decode_html_entities(&title).into_owned())
                .unwrap_or_else(|| "Unknown Title".to_string()),
            playable_url: audio_url,
            external_id: info.id,
            page_url: info.webpage_url,
            duration: info
                .duration
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
        })
    }
}

/// Converts the output of `yt-dlp --dump-json` into `TrackMetadata`.
impl TryFrom<Output> for TrackMetadata {
    type Error = MusicError;

    fn try_from(value: Output) -> Result<Self, Self::Error> {
        if !value.status.success() {
            let stderr = String::from_utf8_lossy(&value.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("yt-dlp exited with an error");
            return Err(MusicError::AudioSourceError(reason.trim().to_string()));
        }

        Self::from_ytdlp_json(&String::from_utf8_lossy(&value.stdout))
    }
}

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    id: Option<String>,
    webpage_url: Option<String>,
    url: Option<String>,
    duration: Option<f64>,
    #[serde(default)]
    formats: Vec<YtDlpFormat>,
    entries: Option<Vec<YtDlpInfo>>,
}

#[derive(Debug, Deserialize)]
struct YtDlpFormat {
    url: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
}

impl YtDlpFormat {
    fn is_audio_only(&self) -> bool {
        self.url.is_some()
            && self.vcodec.as_deref() == Some("none")
            && self.acodec.as_deref().is_some_and(|codec| codec != "none")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_prefers_first_audio_only_format() {
        let doc = json!({
            "title": "Song",
            "id": "abc123",
            "webpage_url": "https://www.youtube.com/watch?v=abc123",
            "url": "https://media.example/muxed",
            "duration": 215.0,
            "formats": [
                { "url": "https://media.example/video", "vcodec": "avc1", "acodec": "none" },
                { "url": "https://media.example/audio-1", "vcodec": "none", "acodec": "opus" },
                { "url": "https://media.example/audio-2", "vcodec": "none", "acodec": "mp4a" }
            ]
        });

        let track = TrackMetadata::from_ytdlp_json(&doc.to_string()).unwrap();

        assert_eq!(
            track,
            TrackMetadata {
                title: "Song".to_string(),
                playable_url: "https://media.example/audio-1".to_string(),
                external_id: Some("abc123".to_string()),
                page_url: Some("https://www.youtube.com/watch?v=abc123".to_string()),
                duration: Some(Duration::from_secs(215)),
            }
        );
        assert_eq!(
            track.thumbnail().as_deref(),
            Some("https://img.youtube.com/vi/abc123/hqdefault.jpg")
        );
    }

    #[test]
    fn test_falls_back_to_top_level_url() {
        let doc = json!({
            "url": "https://media.example/direct",
            "formats": [
                { "url": "https://media.example/video", "vcodec": "avc1", "acodec": "mp4a" }
            ]
        });

        let track = TrackMetadata::from_ytdlp_json(&doc.to_string()).unwrap();

        assert_eq!(track.playable_url, "https://media.example/direct");
        assert_eq!(track.title, "Unknown Title");
        assert_eq!(track.thumbnail(), None);
    }

    #[test]
    fn test_search_results_use_first_entry() {
        let doc = json!({
            "entries": [
                { "title": "First", "id": "one", "url": "https://media.example/one" },
                { "title": "Second", "id": "two", "url": "https://media.example/two" }
            ]
        });

        let track = TrackMetadata::from_ytdlp_json(&doc.to_string()).unwrap();

        assert_eq!(track.title, "First");
        assert_eq!(track.external_id.as_deref(), Some("one"));
    }

    #[test]
    fn test_empty_search_results_fail() {
        let doc = json!({ "entries": [] });

        assert_matches!(
            TrackMetadata::from_ytdlp_json(&doc.to_string()),
            Err(MusicError::AudioSourceError(reason)) if reason == "No results found."
        );
    }

    #[test]
    fn test_missing_stream_url_fails() {
        let doc = json!({
            "title": "Members only",
            "formats": [{ "vcodec": "none", "acodec": "opus" }]
        });

        assert_matches!(
            TrackMetadata::from_ytdlp_json(&doc.to_string()),
            Err(MusicError::AudioSourceError(reason)) if reason == "No playable audio stream found."
        );
    }

    #[test]
    fn test_garbage_output_fails() {
        assert_matches!(
            TrackMetadata::from_ytdlp_json("ERROR: not json"),
            Err(MusicError::AudioSourceError(_))
        );
    }

    #[test]
    fn test_escaped_title_is_decoded() {
        let doc = json!({
            "title": "Simon &amp; Garfunkel &#8211; &quot;The Boxer&quot;",
            "url": "https://media.example/boxer"
        });

        let track = TrackMetadata::from_ytdlp_json(&doc.to_string()).unwrap();

        assert_eq!(track.title, "Simon & Garfunkel \u{2013} \"The Boxer\"");
    }

    #[test]
    fn test_unrepresentable_duration_is_dropped() {
        for duration in [json!(1e30), json!(-5.0)] {
            let doc = json!({ "url": "https://media.example/odd", "duration": duration });

            let track = TrackMetadata::from_ytdlp_json(&doc.to_string()).unwrap();

            assert_eq!(track.duration, None);
        }
    }
}
