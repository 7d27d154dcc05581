//! Turns Spotify track links into YouTube search queries.
//! Handles authentication (client credentials flow), URL parsing, and the track lookup.

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use regex::Regex;
use reqwest::header;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::HTTP_CLIENT;
use crate::commands::music::utils::music_manager::MusicError;

/// Result type specific to Spotify API operations.
pub type SpotifyResult<T> = Result<T, MusicError>;

const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
const SPOTIFY_API_URL: &str = "https://api.spotify.com";

/// Regex to match and capture Spotify track URLs, including localized `intl-xx` paths.
static SPOTIFY_TRACK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?open\.spotify\.com/(?:intl-[A-Za-z-]+/)?track/([A-Za-z0-9]+)(?:[/?].*)?$",
    )
    .expect("Spotify track regex is valid")
});

/// Represents basic track information retrieved from Spotify.
#[derive(Clone, Debug, PartialEq)]
pub struct SpotifyTrack {
    /// The name of the track.
    pub name: String,
    /// A list of artist names associated with the track.
    pub artists: Vec<String>,
}

/// Represents the response from Spotify's token endpoint.
#[derive(Debug, Deserialize)]
struct SpotifyToken {
    /// The OAuth2 access token.
    access_token: String,
    /// The duration in seconds for which the token is valid.
    expires_in: u64,
    /// The time when the token was created, used to check expiry.
    #[serde(skip, default = "Instant::now")]
    created_at: Instant,
}

impl SpotifyToken {
    /// Considers the token expired 30 seconds before its actual expiry time.
    fn is_expired(&self) -> bool {
        let expiry = Duration::from_secs(self.expires_in);
        self.created_at.elapsed() > expiry.saturating_sub(Duration::from_secs(30))
    }
}

#[derive(Debug, Deserialize)]
struct TrackResponse {
    name: String,
    #[serde(default)]
    artists: Vec<ArtistResponse>,
}

#[derive(Debug, Deserialize)]
struct ArtistResponse {
    name: Option<String>,
}

/// Spotify Web API client using the client credentials flow.
pub struct SpotifyApi {
    client_id: String,
    client_secret: String,
    accounts_url: String,
    api_url: String,
    token: Mutex<Option<SpotifyToken>>,
}

impl SpotifyApi {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self::with_endpoints(
            client_id,
            client_secret,
            SPOTIFY_ACCOUNTS_URL,
            SPOTIFY_API_URL,
        )
    }

    /// Build a client against custom base URLs (used to point at a mock server).
    pub fn with_endpoints(
        client_id: String,
        client_secret: String,
        accounts_url: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            accounts_url: accounts_url.into(),
            api_url: api_url.into(),
            token: Mutex::new(None),
        }
    }

    /// Checks if the provided reference is a Spotify track link.
    pub fn is_spotify_track_url(url: &str) -> bool {
        SPOTIFY_TRACK_REGEX.is_match(url)
    }

    /// Attempts to extract the Spotify track ID from a URL.
    pub fn extract_track_id(url: &str) -> Option<String> {
        SPOTIFY_TRACK_REGEX
            .captures(url)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Builds the YouTube search query for a track: `"<name> <artist1, artist2>"`.
    pub fn get_youtube_search_query(track: &SpotifyTrack) -> String {
        format!("{} {}", track.name, track.artists.join(", "))
            .trim()
            .to_string()
    }

    /// Retrieves a valid access token, requesting a new one when the cached token is
    /// missing or about to expire.
    async fn get_access_token(&self) -> SpotifyResult<String> {
        let mut token_lock = self.token.lock().await;

        if let Some(token) = &*token_lock {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
            debug!("Cached Spotify token expired, requesting a new one");
        }

        let auth = BASE64_STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret));
        let params = [("grant_type", "client_credentials")];

        let response = HTTP_CLIENT
            .post(format!("{}/api/token", self.accounts_url))
            .header(header::AUTHORIZATION, format!("Basic {}", auth))
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                MusicError::ExternalApiError(format!("Failed to request Spotify token: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Cannot read response".to_string());
            return Err(MusicError::ExternalApiError(format!(
                "Spotify API error: {} - {}",
                status, text
            )));
        }

        let token_response = response.json::<SpotifyToken>().await.map_err(|e| {
            MusicError::ExternalApiError(format!("Failed to parse Spotify token: {}", e))
        })?;

        let access_token = token_response.access_token.clone();
        *token_lock = Some(token_response);

        Ok(access_token)
    }

    /// Fetches the name and artists of a single Spotify track by its ID.
    pub async fn get_track(&self, track_id: &str) -> SpotifyResult<SpotifyTrack> {
        let token = self.get_access_token().await?;
        info!("Looking up Spotify track {}", track_id);

        let response = HTTP_CLIENT
            .get(format!("{}/v1/tracks/{}", self.api_url, track_id))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| {
                MusicError::ExternalApiError(format!("Failed to request Spotify track: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Cannot read response".to_string());
            return Err(MusicError::ExternalApiError(format!(
                "Spotify API error: {} - {}",
                status, text
            )));
        }

        let track = response.json::<TrackResponse>().await.map_err(|e| {
            MusicError::ExternalApiError(format!("Failed to parse Spotify track data: {}", e))
        })?;

        Ok(SpotifyTrack {
            name: track.name,
            artists: track
                .artists
                .into_iter()
                .filter_map(|artist| artist.name)
                .filter(|name| !name.is_empty())
                .collect(),
        })
    }
}
