//! Environment-driven bot configuration.
//!
//! Values come from the process environment (optionally seeded from `.env` by `dotenv`).
//! Blank values are treated the same as missing ones.

use serenity::model::id::GuildId;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Default executable used to resolve tracks.
pub const DEFAULT_YTDLP_PATH: &str = "yt-dlp";

/// Errors raised while loading the configuration
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("DISCORD_TOKEN not set in your environment/.env")]
    MissingToken,

    #[error("GUILD_ID must be a numeric guild id, got {0:?}")]
    InvalidGuildId(String),
}

/// Client credentials for the Spotify Web API.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    /// Bot token used to log into the gateway.
    pub discord_token: String,
    /// When set, slash commands are synced to this guild only.
    pub guild_id: Option<GuildId>,
    /// Spotify support is enabled only when both halves of the credentials are present.
    pub spotify: Option<SpotifyCredentials>,
    /// Path to the `yt-dlp` executable.
    pub ytdlp_path: String,
    /// Optional cookies file handed to `yt-dlp`.
    pub ytdlp_cookies: Option<PathBuf>,
}

impl BotConfig {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let discord_token = get("DISCORD_TOKEN").ok_or(ConfigError::MissingToken)?;

        let guild_id = match get("GUILD_ID") {
            Some(raw) => {
                let id = raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|id| *id != 0)
                    .ok_or(ConfigError::InvalidGuildId(raw))?;
                Some(GuildId::new(id))
            }
            None => None,
        };

        let client_id = get("SPOTIFY_CLIENT_ID").or_else(|| get("SPOTIPY_CLIENT_ID"));
        let client_secret = get("SPOTIFY_CLIENT_SECRET").or_else(|| get("SPOTIPY_CLIENT_SECRET"));
        let spotify = match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        Ok(Self {
            discord_token,
            guild_id,
            spotify,
            ytdlp_path: get("YTDLP_PATH").unwrap_or_else(|| DEFAULT_YTDLP_PATH.to_string()),
            ytdlp_cookies: get("YTDLP_COOKIES").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = BotConfig::from_lookup(lookup_from(&[("DISCORD_TOKEN", "token")])).unwrap();

        assert_eq!(
            config,
            BotConfig {
                discord_token: "token".to_string(),
                guild_id: None,
                spotify: None,
                ytdlp_path: DEFAULT_YTDLP_PATH.to_string(),
                ytdlp_cookies: None,
            }
        );
    }

    #[test]
    fn test_missing_or_blank_token_is_rejected() {
        assert_eq!(
            BotConfig::from_lookup(lookup_from(&[])),
            Err(ConfigError::MissingToken)
        );
        assert_eq!(
            BotConfig::from_lookup(lookup_from(&[("DISCORD_TOKEN", "   ")])),
            Err(ConfigError::MissingToken)
        );
    }

    #[test]
    fn test_guild_id_is_parsed() {
        let config = BotConfig::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "token"),
            ("GUILD_ID", "123456789"),
        ]))
        .unwrap();

        assert_eq!(config.guild_id, Some(GuildId::new(123456789)));
    }

    #[test]
    fn test_invalid_guild_id_is_rejected() {
        let result = BotConfig::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "token"),
            ("GUILD_ID", "my-server"),
        ]));

        assert_eq!(
            result,
            Err(ConfigError::InvalidGuildId("my-server".to_string()))
        );
    }

    #[test]
    fn test_spotify_needs_both_credentials() {
        let config = BotConfig::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "token"),
            ("SPOTIFY_CLIENT_ID", "id"),
        ]))
        .unwrap();

        assert_eq!(config.spotify, None);
    }

    #[test]
    fn test_spotipy_variables_are_accepted() {
        let config = BotConfig::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "token"),
            ("SPOTIPY_CLIENT_ID", "legacy-id"),
            ("SPOTIFY_CLIENT_SECRET", "secret"),
            ("YTDLP_PATH", "/opt/bin/yt-dlp"),
            ("YTDLP_COOKIES", "cookies.txt"),
        ]))
        .unwrap();

        assert_eq!(
            config.spotify,
            Some(SpotifyCredentials {
                client_id: "legacy-id".to_string(),
                client_secret: "secret".to_string(),
            })
        );
        assert_eq!(config.ytdlp_path, "/opt/bin/yt-dlp");
        assert_eq!(config.ytdlp_cookies, Some(PathBuf::from("cookies.txt")));
    }
}
