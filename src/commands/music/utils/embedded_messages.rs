use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::{CreateEmbed, Timestamp};
use std::time::Duration;

use crate::commands::music::audio_sources::TrackMetadata;

use super::{format_duration, music_manager::MusicError, queue_manager::QueueEntry};

const INFO_COLOUR: u32 = 0x5865f2;
const ERROR_COLOUR: u32 = 0xff0000;

fn info_embed(title: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title(title)
        .color(INFO_COLOUR)
        .timestamp(Timestamp::now())
}

fn error_embed(title: &str, description: impl Into<String>) -> CreateEmbed {
    CreateEmbed::new()
        .title(title)
        .description(description)
        .color(ERROR_COLOUR)
        .timestamp(Timestamp::now())
}

/// Title as a link to its page when we know one
fn linked_title(metadata: &TrackMetadata) -> String {
    match &metadata.page_url {
        Some(url) => format!("[{}]({})", metadata.title, url),
        None => format!("**{}**", metadata.title),
    }
}

fn duration_field(duration: Option<Duration>) -> String {
    duration
        .map(format_duration)
        .unwrap_or_else(|| "Unknown duration".to_string())
}

/// Create an embed for a track that started playing right away
pub fn now_playing(metadata: &TrackMetadata) -> CreateReply {
    let mut embed = info_embed("🎵 Now Playing")
        .description(linked_title(metadata))
        .field(
            "Duration",
            format!("`{}`", duration_field(metadata.duration)),
            true,
        );

    if let Some(thumbnail) = metadata.thumbnail() {
        embed = embed.thumbnail(thumbnail);
    }

    CreateReply::default().embed(embed)
}

/// Create an embed for a track that was added behind the current one
pub fn queued(metadata: &TrackMetadata, position: usize) -> CreateReply {
    CreateReply::default().embed(
        info_embed("🎵 Queued")
            .description(linked_title(metadata))
            .field(
                "Duration",
                format!("`{}`", duration_field(metadata.duration)),
                true,
            )
            .field("Position", format!("`#{}`", position), true),
    )
}

/// Create an embed for when a track could not be resolved, joined or started
pub fn playback_error(err: &MusicError) -> CreateReply {
    CreateReply::default()
        .embed(error_embed("❌ Playback Error", err.to_string()))
        .ephemeral(true)
}

/// Create an embed for when the user has to be in voice first
pub fn join_a_voice_channel() -> CreateReply {
    CreateReply::default()
        .embed(error_embed(
            "❌ Join a Voice Channel",
            "You need to be in a voice channel to play music.",
        ))
        .ephemeral(true)
}

/// Create an embed for commands that only work inside a server
pub fn not_in_guild() -> CreateReply {
    CreateReply::default()
        .embed(error_embed(
            "❌ Error",
            "This command can only be used in a server.",
        ))
        .ephemeral(true)
}

/// Create an embed for when a track is skipped
pub fn skipped(metadata: &TrackMetadata) -> CreateReply {
    CreateReply::default()
        .embed(info_embed("⏭️ Skipped").description(format!("Skipped {}", linked_title(metadata))))
}

/// Create an embed for when there is no track to skip
pub fn nothing_playing() -> CreateReply {
    CreateReply::default()
        .embed(error_embed("❌ Error", "Nothing is playing right now."))
        .ephemeral(true)
}

/// Create an embed for when the bot is not connected to a voice channel
pub fn not_connected() -> CreateReply {
    CreateReply::default()
        .embed(error_embed(
            "❌ Error",
            "I'm not connected to a voice channel.",
        ))
        .ephemeral(true)
}

/// Create an embed for when the bot leaves a voice channel
pub fn disconnected() -> CreateReply {
    CreateReply::default().embed(
        info_embed("👋 Disconnected").description("Cleared the queue and left the channel."),
    )
}

/// Create an embed for the music queue
pub fn music_queue(now_playing: Option<&TrackMetadata>, entries: &[QueueEntry]) -> CreateReply {
    CreateReply::default()
        .embed(info_embed("🎵 Music Queue").description(queue_description(now_playing, entries)))
}

/// Render the now-playing line and the pending list
pub fn queue_description(now_playing: Option<&TrackMetadata>, entries: &[QueueEntry]) -> String {
    let mut description = String::new();

    if let Some(metadata) = now_playing {
        description.push_str(&format!("**Now Playing:** {}\n\n", linked_title(metadata)));
    }

    if entries.is_empty() {
        description.push_str("The queue is empty.");
        return description;
    }

    for entry in entries {
        description.push_str(&format!("**{}.** {}", entry.position, entry.title));
        if let Some(duration) = entry.duration {
            description.push_str(&format!(" `{}`", format_duration(duration)));
        }
        description.push('\n');
    }

    let total: Duration = entries.iter().filter_map(|entry| entry.duration).sum();
    if total.as_secs() > 0 {
        description.push_str(&format!(
            "\n**⏱️ Total Duration:** `{}`",
            format_duration(total)
        ));
    }

    description
}
