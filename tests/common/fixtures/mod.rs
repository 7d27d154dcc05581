//! Sample tracks and ids

use fake::Fake;
use fake::faker::lorem::en::Words;
use groovebox::commands::music::audio_sources::TrackMetadata;
use poise::serenity_prelude::{ChannelId, GuildId};
use std::time::Duration;

pub const GUILD: GuildId = GuildId::new(111);
pub const OTHER_GUILD: GuildId = GuildId::new(222);
pub const VOICE_CHANNEL: ChannelId = ChannelId::new(333);

/// Reference the resolver refuses to resolve
pub const UNRESOLVABLE: &str = "nothing matches this";

/// The track the static resolver hands out for `reference`
pub fn track(reference: &str) -> TrackMetadata {
    TrackMetadata {
        title: reference.to_string(),
        playable_url: playable_url(reference),
        external_id: None,
        page_url: None,
        duration: Some(Duration::from_secs(180)),
    }
}

pub fn playable_url(reference: &str) -> String {
    format!("https://media.example/{}", reference.replace(' ', "-"))
}

/// `count` distinct, human-looking titles
pub fn random_titles(count: usize) -> Vec<String> {
    (0..count)
        .map(|index| {
            let words: Vec<String> = Words(2..5).fake();
            format!("{} {}", words.join(" "), index)
        })
        .collect()
}
