pub mod leave;
pub mod play;
pub mod queue;
pub mod skip;

pub mod audio_sources;
pub mod utils;

use crate::{CommandResult, Context};
use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, GuildId, UserId};

/// Look up the voice channel a user is currently sitting in, if any.
pub(crate) fn user_voice_channel(
    ctx: &serenity::Context,
    guild_id: GuildId,
    user_id: UserId,
) -> Option<ChannelId> {
    let guild = ctx.cache.guild(guild_id)?;
    guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
}
