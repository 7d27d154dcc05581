use super::*;
use crate::commands::music::utils::{embedded_messages, music_manager::MusicError};
use tracing::{error, info};

/// Skip the currently playing song
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.send(embedded_messages::not_in_guild()).await?;
        return Ok(());
    };
    info!("Received skip command in guild {}", guild_id);

    match ctx.data().music.skip(guild_id).await {
        Ok(track) => {
            ctx.send(embedded_messages::skipped(&track)).await?;
        }
        Err(MusicError::NothingPlaying) => {
            ctx.send(embedded_messages::nothing_playing()).await?;
        }
        Err(err) => {
            error!("Skip failed in guild {}: {}", guild_id, err);
            ctx.send(embedded_messages::playback_error(&err)).await?;
        }
    }

    Ok(())
}
