use super::*;
use crate::commands::music::utils::{embedded_messages, music_manager::MusicError};
use tracing::{error, info};

/// Clear the queue and leave the voice channel
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn leave(ctx: Context<'_>) -> CommandResult {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.send(embedded_messages::not_in_guild()).await?;
        return Ok(());
    };
    info!("Received leave command in guild {}", guild_id);

    match ctx.data().music.leave(guild_id).await {
        Ok(()) => {
            ctx.send(embedded_messages::disconnected()).await?;
        }
        Err(MusicError::NotConnected) => {
            ctx.send(embedded_messages::not_connected()).await?;
        }
        Err(err) => {
            error!("Leave failed in guild {}: {}", guild_id, err);
            ctx.send(embedded_messages::playback_error(&err)).await?;
        }
    }

    Ok(())
}
