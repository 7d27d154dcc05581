use super::*;
use crate::commands::music::utils::embedded_messages;

/// View the current music queue
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn queue(ctx: Context<'_>) -> CommandResult {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.send(embedded_messages::not_in_guild()).await?;
        return Ok(());
    };

    let music = &ctx.data().music;
    let now_playing = music.now_playing(guild_id).await;
    let entries = music.list_queue(guild_id).await;

    ctx.send(embedded_messages::music_queue(now_playing.as_ref(), &entries))
        .await?;

    Ok(())
}
