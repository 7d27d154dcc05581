use super::*;
use crate::commands::music::utils::{
    embedded_messages,
    music_manager::MusicError,
    playback_controller::PlayOutcome,
};
use tracing::{error, info};

/// Play a song from a search query, a direct URL or a Spotify track link
#[poise::command(slash_command, guild_only, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "Search terms, URL or Spotify track link"] query: String,
) -> CommandResult {
    info!("Received play command with query: {}", query);
    let Some(guild_id) = ctx.guild_id() else {
        ctx.send(embedded_messages::not_in_guild()).await?;
        return Ok(());
    };

    let user_channel = user_voice_channel(ctx.serenity_context(), guild_id, ctx.author().id);

    // Resolution can take a few seconds
    ctx.defer().await?;

    match ctx
        .data()
        .music
        .play(guild_id, user_channel, &query)
        .await
    {
        Ok(PlayOutcome::StartedNow(track)) => {
            ctx.send(embedded_messages::now_playing(&track)).await?;
        }
        Ok(PlayOutcome::Enqueued { track, position }) => {
            ctx.send(embedded_messages::queued(&track, position)).await?;
        }
        Err(MusicError::UserNotInVoiceChannel) => {
            ctx.send(embedded_messages::join_a_voice_channel()).await?;
        }
        Err(err) => {
            error!("Play failed in guild {}: {}", guild_id, err);
            ctx.send(embedded_messages::playback_error(&err)).await?;
        }
    }

    Ok(())
}
