use poise::CreateReply;

use crate::{Context, Error};

/// Set this channel as the log channel for voice activity
#[poise::command(slash_command, guild_only)]
pub async fn senkumonitor(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    // The gate is checked here rather than declared on the command so the
    // denial is our own ephemeral reply.
    let can_manage = ctx
        .author_member()
        .await
        .and_then(|member| member.permissions)
        .is_some_and(|perms| perms.manage_guild());

    if !can_manage {
        ctx.send(
            CreateReply::default()
                .content("You do not have permission to use this command.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    ctx.data()
        .dbs
        .voicelog
        .set_log_channel(guild_id, ctx.channel_id())
        .await?;

    ctx.send(
        CreateReply::default()
            .content("This channel has been set as the log channel for voice activity.")
            .ephemeral(true),
    )
    .await?;

    Ok(())
}
