use crate::error::Error;
use crate::{db, Data};
use serenity::all::{
    ChannelId, ChannelType, Context, CreateChannel, GuildId, PermissionOverwrite,
    PermissionOverwriteType, Permissions, VoiceState,
};
use tracing::{info, warn};

/// VoiceMaster: joining the generator channel spawns a personal channel,
/// the last member leaving tears it down.
pub async fn voice_state_update(
    ctx: &Context,
    data: &Data,
    old: Option<&VoiceState>,
    new: &VoiceState,
) -> Result<(), Error> {
    if let (Some(guild_id), Some(channel_id)) = (new.guild_id, new.channel_id) {
        handle_join(ctx, data, guild_id, channel_id, new).await?;
    }

    if let Some(old) = old {
        if let (Some(guild_id), Some(channel_id)) = (old.guild_id, old.channel_id) {
            // ignore moves within the same channel
            if new.channel_id != Some(channel_id) {
                handle_leave(ctx, data, guild_id, channel_id).await?;
            }
        }
    }

    Ok(())
}

async fn handle_join(
    ctx: &Context,
    data: &Data,
    guild_id: GuildId,
    channel_id: ChannelId,
    state: &VoiceState,
) -> Result<(), Error> {
    let Some(config) = db::voice::get_guild_config(&data.db, guild_id.get() as i64).await? else {
        return Ok(());
    };
    if channel_id.get() as i64 != config.generator_channel_id {
        return Ok(());
    }

    let Some(member) = state.member.as_ref() else {
        return Ok(());
    };

    let owner_permissions = Permissions::CONNECT
        | Permissions::MANAGE_CHANNELS
        | Permissions::MANAGE_ROLES
        | Permissions::MUTE_MEMBERS
        | Permissions::DEAFEN_MEMBERS
        | Permissions::MOVE_MEMBERS;

    let builder = CreateChannel::new(format!("{}'s channel", member.display_name()))
        .kind(ChannelType::Voice)
        .category(ChannelId::new(config.category_id as u64))
        .permissions(vec![PermissionOverwrite {
            allow: owner_permissions,
            deny: Permissions::empty(),
            kind: PermissionOverwriteType::Member(member.user.id),
        }])
        .audit_log_reason("VoiceMaster: temporary channel");

    let channel = match guild_id.create_channel(&ctx.http, builder).await {
        Ok(channel) => channel,
        Err(e) => {
            warn!(error = %e, guild_id = guild_id.get(), "Failed to create temporary channel");
            return Ok(());
        }
    };

    if let Err(e) = guild_id
        .move_member(&ctx.http, member.user.id, channel.id)
        .await
    {
        warn!(error = %e, "Failed to move member into their channel");
    }

    db::voice::insert_channel(
        &data.db,
        channel.id.get() as i64,
        guild_id.get() as i64,
        member.user.id.get() as i64,
    )
    .await?;

    info!(
        guild_id = guild_id.get(),
        channel_id = channel.id.get(),
        owner_id = member.user.id.get(),
        "Created temporary voice channel"
    );

    Ok(())
}

async fn handle_leave(
    ctx: &Context,
    data: &Data,
    guild_id: GuildId,
    channel_id: ChannelId,
) -> Result<(), Error> {
    let Some(_record) = db::voice::get_channel(&data.db, channel_id.get() as i64).await? else {
        return Ok(());
    };

    let occupied = ctx
        .cache
        .guild(guild_id)
        .map(|guild| {
            guild
                .voice_states
                .values()
                .any(|vs| vs.channel_id == Some(channel_id))
        })
        .unwrap_or(false);

    if occupied {
        return Ok(());
    }

    if let Err(e) = channel_id.delete(&ctx.http).await {
        warn!(error = %e, channel_id = channel_id.get(), "Failed to delete empty temporary channel");
    }

    db::voice::delete_channel(&data.db, channel_id.get() as i64).await?;

    info!(
        guild_id = guild_id.get(),
        channel_id = channel_id.get(),
        "Removed empty temporary voice channel"
    );

    Ok(())
}
