use super::{fail, success};
use crate::db::models::VoicemasterChannelRow;
use crate::{db, Context};
use serenity::all::{
    ChannelId, ChannelType, CreateChannel, EditChannel, EditMember, Member, Mentionable,
    PermissionOverwrite, PermissionOverwriteType, Permissions, RoleId, UserId,
};

type Error = crate::error::Error;

/// The temporary voice channel the author currently owns or occupies.
async fn author_channel(ctx: &Context<'_>) -> Result<Option<VoicemasterChannelRow>, Error> {
    let channel_id = ctx.guild().and_then(|guild| {
        guild
            .voice_states
            .get(&ctx.author().id)
            .and_then(|vs| vs.channel_id)
    });

    match channel_id {
        Some(channel_id) => {
            Ok(db::voice::get_channel(&ctx.data().db, channel_id.get() as i64).await?)
        }
        None => Ok(None),
    }
}

/// The author's channel, only if they own it.
async fn owned_channel(ctx: &Context<'_>) -> Result<Option<VoicemasterChannelRow>, Error> {
    Ok(author_channel(ctx)
        .await?
        .filter(|row| row.owner_id == ctx.author().id.get() as i64))
}

/// VoiceMaster: join-to-create temporary voice channels.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "VoiceMaster",
    subcommands(
        "setup",
        "vm_disable",
        "vm_lock",
        "vm_unlock",
        "rename",
        "limit",
        "permit",
        "reject",
        "claim",
        "transfer"
    )
)]
pub async fn voicemaster(ctx: Context<'_>) -> Result<(), Error> {
    let configured = db::voice::get_guild_config(&ctx.data().db, ctx.guild_id().unwrap().get() as i64)
        .await?
        .is_some();

    let text = if configured {
        "VoiceMaster is set up. Join the generator channel to get your own \
         voice channel, then use `voicemaster lock/unlock/rename/limit/permit/reject`."
    } else {
        "VoiceMaster is not set up yet. An admin can run `voicemaster setup`."
    };
    success(ctx, text).await
}

/// Create the VoiceMaster category and join-to-create channel.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "VoiceMaster",
    required_permissions = "MANAGE_GUILD",
    required_bot_permissions = "MANAGE_CHANNELS"
)]
pub async fn setup(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap();

    let category = guild_id
        .create_channel(
            ctx.http(),
            CreateChannel::new("Voice Channels").kind(ChannelType::Category),
        )
        .await?;

    let generator = guild_id
        .create_channel(
            ctx.http(),
            CreateChannel::new("➕ Join to Create")
                .kind(ChannelType::Voice)
                .category(category.id),
        )
        .await?;

    db::voice::set_guild_config(
        &ctx.data().db,
        guild_id.get() as i64,
        category.id.get() as i64,
        generator.id.get() as i64,
    )
    .await?;

    success(
        ctx,
        format!(
            "VoiceMaster ready. Join {} to create a channel.",
            generator.mention()
        ),
    )
    .await
}

/// Tear down the VoiceMaster setup.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "disable",
    category = "VoiceMaster",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn vm_disable(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;

    let Some(config) = db::voice::get_guild_config(&ctx.data().db, guild_id).await? else {
        return fail(ctx, "VoiceMaster is not set up.").await;
    };

    let _ = ChannelId::new(config.generator_channel_id as u64)
        .delete(ctx.http())
        .await;
    let _ = ChannelId::new(config.category_id as u64)
        .delete(ctx.http())
        .await;

    db::voice::delete_guild_config(&ctx.data().db, guild_id).await?;
    success(ctx, "VoiceMaster disabled.").await
}

/// Lock your voice channel so nobody new can join.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "lock",
    category = "VoiceMaster"
)]
pub async fn vm_lock(ctx: Context<'_>) -> Result<(), Error> {
    let Some(row) = owned_channel(&ctx).await? else {
        return fail(ctx, "You don't own a temporary voice channel.").await;
    };

    let everyone = RoleId::new(ctx.guild_id().unwrap().get());
    ChannelId::new(row.channel_id as u64)
        .create_permission(
            ctx.http(),
            PermissionOverwrite {
                allow: Permissions::empty(),
                deny: Permissions::CONNECT,
                kind: PermissionOverwriteType::Role(everyone),
            },
        )
        .await?;

    success(ctx, "Your channel is locked.").await
}

/// Unlock your voice channel.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "unlock",
    category = "VoiceMaster"
)]
pub async fn vm_unlock(ctx: Context<'_>) -> Result<(), Error> {
    let Some(row) = owned_channel(&ctx).await? else {
        return fail(ctx, "You don't own a temporary voice channel.").await;
    };

    let everyone = RoleId::new(ctx.guild_id().unwrap().get());
    ChannelId::new(row.channel_id as u64)
        .create_permission(
            ctx.http(),
            PermissionOverwrite {
                allow: Permissions::CONNECT,
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Role(everyone),
            },
        )
        .await?;

    success(ctx, "Your channel is unlocked.").await
}

/// Rename your voice channel.
#[poise::command(slash_command, prefix_command, guild_only, category = "VoiceMaster")]
pub async fn rename(
    ctx: Context<'_>,
    #[description = "New channel name"]
    #[rest]
    name: String,
) -> Result<(), Error> {
    let Some(row) = owned_channel(&ctx).await? else {
        return fail(ctx, "You don't own a temporary voice channel.").await;
    };
    if name.is_empty() || name.len() > 100 {
        return fail(ctx, "Channel names must be 1-100 characters.").await;
    }

    ChannelId::new(row.channel_id as u64)
        .edit(ctx.http(), EditChannel::new().name(&name))
        .await?;

    success(ctx, format!("Channel renamed to **{name}**.")).await
}

/// Set a user limit on your voice channel (0 removes it).
#[poise::command(slash_command, prefix_command, guild_only, category = "VoiceMaster")]
pub async fn limit(
    ctx: Context<'_>,
    #[description = "Maximum members (0-99)"] limit: u32,
) -> Result<(), Error> {
    let Some(row) = owned_channel(&ctx).await? else {
        return fail(ctx, "You don't own a temporary voice channel.").await;
    };
    if limit > 99 {
        return fail(ctx, "The limit must be between 0 and 99.").await;
    }

    ChannelId::new(row.channel_id as u64)
        .edit(ctx.http(), EditChannel::new().user_limit(limit))
        .await?;

    if limit == 0 {
        success(ctx, "User limit removed.").await
    } else {
        success(ctx, format!("User limit set to **{limit}**.")).await
    }
}

/// Allow a member to join your locked channel.
#[poise::command(slash_command, prefix_command, guild_only, category = "VoiceMaster")]
pub async fn permit(
    ctx: Context<'_>,
    #[description = "Member to allow"] member: Member,
) -> Result<(), Error> {
    let Some(row) = owned_channel(&ctx).await? else {
        return fail(ctx, "You don't own a temporary voice channel.").await;
    };

    ChannelId::new(row.channel_id as u64)
        .create_permission(
            ctx.http(),
            PermissionOverwrite {
                allow: Permissions::CONNECT,
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Member(member.user.id),
            },
        )
        .await?;

    success(
        ctx,
        format!("**{}** can join your channel.", member.user.tag()),
    )
    .await
}

/// Block a member from your channel and disconnect them if inside.
#[poise::command(slash_command, prefix_command, guild_only, category = "VoiceMaster")]
pub async fn reject(
    ctx: Context<'_>,
    #[description = "Member to block"] member: Member,
) -> Result<(), Error> {
    let Some(row) = owned_channel(&ctx).await? else {
        return fail(ctx, "You don't own a temporary voice channel.").await;
    };
    if member.user.id == ctx.author().id {
        return fail(ctx, "You can't reject yourself.").await;
    }

    let channel_id = ChannelId::new(row.channel_id as u64);
    channel_id
        .create_permission(
            ctx.http(),
            PermissionOverwrite {
                allow: Permissions::empty(),
                deny: Permissions::CONNECT,
                kind: PermissionOverwriteType::Member(member.user.id),
            },
        )
        .await?;

    let inside = ctx.guild().is_some_and(|guild| {
        guild
            .voice_states
            .get(&member.user.id)
            .and_then(|vs| vs.channel_id)
            == Some(channel_id)
    });
    if inside {
        ctx.guild_id()
            .unwrap()
            .edit_member(
                ctx.http(),
                member.user.id,
                EditMember::new().disconnect_member(),
            )
            .await?;
    }

    success(
        ctx,
        format!("**{}** was rejected from your channel.", member.user.tag()),
    )
    .await
}

/// Claim an abandoned channel whose owner left.
#[poise::command(slash_command, prefix_command, guild_only, category = "VoiceMaster")]
pub async fn claim(ctx: Context<'_>) -> Result<(), Error> {
    let Some(row) = author_channel(&ctx).await? else {
        return fail(ctx, "You're not in a temporary voice channel.").await;
    };

    if row.owner_id == ctx.author().id.get() as i64 {
        return fail(ctx, "You already own this channel.").await;
    }

    let owner_inside = ctx.guild().is_some_and(|guild| {
        guild
            .voice_states
            .get(&UserId::new(row.owner_id as u64))
            .and_then(|vs| vs.channel_id)
            == Some(ChannelId::new(row.channel_id as u64))
    });
    if owner_inside {
        return fail(ctx, "The owner is still in the channel.").await;
    }

    db::voice::set_owner(
        &ctx.data().db,
        row.channel_id,
        ctx.author().id.get() as i64,
    )
    .await?;

    success(ctx, "You now own this channel.").await
}

/// Hand your channel to another member inside it.
#[poise::command(slash_command, prefix_command, guild_only, category = "VoiceMaster")]
pub async fn transfer(
    ctx: Context<'_>,
    #[description = "New owner"] member: Member,
) -> Result<(), Error> {
    let Some(row) = owned_channel(&ctx).await? else {
        return fail(ctx, "You don't own a temporary voice channel.").await;
    };

    let target_inside = ctx.guild().is_some_and(|guild| {
        guild
            .voice_states
            .get(&member.user.id)
            .and_then(|vs| vs.channel_id)
            == Some(ChannelId::new(row.channel_id as u64))
    });
    if !target_inside {
        return fail(
            ctx,
            format!("**{}** must be in your channel.", member.user.tag()),
        )
        .await;
    }

    db::voice::set_owner(&ctx.data().db, row.channel_id, member.user.id.get() as i64).await?;

    success(
        ctx,
        format!("**{}** now owns this channel.", member.user.tag()),
    )
    .await
}
