use super::{fail, success};
use crate::utils::embeds;
use crate::{db, Context};
use serenity::all::{GuildChannel, Mentionable, User};

type Error = crate::error::Error;

/// Show or change this server's command prefix.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Settings",
    subcommands("prefix_set", "prefix_reset")
)]
pub async fn prefix(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let prefix = db::guilds::get_prefix(&ctx.data().db, guild_id)
        .await?
        .unwrap_or_else(|| ctx.data().config.default_prefix.clone());

    let embed = embeds::info_embed()
        .title("Command prefix")
        .description(format!("The prefix here is `{prefix}`"));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Set the command prefix for this server.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "set",
    category = "Settings",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn prefix_set(
    ctx: Context<'_>,
    #[description = "New prefix (up to 5 characters)"] prefix: String,
) -> Result<(), Error> {
    if prefix.is_empty() || prefix.len() > 5 || prefix.contains(char::is_whitespace) {
        return fail(ctx, "The prefix must be 1-5 characters with no spaces.").await;
    }

    let guild_id = ctx.guild_id().unwrap();
    db::guilds::set_prefix(&ctx.data().db, guild_id.get() as i64, &prefix).await?;
    ctx.data().cache.set_prefix(guild_id.get(), &prefix).await;

    success(ctx, format!("Prefix set to `{prefix}`")).await
}

/// Reset the prefix to the default.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "reset",
    category = "Settings",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn prefix_reset(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap();
    db::guilds::clear_prefix(&ctx.data().db, guild_id.get() as i64).await?;
    ctx.data().cache.delete_prefix(guild_id.get()).await;

    success(
        ctx,
        format!(
            "Prefix reset to `{}`",
            ctx.data().config.default_prefix
        ),
    )
    .await
}

/// Set or clear the moderation log channel.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Settings",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn modlog(
    ctx: Context<'_>,
    #[description = "Channel for moderation logs; omit to disable"] channel: Option<GuildChannel>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;

    match channel {
        Some(channel) => {
            db::guilds::set_mod_log_channel(&ctx.data().db, guild_id, Some(channel.id.get() as i64))
                .await?;
            success(
                ctx,
                format!("Moderation logs will be sent to {}", channel.mention()),
            )
            .await
        }
        None => {
            db::guilds::set_mod_log_channel(&ctx.data().db, guild_id, None).await?;
            success(ctx, "Moderation logs disabled.").await
        }
    }
}

/// Manage the bot-wide blacklist.
#[poise::command(
    slash_command,
    prefix_command,
    category = "Owner",
    owners_only,
    subcommands("blacklist_add", "blacklist_remove", "blacklist_list")
)]
pub async fn blacklist(ctx: Context<'_>) -> Result<(), Error> {
    fail(ctx, "Use `blacklist add`, `blacklist remove`, or `blacklist list`.").await
}

/// Block a user from using the bot anywhere.
#[poise::command(slash_command, prefix_command, rename = "add", category = "Owner", owners_only)]
pub async fn blacklist_add(
    ctx: Context<'_>,
    #[description = "User to block"] user: User,
    #[description = "Reason shown in the list"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    if user.id == ctx.author().id {
        return fail(ctx, "You can't blacklist yourself.").await;
    }
    if ctx.framework().options().owners.contains(&user.id) {
        return fail(ctx, "You can't blacklist a bot owner.").await;
    }

    db::blacklist::insert(
        &ctx.data().db,
        user.id.get() as i64,
        ctx.author().id.get() as i64,
        reason.as_deref(),
    )
    .await?;

    success(ctx, format!("**{}** added to the blacklist.", user.tag())).await
}

/// Unblock a user.
#[poise::command(slash_command, prefix_command, rename = "remove", category = "Owner", owners_only)]
pub async fn blacklist_remove(
    ctx: Context<'_>,
    #[description = "User to unblock"] user: User,
) -> Result<(), Error> {
    let removed = db::blacklist::delete(&ctx.data().db, user.id.get() as i64).await?;

    if removed > 0 {
        success(ctx, format!("**{}** removed from the blacklist.", user.tag())).await
    } else {
        fail(ctx, format!("**{}** was not blacklisted.", user.tag())).await
    }
}

/// List blacklisted users.
#[poise::command(slash_command, prefix_command, rename = "list", category = "Owner", owners_only)]
pub async fn blacklist_list(ctx: Context<'_>) -> Result<(), Error> {
    let entries = db::blacklist::list_recent(&ctx.data().db, 25).await?;

    if entries.is_empty() {
        return fail(ctx, "The blacklist is empty.").await;
    }

    let lines: Vec<String> = entries
        .iter()
        .map(|entry| {
            format!(
                "<@{}> — {} (by <@{}>, <t:{}:R>)",
                entry.user_id,
                entry.reason.as_deref().unwrap_or("no reason"),
                entry.moderator_id,
                entry.created_at.timestamp()
            )
        })
        .collect();

    let embed = embeds::info_embed()
        .title("Blacklisted users")
        .description(lines.join("\n"));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
