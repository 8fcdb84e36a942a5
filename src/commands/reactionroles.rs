use super::{fail, success};
use crate::events::reaction::emoji_key;
use crate::utils::embeds;
use crate::{db, Context};
use serenity::all::{MessageId, ReactionType, Role};

type Error = crate::error::Error;

fn parse_emoji(input: &str) -> Option<ReactionType> {
    ReactionType::try_from(input.trim()).ok()
}

/// Bind emoji reactions to roles.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Roles",
    required_permissions = "MANAGE_ROLES",
    required_bot_permissions = "MANAGE_ROLES",
    subcommands("add", "remove", "list", "clear")
)]
pub async fn reactionrole(ctx: Context<'_>) -> Result<(), Error> {
    list_inner(ctx).await
}

/// Bind an emoji on a message to a role. Run this in the message's channel.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Roles",
    required_permissions = "MANAGE_ROLES",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Message ID in this channel"] message_id: u64,
    #[description = "Emoji to react with"] emoji: String,
    #[description = "Role to grant"] role: Role,
) -> Result<(), Error> {
    let Some(reaction) = parse_emoji(&emoji) else {
        return fail(ctx, format!("`{emoji}` is not a usable emoji.")).await;
    };

    let Ok(message) = ctx
        .channel_id()
        .message(ctx.http(), MessageId::new(message_id))
        .await
    else {
        return fail(
            ctx,
            "Message not found. Run this command in the channel that contains it.",
        )
        .await;
    };

    if role.managed {
        return fail(ctx, "That role is managed by an integration.").await;
    }

    let key = emoji_key(&reaction);
    if key.is_empty() {
        return fail(ctx, format!("`{emoji}` is not a usable emoji.")).await;
    }

    message.react(ctx.http(), reaction).await?;

    db::reaction_roles::add(
        &ctx.data().db,
        ctx.guild_id().unwrap().get() as i64,
        message_id as i64,
        &key,
        role.id.get() as i64,
    )
    .await?;

    success(
        ctx,
        format!("Reacting with {emoji} on that message now grants **{}**.", role.name),
    )
    .await
}

/// Remove a binding from a message.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Roles",
    required_permissions = "MANAGE_ROLES"
)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Message ID"] message_id: u64,
    #[description = "Bound emoji"] emoji: String,
) -> Result<(), Error> {
    let Some(reaction) = parse_emoji(&emoji) else {
        return fail(ctx, format!("`{emoji}` is not a usable emoji.")).await;
    };

    let removed = db::reaction_roles::remove(
        &ctx.data().db,
        message_id as i64,
        &emoji_key(&reaction),
    )
    .await?;

    if removed > 0 {
        success(ctx, "Reaction role removed.").await
    } else {
        fail(ctx, "No binding found for that message and emoji.").await
    }
}

/// List this server's reaction roles.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Roles",
    required_permissions = "MANAGE_ROLES"
)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    list_inner(ctx).await
}

async fn list_inner(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let bindings = db::reaction_roles::list(&ctx.data().db, guild_id).await?;

    if bindings.is_empty() {
        return fail(ctx, "No reaction roles configured. Add one with `reactionrole add`.").await;
    }

    let lines: Vec<String> = bindings
        .iter()
        .take(25)
        .map(|b| {
            let emoji = if b.emoji.chars().all(|c| c.is_ascii_digit()) {
                format!("<:_:{}>", b.emoji)
            } else {
                b.emoji.clone()
            };
            format!("message `{}` — {} → <@&{}>", b.message_id, emoji, b.role_id)
        })
        .collect();

    let embed = embeds::info_embed()
        .title(format!("Reaction roles ({})", bindings.len()))
        .description(lines.join("\n"));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Clear bindings for one message, or the whole server.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Roles",
    required_permissions = "MANAGE_ROLES"
)]
pub async fn clear(
    ctx: Context<'_>,
    #[description = "Message ID; omit to clear everything"] message_id: Option<u64>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let removed =
        db::reaction_roles::clear(&ctx.data().db, guild_id, message_id.map(|id| id as i64))
            .await?;

    if removed > 0 {
        success(ctx, format!("Removed {removed} reaction role(s).")).await
    } else {
        fail(ctx, "Nothing to clear.").await
    }
}
