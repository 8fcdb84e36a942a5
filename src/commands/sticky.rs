use super::{fail, success};
use crate::utils::embeds;
use crate::{db, Context};
use serenity::all::MessageId;

type Error = crate::error::Error;

const MAX_CONTENT_LEN: usize = 1_500;

/// Keep a message pinned to the bottom of a channel.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Utility",
    required_permissions = "MANAGE_MESSAGES",
    subcommands("set", "remove", "view", "list")
)]
pub async fn sticky(ctx: Context<'_>) -> Result<(), Error> {
    view_inner(ctx).await
}

/// Set this channel's sticky message.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Utility",
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn set(
    ctx: Context<'_>,
    #[description = "Text to keep at the bottom"]
    #[rest]
    text: String,
) -> Result<(), Error> {
    if text.is_empty() || text.len() > MAX_CONTENT_LEN {
        return fail(
            ctx,
            format!("Sticky messages must be 1-{MAX_CONTENT_LEN} characters."),
        )
        .await;
    }

    db::stickies::upsert(
        &ctx.data().db,
        ctx.channel_id().get() as i64,
        ctx.guild_id().unwrap().get() as i64,
        &text,
        ctx.author().id.get() as i64,
    )
    .await?;

    // Post it right away so the channel shows it before the next message
    let posted = ctx
        .channel_id()
        .say(ctx.http(), format!("__**Sticky**__\n{text}"))
        .await?;
    db::stickies::set_last_message(
        &ctx.data().db,
        ctx.channel_id().get() as i64,
        posted.id.get() as i64,
    )
    .await?;

    success(ctx, "Sticky message set.").await
}

/// Remove this channel's sticky message.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Utility",
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn remove(ctx: Context<'_>) -> Result<(), Error> {
    let channel_id = ctx.channel_id().get() as i64;

    let Some(sticky) = db::stickies::get(&ctx.data().db, channel_id).await? else {
        return fail(ctx, "This channel has no sticky message.").await;
    };

    if let Some(last_id) = sticky.last_message_id {
        let _ = ctx
            .channel_id()
            .delete_message(ctx.http(), MessageId::new(last_id as u64))
            .await;
    }

    db::stickies::delete(&ctx.data().db, channel_id).await?;
    success(ctx, "Sticky message removed.").await
}

/// Show this channel's sticky message.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Utility",
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn view(ctx: Context<'_>) -> Result<(), Error> {
    view_inner(ctx).await
}

async fn view_inner(ctx: Context<'_>) -> Result<(), Error> {
    let Some(sticky) = db::stickies::get(&ctx.data().db, ctx.channel_id().get() as i64).await?
    else {
        return fail(ctx, "This channel has no sticky message. Set one with `sticky set`.").await;
    };

    let embed = embeds::info_embed()
        .title("Sticky message")
        .description(sticky.content)
        .field("Set by", format!("<@{}>", sticky.created_by), true);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// List every sticky message in this server.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Utility",
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let stickies =
        db::stickies::list(&ctx.data().db, ctx.guild_id().unwrap().get() as i64).await?;

    if stickies.is_empty() {
        return fail(ctx, "No sticky messages in this server.").await;
    }

    let lines: Vec<String> = stickies
        .iter()
        .map(|s| {
            format!(
                "<#{}> — {}",
                s.channel_id,
                crate::utils::text::truncate(&s.content, 60)
            )
        })
        .collect();

    let embed = embeds::info_embed()
        .title("Sticky messages")
        .description(lines.join("\n"));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
