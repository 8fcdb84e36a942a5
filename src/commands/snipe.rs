use super::{fail, success};
use crate::utils::embeds;
use crate::Context;

type Error = crate::error::Error;

/// Show a recently deleted message in this channel.
#[poise::command(slash_command, prefix_command, guild_only, category = "Utility")]
pub async fn snipe(
    ctx: Context<'_>,
    #[description = "1 = most recent (up to 10)"] index: Option<usize>,
) -> Result<(), Error> {
    let index = index.unwrap_or(1).max(1);
    let deleted = ctx
        .data()
        .cache
        .deleted_messages(ctx.channel_id().get())
        .await;

    let Some(message) = deleted.get(index - 1) else {
        return fail(ctx, "Nothing to snipe here.").await;
    };

    let embed = embeds::info_embed()
        .title(format!("Deleted message by {}", message.author_name))
        .description(message.content.clone())
        .field(
            "Deleted",
            format!("<t:{}:R>", message.timestamp.timestamp()),
            true,
        )
        .footer(serenity::all::CreateEmbedFooter::new(format!(
            "{index}/{}",
            deleted.len()
        )));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show a recently edited message in this channel.
#[poise::command(slash_command, prefix_command, guild_only, category = "Utility")]
pub async fn editsnipe(
    ctx: Context<'_>,
    #[description = "1 = most recent (up to 10)"] index: Option<usize>,
) -> Result<(), Error> {
    let index = index.unwrap_or(1).max(1);
    let edited = ctx
        .data()
        .cache
        .edited_messages(ctx.channel_id().get())
        .await;

    let Some(message) = edited.get(index - 1) else {
        return fail(ctx, "No edits to snipe here.").await;
    };

    let embed = embeds::info_embed()
        .title(format!("Edited message by {}", message.author_name))
        .field("Before", message.before.clone(), false)
        .field("After", message.after.clone(), false)
        .field(
            "Edited",
            format!("[<t:{}:R>]({})", message.timestamp.timestamp(), message.jump_url),
            true,
        )
        .footer(serenity::all::CreateEmbedFooter::new(format!(
            "{index}/{}",
            edited.len()
        )));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// List the deleted messages currently remembered for this channel.
#[poise::command(slash_command, prefix_command, guild_only, category = "Utility")]
pub async fn snipelist(ctx: Context<'_>) -> Result<(), Error> {
    let deleted = ctx
        .data()
        .cache
        .deleted_messages(ctx.channel_id().get())
        .await;

    if deleted.is_empty() {
        return fail(ctx, "Nothing to snipe here.").await;
    }

    let lines: Vec<String> = deleted
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let content = crate::utils::text::truncate(&m.content, 80);
            format!("`{}` **{}**: {content}", i + 1, m.author_name)
        })
        .collect();

    let embed = embeds::info_embed()
        .title("Recently deleted messages")
        .description(lines.join("\n"));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Wipe the snipe buffers for this channel.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Utility",
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn clearsnipe(ctx: Context<'_>) -> Result<(), Error> {
    ctx.data()
        .cache
        .clear_snipes(ctx.channel_id().get())
        .await;
    success(ctx, "Snipe buffers cleared.").await
}
