use super::{fail, success};
use crate::db::models::TagRow;
use crate::utils::embeds;
use crate::{db, Context};
use serenity::all::{Member, UserId};

type Error = crate::error::Error;

const MAX_CONTENT_LEN: usize = 2_000;
const MAX_NAME_LEN: usize = 50;

/// Hot path: Redis first, then the database.
async fn resolve_tag(ctx: &Context<'_>, name: &str) -> Result<Option<TagRow>, Error> {
    let guild_id = ctx.guild_id().unwrap();

    if let Some(cached) = ctx.data().cache.get_tag(guild_id.get(), name).await {
        if let Ok(tag) = serde_json::from_str::<TagRow>(&cached) {
            return Ok(Some(tag));
        }
    }

    let tag = db::tags::find(&ctx.data().db, guild_id.get() as i64, name).await?;
    if let Some(tag) = &tag {
        if let Ok(payload) = serde_json::to_string(tag) {
            ctx.data()
                .cache
                .set_tag(guild_id.get(), &tag.name, &payload)
                .await;
        }
    }

    Ok(tag)
}

async fn invalidate(ctx: &Context<'_>, name: &str) {
    let guild_id = ctx.guild_id().unwrap();
    ctx.data().cache.invalidate_tag(guild_id.get(), name).await;
}

fn can_manage(ctx: &Context<'_>, tag: &TagRow) -> bool {
    if tag.owner_id == ctx.author().id.get() as i64 {
        return true;
    }
    ctx.guild()
        .and_then(|guild| {
            guild
                .members
                .get(&ctx.author().id)
                .map(|member| guild.member_permissions(member).manage_guild())
        })
        .unwrap_or(false)
}

/// Show a tag's content.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Tags",
    subcommands(
        "tag_show",
        "create",
        "edit",
        "delete",
        "info",
        "list",
        "search",
        "raw",
        "tag_claim",
        "tag_transfer"
    )
)]
pub async fn tag(
    ctx: Context<'_>,
    #[description = "Tag name"]
    #[rest]
    name: String,
) -> Result<(), Error> {
    show_tag(ctx, name).await
}

async fn show_tag(ctx: Context<'_>, name: String) -> Result<(), Error> {
    let Some(tag) = resolve_tag(&ctx, &name).await? else {
        return fail(ctx, format!("Tag `{}` not found.", name.to_lowercase())).await;
    };

    db::tags::bump_uses(&ctx.data().db, tag.guild_id, &tag.name).await?;
    invalidate(&ctx, &tag.name).await;

    ctx.say(tag.content).await?;
    Ok(())
}

/// Show a tag's content.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "show",
    category = "Tags"
)]
pub async fn tag_show(
    ctx: Context<'_>,
    #[description = "Tag name"]
    #[rest]
    name: String,
) -> Result<(), Error> {
    show_tag(ctx, name).await
}

/// Create a tag.
#[poise::command(slash_command, prefix_command, guild_only, category = "Tags")]
pub async fn create(
    ctx: Context<'_>,
    #[description = "Tag name"] name: String,
    #[description = "Tag content"]
    #[rest]
    content: String,
) -> Result<(), Error> {
    let name = name.to_lowercase();
    if name.len() > MAX_NAME_LEN || name.is_empty() {
        return fail(ctx, format!("Tag names must be 1-{MAX_NAME_LEN} characters.")).await;
    }
    if content.len() > MAX_CONTENT_LEN {
        return fail(
            ctx,
            format!("Tag content must be at most {MAX_CONTENT_LEN} characters."),
        )
        .await;
    }

    let created = db::tags::create(
        &ctx.data().db,
        ctx.guild_id().unwrap().get() as i64,
        &name,
        &content,
        ctx.author().id.get() as i64,
    )
    .await?;

    if created {
        success(ctx, format!("Tag `{name}` created.")).await
    } else {
        fail(ctx, format!("Tag `{name}` already exists.")).await
    }
}

/// Change a tag's content.
#[poise::command(slash_command, prefix_command, guild_only, category = "Tags")]
pub async fn edit(
    ctx: Context<'_>,
    #[description = "Tag name"] name: String,
    #[description = "New content"]
    #[rest]
    content: String,
) -> Result<(), Error> {
    let Some(tag) = resolve_tag(&ctx, &name).await? else {
        return fail(ctx, format!("Tag `{}` not found.", name.to_lowercase())).await;
    };
    if !can_manage(&ctx, &tag) {
        return fail(ctx, "Only the tag owner or a server manager can edit it.").await;
    }
    if content.len() > MAX_CONTENT_LEN {
        return fail(
            ctx,
            format!("Tag content must be at most {MAX_CONTENT_LEN} characters."),
        )
        .await;
    }

    db::tags::update_content(&ctx.data().db, tag.guild_id, &tag.name, &content).await?;
    invalidate(&ctx, &tag.name).await;

    success(ctx, format!("Tag `{}` updated.", tag.name)).await
}

/// Delete a tag.
#[poise::command(slash_command, prefix_command, guild_only, category = "Tags")]
pub async fn delete(
    ctx: Context<'_>,
    #[description = "Tag name"]
    #[rest]
    name: String,
) -> Result<(), Error> {
    let Some(tag) = resolve_tag(&ctx, &name).await? else {
        return fail(ctx, format!("Tag `{}` not found.", name.to_lowercase())).await;
    };
    if !can_manage(&ctx, &tag) {
        return fail(ctx, "Only the tag owner or a server manager can delete it.").await;
    }

    db::tags::delete(&ctx.data().db, tag.guild_id, &tag.name).await?;
    invalidate(&ctx, &tag.name).await;

    success(ctx, format!("Tag `{}` deleted.", tag.name)).await
}

/// Show a tag's metadata.
#[poise::command(slash_command, prefix_command, guild_only, category = "Tags")]
pub async fn info(
    ctx: Context<'_>,
    #[description = "Tag name"]
    #[rest]
    name: String,
) -> Result<(), Error> {
    let Some(tag) = resolve_tag(&ctx, &name).await? else {
        return fail(ctx, format!("Tag `{}` not found.", name.to_lowercase())).await;
    };

    let embed = embeds::info_embed()
        .title(format!("Tag: {}", tag.name))
        .field("Owner", format!("<@{}>", tag.owner_id), true)
        .field("Uses", tag.uses.to_string(), true)
        .field(
            "Created",
            format!("<t:{}:R>", tag.created_at.timestamp()),
            true,
        );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// List tags, optionally only one member's.
#[poise::command(slash_command, prefix_command, guild_only, category = "Tags")]
pub async fn list(
    ctx: Context<'_>,
    #[description = "Only this member's tags"] member: Option<Member>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let owner_id = member.as_ref().map(|m| m.user.id.get() as i64);
    let tags = db::tags::list(&ctx.data().db, guild_id, owner_id).await?;

    if tags.is_empty() {
        return fail(ctx, "No tags here yet. Create one with `tag create`.").await;
    }

    let names: Vec<String> = tags.iter().take(50).map(|t| format!("`{}`", t.name)).collect();
    let title = match member {
        Some(member) => format!("Tags by {} ({})", member.user.tag(), tags.len()),
        None => format!("Tags ({})", tags.len()),
    };

    let embed = embeds::info_embed()
        .title(title)
        .description(names.join(", "));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Search tags by name.
#[poise::command(slash_command, prefix_command, guild_only, category = "Tags")]
pub async fn search(
    ctx: Context<'_>,
    #[description = "Part of a tag name"]
    #[rest]
    query: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let tags = db::tags::search(&ctx.data().db, guild_id, &query, 25).await?;

    if tags.is_empty() {
        return fail(ctx, format!("No tags matching `{query}`.")).await;
    }

    let names: Vec<String> = tags.iter().map(|t| format!("`{}`", t.name)).collect();
    let embed = embeds::info_embed()
        .title(format!("Tags matching `{query}`"))
        .description(names.join(", "));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show a tag's content with markdown escaped.
#[poise::command(slash_command, prefix_command, guild_only, category = "Tags")]
pub async fn raw(
    ctx: Context<'_>,
    #[description = "Tag name"]
    #[rest]
    name: String,
) -> Result<(), Error> {
    let Some(tag) = resolve_tag(&ctx, &name).await? else {
        return fail(ctx, format!("Tag `{}` not found.", name.to_lowercase())).await;
    };

    ctx.say(format!("```\n{}\n```", tag.content.replace("```", "`\u{200b}``")))
        .await?;
    Ok(())
}

/// Claim a tag whose owner left the server.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "claim",
    category = "Tags"
)]
pub async fn tag_claim(
    ctx: Context<'_>,
    #[description = "Tag name"]
    #[rest]
    name: String,
) -> Result<(), Error> {
    let Some(tag) = resolve_tag(&ctx, &name).await? else {
        return fail(ctx, format!("Tag `{}` not found.", name.to_lowercase())).await;
    };

    let owner_present = ctx
        .guild_id()
        .unwrap()
        .member(ctx, UserId::new(tag.owner_id as u64))
        .await
        .is_ok();
    if owner_present {
        return fail(ctx, "The tag owner is still in the server.").await;
    }

    db::tags::set_owner(
        &ctx.data().db,
        tag.guild_id,
        &tag.name,
        ctx.author().id.get() as i64,
    )
    .await?;
    invalidate(&ctx, &tag.name).await;

    success(ctx, format!("Tag `{}` is now yours.", tag.name)).await
}

/// Give a tag to another member.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "transfer",
    category = "Tags"
)]
pub async fn tag_transfer(
    ctx: Context<'_>,
    #[description = "Tag name"] name: String,
    #[description = "New owner"] member: Member,
) -> Result<(), Error> {
    let Some(tag) = resolve_tag(&ctx, &name).await? else {
        return fail(ctx, format!("Tag `{}` not found.", name.to_lowercase())).await;
    };
    if !can_manage(&ctx, &tag) {
        return fail(ctx, "Only the tag owner or a server manager can transfer it.").await;
    }
    if member.user.bot {
        return fail(ctx, "Tags can't be owned by bots.").await;
    }

    db::tags::set_owner(
        &ctx.data().db,
        tag.guild_id,
        &tag.name,
        member.user.id.get() as i64,
    )
    .await?;
    invalidate(&ctx, &tag.name).await;

    success(
        ctx,
        format!("Tag `{}` transferred to **{}**.", tag.name, member.user.tag()),
    )
    .await
}
