use super::{fail, success};
use crate::utils::embeds;
use crate::{db, Context};
use serenity::all::Role;

type Error = crate::error::Error;

/// Roles assigned automatically to new members.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Roles",
    required_permissions = "MANAGE_ROLES",
    required_bot_permissions = "MANAGE_ROLES",
    subcommands("add", "remove", "clear", "list")
)]
pub async fn autorole(ctx: Context<'_>) -> Result<(), Error> {
    list_inner(ctx).await
}

/// Add a role to the auto-assign list.
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
    #[description = "Role to assign on join"] role: Role,
) -> Result<(), Error> {
    if role.managed {
        return fail(ctx, "That role is managed by an integration.").await;
    }
    if role.id.get() == ctx.guild_id().unwrap().get() {
        return fail(ctx, "That's the @everyone role.").await;
    }

    let added = db::autoroles::add(
        &ctx.data().db,
        ctx.guild_id().unwrap().get() as i64,
        role.id.get() as i64,
    )
    .await?;

    if added {
        success(ctx, format!("**{}** will be assigned on join.", role.name)).await
    } else {
        fail(ctx, format!("**{}** is already an auto-role.", role.name)).await
    }
}

/// Remove a role from the auto-assign list.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Roles",
    required_permissions = "MANAGE_ROLES"
)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Role to stop assigning"] role: Role,
) -> Result<(), Error> {
    let removed = db::autoroles::remove(
        &ctx.data().db,
        ctx.guild_id().unwrap().get() as i64,
        role.id.get() as i64,
    )
    .await?;

    if removed > 0 {
        success(ctx, format!("**{}** removed from auto-roles.", role.name)).await
    } else {
        fail(ctx, format!("**{}** is not an auto-role.", role.name)).await
    }
}

/// Remove every auto-role.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Roles",
    required_permissions = "MANAGE_ROLES"
)]
pub async fn clear(ctx: Context<'_>) -> Result<(), Error> {
    let removed =
        db::autoroles::clear(&ctx.data().db, ctx.guild_id().unwrap().get() as i64).await?;

    if removed > 0 {
        success(ctx, format!("Removed {removed} auto-role(s).")).await
    } else {
        fail(ctx, "No auto-roles configured.").await
    }
}

/// List the configured auto-roles.
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
    let roles =
        db::autoroles::list(&ctx.data().db, ctx.guild_id().unwrap().get() as i64).await?;

    if roles.is_empty() {
        return fail(ctx, "No auto-roles configured. Add one with `autorole add`.").await;
    }

    let mentions: Vec<String> = roles.iter().map(|id| format!("<@&{id}>")).collect();
    let embed = embeds::info_embed()
        .title("Auto-roles")
        .description(mentions.join("\n"));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
