use super::{fail, success};
use crate::protection::antinuke::{AntinukeSettings, MonitoredAction, Punishment};
use crate::utils::embeds;
use crate::{db, Context};
use serenity::all::{GuildChannel, Mentionable, Role, User};

type Error = crate::error::Error;

/// Only the guild owner or configured trusted users may touch the anti-nuke
/// configuration.
async fn antinuke_trusted(ctx: Context<'_>) -> Result<bool, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(false);
    };
    if is_guild_owner(&ctx) {
        return Ok(true);
    }

    let settings = db::antinuke::load(&ctx.data().db, guild_id.get() as i64).await?;
    Ok(settings.is_some_and(|s| s.is_trusted(ctx.author().id.get())))
}

fn is_guild_owner(ctx: &Context<'_>) -> bool {
    ctx.guild()
        .map(|g| g.owner_id == ctx.author().id)
        .unwrap_or(false)
}

async fn load_settings(ctx: &Context<'_>) -> Result<AntinukeSettings, Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    Ok(db::antinuke::load(&ctx.data().db, guild_id)
        .await?
        .unwrap_or_default())
}

async fn save_settings(ctx: &Context<'_>, settings: &AntinukeSettings) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    db::antinuke::save(&ctx.data().db, guild_id, settings).await?;
    Ok(())
}

fn parse_toggle(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "on" | "enable" | "enabled" => Some(true),
        "off" | "disable" | "disabled" => Some(false),
        _ => None,
    }
}

/// Anti-nuke protection against mass administrative abuse.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antinuke_trusted",
    subcommands(
        "enable",
        "disable",
        "status",
        "punishment",
        "revert",
        "toggle",
        "all",
        "logchannel",
        "alertrole",
        "quarantinerole",
        "whitelist",
        "trusted"
    )
)]
pub async fn antinuke(ctx: Context<'_>) -> Result<(), Error> {
    status_inner(ctx).await
}

/// Turn the anti-nuke system on. Owner only.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antinuke_trusted"
)]
pub async fn enable(ctx: Context<'_>) -> Result<(), Error> {
    if !is_guild_owner(&ctx) {
        return fail(ctx, "Only the server owner can enable the anti-nuke system.").await;
    }

    let mut settings = load_settings(&ctx).await?;
    settings.enabled = true;
    if settings.trusted.is_empty() {
        settings.trusted.push(ctx.author().id.get());
    }
    save_settings(&ctx, &settings).await?;

    success(
        ctx,
        "Anti-nuke **enabled**. Configure protections with `antinuke toggle`.",
    )
    .await
}

/// Turn the anti-nuke system off. Owner only.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antinuke_trusted"
)]
pub async fn disable(ctx: Context<'_>) -> Result<(), Error> {
    if !is_guild_owner(&ctx) {
        return fail(ctx, "Only the server owner can disable the anti-nuke system.").await;
    }

    let mut settings = load_settings(&ctx).await?;
    settings.enabled = false;
    save_settings(&ctx, &settings).await?;

    success(ctx, "Anti-nuke **disabled**.").await
}

/// Show the current anti-nuke configuration.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antinuke_trusted"
)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    status_inner(ctx).await
}

async fn status_inner(ctx: Context<'_>) -> Result<(), Error> {
    let settings = load_settings(&ctx).await?;

    let action_lines: Vec<String> = MonitoredAction::ALL
        .into_iter()
        .map(|action| {
            let config = settings.action(action);
            format!(
                "{} `{}` — limit {}",
                if config.enabled { "🟢" } else { "⚫" },
                action.key(),
                config.limit
            )
        })
        .collect();

    let embed = embeds::protection_embed()
        .title("Anti-nuke settings")
        .field(
            "System",
            if settings.enabled { "enabled" } else { "disabled" },
            true,
        )
        .field("Punishment", settings.punishment.name(), true)
        .field("Revert actions", if settings.revert { "on" } else { "off" }, true)
        .field(
            "Log channel",
            settings
                .log_channel
                .map(|id| format!("<#{id}>"))
                .unwrap_or_else(|| "not set".into()),
            true,
        )
        .field(
            "Alert role",
            settings
                .alert_role
                .map(|id| format!("<@&{id}>"))
                .unwrap_or_else(|| "not set".into()),
            true,
        )
        .field(
            "Quarantine role",
            settings
                .quarantine_role
                .map(|id| format!("<@&{id}>"))
                .unwrap_or_else(|| "not set".into()),
            true,
        )
        .field("Protections", action_lines.join("\n"), false);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Set the punishment for offenders: ban, kick, strip, or quarantine.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antinuke_trusted"
)]
pub async fn punishment(
    ctx: Context<'_>,
    #[description = "ban, kick, strip, or quarantine"] punishment: String,
) -> Result<(), Error> {
    let Some(parsed) = Punishment::parse(&punishment) else {
        return fail(ctx, "Pick one of: `ban`, `kick`, `strip`, `quarantine`.").await;
    };

    let mut settings = load_settings(&ctx).await?;
    if parsed == Punishment::Quarantine && settings.quarantine_role.is_none() {
        return fail(
            ctx,
            "Set a quarantine role first with `antinuke quarantinerole`.",
        )
        .await;
    }
    settings.punishment = parsed;
    save_settings(&ctx, &settings).await?;

    success(ctx, format!("Punishment set to **{}**.", parsed.name())).await
}

/// Toggle automatic reversal of malicious channels/roles/webhooks.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antinuke_trusted"
)]
pub async fn revert(ctx: Context<'_>) -> Result<(), Error> {
    let mut settings = load_settings(&ctx).await?;
    settings.revert = !settings.revert;
    save_settings(&ctx, &settings).await?;

    if settings.revert {
        success(ctx, "Malicious channels, roles, and webhooks will be deleted.").await
    } else {
        success(ctx, "Action reversal **disabled**.").await
    }
}

/// Enable or disable one protection, optionally with a new limit.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antinuke_trusted"
)]
pub async fn toggle(
    ctx: Context<'_>,
    #[description = "Protection key, e.g. ban_members"] action: String,
    #[description = "on or off"] state: String,
    #[description = "Actions allowed per 30s window"] limit: Option<u64>,
) -> Result<(), Error> {
    let Some(action) = MonitoredAction::parse(&action) else {
        let keys: Vec<&str> = MonitoredAction::ALL.iter().map(|a| a.key()).collect();
        return fail(ctx, format!("Unknown protection. Options: {}", keys.join(", "))).await;
    };
    let Some(enabled) = parse_toggle(&state) else {
        return fail(ctx, "Say `on` or `off`.").await;
    };

    let mut settings = load_settings(&ctx).await?;
    settings.set_action(action, enabled, limit);
    save_settings(&ctx, &settings).await?;

    let config = settings.action(action);
    if enabled {
        success(
            ctx,
            format!(
                "Protection against {} **enabled** (limit: {}).",
                action.describe(),
                config.limit
            ),
        )
        .await
    } else {
        success(
            ctx,
            format!("Protection against {} **disabled**.", action.describe()),
        )
        .await
    }
}

/// Enable or disable every protection at once.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antinuke_trusted"
)]
pub async fn all(
    ctx: Context<'_>,
    #[description = "on or off"] state: String,
    #[description = "Limit applied to every protection"] limit: Option<u64>,
) -> Result<(), Error> {
    let Some(enabled) = parse_toggle(&state) else {
        return fail(ctx, "Say `on` or `off`.").await;
    };

    let mut settings = load_settings(&ctx).await?;
    for action in MonitoredAction::ALL {
        settings.set_action(action, enabled, limit);
    }
    save_settings(&ctx, &settings).await?;

    if enabled {
        success(ctx, "All protections **enabled**.").await
    } else {
        success(ctx, "All protections **disabled**.").await
    }
}

/// Set or clear the channel for anti-nuke alerts.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antinuke_trusted"
)]
pub async fn logchannel(
    ctx: Context<'_>,
    #[description = "Alert channel; omit to clear"] channel: Option<GuildChannel>,
) -> Result<(), Error> {
    let mut settings = load_settings(&ctx).await?;
    settings.log_channel = channel.as_ref().map(|c| c.id.get());
    save_settings(&ctx, &settings).await?;

    match channel {
        Some(channel) => {
            success(ctx, format!("Alerts will be sent to {}.", channel.mention())).await
        }
        None => success(ctx, "Alert channel cleared.").await,
    }
}

/// Set or clear the role pinged on alerts.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antinuke_trusted"
)]
pub async fn alertrole(
    ctx: Context<'_>,
    #[description = "Role to ping; omit to clear"] role: Option<Role>,
) -> Result<(), Error> {
    let mut settings = load_settings(&ctx).await?;
    settings.alert_role = role.as_ref().map(|r| r.id.get());
    save_settings(&ctx, &settings).await?;

    match role {
        Some(role) => success(ctx, format!("**{}** will be pinged on alerts.", role.name)).await,
        None => success(ctx, "Alert role cleared.").await,
    }
}

/// Set or clear the quarantine role used by punishments.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antinuke_trusted"
)]
pub async fn quarantinerole(
    ctx: Context<'_>,
    #[description = "Quarantine role; omit to clear"] role: Option<Role>,
) -> Result<(), Error> {
    let mut settings = load_settings(&ctx).await?;
    settings.quarantine_role = role.as_ref().map(|r| r.id.get());
    save_settings(&ctx, &settings).await?;

    match role {
        Some(role) => {
            success(
                ctx,
                format!("**{}** set as the quarantine role.", role.name),
            )
            .await
        }
        None => success(ctx, "Quarantine role cleared.").await,
    }
}

/// Users the anti-nuke never punishes.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antinuke_trusted",
    subcommands("whitelist_add", "whitelist_remove", "whitelist_list")
)]
pub async fn whitelist(ctx: Context<'_>) -> Result<(), Error> {
    whitelist_list_inner(ctx).await
}

/// Exempt a user from anti-nuke punishments.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "add",
    category = "Protection",
    check = "antinuke_trusted"
)]
pub async fn whitelist_add(
    ctx: Context<'_>,
    #[description = "User to exempt"] user: User,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let added = db::antinuke::whitelist_add(
        &ctx.data().db,
        guild_id,
        user.id.get() as i64,
        ctx.author().id.get() as i64,
    )
    .await?;

    if added {
        success(ctx, format!("**{}** added to the whitelist.", user.tag())).await
    } else {
        fail(ctx, format!("**{}** is already whitelisted.", user.tag())).await
    }
}

/// Remove a user from the whitelist.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "remove",
    category = "Protection",
    check = "antinuke_trusted"
)]
pub async fn whitelist_remove(
    ctx: Context<'_>,
    #[description = "User to remove"] user: User,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let removed =
        db::antinuke::whitelist_remove(&ctx.data().db, guild_id, user.id.get() as i64).await?;

    if removed {
        success(ctx, format!("**{}** removed from the whitelist.", user.tag())).await
    } else {
        fail(ctx, format!("**{}** was not whitelisted.", user.tag())).await
    }
}

/// List whitelisted users.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "list",
    category = "Protection",
    check = "antinuke_trusted"
)]
pub async fn whitelist_list(ctx: Context<'_>) -> Result<(), Error> {
    whitelist_list_inner(ctx).await
}

async fn whitelist_list_inner(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let entries = db::antinuke::whitelist_list(&ctx.data().db, guild_id).await?;

    if entries.is_empty() {
        return fail(ctx, "The whitelist is empty.").await;
    }

    let lines: Vec<String> = entries
        .iter()
        .map(|entry| format!("<@{}> (added by <@{}>)", entry.user_id, entry.added_by))
        .collect();

    let embed = embeds::protection_embed()
        .title("Anti-nuke whitelist")
        .description(lines.join("\n"));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Users allowed to configure the anti-nuke (still punishable).
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antinuke_trusted",
    subcommands("trusted_add", "trusted_remove", "trusted_list")
)]
pub async fn trusted(ctx: Context<'_>) -> Result<(), Error> {
    trusted_list_inner(ctx).await
}

/// Grant a user access to these settings.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "add",
    category = "Protection",
    check = "antinuke_trusted"
)]
pub async fn trusted_add(
    ctx: Context<'_>,
    #[description = "User to trust"] user: User,
) -> Result<(), Error> {
    let mut settings = load_settings(&ctx).await?;
    if settings.trusted.contains(&user.id.get()) {
        return fail(ctx, format!("**{}** is already trusted.", user.tag())).await;
    }
    settings.trusted.push(user.id.get());
    save_settings(&ctx, &settings).await?;

    success(ctx, format!("**{}** can now configure the anti-nuke.", user.tag())).await
}

/// Revoke a user's access to these settings.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "remove",
    category = "Protection",
    check = "antinuke_trusted"
)]
pub async fn trusted_remove(
    ctx: Context<'_>,
    #[description = "User to untrust"] user: User,
) -> Result<(), Error> {
    let mut settings = load_settings(&ctx).await?;
    let before = settings.trusted.len();
    settings.trusted.retain(|id| *id != user.id.get());

    if settings.trusted.len() == before {
        return fail(ctx, format!("**{}** was not trusted.", user.tag())).await;
    }
    save_settings(&ctx, &settings).await?;

    success(ctx, format!("**{}** is no longer trusted.", user.tag())).await
}

/// List trusted users.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "list",
    category = "Protection",
    check = "antinuke_trusted"
)]
pub async fn trusted_list(ctx: Context<'_>) -> Result<(), Error> {
    trusted_list_inner(ctx).await
}

async fn trusted_list_inner(ctx: Context<'_>) -> Result<(), Error> {
    let settings = load_settings(&ctx).await?;

    if settings.trusted.is_empty() {
        return fail(ctx, "No trusted users configured.").await;
    }

    let lines: Vec<String> = settings
        .trusted
        .iter()
        .map(|id| format!("<@{id}>"))
        .collect();

    let embed = embeds::protection_embed()
        .title("Anti-nuke trusted users")
        .description(lines.join("\n"));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
