use super::{fail, success};
use crate::protection::antiraid::{AntiraidSettings, Penalty};
use crate::utils::embeds;
use crate::{db, Context};
use serenity::all::{GuildChannel, Mentionable, User};

type Error = crate::error::Error;

/// Only the guild owner or trusted users may configure the anti-raid.
async fn antiraid_trusted(ctx: Context<'_>) -> Result<bool, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(false);
    };
    if is_guild_owner(&ctx) {
        return Ok(true);
    }

    let settings = db::antiraid::load(&ctx.data().db, guild_id.get() as i64).await?;
    Ok(settings.is_some_and(|s| s.is_trusted(ctx.author().id.get())))
}

fn is_guild_owner(ctx: &Context<'_>) -> bool {
    ctx.guild()
        .map(|g| g.owner_id == ctx.author().id)
        .unwrap_or(false)
}

async fn load_settings(ctx: &Context<'_>) -> Result<AntiraidSettings, Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    Ok(db::antiraid::load(&ctx.data().db, guild_id)
        .await?
        .unwrap_or_default())
}

async fn save_settings(ctx: &Context<'_>, settings: &AntiraidSettings) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    db::antiraid::save(&ctx.data().db, guild_id, settings).await?;
    Ok(())
}

/// Anti-raid protection against join floods and throwaway accounts.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antiraid_trusted",
    subcommands(
        "enable",
        "disable",
        "status",
        "penalty",
        "massjoin",
        "accountage",
        "noavatar",
        "logchannel",
        "trusted"
    )
)]
pub async fn antiraid(ctx: Context<'_>) -> Result<(), Error> {
    status_inner(ctx).await
}

/// Turn the anti-raid system on.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antiraid_trusted"
)]
pub async fn enable(ctx: Context<'_>) -> Result<(), Error> {
    let mut settings = load_settings(&ctx).await?;
    settings.enabled = true;
    if settings.trusted.is_empty() {
        settings.trusted.push(ctx.author().id.get());
    }
    save_settings(&ctx, &settings).await?;

    success(
        ctx,
        "Anti-raid **enabled**. Configure gates with `antiraid massjoin`, \
         `antiraid accountage`, and `antiraid noavatar`.",
    )
    .await
}

/// Turn the anti-raid system off.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antiraid_trusted"
)]
pub async fn disable(ctx: Context<'_>) -> Result<(), Error> {
    let mut settings = load_settings(&ctx).await?;
    settings.enabled = false;
    save_settings(&ctx, &settings).await?;

    success(ctx, "Anti-raid **disabled**.").await
}

/// Show the current anti-raid configuration.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antiraid_trusted"
)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    status_inner(ctx).await
}

async fn status_inner(ctx: Context<'_>) -> Result<(), Error> {
    let settings = load_settings(&ctx).await?;

    let massjoin = if settings.massjoin_enabled {
        format!(
            "🟢 {} joins in {}s",
            settings.massjoin_threshold, settings.massjoin_window_secs
        )
    } else {
        "⚫ off".to_string()
    };
    let account_age = if settings.account_age_enabled {
        format!("🟢 minimum {} days", settings.min_account_age_days)
    } else {
        "⚫ off".to_string()
    };
    let no_avatar = if settings.no_avatar_enabled {
        "🟢 on".to_string()
    } else {
        "⚫ off".to_string()
    };

    let embed = embeds::protection_embed()
        .title("Anti-raid settings")
        .field(
            "System",
            if settings.enabled { "enabled" } else { "disabled" },
            true,
        )
        .field("Penalty", settings.penalty.name(), true)
        .field(
            "Log channel",
            settings
                .log_channel
                .map(|id| format!("<#{id}>"))
                .unwrap_or_else(|| "not set".into()),
            true,
        )
        .field("Mass join", massjoin, true)
        .field("Account age", account_age, true)
        .field("No avatar", no_avatar, true);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Set the penalty for raiders: ban, kick, or quarantine.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antiraid_trusted"
)]
pub async fn penalty(
    ctx: Context<'_>,
    #[description = "ban, kick, or quarantine"] penalty: String,
) -> Result<(), Error> {
    let Some(parsed) = Penalty::parse(&penalty) else {
        return fail(ctx, "Pick one of: `ban`, `kick`, `quarantine`.").await;
    };

    if parsed == Penalty::Quarantine {
        let guild_id = ctx.guild_id().unwrap().get() as i64;
        let quarantine_role = db::antinuke::load(&ctx.data().db, guild_id)
            .await?
            .and_then(|s| s.quarantine_role);
        if quarantine_role.is_none() {
            return fail(
                ctx,
                "Set a quarantine role first with `antinuke quarantinerole`.",
            )
            .await;
        }
    }

    let mut settings = load_settings(&ctx).await?;
    settings.penalty = parsed;
    save_settings(&ctx, &settings).await?;

    success(ctx, format!("Penalty set to **{}**.", parsed.name())).await
}

/// Configure mass-join detection.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antiraid_trusted"
)]
pub async fn massjoin(
    ctx: Context<'_>,
    #[description = "on or off"] state: String,
    #[description = "Joins that trigger raid mode (default 10)"] threshold: Option<u64>,
    #[description = "Window in seconds (default 10)"] window: Option<u64>,
) -> Result<(), Error> {
    let enabled = match state.trim().to_lowercase().as_str() {
        "on" => true,
        "off" => false,
        _ => return fail(ctx, "Say `on` or `off`.").await,
    };

    let mut settings = load_settings(&ctx).await?;
    settings.massjoin_enabled = enabled;
    if let Some(threshold) = threshold {
        settings.massjoin_threshold = threshold.max(2);
    }
    if let Some(window) = window {
        settings.massjoin_window_secs = window.clamp(2, 300);
    }
    save_settings(&ctx, &settings).await?;

    if enabled {
        success(
            ctx,
            format!(
                "Mass-join detection **enabled**: {} joins in {}s.",
                settings.massjoin_threshold, settings.massjoin_window_secs
            ),
        )
        .await
    } else {
        success(ctx, "Mass-join detection **disabled**.").await
    }
}

/// Require a minimum account age in days; 0 disables the gate.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antiraid_trusted"
)]
pub async fn accountage(
    ctx: Context<'_>,
    #[description = "Minimum age in days (0 to disable)"] days: i64,
) -> Result<(), Error> {
    let mut settings = load_settings(&ctx).await?;
    settings.account_age_enabled = days > 0;
    settings.min_account_age_days = days.max(0);
    save_settings(&ctx, &settings).await?;

    if days > 0 {
        success(
            ctx,
            format!("Accounts younger than **{days} day(s)** will be penalized."),
        )
        .await
    } else {
        success(ctx, "Account-age gate **disabled**.").await
    }
}

/// Penalize joiners without a profile avatar.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antiraid_trusted"
)]
pub async fn noavatar(
    ctx: Context<'_>,
    #[description = "on or off"] state: String,
) -> Result<(), Error> {
    let enabled = match state.trim().to_lowercase().as_str() {
        "on" => true,
        "off" => false,
        _ => return fail(ctx, "Say `on` or `off`.").await,
    };

    let mut settings = load_settings(&ctx).await?;
    settings.no_avatar_enabled = enabled;
    save_settings(&ctx, &settings).await?;

    if enabled {
        success(ctx, "No-avatar gate **enabled**.").await
    } else {
        success(ctx, "No-avatar gate **disabled**.").await
    }
}

/// Set or clear the channel for anti-raid logs.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antiraid_trusted"
)]
pub async fn logchannel(
    ctx: Context<'_>,
    #[description = "Log channel; omit to clear"] channel: Option<GuildChannel>,
) -> Result<(), Error> {
    let mut settings = load_settings(&ctx).await?;
    settings.log_channel = channel.as_ref().map(|c| c.id.get());
    save_settings(&ctx, &settings).await?;

    match channel {
        Some(channel) => success(ctx, format!("Logs will be sent to {}.", channel.mention())).await,
        None => success(ctx, "Log channel cleared.").await,
    }
}

/// Users allowed to configure the anti-raid.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Protection",
    check = "antiraid_trusted",
    subcommands("trusted_add", "trusted_remove")
)]
pub async fn trusted(ctx: Context<'_>) -> Result<(), Error> {
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
        .title("Anti-raid trusted users")
        .description(lines.join("\n"));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Grant a user access to these settings.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "add",
    category = "Protection",
    check = "antiraid_trusted"
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

    success(ctx, format!("**{}** can now configure the anti-raid.", user.tag())).await
}

/// Revoke a user's access to these settings.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "remove",
    category = "Protection",
    check = "antiraid_trusted"
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
