use super::cases::record_case;
use super::{fail, success};
use crate::protection::quarantine as quarantine_ops;
use crate::utils::embeds;
use crate::utils::permissions::hierarchy_error;
use crate::utils::time::{format_duration, parse_duration};
use crate::{db, Context};
use chrono::{Duration as ChronoDuration, Utc};
use serenity::all::{
    CreateMessage, EditChannel, EditMember, GetMessages, GuildChannel, Member, Mentionable,
    PermissionOverwrite, PermissionOverwriteType, Permissions, RoleId, Timestamp, User,
};

type Error = crate::error::Error;

/// Discord's timeout ceiling (28 days).
const MAX_TIMEOUT_SECS: u64 = 2_419_200;

const NO_REASON: &str = "No reason given";

/// Best-effort DM to a sanctioned user; closed DMs are ignored.
async fn dm_sanction(ctx: &Context<'_>, user: &User, title: String, body: String) {
    let embed = embeds::error_embed(body)
        .title(title)
        .footer(serenity::all::CreateEmbedFooter::new(format!(
            "Moderator: {}",
            ctx.author().tag()
        )));
    let _ = user
        .dm(ctx.http(), CreateMessage::new().embed(embed))
        .await;
}

fn guild_name(ctx: &Context<'_>) -> String {
    ctx.guild()
        .map(|g| g.name.clone())
        .unwrap_or_else(|| "this server".to_string())
}

/// Kick a member from the server.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Moderation",
    required_permissions = "KICK_MEMBERS",
    required_bot_permissions = "KICK_MEMBERS"
)]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "Member to kick"] member: Member,
    #[description = "Reason"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    if let Some(msg) = hierarchy_error(&ctx, &member, "kick").await {
        return fail(ctx, msg).await;
    }

    let reason_text = reason.as_deref().unwrap_or(NO_REASON);
    dm_sanction(
        &ctx,
        &member.user,
        format!("You have been kicked from {}", guild_name(&ctx)),
        format!("**Reason:** {reason_text}"),
    )
    .await;

    ctx.guild_id()
        .unwrap()
        .kick_with_reason(
            ctx.http(),
            member.user.id,
            &format!("{}: {reason_text}", ctx.author().tag()),
        )
        .await?;

    let case_id = record_case(&ctx, &member.user, "kick", reason.as_deref(), None, None).await?;
    success(
        ctx,
        format!("`Case #{case_id}` **{}** has been kicked.", member.user.tag()),
    )
    .await
}

/// Ban a user, including users who are not in the server.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Moderation",
    required_permissions = "BAN_MEMBERS",
    required_bot_permissions = "BAN_MEMBERS"
)]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "User to ban"] user: User,
    #[description = "Reason"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap();
    let reason_text = reason.as_deref().unwrap_or(NO_REASON);

    // Hierarchy only applies when the target is actually a member
    if let Ok(member) = guild_id.member(ctx, user.id).await {
        if let Some(msg) = hierarchy_error(&ctx, &member, "ban").await {
            return fail(ctx, msg).await;
        }
        dm_sanction(
            &ctx,
            &user,
            format!("You have been banned from {}", guild_name(&ctx)),
            format!("**Reason:** {reason_text}"),
        )
        .await;
    }

    guild_id
        .ban_with_reason(
            ctx.http(),
            user.id,
            0,
            &format!("{}: {reason_text}", ctx.author().tag()),
        )
        .await?;

    let case_id = record_case(&ctx, &user, "ban", reason.as_deref(), None, None).await?;
    success(
        ctx,
        format!("`Case #{case_id}` **{}** has been banned.", user.tag()),
    )
    .await
}

/// Unban a user by ID or mention.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Moderation",
    required_permissions = "BAN_MEMBERS",
    required_bot_permissions = "BAN_MEMBERS"
)]
pub async fn unban(
    ctx: Context<'_>,
    #[description = "User to unban"] user: User,
    #[description = "Reason"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap();

    if guild_id.unban(ctx.http(), user.id).await.is_err() {
        return fail(ctx, format!("**{}** is not banned.", user.tag())).await;
    }

    let case_id = record_case(&ctx, &user, "unban", reason.as_deref(), None, None).await?;
    success(
        ctx,
        format!("`Case #{case_id}` **{}** has been unbanned.", user.tag()),
    )
    .await
}

/// Ban and immediately unban a member to purge their recent messages.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Moderation",
    required_permissions = "BAN_MEMBERS",
    required_bot_permissions = "BAN_MEMBERS"
)]
pub async fn softban(
    ctx: Context<'_>,
    #[description = "Member to softban"] member: Member,
    #[description = "Reason"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    if let Some(msg) = hierarchy_error(&ctx, &member, "softban").await {
        return fail(ctx, msg).await;
    }

    let guild_id = ctx.guild_id().unwrap();
    let reason_text = reason.as_deref().unwrap_or(NO_REASON);

    guild_id
        .ban_with_reason(
            ctx.http(),
            member.user.id,
            7,
            &format!("Softban by {}: {reason_text}", ctx.author().tag()),
        )
        .await?;
    guild_id
        .unban(ctx.http(), member.user.id)
        .await?;

    let case_id = record_case(&ctx, &member.user, "softban", reason.as_deref(), None, None).await?;
    success(
        ctx,
        format!(
            "`Case #{case_id}` **{}** has been softbanned.",
            member.user.tag()
        ),
    )
    .await
}

/// Time a member out for a duration (up to 28 days).
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    aliases("mute"),
    category = "Moderation",
    required_permissions = "MODERATE_MEMBERS",
    required_bot_permissions = "MODERATE_MEMBERS"
)]
pub async fn timeout(
    ctx: Context<'_>,
    #[description = "Member to time out"] member: Member,
    #[description = "Duration like 10m, 1h, 1d"] duration: String,
    #[description = "Reason"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    if let Some(msg) = hierarchy_error(&ctx, &member, "time out").await {
        return fail(ctx, msg).await;
    }

    let Some(secs) = parse_duration(&duration) else {
        return fail(ctx, Error::InvalidDuration(duration).user_message()).await;
    };
    if secs > MAX_TIMEOUT_SECS {
        return fail(ctx, "The maximum timeout is 28 days.").await;
    }

    let until = Utc::now() + ChronoDuration::seconds(secs as i64);
    let timestamp = Timestamp::from_unix_timestamp(until.timestamp())
        .map_err(|_| Error::InvalidDuration(duration.clone()))?;

    let reason_text = reason.as_deref().unwrap_or(NO_REASON);
    ctx.guild_id()
        .unwrap()
        .edit_member(
            ctx.http(),
            member.user.id,
            EditMember::new()
                .disable_communication_until_datetime(timestamp)
                .audit_log_reason(&format!("{}: {reason_text}", ctx.author().tag())),
        )
        .await?;

    let case_id = record_case(
        &ctx,
        &member.user,
        "timeout",
        reason.as_deref(),
        Some(secs as i64),
        Some(until),
    )
    .await?;

    dm_sanction(
        &ctx,
        &member.user,
        format!("You have been timed out in {}", guild_name(&ctx)),
        format!(
            "**Duration:** {}\n**Reason:** {reason_text}",
            format_duration(secs)
        ),
    )
    .await;

    success(
        ctx,
        format!(
            "`Case #{case_id}` **{}** timed out for {}.",
            member.user.tag(),
            format_duration(secs)
        ),
    )
    .await
}

/// Remove a member's timeout.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    aliases("unmute"),
    category = "Moderation",
    required_permissions = "MODERATE_MEMBERS",
    required_bot_permissions = "MODERATE_MEMBERS"
)]
pub async fn untimeout(
    ctx: Context<'_>,
    #[description = "Member to release"] member: Member,
    #[description = "Reason"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    let timed_out = member
        .communication_disabled_until
        .is_some_and(|until| until.unix_timestamp() > Utc::now().timestamp());
    if !timed_out {
        return fail(ctx, format!("**{}** is not timed out.", member.user.tag())).await;
    }

    ctx.guild_id()
        .unwrap()
        .edit_member(
            ctx.http(),
            member.user.id,
            EditMember::new().enable_communication(),
        )
        .await?;

    let case_id =
        record_case(&ctx, &member.user, "untimeout", reason.as_deref(), None, None).await?;
    success(
        ctx,
        format!(
            "`Case #{case_id}` **{}** is no longer timed out.",
            member.user.tag()
        ),
    )
    .await
}

/// Warn a member.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Moderation",
    required_permissions = "KICK_MEMBERS"
)]
pub async fn warn(
    ctx: Context<'_>,
    #[description = "Member to warn"] member: Member,
    #[description = "Reason"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    if let Some(msg) = hierarchy_error(&ctx, &member, "warn").await {
        return fail(ctx, msg).await;
    }

    let reason_text = reason.as_deref().unwrap_or(NO_REASON);
    let case_id = record_case(&ctx, &member.user, "warn", reason.as_deref(), None, None).await?;

    dm_sanction(
        &ctx,
        &member.user,
        format!("You have been warned in {}", guild_name(&ctx)),
        format!("**Reason:** {reason_text}"),
    )
    .await;

    success(
        ctx,
        format!("`Case #{case_id}` **{}** has been warned.", member.user.tag()),
    )
    .await
}

/// List a member's warnings.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Moderation",
    required_permissions = "KICK_MEMBERS",
    subcommands("warns_list", "warns_remove", "warns_clear")
)]
pub async fn warns(
    ctx: Context<'_>,
    #[description = "Member whose warnings to list"] member: Member,
) -> Result<(), Error> {
    list_warns(ctx, member).await
}

/// List a member's warnings.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "list",
    category = "Moderation",
    required_permissions = "KICK_MEMBERS"
)]
pub async fn warns_list(
    ctx: Context<'_>,
    #[description = "Member whose warnings to list"] member: Member,
) -> Result<(), Error> {
    list_warns(ctx, member).await
}

async fn list_warns(ctx: Context<'_>, member: Member) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let warns = db::cases::list_for_target(
        &ctx.data().db,
        guild_id,
        member.user.id.get() as i64,
        Some("warn"),
    )
    .await?;

    if warns.is_empty() {
        return fail(ctx, format!("**{}** has no warnings.", member.user.tag())).await;
    }

    let lines: Vec<String> = warns
        .iter()
        .take(15)
        .map(|case| {
            format!(
                "`#{}` {} — <t:{}:R>",
                case.case_id,
                case.reason.as_deref().unwrap_or("no reason"),
                case.created_at.timestamp()
            )
        })
        .collect();

    let embed = embeds::warning_embed(lines.join("\n")).title(format!(
        "Warnings for {} ({})",
        member.user.tag(),
        warns.len()
    ));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Remove one warning by case number.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "remove",
    category = "Moderation",
    required_permissions = "KICK_MEMBERS"
)]
pub async fn warns_remove(
    ctx: Context<'_>,
    #[description = "Case number of the warning"] case_id: i64,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;

    match db::cases::get(&ctx.data().db, guild_id, case_id).await? {
        Some(case) if case.kind == "warn" => {
            db::cases::delete(&ctx.data().db, guild_id, case_id).await?;
            success(ctx, format!("Warning `#{case_id}` removed.")).await
        }
        Some(_) => fail(ctx, format!("Case #{case_id} is not a warning.")).await,
        None => fail(ctx, format!("Case #{case_id} not found.")).await,
    }
}

/// Clear all warnings for a member.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "clear",
    category = "Moderation",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn warns_clear(
    ctx: Context<'_>,
    #[description = "Member whose warnings to clear"] member: Member,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let removed = db::cases::clear_for_target(
        &ctx.data().db,
        guild_id,
        member.user.id.get() as i64,
        Some("warn"),
    )
    .await?;

    if removed > 0 {
        success(
            ctx,
            format!(
                "Cleared {removed} warning(s) for **{}**.",
                member.user.tag()
            ),
        )
        .await
    } else {
        fail(ctx, format!("**{}** has no warnings.", member.user.tag())).await
    }
}

/// Bulk delete recent messages in this channel.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    aliases("clear"),
    category = "Moderation",
    required_permissions = "MANAGE_MESSAGES",
    required_bot_permissions = "MANAGE_MESSAGES"
)]
pub async fn purge(
    ctx: Context<'_>,
    #[description = "How many messages (1-100)"] amount: u32,
) -> Result<(), Error> {
    let amount = amount.clamp(1, 100) as u8;

    let messages = ctx
        .channel_id()
        .messages(ctx.http(), GetMessages::new().limit(amount))
        .await?;

    let ids: Vec<_> = messages.iter().map(|m| m.id).collect();
    let deleted = ids.len();

    match deleted {
        0 => {}
        1 => {
            ctx.channel_id()
                .delete_message(ctx.http(), ids[0])
                .await?;
        }
        _ => {
            ctx.channel_id()
                .delete_messages(ctx.http(), ids)
                .await?;
        }
    }

    let reply = poise::CreateReply::default()
        .embed(embeds::success_embed(format!(
            "✅ Deleted {deleted} message(s)."
        )))
        .ephemeral(true);
    ctx.send(reply).await?;
    Ok(())
}

/// Set this channel's slowmode; `off` or 0 disables it.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Moderation",
    required_permissions = "MANAGE_CHANNELS",
    required_bot_permissions = "MANAGE_CHANNELS"
)]
pub async fn slowmode(
    ctx: Context<'_>,
    #[description = "Duration like 5s, 2m, or off"] duration: Option<String>,
) -> Result<(), Error> {
    let input = duration.unwrap_or_else(|| "off".to_string());

    let secs = if input.eq_ignore_ascii_case("off") || input == "0" {
        0
    } else {
        match parse_duration(&input) {
            Some(secs) if secs <= 21_600 => secs,
            Some(_) => return fail(ctx, "Slowmode can be at most 6 hours.").await,
            None => return fail(ctx, Error::InvalidDuration(input).user_message()).await,
        }
    };

    ctx.channel_id()
        .edit(
            ctx.http(),
            EditChannel::new().rate_limit_per_user(secs as u16),
        )
        .await?;

    if secs == 0 {
        success(ctx, "Slowmode disabled.").await
    } else {
        success(ctx, format!("Slowmode set to {}.", format_duration(secs))).await
    }
}

async fn set_channel_locked(
    ctx: &Context<'_>,
    channel: Option<GuildChannel>,
    locked: bool,
) -> Result<String, Error> {
    let channel_id = channel
        .as_ref()
        .map(|c| c.id)
        .unwrap_or_else(|| ctx.channel_id());
    // @everyone role ID equals the guild ID
    let everyone = RoleId::new(ctx.guild_id().unwrap().get());

    let overwrite = PermissionOverwrite {
        allow: if locked {
            Permissions::empty()
        } else {
            Permissions::SEND_MESSAGES
        },
        deny: if locked {
            Permissions::SEND_MESSAGES
        } else {
            Permissions::empty()
        },
        kind: PermissionOverwriteType::Role(everyone),
    };

    channel_id.create_permission(ctx.http(), overwrite).await?;
    Ok(channel_id.mention().to_string())
}

/// Prevent @everyone from sending messages in a channel.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Moderation",
    required_permissions = "MANAGE_CHANNELS",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn lock(
    ctx: Context<'_>,
    #[description = "Channel to lock (defaults to this one)"] channel: Option<GuildChannel>,
) -> Result<(), Error> {
    let mention = set_channel_locked(&ctx, channel, true).await?;
    success(ctx, format!("{mention} locked.")).await
}

/// Allow @everyone to send messages again.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Moderation",
    required_permissions = "MANAGE_CHANNELS",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn unlock(
    ctx: Context<'_>,
    #[description = "Channel to unlock (defaults to this one)"] channel: Option<GuildChannel>,
) -> Result<(), Error> {
    let mention = set_channel_locked(&ctx, channel, false).await?;
    success(ctx, format!("{mention} unlocked.")).await
}

/// Strip a member's roles and confine them to the quarantine role.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    aliases("jail"),
    category = "Moderation",
    required_permissions = "KICK_MEMBERS",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn quarantine(
    ctx: Context<'_>,
    #[description = "Member to quarantine"] member: Member,
    #[description = "Reason"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    if let Some(msg) = hierarchy_error(&ctx, &member, "quarantine").await {
        return fail(ctx, msg).await;
    }

    let guild_id = ctx.guild_id().unwrap().get() as i64;

    let quarantine_role = db::antinuke::load(&ctx.data().db, guild_id)
        .await?
        .and_then(|settings| settings.quarantine_role);
    let Some(role_id) = quarantine_role else {
        return fail(
            ctx,
            "No quarantine role configured. Set one with `antinuke quarantinerole`.",
        )
        .await;
    };

    if db::quarantine::get(&ctx.data().db, guild_id, member.user.id.get() as i64)
        .await?
        .is_some()
    {
        return fail(
            ctx,
            format!("**{}** is already quarantined.", member.user.tag()),
        )
        .await;
    }

    quarantine_ops::apply(
        ctx.serenity_context(),
        &ctx.data().db,
        &member,
        RoleId::new(role_id),
        ctx.author().id,
        reason.as_deref(),
        "moderation",
    )
    .await?;

    let case_id =
        record_case(&ctx, &member.user, "quarantine", reason.as_deref(), None, None).await?;
    success(
        ctx,
        format!(
            "`Case #{case_id}` **{}** has been quarantined.",
            member.user.tag()
        ),
    )
    .await
}

/// Lift a quarantine and restore the member's previous roles.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    aliases("unjail"),
    category = "Moderation",
    required_permissions = "KICK_MEMBERS",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn unquarantine(
    ctx: Context<'_>,
    #[description = "Member to release"] member: Member,
    #[description = "Reason"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;

    let quarantine_role = db::antinuke::load(&ctx.data().db, guild_id)
        .await?
        .and_then(|settings| settings.quarantine_role)
        .map(RoleId::new);

    let lifted = quarantine_ops::lift(
        ctx.serenity_context(),
        &ctx.data().db,
        &member,
        quarantine_role,
    )
    .await?;

    if !lifted {
        return fail(
            ctx,
            format!("**{}** is not quarantined.", member.user.tag()),
        )
        .await;
    }

    let case_id =
        record_case(&ctx, &member.user, "unquarantine", reason.as_deref(), None, None).await?;
    success(
        ctx,
        format!(
            "`Case #{case_id}` **{}** has been released from quarantine.",
            member.user.tag()
        ),
    )
    .await
}
