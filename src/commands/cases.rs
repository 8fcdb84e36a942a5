use super::{fail, success};
use crate::db::models::CaseRow;
use crate::utils::embeds;
use crate::utils::time::format_duration;
use crate::{db, Context};
use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, CreateMessage, User};
use tracing::warn;

type Error = crate::error::Error;

/// Persist a moderation case and post it to the mod-log channel.
/// Returns the per-guild case number.
pub async fn record_case(
    ctx: &Context<'_>,
    target: &User,
    kind: &str,
    reason: Option<&str>,
    duration_secs: Option<i64>,
    expires_at: Option<DateTime<Utc>>,
) -> Result<i64, Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or_else(|| Error::Config("moderation cases require a guild".into()))?;

    let case_id = db::cases::create(
        &ctx.data().db,
        guild_id.get() as i64,
        ctx.author().id.get() as i64,
        target.id.get() as i64,
        kind,
        reason,
        duration_secs,
        expires_at,
    )
    .await?;

    send_mod_log(ctx, case_id, target, kind, reason, duration_secs).await;

    Ok(case_id)
}

async fn send_mod_log(
    ctx: &Context<'_>,
    case_id: i64,
    target: &User,
    kind: &str,
    reason: Option<&str>,
    duration_secs: Option<i64>,
) {
    let Some(guild_id) = ctx.guild_id() else { return };

    let channel_id =
        match db::guilds::get_mod_log_channel(&ctx.data().db, guild_id.get() as i64).await {
            Ok(Some(id)) => id,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Failed to load mod-log channel");
                return;
            }
        };

    let mut embed = embeds::moderation_embed()
        .title(format!("{} | Case #{case_id}", kind_title(kind)))
        .field(
            "User",
            format!("<@{}>\n`{}`", target.id.get(), target.id.get()),
            true,
        )
        .field("Moderator", format!("<@{}>", ctx.author().id.get()), true)
        .thumbnail(target.face());

    if let Some(secs) = duration_secs {
        embed = embed.field("Duration", format_duration(secs.max(0) as u64), true);
    }
    embed = embed.field("Reason", reason.unwrap_or("No reason given"), false);

    if let Err(e) = ChannelId::new(channel_id as u64)
        .send_message(ctx.http(), CreateMessage::new().embed(embed))
        .await
    {
        warn!(error = %e, "Failed to send mod-log entry");
    }
}

pub fn kind_title(kind: &str) -> String {
    let mut chars = kind.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn case_embed(case: &CaseRow) -> serenity::all::CreateEmbed {
    let mut embed = embeds::moderation_embed()
        .title(format!("{} | Case #{}", kind_title(&case.kind), case.case_id))
        .field(
            "User",
            format!("<@{}> (`{}`)", case.target_id, case.target_id),
            true,
        )
        .field("Moderator", format!("<@{}>", case.moderator_id), true)
        .field(
            "Created",
            format!("<t:{}:R>", case.created_at.timestamp()),
            true,
        )
        .field(
            "Reason",
            case.reason.as_deref().unwrap_or("No reason given"),
            false,
        );

    if let Some(secs) = case.duration_secs {
        embed = embed.field("Duration", format_duration(secs.max(0) as u64), true);
    }
    if let (Some(edited_by), Some(edited_at)) = (case.edited_by, case.edited_at) {
        embed = embed.field(
            "Edited",
            format!("by <@{edited_by}> <t:{}:R>", edited_at.timestamp()),
            false,
        );
    }

    embed
}

fn case_line(case: &CaseRow) -> String {
    format!(
        "`#{}` **{}** <@{}> — {} (<t:{}:R>)",
        case.case_id,
        kind_title(&case.kind),
        case.target_id,
        case.reason.as_deref().unwrap_or("no reason"),
        case.created_at.timestamp()
    )
}

/// View a moderation case.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Moderation",
    required_permissions = "KICK_MEMBERS",
    subcommands(
        "case_view",
        "case_edit",
        "case_delete",
        "case_list",
        "case_recent",
        "case_clear"
    )
)]
pub async fn case(
    ctx: Context<'_>,
    #[description = "Case number to view"] case_id: Option<i64>,
) -> Result<(), Error> {
    let Some(case_id) = case_id else {
        let embed = embeds::info_embed().title("Case system").description(
            "`case <number>` — view a case\n\
             `case edit <number> <reason>` — change the reason\n\
             `case delete <number>` — remove a case\n\
             `case list [user]` — cases against a user\n\
             `case recent [count]` — latest cases\n\
             `case clear <user> [kind]` — wipe a user's cases",
        );
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        return Ok(());
    };

    show_case(ctx, case_id).await
}

async fn show_case(ctx: Context<'_>, case_id: i64) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    match db::cases::get(&ctx.data().db, guild_id, case_id).await? {
        Some(case) => {
            ctx.send(poise::CreateReply::default().embed(case_embed(&case)))
                .await?;
            Ok(())
        }
        None => fail(ctx, format!("Case #{case_id} not found.")).await,
    }
}

/// View a moderation case.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "view",
    category = "Moderation",
    required_permissions = "KICK_MEMBERS"
)]
pub async fn case_view(
    ctx: Context<'_>,
    #[description = "Case number"] case_id: i64,
) -> Result<(), Error> {
    show_case(ctx, case_id).await
}

/// Change a case's reason.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "edit",
    category = "Moderation",
    required_permissions = "KICK_MEMBERS"
)]
pub async fn case_edit(
    ctx: Context<'_>,
    #[description = "Case number"] case_id: i64,
    #[description = "New reason"]
    #[rest]
    reason: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let updated = db::cases::edit_reason(
        &ctx.data().db,
        guild_id,
        case_id,
        &reason,
        ctx.author().id.get() as i64,
    )
    .await?;

    if updated > 0 {
        success(ctx, format!("Case #{case_id} updated.")).await
    } else {
        fail(ctx, format!("Case #{case_id} not found.")).await
    }
}

/// Delete a case.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "delete",
    category = "Moderation",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn case_delete(
    ctx: Context<'_>,
    #[description = "Case number"] case_id: i64,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let removed = db::cases::delete(&ctx.data().db, guild_id, case_id).await?;

    if removed > 0 {
        success(ctx, format!("Case #{case_id} deleted.")).await
    } else {
        fail(ctx, format!("Case #{case_id} not found.")).await
    }
}

/// List cases against a user.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "list",
    category = "Moderation",
    required_permissions = "KICK_MEMBERS"
)]
pub async fn case_list(
    ctx: Context<'_>,
    #[description = "User whose cases to list"] user: User,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let cases =
        db::cases::list_for_target(&ctx.data().db, guild_id, user.id.get() as i64, None).await?;

    if cases.is_empty() {
        return fail(ctx, format!("**{}** has no cases.", user.tag())).await;
    }

    let lines: Vec<String> = cases.iter().take(15).map(case_line).collect();
    let embed = embeds::info_embed()
        .title(format!("Cases for {} ({})", user.tag(), cases.len()))
        .description(lines.join("\n"));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show the latest cases in this server.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "recent",
    category = "Moderation",
    required_permissions = "KICK_MEMBERS"
)]
pub async fn case_recent(
    ctx: Context<'_>,
    #[description = "How many (default 10)"] count: Option<i64>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let count = count.unwrap_or(10).clamp(1, 25);
    let cases = db::cases::list_recent(&ctx.data().db, guild_id, count).await?;

    if cases.is_empty() {
        return fail(ctx, "No cases recorded yet.").await;
    }

    let lines: Vec<String> = cases.iter().map(case_line).collect();
    let embed = embeds::info_embed()
        .title("Recent cases")
        .description(lines.join("\n"));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Wipe a user's cases, optionally only one kind.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "clear",
    category = "Moderation",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn case_clear(
    ctx: Context<'_>,
    #[description = "User whose cases to clear"] user: User,
    #[description = "Only this kind, e.g. warn"] kind: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let removed = db::cases::clear_for_target(
        &ctx.data().db,
        guild_id,
        user.id.get() as i64,
        kind.as_deref(),
    )
    .await?;

    if removed > 0 {
        success(
            ctx,
            format!("Cleared {removed} case(s) for **{}**.", user.tag()),
        )
        .await
    } else {
        fail(ctx, format!("**{}** has no matching cases.", user.tag())).await
    }
}

/// Summary of a user's moderation history.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Moderation",
    required_permissions = "KICK_MEMBERS"
)]
pub async fn history(
    ctx: Context<'_>,
    #[description = "User to summarize"] user: User,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let counts = db::cases::counts_by_kind(&ctx.data().db, guild_id, user.id.get() as i64).await?;

    if counts.is_empty() {
        return fail(ctx, format!("**{}** has a clean history.", user.tag())).await;
    }

    let total: i64 = counts.iter().map(|(_, n)| n).sum();
    let lines: Vec<String> = counts
        .iter()
        .map(|(kind, n)| format!("**{}**: {n}", kind_title(kind)))
        .collect();

    let embed = embeds::info_embed()
        .title(format!("History for {}", user.tag()))
        .description(lines.join("\n"))
        .field("Total cases", total.to_string(), true)
        .thumbnail(user.face());
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_title_capitalizes() {
        assert_eq!(kind_title("warn"), "Warn");
        assert_eq!(kind_title("softban"), "Softban");
        assert_eq!(kind_title(""), "");
    }
}
