use crate::db;
use crate::error::Error;
use crate::utils::embeds;
use crate::Data;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serenity::all::{
    ChannelId, Context as SerenityContext, CreateMessage, GuildId, Member, Mentionable, RoleId,
    UserId,
};
use tracing::{info, warn};

/// How long raid mode stays active after a mass join is detected.
const RAID_MODE_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Penalty {
    Ban,
    #[default]
    Kick,
    Quarantine,
}

impl Penalty {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "ban" => Some(Penalty::Ban),
            "kick" => Some(Penalty::Kick),
            "quarantine" => Some(Penalty::Quarantine),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Penalty::Ban => "ban",
            Penalty::Kick => "kick",
            Penalty::Quarantine => "quarantine",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Penalty::Ban => "banned",
            Penalty::Kick => "kicked",
            Penalty::Quarantine => "quarantined",
        }
    }
}

fn default_massjoin_threshold() -> u64 {
    10
}

fn default_massjoin_window() -> u64 {
    10
}

fn default_min_account_age() -> i64 {
    7
}

/// Per-guild anti-raid document, JSONB-backed like the anti-nuke settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntiraidSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub penalty: Penalty,
    #[serde(default)]
    pub log_channel: Option<u64>,
    #[serde(default)]
    pub trusted: Vec<u64>,
    #[serde(default)]
    pub massjoin_enabled: bool,
    #[serde(default = "default_massjoin_threshold")]
    pub massjoin_threshold: u64,
    #[serde(default = "default_massjoin_window")]
    pub massjoin_window_secs: u64,
    #[serde(default)]
    pub account_age_enabled: bool,
    #[serde(default = "default_min_account_age")]
    pub min_account_age_days: i64,
    #[serde(default)]
    pub no_avatar_enabled: bool,
}

impl Default for AntiraidSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            penalty: Penalty::default(),
            log_channel: None,
            trusted: Vec::new(),
            massjoin_enabled: false,
            massjoin_threshold: default_massjoin_threshold(),
            massjoin_window_secs: default_massjoin_window(),
            account_age_enabled: false,
            min_account_age_days: default_min_account_age(),
            no_avatar_enabled: false,
        }
    }
}

impl AntiraidSettings {
    pub fn is_trusted(&self, user_id: u64) -> bool {
        self.trusted.contains(&user_id)
    }
}

/// Run every configured join gate against a new member.
pub async fn handle_member_join(
    ctx: &SerenityContext,
    data: &Data,
    member: &Member,
) -> Result<(), Error> {
    if member.user.bot {
        return Ok(());
    }

    let guild_id = member.guild_id;
    let Some(settings) = db::antiraid::load(&data.db, guild_id.get() as i64).await? else {
        return Ok(());
    };
    if !settings.enabled {
        return Ok(());
    }

    // Active raid mode: no questions asked
    if data.cache.in_raid_mode(guild_id.get()).await {
        execute_penalty(
            ctx,
            data,
            member,
            &settings,
            "Anti-raid: server is in raid mode",
            "server in raid mode after a mass join",
        )
        .await;
        return Ok(());
    }

    data.cache
        .record_join(guild_id.get(), member.user.id.get())
        .await;

    if settings.massjoin_enabled {
        let recent = data
            .cache
            .recent_joins(guild_id.get(), settings.massjoin_window_secs)
            .await;

        if recent.len() as u64 >= settings.massjoin_threshold {
            handle_raid(ctx, data, guild_id, &settings, &recent).await;
            return Ok(());
        }
    }

    if settings.account_age_enabled {
        let age_days = (Utc::now().timestamp() - member.user.created_at().unix_timestamp()) / 86_400;
        if age_days < settings.min_account_age_days {
            log_action(
                ctx,
                &settings,
                "New account blocked",
                &format!(
                    "{} — account created {age_days} days ago (minimum: {})",
                    member.user.tag(),
                    settings.min_account_age_days
                ),
                false,
                guild_id,
            )
            .await;

            execute_penalty(
                ctx,
                data,
                member,
                &settings,
                &format!("Anti-raid: account too new ({age_days} days)"),
                "account younger than the configured minimum age",
            )
            .await;
            return Ok(());
        }
    }

    if settings.no_avatar_enabled && member.user.avatar.is_none() {
        log_action(
            ctx,
            &settings,
            "No-avatar account blocked",
            &format!("{} — no profile avatar", member.user.tag()),
            false,
            guild_id,
        )
        .await;

        execute_penalty(
            ctx,
            data,
            member,
            &settings,
            "Anti-raid: user without an avatar",
            "account without a profile avatar",
        )
        .await;
    }

    Ok(())
}

/// Mass join detected: flip raid mode on, penalize everyone who joined in
/// the window, and clear the tracker.
async fn handle_raid(
    ctx: &SerenityContext,
    data: &Data,
    guild_id: GuildId,
    settings: &AntiraidSettings,
    recent: &[u64],
) {
    data.cache
        .set_raid_mode(guild_id.get(), RAID_MODE_SECS)
        .await;

    info!(
        guild_id = guild_id.get(),
        joins = recent.len(),
        window_secs = settings.massjoin_window_secs,
        "Raid detected, entering raid mode"
    );

    log_action(
        ctx,
        settings,
        "RAID DETECTED",
        &format!(
            "{} joins in {}s — raid mode active for {}s",
            recent.len(),
            settings.massjoin_window_secs,
            RAID_MODE_SECS
        ),
        true,
        guild_id,
    )
    .await;

    let reason = format!(
        "Anti-raid: mass join detected ({} joins in {}s)",
        recent.len(),
        settings.massjoin_window_secs
    );

    let mut handled = 0usize;
    for user_id in recent {
        let Ok(member) = guild_id.member(ctx, UserId::new(*user_id)).await else {
            continue;
        };
        if member.user.bot {
            continue;
        }
        if execute_penalty(ctx, data, &member, settings, &reason, "mass join raid").await {
            handled += 1;
        }
    }

    log_action(
        ctx,
        settings,
        "Raid mitigated",
        &format!("{handled} member(s) {}", settings.penalty.past_tense()),
        false,
        guild_id,
    )
    .await;

    data.cache.clear_joins(guild_id.get()).await;
}

/// Apply the configured penalty to one member. Returns true on success.
async fn execute_penalty(
    ctx: &SerenityContext,
    data: &Data,
    member: &Member,
    settings: &AntiraidSettings,
    reason: &str,
    detection: &str,
) -> bool {
    send_penalty_dm(ctx, member, settings.penalty, detection).await;

    let guild_id = member.guild_id;
    let result = match settings.penalty {
        Penalty::Ban => guild_id
            .ban_with_reason(&ctx.http, member.user.id, 0, reason)
            .await
            .map_err(Error::from),
        Penalty::Kick => guild_id
            .kick_with_reason(&ctx.http, member.user.id, reason)
            .await
            .map_err(Error::from),
        Penalty::Quarantine => {
            // The quarantine role is shared with the anti-nuke settings
            let quarantine_role = db::antinuke::load(&data.db, guild_id.get() as i64)
                .await
                .ok()
                .flatten()
                .and_then(|s| s.quarantine_role);

            match quarantine_role {
                Some(role_id) => {
                    let bot_user_id = ctx.cache.current_user().id;
                    super::quarantine::apply(
                        ctx,
                        &data.db,
                        member,
                        RoleId::new(role_id),
                        bot_user_id,
                        Some(reason),
                        "antiraid",
                    )
                    .await
                }
                None => guild_id
                    .kick_with_reason(
                        &ctx.http,
                        member.user.id,
                        &format!("{reason} (no quarantine role configured)"),
                    )
                    .await
                    .map_err(Error::from),
            }
        }
    };

    match result {
        Ok(()) => {
            info!(
                guild_id = guild_id.get(),
                user_id = member.user.id.get(),
                penalty = settings.penalty.name(),
                "Anti-raid penalty applied"
            );
            true
        }
        Err(e) => {
            warn!(error = %e, user_id = member.user.id.get(), "Anti-raid penalty failed");
            false
        }
    }
}

async fn send_penalty_dm(
    ctx: &SerenityContext,
    member: &Member,
    penalty: Penalty,
    detection: &str,
) {
    let guild_name = ctx
        .cache
        .guild(member.guild_id)
        .map(|g| g.name.clone())
        .unwrap_or_else(|| "this server".to_string());

    let embed = embeds::protection_embed()
        .title("Anti-raid action")
        .description(format!(
            "You have been **{}** from **{guild_name}**.",
            penalty.past_tense()
        ))
        .field(
            "Reason",
            format!("The raid protection system detected: {detection}."),
            false,
        )
        .field(
            "Info",
            "If you believe this was a mistake, contact a server administrator.",
            false,
        );

    if let Err(e) = member
        .user
        .dm(&ctx.http, CreateMessage::new().embed(embed))
        .await
    {
        warn!(error = %e, user_id = member.user.id.get(), "Could not DM penalized user");
    }
}

async fn log_action(
    ctx: &SerenityContext,
    settings: &AntiraidSettings,
    title: &str,
    details: &str,
    ping_owner: bool,
    guild_id: GuildId,
) {
    let Some(channel_id) = settings.log_channel else {
        return;
    };

    let embed = embeds::protection_embed()
        .title(format!("Anti-raid — {title}"))
        .description(details.to_string());

    let mut message = CreateMessage::new().embed(embed);
    if ping_owner {
        if let Some(owner_id) = ctx.cache.guild(guild_id).map(|g| g.owner_id) {
            message = message.content(format!("{} — raid alert!", owner_id.mention()));
        }
    }

    if let Err(e) = ChannelId::new(channel_id)
        .send_message(&ctx.http, message)
        .await
    {
        warn!(error = %e, "Failed to send anti-raid log");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = AntiraidSettings::default();
        assert!(!settings.enabled);
        assert_eq!(settings.penalty, Penalty::Kick);
        assert_eq!(settings.massjoin_threshold, 10);
        assert_eq!(settings.massjoin_window_secs, 10);
        assert_eq!(settings.min_account_age_days, 7);
    }

    #[test]
    fn partial_documents_deserialize_with_defaults() {
        let settings: AntiraidSettings =
            serde_json::from_str(r#"{"enabled": true, "massjoin_enabled": true}"#).unwrap();
        assert!(settings.enabled);
        assert!(settings.massjoin_enabled);
        assert_eq!(settings.massjoin_threshold, 10);
        assert_eq!(settings.penalty, Penalty::Kick);
        assert!(!settings.no_avatar_enabled);
    }

    #[test]
    fn penalty_parse_round_trips() {
        for penalty in [Penalty::Ban, Penalty::Kick, Penalty::Quarantine] {
            assert_eq!(Penalty::parse(penalty.name()), Some(penalty));
        }
        assert_eq!(Penalty::parse("strip"), None);
    }
}
