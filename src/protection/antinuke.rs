use crate::db;
use crate::error::Error;
use crate::utils::embeds;
use crate::utils::permissions::can_bot_act;
use crate::Data;
use serde::{Deserialize, Serialize};
use serenity::all::{
    ChannelId, Context as SerenityContext, CreateMessage, GuildId, Member, Mentionable, Message,
    RoleId, UserId, WebhookId,
};
use std::collections::HashMap;
use tracing::{error, info, warn};

// ─── Settings document ───────────────────────────────────────────────

/// Administrative actions the engine watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoredAction {
    BanMembers,
    KickMembers,
    CreateChannels,
    DeleteChannels,
    CreateRoles,
    DeleteRoles,
    CreateWebhooks,
    MentionEveryone,
    AddBot,
}

impl MonitoredAction {
    pub const ALL: [MonitoredAction; 9] = [
        MonitoredAction::BanMembers,
        MonitoredAction::KickMembers,
        MonitoredAction::CreateChannels,
        MonitoredAction::DeleteChannels,
        MonitoredAction::CreateRoles,
        MonitoredAction::DeleteRoles,
        MonitoredAction::CreateWebhooks,
        MonitoredAction::MentionEveryone,
        MonitoredAction::AddBot,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MonitoredAction::BanMembers => "ban_members",
            MonitoredAction::KickMembers => "kick_members",
            MonitoredAction::CreateChannels => "create_channels",
            MonitoredAction::DeleteChannels => "delete_channels",
            MonitoredAction::CreateRoles => "create_roles",
            MonitoredAction::DeleteRoles => "delete_roles",
            MonitoredAction::CreateWebhooks => "create_webhooks",
            MonitoredAction::MentionEveryone => "mention_everyone",
            MonitoredAction::AddBot => "add_bot",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.key() == input.trim().to_lowercase())
    }

    pub fn describe(self) -> &'static str {
        match self {
            MonitoredAction::BanMembers => "mass bans",
            MonitoredAction::KickMembers => "mass kicks",
            MonitoredAction::CreateChannels => "mass channel creation",
            MonitoredAction::DeleteChannels => "mass channel deletion",
            MonitoredAction::CreateRoles => "mass role creation",
            MonitoredAction::DeleteRoles => "mass role deletion",
            MonitoredAction::CreateWebhooks => "webhook creation",
            MonitoredAction::MentionEveryone => "everyone/here spam",
            MonitoredAction::AddBot => "unauthorized bot invites",
        }
    }

    pub fn default_limit(self) -> u64 {
        match self {
            MonitoredAction::CreateChannels | MonitoredAction::CreateRoles => 5,
            MonitoredAction::AddBot => 1,
            _ => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Punishment {
    #[default]
    Ban,
    Kick,
    Strip,
    Quarantine,
}

impl Punishment {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "ban" => Some(Punishment::Ban),
            "kick" => Some(Punishment::Kick),
            "strip" => Some(Punishment::Strip),
            "quarantine" => Some(Punishment::Quarantine),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Punishment::Ban => "ban",
            Punishment::Kick => "kick",
            Punishment::Strip => "strip",
            Punishment::Quarantine => "quarantine",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Punishment::Ban => "banned",
            Punishment::Kick => "kicked",
            Punishment::Strip => "stripped of all roles",
            Punishment::Quarantine => "quarantined",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActionConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_action_limit")]
    pub limit: u64,
}

fn default_action_limit() -> u64 {
    3
}

fn default_revert() -> bool {
    true
}

/// Per-guild anti-nuke document. Missing fields deserialize to defaults so
/// old documents keep working as settings grow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AntinukeSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub punishment: Punishment,
    #[serde(default)]
    pub log_channel: Option<u64>,
    #[serde(default)]
    pub alert_role: Option<u64>,
    #[serde(default)]
    pub quarantine_role: Option<u64>,
    #[serde(default = "default_revert")]
    pub revert: bool,
    #[serde(default)]
    pub trusted: Vec<u64>,
    #[serde(default)]
    pub actions: HashMap<MonitoredAction, ActionConfig>,
}

impl AntinukeSettings {
    pub fn action(&self, action: MonitoredAction) -> ActionConfig {
        self.actions.get(&action).copied().unwrap_or(ActionConfig {
            enabled: false,
            limit: action.default_limit(),
        })
    }

    pub fn set_action(&mut self, action: MonitoredAction, enabled: bool, limit: Option<u64>) {
        let current = self.action(action);
        self.actions.insert(
            action,
            ActionConfig {
                enabled,
                limit: limit.unwrap_or(current.limit),
            },
        );
    }

    pub fn is_trusted(&self, user_id: u64) -> bool {
        self.trusted.contains(&user_id)
    }
}

// ─── Engine ──────────────────────────────────────────────────────────

/// Feed one attributed audit-log action into the engine. `target_id` is the
/// created/deleted entity, used to revert creations after a punishment.
pub async fn handle_audit_action(
    ctx: &SerenityContext,
    data: &Data,
    guild_id: GuildId,
    executor_id: UserId,
    action: MonitoredAction,
    target_id: Option<u64>,
) -> Result<(), Error> {
    if executor_id == ctx.cache.current_user().id {
        return Ok(());
    }

    let Some(settings) = db::antinuke::load(&data.db, guild_id.get() as i64).await? else {
        return Ok(());
    };
    if !settings.enabled || !settings.action(action).enabled {
        return Ok(());
    }

    if action == MonitoredAction::AddBot {
        return handle_bot_add(ctx, data, guild_id, executor_id, target_id, &settings).await;
    }

    if is_exempt(ctx, data, guild_id, executor_id).await? {
        return Ok(());
    }

    let limit = settings.action(action).limit;
    let count = data
        .cache
        .incr_action(guild_id.get(), executor_id.get(), action.key())
        .await;

    if count < limit {
        return Ok(());
    }

    let punished = punish(ctx, data, guild_id, executor_id, action, &settings).await;

    if punished && settings.revert {
        revert(ctx, guild_id, action, target_id).await;
    }

    Ok(())
}

/// Everyone/here mentions come from the message event rather than the audit
/// log; the message itself is deleted before counting.
pub async fn handle_everyone_mention(
    ctx: &SerenityContext,
    data: &Data,
    message: &Message,
) -> Result<(), Error> {
    let Some(guild_id) = message.guild_id else {
        return Ok(());
    };

    let mentions_everyone = message.mention_everyone
        || message.content.contains("@everyone")
        || message.content.contains("@here");
    if !mentions_everyone {
        return Ok(());
    }

    let Some(settings) = db::antinuke::load(&data.db, guild_id.get() as i64).await? else {
        return Ok(());
    };
    let action = MonitoredAction::MentionEveryone;
    if !settings.enabled || !settings.action(action).enabled {
        return Ok(());
    }

    if is_exempt(ctx, data, guild_id, message.author.id).await? {
        return Ok(());
    }

    if let Err(e) = message.delete(&ctx.http).await {
        warn!(error = %e, "Failed to delete everyone mention");
    }

    let limit = settings.action(action).limit;
    let count = data
        .cache
        .incr_action(guild_id.get(), message.author.id.get(), action.key())
        .await;

    if count >= limit {
        punish(ctx, data, guild_id, message.author.id, action, &settings).await;
    }

    Ok(())
}

/// Bot invites punish at their configured limit immediately: the invited bot
/// is kicked and the inviter punished, unless whitelisted or the owner.
async fn handle_bot_add(
    ctx: &SerenityContext,
    data: &Data,
    guild_id: GuildId,
    executor_id: UserId,
    bot_id: Option<u64>,
    settings: &AntinukeSettings,
) -> Result<(), Error> {
    if is_exempt(ctx, data, guild_id, executor_id).await? {
        return Ok(());
    }

    if let Some(bot_id) = bot_id {
        if let Err(e) = guild_id
            .kick_with_reason(&ctx.http, UserId::new(bot_id), "Anti-nuke: unauthorized bot")
            .await
        {
            warn!(error = %e, bot_id, "Failed to kick unauthorized bot");
        }
    }

    punish(ctx, data, guild_id, executor_id, MonitoredAction::AddBot, settings).await;

    Ok(())
}

/// Whitelisted users and the guild owner are never punished. Trusted users
/// are NOT exempt: trust grants configuration access, not immunity.
async fn is_exempt(
    ctx: &SerenityContext,
    data: &Data,
    guild_id: GuildId,
    user_id: UserId,
) -> Result<bool, Error> {
    if db::antinuke::whitelist_contains(&data.db, guild_id.get() as i64, user_id.get() as i64)
        .await?
    {
        return Ok(true);
    }

    let owner_id = guild_owner(ctx, guild_id).await;
    Ok(owner_id == Some(user_id))
}

async fn guild_owner(ctx: &SerenityContext, guild_id: GuildId) -> Option<UserId> {
    if let Some(guild) = ctx.cache.guild(guild_id) {
        return Some(guild.owner_id);
    }
    match guild_id.to_partial_guild(&ctx.http).await {
        Ok(guild) => Some(guild.owner_id),
        Err(e) => {
            warn!(error = %e, guild_id = guild_id.get(), "Failed to resolve guild owner");
            None
        }
    }
}

/// Apply the configured punishment to the executor. Returns whether the
/// punishment went through.
async fn punish(
    ctx: &SerenityContext,
    data: &Data,
    guild_id: GuildId,
    executor_id: UserId,
    action: MonitoredAction,
    settings: &AntinukeSettings,
) -> bool {
    let member = match guild_id.member(ctx, executor_id).await {
        Ok(member) => member,
        Err(e) => {
            warn!(error = %e, executor_id = executor_id.get(), "Executor not in guild");
            return false;
        }
    };

    let actionable = match ctx.cache.guild(guild_id) {
        Some(guild) => can_bot_act(&guild, ctx.cache.current_user().id, &member),
        None => true,
    };
    if !actionable {
        warn!(
            guild_id = guild_id.get(),
            executor_id = executor_id.get(),
            "Cannot punish executor above the bot's role"
        );
        log_alert(ctx, &member, action, settings, false).await;
        return false;
    }

    send_punishment_dm(ctx, &member, action, settings.punishment).await;

    let reason = format!("Anti-nuke: exceeded the {} limit", action.key());
    let result = match settings.punishment {
        Punishment::Ban => guild_id
            .ban_with_reason(&ctx.http, executor_id, 0, &reason)
            .await
            .map_err(Error::from),
        Punishment::Kick => guild_id
            .kick_with_reason(&ctx.http, executor_id, &reason)
            .await
            .map_err(Error::from),
        Punishment::Strip => strip_roles(ctx, &member).await,
        Punishment::Quarantine => match settings.quarantine_role {
            Some(role_id) => {
                let bot_user_id = ctx.cache.current_user().id;
                super::quarantine::apply(
                    ctx,
                    &data.db,
                    &member,
                    RoleId::new(role_id),
                    bot_user_id,
                    Some(&reason),
                    "antinuke",
                )
                .await
            }
            // no quarantine role configured, fall back to a strip
            None => strip_roles(ctx, &member).await,
        },
    };

    let success = match result {
        Ok(()) => {
            info!(
                guild_id = guild_id.get(),
                executor_id = executor_id.get(),
                action = action.key(),
                punishment = settings.punishment.name(),
                "Anti-nuke punishment applied"
            );
            true
        }
        Err(e) => {
            error!(error = %e, executor_id = executor_id.get(), "Anti-nuke punishment failed");
            false
        }
    };

    log_alert(ctx, &member, action, settings, success).await;
    success
}

async fn strip_roles(ctx: &SerenityContext, member: &Member) -> Result<(), Error> {
    if member.roles.is_empty() {
        return Ok(());
    }
    member.remove_roles(&ctx.http, &member.roles).await?;
    Ok(())
}

async fn send_punishment_dm(
    ctx: &SerenityContext,
    member: &Member,
    action: MonitoredAction,
    punishment: Punishment,
) {
    let guild_name = ctx
        .cache
        .guild(member.guild_id)
        .map(|g| g.name.clone())
        .unwrap_or_else(|| "this server".to_string());

    let embed = embeds::protection_embed()
        .title("Anti-nuke action")
        .description(format!(
            "You have been **{}** in **{guild_name}**.",
            punishment.past_tense()
        ))
        .field(
            "Reason",
            format!("The protection system detected {}.", action.describe()),
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
        // DMs closed is the common case, keep going
        warn!(error = %e, user_id = member.user.id.get(), "Could not DM punished user");
    }
}

/// Delete the entity a punished executor created, when revert is enabled.
async fn revert(
    ctx: &SerenityContext,
    guild_id: GuildId,
    action: MonitoredAction,
    target_id: Option<u64>,
) {
    let Some(target_id) = target_id else { return };
    let reason = "Anti-nuke: reverting malicious action";

    let result = match action {
        MonitoredAction::CreateChannels => ChannelId::new(target_id)
            .delete(&ctx.http)
            .await
            .map(|_| ()),
        MonitoredAction::CreateRoles => {
            guild_id
                .delete_role(&ctx.http, RoleId::new(target_id))
                .await
        }
        MonitoredAction::CreateWebhooks => {
            ctx.http
                .delete_webhook(WebhookId::new(target_id), Some(reason))
                .await
        }
        _ => return,
    };

    if let Err(e) = result {
        warn!(error = %e, action = action.key(), target_id, "Failed to revert action");
    } else {
        info!(action = action.key(), target_id, "Reverted malicious action");
    }
}

async fn log_alert(
    ctx: &SerenityContext,
    perpetrator: &Member,
    action: MonitoredAction,
    settings: &AntinukeSettings,
    success: bool,
) {
    let Some(channel_id) = settings.log_channel else {
        return;
    };

    let status = if success {
        "Action taken"
    } else {
        "Could not take action"
    };

    let embed = embeds::protection_embed()
        .title("Anti-nuke triggered")
        .field(
            "Perpetrator",
            format!("{} (`{}`)", perpetrator.user.tag(), perpetrator.user.id),
            true,
        )
        .field("Detected", action.describe(), true)
        .field("Punishment", settings.punishment.name(), true)
        .field("Status", status, false)
        .thumbnail(perpetrator.user.face());

    let mut message = CreateMessage::new().embed(embed);
    if let Some(alert_role) = settings.alert_role {
        message = message.content(RoleId::new(alert_role).mention().to_string());
    }

    if let Err(e) = ChannelId::new(channel_id)
        .send_message(&ctx.http, message)
        .await
    {
        warn!(error = %e, "Failed to send anti-nuke alert");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_keys_round_trip() {
        for action in MonitoredAction::ALL {
            assert_eq!(MonitoredAction::parse(action.key()), Some(action));
        }
        assert_eq!(MonitoredAction::parse("everything"), None);
    }

    #[test]
    fn unset_actions_fall_back_to_defaults() {
        let settings = AntinukeSettings::default();
        let config = settings.action(MonitoredAction::BanMembers);
        assert!(!config.enabled);
        assert_eq!(config.limit, 3);
        assert_eq!(settings.action(MonitoredAction::AddBot).limit, 1);
        assert_eq!(settings.action(MonitoredAction::CreateChannels).limit, 5);
    }

    #[test]
    fn set_action_preserves_limit_when_toggling() {
        let mut settings = AntinukeSettings::default();
        settings.set_action(MonitoredAction::BanMembers, true, Some(7));
        settings.set_action(MonitoredAction::BanMembers, false, None);
        let config = settings.action(MonitoredAction::BanMembers);
        assert!(!config.enabled);
        assert_eq!(config.limit, 7);
    }

    #[test]
    fn partial_documents_deserialize_with_defaults() {
        let settings: AntinukeSettings = serde_json::from_str(
            r#"{"enabled": true, "actions": {"ban_members": {"enabled": true, "limit": 2}}}"#,
        )
        .unwrap();
        assert!(settings.enabled);
        assert!(settings.revert);
        assert_eq!(settings.punishment, Punishment::Ban);
        let config = settings.action(MonitoredAction::BanMembers);
        assert!(config.enabled);
        assert_eq!(config.limit, 2);
        assert!(!settings.action(MonitoredAction::KickMembers).enabled);
    }

    #[test]
    fn settings_survive_a_json_round_trip() {
        let mut settings = AntinukeSettings {
            enabled: true,
            punishment: Punishment::Quarantine,
            quarantine_role: Some(42),
            trusted: vec![1, 2],
            ..Default::default()
        };
        settings.set_action(MonitoredAction::CreateWebhooks, true, Some(4));

        let json = serde_json::to_string(&settings).unwrap();
        let back: AntinukeSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.punishment, Punishment::Quarantine);
        assert_eq!(back.quarantine_role, Some(42));
        assert!(back.is_trusted(1) && back.is_trusted(2) && !back.is_trusted(3));
        assert_eq!(back.action(MonitoredAction::CreateWebhooks).limit, 4);
    }
}
