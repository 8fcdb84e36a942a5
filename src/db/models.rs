use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Clone, Debug, PartialEq, FromRow)]
pub struct GuildSettingsRow {
    pub guild_id: i64,
    pub prefix: Option<String>,
    pub mod_log_channel_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, FromRow)]
pub struct BlacklistRow {
    pub user_id: i64,
    pub moderator_id: i64,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One persisted moderation action. `case_id` increments per guild.
#[derive(Clone, Debug, PartialEq, FromRow)]
pub struct CaseRow {
    pub guild_id: i64,
    pub case_id: i64,
    pub moderator_id: i64,
    pub target_id: i64,
    pub kind: String,
    pub reason: Option<String>,
    pub duration_secs: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub edited_by: Option<i64>,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, FromRow)]
pub struct WhitelistRow {
    pub guild_id: i64,
    pub user_id: i64,
    pub added_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, FromRow)]
pub struct QuarantineRow {
    pub guild_id: i64,
    pub user_id: i64,
    pub previous_roles: Vec<i64>,
    pub moderator_id: i64,
    pub reason: Option<String>,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, FromRow)]
pub struct VoicemasterGuildRow {
    pub guild_id: i64,
    pub category_id: i64,
    pub generator_channel_id: i64,
}

#[derive(Clone, Debug, PartialEq, FromRow)]
pub struct VoicemasterChannelRow {
    pub channel_id: i64,
    pub guild_id: i64,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, FromRow, Serialize, Deserialize)]
pub struct TagRow {
    pub guild_id: i64,
    pub name: String,
    pub content: String,
    pub owner_id: i64,
    pub uses: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, FromRow)]
pub struct GiveawayRow {
    pub id: i64,
    pub guild_id: i64,
    pub channel_id: i64,
    pub message_id: i64,
    pub host_id: i64,
    pub prize: String,
    pub winners: i64,
    pub ends_at: DateTime<Utc>,
    pub ended: bool,
    pub winner_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, FromRow)]
pub struct ReactionRoleRow {
    pub guild_id: i64,
    pub message_id: i64,
    pub emoji: String,
    pub role_id: i64,
}

#[derive(Clone, Debug, PartialEq, FromRow)]
pub struct AfkRow {
    pub guild_id: i64,
    pub user_id: i64,
    pub reason: String,
    pub since: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, FromRow)]
pub struct StickyRow {
    pub channel_id: i64,
    pub guild_id: i64,
    pub content: String,
    pub last_message_id: Option<i64>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}
