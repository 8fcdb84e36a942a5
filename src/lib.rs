pub mod cache;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod protection;
pub mod tasks;
pub mod utils;

use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, MessageId, UserId};
use sqlx::PgPool;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

/// A recently seen message, kept so deleted content can still be sniped.
pub struct RecentMessage {
    pub message_id: MessageId,
    pub author_id: UserId,
    pub author_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Shared data accessible across all Poise commands and event handlers.
pub struct Data {
    pub db: PgPool,
    pub cache: cache::Cache,
    pub config: config::Config,
    pub start_time: std::time::Instant,
    /// Per-channel ring buffer feeding the snipe cache on deletions.
    pub recent_messages: Mutex<HashMap<ChannelId, VecDeque<RecentMessage>>>,
    /// Last sticky repost per channel, to avoid hammering busy channels.
    pub sticky_reposts: Mutex<HashMap<ChannelId, std::time::Instant>>,
}

/// Poise context alias used throughout the bot.
pub type Context<'a> = poise::Context<'a, Data, error::Error>;
