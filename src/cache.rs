use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

const PREFIX_TTL: u64 = 86_400;
const TAG_TTL: u64 = 3_600;
const AFK_TTL: u64 = 604_800;
const SNIPE_TTL: i64 = 3_600;
const SNIPE_KEEP: isize = 10;

/// Sliding-window action counter window (anti-nuke).
pub const ACTION_WINDOW_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedMessage {
    pub author_id: i64,
    pub author_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditedMessage {
    pub author_id: i64,
    pub author_name: String,
    pub before: String,
    pub after: String,
    pub timestamp: DateTime<Utc>,
    pub jump_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AfkEntry {
    pub reason: String,
    pub since: DateTime<Utc>,
}

/// A fixed-window counter used when Redis is unavailable.
struct WindowCounter {
    window_start: Instant,
    count: u64,
}

/// Redis-backed cache. Every operation degrades when Redis is absent: reads
/// miss, writes are dropped, and the protection counters fall back to the
/// in-memory windows below, so the bot stays functional without a cache tier.
pub struct Cache {
    conn: Option<ConnectionManager>,
    counters: Mutex<HashMap<String, WindowCounter>>,
    joins: Mutex<HashMap<u64, VecDeque<(Instant, u64)>>>,
    raid_mode: Mutex<HashMap<u64, Instant>>,
}

impl Cache {
    /// Connect to Redis if a URL is configured. Connection failures are
    /// logged and leave the cache in degraded (memory-only) mode.
    pub async fn connect(redis_url: Option<&str>) -> Self {
        let conn = match redis_url {
            Some(url) => match Self::open(url).await {
                Ok(conn) => {
                    info!("Connected to Redis");
                    Some(conn)
                }
                Err(e) => {
                    warn!(error = %e, "Redis unavailable, running without cache");
                    None
                }
            },
            None => {
                info!("No REDIS_URL configured, running without cache");
                None
            }
        };

        Self {
            conn,
            counters: Mutex::new(HashMap::new()),
            joins: Mutex::new(HashMap::new()),
            raid_mode: Mutex::new(HashMap::new()),
        }
    }

    async fn open(url: &str) -> Result<ConnectionManager, redis::RedisError> {
        let client = redis::Client::open(url)?;
        ConnectionManager::new(client).await
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn conn(&self) -> Option<ConnectionManager> {
        self.conn.clone()
    }

    // ─── Prefixes ────────────────────────────────────────────────────────

    pub async fn get_prefix(&self, guild_id: u64) -> Option<String> {
        let mut conn = self.conn()?;
        match conn.get::<_, Option<String>>(format!("prefix:{guild_id}")).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Redis GET failed");
                None
            }
        }
    }

    pub async fn set_prefix(&self, guild_id: u64, prefix: &str) {
        let Some(mut conn) = self.conn() else { return };
        if let Err(e) = conn
            .set_ex::<_, _, ()>(format!("prefix:{guild_id}"), prefix, PREFIX_TTL)
            .await
        {
            warn!(error = %e, "Redis SET failed");
        }
    }

    pub async fn delete_prefix(&self, guild_id: u64) {
        self.delete(&format!("prefix:{guild_id}")).await;
    }

    // ─── Anti-nuke action counters ───────────────────────────────────────

    /// Increment the per-executor counter for a monitored action and return
    /// the count within the current window.
    pub async fn incr_action(&self, guild_id: u64, user_id: u64, action: &str) -> u64 {
        let key = format!("antinuke:count:{guild_id}:{user_id}:{action}");

        if let Some(mut conn) = self.conn() {
            match conn.incr::<_, _, i64>(&key, 1).await {
                Ok(count) => {
                    if count == 1 {
                        if let Err(e) = conn.expire::<_, ()>(&key, ACTION_WINDOW_SECS as i64).await
                        {
                            warn!(error = %e, "Redis EXPIRE failed");
                        }
                    }
                    return count as u64;
                }
                Err(e) => warn!(error = %e, "Redis INCR failed, using memory counter"),
            }
        }

        let mut counters = self.counters.lock().await;
        let counter = counters.entry(key).or_insert(WindowCounter {
            window_start: Instant::now(),
            count: 0,
        });
        if counter.window_start.elapsed() > Duration::from_secs(ACTION_WINDOW_SECS) {
            counter.window_start = Instant::now();
            counter.count = 0;
        }
        counter.count += 1;
        counter.count
    }

    // ─── Anti-raid join tracking ─────────────────────────────────────────

    pub async fn record_join(&self, guild_id: u64, user_id: u64) {
        if let Some(mut conn) = self.conn() {
            let key = format!("antiraid:joins:{guild_id}");
            let now = Utc::now().timestamp();
            let result: Result<(), redis::RedisError> = async {
                conn.zadd::<_, _, _, ()>(&key, user_id, now).await?;
                conn.expire::<_, ()>(&key, 300).await?;
                Ok(())
            }
            .await;
            if result.is_ok() {
                return;
            }
            warn!("Redis ZADD failed, tracking join in memory");
        }

        let mut joins = self.joins.lock().await;
        let log = joins.entry(guild_id).or_default();
        log.push_back((Instant::now(), user_id));
        while log.len() > 200 {
            log.pop_front();
        }
    }

    /// User IDs that joined within the last `window_secs` seconds.
    pub async fn recent_joins(&self, guild_id: u64, window_secs: u64) -> Vec<u64> {
        if let Some(mut conn) = self.conn() {
            let key = format!("antiraid:joins:{guild_id}");
            let cutoff = Utc::now().timestamp() - window_secs as i64;
            match conn
                .zrangebyscore::<_, _, _, Vec<u64>>(&key, cutoff, i64::MAX)
                .await
            {
                Ok(ids) => return ids,
                Err(e) => warn!(error = %e, "Redis ZRANGEBYSCORE failed"),
            }
        }

        let window = Duration::from_secs(window_secs);
        let joins = self.joins.lock().await;
        joins
            .get(&guild_id)
            .map(|log| {
                log.iter()
                    .filter(|(at, _)| at.elapsed() <= window)
                    .map(|(_, user_id)| *user_id)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn clear_joins(&self, guild_id: u64) {
        self.delete(&format!("antiraid:joins:{guild_id}")).await;
        self.joins.lock().await.remove(&guild_id);
    }

    pub async fn set_raid_mode(&self, guild_id: u64, secs: u64) {
        if let Some(mut conn) = self.conn() {
            if conn
                .set_ex::<_, _, ()>(format!("antiraid:raidmode:{guild_id}"), 1, secs)
                .await
                .is_ok()
            {
                return;
            }
        }
        self.raid_mode
            .lock()
            .await
            .insert(guild_id, Instant::now() + Duration::from_secs(secs));
    }

    pub async fn in_raid_mode(&self, guild_id: u64) -> bool {
        if let Some(mut conn) = self.conn() {
            if let Ok(exists) = conn
                .exists::<_, bool>(format!("antiraid:raidmode:{guild_id}"))
                .await
            {
                return exists;
            }
        }
        self.raid_mode
            .lock()
            .await
            .get(&guild_id)
            .is_some_and(|until| Instant::now() < *until)
    }

    // ─── Snipes ──────────────────────────────────────────────────────────

    pub async fn push_deleted(&self, channel_id: u64, message: &DeletedMessage) {
        self.push_snipe(&format!("snipe:deleted:{channel_id}"), message)
            .await;
    }

    pub async fn deleted_messages(&self, channel_id: u64) -> Vec<DeletedMessage> {
        self.snipe_list(&format!("snipe:deleted:{channel_id}")).await
    }

    pub async fn push_edited(&self, channel_id: u64, message: &EditedMessage) {
        self.push_snipe(&format!("snipe:edited:{channel_id}"), message)
            .await;
    }

    pub async fn edited_messages(&self, channel_id: u64) -> Vec<EditedMessage> {
        self.snipe_list(&format!("snipe:edited:{channel_id}")).await
    }

    pub async fn clear_snipes(&self, channel_id: u64) {
        self.delete(&format!("snipe:deleted:{channel_id}")).await;
        self.delete(&format!("snipe:edited:{channel_id}")).await;
    }

    async fn push_snipe<T: Serialize>(&self, key: &str, message: &T) {
        let Some(mut conn) = self.conn() else { return };
        let Ok(payload) = serde_json::to_string(message) else {
            return;
        };
        let result: Result<(), redis::RedisError> = async {
            conn.lpush::<_, _, ()>(key, payload).await?;
            conn.ltrim::<_, ()>(key, 0, SNIPE_KEEP - 1).await?;
            conn.expire::<_, ()>(key, SNIPE_TTL).await?;
            Ok(())
        }
        .await;
        if let Err(e) = result {
            warn!(error = %e, "Redis LPUSH failed");
        }
    }

    async fn snipe_list<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Vec<T> {
        let Some(mut conn) = self.conn() else {
            return Vec::new();
        };
        match conn.lrange::<_, Vec<String>>(key, 0, -1).await {
            Ok(entries) => entries
                .iter()
                .filter_map(|raw| serde_json::from_str(raw).ok())
                .collect(),
            Err(e) => {
                warn!(error = %e, "Redis LRANGE failed");
                Vec::new()
            }
        }
    }

    // ─── AFK mirror ──────────────────────────────────────────────────────

    pub async fn set_afk(&self, guild_id: u64, user_id: u64, entry: &AfkEntry) {
        let Some(mut conn) = self.conn() else { return };
        let Ok(payload) = serde_json::to_string(entry) else {
            return;
        };
        if let Err(e) = conn
            .set_ex::<_, _, ()>(format!("afk:{guild_id}:{user_id}"), payload, AFK_TTL)
            .await
        {
            warn!(error = %e, "Redis SET failed");
        }
    }

    pub async fn get_afk(&self, guild_id: u64, user_id: u64) -> Option<AfkEntry> {
        let mut conn = self.conn()?;
        let raw: Option<String> = conn
            .get(format!("afk:{guild_id}:{user_id}"))
            .await
            .ok()
            .flatten();
        raw.and_then(|raw| serde_json::from_str(&raw).ok())
    }

    pub async fn delete_afk(&self, guild_id: u64, user_id: u64) {
        self.delete(&format!("afk:{guild_id}:{user_id}")).await;
    }

    // ─── Tags ────────────────────────────────────────────────────────────

    pub async fn set_tag(&self, guild_id: u64, name: &str, payload: &str) {
        let Some(mut conn) = self.conn() else { return };
        let key = format!("tag:{guild_id}:{}", name.to_lowercase());
        if let Err(e) = conn.set_ex::<_, _, ()>(key, payload, TAG_TTL).await {
            warn!(error = %e, "Redis SET failed");
        }
    }

    pub async fn get_tag(&self, guild_id: u64, name: &str) -> Option<String> {
        let mut conn = self.conn()?;
        conn.get(format!("tag:{guild_id}:{}", name.to_lowercase()))
            .await
            .ok()
            .flatten()
    }

    pub async fn invalidate_tag(&self, guild_id: u64, name: &str) {
        self.delete(&format!("tag:{guild_id}:{}", name.to_lowercase()))
            .await;
    }

    async fn delete(&self, key: &str) {
        let Some(mut conn) = self.conn() else { return };
        if let Err(e) = conn.del::<_, ()>(key).await {
            warn!(error = %e, "Redis DEL failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn degraded() -> Cache {
        Cache {
            conn: None,
            counters: Mutex::new(HashMap::new()),
            joins: Mutex::new(HashMap::new()),
            raid_mode: Mutex::new(HashMap::new()),
        }
    }

    #[tokio::test]
    async fn memory_counter_increments_within_window() {
        let cache = degraded();
        assert_eq!(cache.incr_action(1, 2, "ban_members").await, 1);
        assert_eq!(cache.incr_action(1, 2, "ban_members").await, 2);
        assert_eq!(cache.incr_action(1, 2, "ban_members").await, 3);
        // distinct executor gets its own counter
        assert_eq!(cache.incr_action(1, 3, "ban_members").await, 1);
    }

    #[tokio::test]
    async fn memory_joins_tracked_and_cleared() {
        let cache = degraded();
        cache.record_join(1, 10).await;
        cache.record_join(1, 11).await;
        cache.record_join(2, 12).await;

        let recent = cache.recent_joins(1, 60).await;
        assert_eq!(recent.len(), 2);
        assert!(recent.contains(&10) && recent.contains(&11));

        cache.clear_joins(1).await;
        assert!(cache.recent_joins(1, 60).await.is_empty());
    }

    #[tokio::test]
    async fn raid_mode_expires() {
        let cache = degraded();
        assert!(!cache.in_raid_mode(1).await);
        cache.set_raid_mode(1, 60).await;
        assert!(cache.in_raid_mode(1).await);

        // an already expired entry reads as inactive
        cache
            .raid_mode
            .lock()
            .await
            .insert(2, Instant::now() - Duration::from_secs(1));
        assert!(!cache.in_raid_mode(2).await);
    }

    #[tokio::test]
    async fn degraded_snipes_are_empty() {
        let cache = degraded();
        let deleted: Vec<DeletedMessage> = cache.deleted_messages(1).await;
        assert!(deleted.is_empty());
    }
}
