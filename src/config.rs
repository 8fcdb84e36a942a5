use crate::error::Error;
use serenity::all::{GuildId, UserId};

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub database_url: String,
    pub redis_url: Option<String>,
    pub default_prefix: String,
    pub owner_ids: Vec<UserId>,
    pub guild_id: Option<GuildId>,
    pub bot_version: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `DISCORD_TOKEN` — Bot token from Discord Developer Portal
    /// - `DATABASE_URL` — PostgreSQL connection string
    ///
    /// Optional:
    /// - `REDIS_URL` — Redis connection string; caching degrades gracefully without it
    /// - `DEFAULT_PREFIX` — Fallback command prefix (default `;`)
    /// - `OWNER_IDS` — Comma-separated user IDs with owner-level access
    /// - `GUILD_ID` — Register slash commands to a single guild instead of globally
    pub fn from_env() -> Result<Self, Error> {
        let discord_token = std::env::var("DISCORD_TOKEN")
            .map_err(|_| Error::Config("DISCORD_TOKEN environment variable is required".into()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| Error::Config("DATABASE_URL environment variable is required".into()))?;

        let redis_url = std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty());

        let default_prefix = std::env::var("DEFAULT_PREFIX").unwrap_or_else(|_| ";".into());

        let owner_ids = parse_id_list::<UserId>("OWNER_IDS")?;
        let guild_id = parse_optional_id::<GuildId>("GUILD_ID")?;

        Ok(Self {
            discord_token,
            database_url,
            redis_url,
            default_prefix,
            owner_ids,
            guild_id,
            bot_version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}

fn parse_id_list<T>(var: &str) -> Result<Vec<T>, Error>
where
    T: From<u64>,
{
    match std::env::var(var) {
        Ok(val) if !val.is_empty() => val
            .split(',')
            .map(|s| {
                s.trim()
                    .parse::<u64>()
                    .map(T::from)
                    .map_err(|_| Error::Config(format!("Invalid ID in {var}: '{s}'")))
            })
            .collect(),
        _ => Ok(Vec::new()),
    }
}

fn parse_optional_id<T>(var: &str) -> Result<Option<T>, Error>
where
    T: From<u64>,
{
    match std::env::var(var) {
        Ok(val) if !val.is_empty() => {
            let id = val
                .trim()
                .parse::<u64>()
                .map_err(|_| Error::Config(format!("Invalid ID for {var}: '{val}'")))?;
            Ok(Some(T::from(id)))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_list_parses_and_trims() {
        std::env::set_var("TEST_ID_LIST", "123, 456 ,789");
        let ids: Vec<UserId> = parse_id_list("TEST_ID_LIST").unwrap();
        assert_eq!(
            ids,
            vec![UserId::new(123), UserId::new(456), UserId::new(789)]
        );
        std::env::remove_var("TEST_ID_LIST");
    }

    #[test]
    fn id_list_rejects_garbage() {
        std::env::set_var("TEST_ID_BAD", "123,abc");
        let result: Result<Vec<UserId>, Error> = parse_id_list("TEST_ID_BAD");
        assert!(result.is_err());
        std::env::remove_var("TEST_ID_BAD");
    }

    #[test]
    fn optional_id_absent_is_none() {
        let id: Option<GuildId> = parse_optional_id("TEST_ID_MISSING").unwrap();
        assert!(id.is_none());
    }
}
