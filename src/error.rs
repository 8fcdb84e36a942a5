#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Discord API error: {0}")]
    Discord(#[from] Box<serenity::Error>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),
}

impl From<serenity::Error> for Error {
    fn from(err: serenity::Error) -> Self {
        Error::Discord(Box::new(err))
    }
}

impl Error {
    pub fn user_message(&self) -> String {
        match self {
            Error::Discord(_) => {
                "Failed to communicate with Discord. Please try again.".to_string()
            }
            Error::Config(msg) => msg.clone(),
            Error::Database(_) => "A database error occurred. Please try again later.".to_string(),
            Error::Cache(_) => "A cache error occurred. Please try again later.".to_string(),
            Error::InvalidDuration(input) => format!(
                "`{input}` is not a valid duration. Use forms like `30s`, `5m`, `1h30m`, `1d`."
            ),
        }
    }
}
