use crate::commands::giveaway;
use crate::db;
use serenity::all::Http;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

const GIVEAWAY_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Periodically end giveaways whose deadline has passed.
pub fn spawn_giveaway_sweeper(http: Arc<Http>, pool: PgPool) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(GIVEAWAY_SWEEP_INTERVAL);
        info!("Giveaway sweeper started");

        loop {
            interval.tick().await;

            let due = match db::giveaways::due(&pool, chrono::Utc::now()).await {
                Ok(due) => due,
                Err(e) => {
                    error!(error = %e, "Failed to query due giveaways");
                    continue;
                }
            };

            for giveaway_row in due {
                if let Err(e) = giveaway::finish(&http, &pool, &giveaway_row).await {
                    error!(
                        error = %e,
                        giveaway_id = giveaway_row.id,
                        "Failed to finish giveaway"
                    );
                }
            }
        }
    });
}
