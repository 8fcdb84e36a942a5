use aegis::config::Config;
use aegis::{cache, commands, db, events, tasks, Data};
use poise::serenity_prelude as serenity;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aegis=info".parse().unwrap()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    let db = match db::init_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            std::process::exit(1);
        }
    };

    let cache = cache::Cache::connect(config.redis_url.as_deref()).await;

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MODERATION
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS
        | serenity::GatewayIntents::GUILD_VOICE_STATES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let token = config.discord_token.clone();
    let owners: std::collections::HashSet<serenity::UserId> =
        config.owner_ids.iter().copied().collect();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::load_all(),
            owners,
            prefix_options: poise::PrefixFrameworkOptions {
                dynamic_prefix: Some(|ctx| {
                    Box::pin(async move {
                        let data = ctx.data;
                        let Some(guild_id) = ctx.guild_id else {
                            return Ok(Some(data.config.default_prefix.clone()));
                        };

                        if let Some(prefix) = data.cache.get_prefix(guild_id.get()).await {
                            return Ok(Some(prefix));
                        }

                        let prefix = db::guilds::get_prefix(&data.db, guild_id.get() as i64)
                            .await?
                            .unwrap_or_else(|| data.config.default_prefix.clone());
                        data.cache.set_prefix(guild_id.get(), &prefix).await;

                        Ok(Some(prefix))
                    })
                }),
                ..Default::default()
            },
            // Bot-wide blacklist: silently drop commands from blocked users
            command_check: Some(|ctx| {
                Box::pin(async move {
                    let blacklisted = db::blacklist::is_blacklisted(
                        &ctx.data().db,
                        ctx.author().id.get() as i64,
                    )
                    .await?;
                    Ok(!blacklisted)
                })
            }),
            event_handler: |ctx, event, _framework, data| {
                Box::pin(async move { events::handle_event(ctx, event, data).await })
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            let embed = aegis::utils::embeds::error_embed(error.user_message());
                            let _ = ctx
                                .send(poise::CreateReply::default().embed(embed).ephemeral(true))
                                .await;
                            tracing::error!(
                                command = ctx.command().name,
                                error = %error,
                                "Command error"
                            );
                        }
                        other => {
                            if let Err(e) = poise::builtins::on_error(other).await {
                                tracing::error!(error = %e, "Error handling error");
                            }
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!(bot = %ready.user.name, guilds = ready.guilds.len(), "Bot is ready");

                // Register slash commands (guild-specific if GUILD_ID set, otherwise global)
                if let Some(guild_id) = config.guild_id {
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                        .await?;
                    info!(guild_id = %guild_id, "Slash commands registered to guild");
                } else {
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                    info!("Slash commands registered globally");
                }

                ctx.set_activity(Some(serenity::ActivityData::watching("the audit log")));

                tasks::spawn_giveaway_sweeper(ctx.http.clone(), db.clone());

                Ok(Data {
                    db,
                    cache,
                    config,
                    start_time: std::time::Instant::now(),
                    recent_messages: Mutex::new(HashMap::new()),
                    sticky_reposts: Mutex::new(HashMap::new()),
                })
            })
        })
        .build();

    // Keep enough messages cached for edit snipes
    let mut cache_settings = ::serenity::cache::Settings::default();
    cache_settings.max_messages = 300;

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .cache_settings(cache_settings)
        .await
        .expect("Failed to create Discord client");

    // Graceful shutdown on SIGINT/SIGTERM
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, stopping bot...");
        shard_manager.shutdown_all().await;
    });

    info!("Starting bot...");
    if let Err(why) = client.start().await {
        error!(error = %why, "Client error");
    }
    info!("Bot has shut down cleanly");
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
