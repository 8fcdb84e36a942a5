use crate::cache::{DeletedMessage, EditedMessage};
use crate::commands::filter;
use crate::error::Error;
use crate::protection::antinuke;
use crate::utils::time::format_duration;
use crate::{db, Data, RecentMessage};
use chrono::Utc;
use serenity::all::{ChannelId, Context, Message, MessageId};
use std::collections::VecDeque;
use tracing::warn;

/// Messages kept per channel for deleted-content recall.
const RECENT_BUFFER: usize = 20;
/// Minimum gap between sticky reposts in one channel.
const STICKY_COOLDOWN: std::time::Duration = std::time::Duration::from_secs(4);

pub async fn message(ctx: &Context, data: &Data, message: &Message) -> Result<(), Error> {
    if message.author.bot || message.guild_id.is_none() {
        return Ok(());
    }

    record_recent(data, message).await;

    // A filtered message is gone; nothing downstream should see it
    if filter::enforce(ctx, data, message).await? {
        return Ok(());
    }

    antinuke::handle_everyone_mention(ctx, data, message).await?;
    afk_flow(ctx, data, message).await?;
    sticky_flow(ctx, data, message).await?;

    Ok(())
}

async fn record_recent(data: &Data, message: &Message) {
    if message.content.is_empty() {
        return;
    }

    let mut buffers = data.recent_messages.lock().await;
    let buffer = buffers
        .entry(message.channel_id)
        .or_insert_with(VecDeque::new);
    buffer.push_back(RecentMessage {
        message_id: message.id,
        author_id: message.author.id,
        author_name: message.author.tag(),
        content: message.content.clone(),
        timestamp: Utc::now(),
    });
    while buffer.len() > RECENT_BUFFER {
        buffer.pop_front();
    }
}

/// Deleted messages land in the snipe cache if their content was seen.
pub async fn message_delete(
    data: &Data,
    channel_id: ChannelId,
    message_id: MessageId,
) -> Result<(), Error> {
    let removed = {
        let mut buffers = data.recent_messages.lock().await;
        buffers.get_mut(&channel_id).and_then(|buffer| {
            let index = buffer.iter().position(|m| m.message_id == message_id)?;
            buffer.remove(index)
        })
    };

    if let Some(message) = removed {
        data.cache
            .push_deleted(
                channel_id.get(),
                &DeletedMessage {
                    author_id: message.author_id.get() as i64,
                    author_name: message.author_name,
                    content: message.content,
                    timestamp: message.timestamp,
                },
            )
            .await;
    }

    Ok(())
}

pub async fn message_update(
    data: &Data,
    old: Option<&Message>,
    new: Option<&Message>,
) -> Result<(), Error> {
    let (Some(old), Some(new)) = (old, new) else {
        return Ok(());
    };
    if new.author.bot || new.guild_id.is_none() || old.content == new.content {
        return Ok(());
    }

    data.cache
        .push_edited(
            new.channel_id.get(),
            &EditedMessage {
                author_id: new.author.id.get() as i64,
                author_name: new.author.tag(),
                before: old.content.clone(),
                after: new.content.clone(),
                timestamp: Utc::now(),
                jump_url: new.link(),
            },
        )
        .await;

    Ok(())
}

/// Clear the author's AFK state and announce mentioned AFK users.
async fn afk_flow(ctx: &Context, data: &Data, message: &Message) -> Result<(), Error> {
    let guild_id = match message.guild_id {
        Some(id) => id.get() as i64,
        None => return Ok(()),
    };

    if let Some(entry) =
        db::afk::remove(&data.db, guild_id, message.author.id.get() as i64).await?
    {
        data.cache
            .delete_afk(guild_id as u64, message.author.id.get())
            .await;

        let away_secs = (Utc::now() - entry.since).num_seconds().max(0) as u64;
        let reply = format!(
            "Welcome back, you were AFK for **{}**.",
            format_duration(away_secs)
        );
        if let Err(e) = message.reply(&ctx.http, reply).await {
            warn!(error = %e, "Failed to send AFK return notice");
        }
    }

    let mut notices = Vec::new();
    for user in message.mentions.iter().take(5) {
        if user.id == message.author.id || user.bot {
            continue;
        }
        // Redis mirror first, database as the source of truth
        let entry = match data.cache.get_afk(guild_id as u64, user.id.get()).await {
            Some(entry) => Some((entry.reason, entry.since)),
            None => db::afk::get(&data.db, guild_id, user.id.get() as i64)
                .await?
                .map(|row| (row.reason, row.since)),
        };
        if let Some((reason, since)) = entry {
            notices.push(format!(
                "**{}** is AFK: {reason} — <t:{}:R>",
                user.display_name(),
                since.timestamp()
            ));
        }
    }

    if !notices.is_empty() {
        if let Err(e) = message.reply(&ctx.http, notices.join("\n")).await {
            warn!(error = %e, "Failed to send AFK mention notice");
        }
    }

    Ok(())
}

/// Keep the sticky message at the bottom of its channel.
async fn sticky_flow(ctx: &Context, data: &Data, message: &Message) -> Result<(), Error> {
    let Some(sticky) = db::stickies::get(&data.db, message.channel_id.get() as i64).await? else {
        return Ok(());
    };

    {
        let mut reposts = data.sticky_reposts.lock().await;
        if let Some(last) = reposts.get(&message.channel_id) {
            if last.elapsed() < STICKY_COOLDOWN {
                return Ok(());
            }
        }
        reposts.insert(message.channel_id, std::time::Instant::now());
    }

    if let Some(last_id) = sticky.last_message_id {
        if let Err(e) = message
            .channel_id
            .delete_message(&ctx.http, MessageId::new(last_id as u64))
            .await
        {
            warn!(error = %e, "Failed to delete previous sticky message");
        }
    }

    let posted = message
        .channel_id
        .say(&ctx.http, format!("__**Sticky**__\n{}", sticky.content))
        .await?;

    db::stickies::set_last_message(
        &data.db,
        message.channel_id.get() as i64,
        posted.id.get() as i64,
    )
    .await?;

    Ok(())
}
