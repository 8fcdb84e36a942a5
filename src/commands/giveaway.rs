use super::{fail, success};
use crate::db::models::GiveawayRow;
use crate::utils::embeds;
use crate::utils::time::parse_duration;
use crate::{db, Context, Data};
use chrono::{Duration as ChronoDuration, Utc};
use serenity::all::{
    ButtonStyle, ChannelId, Context as SerenityContext, CreateActionRow, CreateButton,
    CreateEmbed, CreateInteractionResponse, CreateInteractionResponseMessage, CreateMessage,
    EditMessage, Http, Interaction, MessageId,
};
use sqlx::PgPool;
use tracing::{error, info};

type Error = crate::error::Error;

pub const ENTER_BUTTON_ID: &str = "giveaway_enter";

fn giveaway_embed(prize: &str, host_id: u64, winners: i64, ends_at: i64) -> CreateEmbed {
    embeds::giveaway_embed()
        .title("🎉 Giveaway")
        .description(format!(
            "**Prize:** {prize}\nPress the button to enter!\n\nEnds <t:{ends_at}:R>"
        ))
        .field("Winners", winners.to_string(), true)
        .field("Hosted by", format!("<@{host_id}>"), true)
}

fn enter_button_row() -> CreateActionRow {
    CreateActionRow::Buttons(vec![CreateButton::new(ENTER_BUTTON_ID)
        .style(ButtonStyle::Primary)
        .emoji('🎉')
        .label("Enter")])
}

/// Draw up to `count` unique winners from the entry list.
pub fn draw_winners(entries: &[i64], count: usize) -> Vec<i64> {
    use rand::seq::SliceRandom;

    let mut rng = rand::thread_rng();
    entries
        .choose_multiple(&mut rng, count.min(entries.len()))
        .copied()
        .collect()
}

/// Finish a giveaway: draw winners, persist them, update the message, and
/// announce the result. Shared by the sweeper and `giveaway end`.
pub async fn finish(http: &Http, pool: &PgPool, giveaway: &GiveawayRow) -> Result<(), Error> {
    let entries = db::giveaways::entries(pool, giveaway.id).await?;
    let winners = draw_winners(&entries, giveaway.winners.max(0) as usize);

    db::giveaways::mark_ended(pool, giveaway.id, &winners).await?;

    let channel_id = ChannelId::new(giveaway.channel_id as u64);
    let message_id = MessageId::new(giveaway.message_id as u64);

    let description = if winners.is_empty() {
        format!("**Prize:** {}\n\nNobody entered.", giveaway.prize)
    } else {
        let mentions: Vec<String> = winners.iter().map(|id| format!("<@{id}>")).collect();
        format!(
            "**Prize:** {}\n\n**Winner(s):** {}",
            giveaway.prize,
            mentions.join(", ")
        )
    };

    let ended_embed = embeds::giveaway_embed()
        .title("🎉 Giveaway ended")
        .description(description);

    if let Err(e) = channel_id
        .edit_message(
            http,
            message_id,
            EditMessage::new().embed(ended_embed).components(Vec::new()),
        )
        .await
    {
        error!(error = %e, giveaway_id = giveaway.id, "Failed to update giveaway message");
    }

    let announcement = if winners.is_empty() {
        format!("The giveaway for **{}** ended without entries.", giveaway.prize)
    } else {
        let mentions: Vec<String> = winners.iter().map(|id| format!("<@{id}>")).collect();
        format!(
            "🎉 Congratulations {}! You won **{}**!",
            mentions.join(", "),
            giveaway.prize
        )
    };
    if let Err(e) = channel_id.say(http, announcement).await {
        error!(error = %e, giveaway_id = giveaway.id, "Failed to announce giveaway result");
    }

    info!(
        giveaway_id = giveaway.id,
        winners = winners.len(),
        entries = entries.len(),
        "Giveaway finished"
    );

    Ok(())
}

/// Toggle an entry when someone presses the giveaway button.
pub async fn handle_component(
    ctx: &SerenityContext,
    data: &Data,
    interaction: &Interaction,
) -> Result<(), Error> {
    let Some(component) = interaction.as_message_component() else {
        return Ok(());
    };
    if component.data.custom_id != ENTER_BUTTON_ID {
        return Ok(());
    }
    let Some(guild_id) = component.guild_id else {
        return Ok(());
    };

    let giveaway = db::giveaways::find_by_message(
        &data.db,
        guild_id.get() as i64,
        component.message.id.get() as i64,
    )
    .await?;

    let content = match giveaway {
        Some(giveaway) if !giveaway.ended => {
            let entered = db::giveaways::toggle_entry(
                &data.db,
                giveaway.id,
                component.user.id.get() as i64,
            )
            .await?;
            if entered {
                "You're in! Press again to withdraw.".to_string()
            } else {
                "Entry withdrawn.".to_string()
            }
        }
        Some(_) => "This giveaway has already ended.".to_string(),
        None => "This giveaway no longer exists.".to_string(),
    };

    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;

    Ok(())
}

/// Run giveaways with button entries.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Giveaways",
    required_permissions = "MANAGE_GUILD",
    subcommands("start", "end", "reroll", "list", "gw_delete")
)]
pub async fn giveaway(ctx: Context<'_>) -> Result<(), Error> {
    list_inner(ctx).await
}

/// Start a giveaway in this channel.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Giveaways",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn start(
    ctx: Context<'_>,
    #[description = "Duration like 1h, 1d"] duration: String,
    #[description = "Number of winners"] winners: u32,
    #[description = "The prize"]
    #[rest]
    prize: String,
) -> Result<(), Error> {
    let Some(secs) = parse_duration(&duration) else {
        return fail(ctx, Error::InvalidDuration(duration).user_message()).await;
    };
    if winners == 0 || winners > 20 {
        return fail(ctx, "Winners must be between 1 and 20.").await;
    }
    if prize.is_empty() || prize.len() > 200 {
        return fail(ctx, "The prize must be 1-200 characters.").await;
    }

    let ends_at = Utc::now() + ChronoDuration::seconds(secs as i64);

    let message = ctx
        .channel_id()
        .send_message(
            ctx.http(),
            CreateMessage::new()
                .embed(giveaway_embed(
                    &prize,
                    ctx.author().id.get(),
                    winners as i64,
                    ends_at.timestamp(),
                ))
                .components(vec![enter_button_row()]),
        )
        .await?;

    db::giveaways::create(
        &ctx.data().db,
        ctx.guild_id().unwrap().get() as i64,
        ctx.channel_id().get() as i64,
        message.id.get() as i64,
        ctx.author().id.get() as i64,
        &prize,
        winners as i64,
        ends_at,
    )
    .await?;

    success(
        ctx,
        format!("Giveaway for **{prize}** started, ends <t:{}:R>.", ends_at.timestamp()),
    )
    .await
}

/// End a giveaway now.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Giveaways",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn end(
    ctx: Context<'_>,
    #[description = "Giveaway message ID"] message_id: u64,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let Some(giveaway) =
        db::giveaways::find_by_message(&ctx.data().db, guild_id, message_id as i64).await?
    else {
        return fail(ctx, "No giveaway with that message ID.").await;
    };
    if giveaway.ended {
        return fail(ctx, "That giveaway has already ended.").await;
    }

    finish(ctx.http(), &ctx.data().db, &giveaway).await?;
    success(ctx, "Giveaway ended.").await
}

/// Draw new winners for an ended giveaway.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Giveaways",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn reroll(
    ctx: Context<'_>,
    #[description = "Giveaway message ID"] message_id: u64,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let Some(giveaway) =
        db::giveaways::find_by_message(&ctx.data().db, guild_id, message_id as i64).await?
    else {
        return fail(ctx, "No giveaway with that message ID.").await;
    };
    if !giveaway.ended {
        return fail(ctx, "That giveaway is still running; end it first.").await;
    }

    let entries = db::giveaways::entries(&ctx.data().db, giveaway.id).await?;
    let winners = draw_winners(&entries, giveaway.winners.max(0) as usize);
    if winners.is_empty() {
        return fail(ctx, "Nobody entered that giveaway.").await;
    }

    db::giveaways::mark_ended(&ctx.data().db, giveaway.id, &winners).await?;

    let mentions: Vec<String> = winners.iter().map(|id| format!("<@{id}>")).collect();
    ctx.channel_id()
        .say(
            ctx.http(),
            format!(
                "🎉 Reroll! Congratulations {} — you won **{}**!",
                mentions.join(", "),
                giveaway.prize
            ),
        )
        .await?;
    Ok(())
}

/// List running giveaways.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "list",
    category = "Giveaways",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    list_inner(ctx).await
}

async fn list_inner(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let giveaways = db::giveaways::list_active(&ctx.data().db, guild_id).await?;

    if giveaways.is_empty() {
        return fail(ctx, "No giveaways running. Start one with `giveaway start`.").await;
    }

    let lines: Vec<String> = giveaways
        .iter()
        .map(|g| {
            format!(
                "**{}** — {} winner(s), ends <t:{}:R> (message `{}`)",
                g.prize,
                g.winners,
                g.ends_at.timestamp(),
                g.message_id
            )
        })
        .collect();

    let embed = embeds::giveaway_embed()
        .title("Active giveaways")
        .description(lines.join("\n"));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Cancel a giveaway and remove its message.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "delete",
    category = "Giveaways",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn gw_delete(
    ctx: Context<'_>,
    #[description = "Giveaway message ID"] message_id: u64,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let Some(giveaway) =
        db::giveaways::find_by_message(&ctx.data().db, guild_id, message_id as i64).await?
    else {
        return fail(ctx, "No giveaway with that message ID.").await;
    };

    let _ = ChannelId::new(giveaway.channel_id as u64)
        .delete_message(ctx.http(), MessageId::new(giveaway.message_id as u64))
        .await;

    db::giveaways::delete(&ctx.data().db, giveaway.id).await?;
    success(ctx, format!("Giveaway for **{}** cancelled.", giveaway.prize)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_at_most_the_requested_count() {
        let entries = vec![1, 2, 3, 4, 5];
        let winners = draw_winners(&entries, 3);
        assert_eq!(winners.len(), 3);
        for winner in &winners {
            assert!(entries.contains(winner));
        }
    }

    #[test]
    fn draws_everyone_when_entries_are_short() {
        let entries = vec![1, 2];
        let winners = draw_winners(&entries, 5);
        assert_eq!(winners.len(), 2);
    }

    #[test]
    fn winners_are_unique() {
        let entries: Vec<i64> = (0..50).collect();
        let winners = draw_winners(&entries, 25);
        let mut sorted = winners.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), winners.len());
    }

    #[test]
    fn empty_entries_draw_nobody() {
        assert!(draw_winners(&[], 3).is_empty());
    }
}
