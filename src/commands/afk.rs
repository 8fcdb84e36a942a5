use super::fail;
use crate::cache::AfkEntry;
use crate::utils::embeds;
use crate::{db, Context};
use chrono::Utc;

type Error = crate::error::Error;

const MAX_REASON_LEN: usize = 100;

/// Mark yourself AFK; the bot tells people who mention you.
#[poise::command(slash_command, prefix_command, guild_only, category = "Utility")]
pub async fn afk(
    ctx: Context<'_>,
    #[description = "Why you're away"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get();
    let user_id = ctx.author().id.get();

    if db::afk::get(&ctx.data().db, guild_id as i64, user_id as i64)
        .await?
        .is_some()
    {
        return fail(ctx, "You're already AFK. Send any message to clear it.").await;
    }

    let reason = crate::utils::text::truncate(
        &reason.unwrap_or_else(|| "AFK".to_string()),
        MAX_REASON_LEN,
    );

    db::afk::set(&ctx.data().db, guild_id as i64, user_id as i64, &reason).await?;
    ctx.data()
        .cache
        .set_afk(
            guild_id,
            user_id,
            &AfkEntry {
                reason: reason.clone(),
                since: Utc::now(),
            },
        )
        .await;

    let embed = embeds::info_embed()
        .title("AFK enabled")
        .description("You're now marked as away.")
        .field("Reason", reason, false)
        .footer(serenity::all::CreateEmbedFooter::new(
            "Send any message to clear your AFK status",
        ));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
