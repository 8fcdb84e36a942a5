pub mod afk;
pub mod antinuke;
pub mod antiraid;
pub mod autorole;
pub mod cases;
pub mod filter;
pub mod general;
pub mod giveaway;
pub mod moderation;
pub mod reactionroles;
pub mod settings;
pub mod snipe;
pub mod sticky;
pub mod tags;
pub mod voicemaster;

use crate::error::Error;
use crate::utils::embeds;
use crate::{Context, Data};

pub fn load_all() -> Vec<poise::Command<Data, Error>> {
    vec![
        general::ping(),
        general::about(),
        general::server(),
        general::help(),
        settings::prefix(),
        settings::modlog(),
        settings::blacklist(),
        moderation::kick(),
        moderation::ban(),
        moderation::unban(),
        moderation::softban(),
        moderation::timeout(),
        moderation::untimeout(),
        moderation::warn(),
        moderation::warns(),
        moderation::purge(),
        moderation::slowmode(),
        moderation::lock(),
        moderation::unlock(),
        moderation::quarantine(),
        moderation::unquarantine(),
        cases::case(),
        cases::history(),
        antinuke::antinuke(),
        antiraid::antiraid(),
        voicemaster::voicemaster(),
        tags::tag(),
        giveaway::giveaway(),
        reactionroles::reactionrole(),
        afk::afk(),
        snipe::snipe(),
        snipe::editsnipe(),
        snipe::snipelist(),
        snipe::clearsnipe(),
        autorole::autorole(),
        filter::filter(),
        sticky::sticky(),
    ]
}

/// Reply with a green check embed.
pub(crate) async fn success(ctx: Context<'_>, text: impl Into<String>) -> Result<(), Error> {
    let embed = embeds::success_embed(format!("✅ {}", text.into()));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Reply with a red cross embed.
pub(crate) async fn fail(ctx: Context<'_>, text: impl Into<String>) -> Result<(), Error> {
    let embed = embeds::error_embed(format!("❌ {}", text.into()));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
