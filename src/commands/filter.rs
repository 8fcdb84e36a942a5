use super::{fail, success};
use crate::db::filters::FilterSettings;
use crate::utils::embeds;
use crate::utils::permissions::is_moderator;
use crate::{db, Context, Data};
use once_cell::sync::Lazy;
use regex::Regex;
use serenity::all::{Context as SerenityContext, Message};
use tracing::warn;

type Error = crate::error::Error;

static INVITE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:discord\.(?:gg|io|me)|discord(?:app)?\.com/invite)/[a-z0-9-]+")
        .expect("invite regex is valid")
});

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)https?://\S+").expect("link regex is valid"));

/// Why a message was removed, for the notice text.
fn violation(settings: &FilterSettings, content: &str) -> Option<&'static str> {
    if settings.invites && INVITE_RE.is_match(content) {
        return Some("invite links");
    }
    if settings.links && LINK_RE.is_match(content) {
        return Some("links");
    }
    let lowered = content.to_lowercase();
    if settings
        .words
        .iter()
        .any(|word| !word.is_empty() && lowered.contains(word.as_str()))
    {
        return Some("filtered words");
    }
    None
}

/// Delete filtered messages from non-moderators. Returns true when the
/// message was removed.
pub async fn enforce(
    ctx: &SerenityContext,
    data: &Data,
    message: &Message,
) -> Result<bool, Error> {
    let Some(guild_id) = message.guild_id else {
        return Ok(false);
    };

    let settings = db::filters::load(&data.db, guild_id.get() as i64).await?;
    if !settings.invites && !settings.links && settings.words.is_empty() {
        return Ok(false);
    }

    let Some(reason) = violation(&settings, &message.content) else {
        return Ok(false);
    };

    // Moderators are exempt
    let exempt = ctx
        .cache
        .guild(guild_id)
        .and_then(|guild| {
            guild
                .members
                .get(&message.author.id)
                .map(|member| is_moderator(&guild, member))
        })
        .unwrap_or(false);
    if exempt {
        return Ok(false);
    }

    if let Err(e) = message.delete(&ctx.http).await {
        warn!(error = %e, "Failed to delete filtered message");
        return Ok(false);
    }

    let notice = format!("<@{}>, {reason} are not allowed here.", message.author.id);
    if let Ok(sent) = message.channel_id.say(&ctx.http, notice).await {
        let http = ctx.http.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            let _ = sent.delete(&http).await;
        });
    }

    Ok(true)
}

/// Automatic message filters: invites, links, and banned words.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Filters",
    required_permissions = "MANAGE_GUILD",
    subcommands("invites", "links", "word", "status")
)]
pub async fn filter(ctx: Context<'_>) -> Result<(), Error> {
    status_inner(ctx).await
}

async fn toggle_flag(ctx: Context<'_>, state: String, which: &str) -> Result<(), Error> {
    let enabled = match state.trim().to_lowercase().as_str() {
        "on" => true,
        "off" => false,
        _ => return fail(ctx, "Say `on` or `off`.").await,
    };

    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let mut settings = db::filters::load(&ctx.data().db, guild_id).await?;
    match which {
        "invites" => settings.invites = enabled,
        _ => settings.links = enabled,
    }
    db::filters::save(&ctx.data().db, guild_id, &settings).await?;

    success(
        ctx,
        format!(
            "The {which} filter is now **{}**.",
            if enabled { "on" } else { "off" }
        ),
    )
    .await
}

/// Block Discord invite links.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Filters",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn invites(
    ctx: Context<'_>,
    #[description = "on or off"] state: String,
) -> Result<(), Error> {
    toggle_flag(ctx, state, "invites").await
}

/// Block all links.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Filters",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn links(
    ctx: Context<'_>,
    #[description = "on or off"] state: String,
) -> Result<(), Error> {
    toggle_flag(ctx, state, "links").await
}

/// Manage the banned-word list.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Filters",
    required_permissions = "MANAGE_GUILD",
    subcommands("word_add", "word_remove", "word_list")
)]
pub async fn word(ctx: Context<'_>) -> Result<(), Error> {
    word_list_inner(ctx).await
}

/// Ban a word or phrase.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "add",
    category = "Filters",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn word_add(
    ctx: Context<'_>,
    #[description = "Word or phrase to block"]
    #[rest]
    word: String,
) -> Result<(), Error> {
    let word = word.trim().to_lowercase();
    if word.is_empty() || word.len() > 100 {
        return fail(ctx, "Filtered words must be 1-100 characters.").await;
    }

    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let mut settings = db::filters::load(&ctx.data().db, guild_id).await?;
    if settings.words.contains(&word) {
        return fail(ctx, format!("`{word}` is already filtered.")).await;
    }
    settings.words.push(word.clone());
    db::filters::save(&ctx.data().db, guild_id, &settings).await?;

    success(ctx, format!("`{word}` added to the word filter.")).await
}

/// Unban a word or phrase.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "remove",
    category = "Filters",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn word_remove(
    ctx: Context<'_>,
    #[description = "Word or phrase to unblock"]
    #[rest]
    word: String,
) -> Result<(), Error> {
    let word = word.trim().to_lowercase();

    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let mut settings = db::filters::load(&ctx.data().db, guild_id).await?;
    let before = settings.words.len();
    settings.words.retain(|w| *w != word);

    if settings.words.len() == before {
        return fail(ctx, format!("`{word}` is not filtered.")).await;
    }
    db::filters::save(&ctx.data().db, guild_id, &settings).await?;

    success(ctx, format!("`{word}` removed from the word filter.")).await
}

/// List filtered words.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "list",
    category = "Filters",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn word_list(ctx: Context<'_>) -> Result<(), Error> {
    word_list_inner(ctx).await
}

async fn word_list_inner(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let settings = db::filters::load(&ctx.data().db, guild_id).await?;

    if settings.words.is_empty() {
        return fail(ctx, "No words filtered. Add one with `filter word add`.").await;
    }

    let words: Vec<String> = settings.words.iter().map(|w| format!("`{w}`")).collect();
    let embed = embeds::info_embed()
        .title(format!("Filtered words ({})", words.len()))
        .description(words.join(", "));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show the current filter configuration.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Filters",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    status_inner(ctx).await
}

async fn status_inner(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().unwrap().get() as i64;
    let settings = db::filters::load(&ctx.data().db, guild_id).await?;

    let embed = embeds::info_embed()
        .title("Message filters")
        .field("Invites", if settings.invites { "on" } else { "off" }, true)
        .field("Links", if settings.links { "on" } else { "off" }, true)
        .field("Words", settings.words.len().to_string(), true);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(invites: bool, links: bool, words: &[&str]) -> FilterSettings {
        FilterSettings {
            invites,
            links,
            words: words.iter().map(|w| w.to_string()).collect(),
        }
    }

    #[test]
    fn detects_invite_links() {
        let s = settings(true, false, &[]);
        assert_eq!(
            violation(&s, "join us at discord.gg/abc123"),
            Some("invite links")
        );
        assert_eq!(
            violation(&s, "https://discordapp.com/invite/xyz"),
            Some("invite links")
        );
        assert_eq!(violation(&s, "no invite here"), None);
    }

    #[test]
    fn detects_links_only_when_enabled() {
        let off = settings(false, false, &[]);
        assert_eq!(violation(&off, "see https://example.com"), None);

        let on = settings(false, true, &[]);
        assert_eq!(violation(&on, "see https://example.com"), Some("links"));
        assert_eq!(violation(&on, "see http://example.com"), Some("links"));
    }

    #[test]
    fn detects_banned_words_case_insensitively() {
        let s = settings(false, false, &["crypto"]);
        assert_eq!(violation(&s, "free CRYPTO drop"), Some("filtered words"));
        assert_eq!(violation(&s, "nothing to see"), None);
    }

    #[test]
    fn invite_filter_wins_over_link_filter() {
        let s = settings(true, true, &[]);
        assert_eq!(
            violation(&s, "https://discord.gg/abc"),
            Some("invite links")
        );
    }
}
