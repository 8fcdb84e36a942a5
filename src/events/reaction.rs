use crate::error::Error;
use crate::{db, Data};
use serenity::all::{Context, Reaction, ReactionType, RoleId};
use tracing::warn;

/// Stable key for an emoji binding: unicode glyph or custom-emoji ID.
pub fn emoji_key(emoji: &ReactionType) -> String {
    match emoji {
        ReactionType::Unicode(glyph) => glyph.clone(),
        ReactionType::Custom { id, .. } => id.to_string(),
        _ => String::new(),
    }
}

pub async fn reaction_add(ctx: &Context, data: &Data, reaction: &Reaction) -> Result<(), Error> {
    let Some((guild_id, user_id)) = reaction.guild_id.zip(reaction.user_id) else {
        return Ok(());
    };
    if user_id == ctx.cache.current_user().id {
        return Ok(());
    }
    if reaction.member.as_ref().is_some_and(|m| m.user.bot) {
        return Ok(());
    }

    let key = emoji_key(&reaction.emoji);
    let Some(binding) =
        db::reaction_roles::find(&data.db, reaction.message_id.get() as i64, &key).await?
    else {
        return Ok(());
    };

    if let Err(e) = ctx
        .http
        .add_member_role(
            guild_id,
            user_id,
            RoleId::new(binding.role_id as u64),
            Some("Reaction role"),
        )
        .await
    {
        warn!(error = %e, user_id = user_id.get(), "Failed to grant reaction role");
    }

    Ok(())
}

pub async fn reaction_remove(ctx: &Context, data: &Data, reaction: &Reaction) -> Result<(), Error> {
    let Some((guild_id, user_id)) = reaction.guild_id.zip(reaction.user_id) else {
        return Ok(());
    };
    if user_id == ctx.cache.current_user().id {
        return Ok(());
    }

    let key = emoji_key(&reaction.emoji);
    let Some(binding) =
        db::reaction_roles::find(&data.db, reaction.message_id.get() as i64, &key).await?
    else {
        return Ok(());
    };

    if let Err(e) = ctx
        .http
        .remove_member_role(
            guild_id,
            user_id,
            RoleId::new(binding.role_id as u64),
            Some("Reaction role removed"),
        )
        .await
    {
        warn!(error = %e, user_id = user_id.get(), "Failed to revoke reaction role");
    }

    Ok(())
}
