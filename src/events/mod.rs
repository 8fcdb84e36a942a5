pub mod audit_log;
pub mod member;
pub mod message;
pub mod reaction;
pub mod voice;

use crate::commands::giveaway;
use crate::error::Error;
use crate::Data;
use serenity::all::{Context, FullEvent};

/// Route gateway events to their domain handlers.
pub async fn handle_event(ctx: &Context, event: &FullEvent, data: &Data) -> Result<(), Error> {
    match event {
        FullEvent::GuildMemberAddition { new_member } => {
            member::member_join(ctx, data, new_member).await
        }
        FullEvent::Message { new_message } => message::message(ctx, data, new_message).await,
        FullEvent::MessageDelete {
            channel_id,
            deleted_message_id,
            ..
        } => message::message_delete(data, *channel_id, *deleted_message_id).await,
        FullEvent::MessageUpdate {
            old_if_available,
            new,
            ..
        } => message::message_update(data, old_if_available.as_ref(), new.as_ref()).await,
        FullEvent::GuildAuditLogEntryCreate { entry, guild_id } => {
            audit_log::handle(ctx, data, entry, *guild_id).await
        }
        FullEvent::VoiceStateUpdate { old, new } => {
            voice::voice_state_update(ctx, data, old.as_ref(), new).await
        }
        FullEvent::ReactionAdd { add_reaction } => {
            reaction::reaction_add(ctx, data, add_reaction).await
        }
        FullEvent::ReactionRemove { removed_reaction } => {
            reaction::reaction_remove(ctx, data, removed_reaction).await
        }
        FullEvent::InteractionCreate { interaction } => {
            giveaway::handle_component(ctx, data, interaction).await
        }
        _ => Ok(()),
    }
}
