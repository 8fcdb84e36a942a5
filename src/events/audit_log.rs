use crate::error::Error;
use crate::protection::antinuke::{self, MonitoredAction};
use crate::Data;
use serenity::all::{AuditLogEntry, Context, GuildId};
use serenity::model::guild::audit_log::{Action, ChannelAction, MemberAction, RoleAction, WebhookAction};

/// Attribute sensitive administrative actions to their executor as they land
/// in the audit log, and feed them to the anti-nuke engine.
pub async fn handle(
    ctx: &Context,
    data: &Data,
    entry: &AuditLogEntry,
    guild_id: GuildId,
) -> Result<(), Error> {
    let Some(action) = map_action(&entry.action) else {
        return Ok(());
    };

    let target_id = entry.target_id.map(|id| id.get());

    antinuke::handle_audit_action(ctx, data, guild_id, entry.user_id, action, target_id).await
}

fn map_action(action: &Action) -> Option<MonitoredAction> {
    match action {
        Action::Member(MemberAction::BanAdd) => Some(MonitoredAction::BanMembers),
        Action::Member(MemberAction::Kick) => Some(MonitoredAction::KickMembers),
        Action::Member(MemberAction::BotAdd) => Some(MonitoredAction::AddBot),
        Action::Channel(ChannelAction::Create) => Some(MonitoredAction::CreateChannels),
        Action::Channel(ChannelAction::Delete) => Some(MonitoredAction::DeleteChannels),
        Action::Role(RoleAction::Create) => Some(MonitoredAction::CreateRoles),
        Action::Role(RoleAction::Delete) => Some(MonitoredAction::DeleteRoles),
        Action::Webhook(WebhookAction::Create) => Some(MonitoredAction::CreateWebhooks),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_monitored_audit_actions() {
        assert_eq!(
            map_action(&Action::Member(MemberAction::BanAdd)),
            Some(MonitoredAction::BanMembers)
        );
        assert_eq!(
            map_action(&Action::Channel(ChannelAction::Delete)),
            Some(MonitoredAction::DeleteChannels)
        );
        assert_eq!(
            map_action(&Action::Webhook(WebhookAction::Create)),
            Some(MonitoredAction::CreateWebhooks)
        );
    }

    #[test]
    fn ignores_unmonitored_audit_actions() {
        assert_eq!(map_action(&Action::Member(MemberAction::Update)), None);
        assert_eq!(map_action(&Action::Channel(ChannelAction::Update)), None);
        assert_eq!(map_action(&Action::Webhook(WebhookAction::Update)), None);
    }
}
