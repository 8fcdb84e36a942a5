use crate::Context;
use serenity::all::{Guild, Member, Permissions, UserId};

/// Check if a member has moderator-level permissions.
pub fn is_moderator(guild: &Guild, member: &Member) -> bool {
    let perms = member_permissions(guild, member);
    perms.kick_members() || perms.ban_members() || perms.manage_messages()
}

/// Check if a member has admin-level permissions.
pub fn is_admin(guild: &Guild, member: &Member) -> bool {
    member_permissions(guild, member).administrator()
}

/// Guild-level permissions resolved from roles; `member.permissions` is only
/// populated on interaction payloads.
pub fn member_permissions(guild: &Guild, member: &Member) -> Permissions {
    guild.member_permissions(member)
}

/// Position of a member's highest role; 0 for @everyone only.
pub fn top_role_position(guild: &Guild, member: &Member) -> u16 {
    guild
        .member_highest_role(member)
        .map(|role| role.position)
        .unwrap_or(0)
}

/// Whether the bot out-ranks the target enough to act on them.
/// Unknown bot member (not yet cached) is treated as actionable; the API
/// call will fail cleanly if it is not.
pub fn can_bot_act(guild: &Guild, bot_id: UserId, target: &Member) -> bool {
    if target.user.id == guild.owner_id {
        return false;
    }
    match guild.members.get(&bot_id) {
        Some(bot_member) => top_role_position(guild, bot_member) > top_role_position(guild, target),
        None => true,
    }
}

/// Run the standard moderation hierarchy checks against a target.
///
/// Returns a user-facing refusal when the author may not act: self-targeting,
/// bot targets, the guild owner, or a target at or above the author's or the
/// bot's highest role.
pub async fn hierarchy_error(ctx: &Context<'_>, target: &Member, action: &str) -> Option<String> {
    if target.user.id == ctx.author().id {
        return Some(format!("You can't {action} yourself."));
    }
    if target.user.bot {
        return Some(format!("You can't {action} a bot."));
    }

    let author_member = ctx.author_member().await;
    let bot_id = ctx.framework().bot_id;

    let guild = ctx.guild()?;

    if target.user.id == guild.owner_id {
        return Some(format!("You can't {action} the server owner."));
    }

    if let Some(author) = author_member.as_deref() {
        if author.user.id != guild.owner_id
            && top_role_position(&guild, author) <= top_role_position(&guild, target)
        {
            return Some(format!(
                "You can't {action} someone with a role equal to or above yours."
            ));
        }
    }

    if !can_bot_act(&guild, bot_id, target) {
        return Some(format!(
            "I can't {action} that member; their highest role is at or above mine."
        ));
    }

    None
}
