use crate::db;
use crate::error::Error;
use serenity::all::{Context as SerenityContext, Member, RoleId, UserId};
use sqlx::PgPool;
use tracing::info;

/// Strip a member's roles, remember them, and assign the quarantine role.
/// The stored record makes the quarantine survive leave/rejoin.
pub async fn apply(
    ctx: &SerenityContext,
    db: &PgPool,
    member: &Member,
    quarantine_role: RoleId,
    moderator_id: UserId,
    reason: Option<&str>,
    source: &str,
) -> Result<(), Error> {
    let previous_roles: Vec<RoleId> = member
        .roles
        .iter()
        .copied()
        .filter(|role| *role != quarantine_role)
        .collect();

    let stored: Vec<i64> = previous_roles.iter().map(|r| r.get() as i64).collect();
    db::quarantine::upsert(
        db,
        member.guild_id.get() as i64,
        member.user.id.get() as i64,
        &stored,
        moderator_id.get() as i64,
        reason,
        source,
    )
    .await?;

    if !previous_roles.is_empty() {
        member.remove_roles(&ctx.http, &previous_roles).await?;
    }
    member.add_role(&ctx.http, quarantine_role).await?;

    info!(
        guild_id = member.guild_id.get(),
        user_id = member.user.id.get(),
        source,
        "Member quarantined"
    );

    Ok(())
}

/// Lift a quarantine: remove the role, restore the stored roles that still
/// exist, and drop the record. Returns false when no record was found.
pub async fn lift(
    ctx: &SerenityContext,
    db: &PgPool,
    member: &Member,
    quarantine_role: Option<RoleId>,
) -> Result<bool, Error> {
    let guild_id = member.guild_id.get() as i64;
    let user_id = member.user.id.get() as i64;

    let Some(record) = db::quarantine::get(db, guild_id, user_id).await? else {
        return Ok(false);
    };

    if let Some(role) = quarantine_role {
        if member.roles.contains(&role) {
            member.remove_role(&ctx.http, role).await?;
        }
    }

    let existing_roles: Vec<RoleId> = {
        match ctx.cache.guild(member.guild_id) {
            Some(guild) => record
                .previous_roles
                .iter()
                .map(|id| RoleId::new(*id as u64))
                .filter(|role| guild.roles.contains_key(role))
                .collect(),
            None => record
                .previous_roles
                .iter()
                .map(|id| RoleId::new(*id as u64))
                .collect(),
        }
    };

    if !existing_roles.is_empty() {
        member.add_roles(&ctx.http, &existing_roles).await?;
    }

    db::quarantine::delete(db, guild_id, user_id).await?;

    info!(guild_id, user_id, "Quarantine lifted");

    Ok(true)
}
