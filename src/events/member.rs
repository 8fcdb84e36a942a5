use crate::error::Error;
use crate::protection::antiraid;
use crate::utils::embeds;
use crate::{db, Data};
use serenity::all::{Context, CreateMessage, Member, RoleId};
use tracing::{info, warn};

/// New member pipeline: raid gates first, then persistent quarantine,
/// then join roles.
pub async fn member_join(ctx: &Context, data: &Data, member: &Member) -> Result<(), Error> {
    antiraid::handle_member_join(ctx, data, member).await?;

    if reapply_quarantine(ctx, data, member).await? {
        return Ok(());
    }

    assign_autoroles(ctx, data, member).await
}

/// Leaving and rejoining must not clear a quarantine; put the role back.
async fn reapply_quarantine(ctx: &Context, data: &Data, member: &Member) -> Result<bool, Error> {
    let guild_id = member.guild_id.get() as i64;
    let user_id = member.user.id.get() as i64;

    let Some(record) = db::quarantine::get(&data.db, guild_id, user_id).await? else {
        return Ok(false);
    };

    let quarantine_role = db::antinuke::load(&data.db, guild_id)
        .await?
        .and_then(|settings| settings.quarantine_role)
        .map(RoleId::new);

    let Some(role) = quarantine_role else {
        return Ok(false);
    };

    if let Err(e) = member.add_role(&ctx.http, role).await {
        warn!(error = %e, user_id, "Failed to reapply quarantine role");
        return Ok(false);
    }

    info!(guild_id, user_id, "Reapplied quarantine after rejoin");

    let guild_name = ctx
        .cache
        .guild(member.guild_id)
        .map(|g| g.name.clone())
        .unwrap_or_else(|| "this server".to_string());
    let reason = record
        .reason
        .unwrap_or_else(|| "No reason given".to_string());

    let embed = embeds::warning_embed(format!(
        "Your quarantine in **{guild_name}** is still active. Leaving and \
         rejoining does not lift it; a moderator has to."
    ))
    .field("Reason", reason, false);

    if let Err(e) = member
        .user
        .dm(&ctx.http, CreateMessage::new().embed(embed))
        .await
    {
        warn!(error = %e, user_id, "Could not DM requarantined user");
    }

    Ok(true)
}

async fn assign_autoroles(ctx: &Context, data: &Data, member: &Member) -> Result<(), Error> {
    if member.user.bot {
        return Ok(());
    }

    let role_ids = db::autoroles::list(&data.db, member.guild_id.get() as i64).await?;
    if role_ids.is_empty() {
        return Ok(());
    }

    // Roles deleted from the server get pruned from the config
    let (role_ids, stale): (Vec<i64>, Vec<i64>) = match ctx.cache.guild(member.guild_id) {
        Some(guild) => role_ids
            .into_iter()
            .partition(|id| guild.roles.contains_key(&RoleId::new(*id as u64))),
        None => (role_ids, Vec::new()),
    };
    for role_id in stale {
        db::autoroles::remove(&data.db, member.guild_id.get() as i64, role_id).await?;
    }

    let mut assigned = 0usize;
    for role_id in &role_ids {
        let role = RoleId::new(*role_id as u64);
        if let Err(e) = member.add_role(&ctx.http, role).await {
            warn!(
                user = %member.user.name,
                role_id = role.get(),
                error = %e,
                "Failed to assign auto-role"
            );
        } else {
            assigned += 1;
        }
    }

    if assigned > 0 {
        info!(
            user = %member.user.name,
            assigned,
            "Assigned auto-roles to new member"
        );
    }

    Ok(())
}
