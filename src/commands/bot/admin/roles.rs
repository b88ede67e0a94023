use twilight_mention::Mention;
use twilight_util::builder::embed::EmbedFieldBuilder;

use crate::commands::bot::embed;
use crate::commands::prelude::*;
use crate::guild::twilight::HttpGuild;
use crate::guild::{GuildClient, RoleInfo};
use crate::structure;
use crate::utils::prelude::*;
use crate::utils::{consts, escape_discord_chars};

/// Permissions given to roles created with `addrole`.
const MEMBER_PERMISSIONS: &[&str] = &["send_messages", "read_message_history", "connect", "speak"];

/// Command: Create a role with basic member permissions.
pub struct AddRole;

impl AddRole {
    pub fn command() -> impl Into<BaseCommand> {
        use crate::commands::builder::*;

        command("addrole", "Create a role with basic member permissions.")
            .attach(Self::classic)
            .attach(Self::slash)
            .permissions(Permissions::MANAGE_ROLES)
            .option(
                string("name", "Name of the role.")
                    .required()
                    .greedy()
                    .max_length(100),
            )
    }

    async fn uber(ctx: &Context, inv: Invocation, mut out: Responder, args: &Args) -> CommandResult {
        let guild_id = inv.guild()?;
        let g = inv.guild_id;
        let name = args.string("name")?;

        let permissions = MEMBER_PERMISSIONS
            .iter()
            .filter_map(|p| structure::permission(p))
            .fold(Permissions::empty(), |acc, p| acc | p);

        let guild = HttpGuild::new(&ctx.http, guild_id, "Role created with addrole");

        let role_id = match guild.create_role(name, permissions).await {
            Ok(id) => id,
            Err(e) => {
                warn!("Failed to create role '{name}' in guild {guild_id}: {e:#}");
                out.text(ctx, &tr!(ctx, g, "addrole.failed", error = e))
                    .await?;
                return Ok(());
            },
        };

        info!("User {} created role '{name}' in guild {guild_id}", inv.user_id);

        let embed = embed(
            ctx,
            g,
            tr!(ctx, g, "addrole.title"),
            tr!(ctx, g, "addrole.description", name = escape_discord_chars(name)),
            consts::COLOR_OK,
        )
        .field(EmbedFieldBuilder::new(tr!(ctx, g, "field.role"), role_id.mention().to_string()).inline())
        .field(
            EmbedFieldBuilder::new(tr!(ctx, g, "field.created_by"), inv.user_id.mention().to_string())
                .inline(),
        )
        .build();

        out.embeds(ctx, &[embed], &[]).await?;

        Ok(())
    }

    async fn classic(ctx: Context, req: ClassicRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation(), req.responder(), &req.args).await
    }

    async fn slash(ctx: Context, req: SlashRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation()?, req.responder(), &req.args).await
    }
}

/// Command: Delete a role by name.
pub struct DeleteRole;

impl DeleteRole {
    pub fn command() -> impl Into<BaseCommand> {
        use crate::commands::builder::*;

        command("deleterole", "Delete a role by its name.")
            .attach(Self::classic)
            .attach(Self::slash)
            .permissions(Permissions::MANAGE_ROLES)
            .option(
                string("name", "Name of the role.")
                    .required()
                    .greedy()
                    .max_length(100),
            )
    }

    async fn uber(ctx: &Context, inv: Invocation, mut out: Responder, args: &Args) -> CommandResult {
        let guild_id = inv.guild()?;
        let g = inv.guild_id;
        let name = args.string("name")?;

        let guild = HttpGuild::new(&ctx.http, guild_id, "Role deleted with deleterole");
        let roles = guild.roles().await?;

        let Some(role) = find_role(&roles, guild.everyone_role(), name) else {
            let text = tr!(ctx, g, "deleterole.not_found", name = escape_discord_chars(name));
            out.text(ctx, &text).await?;
            return Ok(());
        };

        let bot_top = guild.top_role_of(ctx.user.id).await?;
        if !is_below(role, bot_top.as_ref()) {
            out.text(ctx, &tr!(ctx, g, "deleterole.too_high")).await?;
            return Ok(());
        }

        if let Err(e) = guild.delete_role(role.id).await {
            warn!("Failed to delete role '{name}' in guild {guild_id}: {e:#}");
            out.text(ctx, &tr!(ctx, g, "deleterole.failed", error = e))
                .await?;
            return Ok(());
        }

        info!("User {} deleted role '{name}' in guild {guild_id}", inv.user_id);

        let embed = embed(
            ctx,
            g,
            tr!(ctx, g, "deleterole.title"),
            tr!(ctx, g, "deleterole.description", name = escape_discord_chars(&role.name)),
            consts::COLOR_OK,
        )
        .field(EmbedFieldBuilder::new(
            tr!(ctx, g, "field.deleted_by"),
            inv.user_id.mention().to_string(),
        ))
        .build();

        out.embeds(ctx, &[embed], &[]).await?;

        Ok(())
    }

    async fn classic(ctx: Context, req: ClassicRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation(), req.responder(), &req.args).await
    }

    async fn slash(ctx: Context, req: SlashRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation()?, req.responder(), &req.args).await
    }
}

/// First role with exactly `name`, in the guild's role order. Never `@everyone`.
fn find_role<'a>(roles: &'a [RoleInfo], everyone: Id<RoleMarker>, name: &str) -> Option<&'a RoleInfo> {
    let mut roles: Vec<_> = roles.iter().filter(|r| r.id != everyone).collect();
    roles.sort_by_key(|r| (r.position, r.id));
    roles.into_iter().find(|r| r.name == name)
}

/// Returns `true` if `role` is strictly below the bot's top role.
fn is_below(role: &RoleInfo, bot_top: Option<&RoleInfo>) -> bool {
    bot_top.map_or(false, |top| role.position < top.position)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(id: u64, name: &str, position: i64) -> RoleInfo {
        RoleInfo {
            id: Id::new(id),
            name: name.to_string(),
            permissions: Permissions::empty(),
            position,
        }
    }

    #[test]
    fn finds_first_exact_match() {
        let roles = vec![
            role(1, "@everyone", 0),
            role(5, "Mod", 3),
            role(4, "Mod", 2),
            role(3, "mod", 1),
        ];

        assert_eq!(find_role(&roles, Id::new(1), "Mod").map(|r| r.id), Some(Id::new(4)));
        assert_eq!(find_role(&roles, Id::new(1), "mod").map(|r| r.id), Some(Id::new(3)));
        assert!(find_role(&roles, Id::new(1), "@everyone").is_none());
        assert!(find_role(&roles, Id::new(1), "Admin").is_none());
    }

    #[test]
    fn only_roles_below_the_bot() {
        let bot = role(9, "Bot", 5);

        assert!(is_below(&role(2, "Member", 4), Some(&bot)));
        assert!(!is_below(&role(2, "Peer", 5), Some(&bot)));
        assert!(!is_below(&role(2, "Owner", 6), Some(&bot)));
        assert!(!is_below(&role(2, "Member", 1), None));
    }

    #[test]
    fn member_permissions_are_known() {
        for name in MEMBER_PERMISSIONS {
            assert!(structure::permission(name).is_some(), "Unknown permission '{name}'");
        }
    }
}
