use crate::commands::handle;
use crate::commands::prelude::*;
use crate::utils::nice_list;
use crate::utils::prelude::*;

/// Command: Show or change the reply language of the server.
pub struct Language;

impl Language {
    pub fn command() -> impl Into<BaseCommand> {
        use crate::commands::builder::*;

        command("language", "Show or change the bot language.")
            .attach(Self::classic)
            .attach(Self::slash)
            .option(string("language", "Language tag, such as 'en'.").max_length(16))
    }

    async fn uber(
        ctx: &Context,
        inv: Invocation,
        mut out: Responder,
        args: &Args,
        is_admin: bool,
    ) -> CommandResult {
        let guild_id = inv.guild()?;
        let available = nice_list(&ctx.locales.languages());

        let Ok(language) = args.string("language") else {
            let current = ctx.languages.get(inv.guild_id);
            out.text(
                ctx,
                &tr!(ctx, inv.guild_id, "language.current", language = current, available = available),
            )
            .await?;
            return Ok(());
        };

        // Anyone can look, only administrators can change.
        if !is_admin {
            return Err(CommandError::AccessDenied);
        }

        let language = language.to_lowercase();
        if !ctx.locales.supports(&language) {
            out.text(
                ctx,
                &tr!(ctx, inv.guild_id, "language.unknown", language = language, available = available),
            )
            .await?;
            return Ok(());
        }

        ctx.languages.set(guild_id, language.as_str());
        info!("Guild {guild_id} language set to '{language}'");

        out.text(ctx, &tr!(ctx, inv.guild_id, "language.set", language = language))
            .await?;

        Ok(())
    }

    async fn classic(ctx: Context, req: ClassicRequest) -> CommandResult {
        let is_admin =
            handle::sender_has_permissions(&ctx, &req.message, Permissions::ADMINISTRATOR).await?;

        Self::uber(&ctx, req.invocation(), req.responder(), &req.args, is_admin).await
    }

    async fn slash(ctx: Context, req: SlashRequest) -> CommandResult {
        let is_admin =
            handle::interaction_has_permissions(&req.interaction, Permissions::ADMINISTRATOR);

        Self::uber(&ctx, req.invocation()?, req.responder(), &req.args, is_admin).await
    }
}
