use std::time::Instant;

use indoc::formatdoc;
use twilight_util::builder::embed::EmbedFieldBuilder;

use crate::commands::bot::embed;
use crate::commands::prelude::*;
use crate::utils::consts;
use crate::utils::prelude::*;

/// Command: Ping Pong!
pub struct Ping;

impl Ping {
    pub fn command() -> impl Into<BaseCommand> {
        use crate::commands::builder::*;

        command("ping", "Check the bot latency.")
            .attach(Self::classic)
            .attach(Self::slash)
            .dm()
    }

    async fn uber(ctx: &Context, inv: Invocation, mut out: Responder) -> CommandResult {
        // Round trip of a lightweight request.
        let start = Instant::now();
        ctx.http.current_user().await?;
        let latency = start.elapsed().as_millis();

        let embed = embed(
            ctx,
            inv.guild_id,
            tr!(ctx, inv.guild_id, "ping.title"),
            tr!(
                ctx,
                inv.guild_id,
                "ping.description",
                latency = latency,
                version = env!("CARGO_PKG_VERSION"),
            ),
            consts::COLOR_OK,
        )
        .build();

        out.embeds(ctx, &[embed], &[]).await?;

        Ok(())
    }

    async fn classic(ctx: Context, req: ClassicRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation(), req.responder()).await
    }

    async fn slash(ctx: Context, req: SlashRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation()?, req.responder()).await
    }
}

/// Command: Help for using the bot, commands and templates.
pub struct Help;

impl Help {
    pub fn command() -> impl Into<BaseCommand> {
        use crate::commands::builder::*;

        command("help", "List bot commands and templates.")
            .attach(Self::classic)
            .attach(Self::slash)
            .dm()
    }

    async fn uber(ctx: &Context, inv: Invocation, mut out: Responder) -> CommandResult {
        let prefix = ctx.config.classic_prefix();

        let commands = ctx
            .commands
            .iter()
            .map(|c| format!("`{prefix}{}` - {}", c.usage(), c.command.description))
            .collect::<Vec<_>>()
            .join("\n");

        let templates = if ctx.templates.is_empty() {
            tr!(ctx, inv.guild_id, "templates.empty")
        } else {
            ctx.templates
                .iter()
                .map(|(name, _)| format!("`{name}`"))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let description = formatdoc!(
            "
            {intro}

            {commands}",
            intro = tr!(ctx, inv.guild_id, "help.description", prefix = prefix),
        );

        let embed = embed(
            ctx,
            inv.guild_id,
            tr!(ctx, inv.guild_id, "help.title"),
            description,
            consts::COLOR_OK,
        )
        .field(EmbedFieldBuilder::new(
            tr!(ctx, inv.guild_id, "help.templates"),
            templates,
        ))
        .build();

        out.embeds(ctx, &[embed], &[]).await?;

        Ok(())
    }

    async fn classic(ctx: Context, req: ClassicRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation(), req.responder()).await
    }

    async fn slash(ctx: Context, req: SlashRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation()?, req.responder()).await
    }
}
