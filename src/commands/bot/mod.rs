/*!
Command template:
```ignore
pub struct Command;

impl Command {
    pub fn command() -> impl Into<BaseCommand> {
        use crate::commands::builder::*;

        command("cmd", "Thing.")
            .attach(Self::classic)
            .attach(Self::slash)
    }

    async fn classic(ctx: Context, req: ClassicRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation(), req.responder()).await
    }

    async fn slash(ctx: Context, req: SlashRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation()?, req.responder()).await
    }
}
```
*/
use twilight_model::id::marker::GuildMarker;
use twilight_model::id::Id;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFooterBuilder};

use crate::commands::{Commands, CommandsBuilder};
use crate::locale::tr;
use crate::utils::prelude::*;
use crate::Context;

/// Generic commands.
pub mod meta;

/// Server building and moderation commands.
pub mod admin;

/// Create the list of bot commands.
pub fn create_commands() -> AnyResult<Commands> {
    let mut commands = CommandsBuilder::new();

    // Basic functionality.
    commands
        .bind(meta::Ping::command())
        .bind(meta::Help::command())
        .bind(meta::Server::command())
        .bind(meta::Language::command());

    // Server structure.
    commands
        .bind(admin::build::Build::command())
        .bind(admin::build::DeleteBuild::command())
        .bind(admin::build::SaveBuild::command())
        .bind(admin::build::Builds::command())
        .bind(admin::build::RemoveBuild::command());

    // Roles.
    commands
        .bind(admin::roles::AddRole::command())
        .bind(admin::roles::DeleteRole::command());

    commands
        .validate()
        .context("Failed to validate commands list")?;

    Ok(commands.build())
}

/// Reply embed with the version footer.
pub fn embed(
    ctx: &Context,
    guild_id: Option<Id<GuildMarker>>,
    title: impl Into<String>,
    description: impl Into<String>,
    color: u32,
) -> EmbedBuilder {
    let footer = tr!(ctx, guild_id, "footer", version = env!("CARGO_PKG_VERSION"));

    EmbedBuilder::new()
        .title(title)
        .description(description)
        .color(color)
        .footer(EmbedFooterBuilder::new(footer))
}
