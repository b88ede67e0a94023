use std::sync::Arc;

use tokio::task::JoinSet;
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::application::interaction::Interaction;
use twilight_model::channel::message::MessageFlags;
use twilight_model::channel::Message;
use twilight_model::guild::Permissions;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_util::permission_calculator::PermissionCalculator;

use crate::commands::arg::{Arg, ArgValue};
use crate::commands::builder::{ArgDesc, CommandFunction};
use crate::commands::function::Callable;
use crate::commands::prelude::*;
use crate::utils::prelude::*;
use crate::{parser, Context};

/// Handle interaction and execute command functions.
pub async fn application_command(
    ctx: &Context,
    inter: Interaction,
    data: CommandData,
) -> CommandResult<()> {
    // Acknowledge first, so errors can be shown in place of the loading state.
    normal_acknowledge(ctx, &inter).await?;

    let inter = Arc::new(inter);
    let result = process_slash(ctx, Arc::clone(&inter), Arc::new(data)).await;

    // Catch erroneous execution and replace the dangling response.
    if let Err(e) = &result {
        let text = error_message(ctx, inter.guild_id, e);

        ctx.interaction()
            .update_response(&inter.token)
            .content(Some(text.as_str()))?
            .embeds(Some(&[]))?
            .components(Some(&[]))?
            .await
            .context("Failed to send error message")?;
    }

    result
}

/// Slash interaction commands.
async fn process_slash(
    ctx: &Context,
    inter: Arc<Interaction>,
    data: Arc<CommandData>,
) -> CommandResult<()> {
    // Lookup command from context.
    let Some(base) = ctx.commands.get(data.name.as_str()) else {
        return Err(CommandError::NotFound(data.name.clone()));
    };
    let base = Arc::clone(base);

    // Check if command should run in DMs.
    if !base.dm_enabled && inter.guild_id.is_none() {
        return Err(CommandError::Disabled);
    }

    // Discord enforces default member permissions too, but those can be overridden per guild.
    if let Some(required) = base.member_permissions {
        if inter.guild_id.is_some() && !interaction_has_permissions(&inter, required) {
            return Err(CommandError::AccessDenied);
        }
    }

    let args = data
        .options
        .iter()
        .map(|opt| {
            ArgValue::try_from(opt.value.clone())
                .map(|value| Arg {
                    name: opt.name.clone(),
                    value,
                })
                .map_err(|e| CommandError::UnexpectedArgs(format!("'{}': {e}", opt.name)))
        })
        .collect::<CommandResult<Vec<_>>>()?;

    if !base.command.has_slash() {
        return Err(anyhow::anyhow!("No slash functions for command '{}'", base.command.name).into());
    }

    let req = SlashRequest::new(Arc::clone(&base), inter, data, Args::from(args));

    debug!("Executing slash '{}'", base.command.name);

    execute(ctx, base.command.slash(), req).await
}

/// Creates a publicly visible loading state message.
async fn normal_acknowledge(ctx: &Context, inter: &Interaction) -> AnyResult<()> {
    let interaction = ctx.interaction();

    let resp = InteractionResponse {
        kind: InteractionResponseType::DeferredChannelMessageWithSource,
        data: None,
    };

    interaction
        .create_response(inter.id, &inter.token, &resp)
        .await?;

    Ok(())
}

/// Parse message and execute command functions.
pub async fn classic_command(ctx: &Context, msg: Arc<Message>) -> CommandResult<()> {
    let result = process_classic(ctx, Arc::clone(&msg)).await;

    // Handle execution result. Messages without a prefix were not meant for us.
    match &result {
        Ok(()) | Err(CommandError::NotPrefixed) => (),
        Err(e) => {
            let text = error_message(ctx, msg.guild_id, e);

            ctx.http
                .create_message(msg.channel_id)
                .reply(msg.id)
                .flags(MessageFlags::SUPPRESS_EMBEDS)
                .content(&text)?
                .await?;
        },
    }

    result
}

async fn process_classic(ctx: &Context, msg: Arc<Message>) -> CommandResult<()> {
    // Unprefix the message contents.
    let prefix = ctx.config.classic_prefix();
    let Some((_, unprefixed)) = parser::unprefix_with([prefix], &msg.content) else {
        return Err(CommandError::NotPrefixed);
    };

    // Get first possible command name.
    let (name, rest) = parser::split_once_whitespace(unprefixed);
    let name = name.to_lowercase();

    // Lookup command from context.
    let Some(base) = ctx.commands.get(&name) else {
        return Err(CommandError::NotFound(name));
    };
    let base = Arc::clone(base);

    // Check if command should run in DMs.
    if !base.dm_enabled && msg.guild_id.is_none() {
        return Err(CommandError::Disabled);
    }

    // Continue with access if there is no permission requirements.
    if let Some(perms) = base.member_permissions {
        // Return with error if the user does not have the permissions.
        if !sender_has_permissions(ctx, &msg, perms).await? {
            return Err(CommandError::AccessDenied);
        }
    }

    let args = parse_classic_args(&base.command, rest)?;

    if !base.command.has_classic() {
        return Err(anyhow::anyhow!("No classic functions for command '{name}'").into());
    }

    trace!(
        "Creating classic request for '{name}' by user '{}'",
        msg.author.id
    );

    let req = ClassicRequest::new(Arc::clone(&base), Arc::clone(&msg), args);

    debug!("Executing '{name}' by user '{}'", msg.author.id);

    let response = execute(ctx, base.command.classic(), req).await;

    trace!("Completing '{name}' by user '{}'", msg.author.id);

    response
}

/// Calculate if the message sender has the `required` permissions.
pub async fn sender_has_permissions(
    ctx: &Context,
    msg: &Message,
    required: Permissions,
) -> CommandResult<bool> {
    let Message { member: Some(member), guild_id: Some(guild_id), .. } = msg else {
        return Ok(true); // Return true if not in a guild.
    };

    // `@everyone` role id is the same as the guild's id.
    let everyone_id = guild_id.cast();

    // Permissions that are given by `@everyone` role
    let everyone_perm = ctx
        .roles_from(*guild_id, &[everyone_id])
        .await?
        .pop()
        .ok_or_else(|| anyhow::anyhow!("'@everyone' role not found"))?
        .permissions;

    // The member's assigned roles' ids.
    let roles: Vec<_> = ctx
        .roles_from(*guild_id, &member.roles)
        .await?
        .into_iter()
        // Map roles into a `PermissionCalculator` happy format.
        .map(|r| (r.id, r.permissions))
        .collect();

    // Create a calculator.
    let mut calc = PermissionCalculator::new(*guild_id, msg.author.id, everyone_perm, &roles);

    // The owner has every permission regardless of roles.
    if let Some(owner_id) = ctx.cache.guild(*guild_id).map(|g| g.owner_id()) {
        calc = calc.owner_id(owner_id);
    }

    // Get the channel in which the message was sent.
    let channel = ctx.channel_from(msg.channel_id).await?;

    // Get channel specific permission overwrites.
    let overwrites = channel.permission_overwrites.unwrap_or_default();

    Ok(calc
        .in_channel(channel.kind, &overwrites)
        .contains(required))
}

/// Returns `true` if the interaction's member has the `required` permissions.
/// Works for commands and component clicks alike.
pub fn interaction_has_permissions(inter: &Interaction, required: Permissions) -> bool {
    let granted = inter
        .member
        .as_ref()
        .and_then(|m| m.permissions)
        .unwrap_or_else(Permissions::empty);

    granted.contains(Permissions::ADMINISTRATOR) || granted.contains(required)
}

/// Parse arguments in declaration order.
/// Optional arguments may be left out from the end, and nothing may follow the last one.
fn parse_classic_args(cmd_fn: &CommandFunction, rest: Option<&str>) -> CommandResult<Args> {
    let mut parsed = Vec::new();
    let mut parser = ArgParser::new(rest);

    for desc in cmd_fn.args() {
        match parser.parse_next(desc)? {
            Some(arg) => parsed.push(arg),
            None if desc.required => return Err(CommandError::MissingArgs),
            None => break,
        }
    }

    parser::ensure_rest_is_empty(parser.rest)?;

    Ok(Args::from(parsed))
}

/// Helper type for parsing args from a chat message.
struct ArgParser<'a> {
    rest: Option<&'a str>,
}

impl<'a> ArgParser<'a> {
    const fn new(rest: Option<&'a str>) -> Self {
        Self { rest }
    }

    /// Parse the next argument, or `None` if there is no text left.
    fn parse_next(&mut self, desc: &ArgDesc) -> CommandResult<Option<Arg>> {
        let Some(unparsed) = self.rest.filter(|r| !r.trim().is_empty()) else {
            return Ok(None);
        };

        let value = if desc.kind.is_greedy() {
            self.rest = None;
            parser::greedy_arg(unparsed)?
        } else {
            let (value, next) = parser::maybe_quoted_arg(unparsed)?;
            self.rest = next;
            value
        };

        Arg::from_desc(desc, value)
            .map(Some)
            .map_err(|e| CommandError::UnexpectedArgs(format!("'{}': {e}", desc.name)))
    }
}

/// User facing text for a failed command.
fn error_message(
    ctx: &Context,
    guild_id: Option<Id<GuildMarker>>,
    error: &CommandError,
) -> String {
    let prefix = ctx.config.classic_prefix();

    match error {
        CommandError::AccessDenied => tr!(ctx, guild_id, "error.access_denied"),
        CommandError::NotFound(_) => tr!(ctx, guild_id, "error.not_found", prefix = prefix),
        CommandError::MissingArgs => tr!(ctx, guild_id, "error.missing_args", prefix = prefix),
        CommandError::Disabled => tr!(ctx, guild_id, "error.disabled"),
        CommandError::UnexpectedArgs(e) | CommandError::ParseError(e) => {
            tr!(ctx, guild_id, "error.unexpected_args", error = e)
        },
        e => {
            error!("Command failed: {e:#}");
            tr!(ctx, guild_id, "error.generic", error = e)
        },
    }
}

/// Execute tasks.
async fn execute<I, F, R>(ctx: &Context, funcs: I, req: R) -> CommandResult<()>
where
    I: Iterator<Item = F> + Send,
    F: Callable<R>,
    R: Clone + Send,
{
    let mut set = JoinSet::new();
    let mut results = Vec::new();

    for func in funcs {
        set.spawn(func.call(ctx.to_owned(), req.clone()));
    }

    // Wait for completion.
    while let Some(task) = set.join_next().await {
        results.push(task.context("Execution task join error"));
    }

    let Some(last) = results.pop() else {
        return Err(anyhow::anyhow!("No results from command handlers").into());
    };

    // Prioritize returning errors immediately.
    for r in results {
        r??;
    }

    last?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::builder::{command, string};
    use crate::commands::function::mock;

    fn parse(cmd: impl Into<BaseCommand>, text: &str) -> CommandResult<Vec<(String, String)>> {
        let base: BaseCommand = cmd.into();
        let rest = (!text.is_empty()).then_some(text);

        parse_classic_args(&base.command, rest).map(|args| {
            args.into_iter()
                .map(|a| (a.name, a.value.string().unwrap_or_default().to_string()))
                .collect()
        })
    }

    fn pair(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn optional_argument() {
        let cmd = || {
            command("build", "description")
                .attach(mock::classic)
                .option(string("template", "description"))
        };

        assert_eq!(parse(cmd(), "").unwrap(), vec![]);
        assert_eq!(parse(cmd(), "  gaming ").unwrap(), vec![pair("template", "gaming")]);
        assert_eq!(parse(cmd(), r#""my code""#).unwrap(), vec![pair("template", "my code")]);
        assert_eq!(
            parse(cmd(), "gaming extra").unwrap_err(),
            CommandError::UnexpectedArgs(String::new())
        );
    }

    #[test]
    fn greedy_argument_takes_the_rest() {
        let cmd = || {
            command("addrole", "description")
                .attach(mock::classic)
                .option(string("name", "description").required().greedy())
        };

        assert_eq!(
            parse(cmd(), "Voice Chat Regulars").unwrap(),
            vec![pair("name", "Voice Chat Regulars")]
        );
        assert_eq!(parse(cmd(), "'Mod'").unwrap(), vec![pair("name", "Mod")]);
        assert_eq!(parse(cmd(), "   ").unwrap_err(), CommandError::MissingArgs);
        assert_eq!(parse(cmd(), "").unwrap_err(), CommandError::MissingArgs);
    }

    #[test]
    fn length_limits_are_argument_errors() {
        let cmd = command("removebuild", "description")
            .attach(mock::classic)
            .option(string("code", "description").required().min_length(8).max_length(8));

        assert_eq!(
            parse(cmd, "ABC").unwrap_err(),
            CommandError::UnexpectedArgs(String::new())
        );
    }

    #[test]
    fn unclosed_quote_is_a_parse_error() {
        let cmd = command("build", "description")
            .attach(mock::classic)
            .option(string("template", "description"));

        assert_eq!(
            parse(cmd, "\"gaming").unwrap_err(),
            CommandError::ParseError(String::new())
        );
    }
}
