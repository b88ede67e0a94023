use thiserror::Error;
use twilight_model::application::command::{Command, CommandOption, CommandType};
use twilight_util::builder::command::{CommandBuilder, StringBuilder};

use crate::commands::builder::{ArgDesc, ArgKind, BaseCommand};
use crate::utils::prelude::*;

pub type TwilightCommand = Command;

/// Helper trait for twilight builders where the value may be optional.
/// This trait lets you apply the optional value if it is present,
/// otherwise preserve the builder default.
trait Optional: Sized {
    /// Apply a function only if `value` is `Some`.
    fn optional<F, A>(mut self, value: Option<A>, func: F) -> Self
    where
        F: Fn(Self, A) -> Self,
    {
        if let Some(value) = value {
            self = func(self, value);
        }
        self
    }
}

impl<T> Optional for T {}

/// Validates options in the command.
pub fn validate_command(cmd: &Command) -> Result<(), CommandValidationError> {
    use twilight_validate::command as validate;

    /// Checks for local multiples of same option names.
    fn validate_options(options: &[CommandOption]) -> Result<(), CommandValidationError> {
        options.iter().enumerate().try_for_each(|(idx, opt)| {
            // All the rest of the options must not have this name.
            if let Some(slice) = options.get(idx + 1..) {
                if slice.iter().any(|c| c.name == opt.name) {
                    return Err(CommandValidationError::AmbiguousName(format!(
                        "Duplicate name '{}' in option of kind '{}'",
                        opt.name,
                        opt.kind.kind()
                    )));
                }
            }

            Ok(())
        })
    }

    // Does not check for options.
    validate::command(cmd).context("Base command error")?;

    // This checks for order, limit, name and description validity.
    // Does not check for ambiguity.
    validate::options(&cmd.options).context("Command options error")?;

    validate_options(&cmd.options)?;

    Ok(())
}

#[derive(Debug, Error)]
pub enum CommandValidationError {
    /// Multiple uses of same option name.
    #[error("Option names must be locally unique: {0}")]
    AmbiguousName(String),

    /// A greedy argument followed by other arguments.
    #[error("Greedy argument '{0}' must be the last one")]
    GreedyNotLast(String),

    /// Twilight's validation error.
    #[error(transparent)]
    Twilight(#[from] twilight_validate::command::CommandValidationError),

    /// Other errors that are or can be converted to `anyhow::Error`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub struct SlashCommand(Command);

impl TryFrom<BaseCommand> for SlashCommand {
    type Error = CommandValidationError;

    fn try_from(value: BaseCommand) -> Result<Self, Self::Error> {
        let mut cmd = CommandBuilder::new(
            value.command.name,
            value.command.description,
            CommandType::ChatInput,
        )
        .dm_permission(value.dm_enabled)
        .optional(value.member_permissions, |b, p| {
            b.default_member_permissions(p)
        });

        for opt in value.command.options {
            cmd = cmd.option(CommandOption::from(opt));
        }

        let cmd = cmd.build();

        validate_command(&cmd).context("Failed to validate slash command")?;

        Ok(Self(cmd))
    }
}

impl From<SlashCommand> for Command {
    fn from(value: SlashCommand) -> Self {
        value.0
    }
}

impl From<ArgDesc> for CommandOption {
    fn from(value: ArgDesc) -> Self {
        match value.kind {
            ArgKind::String(d) => StringBuilder::new(value.name, value.description)
                .required(value.required)
                .optional(d.min_length, |b, v| b.min_length(v))
                .optional(d.max_length, |b, v| b.max_length(v))
                .build(),
        }
    }
}
