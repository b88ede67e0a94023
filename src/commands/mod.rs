//! Command types:
//! - Classic: Chat text message with a prefix, such as `!build gaming`.
//! - Slash: Semi-text-based interaction, such as `/build template:gaming`.
//!
//! ```text
//!     ┌─────────────────┐     ┌───────────────────┐     ┌─────────────┐
//!     │Interaction Event├────►│Application Command├────►│Slash Command├──┐
//!     └─────────────────┘     └───────────────────┘     └─────────────┘  │
//!                                                                        ▼
//!     ┌──────────────────┐    ┌───────────────┐         ┌──────────────────────────┐
//!     │Chat Message Event├───►│Classic Command├────────►│Execute Attached Functions│
//!     └──────────────────┘    └───────────────┘         └────────────┬─────────────┘
//!                                                                    │
//!                                  ┌──────────────────────────────┐  │
//!                                  │Localized Error Reply, If Any │◄─┘
//!                                  └──────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashSet};
use std::mem;
use std::sync::Arc;

use derive_more::{Index, IntoIterator};
use thiserror::Error;

use crate::commands::builder::twilight::{CommandValidationError, TwilightCommand};
use crate::commands::builder::BaseCommand;
use crate::utils::prelude::*;

pub mod arg;
pub mod bot;
pub mod builder;
pub mod function;
pub mod handle;
pub mod request;

/// Prelude module for command things.
pub mod prelude {
    pub use twilight_model::guild::Permissions;
    pub use twilight_model::id::marker::{ChannelMarker, GuildMarker, RoleMarker, UserMarker};
    pub use twilight_model::id::Id;

    pub use crate::commands::arg::Args;
    pub use crate::commands::builder::BaseCommand;
    pub use crate::commands::request::{ClassicRequest, Invocation, Responder, SlashRequest};
    pub use crate::commands::{CommandError, CommandResult};
    pub(crate) use crate::locale::tr;
    pub use crate::Context;
}

#[derive(Debug, Error)]
pub enum CommandError {
    /// A command prefix is needed.
    #[error("Message did not start with a command prefix")]
    NotPrefixed,

    /// A command does not exist.
    #[error("Command not found: {0}")]
    NotFound(String),

    /// The sender must provide some arguments.
    #[error("Expected arguments missing")]
    MissingArgs,

    /// Some arguments are wrong, invalid or unexpected.
    #[error("Arguments unexpected or failed to process: {0}")]
    UnexpectedArgs(String),

    /// Error while parsing command or argument.
    #[error("Failed to parse command or argument: {0}")]
    ParseError(String),

    /// The command or action is not available in this context.
    #[error("Command or action disabled")]
    Disabled,

    /// The sender does not have permissions needed.
    #[error("Permission requirements not met")]
    AccessDenied,

    /// Other errors that are or can be converted to `anyhow::Error`.
    #[error(transparent)]
    Other(#[from] anyhow::Error), // Source and Display delegate to `anyhow::Error`
}

impl PartialEq for CommandError {
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other) // Close enough.
    }
}

impl From<&'static str> for CommandError {
    fn from(s: &'static str) -> Self {
        Self::Other(anyhow::anyhow!(s))
    }
}

macro_rules! impl_into_command_error {
    ($out:ident; $t:ty) => {
        impl From<$t> for CommandError {
            fn from(other: $t) -> Self {
                Self::$out(other.into())
            }
        }
    };
}

impl_into_command_error!(Other; twilight_http::Error);
impl_into_command_error!(Other; twilight_http::response::DeserializeBodyError);
impl_into_command_error!(Other; twilight_validate::request::ValidationError);
impl_into_command_error!(Other; twilight_validate::message::MessageValidationError);
impl_into_command_error!(Other; twilight_validate::channel::ChannelValidationError);
impl_into_command_error!(Other; twilight_standby::future::Canceled);
impl_into_command_error!(Other; serde_json::Error);

pub type CommandResult<T = ()> = Result<T, CommandError>;

/// Newtype for commands collection.
#[derive(Debug, Default, Clone, IntoIterator, Index)]
pub struct Commands(BTreeMap<&'static str, Arc<BaseCommand>>);

impl Commands {
    /// Get base command by name.
    pub fn get(&self, id: &str) -> Option<&Arc<BaseCommand>> {
        self.0.get(id)
    }

    /// Convert commands to Discord compatible list.
    pub fn twilight_commands(&self) -> Result<Vec<TwilightCommand>, CommandValidationError> {
        self.0
            .values()
            .filter_map(|b| b.twilight_command())
            .collect()
    }

    /// Iterate commands in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<BaseCommand>> {
        self.0.values()
    }
}

/// A type for creating a collection of commands and validating them.
#[derive(Debug, Default, Clone)]
pub struct CommandsBuilder {
    list: Vec<BaseCommand>,
}

impl CommandsBuilder {
    /// Create a new list of commands.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a command to the list.
    pub fn bind(&mut self, cmd: impl Into<BaseCommand>) -> &mut Self {
        self.list.push(cmd.into());
        self
    }

    /// Validate the list of commands.
    pub fn validate(&self) -> AnyResult<()> {
        let mut set = HashSet::with_capacity(self.list.len());

        for cmd in self.list.iter() {
            // Ensure command itself is valid.
            cmd.validate()?;

            // Ensure it doesn't overlap with other commands.
            anyhow::ensure!(
                set.insert(&cmd.command.name),
                "Duplicate command found: {}",
                cmd.command.name
            );
        }

        Ok(())
    }

    /// Finalize the list of commands.
    pub fn build(self) -> Commands {
        Commands(
            self.list
                .into_iter()
                .map(|b| (b.command.name, Arc::new(b)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_compare_by_kind() {
        assert_eq!(
            CommandError::UnexpectedArgs("a".to_string()),
            CommandError::UnexpectedArgs("b".to_string())
        );
        assert_ne!(CommandError::MissingArgs, CommandError::AccessDenied);
    }

    #[test]
    fn bot_commands_are_valid() {
        let commands = bot::create_commands().unwrap();

        for name in [
            "build",
            "deletebuild",
            "savebuild",
            "builds",
            "removebuild",
            "addrole",
            "deleterole",
            "language",
            "server",
            "ping",
            "help",
        ] {
            assert!(commands.get(name).is_some(), "Missing command '{name}'");
        }

        assert_eq!(commands.twilight_commands().unwrap().len(), 11);
    }
}
