//! Bot command builders.
//!
//! # Overview
//!
//! ### Base command creation:
//! ```text
//! fn command("name", "description") -> BaseCommandBuilder
//! ```
//!
//! ### Command parameter options:
//! ```text
//! fn string("name", "description") -> StringOptionBuilder
//! ```
//!

use derive_more::Display;
use futures::Future;
pub use twilight_model::guild::Permissions;

use crate::commands::builder::twilight::{CommandValidationError, SlashCommand, TwilightCommand};
use crate::commands::function::{ClassicFunction, Function, IntoFunction, SlashFunction};
use crate::commands::CommandResult;
use crate::utils::prelude::*;
use crate::Context;

pub mod twilight;

/// Create a new base command.
pub fn command(name: &'static str, description: &'static str) -> BaseCommandBuilder {
    BaseCommandBuilder::new(name, description)
}

/// Create a new argument with kind `String`.
pub fn string(name: &'static str, description: &'static str) -> StringOptionBuilder {
    StringOptionBuilder::new(name, description)
}

/// Helper macro to implement common methods for data builder.
/// This assumes `data` type implements `Default`.
macro_rules! impl_data_builder {
    (
        $( #[$new_meta:meta] )*
        $vis:vis fn new(..) -> Self( $variant:ident ( $data:ty ) )
    ) => {
        $( #[$new_meta] )*
        $vis fn new(name: &'static str, description: &'static str) -> Self {
            Self(ArgDesc::new(
                name,
                description,
                ArgKind::$variant( <$data>::default() ) ,
            ))
        }

        /// Set argument to be required. All required arguments must be before any optional ones.
        $vis const fn required(mut self) -> Self {
            self.0.required = true;
            self
        }

        /// Finalize the argument.
        $vis fn build(self) -> ArgDesc {
            self.0
        }

        /// Get inner data struct.
        #[allow(irrefutable_let_patterns)]
        fn inner_mut(&mut self) -> &mut $data {
            let ArgKind::$variant(ref mut data) = self.0.kind else { unreachable!() };
            data
        }
    }
}

#[derive(Debug, Clone)]
pub struct StringOptionBuilder(ArgDesc);

impl StringOptionBuilder {
    impl_data_builder!(
        /// Create new string option builder.
        pub fn new(..) -> Self(String(StringData))
    );

    /// Maximum allowed length. Must be at least `1` and at most `6000`.
    pub fn max_length(mut self, max: u16) -> Self {
        self.inner_mut().max_length = Some(max);
        self
    }

    /// Minimum allowed length. Must be at most `6000`.
    pub fn min_length(mut self, min: u16) -> Self {
        self.inner_mut().min_length = Some(min);
        self
    }

    /// Consume the rest of a classic command as this argument, spaces included.
    /// Must be the last argument.
    pub fn greedy(mut self) -> Self {
        self.inner_mut().greedy = true;
        self
    }
}

#[derive(Debug, Default, Clone)]
pub struct StringData {
    pub max_length: Option<u16>,
    pub min_length: Option<u16>,
    pub greedy: bool,
}

#[derive(Debug, Clone, Display)]
pub enum ArgKind {
    #[display(fmt = "string")]
    String(StringData),
}

impl ArgKind {
    /// Returns `true` if the argument takes the rest of a classic command.
    pub const fn is_greedy(&self) -> bool {
        match self {
            Self::String(data) => data.greedy,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArgDesc {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ArgKind,
    pub required: bool,
}

impl ArgDesc {
    /// Create a new argument.
    const fn new(name: &'static str, description: &'static str, kind: ArgKind) -> Self {
        Self {
            name,
            description,
            kind,
            required: false,
        }
    }
}

impl From<StringOptionBuilder> for ArgDesc {
    fn from(value: StringOptionBuilder) -> Self {
        value.build()
    }
}

/// Base command type.
#[derive(Debug, Clone)]
pub struct BaseCommand {
    pub command: CommandFunction,
    pub dm_enabled: bool,
    pub member_permissions: Option<Permissions>,
}

impl BaseCommand {
    /// Generate the slash command to be integrated to discord, if the command has one.
    pub fn twilight_command(&self) -> Option<Result<TwilightCommand, CommandValidationError>> {
        self.command
            .has_slash()
            .then(|| SlashCommand::try_from(self.clone()).map(Into::into))
    }

    /// Validate the command.
    pub fn validate(&self) -> Result<(), CommandValidationError> {
        let args: Vec<_> = self.command.args().collect();

        if let Some(pos) = args.iter().position(|a| a.kind.is_greedy()) {
            if pos + 1 != args.len() {
                return Err(CommandValidationError::GreedyNotLast(args[pos].name.to_string()));
            }
        }

        self.twilight_command()
            .transpose()
            .with_context(|| format!("Failed to validate command '{}'", self.command.name))?;

        Ok(())
    }

    /// Usage line, such as `build [template]`.
    pub fn usage(&self) -> String {
        self.command
            .args()
            .fold(self.command.name.to_string(), |mut text, arg| {
                let dots = if arg.kind.is_greedy() { "..." } else { "" };
                if arg.required {
                    text.push_str(&format!(" <{}{dots}>", arg.name));
                } else {
                    text.push_str(&format!(" [{}{dots}]", arg.name));
                }
                text
            })
    }
}

impl From<BaseCommandBuilder> for BaseCommand {
    fn from(value: BaseCommandBuilder) -> Self {
        value.build()
    }
}

#[derive(Debug, Clone)]
pub struct BaseCommandBuilder(BaseCommand);

impl BaseCommandBuilder {
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self(BaseCommand {
            command: CommandFunction {
                name,
                description: if description.is_empty() {
                    "-" // Empty description.
                } else {
                    description
                },
                functions: Vec::new(),
                options: Vec::new(),
            },
            dm_enabled: false,
            member_permissions: None,
        })
    }

    /// Set command to be available in DMs.
    pub const fn dm(mut self) -> Self {
        self.0.dm_enabled = true;
        self
    }

    /// Set default guild member permissions for the command.
    pub const fn permissions(mut self, permissions: Permissions) -> Self {
        self.0.member_permissions = Some(permissions);
        self
    }

    /// Add a function to this base command. Functions get called on the command event.
    pub fn attach<F, R, Fut>(mut self, function: F) -> Self
    where
        F: Fn(Context, R) -> Fut + IntoFunction<R> + Send + Sync + 'static,
        Fut: Future<Output = CommandResult> + Send + 'static,
    {
        self.0.command.functions.push(function.into_function());
        self
    }

    /// Add an option to the command.
    pub fn option(mut self, option: impl Into<ArgDesc>) -> Self {
        self.0.command.options.push(option.into());
        self
    }

    /// Validate the command.
    pub fn validate(self) -> Result<Self, CommandValidationError> {
        self.0.validate()?;
        Ok(self)
    }

    /// Finalize the command.
    pub fn build(self) -> BaseCommand {
        self.0
    }
}

/// Command that maps to a function.
#[derive(Debug, Clone)]
pub struct CommandFunction {
    pub name: &'static str,
    pub description: &'static str,
    pub functions: Vec<Function>,
    pub options: Vec<ArgDesc>,
}

impl CommandFunction {
    /// Returns true if the command has classic functions.
    pub fn has_classic(&self) -> bool {
        self.functions.iter().any(Function::is_classic)
    }

    /// Returns true if the command has slash functions.
    pub fn has_slash(&self) -> bool {
        self.functions.iter().any(Function::is_slash)
    }

    /// Returns an iterator of attached classic functions.
    pub fn classic(&self) -> impl Iterator<Item = ClassicFunction> + '_ {
        self.functions.iter().filter_map(|f| match f {
            Function::Classic(f) => Some(f.clone()),
            _ => None,
        })
    }

    /// Returns an iterator of attached slash functions.
    pub fn slash(&self) -> impl Iterator<Item = SlashFunction> + '_ {
        self.functions.iter().filter_map(|f| match f {
            Function::Slash(f) => Some(f.clone()),
            _ => None,
        })
    }

    /// Returns an iterator of command arguments.
    pub fn args(&self) -> impl Iterator<Item = &ArgDesc> {
        self.options.iter()
    }
}
