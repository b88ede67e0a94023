use derive_more::{AsRef, From, IntoIterator, IsVariant, Unwrap};
use twilight_model::application::interaction::application_command::CommandOptionValue;

use crate::commands::builder::{ArgDesc, ArgKind};
use crate::commands::{CommandError, CommandResult};
use crate::utils::prelude::*;

/// Wrapper around `Vec<Arg>` for extra features.
#[derive(Debug, Default, Clone, AsRef, From, IntoIterator)]
pub struct Args(Vec<Arg>);

impl Args {
    /// Finds argument by name and returns the value, if it is a string.
    /// # Errors
    /// * Returns `CommandError::MissingArgs` if the arg was not found.
    /// * Returns `CommandError::UnexpectedArgs` if the arg was found, but as different type.
    pub fn string(&self, name: &str) -> CommandResult<&str> {
        self.get(name)
            .ok_or(CommandError::MissingArgs)
            .and_then(|a| {
                a.string().ok_or_else(|| {
                    CommandError::UnexpectedArgs(format!("Expected '{name}' to be a string"))
                })
            })
    }

    /// Finds argument value by argument name.
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.as_ref()
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }
}

/// A type representing an argument with name and value.
#[derive(Debug, Clone)]
pub struct Arg {
    pub name: String,
    pub value: ArgValue,
}

impl Arg {
    pub fn from_desc(desc: &ArgDesc, text: &str) -> AnyResult<Self> {
        Ok(Self {
            name: desc.name.to_string(),
            value: ArgValue::from_kind(&desc.kind, text)?,
        })
    }
}

/// Argument value type with data.
#[derive(Debug, Clone, Unwrap, IsVariant)]
pub enum ArgValue {
    String(Box<str>),
}

impl ArgValue {
    /// Returns `Some` if `self` is a string, else `None`.
    pub fn string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
        }
    }

    pub fn from_kind(kind: &ArgKind, text: &str) -> AnyResult<Self> {
        match kind {
            ArgKind::String(data) => {
                let len = text.chars().count();

                if let Some(min) = data.min_length {
                    anyhow::ensure!(len >= usize::from(min), "Expected at least {min} characters");
                }

                if let Some(max) = data.max_length {
                    anyhow::ensure!(len <= usize::from(max), "Expected at most {max} characters");
                }

                Ok(Self::String(text.into()))
            },
        }
    }
}

impl TryFrom<CommandOptionValue> for ArgValue {
    type Error = &'static str;

    fn try_from(value: CommandOptionValue) -> Result<Self, Self::Error> {
        match value {
            CommandOptionValue::String(s) => Ok(Self::String(s.into_boxed_str())),
            CommandOptionValue::SubCommand(_) | CommandOptionValue::SubCommandGroup(_) => {
                Err("Cannot convert subcommand or group to argument value")
            },
            _ => Err("Unsupported argument type"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::builder::string;

    #[test]
    fn finds_strings_by_name() {
        let args = Args::from(vec![Arg {
            name: "name".to_string(),
            value: ArgValue::String("Moderator".into()),
        }]);

        assert_eq!(args.string("name").unwrap(), "Moderator");
        assert_eq!(args.string("code").unwrap_err(), CommandError::MissingArgs);
    }

    #[test]
    fn length_limits() {
        let desc = string("code", "Build code.").min_length(8).max_length(8).build();

        assert!(Arg::from_desc(&desc, "ABCD1234").is_ok());
        assert!(Arg::from_desc(&desc, "ABC").is_err());
        assert!(Arg::from_desc(&desc, "ABCD12345").is_err());
    }
}
