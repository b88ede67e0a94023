use twilight_http::request::application::interaction::UpdateResponse;
use twilight_http::request::channel::message::{CreateMessage, UpdateMessage};
use twilight_http::request::channel::GetChannel;
use twilight_http::request::guild::member::GetMember;
use twilight_http::request::guild::role::GetGuildRoles;
use twilight_http::request::guild::{GetGuild, GetGuildChannels};
use twilight_model::channel::{Channel, Message};
use twilight_model::guild::{Guild, Member, Role};

use crate::utils::prelude::*;

/// Common imports.
pub mod prelude {
    pub(crate) use anyhow::{Context as _, Result as AnyResult};
    pub(crate) use async_trait::async_trait;
    pub(crate) use tracing::{debug, error, info, trace, warn};

    pub(crate) use crate::utils::ExecModelExt;
}

/// Universal constants.
pub mod consts {
    /// Characters that can wrap a classic command argument.
    pub const DELIMITERS: &[char] = &['"', '\'', '`'];

    /// Embed accent colors.
    pub const COLOR_OK: u32 = 0x00FF00;
    pub const COLOR_WARN: u32 = 0xFFAA00;
    pub const COLOR_ERROR: u32 = 0xFF0000;
}

/// A trait to simplify `.await?.model().await` chain.
#[async_trait]
pub trait ExecModelExt {
    type Value;

    /// Send the request and deserialize the response body.
    async fn send(self) -> AnyResult<Self::Value>;
}

/// Macro to implement `ExecModelExt` in a one-liner.
macro_rules! impl_exec_model_ext {
    ($req:ty => [$val:ty]) => {
        #[async_trait]
        impl ExecModelExt for $req {
            type Value = Vec<$val>;

            async fn send(self) -> AnyResult<Self::Value> {
                self.await?.models().await.map_err(Into::into)
            }
        }
    };
    ($req:ty => $val:ty) => {
        #[async_trait]
        impl ExecModelExt for $req {
            type Value = $val;

            async fn send(self) -> AnyResult<Self::Value> {
                self.await?.model().await.map_err(Into::into)
            }
        }
    };
}

impl_exec_model_ext!(CreateMessage<'_> => Message);
impl_exec_model_ext!(UpdateMessage<'_> => Message);
impl_exec_model_ext!(UpdateResponse<'_> => Message);
impl_exec_model_ext!(GetChannel<'_> => Channel);
impl_exec_model_ext!(GetGuild<'_> => Guild);
impl_exec_model_ext!(GetGuildChannels<'_> => [Channel]);
impl_exec_model_ext!(GetGuildRoles<'_> => [Role]);
impl_exec_model_ext!(GetMember<'_> => Member);

/// Returns a comma separated list, with the last two items joined by "or".
pub fn nice_list<T: ToString>(items: &[T]) -> String {
    let items: Vec<_> = items.iter().map(|i| format!("`{}`", i.to_string())).collect();
    match items.as_slice() {
        [] => String::new(),
        [one] => one.to_owned(),
        [init @ .., last] => format!("{} or {last}", init.join(", ")),
    }
}

/// Escapes characters that Discord would render as markdown.
pub fn escape_discord_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '_' | '`' | '~' | '|' | '>' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nice_lists() {
        assert_eq!(nice_list::<&str>(&[]), "");
        assert_eq!(nice_list(&["en"]), "`en`");
        assert_eq!(nice_list(&["en", "es", "fi"]), "`en`, `es` or `fi`");
    }

    #[test]
    fn escapes_markdown() {
        assert_eq!(escape_discord_chars("a*b_c"), r"a\*b\_c");
        assert_eq!(escape_discord_chars("plain"), "plain");
    }
}
