use std::sync::Arc;

use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::application::interaction::Interaction;
use twilight_model::channel::message::embed::Embed;
use twilight_model::channel::message::Component;
use twilight_model::channel::Message;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, MessageMarker, UserMarker};
use twilight_model::id::Id;

use crate::commands::arg::Args;
use crate::commands::builder::BaseCommand;
use crate::commands::{CommandError, CommandResult};
use crate::utils::prelude::*;
use crate::Context;

/// Classic command request with preprocessed arguments and original message.
#[derive(Debug, Clone)]
pub struct ClassicRequest {
    pub command: Arc<BaseCommand>,
    pub message: Arc<Message>,
    pub args: Args,
}

impl ClassicRequest {
    pub fn new(command: Arc<BaseCommand>, message: Arc<Message>, args: Args) -> Self {
        Self {
            command,
            message,
            args,
        }
    }

    /// Who sent the command and where.
    pub fn invocation(&self) -> Invocation {
        Invocation {
            guild_id: self.message.guild_id,
            channel_id: Some(self.message.channel_id),
            user_id: self.message.author.id,
        }
    }

    /// Replies to the command message.
    pub fn responder(&self) -> Responder {
        Responder::new(Target::Channel {
            channel_id: self.message.channel_id,
            reply_to: self.message.id,
        })
    }
}

/// Slash command request with preprocessed arguments and interaction data.
#[derive(Debug, Clone)]
pub struct SlashRequest {
    pub command: Arc<BaseCommand>,
    pub interaction: Arc<Interaction>,
    pub data: Arc<CommandData>,
    pub args: Args,
}

impl SlashRequest {
    pub fn new(
        command: Arc<BaseCommand>,
        interaction: Arc<Interaction>,
        data: Arc<CommandData>,
        args: Args,
    ) -> Self {
        Self {
            command,
            interaction,
            data,
            args,
        }
    }

    /// Who used the command and where.
    pub fn invocation(&self) -> CommandResult<Invocation> {
        let user_id = self
            .interaction
            .author_id()
            .ok_or("Interaction without an author")?;

        Ok(Invocation {
            guild_id: self.interaction.guild_id,
            channel_id: self.interaction.channel.as_ref().map(|c| c.id),
            user_id,
        })
    }

    /// Edits the acknowledged interaction response.
    pub fn responder(&self) -> Responder {
        Responder::new(Target::Interaction {
            token: self.interaction.token.clone(),
        })
    }
}

/// Caller of a command, the same for either request type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    pub guild_id: Option<Id<GuildMarker>>,
    pub channel_id: Option<Id<ChannelMarker>>,
    pub user_id: Id<UserMarker>,
}

impl Invocation {
    /// Guild of the invocation.
    /// # Errors
    /// Returns `CommandError::Disabled` outside of guilds.
    pub fn guild(&self) -> CommandResult<Id<GuildMarker>> {
        self.guild_id.ok_or(CommandError::Disabled)
    }
}

#[derive(Debug, Clone)]
enum Target {
    Channel {
        channel_id: Id<ChannelMarker>,
        reply_to: Id<MessageMarker>,
    },
    Interaction {
        token: String,
    },
}

/// One status message per command.
/// The first call sends it, every following call edits it in place.
#[derive(Debug, Clone)]
pub struct Responder {
    target: Target,
    sent: Option<Id<MessageMarker>>,
}

impl Responder {
    const fn new(target: Target) -> Self {
        Self { target, sent: None }
    }

    /// Show plain text, removing any embeds and components.
    pub async fn text(&mut self, ctx: &Context, text: &str) -> AnyResult<Message> {
        self.show(ctx, text, &[], &[]).await
    }

    /// Show embeds with components. An empty `components` removes existing ones.
    pub async fn embeds(
        &mut self,
        ctx: &Context,
        embeds: &[Embed],
        components: &[Component],
    ) -> AnyResult<Message> {
        self.show(ctx, "", embeds, components).await
    }

    async fn show(
        &mut self,
        ctx: &Context,
        content: &str,
        embeds: &[Embed],
        components: &[Component],
    ) -> AnyResult<Message> {
        let content = (!content.is_empty()).then_some(content);

        let message = match (&self.target, self.sent) {
            (Target::Interaction { token }, _) => {
                ctx.interaction()
                    .update_response(token)
                    .content(content)?
                    .embeds(Some(embeds))?
                    .components(Some(components))?
                    .send()
                    .await?
            },
            (Target::Channel { channel_id, .. }, Some(id)) => {
                ctx.http
                    .update_message(*channel_id, id)
                    .content(content)?
                    .embeds(Some(embeds))?
                    .components(Some(components))?
                    .send()
                    .await?
            },
            (Target::Channel {
                channel_id,
                reply_to,
            }, None) => {
                ctx.http
                    .create_message(*channel_id)
                    .reply(*reply_to)
                    .content(content.unwrap_or_default())?
                    .embeds(embeds)?
                    .components(components)?
                    .send()
                    .await?
            },
        };

        self.sent = Some(message.id);
        Ok(message)
    }
}
