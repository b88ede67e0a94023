use twilight_http::request::AuditLogReason;
use twilight_http::Client;
use twilight_model::channel::{Channel, ChannelType};
use twilight_model::guild::{Permissions, Role};
use twilight_model::id::marker::{ChannelMarker, GuildMarker, RoleMarker, UserMarker};
use twilight_model::id::Id;

use crate::guild::{self, ChannelInfo, ChannelKind, GuildClient, RoleInfo};
use crate::structure::{self, ChannelSpec};
use crate::utils::prelude::*;

/// Guild operations over the Discord REST api.
#[derive(Debug, Clone, Copy)]
pub struct HttpGuild<'a> {
    http: &'a Client,
    guild_id: Id<GuildMarker>,
    reason: &'a str,
}

impl<'a> HttpGuild<'a> {
    /// Create a guild client. `reason` is recorded in the audit log for every change.
    pub const fn new(http: &'a Client, guild_id: Id<GuildMarker>, reason: &'a str) -> Self {
        Self {
            http,
            guild_id,
            reason,
        }
    }

    /// Role ids assigned to a member.
    pub async fn member_roles(&self, user_id: Id<UserMarker>) -> AnyResult<Vec<Id<RoleMarker>>> {
        let member = self
            .http
            .guild_member(self.guild_id, user_id)
            .send()
            .await
            .context("Failed to get guild member")?;

        Ok(member.roles)
    }

    /// Highest role of a member, such as the bot's own top role.
    pub async fn top_role_of(&self, user_id: Id<UserMarker>) -> AnyResult<Option<RoleInfo>> {
        let member_roles = self.member_roles(user_id).await?;
        let roles = self.roles().await?;

        Ok(guild::top_role(&roles, &member_roles).cloned())
    }
}

#[async_trait]
impl GuildClient for HttpGuild<'_> {
    fn id(&self) -> Id<GuildMarker> {
        self.guild_id
    }

    async fn name(&self) -> AnyResult<String> {
        let guild = self.http.guild(self.guild_id).send().await?;
        Ok(guild.name)
    }

    async fn rename(&self, name: &str) -> AnyResult<()> {
        self.http
            .update_guild(self.guild_id)
            .name(name)?
            .reason(self.reason)?
            .await
            .with_context(|| format!("Failed to rename guild to '{name}'"))?;

        Ok(())
    }

    async fn channels(&self) -> AnyResult<Vec<ChannelInfo>> {
        let channels = self
            .http
            .guild_channels(self.guild_id)
            .send()
            .await
            .context("Failed to get guild channels")?;

        Ok(channels.into_iter().map(ChannelInfo::from).collect())
    }

    async fn roles(&self) -> AnyResult<Vec<RoleInfo>> {
        let roles = self
            .http
            .roles(self.guild_id)
            .send()
            .await
            .context("Failed to get guild roles")?;

        Ok(roles.into_iter().map(RoleInfo::from).collect())
    }

    async fn create_category(&self, name: &str) -> AnyResult<Id<ChannelMarker>> {
        let category = self
            .http
            .create_guild_channel(self.guild_id, name)?
            .kind(ChannelType::GuildCategory)
            .reason(self.reason)?
            .await?
            .model()
            .await?;

        trace!("Created category '{name}' ({})", category.id);

        Ok(category.id)
    }

    async fn create_channel(
        &self,
        parent: Id<ChannelMarker>,
        spec: &ChannelSpec,
    ) -> AnyResult<Id<ChannelMarker>> {
        let kind = match spec.kind {
            structure::ChannelKind::Text => ChannelType::GuildText,
            structure::ChannelKind::Voice => ChannelType::GuildVoice,
        };

        let mut req = self
            .http
            .create_guild_channel(self.guild_id, &spec.name)?
            .kind(kind)
            .parent_id(parent);

        if let Some(topic) = spec.text_topic() {
            req = req.topic(topic)?;
        }

        let channel = req.reason(self.reason)?.await?.model().await?;

        trace!("Created channel '{}' ({})", spec.name, channel.id);

        Ok(channel.id)
    }

    async fn create_role(
        &self,
        name: &str,
        permissions: Permissions,
    ) -> AnyResult<Id<RoleMarker>> {
        let role = self
            .http
            .create_role(self.guild_id)
            .name(name)
            .permissions(permissions)
            .reason(self.reason)?
            .await?
            .model()
            .await?;

        trace!("Created role '{name}' ({})", role.id);

        Ok(role.id)
    }

    async fn delete_channel(&self, id: Id<ChannelMarker>) -> AnyResult<()> {
        self.http.delete_channel(id).reason(self.reason)?.await?;
        Ok(())
    }

    async fn delete_role(&self, id: Id<RoleMarker>) -> AnyResult<()> {
        self.http
            .delete_role(self.guild_id, id)
            .reason(self.reason)?
            .await?;
        Ok(())
    }
}

impl From<Channel> for ChannelInfo {
    fn from(channel: Channel) -> Self {
        let kind = match channel.kind {
            ChannelType::GuildCategory => ChannelKind::Category,
            ChannelType::GuildVoice | ChannelType::GuildStageVoice => ChannelKind::Voice,
            _ => ChannelKind::Text,
        };

        Self {
            id: channel.id,
            name: channel.name.unwrap_or_default(),
            kind,
            parent_id: channel.parent_id,
            position: channel.position.map(i64::from).unwrap_or_default(),
            topic: channel.topic,
        }
    }
}

impl From<Role> for RoleInfo {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            permissions: role.permissions,
            position: role.position,
        }
    }
}
