//! Remote guild operations used by deployments and snapshots.

use twilight_model::guild::Permissions;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, RoleMarker};
use twilight_model::id::Id;

use crate::structure::ChannelSpec;
use crate::utils::prelude::*;

#[cfg(test)]
pub mod mock;
pub mod twilight;

/// Channel kinds as far as structures are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Category,
    Text,
    Voice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: Id<ChannelMarker>,
    pub name: String,
    pub kind: ChannelKind,
    pub parent_id: Option<Id<ChannelMarker>>,
    pub position: i64,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleInfo {
    pub id: Id<RoleMarker>,
    pub name: String,
    pub permissions: Permissions,
    pub position: i64,
}

/// Operations on one guild.
#[async_trait]
pub trait GuildClient: Send + Sync {
    fn id(&self) -> Id<GuildMarker>;

    /// Current guild name.
    async fn name(&self) -> AnyResult<String>;

    async fn rename(&self, name: &str) -> AnyResult<()>;

    /// All channels, including categories.
    async fn channels(&self) -> AnyResult<Vec<ChannelInfo>>;

    /// All roles, including `@everyone`.
    async fn roles(&self) -> AnyResult<Vec<RoleInfo>>;

    async fn create_category(&self, name: &str) -> AnyResult<Id<ChannelMarker>>;

    async fn create_channel(
        &self,
        parent: Id<ChannelMarker>,
        spec: &ChannelSpec,
    ) -> AnyResult<Id<ChannelMarker>>;

    async fn create_role(&self, name: &str, permissions: Permissions)
        -> AnyResult<Id<RoleMarker>>;

    async fn delete_channel(&self, id: Id<ChannelMarker>) -> AnyResult<()>;

    async fn delete_role(&self, id: Id<RoleMarker>) -> AnyResult<()>;

    /// `@everyone` role id is the same as the guild's id.
    fn everyone_role(&self) -> Id<RoleMarker> {
        self.id().cast()
    }
}

/// Returns the highest positioned role out of `member_roles`.
/// Ties are broken by the lower id, the way Discord orders roles.
pub fn top_role<'a>(roles: &'a [RoleInfo], member_roles: &[Id<RoleMarker>]) -> Option<&'a RoleInfo> {
    roles
        .iter()
        .filter(|r| member_roles.contains(&r.id))
        .max_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| b.id.cmp(&a.id))
        })
}
