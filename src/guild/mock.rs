//! In-memory guild for tests.

use std::collections::HashSet;
use std::sync::Mutex;

use twilight_model::guild::Permissions;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, RoleMarker};
use twilight_model::id::Id;

use crate::guild::{ChannelInfo, ChannelKind, GuildClient, RoleInfo};
use crate::structure::{self, ChannelSpec};
use crate::utils::prelude::*;

pub const GUILD_ID: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Rename(String),
    CreateCategory(String),
    CreateChannel(String),
    CreateRole(String),
    DeleteChannel(Id<ChannelMarker>),
    DeleteRole(Id<RoleMarker>),
}

#[derive(Debug)]
struct State {
    name: String,
    next_id: u64,
    channels: Vec<ChannelInfo>,
    roles: Vec<RoleInfo>,
    calls: Vec<Call>,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug)]
pub struct MockGuild {
    state: Mutex<State>,
    /// Names of channels, categories or roles whose creation fails.
    pub fail_create: HashSet<String>,
    /// Names of channels or roles whose deletion fails.
    pub fail_delete: HashSet<String>,
    pub fail_rename: bool,
}

impl MockGuild {
    /// A guild with only the `@everyone` role.
    pub fn new(name: &str) -> Self {
        let everyone = RoleInfo {
            id: Id::new(GUILD_ID),
            name: "@everyone".to_string(),
            permissions: Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES,
            position: 0,
        };

        Self {
            state: Mutex::new(State {
                name: name.to_string(),
                next_id: GUILD_ID,
                channels: Vec::new(),
                roles: vec![everyone],
                calls: Vec::new(),
            }),
            fail_create: HashSet::new(),
            fail_delete: HashSet::new(),
            fail_rename: false,
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Add a channel directly, without recording a call.
    pub fn add_channel(
        &self,
        name: &str,
        kind: ChannelKind,
        parent_id: Option<Id<ChannelMarker>>,
    ) -> Id<ChannelMarker> {
        let mut state = self.state();
        let id = Id::new(state.next_id());
        let position = state.channels.len() as i64;
        state.channels.push(ChannelInfo {
            id,
            name: name.to_string(),
            kind,
            parent_id,
            position,
            topic: None,
        });
        id
    }

    /// Add a role directly on top of the hierarchy, without recording a call.
    pub fn add_role(&self, name: &str, permissions: Permissions) -> Id<RoleMarker> {
        let mut state = self.state();
        let id = Id::new(state.next_id());
        let position = state.roles.len() as i64;
        state.roles.push(RoleInfo {
            id,
            name: name.to_string(),
            permissions,
            position,
        });
        id
    }

    pub fn set_topic(&self, id: Id<ChannelMarker>, topic: &str) {
        if let Some(channel) = self.state().channels.iter_mut().find(|c| c.id == id) {
            channel.topic = Some(topic.to_string());
        }
    }

    pub fn current_name(&self) -> String {
        self.state().name.clone()
    }

    pub fn channel_list(&self) -> Vec<ChannelInfo> {
        self.state().channels.clone()
    }

    pub fn role_list(&self) -> Vec<RoleInfo> {
        self.state().roles.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    fn insert_channel(
        &self,
        name: &str,
        kind: ChannelKind,
        parent_id: Option<Id<ChannelMarker>>,
        topic: Option<String>,
    ) -> Id<ChannelMarker> {
        let id = self.add_channel(name, kind, parent_id);
        if let Some(topic) = topic {
            self.set_topic(id, &topic);
        }
        id
    }
}

#[async_trait]
impl GuildClient for MockGuild {
    fn id(&self) -> Id<GuildMarker> {
        Id::new(GUILD_ID)
    }

    async fn name(&self) -> AnyResult<String> {
        Ok(self.current_name())
    }

    async fn rename(&self, name: &str) -> AnyResult<()> {
        self.state().calls.push(Call::Rename(name.to_string()));
        anyhow::ensure!(!self.fail_rename, "Missing Permissions");
        self.state().name = name.to_string();
        Ok(())
    }

    async fn channels(&self) -> AnyResult<Vec<ChannelInfo>> {
        Ok(self.channel_list())
    }

    async fn roles(&self) -> AnyResult<Vec<RoleInfo>> {
        Ok(self.role_list())
    }

    async fn create_category(&self, name: &str) -> AnyResult<Id<ChannelMarker>> {
        self.state().calls.push(Call::CreateCategory(name.to_string()));
        anyhow::ensure!(!self.fail_create.contains(name), "Cannot create '{name}'");
        Ok(self.add_channel(name, ChannelKind::Category, None))
    }

    async fn create_channel(
        &self,
        parent: Id<ChannelMarker>,
        spec: &ChannelSpec,
    ) -> AnyResult<Id<ChannelMarker>> {
        self.state().calls.push(Call::CreateChannel(spec.name.clone()));
        anyhow::ensure!(
            !self.fail_create.contains(&spec.name),
            "Cannot create '{}'",
            spec.name
        );

        let kind = match spec.kind {
            structure::ChannelKind::Text => ChannelKind::Text,
            structure::ChannelKind::Voice => ChannelKind::Voice,
        };

        Ok(self.insert_channel(
            &spec.name,
            kind,
            Some(parent),
            spec.text_topic().map(str::to_string),
        ))
    }

    async fn create_role(
        &self,
        name: &str,
        permissions: Permissions,
    ) -> AnyResult<Id<RoleMarker>> {
        let mut state = self.state();
        state.calls.push(Call::CreateRole(name.to_string()));
        anyhow::ensure!(!self.fail_create.contains(name), "Cannot create '{name}'");

        // New roles land right above `@everyone`.
        for role in state.roles.iter_mut().filter(|r| r.position >= 1) {
            role.position += 1;
        }

        let id = Id::new(state.next_id());
        state.roles.push(RoleInfo {
            id,
            name: name.to_string(),
            permissions,
            position: 1,
        });
        Ok(id)
    }

    async fn delete_channel(&self, id: Id<ChannelMarker>) -> AnyResult<()> {
        let mut state = self.state();
        state.calls.push(Call::DeleteChannel(id));

        let index = state
            .channels
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| anyhow::anyhow!("Unknown Channel"))?;
        anyhow::ensure!(
            !self.fail_delete.contains(&state.channels[index].name),
            "Cannot delete '{}'",
            state.channels[index].name
        );

        state.channels.remove(index);
        Ok(())
    }

    async fn delete_role(&self, id: Id<RoleMarker>) -> AnyResult<()> {
        let mut state = self.state();
        state.calls.push(Call::DeleteRole(id));

        let index = state
            .roles
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| anyhow::anyhow!("Unknown Role"))?;
        anyhow::ensure!(
            !self.fail_delete.contains(&state.roles[index].name),
            "Cannot delete '{}'",
            state.roles[index].name
        );

        state.roles.remove(index);
        Ok(())
    }
}
