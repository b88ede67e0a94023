//! Capturing a live guild as a [`Structure`].

use std::cmp::Reverse;

use twilight_model::id::marker::RoleMarker;
use twilight_model::id::Id;

use crate::guild::{ChannelInfo, ChannelKind, GuildClient};
use crate::structure::{self, Category, ChannelSpec, RoleSpec, Structure};
use crate::utils::prelude::*;

/// Read the guild's categories with their channels, and its roles.
///
/// Channels outside of categories are not captured.
/// Roles are listed highest first, so deploying them in order keeps their ranking.
/// They skip `@everyone` and `protected_role`, usually the bot's own top role.
pub async fn capture(
    guild: &dyn GuildClient,
    protected_role: Option<Id<RoleMarker>>,
) -> AnyResult<Structure> {
    let server_name = guild.name().await?;
    let mut channels = guild.channels().await.context("Failed to list channels")?;
    let mut roles = guild.roles().await.context("Failed to list roles")?;

    channels.sort_by_key(|c| (c.position, c.id));
    roles.sort_by_key(|r| (Reverse(r.position), r.id));

    let categories = channels
        .iter()
        .filter(|c| c.kind == ChannelKind::Category)
        .map(|category| Category {
            name: category.name.clone(),
            channels: channels
                .iter()
                .filter(|c| c.parent_id == Some(category.id) && c.kind != ChannelKind::Category)
                .map(channel_spec)
                .collect(),
        })
        .collect();

    let everyone = guild.everyone_role();
    let roles = roles
        .into_iter()
        .filter(|r| r.id != everyone && Some(r.id) != protected_role)
        .map(|r| RoleSpec {
            permissions: structure::permission_names(r.permissions),
            name: r.name,
        })
        .collect();

    Ok(Structure {
        server_name: Some(server_name),
        categories,
        roles,
    })
}

fn channel_spec(channel: &ChannelInfo) -> ChannelSpec {
    let (kind, topic) = match channel.kind {
        ChannelKind::Voice => (structure::ChannelKind::Voice, None),
        _ => (
            structure::ChannelKind::Text,
            channel.topic.clone().filter(|t| !t.is_empty()),
        ),
    };

    ChannelSpec {
        name: channel.name.clone(),
        kind,
        topic,
    }
}
