use twilight_model::id::marker::ChannelMarker;
use twilight_model::id::Id;

use crate::deploy::Protected;
use crate::guild::twilight::HttpGuild;
use crate::utils::prelude::*;
use crate::Context;

/// Deploying, resetting and saving server structures.
pub mod build;

/// Single role management.
pub mod roles;

/// Objects a deployment or reset must leave alone:
/// the channel the command was used in, and the bot's own top role.
async fn protected(
    ctx: &Context,
    guild: &HttpGuild<'_>,
    channel: Option<Id<ChannelMarker>>,
) -> AnyResult<Protected> {
    let role = guild
        .top_role_of(ctx.user.id)
        .await
        .context("Failed to find the bot's top role")?
        .map(|r| r.id);

    Ok(Protected { channel, role })
}
