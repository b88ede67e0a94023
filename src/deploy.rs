//! Cleaning a guild and deploying a structure onto it.

use twilight_model::id::marker::{ChannelMarker, RoleMarker};
use twilight_model::id::Id;

use crate::guild::GuildClient;
use crate::structure::Structure;
use crate::utils::prelude::*;

/// Objects that are never deleted, such as the channel the command was used in
/// and the bot's own top role.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Protected {
    pub channel: Option<Id<ChannelMarker>>,
    pub role: Option<Id<RoleMarker>>,
}

/// Number of created objects.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub categories: usize,
    pub channels: usize,
    pub roles: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    /// Deleted channels, categories included.
    pub channels: usize,
    pub roles: usize,
    pub failed: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeploymentReport {
    /// New server name, if the guild was renamed.
    pub renamed: Option<String>,
    pub cleanup: CleanupReport,
    pub created: Tally,
    /// Objects whose creation failed.
    pub failed: usize,
    /// Channels not attempted because their category failed.
    pub skipped: usize,
}

/// Deployment phase, reported before it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage<'a> {
    Cleanup,
    Building {
        category: &'a str,
        /// 1-based.
        index: usize,
        total: usize,
        tally: Tally,
    },
    Finalizing {
        tally: Tally,
    },
}

/// Receives progress updates during a deployment.
/// An error aborts the deployment.
#[async_trait]
pub trait Progress: Send {
    async fn update(&mut self, stage: Stage<'_>) -> AnyResult<()>;
}

/// Progress sink that ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

#[async_trait]
impl Progress for Silent {
    async fn update(&mut self, _: Stage<'_>) -> AnyResult<()> {
        Ok(())
    }
}

/// Delete every channel and role except `@everyone` and the protected ones.
/// Individual failures are logged and counted, never returned.
pub async fn cleanup(guild: &dyn GuildClient, protected: Protected) -> AnyResult<CleanupReport> {
    let mut report = CleanupReport::default();

    let channels = guild.channels().await.context("Failed to list channels")?;
    for channel in channels {
        if Some(channel.id) == protected.channel {
            continue;
        }

        match guild.delete_channel(channel.id).await {
            Ok(()) => report.channels += 1,
            Err(e) => {
                warn!("Failed to delete channel '{}' ({}): {e}", channel.name, channel.id);
                report.failed += 1;
            },
        }
    }

    let everyone = guild.everyone_role();
    let roles = guild.roles().await.context("Failed to list roles")?;
    for role in roles {
        if role.id == everyone || Some(role.id) == protected.role {
            continue;
        }

        match guild.delete_role(role.id).await {
            Ok(()) => report.roles += 1,
            Err(e) => {
                warn!("Failed to delete role '{}' ({}): {e}", role.name, role.id);
                report.failed += 1;
            },
        }
    }

    debug!(
        "Cleaned guild {}: {} channels, {} roles, {} failed",
        guild.id(),
        report.channels,
        report.roles,
        report.failed
    );

    Ok(report)
}

/// Replace the guild's structure with `structure`.
///
/// Runs strictly in order: rename, cleanup, roles, then each category followed by its channels.
/// Failing to create or delete a single object is counted in the report.
/// Failing to rename, list objects or report progress aborts the deployment
/// and leaves whatever was already done in place.
pub async fn deploy(
    guild: &dyn GuildClient,
    structure: &Structure,
    protected: Protected,
    progress: &mut dyn Progress,
) -> AnyResult<DeploymentReport> {
    let mut report = DeploymentReport::default();

    if let Some(name) = structure.rename_target() {
        guild.rename(name).await?;
        report.renamed = Some(name.to_string());
    }

    progress.update(Stage::Cleanup).await?;
    report.cleanup = cleanup(guild, protected).await?;

    for spec in &structure.roles {
        match guild.create_role(&spec.name, spec.permission_set()).await {
            Ok(_) => report.created.roles += 1,
            Err(e) => {
                warn!("Failed to create role '{}': {e}", spec.name);
                report.failed += 1;
            },
        }
    }

    let total = structure.categories.len();
    for (i, category) in structure.categories.iter().enumerate() {
        progress
            .update(Stage::Building {
                category: &category.name,
                index: i + 1,
                total,
                tally: report.created,
            })
            .await?;

        let parent = match guild.create_category(&category.name).await {
            Ok(id) => {
                report.created.categories += 1;
                id
            },
            Err(e) => {
                warn!(
                    "Failed to create category '{}', skipping {} channels: {e}",
                    category.name,
                    category.channels.len()
                );
                report.failed += 1;
                report.skipped += category.channels.len();
                continue;
            },
        };

        for channel in &category.channels {
            match guild.create_channel(parent, channel).await {
                Ok(_) => report.created.channels += 1,
                Err(e) => {
                    warn!(
                        "Failed to create channel '{}' in '{}': {e}",
                        channel.name, category.name
                    );
                    report.failed += 1;
                },
            }
        }
    }

    progress
        .update(Stage::Finalizing {
            tally: report.created,
        })
        .await?;

    info!(
        "Deployed to guild {}: {} categories, {} channels, {} roles ({} failed, {} skipped)",
        guild.id(),
        report.created.categories,
        report.created.channels,
        report.created.roles,
        report.failed,
        report.skipped
    );

    Ok(report)
}
