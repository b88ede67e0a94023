use chrono::{DateTime, Utc};
use twilight_mention::Mention;
use twilight_model::id::marker::GuildMarker;
use twilight_util::builder::embed::EmbedFieldBuilder;

use crate::commands::bot::embed;
use crate::commands::prelude::*;
use crate::guild::twilight::HttpGuild;
use crate::guild::{ChannelKind, GuildClient};
use crate::utils::consts;
use crate::utils::prelude::*;

/// Milliseconds from unix epoch to the first second of 2015.
const DISCORD_EPOCH: u64 = 1_420_070_400_000;

/// Command: Server statistics.
pub struct Server;

impl Server {
    pub fn command() -> impl Into<BaseCommand> {
        use crate::commands::builder::*;

        command("server", "Show server statistics.")
            .attach(Self::classic)
            .attach(Self::slash)
    }

    async fn uber(ctx: &Context, inv: Invocation, mut out: Responder) -> CommandResult {
        let guild_id = inv.guild()?;
        let g = inv.guild_id;

        let guild = ctx.http.guild(guild_id).with_counts(true).send().await?;
        let channels = HttpGuild::new(&ctx.http, guild_id, "")
            .channels()
            .await?;

        let count = |kind: ChannelKind| channels.iter().filter(|c| c.kind == kind).count();

        let members = guild
            .approximate_member_count
            .or(guild.member_count)
            .unwrap_or_default();

        let field = |key: &str, value: String| {
            EmbedFieldBuilder::new(tr!(ctx, g, key), value).inline()
        };

        let embed = embed(
            ctx,
            g,
            tr!(ctx, g, "server.title", name = guild.name),
            tr!(ctx, g, "server.description"),
            consts::COLOR_OK,
        )
        .field(field("field.owner", guild.owner_id.mention().to_string()))
        .field(field("field.members", format!("`{members}`")))
        .field(field("field.created", format!("`{}`", created_at(guild_id))))
        .field(field("field.text_channels", format!("`{}`", count(ChannelKind::Text))))
        .field(field("field.voice_channels", format!("`{}`", count(ChannelKind::Voice))))
        .field(field("field.category_count", format!("`{}`", count(ChannelKind::Category))))
        // Without `@everyone`.
        .field(field("field.role_count", format!("`{}`", guild.roles.len().saturating_sub(1))))
        .field(field("field.emojis", format!("`{}`", guild.emojis.len())))
        .field(field("field.boost", format!("`{}`", u8::from(guild.premium_tier))))
        .build();

        out.embeds(ctx, &[embed], &[]).await?;

        Ok(())
    }

    async fn classic(ctx: Context, req: ClassicRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation(), req.responder()).await
    }

    async fn slash(ctx: Context, req: SlashRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation()?, req.responder()).await
    }
}

/// Creation date encoded in a snowflake.
fn created_at(id: Id<GuildMarker>) -> String {
    let millis = (id.get() >> 22) + DISCORD_EPOCH;

    i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map_or_else(|| String::from("?"), |t| t.format("%B %d, %Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflake_creation_date() {
        // Discord's own api documentation example.
        assert_eq!(created_at(Id::new(175928847299117063)), "April 30, 2016");
    }
}
