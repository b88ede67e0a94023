use twilight_model::application::interaction::Interaction;
use twilight_model::channel::message::embed::Embed;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder};

use crate::commands::bot::admin::protected;
use crate::commands::bot::embed;
use crate::commands::handle;
use crate::commands::prelude::*;
use crate::confirm::{self, Dialog, Outcome};
use crate::deploy::{self, DeploymentReport, Progress, Stage, Tally};
use crate::guild::twilight::HttpGuild;
use crate::registry::{self, BuildRegistry};
use crate::structure::Structure;
use crate::templates::TemplateStore;
use crate::utils::prelude::*;
use crate::utils::{consts, escape_discord_chars};

/// Command: Deploy a template or a saved build, or list templates.
pub struct Build;

impl Build {
    pub fn command() -> impl Into<BaseCommand> {
        use crate::commands::builder::*;

        command("build", "Deploy a template or a saved build to this server.")
            .attach(Self::classic)
            .attach(Self::slash)
            .permissions(Permissions::ADMINISTRATOR)
            .option(string("template", "Template name or build code.").max_length(100))
    }

    async fn uber(ctx: &Context, inv: Invocation, mut out: Responder, args: &Args) -> CommandResult {
        let guild_id = inv.guild()?;
        let g = inv.guild_id;

        let Ok(name) = args.string("template") else {
            let embed = templates_embed(ctx, &inv);
            out.embeds(ctx, &[embed], &[]).await?;
            return Ok(());
        };

        let Some(structure) = find_structure(&ctx.templates, &ctx.builds, name) else {
            let text = tr!(
                ctx,
                g,
                "build.not_found",
                name = escape_discord_chars(name),
                prefix = ctx.config.classic_prefix(),
            );
            out.text(ctx, &text).await?;
            return Ok(());
        };

        let status = embed(
            ctx,
            g,
            tr!(ctx, g, "deploy.title"),
            tr!(ctx, g, "deploy.initializing", name = escape_discord_chars(name)),
            consts::COLOR_WARN,
        )
        .build();
        out.embeds(ctx, &[status], &[]).await?;

        let guild = HttpGuild::new(&ctx.http, guild_id, "Server structure deployment");
        let protected = protected(ctx, &guild, inv.channel_id).await?;

        info!("Deploying '{name}' to guild {guild_id} for user {}", inv.user_id);

        let result = {
            let mut progress = StatusMessage {
                ctx,
                guild_id: g,
                out: &mut out,
            };
            deploy::deploy(&guild, &structure, protected, &mut progress).await
        };

        let embed = match result {
            Ok(report) => {
                info!("Deployed '{name}' to guild {guild_id}: {report:?}");
                report_embed(ctx, &inv, name, &report)
            },
            Err(e) => {
                warn!("Deployment of '{name}' to guild {guild_id} failed: {e:#}");
                embed(
                    ctx,
                    g,
                    tr!(ctx, g, "deploy.failed_title"),
                    tr!(ctx, g, "deploy.failed", error = format!("{e:#}")),
                    consts::COLOR_ERROR,
                )
                .build()
            },
        };

        out.embeds(ctx, &[embed], &[]).await?;

        Ok(())
    }

    async fn classic(ctx: Context, req: ClassicRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation(), req.responder(), &req.args).await
    }

    async fn slash(ctx: Context, req: SlashRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation()?, req.responder(), &req.args).await
    }
}

/// Command: Delete every channel and role after a confirmation.
pub struct DeleteBuild;

impl DeleteBuild {
    pub fn command() -> impl Into<BaseCommand> {
        use crate::commands::builder::*;

        command("deletebuild", "Delete all channels and roles of this server.")
            .attach(Self::classic)
            .attach(Self::slash)
            .permissions(Permissions::ADMINISTRATOR)
    }

    async fn uber(ctx: &Context, inv: Invocation, mut out: Responder) -> CommandResult {
        let guild_id = inv.guild()?;
        let g = inv.guild_id;
        let timeout = ctx.config.confirm_timeout();

        let prompt = embed(
            ctx,
            g,
            tr!(ctx, g, "reset.title"),
            tr!(ctx, g, "reset.description"),
            consts::COLOR_ERROR,
        )
        .field(EmbedFieldBuilder::new(
            tr!(ctx, g, "reset.prompt_name"),
            tr!(ctx, g, "reset.prompt_value", seconds = timeout.as_secs()),
        ))
        .build();

        let buttons = confirm::buttons(&tr!(ctx, g, "reset.confirm"), &tr!(ctx, g, "reset.cancel"));
        let prompt = out.embeds(ctx, &[prompt], &buttons).await?;

        let clicks = ctx
            .standby
            .wait_for_component_stream(prompt.id, |_: &Interaction| true);

        let outcome = Dialog::new(inv.user_id, timeout).run(clicks).await;
        let text = match outcome {
            Outcome::Confirmed(click) => {
                debug!("Reset of guild {guild_id} confirmed");
                acknowledge(ctx, &click).await?;

                // Permissions may have changed while the prompt was up.
                if !handle::interaction_has_permissions(&click, Permissions::ADMINISTRATOR) {
                    tr!(ctx, g, "reset.lost_permission")
                } else {
                    let guild = HttpGuild::new(&ctx.http, guild_id, "Server reset");
                    let protected = protected(ctx, &guild, inv.channel_id).await?;
                    let report = deploy::cleanup(&guild, protected).await?;

                    info!("Reset guild {guild_id} for user {}: {report:?}", inv.user_id);

                    let done = embed(
                        ctx,
                        g,
                        tr!(ctx, g, "reset.done_title"),
                        tr!(
                            ctx,
                            g,
                            "reset.done",
                            channels = report.channels,
                            roles = report.roles,
                        ),
                        consts::COLOR_OK,
                    )
                    .build();

                    out.embeds(ctx, &[done], &[]).await?;
                    return Ok(());
                }
            },
            Outcome::Cancelled(click) => {
                debug!("Reset of guild {guild_id} cancelled");
                acknowledge(ctx, &click).await?;
                tr!(ctx, g, "reset.cancelled")
            },
            Outcome::TimedOut => {
                debug!("Reset of guild {guild_id} timed out");
                tr!(ctx, g, "reset.timed_out")
            },
        };

        out.text(ctx, &text).await?;

        Ok(())
    }

    async fn classic(ctx: Context, req: ClassicRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation(), req.responder()).await
    }

    async fn slash(ctx: Context, req: SlashRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation()?, req.responder()).await
    }
}

/// Command: Save the current server structure under a new code.
pub struct SaveBuild;

impl SaveBuild {
    pub fn command() -> impl Into<BaseCommand> {
        use crate::commands::builder::*;

        command("savebuild", "Save the structure of this server as a build.")
            .attach(Self::classic)
            .attach(Self::slash)
            .permissions(Permissions::ADMINISTRATOR)
    }

    async fn uber(ctx: &Context, inv: Invocation, mut out: Responder) -> CommandResult {
        let guild_id = inv.guild()?;
        let g = inv.guild_id;

        let guild = HttpGuild::new(&ctx.http, guild_id, "Server snapshot");
        let bot_role = protected(ctx, &guild, None).await?.role;
        let structure = crate::snapshot::capture(&guild, bot_role).await?;

        let code = ctx.builds.save_new(inv.user_id, structure);
        info!("User {} saved guild {guild_id} as '{code}'", inv.user_id);

        let embed = embed(
            ctx,
            g,
            tr!(ctx, g, "savebuild.title"),
            tr!(
                ctx,
                g,
                "savebuild.description",
                code = code,
                prefix = ctx.config.classic_prefix(),
            ),
            consts::COLOR_OK,
        )
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

/// Command: List own saved builds.
pub struct Builds;

impl Builds {
    /// Embeds can have at most this many fields.
    const MAX_FIELDS: usize = 25;

    pub fn command() -> impl Into<BaseCommand> {
        use crate::commands::builder::*;

        command("builds", "List your saved builds.")
            .attach(Self::classic)
            .attach(Self::slash)
            .permissions(Permissions::ADMINISTRATOR)
    }

    async fn uber(ctx: &Context, inv: Invocation, mut out: Responder) -> CommandResult {
        let g = inv.guild_id;
        let builds = ctx.builds.list(inv.user_id);

        if builds.is_empty() {
            let text = tr!(ctx, g, "builds.empty", prefix = ctx.config.classic_prefix());
            out.text(ctx, &text).await?;
            return Ok(());
        }

        let description = match Self::hidden(builds.len()) {
            0 => String::new(),
            hidden => tr!(
                ctx,
                g,
                "builds.more",
                shown = Self::MAX_FIELDS,
                total = builds.len(),
                hidden = hidden,
            ),
        };

        let embed = builds.iter().take(Self::MAX_FIELDS).fold(
            embed(ctx, g, tr!(ctx, g, "builds.title"), description, consts::COLOR_OK),
            |embed, (code, s)| {
                let name = s.server_name.as_deref().unwrap_or(code);
                let value = tr!(
                    ctx,
                    g,
                    "builds.entry",
                    name = escape_discord_chars(name),
                    categories = s.categories.len(),
                    channels = s.channel_count(),
                    roles = s.roles.len(),
                );
                embed.field(EmbedFieldBuilder::new(format!("`{code}`"), value))
            },
        );

        out.embeds(ctx, &[embed.build()], &[]).await?;

        Ok(())
    }

    /// Number of builds that do not fit in the embed.
    fn hidden(total: usize) -> usize {
        total.saturating_sub(Self::MAX_FIELDS)
    }

    async fn classic(ctx: Context, req: ClassicRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation(), req.responder()).await
    }

    async fn slash(ctx: Context, req: SlashRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation()?, req.responder()).await
    }
}

/// Command: Remove one of own saved builds.
pub struct RemoveBuild;

impl RemoveBuild {
    pub fn command() -> impl Into<BaseCommand> {
        use crate::commands::builder::*;

        command("removebuild", "Remove one of your saved builds.")
            .attach(Self::classic)
            .attach(Self::slash)
            .permissions(Permissions::ADMINISTRATOR)
            .option(
                string("code", "Build code.")
                    .required()
                    .min_length(registry::CODE_LEN as u16)
                    .max_length(registry::CODE_LEN as u16),
            )
    }

    async fn uber(ctx: &Context, inv: Invocation, mut out: Responder, args: &Args) -> CommandResult {
        let g = inv.guild_id;
        let code = args.string("code")?.to_uppercase();

        let text = match ctx.builds.remove(inv.user_id, &code) {
            Some(_) => {
                info!("User {} removed build '{code}'", inv.user_id);
                tr!(ctx, g, "removebuild.done", code = code)
            },
            None => tr!(ctx, g, "removebuild.not_found", code = escape_discord_chars(&code)),
        };

        out.text(ctx, &text).await?;

        Ok(())
    }

    async fn classic(ctx: Context, req: ClassicRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation(), req.responder(), &req.args).await
    }

    async fn slash(ctx: Context, req: SlashRequest) -> CommandResult {
        Self::uber(&ctx, req.invocation()?, req.responder(), &req.args).await
    }
}

/// Edits the command's status message at every deployment stage.
struct StatusMessage<'a> {
    ctx: &'a Context,
    guild_id: Option<Id<GuildMarker>>,
    out: &'a mut Responder,
}

#[async_trait]
impl Progress for StatusMessage<'_> {
    async fn update(&mut self, stage: Stage<'_>) -> AnyResult<()> {
        let (ctx, g) = (self.ctx, self.guild_id);

        let embed = match stage {
            Stage::Cleanup => embed(
                ctx,
                g,
                tr!(ctx, g, "deploy.cleanup_title"),
                tr!(ctx, g, "deploy.cleanup"),
                consts::COLOR_WARN,
            ),
            Stage::Building {
                category,
                index,
                total,
                tally,
            } => tally_fields(
                ctx,
                g,
                embed(
                    ctx,
                    g,
                    tr!(ctx, g, "deploy.title"),
                    tr!(
                        ctx,
                        g,
                        "deploy.building",
                        category = escape_discord_chars(category),
                        index = index,
                        total = total,
                    ),
                    consts::COLOR_WARN,
                ),
                tally,
            ),
            Stage::Finalizing { tally } => tally_fields(
                ctx,
                g,
                embed(
                    ctx,
                    g,
                    tr!(ctx, g, "deploy.title"),
                    tr!(ctx, g, "deploy.finalizing"),
                    consts::COLOR_WARN,
                ),
                tally,
            ),
        };

        self.out.embeds(ctx, &[embed.build()], &[]).await?;

        Ok(())
    }
}

/// A template by name, else a saved build by code.
fn find_structure(templates: &TemplateStore, builds: &BuildRegistry, name: &str) -> Option<Structure> {
    if let Some(template) = templates.get(name) {
        return Some(template.clone());
    }

    let code = name.to_uppercase();
    registry::is_code(&code).then(|| builds.get(&code)).flatten()
}

fn tally_fields(
    ctx: &Context,
    guild_id: Option<Id<GuildMarker>>,
    embed: EmbedBuilder,
    tally: Tally,
) -> EmbedBuilder {
    let field = |key: &str, count: usize| {
        EmbedFieldBuilder::new(tr!(ctx, guild_id, key), format!("`{count}`")).inline()
    };

    embed
        .field(field("field.categories", tally.categories))
        .field(field("field.channels", tally.channels))
        .field(field("field.roles", tally.roles))
}

/// Summary of a finished deployment.
fn report_embed(
    ctx: &Context,
    inv: &Invocation,
    name: &str,
    report: &DeploymentReport,
) -> Embed {
    let g = inv.guild_id;
    let problems = report.failed + report.skipped;

    let mut embed = tally_fields(
        ctx,
        g,
        embed(
            ctx,
            g,
            tr!(ctx, g, "deploy.success_title"),
            tr!(ctx, g, "deploy.success", name = escape_discord_chars(name)),
            if problems == 0 {
                consts::COLOR_OK
            } else {
                consts::COLOR_WARN
            },
        ),
        report.created,
    )
    .field(EmbedFieldBuilder::new(
        tr!(ctx, g, "field.cleaned"),
        tr!(
            ctx,
            g,
            "field.cleaned_value",
            channels = report.cleanup.channels,
            roles = report.cleanup.roles,
        ),
    ));

    if let Some(renamed) = &report.renamed {
        embed = embed.field(EmbedFieldBuilder::new(
            tr!(ctx, g, "field.renamed"),
            format!("`{}`", escape_discord_chars(renamed)),
        ));
    }

    if problems > 0 {
        embed = embed.field(EmbedFieldBuilder::new(
            tr!(ctx, g, "field.problems"),
            tr!(
                ctx,
                g,
                "field.problems_value",
                failed = report.failed,
                skipped = report.skipped,
            ),
        ));
    }

    embed.build()
}

/// Template list shown by `build` without arguments.
fn templates_embed(ctx: &Context, inv: &Invocation) -> Embed {
    let g = inv.guild_id;
    let intro = tr!(ctx, g, "templates.description", prefix = ctx.config.classic_prefix());

    let entries = if ctx.templates.is_empty() {
        tr!(ctx, g, "templates.empty")
    } else {
        ctx.templates
            .iter()
            .map(|(name, s)| {
                tr!(
                    ctx,
                    g,
                    "templates.entry",
                    name = name,
                    categories = s.categories.len(),
                    roles = s.roles.len(),
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    embed(
        ctx,
        g,
        tr!(ctx, g, "templates.title"),
        format!("{intro}\n\n{entries}"),
        consts::COLOR_OK,
    )
    .build()
}

/// Acknowledge a button click without changing the message yet.
async fn acknowledge(ctx: &Context, click: &Interaction) -> AnyResult<()> {
    let resp = InteractionResponse {
        kind: InteractionResponseType::DeferredUpdateMessage,
        data: None,
    };

    ctx.interaction()
        .create_response(click.id, &click.token, &resp)
        .await
        .context("Failed to acknowledge button")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::structure::RoleSpec;

    fn named(role: &str) -> Structure {
        Structure {
            roles: vec![RoleSpec {
                name: role.to_string(),
                permissions: vec![],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn templates_first_then_codes() {
        let dir = tempfile::tempdir().unwrap();
        let builds = BuildRegistry::load(dir.path().join("builds.json")).unwrap();
        let templates = TemplateStore::from_map(BTreeMap::from([(
            "Gaming".to_string(),
            named("Gamer"),
        )]));

        let code = builds.save_new(Id::new(1), named("Saved"));

        assert_eq!(find_structure(&templates, &builds, "GAMING"), Some(named("Gamer")));
        assert_eq!(find_structure(&templates, &builds, &code), Some(named("Saved")));
        assert_eq!(
            find_structure(&templates, &builds, &code.to_lowercase()),
            Some(named("Saved"))
        );
        assert_eq!(find_structure(&templates, &builds, "nothing"), None);
    }

    #[test]
    fn builds_past_the_field_limit_are_counted() {
        assert_eq!(Builds::hidden(0), 0);
        assert_eq!(Builds::hidden(Builds::MAX_FIELDS), 0);
        assert_eq!(Builds::hidden(Builds::MAX_FIELDS + 1), 1);
        assert_eq!(Builds::hidden(40), 15);
    }

    #[test]
    fn codes_resolve_globally_but_remove_is_owner_scoped() {
        let dir = tempfile::tempdir().unwrap();
        let builds = BuildRegistry::load(dir.path().join("builds.json")).unwrap();
        let templates = TemplateStore::default();

        let code = builds.save_new(Id::new(1), named("Saved"));

        // Anyone can deploy it.
        assert!(find_structure(&templates, &builds, &code).is_some());

        // Only the owner can remove it.
        assert_eq!(builds.remove(Id::new(2), &code), None);
        assert!(find_structure(&templates, &builds, &code).is_some());
        assert_eq!(builds.remove(Id::new(1), &code), Some(named("Saved")));
        assert!(find_structure(&templates, &builds, &code).is_none());
    }
}
