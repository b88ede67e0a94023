use std::fs;
use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;
use twilight_cache_inmemory::InMemoryCache;
use twilight_gateway::{Event, Intents, Shard, ShardId};
use twilight_http::client::InteractionClient;
use twilight_http::Client;
use twilight_model::application::interaction::{Interaction, InteractionData};
use twilight_model::channel::{Channel, Message};
use twilight_model::gateway::payload::incoming::Ready;
use twilight_model::guild::Role;
use twilight_model::id::marker::{ApplicationMarker, ChannelMarker, GuildMarker, RoleMarker};
use twilight_model::id::Id;
use twilight_model::user::CurrentUser;
use twilight_standby::Standby;

use crate::commands::{handle, CommandError, Commands};
use crate::config::BotConfig;
use crate::locale::{LanguagePrefs, Localization};
use crate::registry::BuildRegistry;
use crate::templates::TemplateStore;
use crate::utils::prelude::*;

mod commands;
mod config;
mod confirm;
mod deploy;
mod guild;
mod locale;
mod parser;
mod registry;
mod snapshot;
mod structure;
mod templates;
mod utils;

#[derive(Debug, Clone)]
pub struct Context {
    config: Arc<BotConfig>,
    http: Arc<Client>,
    application_id: Id<ApplicationMarker>,
    user: Arc<CurrentUser>,
    cache: Arc<InMemoryCache>,
    standby: Arc<Standby>,
    commands: Arc<Commands>,
    templates: Arc<TemplateStore>,
    builds: Arc<BuildRegistry>,
    locales: Arc<Localization>,
    languages: Arc<LanguagePrefs>,
}

impl Context {
    /// Interaction client of the bot application.
    pub fn interaction(&self) -> InteractionClient<'_> {
        self.http.interaction(self.application_id)
    }

    /// Roles by id, from the cache when possible.
    pub async fn roles_from(
        &self,
        guild_id: Id<GuildMarker>,
        role_ids: &[Id<RoleMarker>],
    ) -> AnyResult<Vec<Role>> {
        let cached: Vec<_> = role_ids
            .iter()
            .filter_map(|id| self.cache.role(*id).map(|r| r.resource().clone()))
            .collect();

        if cached.len() == role_ids.len() {
            return Ok(cached);
        }

        trace!("Roles of guild {guild_id} not cached, fetching");

        let roles = self
            .http
            .roles(guild_id)
            .send()
            .await
            .context("Failed to get guild roles")?;

        Ok(roles
            .into_iter()
            .filter(|r| role_ids.contains(&r.id))
            .collect())
    }

    /// A channel by id, from the cache when possible.
    pub async fn channel_from(&self, channel_id: Id<ChannelMarker>) -> AnyResult<Channel> {
        if let Some(channel) = self.cache.channel(channel_id) {
            return Ok(channel.value().clone());
        }

        self.http
            .channel(channel_id)
            .send()
            .await
            .context("Failed to get channel")
    }
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    // Load environment variables from `./.env` file, if any exists.
    simple_env_load::load_env_from(&[".env"]);

    // Create data folder if it doesn't exist yet.
    fs::create_dir_all("./data/").context("Failed to create data folder")?;

    // Create a log file or truncate an existing one.
    let logfile = fs::File::create("./data/log.log").context("Failed to create log file")?;

    // Initialize the logger to use `RUST_LOG` environment variable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(Mutex::new(logfile))
        .compact()
        .init();

    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        return Err(e);
    }

    Ok(())
}

async fn run() -> AnyResult<()> {
    // Load bot configuration file.
    let config = BotConfig::new()?;
    let settings = config.settings();

    // Get discord bot token from environment variable.
    let token = std::env::var("DISCORD_TOKEN").context("Expected a token in the environment")?;

    let locales = Localization::embedded(&settings.language)?;
    let languages = LanguagePrefs::new(settings.language.clone());
    let templates = TemplateStore::load(&settings.templates);
    let builds = BuildRegistry::load(&settings.builds)?;

    // Create an http client.
    let http = Arc::new(Client::new(token.clone()));

    // Get the application info, such as its id.
    let application = http.current_user_application().await?.model().await?;

    // Get the bot user info.
    let user = Arc::new(http.current_user().await?.model().await?);

    let ctx = Context {
        config: Arc::new(config),
        http,
        application_id: application.id,
        user,
        cache: Arc::new(InMemoryCache::new()),
        standby: Arc::new(Standby::new()),
        commands: Arc::new(commands::bot::create_commands()?),
        templates: Arc::new(templates),
        builds: Arc::new(builds),
        locales: Arc::new(locales),
        languages: Arc::new(languages),
    };

    // A single shard is plenty for a bot of this scale.
    let mut shard = Shard::new(ShardId::ONE, token, intents());

    info!("Starting '{}'", ctx.user.name);

    loop {
        let event = tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down by ctrl-c");
                break;
            },
            event = shard.next_event() => event,
        };

        let event = match event {
            Ok(event) => event,
            Err(e) if e.is_fatal() => {
                return Err(anyhow::anyhow!(e).context("Fatal gateway error"));
            },
            Err(e) => {
                warn!("Failed to receive event: {e}");
                continue;
            },
        };

        // Update the cache and resolve anything waiting for the event.
        ctx.cache.update(&event);
        ctx.standby.process(&event);

        tokio::spawn(handle_event(ctx.clone(), event));
    }

    Ok(())
}

/// Main events handler.
async fn handle_event(ctx: Context, event: Event) {
    let result = match event {
        Event::Ready(r) => handle_ready(&ctx, *r).await,
        Event::InteractionCreate(i) => handle_interaction_create(&ctx, i.0).await,
        Event::MessageCreate(msg) => handle_message_create(&ctx, msg.0).await,

        // Other events here...
        event => {
            trace!("Event: {:?}", event.kind());
            Ok(())
        },
    };

    if let Err(e) = result {
        error!("Event handler error: {e:#}");
    }
}

async fn handle_ready(ctx: &Context, ready: Ready) -> AnyResult<()> {
    info!("Ready: '{}' in {} guilds", ready.user.name, ready.guilds.len());

    let commands = ctx.commands.twilight_commands()?;

    ctx.interaction()
        .set_global_commands(&commands)
        .await
        .context("Failed to register slash commands")?;

    info!("Registered {} slash commands", commands.len());

    Ok(())
}

async fn handle_interaction_create(ctx: &Context, mut inter: Interaction) -> AnyResult<()> {
    // Component clicks are delivered to their dialogs by standby.
    let Some(InteractionData::ApplicationCommand(data)) = inter.data.take() else {
        return Ok(());
    };

    match handle::application_command(ctx, inter, *data).await {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!("Slash command failed: {e}");
            Ok(())
        },
    }
}

async fn handle_message_create(ctx: &Context, msg: Message) -> AnyResult<()> {
    // Ignore bot users.
    if msg.author.bot {
        return Ok(());
    }

    match handle::classic_command(ctx, Arc::new(msg)).await {
        // Message was not meant for us.
        Ok(()) | Err(CommandError::NotPrefixed) => (),

        // Already reported to the user.
        Err(e) => debug!("Classic command failed: {e}"),
    }

    Ok(())
}

fn intents() -> Intents {
    Intents::GUILDS | Intents::GUILD_MESSAGES | Intents::DIRECT_MESSAGES | Intents::MESSAGE_CONTENT
}
