use databases::Databases;
use modules::{
    system::events::ReadyHandler,
    voicelog::{commands::senkumonitor, events::VoiceLogHandler},
};
use poise::serenity_prelude::{self as serenity, CreateAllowedMentions};
use std::sync::Arc;
use tracing::{error, info, trace};

mod database;
mod databases;
mod events;
mod modules;
mod utils;

use crate::events::EventManager;

#[derive(Clone, Debug)]
pub struct Data {
    pub dbs: Arc<Databases>,
    pub event_manager: Arc<EventManager>,
}

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();
    info!("starting senkumonitor");

    let token = std::env::var("DISCORD_TOKEN").expect("missing DISCORD_TOKEN");
    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::GUILD_VOICE_STATES
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions::<Data, Error> {
            allowed_mentions: Some(CreateAllowedMentions::new().empty_roles().empty_users()),
            commands: vec![senkumonitor()],
            pre_command: |ctx| {
                Box::pin(async move {
                    trace!(
                        "Command {} used by {} in {}",
                        ctx.command().qualified_name,
                        ctx.author().tag(),
                        ctx.guild_id()
                            .map_or_else(|| "DM".to_string(), |id| id.to_string())
                    );
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    info!(
                        "Command {} completed for {} in {}",
                        ctx.command().qualified_name,
                        ctx.author().tag(),
                        ctx.guild_id()
                            .map_or_else(|| "DM".to_string(), |id| id.to_string())
                    );
                })
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            error!(
                                "Command {} failed for {} in {}: {:?}",
                                ctx.command().qualified_name,
                                ctx.author().tag(),
                                ctx.guild_id()
                                    .map_or_else(|| "DM".to_string(), |id| id.to_string()),
                                error
                            );
                        }
                        err => error!("Other framework error: {:?}", err),
                    }
                })
            },
            event_handler: |ctx, event, _framework, data| {
                Box::pin(async move {
                    data.event_manager.handle_event(ctx, event).await;
                    Ok(())
                })
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                info!("registering commands");
                // Out-of-date slash commands are survivable; a missing registry is not
                if let Err(e) =
                    poise::builtins::register_globally(ctx, &framework.options().commands).await
                {
                    error!("Failed to register slash commands: {}", e);
                }

                let dbs = Arc::new(Databases::default().await?);
                let event_manager = Arc::new(EventManager::new());

                event_manager.add_handler(ReadyHandler).await;
                event_manager
                    .add_handler(VoiceLogHandler::new(dbs.voicelog.clone()))
                    .await;

                Ok(Data { dbs, event_manager })
            })
        })
        .build();

    let client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await;

    client.unwrap().start().await.unwrap();
}
