use crate::events::EventHandler;
use async_trait::async_trait;
use poise::serenity_prelude::{ActivityData, Context, FullEvent, OnlineStatus};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ReadyHandler;

#[async_trait]
impl EventHandler for ReadyHandler {
    fn name(&self) -> &str {
        "Ready"
    }

    async fn handle(
        &self,
        ctx: &Context,
        event: &FullEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let FullEvent::Ready { data_about_bot, .. } = event {
            info!("Bot is online as {}", data_about_bot.user.tag());
            ctx.set_presence(
                Some(ActivityData::watching("voice channels")),
                OnlineStatus::Online,
            )
        }
        Ok(())
    }
}
