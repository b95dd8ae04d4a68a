use async_trait::async_trait;
use poise::serenity_prelude::{Context, FullEvent};
use std::fmt::Debug;
use tokio::sync::Mutex;

#[async_trait]
pub trait EventHandler: Send + Sync + Debug {
    fn name(&self) -> &str;
    async fn handle(
        &self,
        ctx: &Context,
        event: &FullEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Dispatches gateway events to the registered handlers, one at a time.
/// Each handler is awaited to completion before the next runs, so handlers
/// never observe each other mid-mutation.
#[derive(Debug, Default)]
pub struct EventManager {
    handlers: Mutex<Vec<Box<dyn EventHandler>>>,
}

impl EventManager {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
        }
    }

    pub async fn add_handler(&self, handler: impl EventHandler + 'static) {
        self.handlers.lock().await.push(Box::new(handler));
    }

    pub async fn handle_event(&self, ctx: &Context, event: &FullEvent) {
        let handlers = self.handlers.lock().await;

        for handler in handlers.iter() {
            if let Err(e) = handler.handle(ctx, event).await {
                tracing::error!("Error in event handler {}: {}", handler.name(), e);
            }
        }
    }
}
