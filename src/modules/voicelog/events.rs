use async_trait::async_trait;
use chrono::Utc;
use poise::serenity_prelude::{
    ChannelId, Context, CreateEmbed, CreateEmbedFooter, CreateMessage, FullEvent, Timestamp, User,
};
use tracing::error;

use crate::{database::Database, events::EventHandler, utils::discord_timestamp};

use super::database::VoiceLogDatabase;

const EMBED_COLOR: u32 = 0xFF4500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceAction {
    Joined(ChannelId),
    Left(ChannelId),
}

impl VoiceAction {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Joined(_) => "joined",
            Self::Left(_) => "left",
        }
    }

    /// The voice channel the notification is about: the destination for a
    /// join, the channel left behind for a leave.
    pub fn channel_id(&self) -> ChannelId {
        match self {
            Self::Joined(id) | Self::Left(id) => *id,
        }
    }
}

/// Classify a voice state transition by its channel ids. A move between two
/// channels counts as joining the destination only; the channel left behind
/// is not reported separately.
pub fn classify_transition(
    old: Option<ChannelId>,
    new: Option<ChannelId>,
) -> Option<VoiceAction> {
    if old == new {
        return None;
    }

    match (old, new) {
        (_, Some(joined)) => Some(VoiceAction::Joined(joined)),
        (Some(left), None) => Some(VoiceAction::Left(left)),
        (None, None) => None,
    }
}

/// Posts a notification to the guild's registered log channel for every
/// voice channel join and leave.
#[derive(Debug, Clone)]
pub struct VoiceLogHandler {
    db: Database<VoiceLogDatabase>,
}

impl VoiceLogHandler {
    pub fn new(db: Database<VoiceLogDatabase>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventHandler for VoiceLogHandler {
    fn name(&self) -> &str {
        "VoiceLog"
    }

    async fn handle(
        &self,
        ctx: &Context,
        event: &FullEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let FullEvent::VoiceStateUpdate { old, new } = event else {
            return Ok(());
        };

        let old_channel = old.as_ref().and_then(|state| state.channel_id);
        let Some(action) = classify_transition(old_channel, new.channel_id) else {
            return Ok(());
        };

        let guild_id = match old
            .as_ref()
            .and_then(|state| state.guild_id)
            .or(new.guild_id)
        {
            Some(id) => id,
            None => return Ok(()),
        };

        // Not every guild opts in
        let Some(log_channel_id) = self.db.log_channel(guild_id).await else {
            return Ok(());
        };

        // The registration may be stale; a vanished log channel drops the event
        if ctx.cache.channel(log_channel_id).is_none() {
            return Ok(());
        }

        let user = match &new.member {
            Some(member) => member.user.clone(),
            None => match new.user_id.to_user(ctx).await {
                Ok(user) => user,
                Err(e) => {
                    error!("Failed to resolve user {}: {}", new.user_id, e);
                    return Ok(());
                }
            },
        };

        let channel_name = ctx
            .cache
            .channel(action.channel_id())
            .map(|channel| channel.name.clone())
            .unwrap_or_else(|| action.channel_id().to_string());

        let bot_avatar = ctx.cache.current_user().avatar_url();
        let embed = voice_log_embed(&user, action, &channel_name, bot_avatar);

        if let Err(e) = log_channel_id
            .send_message(&ctx.http, CreateMessage::new().embed(embed))
            .await
        {
            error!("Failed to send voice log to {}: {}", log_channel_id, e);
        }

        Ok(())
    }
}

fn embed_title(username: &str, action: VoiceAction) -> String {
    format!("{} {} a voice channel", username, action.verb())
}

fn embed_description(username: &str, action: VoiceAction, channel_name: &str) -> String {
    format!(
        "**User:** {}\n**Action:** {}\n**Channel:** {}",
        username,
        action.verb(),
        channel_name
    )
}

fn voice_log_embed(
    user: &User,
    action: VoiceAction,
    channel_name: &str,
    bot_avatar_url: Option<String>,
) -> CreateEmbed {
    let mut footer = CreateEmbedFooter::new("Voice Activity Log");
    if let Some(url) = bot_avatar_url {
        footer = footer.icon_url(url);
    }

    CreateEmbed::new()
        .color(EMBED_COLOR)
        .title(embed_title(&user.name, action))
        .description(embed_description(&user.name, action, channel_name))
        .field("Time", discord_timestamp(Utc::now().timestamp()), true)
        .timestamp(Timestamp::now())
        .footer(footer)
        .thumbnail(user.face())
}
