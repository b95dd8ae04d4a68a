use poise::serenity_prelude::{ChannelId, GuildId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::database::{Database, DbError};

/// Per-guild log channel registrations. Persisted as a flat JSON object of
/// guild id to channel id, e.g. `{"123456789012345678": "987654321098765432"}`.
#[derive(Default, Serialize, Deserialize, Clone, Debug)]
#[serde(transparent)]
pub struct VoiceLogDatabase {
    pub log_channels: HashMap<GuildId, ChannelId>,
}

impl Database<VoiceLogDatabase> {
    /// The log channel registered for a guild, if it has opted in.
    pub async fn log_channel(&self, guild_id: GuildId) -> Option<ChannelId> {
        self.read(|db| db.log_channels.get(&guild_id).copied())
            .await
    }

    /// Register `channel_id` as the guild's log channel, replacing any
    /// previous registration. Persisted before this returns.
    pub async fn set_log_channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<(), DbError> {
        self.transaction(|db| {
            db.log_channels.insert(guild_id, channel_id);
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("senkumonitor-{}-{}.json", name, std::process::id()))
            .to_string_lossy()
            .into_owned()
    }

    #[tokio::test]
    async fn test_load_creates_missing_file() {
        let path = temp_db_path("load-creates");
        let _ = std::fs::remove_file(&path);

        let db: Database<VoiceLogDatabase> = Database::new(path.clone()).await.unwrap();

        assert!(std::path::Path::new(&path).exists());
        assert_eq!(db.log_channel(GuildId::new(1)).await, None);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let path = temp_db_path("load-idempotent");
        let _ = std::fs::remove_file(&path);

        let first: Database<VoiceLogDatabase> = Database::new(path.clone()).await.unwrap();
        let second: Database<VoiceLogDatabase> = Database::new(path.clone()).await.unwrap();

        assert!(first.read(|db| db.log_channels.is_empty()).await);
        assert!(second.read(|db| db.log_channels.is_empty()).await);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_set_then_reload_round_trips() {
        let path = temp_db_path("round-trip");
        let _ = std::fs::remove_file(&path);

        let guild = GuildId::new(123456789012345678);
        let channel = ChannelId::new(987654321098765432);

        let db: Database<VoiceLogDatabase> = Database::new(path.clone()).await.unwrap();
        db.set_log_channel(guild, channel).await.unwrap();

        let reloaded: Database<VoiceLogDatabase> = Database::new(path.clone()).await.unwrap();
        assert_eq!(reloaded.log_channel(guild).await, Some(channel));
        assert_eq!(
            reloaded.read(|db| db.log_channels.len()).await,
            db.read(|db| db.log_channels.len()).await
        );

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_set_overwrites_previous_channel() {
        let path = temp_db_path("overwrite");
        let _ = std::fs::remove_file(&path);

        let guild = GuildId::new(42);

        let db: Database<VoiceLogDatabase> = Database::new(path.clone()).await.unwrap();
        db.set_log_channel(guild, ChannelId::new(100)).await.unwrap();
        db.set_log_channel(guild, ChannelId::new(200)).await.unwrap();

        assert_eq!(db.log_channel(guild).await, Some(ChannelId::new(200)));
        assert_eq!(db.read(|db| db.log_channels.len()).await, 1);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_unknown_guild_has_no_log_channel() {
        let path = temp_db_path("unknown-guild");
        let _ = std::fs::remove_file(&path);

        let db: Database<VoiceLogDatabase> = Database::new(path.clone()).await.unwrap();
        db.set_log_channel(GuildId::new(1), ChannelId::new(2))
            .await
            .unwrap();

        assert_eq!(db.log_channel(GuildId::new(9)).await, None);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_corrupt_file_fails_load() {
        let path = temp_db_path("corrupt");
        std::fs::write(&path, "not json at all").unwrap();

        let result: Result<Database<VoiceLogDatabase>, _> = Database::new(path.clone()).await;
        assert!(result.is_err());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_file_layout_is_flat_string_map() {
        let path = temp_db_path("layout");
        let _ = std::fs::remove_file(&path);

        let db: Database<VoiceLogDatabase> = Database::new(path.clone()).await.unwrap();
        db.set_log_channel(GuildId::new(123456789012345678), ChannelId::new(987654321098765432))
            .await
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["123456789012345678"], "987654321098765432");

        // Pretty-printed, 2-space indentation
        assert!(contents.contains("\n  \"123456789012345678\""));

        let _ = std::fs::remove_file(&path);
    }
}
