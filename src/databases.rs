use crate::database::Database;
use crate::modules::voicelog::database::VoiceLogDatabase;

#[derive(Debug)]
pub struct Databases {
    pub voicelog: Database<VoiceLogDatabase>,
}

impl Databases {
    pub async fn default() -> Result<Self, crate::database::DbError> {
        Ok(Self {
            voicelog: Database::new("data/log_channels.json").await?,
        })
    }
}
