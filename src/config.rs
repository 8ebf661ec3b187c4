//! Runtime configuration.
//!
//! Layered sources, later wins: embedded defaults, an optional JSON5 file,
//! then `SHEETBOT_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use color_eyre::eyre::{Result, eyre};
use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../.config/config.json5");

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Telegram bot API token.
    pub bot_token: String,
    /// Spreadsheet document id, from the document URL.
    pub spreadsheet_id: String,
    /// Worksheet (tab) title within the document.
    pub worksheet_name: String,
    /// OAuth2 bearer token for the Sheets API.
    pub api_token: String,
    /// Sheets API endpoint; overridable for tests.
    pub api_base: String,
    /// Telegram user ids permitted to use the bot.
    pub allowed_user_ids: Vec<u64>,
    pub message_cooldown_ms: u64,
    pub callback_cooldown_ms: u64,
}

impl Config {
    pub fn from_path(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut builder = config::Config::builder().add_source(
            config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Json5),
        );

        if let Some(path) = config_path {
            builder = builder.add_source(
                config::File::from(path.clone())
                    .format(config::FileFormat::Json5)
                    .required(true),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SHEETBOT")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("allowed_user_ids"),
        );

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.bot_token.is_empty() {
            return Err(eyre!("bot_token is not set"));
        }
        if self.spreadsheet_id.is_empty() {
            return Err(eyre!("spreadsheet_id is not set"));
        }
        if self.api_token.is_empty() {
            return Err(eyre!("api_token is not set"));
        }
        if self.allowed_user_ids.is_empty() {
            return Err(eyre!(
                "allowed_user_ids is empty, nobody would be able to use the bot"
            ));
        }
        Ok(())
    }

    pub fn message_cooldown(&self) -> Duration {
        Duration::from_millis(self.message_cooldown_ms)
    }

    pub fn callback_cooldown(&self) -> Duration {
        Duration::from_millis(self.callback_cooldown_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> Config {
        Config {
            bot_token: "123:abc".into(),
            spreadsheet_id: "sheet-id".into(),
            worksheet_name: "Sheet1".into(),
            api_token: "ya29.token".into(),
            api_base: "https://sheets.googleapis.com".into(),
            allowed_user_ids: vec![1],
            message_cooldown_ms: 1000,
            callback_cooldown_ms: 500,
        }
    }

    #[test]
    fn defaults_parse_but_fail_validation() {
        let cfg: Config = json5::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(cfg.worksheet_name, "Sheet1");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn filled_config_validates() {
        assert!(filled().validate().is_ok());
    }

    #[test]
    fn empty_allow_list_is_rejected() {
        let mut cfg = filled();
        cfg.allowed_user_ids.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn cooldowns_convert_to_durations() {
        let cfg = filled();
        assert_eq!(cfg.message_cooldown(), Duration::from_millis(1000));
        assert_eq!(cfg.callback_cooldown(), Duration::from_millis(500));
    }
}
