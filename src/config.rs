use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Placeholder values shipped in the config template; a config still
/// carrying them is not ready to run.
pub const PLACEHOLDER_TOKEN: &str = "YOUR_BOT_TOKEN_HERE";
pub const PLACEHOLDER_ADMIN_ID: u64 = 123456789;

const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub bot: BotInfo,
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    pub messages: Messages,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub admin_ids: Vec<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotInfo {
    #[serde(default = "default_bot_name")]
    pub name: String,
    #[serde(default = "default_bot_version")]
    pub version: String,
    #[serde(default = "default_bot_description")]
    pub description: String,
}

impl Default for BotInfo {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            version: default_bot_version(),
            description: default_bot_description(),
        }
    }
}

/// Named on/off switches for bot features
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FeatureFlags {
    pub ai_chat: bool,
    pub file_processing: bool,
    pub user_management: bool,
    pub analytics: bool,
    pub admin_panel: bool,
    pub welcome_message: bool,
    pub smart_responses: bool,
    pub photo_handling: bool,
    pub document_handling: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            ai_chat: true,
            file_processing: true,
            user_management: true,
            analytics: true,
            admin_panel: true,
            welcome_message: true,
            smart_responses: true,
            photo_handling: true,
            document_handling: true,
        }
    }
}

impl FeatureFlags {
    pub const NAMES: [&'static str; 9] = [
        "ai_chat",
        "file_processing",
        "user_management",
        "analytics",
        "admin_panel",
        "welcome_message",
        "smart_responses",
        "photo_handling",
        "document_handling",
    ];

    /// Look a flag up by name. Unknown names are disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        match name {
            "ai_chat" => self.ai_chat,
            "file_processing" => self.file_processing,
            "user_management" => self.user_management,
            "analytics" => self.analytics,
            "admin_panel" => self.admin_panel,
            "welcome_message" => self.welcome_message,
            "smart_responses" => self.smart_responses,
            "photo_handling" => self.photo_handling,
            "document_handling" => self.document_handling,
            _ => false,
        }
    }

    pub fn enabled_count(&self) -> usize {
        Self::NAMES.iter().filter(|n| self.is_enabled(n)).count()
    }
}

/// User-facing message strings
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Messages {
    pub welcome: String,
    pub help: String,
    pub unknown_command: String,
    pub file_received: String,
    pub photo_received: String,
    pub admin_only: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            welcome: "🤖 Welcome to ProBot! Your professional assistant is ready to help."
                .to_string(),
            help: "📚 Use /help to see available commands and features.".to_string(),
            unknown_command: "❓ Unknown command. Type /help to see available commands."
                .to_string(),
            file_received: "📁 File received and processed successfully!".to_string(),
            photo_received: "📸 Photo received and analyzed!".to_string(),
            admin_only: "🔒 This command is available to administrators only.".to_string(),
        }
    }
}

impl Messages {
    pub fn get(&self, key: &str) -> &str {
        match key {
            "welcome" => &self.welcome,
            "help" => &self.help,
            "unknown_command" => &self.unknown_command,
            "file_received" => &self.file_received,
            "photo_received" => &self.photo_received,
            "admin_only" => &self.admin_only,
            _ => "Message not found",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    #[serde(default = "default_true")]
    pub daily_stats: bool,
    /// Six-field cron expression (with seconds)
    #[serde(default = "default_daily_stats_cron")]
    pub daily_stats_cron: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            daily_stats: true,
            daily_stats_cron: default_daily_stats_cron(),
        }
    }
}

/// Startup readiness report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidation {
    pub admin_ids_set: bool,
    pub bot_token_set: bool,
    pub features_configured: bool,
}

impl ConfigValidation {
    pub fn is_ready(&self) -> bool {
        self.admin_ids_set && self.bot_token_set
    }
}

fn default_bot_name() -> String {
    "ProBot".to_string()
}

fn default_bot_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_bot_description() -> String {
    "Professional Telegram Bot with AI features".to_string()
}

fn default_true() -> bool {
    true
}

fn default_daily_stats_cron() -> String {
    "0 0 0 * * *".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                config.telegram.bot_token = token;
            }
        }

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid configuration")
    }

    pub fn validate(&self) -> ConfigValidation {
        let token = self.telegram.bot_token.trim();
        let ids = &self.telegram.admin_ids;
        ConfigValidation {
            admin_ids_set: !ids.is_empty() && !ids.contains(&PLACEHOLDER_ADMIN_ID),
            bot_token_set: !token.is_empty() && token != PLACEHOLDER_TOKEN,
            features_configured: self.features.enabled_count() > 0,
        }
    }

    /// Refuse to start on a missing token or an unset admin list.
    pub fn ensure_ready(&self) -> Result<()> {
        let report = self.validate();
        if report.is_ready() {
            return Ok(());
        }
        if !report.bot_token_set {
            bail!(
                "Bot token is not set: fill [telegram].bot_token or export {}",
                TOKEN_ENV
            );
        }
        bail!(
            "Admin IDs are not set: replace the placeholder in [telegram].admin_ids \
             with real Telegram user IDs"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
[telegram]
bot_token = "12345:abc"
admin_ids = [42]
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.telegram.admin_ids, vec![42]);
        assert_eq!(config.bot.name, "ProBot");
        assert_eq!(config.features, FeatureFlags::default());
        assert_eq!(config.messages, Messages::default());
        assert!(config.analytics.daily_stats);
        assert_eq!(config.analytics.daily_stats_cron, "0 0 0 * * *");
        assert!(config.ensure_ready().is_ok());
    }

    #[test]
    fn test_partial_sections_merge_with_defaults() {
        let config = Config::from_toml_str(
            r#"
[telegram]
bot_token = "t"
admin_ids = [1, 2]

[features]
photo_handling = false
document_handling = false

[messages]
welcome = "Hi from the community bot"
"#,
        )
        .unwrap();
        assert!(!config.features.photo_handling);
        assert!(!config.features.is_enabled("document_handling"));
        assert!(config.features.is_enabled("smart_responses"));
        assert_eq!(config.features.enabled_count(), 7);
        assert_eq!(config.messages.get("welcome"), "Hi from the community bot");
        assert_eq!(config.messages.help, Messages::default().help);
    }

    #[test]
    fn test_unknown_feature_and_message() {
        let flags = FeatureFlags::default();
        assert!(!flags.is_enabled("teleportation"));
        assert_eq!(Messages::default().get("nope"), "Message not found");
    }

    #[test]
    fn test_validate_rejects_placeholders() {
        let config = Config::from_toml_str(
            r#"
[telegram]
bot_token = "YOUR_BOT_TOKEN_HERE"
admin_ids = [123456789]
"#,
        )
        .unwrap();
        let report = config.validate();
        assert!(!report.bot_token_set);
        assert!(!report.admin_ids_set);
        assert!(report.features_configured);
        assert!(!report.is_ready());
        assert!(config.ensure_ready().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_admins() {
        let config = Config::from_toml_str(
            r#"
[telegram]
bot_token = "real"
"#,
        )
        .unwrap();
        let err = config.ensure_ready().unwrap_err();
        assert!(err.to_string().contains("Admin IDs"));
    }

    #[test]
    fn test_missing_telegram_section_fails() {
        assert!(Config::from_toml_str("[bot]\nname = \"x\"\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.telegram.admin_ids, vec![42]);
        assert!(!config.telegram.bot_token.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/probot.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
