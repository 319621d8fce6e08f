use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use teloxide::prelude::*;
use teloxide::types::{InputFile, Me, ParseMode};
use teloxide::utils::command::BotCommands;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::admin::AdminGate;
use crate::config::{Config, FeatureFlags};
use crate::handlers::{self, Sender};
use crate::session::SessionStore;

/// Bot commands
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot and see the welcome message")]
    Start,
    #[command(description = "Show the help message")]
    Help,
    #[command(description = "About this bot")]
    About,
    #[command(description = "Show bot features")]
    Features,
    #[command(description = "Contact information")]
    Contact,
    #[command(description = "User statistics")]
    Stats,
    #[command(description = "Admin panel (admin only)")]
    Admin,
    #[command(description = "Export users as CSV (admin only)")]
    Export,
}

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub admins: AdminGate,
    pub sessions: Mutex<SessionStore>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let admins = AdminGate::new(&config.telegram.admin_ids);
        if admins.is_empty() {
            warn!("No admin IDs configured; /admin and /export will deny everyone");
        }
        Self {
            config,
            admins,
            sessions: Mutex::new(SessionStore::new()),
            started_at: Utc::now(),
        }
    }
}

fn sender_of(msg: &Message) -> Option<Sender> {
    let user = msg.from.as_ref()?;
    Some(Sender {
        chat_id: msg.chat.id.0,
        user_id: user.id.0,
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
    })
}

/// True for `/cmd@OtherBot` aimed at another bot in a shared group.
fn addressed_elsewhere(text: &str, bot_username: &str) -> bool {
    let first = text.split_whitespace().next().unwrap_or_default();
    match first.split_once('@') {
        Some((_, target)) => !target.eq_ignore_ascii_case(bot_username),
        None => false,
    }
}

/// Photos and documents whose feature flag is off are dropped quietly.
fn is_disabled_media(features: &FeatureFlags, has_photo: bool, has_document: bool) -> bool {
    (has_photo && !features.photo_handling) || (has_document && !features.document_handling)
}

async fn reply_html(bot: &Bot, msg: &Message, text: impl Into<String>) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, text.into())
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Start the Telegram bot
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let bot = Bot::new(&state.config.telegram.bot_token);

    info!("Starting Telegram bot...");

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Failed to register command list: {}", e);
    }

    let features = state.config.features.clone();
    let handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            dptree::filter(move |msg: Message| features.photo_handling && msg.photo().is_some())
                .endpoint(handle_photo),
        )
        .branch({
            let features = state.config.features.clone();
            dptree::filter(move |msg: Message| {
                features.document_handling && msg.document().is_some()
            })
            .endpoint(handle_document)
        })
        .branch({
            let features = state.config.features.clone();
            dptree::filter(move |msg: Message| {
                is_disabled_media(&features, msg.photo().is_some(), msg.document().is_some())
            })
            .endpoint(ignore_media)
        })
        .branch(
            dptree::filter_map(|msg: Message| msg.text().map(str::to_owned))
                .endpoint(handle_text),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("bot"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let sender = match sender_of(&msg) {
        Some(s) => s,
        None => return Ok(()),
    };
    info!(
        "Command {:?} from user {} in chat {}",
        cmd, sender.user_id, sender.chat_id
    );

    let config = &state.config;
    match cmd {
        Command::Start => {
            let payload = {
                let mut sessions = state.sessions.lock().await;
                let payload = handlers::on_start(
                    &mut sessions,
                    &sender,
                    Utc::now(),
                    &config.features,
                    &config.messages,
                );
                debug!("Tracking {} chats", sessions.count());
                payload
            };
            reply_html(&bot, &msg, payload.render()).await
        }
        Command::Help => reply_html(&bot, &msg, handlers::help_text(&config.bot)).await,
        Command::About => reply_html(&bot, &msg, handlers::about_text(&config.bot)).await,
        Command::Features => {
            reply_html(&bot, &msg, handlers::features_text(&config.features)).await
        }
        Command::Contact => reply_html(&bot, &msg, handlers::contact_text()).await,
        Command::Stats => {
            let payload = {
                let sessions = state.sessions.lock().await;
                handlers::on_stats_command(
                    &sessions,
                    sender.chat_id,
                    Utc::now(),
                    &config.bot,
                    &config.features,
                )
            };
            reply_html(&bot, &msg, payload.render()).await
        }
        Command::Admin => {
            if !config.features.admin_panel {
                return reply_html(&bot, &msg, config.messages.admin_only.clone()).await;
            }
            let result = {
                let sessions = state.sessions.lock().await;
                handlers::on_admin_command(
                    &sessions,
                    &state.admins,
                    sender.user_id,
                    state.started_at,
                    Utc::now(),
                )
            };
            match result {
                Ok(payload) => reply_html(&bot, &msg, payload.render()).await,
                Err(_) => reply_html(&bot, &msg, handlers::access_denied()).await,
            }
        }
        Command::Export => {
            if !config.features.admin_panel {
                return reply_html(&bot, &msg, config.messages.admin_only.clone()).await;
            }
            let result = {
                let sessions = state.sessions.lock().await;
                handlers::on_export_command(&sessions, &state.admins, sender.user_id)
            };
            match result {
                Ok(Ok(csv)) => {
                    let file = InputFile::memory(csv.into_bytes()).file_name("users.csv");
                    bot.send_document(msg.chat.id, file).await?;
                    Ok(())
                }
                Ok(Err(_)) => reply_html(&bot, &msg, handlers::access_denied()).await,
                Err(e) => {
                    error!("Export failed: {:#}", e);
                    bot.send_message(msg.chat.id, "Export failed, see logs.")
                        .await?;
                    Ok(())
                }
            }
        }
    }
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    text: String,
    me: Me,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let sender = match sender_of(&msg) {
        Some(s) => s,
        None => return Ok(()),
    };

    if text.starts_with('/') {
        let username = me.user.username.as_deref().unwrap_or_default();
        if addressed_elsewhere(&text, username) {
            debug!("Ignoring command for another bot in chat {}", sender.chat_id);
            return Ok(());
        }
    }

    info!(
        "Message from user {} in chat {}: {}",
        sender.user_id, sender.chat_id, text
    );

    if text.starts_with('/') {
        let reply = state.config.messages.get("unknown_command").to_string();
        return reply_html(&bot, &msg, reply).await;
    }

    let reply = {
        let mut sessions = state.sessions.lock().await;
        handlers::on_incoming_text(
            &mut sessions,
            &sender,
            &text,
            Utc::now(),
            &state.config.features,
            &state.config.messages,
        )
    };

    reply_html(&bot, &msg, reply).await
}

async fn ignore_media(msg: Message) -> ResponseResult<()> {
    debug!("Media handling disabled; ignoring message in chat {}", msg.chat.id);
    Ok(())
}

async fn handle_photo(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    info!("Photo received in chat {}", msg.chat.id);
    reply_html(&bot, &msg, handlers::on_photo(&state.config.messages)).await
}

async fn handle_document(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    info!("Document received in chat {}", msg.chat.id);
    reply_html(&bot, &msg, handlers::on_document(&state.config.messages)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/start", "probot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/stats", "probot").unwrap(), Command::Stats);
        assert_eq!(Command::parse("/export", "probot").unwrap(), Command::Export);
        assert!(Command::parse("/unknown", "probot").is_err());
    }

    #[test]
    fn test_descriptions_list_every_command() {
        let text = Command::descriptions().to_string();
        let names = [
            "/start", "/help", "/about", "/features", "/contact", "/stats", "/admin", "/export",
        ];
        for name in names {
            assert!(text.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_app_state_builds_admin_gate() {
        let config = Config::from_toml_str(
            "[telegram]\nbot_token = \"t\"\nadmin_ids = [5, 6]\n",
        )
        .unwrap();
        let state = AppState::new(config);
        assert!(state.admins.is_admin(5));
        assert!(!state.admins.is_admin(7));
    }

    #[test]
    fn test_help_lists_each_command_once() {
        let help = handlers::help_text(&crate::config::BotInfo::default());
        for cmd in Command::bot_commands() {
            let line = format!("/{} - ", cmd.command.trim_start_matches('/'));
            assert_eq!(help.matches(&line).count(), 1, "{line}");
        }
    }

    #[test]
    fn test_commands_for_other_bots_are_ignored() {
        assert!(addressed_elsewhere("/start@OtherBot", "probot"));
        assert!(addressed_elsewhere("/help@other_bot please", "probot"));
        assert!(!addressed_elsewhere("/start@ProBot", "probot"));
        assert!(!addressed_elsewhere("/frobnicate", "probot"));
        assert!(!addressed_elsewhere("/start now @someone", "probot"));
    }

    #[test]
    fn test_disabled_media_is_dropped() {
        let mut features = FeatureFlags::default();
        assert!(!is_disabled_media(&features, true, false));
        assert!(!is_disabled_media(&features, false, true));

        features.photo_handling = false;
        features.document_handling = false;
        assert!(is_disabled_media(&features, true, false));
        assert!(is_disabled_media(&features, false, true));
        assert!(!is_disabled_media(&features, false, false));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_texts_counted_exactly_once() {
        const TASKS: u64 = 64;
        let config = Config::from_toml_str(
            "[telegram]\nbot_token = \"t\"\nadmin_ids = [5]\n",
        )
        .unwrap();
        let state = Arc::new(AppState::new(config));

        let handles: Vec<_> = (0..TASKS)
            .map(|i| {
                let state = state.clone();
                tokio::spawn(async move {
                    let sender = Sender {
                        chat_id: 100,
                        user_id: 9,
                        username: None,
                        first_name: Some("Ann".into()),
                    };
                    let mut sessions = state.sessions.lock().await;
                    handlers::on_incoming_text(
                        &mut sessions,
                        &sender,
                        &format!("message {i}"),
                        Utc::now(),
                        &state.config.features,
                        &state.config.messages,
                    )
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let sessions = state.sessions.lock().await;
        assert_eq!(sessions.count(), 1);
        assert_eq!(sessions.get(100).unwrap().interaction_count, TASKS);
    }
}
