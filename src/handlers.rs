//! Transport-independent entry points.
//!
//! Every function here is synchronous and takes the session store
//! explicitly; the Telegram layer owns locking and message delivery.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::admin::AdminGate;
use crate::classifier;
use crate::config::{BotInfo, FeatureFlags, Messages};
use crate::error::CoreError;
use crate::export;
use crate::session::{BotStats, SessionStore};

/// Who sent an inbound update
#[derive(Debug, Clone)]
pub struct Sender {
    pub chat_id: i64,
    pub user_id: u64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

/// Menu entries shown under the welcome message (command, description)
pub const WELCOME_MENU: [(&str, &str); 4] = [
    ("/features", "🚀 Features"),
    ("/stats", "📊 Stats"),
    ("/help", "ℹ️ Help"),
    ("/admin", "👨‍💻 Admin Panel"),
];

#[derive(Debug, Clone)]
pub struct WelcomePayload {
    pub text: String,
    pub menu: &'static [(&'static str, &'static str)],
}

impl WelcomePayload {
    pub fn render(&self) -> String {
        let mut out = self.text.clone();
        out.push_str("\n\n");
        for (command, label) in self.menu {
            out.push_str(&format!("{} {}\n", label, command));
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct StatsPayload {
    pub bot_version: String,
    pub your_interactions: u64,
    /// Absent when analytics is switched off
    pub stats: Option<BotStats>,
}

impl StatsPayload {
    pub fn render(&self) -> String {
        let mut out = String::from("📊 <b>Bot Statistics</b>\n\n");
        if let Some(stats) = &self.stats {
            out.push_str(&format!("<b>Total Users:</b> {}\n", stats.total_users));
            out.push_str(&format!(
                "<b>Total Interactions:</b> {}\n",
                stats.total_interactions
            ));
            out.push_str(&format!(
                "<b>Average Interactions:</b> {:.2}\n",
                stats.average_interactions
            ));
            out.push_str(&format!("<b>Joined Today:</b> {}\n", stats.active_today));
        }
        out.push_str(&format!(
            "<b>Your Interactions:</b> {}\n",
            self.your_interactions
        ));
        out.push_str(&format!("<b>Bot Version:</b> {}\n", self.bot_version));
        out.push_str("<b>Uptime:</b> Active since last restart");
        out
    }
}

#[derive(Debug, Clone)]
pub struct AdminPayload {
    pub stats: BotStats,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: i64,
}

impl AdminPayload {
    pub fn render(&self) -> String {
        format!(
            "🔧 <b>Admin Panel</b>\n\n\
             <b>Bot Management:</b>\n\
             • User Count: {}\n\
             • Total Interactions: {}\n\
             • System Status: Active\n\
             • Started: {}\n\
             • Uptime: {}\n\n\
             <b>Quick Actions:</b>\n\
             /export - Download user data as CSV",
            self.stats.total_users,
            self.stats.total_interactions,
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            format_uptime(self.uptime_secs),
        )
    }
}

fn format_uptime(secs: i64) -> String {
    let secs = secs.max(0);
    let (days, rem) = (secs / 86_400, secs % 86_400);
    let (hours, rem) = (rem / 3_600, rem % 3_600);
    let minutes = rem / 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// `/start`: register the chat and build the welcome message
pub fn on_start(
    store: &mut SessionStore,
    sender: &Sender,
    now: DateTime<Utc>,
    features: &FeatureFlags,
    messages: &Messages,
) -> WelcomePayload {
    let profile = store.upsert(
        sender.chat_id,
        sender.user_id,
        sender.username.clone(),
        sender.first_name.clone(),
        now,
    );

    let text = if features.welcome_message {
        let name = html_escape::encode_text(profile.first_name.as_deref().unwrap_or("there"));
        format!(
            "🤖 <b>Welcome to ProBot!</b>\n\n\
             Hello {}! I'm your professional Telegram bot with advanced features.\n\n\
             What I can do for you:\n\
             ✅ Smart conversation AI\n\
             ✅ File processing & analysis\n\
             ✅ User management system\n\
             ✅ Analytics & reporting\n\
             ✅ Custom commands\n\
             ✅ Admin panel\n\n\
             Pick a command below to explore my features!",
            name
        )
    } else {
        messages.welcome.clone()
    };

    WelcomePayload {
        text,
        menu: &WELCOME_MENU,
    }
}

/// Free text from a known chat: count it, then answer
pub fn on_text(
    store: &mut SessionStore,
    chat_id: i64,
    text: &str,
    features: &FeatureFlags,
    messages: &Messages,
) -> String {
    store.record_interaction(chat_id);
    if features.smart_responses {
        classifier::classify(text)
    } else {
        messages.help.clone()
    }
}

/// Free text from any sender: first contact registers the chat
pub fn on_incoming_text(
    store: &mut SessionStore,
    sender: &Sender,
    text: &str,
    now: DateTime<Utc>,
    features: &FeatureFlags,
    messages: &Messages,
) -> String {
    store.upsert(
        sender.chat_id,
        sender.user_id,
        sender.username.clone(),
        sender.first_name.clone(),
        now,
    );
    on_text(store, sender.chat_id, text, features, messages)
}

pub fn on_photo(messages: &Messages) -> String {
    messages.photo_received.clone()
}

pub fn on_document(messages: &Messages) -> String {
    messages.file_received.clone()
}

pub fn on_admin_command(
    store: &SessionStore,
    gate: &AdminGate,
    user_id: u64,
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<AdminPayload, CoreError> {
    gate.authorize(user_id)?;
    Ok(AdminPayload {
        stats: store.aggregate(now.date_naive()),
        started_at,
        uptime_secs: (now - started_at).num_seconds(),
    })
}

pub fn on_stats_command(
    store: &SessionStore,
    chat_id: i64,
    now: DateTime<Utc>,
    bot: &BotInfo,
    features: &FeatureFlags,
) -> StatsPayload {
    let your_interactions = store
        .get(chat_id)
        .map(|p| p.interaction_count)
        .unwrap_or(0);
    let stats = features
        .analytics
        .then(|| store.aggregate(now.date_naive()));
    StatsPayload {
        bot_version: bot.version.clone(),
        your_interactions,
        stats,
    }
}

/// Admin-only CSV export. The outer error is the export itself failing.
pub fn on_export_command(
    store: &SessionStore,
    gate: &AdminGate,
    user_id: u64,
) -> Result<Result<String, CoreError>> {
    if let Err(denied) = gate.authorize(user_id) {
        return Ok(Err(denied));
    }
    export::export_csv(store.profiles()).map(Ok)
}

pub fn access_denied() -> &'static str {
    "❌ <b>Access Denied</b>\n\nYou don't have admin privileges."
}

pub fn help_text(bot: &BotInfo) -> String {
    format!(
        "📚 <b>{} Help Center</b>\n\n\
         <b>Available Commands:</b>\n\
         /start - Start the bot and see welcome message\n\
         /help - Show this help message\n\
         /about - About this bot\n\
         /features - Show bot features\n\
         /contact - Contact information\n\
         /stats - User statistics\n\
         /admin - Admin panel (admin only)\n\
         /export - Export users as CSV (admin only)\n\n\
         <b>Features:</b>\n\
         🎯 Smart AI Responses\n\
         📁 File Processing\n\
         📊 Analytics\n\
         🔐 User Management\n\
         ⚙️ Customizable Settings",
        bot.name
    )
}

pub fn about_text(bot: &BotInfo) -> String {
    format!(
        "🤖 <b>About {}</b>\n\n\
         {}.\n\n\
         <b>Key Features:</b>\n\
         • Keyword-driven smart conversations\n\
         • Per-chat user tracking\n\
         • Analytics and reporting\n\
         • Admin dashboard with CSV export\n\n\
         <b>Version:</b> {}\n\
         <b>Built with:</b> Rust, teloxide",
        bot.name, bot.description, bot.version
    )
}

pub fn features_text(features: &FeatureFlags) -> String {
    let mark = |on: bool| if on { "✅" } else { "⛔" };
    format!(
        "🚀 <b>ProBot Features</b>\n\n\
         {} AI chat\n\
         {} Smart responses\n\
         {} File processing\n\
         {} Photo handling\n\
         {} Document handling\n\
         {} User management\n\
         {} Analytics\n\
         {} Admin panel",
        mark(features.ai_chat),
        mark(features.smart_responses),
        mark(features.file_processing),
        mark(features.photo_handling),
        mark(features.document_handling),
        mark(features.user_management),
        mark(features.analytics),
        mark(features.admin_panel),
    )
}

pub fn contact_text() -> &'static str {
    "📞 <b>Contact Information</b>\n\n\
     <b>Support:</b> @YourSupportHandle\n\
     <b>Email:</b> support@yourbot.com\n\
     <b>Website:</b> https://yourbot.com\n\n\
     <b>Response Times:</b>\n\
     • Support: Within 24 hours\n\
     • Business: Within 48 hours"
}
