use anyhow::{Context, Result};
use chrono::SecondsFormat;

use crate::session::UserProfile;

pub const CSV_HEADER: [&str; 5] = ["UserID", "Username", "FirstName", "JoinedAt", "Interactions"];

/// Serialize profiles to CSV, one row per profile in the given order.
/// Missing usernames and first names become empty cells.
pub fn export_csv<'a>(profiles: impl IntoIterator<Item = &'a UserProfile>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CSV_HEADER)
        .context("Failed to write CSV header")?;

    for profile in profiles {
        writer
            .write_record([
                profile.user_id.to_string(),
                profile.username.clone().unwrap_or_default(),
                profile.first_name.clone().unwrap_or_default(),
                profile
                    .joined_at
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                profile.interaction_count.to_string(),
            ])
            .with_context(|| format!("Failed to write CSV row for chat {}", profile.chat_id))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}
