//! ProBot setup wizard.
//!
//! Prompts for the bot token, admin IDs and a preset, then writes
//! `config.toml` and creates the working directories next to it.
//!
//! Flags: `--preset <business|community|simple>` skips the preset prompt,
//! `--force` overwrites an existing `config.toml`.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const WORK_DIRS: [&str; 4] = ["logs", "uploads", "data", "backups"];

// ── Presets ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Preset {
    Business,
    Community,
    Simple,
}

impl Preset {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "business" | "" => Some(Preset::Business),
            "community" => Some(Preset::Community),
            "simple" => Some(Preset::Simple),
            _ => None,
        }
    }

    /// Feature flags in config order
    fn features(self) -> [(&'static str, bool); 9] {
        let (ai, files, users, analytics, photos, docs) = match self {
            Preset::Business => (true, true, true, true, true, true),
            Preset::Community => (true, true, true, true, false, false),
            Preset::Simple => (false, false, false, false, false, false),
        };
        [
            ("ai_chat", ai),
            ("file_processing", files),
            ("user_management", users),
            ("analytics", analytics),
            ("admin_panel", true),
            ("welcome_message", true),
            ("smart_responses", true),
            ("photo_handling", photos),
            ("document_handling", docs),
        ]
    }

    fn welcome(self) -> &'static str {
        match self {
            Preset::Business => "🤖 Welcome to our business bot! How can we help you today?",
            Preset::Community => {
                "🤖 Welcome to our community! Please read the rules and enjoy your stay!"
            }
            Preset::Simple => "🤖 Hello! I'm your simple assistant bot!",
        }
    }

    fn help(self) -> &'static str {
        match self {
            Preset::Business => {
                "📚 Our support team is here to help. Use /help to see available commands."
            }
            Preset::Community => "📚 Community guidelines and commands are available with /help",
            Preset::Simple => "📚 Available commands: /start /help /about",
        }
    }
}

// ── Config formatting ────────────────────────────────────────────────────────

struct ConfigParams<'a> {
    tg_token: &'a str,
    admin_ids: &'a [u64],
    bot_name: &'a str,
    preset: Preset,
}

#[derive(Serialize)]
struct ConfigFile<'a> {
    telegram: TelegramSection<'a>,
    bot: BotSection<'a>,
    features: BTreeMap<&'static str, bool>,
    messages: MessagesSection,
    analytics: AnalyticsSection,
}

#[derive(Serialize)]
struct TelegramSection<'a> {
    bot_token: &'a str,
    admin_ids: &'a [u64],
}

#[derive(Serialize)]
struct BotSection<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct MessagesSection {
    welcome: &'static str,
    help: &'static str,
}

#[derive(Serialize)]
struct AnalyticsSection {
    daily_stats: bool,
    daily_stats_cron: &'static str,
}

/// Split "111, 222 333" into numeric Telegram user IDs.
fn parse_admin_ids(input: &str) -> Result<Vec<u64>> {
    let ids = input
        .split([',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .with_context(|| format!("Admin ID must be a numeric Telegram user ID: {s}"))
        })
        .collect::<Result<Vec<_>>>()?;
    if ids.is_empty() {
        bail!("At least one admin ID is required");
    }
    Ok(ids)
}

/// Produces a valid config.toml string. Extracted so it can be unit-tested.
fn format_config(p: &ConfigParams<'_>) -> Result<String> {
    let file = ConfigFile {
        telegram: TelegramSection {
            bot_token: p.tg_token,
            admin_ids: p.admin_ids,
        },
        bot: BotSection { name: p.bot_name },
        features: p.preset.features().into_iter().collect(),
        messages: MessagesSection {
            welcome: p.preset.welcome(),
            help: p.preset.help(),
        },
        analytics: AnalyticsSection {
            daily_stats: true,
            daily_stats_cron: "0 0 0 * * *",
        },
    };
    let out = toml::to_string(&file).context("Could not render config.toml")?;
    // Never write a file the bot would refuse to parse.
    toml::from_str::<toml::Table>(&out).context("Rendered config.toml does not parse")?;
    Ok(out)
}

fn create_work_dirs(root: &Path) -> Result<()> {
    for dir in WORK_DIRS {
        let path = root.join(dir);
        std::fs::create_dir_all(&path)
            .with_context(|| format!("Could not create {}", path.display()))?;
    }
    Ok(())
}

// ── Wizard ───────────────────────────────────────────────────────────────────

fn run_cli(project_root: &Path, preset_flag: Option<Preset>, force: bool) -> Result<()> {
    use std::io::{self, Write};

    let config_path = project_root.join("config.toml");
    if config_path.exists() && !force {
        bail!(
            "{} already exists; rerun with --force to overwrite",
            config_path.display()
        );
    }

    println!("=== ProBot Setup ===\n");

    let read_line = |prompt: &str| -> Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut buf = String::new();
        io::stdin().read_line(&mut buf)?;
        Ok(buf.trim().to_owned())
    };

    let tg_token = read_line("Telegram bot token (from @BotFather): ")?;
    let admin_ids = loop {
        let answer = read_line("Admin user IDs (comma-separated, from @userinfobot): ")?;
        match parse_admin_ids(&answer) {
            Ok(ids) => break ids,
            Err(e) => println!("✗  {e:#}"),
        }
    };
    let bot_name = match read_line("Bot name [ProBot]: ")? {
        s if s.is_empty() => "ProBot".to_owned(),
        s => s,
    };
    let preset = match preset_flag {
        Some(p) => p,
        None => {
            let answer = read_line("Preset (business/community/simple) [business]: ")?;
            Preset::parse(&answer).with_context(|| format!("Unknown preset: {answer}"))?
        }
    };

    let config = format_config(&ConfigParams {
        tg_token: &tg_token,
        admin_ids: &admin_ids,
        bot_name: &bot_name,
        preset,
    })?;

    std::fs::write(&config_path, &config)
        .with_context(|| format!("Could not write {}", config_path.display()))?;
    create_work_dirs(project_root)?;

    println!("\n✓  config.toml saved to {}", config_path.display());
    println!("✓  Created {}", WORK_DIRS.join(", "));
    println!("   Run the bot with:  cargo run");
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // Resolve project root: prefer PROBOT_ROOT env, fall back to cwd.
    let project_root =
        PathBuf::from(std::env::var("PROBOT_ROOT").unwrap_or_else(|_| ".".to_string()));

    let preset = match args.iter().position(|a| a == "--preset") {
        Some(i) => {
            let value = args.get(i + 1).map(String::as_str).unwrap_or_default();
            Some(Preset::parse(value).with_context(|| format!("Unknown preset: {value}"))?)
        }
        None => None,
    };
    let force = args.iter().any(|a| a == "--force");

    run_cli(&project_root, preset, force)
}

// ── Tests ────────────────────────────────────────────────────────────────────
