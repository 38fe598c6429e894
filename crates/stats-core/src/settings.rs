use clap::Parser;
use std::path::PathBuf;

use crate::time_utils::Granularity;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Message statistics for chat exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "chat-stats",
    about = "Message statistics for chat exports",
    version
)]
pub struct Settings {
    /// Inbox directory holding one sub-directory per conversation
    /// (auto-discovered under the current directory if not specified)
    #[arg(long)]
    pub inbox: Option<PathBuf>,

    /// Conversation directory name to analyse (repeatable; all when omitted)
    #[arg(long = "chat", value_name = "ID")]
    pub chats: Vec<String>,

    /// Report to print
    #[arg(long, default_value = "summary", value_parser = ["summary", "senders", "period", "merged", "cumulative"])]
    pub view: String,

    /// Calendar bucket for period reports
    #[arg(long, default_value = "day", value_parser = ["day", "month", "year"])]
    pub granularity: String,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json"])]
    pub format: String,

    /// Only report the N largest conversations
    #[arg(long)]
    pub top: Option<usize>,

    /// Skip the mojibake repair pass on titles and message bodies
    #[arg(long)]
    pub no_repair: bool,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse process arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] but accepts an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// The selected period granularity.
    ///
    /// The CLI restricts the accepted strings, so parsing only falls back to
    /// [`Granularity::Day`] for values built by hand.
    pub fn granularity(&self) -> Granularity {
        self.granularity.parse().unwrap_or_default()
    }

    pub fn wants_json(&self) -> bool {
        self.format == "json"
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
