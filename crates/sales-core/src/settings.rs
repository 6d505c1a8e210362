use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ReportError, Result};
use crate::money::NumberFormat;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Summarise car sales data into a report and email it
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sales-report",
    about = "Summarise car sales data into a report and email it",
    version
)]
pub struct Settings {
    /// Sales data JSON file (discovered automatically if not specified)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Report destination (defaults to cars.<format> in the temp directory)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Report document format
    #[arg(long, default_value = "pdf", value_parser = ["pdf", "html", "text"])]
    pub format: String,

    /// Report title
    #[arg(long, default_value = "Sales Data")]
    pub title: String,

    /// Sender address
    #[arg(long, default_value = "automation@example.com")]
    pub sender: String,

    /// Recipient address (defaults to $USER@example.com)
    #[arg(long, env = "SALES_REPORT_RECIPIENT")]
    pub recipient: Option<String>,

    /// Email subject
    #[arg(long, default_value = "Sales summary for last month")]
    pub subject: String,

    /// Currency symbol prefixing every price
    #[arg(long, default_value = "$")]
    pub currency_symbol: String,

    /// Digit grouping character in prices (empty for none)
    #[arg(long, default_value = ",")]
    pub grouping_separator: String,

    /// Decimal separator in prices
    #[arg(long, default_value = ".")]
    pub decimal_separator: String,

    /// Accept prices without the currency symbol
    #[arg(long)]
    pub allow_missing_symbol: bool,

    /// How the report email is delivered
    #[arg(long, default_value = "outbox", value_parser = ["outbox", "sendmail", "none"])]
    pub mailer: String,

    /// Directory receiving .eml files when --mailer=outbox
    #[arg(long)]
    pub outbox_dir: Option<PathBuf>,

    /// sendmail-compatible program used when --mailer=sendmail
    #[arg(long, default_value = "/usr/sbin/sendmail")]
    pub sendmail_path: PathBuf,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.sales-report/last_used.json`.
///
/// The price format flags are never saved: every run parses prices with
/// exactly the format given on its own command line.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mailer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbox_dir: Option<PathBuf>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    /// Uses `~/.sales-report/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".sales-report").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("ignoring unreadable saved settings {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit
    /// value was provided, resolve defaults that depend on the environment,
    /// and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        // Build raw ArgMatches so we can query ValueSource.
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!("could not clear saved settings: {}", e);
            }
            return Self::resolve_defaults(settings, std::env::var("USER").ok().as_deref());
        }

        let last = LastUsedParams::load_from(config_path);

        // NOTE: clap stores the arg id using the *field name* (underscores),
        // not the long-flag spelling (hyphens).
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "title") {
            if let Some(v) = last.title {
                settings.title = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "sender") {
            if let Some(v) = last.sender {
                settings.sender = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "recipient") && settings.recipient.is_none() {
            settings.recipient = last.recipient;
        }
        if !is_arg_explicitly_set(&matches, "subject") {
            if let Some(v) = last.subject {
                settings.subject = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "mailer") {
            if let Some(v) = last.mailer {
                settings.mailer = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "outbox_dir") && settings.outbox_dir.is_none() {
            settings.outbox_dir = last.outbox_dir;
        }

        settings = Self::resolve_defaults(settings, std::env::var("USER").ok().as_deref());

        // Persist current settings for next run.
        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::warn!("could not save settings to {}: {}", config_path.display(), e);
        }

        settings
    }

    /// Fill the recipient from `user` when none was given and apply the
    /// `--debug` flag.
    fn resolve_defaults(mut settings: Settings, user: Option<&str>) -> Settings {
        if settings.recipient.is_none() {
            settings.recipient = default_recipient(user);
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }

    /// Build the price format described by the currency flags.
    pub fn number_format(&self) -> Result<NumberFormat> {
        let grouping = single_char(&self.grouping_separator, "grouping separator", true)?;
        let decimal = single_char(&self.decimal_separator, "decimal separator", false)?
            .ok_or_else(|| ReportError::Config("decimal separator must not be empty".into()))?;
        NumberFormat::new(
            self.currency_symbol.clone(),
            grouping,
            decimal,
            !self.allow_missing_symbol,
        )
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            format: Some(s.format.clone()),
            title: Some(s.title.clone()),
            sender: Some(s.sender.clone()),
            recipient: s.recipient.clone(),
            subject: Some(s.subject.clone()),
            mailer: Some(s.mailer.clone()),
            outbox_dir: s.outbox_dir.clone(),
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// `"{user}@example.com"`, or `None` when the user name is unknown.
pub fn default_recipient(user: Option<&str>) -> Option<String> {
    user.map(str::trim)
        .filter(|u| !u.is_empty())
        .map(|u| format!("{}@example.com", u))
}

/// Returns `true` when `name` was supplied on the command line or through its
/// environment variable (not via default value).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(clap::parser::ValueSource::CommandLine)
            | Some(clap::parser::ValueSource::EnvVariable)
    )
}

/// Interpret a flag value that must be at most one character.
fn single_char(value: &str, what: &str, allow_empty: bool) -> Result<Option<char>> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (None, _) if allow_empty => Ok(None),
        (None, _) => Err(ReportError::Config(format!("{what} must not be empty"))),
        (Some(c), None) => Ok(Some(c)),
        (Some(_), Some(_)) => Err(ReportError::Config(format!(
            "{what} must be a single character, got {value:?}"
        ))),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
