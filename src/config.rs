//! Configuration loading and validation

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;

use crate::ledger::{Identity, LedgerOptions};

// Re-export text limits, they live with the ledger types
pub use crate::ledger::TextLimits;

/// Accepted shape for owner and caller identities
pub const IDENTITY_PATTERN: &str = r"^[A-Za-z0-9._-]{1,128}$";

static IDENTITY_REGEX: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();

fn identity_regex() -> Result<&'static Regex> {
    IDENTITY_REGEX
        .get_or_init(|| Regex::new(IDENTITY_PATTERN))
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Invalid identity pattern: {}", e))
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub limits: TextLimits,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// The single identity allowed to change the ledger
    pub owner: String,

    /// JSON file holding the ledger state
    #[serde(default = "default_state_path")]
    pub state_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SafetyConfig {
    /// Ask for confirmation before paying expenses above this amount
    #[serde(default = "default_confirm_payment_above")]
    pub confirm_payment_above: u64,

    /// Keep the append-only audit journal
    #[serde(default = "default_true")]
    pub audit_log: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            confirm_payment_above: default_confirm_payment_above(),
            audit_log: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines
    #[serde(default)]
    pub json: bool,
}

// Default value functions
fn default_state_path() -> String {
    "data/treasury.json".to_string()
}

fn default_confirm_payment_above() -> u64 {
    1_000_000
}

fn default_true() -> bool {
    true
}

/// Check an identity string against [`IDENTITY_PATTERN`]
pub fn parse_identity(value: &str) -> Result<Identity> {
    if !identity_regex()?.is_match(value) {
        anyhow::bail!("Invalid identity: {:?}", value);
    }
    Ok(Identity::new(value))
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("ledger.state_path", default_state_path())?
            .set_default(
                "safety.confirm_payment_above",
                default_confirm_payment_above() as i64,
            )?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix TREASURY_)
            .add_source(
                config::Environment::with_prefix("TREASURY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        parse_identity(&self.ledger.owner).context("ledger.owner")?;

        if self.ledger.state_path.trim().is_empty() {
            anyhow::bail!("ledger.state_path cannot be empty");
        }

        let limits = [
            ("max_name_len", self.limits.max_name_len),
            ("max_description_len", self.limits.max_description_len),
            ("max_notes_len", self.limits.max_notes_len),
            ("max_reason_len", self.limits.max_reason_len),
            ("max_payment_ref_len", self.limits.max_payment_ref_len),
        ];
        for (name, value) in limits {
            if value == 0 {
                anyhow::bail!("limits.{} must be positive", name);
            }
        }

        Ok(())
    }

    pub fn owner(&self) -> Identity {
        Identity::new(self.ledger.owner.clone())
    }

    pub fn ledger_options(&self) -> LedgerOptions {
        LedgerOptions {
            limits: self.limits,
            audit_log: self.safety.audit_log,
        }
    }

    /// Get configuration for display
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  Ledger:
    owner: {}
    state_path: {}
  Limits:
    max_name_len: {}
    max_description_len: {}
    max_notes_len: {}
    max_reason_len: {}
    max_payment_ref_len: {}
  Safety:
    confirm_payment_above: {}
    audit_log: {}
  Logging:
    json: {}
"#,
            mask_identity(&self.ledger.owner),
            self.ledger.state_path,
            self.limits.max_name_len,
            self.limits.max_description_len,
            self.limits.max_notes_len,
            self.limits.max_reason_len,
            self.limits.max_payment_ref_len,
            self.safety.confirm_payment_above,
            self.safety.audit_log,
            self.logging.json,
        )
    }
}

/// Shorten long identities for display
fn mask_identity(identity: &str) -> String {
    let chars: Vec<char> = identity.chars().collect();
    if chars.len() > 16 {
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        identity.to_string()
    }
}
