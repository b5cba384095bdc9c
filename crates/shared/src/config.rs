//! Application configuration management.
//!
//! Configuration is layered: `config/default.toml`, then `config/{RUN_MODE}.toml`,
//! then `DOCFLOW__*` environment variables. Every section has defaults, so an
//! empty environment yields a working configuration.

use serde::Deserialize;

use crate::types::Precision;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Ledger posting configuration.
    pub posting: PostingConfig,
    /// Document numbering configuration.
    pub numbering: NumberingConfig,
    /// Logging configuration.
    pub log: LogConfig,
    /// Account mapping table. When empty the built-in table is used.
    pub account_mappings: Vec<AccountMappingConfig>,
}

/// Ledger posting configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostingConfig {
    /// Number of decimal places amounts are rounded to.
    pub currency_precision: u32,
    /// Account that absorbs sub-unit rounding remainders.
    pub rounding_account_code: String,
    /// Display name of the rounding account.
    pub rounding_account_name: String,
}

impl PostingConfig {
    /// Returns the configured currency precision.
    #[must_use]
    pub const fn precision(&self) -> Precision {
        Precision::new(self.currency_precision)
    }
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            currency_precision: 2,
            rounding_account_code: "7990".to_string(),
            rounding_account_name: "Rounding Differences".to_string(),
        }
    }
}

/// Document numbering configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NumberingConfig {
    /// Width the sequence is zero-padded to.
    pub pad_width: usize,
    /// Attempts made against the counter before giving up.
    pub max_retries: u32,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            pad_width: 5,
            max_retries: 3,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "docflow=info".to_string(),
            json: false,
        }
    }
}

/// One configured account mapping rule.
///
/// Values are kept as strings here; the core parses them into typed rules
/// and rejects unknown document types, events, sides or amount fields.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountMappingConfig {
    /// Document type tag (e.g. `invoice`).
    pub document_type: String,
    /// Event kind tag (e.g. `invoice_issued`).
    pub event: String,
    /// Lines produced by the rule.
    pub lines: Vec<MappingLineConfig>,
}

/// One line of a configured account mapping rule.
#[derive(Debug, Clone, Deserialize)]
pub struct MappingLineConfig {
    /// Account code.
    pub account_code: String,
    /// Account display name.
    pub account_name: String,
    /// `debit` or `credit`.
    pub side: String,
    /// Amount expression (e.g. `total`, `subtotal`, `tax_amount`, `line_items`).
    pub amount: String,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("DOCFLOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Parses configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid configuration.
    pub fn from_toml(source: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
