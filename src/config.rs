//! Application configuration loaded from environment variables.
//!
//! Configuration is loaded once at startup and validated before the server
//! starts. Target and referer values are classified here, so every request
//! works against already-parsed shapes.
//!
//! ## Core Variables
//!
//! - `TARGET_URLS` - Targets to forward each hit to. JSON string array or a
//!   single string delimited by newlines, commas, or pipes.
//! - `TARGET_REFERERS` - Referer policy. A single value, a JSON array
//!   aligned with `TARGET_URLS`, or a JSON hostname map with optional `"*"`
//!   fallback. Unset falls back to the visitor's browser referer; an empty
//!   value sends no Referer header at all.
//!
//! ## Optional Variables
//!
//! - `DISPATCH_TIMEOUT_MS` - Per-target dispatch deadline (default: 2500)
//! - `TRIGGER_ON_LANDING` - Fire on landing page views (default: true)
//! - `LANDING_PATHS` - Paths counting as landing pages
//!   (default: `/,/index.html`)
//! - `STATIC_DIR` - Directory served for non-route paths; when unset those
//!   requests get a plain 200 "OK"
//! - `REDIRECT_RULES` - JSON array of local redirect rules
//! - `LISTEN` - Bind address (default: `0.0.0.0:3000`)
//! - `RUST_LOG` - Log level (default: `info`)
//! - `LOG_FORMAT` - Log format: `text` or `json` (default: `text`)

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::referer::RefererConfig;
use crate::domain::targets::TargetList;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub targets: TargetList,
    pub referers: RefererConfig,
    /// Deadline for a single dispatch attempt in milliseconds
    /// (`DISPATCH_TIMEOUT_MS`, default: 2500).
    pub dispatch_timeout_ms: u64,
    /// When true, landing page views fire the relay in the background.
    pub trigger_on_landing: bool,
    /// Paths treated as landing pages for the implicit trigger.
    pub landing_paths: Vec<String>,
    /// Static asset directory. `None` turns the fallback into a plain 200.
    pub static_dir: Option<String>,
    pub redirect_rules: Vec<RedirectRule>,
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: String,
}

/// A local redirect served by the relay itself.
///
/// Matches an exact path plus optional query conditions and answers with a
/// 302 to `to`. Unless disabled, a fresh `utm_id` is appended so each
/// redirect stays individually attributable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedirectRule {
    pub path: String,
    #[serde(default)]
    pub when: HashMap<String, String>,
    pub to: String,
    #[serde(default = "default_true")]
    pub append_utm_id: bool,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `REDIRECT_RULES` is set but not valid JSON.
    pub fn from_env() -> Result<Self> {
        let targets = TargetList::parse(&env::var("TARGET_URLS").unwrap_or_default());

        // Unset and empty differ here: unset means browser fallback, empty
        // means no Referer header.
        let referers = RefererConfig::parse(env::var("TARGET_REFERERS").ok().as_deref());

        let dispatch_timeout_ms = env::var("DISPATCH_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2500);

        let trigger_on_landing = env::var("TRIGGER_ON_LANDING")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(true);

        let landing_paths = match env::var("LANDING_PATHS") {
            Ok(raw) => split_paths(&raw),
            Err(_) => vec!["/".to_string(), "/index.html".to_string()],
        };

        let static_dir = env::var("STATIC_DIR").ok().filter(|v| !v.is_empty());

        let redirect_rules = Self::load_redirect_rules()?;

        let listen_addr = env::var("LISTEN").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

        Ok(Self {
            targets,
            referers,
            dispatch_timeout_ms,
            trigger_on_landing,
            landing_paths,
            static_dir,
            redirect_rules,
            listen_addr,
            log_level,
            log_format,
        })
    }

    /// Parses `REDIRECT_RULES` as a JSON array of [`RedirectRule`].
    ///
    /// Unlike target entries, a malformed rule fails startup: silently
    /// dropping an operator-authored redirect would break real visitor
    /// flows.
    fn load_redirect_rules() -> Result<Vec<RedirectRule>> {
        let Ok(raw) = env::var("REDIRECT_RULES") else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).context("REDIRECT_RULES must be a JSON array of rules")
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DISPATCH_TIMEOUT_MS` is outside 1..=60000
    /// - `LOG_FORMAT` is not `text` or `json`
    /// - `LISTEN` is invalid
    /// - a landing path or redirect rule is malformed
    pub fn validate(&self) -> Result<()> {
        if self.dispatch_timeout_ms == 0 || self.dispatch_timeout_ms > 60_000 {
            anyhow::bail!(
                "DISPATCH_TIMEOUT_MS must be between 1 and 60000, got {}",
                self.dispatch_timeout_ms
            );
        }

        if self.log_format != "text" && self.log_format != "json" {
            anyhow::bail!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            );
        }

        if !self.listen_addr.contains(':') {
            anyhow::bail!(
                "LISTEN must be in format 'host:port', got '{}'",
                self.listen_addr
            );
        }

        for path in &self.landing_paths {
            if !path.starts_with('/') {
                anyhow::bail!("LANDING_PATHS entries must start with '/', got '{}'", path);
            }
        }

        for rule in &self.redirect_rules {
            if !rule.path.starts_with('/') {
                anyhow::bail!(
                    "REDIRECT_RULES paths must start with '/', got '{}'",
                    rule.path
                );
            }
            url::Url::parse(&rule.to).with_context(|| {
                format!("REDIRECT_RULES destination '{}' is not a valid URL", rule.to)
            })?;
        }

        Ok(())
    }

    /// Deadline for a single dispatch attempt.
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }

    /// Prints configuration summary.
    pub fn print_summary(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Listen address: {}", self.listen_addr);

        if self.targets.is_empty() {
            tracing::warn!("  Targets: none configured, hits will not be forwarded");
        } else {
            tracing::info!("  Targets: {} configured", self.targets.len());
        }

        tracing::info!("  Referer policy: {}", self.referers.describe());
        tracing::info!("  Dispatch timeout: {}ms", self.dispatch_timeout_ms);

        if self.trigger_on_landing {
            tracing::info!("  Landing trigger: {}", self.landing_paths.join(", "));
        } else {
            tracing::info!("  Landing trigger: disabled");
        }

        match &self.static_dir {
            Some(dir) => tracing::info!("  Static assets: {}", dir),
            None => tracing::info!("  Static assets: disabled (plain OK fallback)"),
        }

        if !self.redirect_rules.is_empty() {
            tracing::info!("  Redirect rules: {}", self.redirect_rules.len());
        }

        tracing::info!("  Log level: {}", self.log_level);
        tracing::info!("  Log format: {}", self.log_format);
    }
}

/// Splits a path list on the same delimiters as the target list.
fn split_paths(raw: &str) -> Vec<String> {
    raw.split(['\n', ',', '|'])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Loads and validates configuration from environment variables.
///
/// # Errors
///
/// Returns an error if required variables are malformed or validation fails.
///
/// # Note
///
/// This function expects environment variables to be already loaded
/// (e.g., via `dotenvy::dotenv()` in `main.rs`).
pub fn load_from_env() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}
