//! Referer policy shapes and per-target resolution.
//!
//! The configured referer value is classified once at startup into one of
//! three shapes: a single global value, a positional list aligned with the
//! target list, or a hostname map. An empty string anywhere means "send no
//! Referer header"; an unset configuration falls back to the visitor's own
//! browser referer.

use std::collections::HashMap;

use tracing::warn;
use url::Url;

use crate::error::RelayError;

/// Classified referer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefererConfig {
    /// Nothing configured. Every target falls back to the browser referer.
    Absent,
    /// One value for all targets. Empty means no header is sent.
    Global(String),
    /// One value per position in the configured target list.
    Positional(Vec<String>),
    /// Hostname-keyed values with an optional `"*"` fallback entry.
    ByDomain(HashMap<String, String>),
}

impl RefererConfig {
    /// Classifies the raw configured value.
    ///
    /// JSON input maps directly onto the shapes: a string becomes
    /// [`Global`](Self::Global), an array [`Positional`](Self::Positional),
    /// an object [`ByDomain`](Self::ByDomain). Non-JSON input is split on
    /// newlines, commas, and pipes. A one-element list collapses to a
    /// global value; arrays or objects carrying non-string values are
    /// rejected as a whole and treated as absent.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Absent;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Global(String::new());
        }

        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::String(s)) => return Self::Global(s),
            Ok(serde_json::Value::Array(values)) => match strings_only(values) {
                Some(list) => return Self::from_list(list),
                None => return Self::Absent,
            },
            Ok(serde_json::Value::Object(map)) => {
                let mut rules = HashMap::with_capacity(map.len());
                for (key, value) in map {
                    match value {
                        serde_json::Value::String(s) => {
                            rules.insert(key, s);
                        }
                        other => {
                            let err = RelayError::ConfigShape {
                                reason: format!(
                                    "referer map value for '{key}' is not a string: {other}"
                                ),
                            };
                            warn!(error = %err, "ignoring referer configuration");
                            return Self::Absent;
                        }
                    }
                }
                return Self::ByDomain(rules);
            }
            Ok(serde_json::Value::Null) => return Self::Absent,
            // Numbers and booleans fall through to the splitter, as does
            // anything that is not valid JSON.
            Ok(_) | Err(_) => {}
        }

        let list: Vec<String> = trimmed
            .split(['\n', ',', '|'])
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self::from_list(list)
    }

    fn from_list(list: Vec<String>) -> Self {
        match list.len() {
            0 => Self::Absent,
            1 => Self::Global(list.into_iter().next().unwrap_or_default()),
            _ => Self::Positional(list),
        }
    }

    /// Resolves the Referer header value for one target.
    ///
    /// `index` is the target's position in the configured list and
    /// `browser` is the visitor's own Referer header. `None` means the
    /// forwarded request carries no Referer header at all.
    pub fn pick(&self, target: &Url, index: usize, browser: Option<&str>) -> Option<String> {
        let fallback = || browser.filter(|s| !s.is_empty()).map(str::to_string);

        match self {
            Self::Absent => fallback(),
            Self::Global(value) => non_empty(value),
            Self::ByDomain(rules) => {
                let host = target.host_str().unwrap_or_default();
                // An exact match wins even when its value is empty; it does
                // not continue to the wildcard entry.
                if let Some(value) = rules.get(host) {
                    return non_empty(value);
                }
                if let Some(value) = rules.get("*") {
                    return non_empty(value);
                }
                fallback()
            }
            Self::Positional(values) => {
                if values.len() == 1 {
                    return non_empty(&values[0]);
                }
                match values.get(index) {
                    Some(value) => non_empty(value),
                    None => fallback(),
                }
            }
        }
    }

    /// Short human-readable label for startup summaries.
    pub fn describe(&self) -> String {
        match self {
            Self::Absent => "absent (browser fallback)".to_string(),
            Self::Global(value) if value.is_empty() => "global (no header)".to_string(),
            Self::Global(_) => "global".to_string(),
            Self::Positional(values) => format!("positional ({} entries)", values.len()),
            Self::ByDomain(rules) => format!("by-domain ({} rules)", rules.len()),
        }
    }
}

fn strings_only(values: Vec<serde_json::Value>) -> Option<Vec<String>> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        match value {
            serde_json::Value::String(s) => out.push(s),
            other => {
                let err = RelayError::ConfigShape {
                    reason: format!("referer list entry is not a string: {other}"),
                };
                warn!(error = %err, "ignoring referer configuration");
                return None;
            }
        }
    }
    Some(out)
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
