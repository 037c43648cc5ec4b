//! Target list parsing and attribution merging.
//!
//! The configured target list accepts either a JSON string array or a
//! single string delimited by newlines, commas, or pipes. Entries are
//! trimmed and deduplicated up front; per hit, the captured attribution
//! pairs are merged into each target URL without overwriting anything the
//! target already carries.

use std::collections::HashSet;

use tracing::warn;
use url::Url;

use crate::error::RelayError;

/// Deduplicated raw target entries, parsed once from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetList {
    entries: Vec<String>,
}

impl TargetList {
    /// Parses the configured value into an ordered, deduplicated entry list.
    ///
    /// A value starting as a JSON array is taken verbatim (non-string
    /// elements are dropped with a warning); anything else is split on
    /// newlines, commas, and pipes. Blank input yields an empty list.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::default();
        }

        let items = match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::Array(values)) => values
                .into_iter()
                .filter_map(|value| match value {
                    serde_json::Value::String(s) => Some(s),
                    other => {
                        warn!(entry = %other, "ignoring non-string target entry");
                        None
                    }
                })
                .collect(),
            _ => split_list(trimmed),
        };

        let mut seen = HashSet::new();
        let entries = items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(s.clone()))
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Builds the per-hit URL for every entry by merging the attribution
    /// pairs into it.
    ///
    /// Malformed entries are skipped with a warning; the rest of the batch
    /// is unaffected. Skipped entries keep their slot, so each resolved
    /// target remembers its position in the configured list and positional
    /// referer lookups stay aligned.
    pub fn resolve(&self, pairs: &[(&str, &str)]) -> Vec<ResolvedTarget> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match merge_attribution(entry, pairs) {
                Ok(url) => Some(ResolvedTarget { index, url }),
                Err(err) => {
                    warn!(entry = %entry, error = %err, "skipping malformed target URL");
                    None
                }
            })
            .collect()
    }
}

/// A target URL ready for dispatch, tagged with its position in the
/// configured list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub index: usize,
    pub url: Url,
}

/// Merges attribution pairs into a single target entry.
///
/// The merge never overwrites: a key already present in the target's own
/// query keeps its value, and empty attribution values are not appended.
/// Applying the same pairs twice therefore yields the same URL.
pub fn merge_attribution(entry: &str, pairs: &[(&str, &str)]) -> Result<Url, RelayError> {
    let mut url = Url::parse(entry).map_err(|source| RelayError::MalformedTargetUrl {
        url: entry.to_string(),
        source,
    })?;

    let existing: HashSet<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
    {
        let mut editor = url.query_pairs_mut();
        for (key, value) in pairs {
            if value.is_empty() || existing.contains(*key) {
                continue;
            }
            editor.append_pair(key, value);
        }
    }
    Ok(url)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(['\n', ',', '|'])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
