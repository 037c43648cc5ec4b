//! Extraction of attribution parameters from the inbound query string.
//!
//! A tracking hit carries some subset of the Google click identifiers
//! (`gclid`, `gbraid`, `wbraid`), the five standard UTM tags, and an
//! optional `sub_id`. Whatever the visitor arrived with is captured here
//! once and later merged into every target URL.

use std::collections::HashMap;

use url::form_urlencoded;
use uuid::Uuid;

/// Click identifier keys in priority order. The first key with a non-empty
/// value wins; the others are ignored for that hit.
const CLICK_ID_KEYS: [&str; 3] = ["gclid", "gbraid", "wbraid"];

/// Outbound key the click identifier is forwarded under, regardless of
/// which inbound key supplied it.
pub const CLICK_ID_PARAM: &str = "gclid";

const UTM_KEYS: [&str; 5] = [
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
];

/// Attribution parameters captured from a single inbound hit.
///
/// `sub_id` is always populated: either passed through from the query or
/// freshly generated, so every forwarded hit stays correlatable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributionRecord {
    pub click_id: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub sub_id: String,
}

impl AttributionRecord {
    /// Collects attribution parameters from a raw query string (without the
    /// leading `?`).
    ///
    /// Duplicate keys keep their first occurrence. Empty values are treated
    /// as absent, so `?gclid=&gbraid=abc` resolves the click id to `abc`.
    pub fn from_query(query: &str) -> Self {
        let params = first_occurrence_map(query);

        let click_id = CLICK_ID_KEYS
            .iter()
            .find_map(|key| params.get(*key).filter(|v| !v.is_empty()).cloned());

        let utm = |key: &str| params.get(key).filter(|v| !v.is_empty()).cloned();

        let sub_id = params
            .get("sub_id")
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            click_id,
            utm_source: utm("utm_source"),
            utm_medium: utm("utm_medium"),
            utm_campaign: utm("utm_campaign"),
            utm_term: utm("utm_term"),
            utm_content: utm("utm_content"),
            sub_id,
        }
    }

    /// Key-value pairs to merge into target URLs.
    ///
    /// The click identifier is always emitted under [`CLICK_ID_PARAM`];
    /// `sub_id` is always last and always present.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut out = Vec::with_capacity(7);
        if let Some(id) = &self.click_id {
            out.push((CLICK_ID_PARAM, id.as_str()));
        }
        let utm_fields: [(&'static str, &Option<String>); 5] = [
            ("utm_source", &self.utm_source),
            ("utm_medium", &self.utm_medium),
            ("utm_campaign", &self.utm_campaign),
            ("utm_term", &self.utm_term),
            ("utm_content", &self.utm_content),
        ];
        for (key, value) in utm_fields {
            if let Some(v) = value {
                out.push((key, v.as_str()));
            }
        }
        out.push(("sub_id", self.sub_id.as_str()));
        out
    }
}

/// Decodes a query string keeping only the first value per key, matching
/// how `searchParams.get` reads repeated parameters.
fn first_occurrence_map(query: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        map.entry(key.into_owned()).or_insert_with(|| value.into_owned());
    }
    map
}
