//! Local redirect rules evaluated ahead of asset serving.

use std::collections::HashMap;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};
use url::form_urlencoded;
use uuid::Uuid;

use crate::config::RedirectRule;
use crate::state::AppState;

/// Answers configured paths with a 302 to their destination.
///
/// Rules are evaluated in configuration order; the first rule whose path
/// and query conditions match wins. Only GETs are matched. Unless the rule
/// disables it, a fresh `utm_id` is appended to the destination so each
/// redirected visitor stays individually attributable. Requests matching
/// no rule continue down the stack untouched.
pub async fn layer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if req.method() == Method::GET && !state.settings.redirect_rules.is_empty() {
        let path = req.uri().path();
        let query = req.uri().query().unwrap_or("");

        let matched = state
            .settings
            .redirect_rules
            .iter()
            .find(|rule| rule.path == path && query_matches(query, &rule.when));

        if let Some(rule) = matched {
            return redirect_response(rule);
        }
    }

    next.run(req).await
}

fn redirect_response(rule: &RedirectRule) -> Response {
    // Destinations are validated at startup; a parse failure here means
    // the rule changed underneath us, so fall back to the raw string.
    let location = match url::Url::parse(&rule.to) {
        Ok(mut url) => {
            if rule.append_utm_id {
                url.query_pairs_mut()
                    .append_pair("utm_id", &Uuid::new_v4().to_string());
            }
            url.to_string()
        }
        Err(err) => {
            warn!(destination = %rule.to, error = %err, "redirect destination failed to parse");
            rule.to.clone()
        }
    };

    info!(path = %rule.path, "redirect rule matched");
    metrics::counter!("relay_redirects_total", "path" => rule.path.clone()).increment(1);

    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// True when every configured condition matches the query's first
/// occurrence of that key.
fn query_matches(query: &str, when: &HashMap<String, String>) -> bool {
    if when.is_empty() {
        return true;
    }

    let mut first: HashMap<String, String> = HashMap::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        first.entry(key.into_owned()).or_insert_with(|| value.into_owned());
    }

    when.iter()
        .all(|(key, expected)| first.get(key).is_some_and(|v| v == expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conditions(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_conditions_always_match() {
        assert!(query_matches("", &HashMap::new()));
        assert!(query_matches("a=1", &HashMap::new()));
    }

    #[test]
    fn test_condition_requires_exact_value() {
        let when = conditions(&[("travel", "kiwi")]);
        assert!(query_matches("travel=kiwi", &when));
        assert!(query_matches("x=1&travel=kiwi", &when));
        assert!(!query_matches("travel=air", &when));
        assert!(!query_matches("", &when));
    }

    #[test]
    fn test_all_conditions_must_hold() {
        let when = conditions(&[("travel", "kiwi"), ("lang", "en")]);
        assert!(query_matches("travel=kiwi&lang=en", &when));
        assert!(!query_matches("travel=kiwi", &when));
    }

    #[test]
    fn test_duplicate_query_key_uses_first_occurrence() {
        let when = conditions(&[("travel", "kiwi")]);
        assert!(query_matches("travel=kiwi&travel=air", &when));
        assert!(!query_matches("travel=air&travel=kiwi", &when));
    }
}
