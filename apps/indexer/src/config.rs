// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Elasticsearch endpoint configuration loaded from environment variables.

/// Indexer configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the Elasticsearch cluster.
    pub es_url: String,
    /// Target index for volume documents.
    pub es_index: String,
    /// Mapping type written in each bulk action line. `None` for clusters
    /// that no longer accept `_type`.
    pub es_doc_type: Option<String>,
    /// Timeout for the bulk request in seconds.
    pub es_timeout_secs: u64,
    pub es_username: Option<String>,
    pub es_password: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Unparseable values fall
    /// back to their defaults.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            es_url: var("ES_URL").unwrap_or_else(|| "http://localhost:9200".into()),
            es_index: var("ES_INDEX").unwrap_or_else(|| "atlas_geo".into()),
            es_doc_type: match var("ES_DOC_TYPE") {
                Some(value) if value.trim().is_empty() => None,
                Some(value) => Some(value),
                None => Some("vol".into()),
            },
            es_timeout_secs: var("ES_TIMEOUT_SECS")
                .unwrap_or_else(|| "60".into())
                .parse()
                .unwrap_or(60),
            es_username: var("ES_USERNAME").filter(|v| !v.is_empty()),
            es_password: var("ES_PASSWORD").filter(|v| !v.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(lookup(&[]));
        assert_eq!(config.es_url, "http://localhost:9200");
        assert_eq!(config.es_index, "atlas_geo");
        assert_eq!(config.es_doc_type.as_deref(), Some("vol"));
        assert_eq!(config.es_timeout_secs, 60);
        assert!(config.es_username.is_none());
    }

    #[test]
    fn test_overrides_and_fallbacks() {
        let config = Config::from_vars(lookup(&[
            ("ES_URL", "https://es.cern.ch:9243"),
            ("ES_DOC_TYPE", ""),
            ("ES_TIMEOUT_SECS", "soon"),
            ("ES_USERNAME", "atlas"),
            ("ES_PASSWORD", "secret"),
        ]));
        assert_eq!(config.es_url, "https://es.cern.ch:9243");
        assert!(config.es_doc_type.is_none());
        assert_eq!(config.es_timeout_secs, 60);
        assert_eq!(config.es_username.as_deref(), Some("atlas"));
        assert_eq!(config.es_password.as_deref(), Some("secret"));
    }
}
