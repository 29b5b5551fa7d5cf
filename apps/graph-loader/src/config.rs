// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Neo4j connection settings loaded from environment variables.

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP endpoint of the Neo4j server.
    pub neo4j_url: String,
    pub neo4j_database: String,
    pub neo4j_user: String,
    pub neo4j_password: Option<String>,
    /// Per-request timeout in seconds.
    pub neo4j_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            neo4j_url: var("NEO4J_URL").unwrap_or_else(|| "http://localhost:7474".into()),
            neo4j_database: var("NEO4J_DATABASE").unwrap_or_else(|| "neo4j".into()),
            neo4j_user: var("NEO4J_USER").unwrap_or_else(|| "neo4j".into()),
            neo4j_password: var("NEO4J_PASSWORD").filter(|v| !v.is_empty()),
            neo4j_timeout_secs: var("NEO4J_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".into())
                .parse()
                .unwrap_or(30),
        }
    }
}
