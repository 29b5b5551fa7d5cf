// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Elasticsearch `_bulk` client.

use super::{bulk_body, BulkTarget};
use crate::config::Config;
use async_trait::async_trait;
use geomodel_processing::{
    DocumentSink, FlattenedDocument, RejectedDocument, SinkError, SinkReport,
};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Posts every document of a run in a single bulk request.
pub struct ElasticSink {
    base_url: String,
    target: BulkTarget,
    username: Option<String>,
    password: Option<String>,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    status: u16,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl ElasticSink {
    pub fn new(config: &Config) -> Result<Self, SinkError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.es_timeout_secs))
            .build()
            .map_err(|e| SinkError::Connection(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            base_url: config.es_url.trim_end_matches('/').to_string(),
            target: BulkTarget {
                index: config.es_index.clone(),
                doc_type: config.es_doc_type.clone(),
            },
            username: config.es_username.clone(),
            password: config.es_password.clone(),
            http,
        })
    }
}

#[async_trait]
impl DocumentSink for ElasticSink {
    async fn store(&mut self, documents: &[FlattenedDocument]) -> Result<SinkReport, SinkError> {
        if documents.is_empty() {
            tracing::info!("No documents to store");
            return Ok(SinkReport::default());
        }

        let body = bulk_body(&self.target, documents)?;
        tracing::debug!(bytes = body.len(), url = %self.base_url, "Posting bulk request");

        let mut request = self
            .http
            .post(format!("{}/_bulk", self.base_url))
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let resp = request.send().await.map_err(|e| {
            if e.is_connect() {
                SinkError::Connection(format!("{}: {e}", self.base_url))
            } else {
                SinkError::Transport {
                    status: e.status().map(|s| s.as_u16()),
                    message: format!("Bulk request failed: {e}"),
                }
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SinkError::Transport {
                status: Some(status.as_u16()),
                message,
            });
        }

        let parsed: BulkResponse = resp.json().await.map_err(|e| SinkError::Transport {
            status: Some(status.as_u16()),
            message: format!("Bulk response parse failed: {e}"),
        })?;

        Ok(bulk_report(parsed, documents.len()))
    }
}

/// Split a bulk response into stored and rejected documents.
fn bulk_report(response: BulkResponse, submitted: usize) -> SinkReport {
    if !response.errors {
        return SinkReport::all_stored(submitted);
    }

    let rejected: Vec<RejectedDocument> = response
        .items
        .into_iter()
        .enumerate()
        .filter_map(|(position, item)| {
            let item = item.into_values().next()?;
            if (200..300).contains(&item.status) && item.error.is_none() {
                return None;
            }
            Some(RejectedDocument {
                position,
                status: item.status,
                reason: item.error.map(error_reason).unwrap_or_default(),
            })
        })
        .collect();

    SinkReport {
        stored: submitted.saturating_sub(rejected.len()),
        rejected,
    }
}

fn error_reason(error: serde_json::Value) -> String {
    match error.get("reason").and_then(|r| r.as_str()) {
        Some(reason) => match error.get("type").and_then(|t| t.as_str()) {
            Some(kind) => format!("{kind}: {reason}"),
            None => reason.to_string(),
        },
        None => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::tests::document;

    fn parse(json: serde_json::Value) -> BulkResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_clean_response() {
        let report = bulk_report(
            parse(serde_json::json!({
                "took": 3,
                "errors": false,
                "items": [
                    { "index": { "_index": "atlas_geo", "status": 201 } },
                    { "index": { "_index": "atlas_geo", "status": 201 } }
                ]
            })),
            2,
        );
        assert_eq!(report, SinkReport::all_stored(2));
    }

    #[test]
    fn test_partial_rejection() {
        let report = bulk_report(
            parse(serde_json::json!({
                "errors": true,
                "items": [
                    { "index": { "status": 201 } },
                    { "index": {
                        "status": 400,
                        "error": { "type": "mapper_parsing_exception", "reason": "failed to parse field [depth]" }
                    } },
                    { "index": { "status": 429, "error": "es_rejected_execution_exception" } }
                ]
            })),
            3,
        );

        assert_eq!(report.stored, 1);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].position, 1);
        assert_eq!(report.rejected[0].status, 400);
        assert_eq!(
            report.rejected[0].reason,
            "mapper_parsing_exception: failed to parse field [depth]"
        );
        assert_eq!(report.rejected[1].position, 2);
        assert_eq!(report.rejected[1].reason, "\"es_rejected_execution_exception\"");
    }

    #[test]
    fn test_sink_uses_config() {
        let config = Config::from_vars(|key| match key {
            "ES_URL" => Some("http://es:9200/".into()),
            "ES_INDEX" => Some("geo".into()),
            _ => None,
        });
        let sink = ElasticSink::new(&config).unwrap();
        assert_eq!(sink.base_url, "http://es:9200");
        assert_eq!(sink.target.index, "geo");
        assert_eq!(sink.target.doc_type.as_deref(), Some("vol"));
    }

    #[tokio::test]
    async fn test_unreachable_cluster_is_connection_error() {
        let config = Config::from_vars(|key| match key {
            "ES_URL" => Some("http://127.0.0.1:1".into()),
            "ES_TIMEOUT_SECS" => Some("5".into()),
            _ => None,
        });
        let mut sink = ElasticSink::new(&config).unwrap();
        let err = sink.store(&[document(0, "A")]).await.unwrap_err();
        assert!(matches!(err, SinkError::Connection(_)));
    }
}
