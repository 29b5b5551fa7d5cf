// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Neo4j client over the HTTP transactional Cypher endpoint.
//!
//! Every call is a single auto-committed statement posted to
//! `/db/<database>/tx/commit`. Labels and relationship types cannot be query
//! parameters, so they are validated and backtick-quoted before being spliced
//! into the statement.
//!
//! Nodes are addressed by the numeric `id(n)`, available on Neo4j 4 and 5.
//! Neo4j 5 deprecates it in favour of the string `elementId(n)`; moving to
//! that means turning [`NodeId`] into a `String`.

use crate::config::Config;
use crate::error::{GraphError, Result};
use crate::graph::{GraphNode, GraphStore, NodeId, Properties, CHILD};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

pub struct Neo4jHttp {
    endpoint: String,
    user: String,
    password: Option<String>,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct TxRequest<'a> {
    statements: [Statement<'a>; 1],
}

#[derive(Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxResult {
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Debug, Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    code: String,
    message: String,
}

impl Neo4jHttp {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.neo4j_timeout_secs))
            .build()
            .map_err(|e| GraphError::Connection(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            endpoint: format!(
                "{}/db/{}/tx/commit",
                config.neo4j_url.trim_end_matches('/'),
                config.neo4j_database
            ),
            user: config.neo4j_user.clone(),
            password: config.neo4j_password.clone(),
            http,
        })
    }

    /// Run one statement and return its result rows.
    async fn run(&self, statement: &str, parameters: Value) -> Result<Vec<Vec<Value>>> {
        tracing::trace!(statement, "Cypher");
        let body = TxRequest {
            statements: [Statement {
                statement,
                parameters,
            }],
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .basic_auth(&self.user, self.password.as_deref())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GraphError::Connection(format!("{}: {e}", self.endpoint))
                } else {
                    GraphError::Http(e.to_string())
                }
            })?;

        if !resp.status().is_success() {
            return Err(GraphError::Http(format!(
                "{} returned status {}",
                self.endpoint,
                resp.status()
            )));
        }

        let parsed: TxResponse = resp
            .json()
            .await
            .map_err(|e| GraphError::Response(format!("Transaction response parse failed: {e}")))?;
        rows(parsed)
    }
}

fn rows(response: TxResponse) -> Result<Vec<Vec<Value>>> {
    if let Some(err) = response.errors.into_iter().next() {
        return Err(GraphError::Cypher {
            code: err.code,
            message: err.message,
        });
    }
    Ok(response
        .results
        .into_iter()
        .next()
        .map(|r| r.data.into_iter().map(|d| d.row).collect())
        .unwrap_or_default())
}

/// Backtick-quote a label or relationship type after checking it is a plain
/// identifier.
pub fn quote_identifier(name: &str) -> Result<String> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(GraphError::InvalidLabel(name.to_string()));
    }
    Ok(format!("`{name}`"))
}

fn node_from_row(row: &[Value]) -> Result<GraphNode> {
    let id = row
        .first()
        .and_then(Value::as_i64)
        .ok_or_else(|| GraphError::Response(format!("Expected node id, got {row:?}")))?;
    let labels = row
        .get(1)
        .and_then(Value::as_array)
        .map(|labels| {
            labels
                .iter()
                .filter_map(|l| l.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    let properties = row
        .get(2)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    Ok(GraphNode {
        id,
        labels,
        properties,
    })
}

fn count_from_rows(rows: &[Vec<Value>]) -> i64 {
    rows.first()
        .and_then(|row| row.first())
        .and_then(Value::as_i64)
        .unwrap_or(0)
}

#[async_trait]
impl GraphStore for Neo4jHttp {
    async fn find_nodes(&mut self, label: &str, vol_id: i64) -> Result<Vec<GraphNode>> {
        let statement = format!(
            "MATCH (n:{} {{volId: $volId}}) RETURN id(n), labels(n), properties(n) ORDER BY id(n)",
            quote_identifier(label)?
        );
        let rows = self.run(&statement, json!({ "volId": vol_id })).await?;
        rows.iter().map(|row| node_from_row(row)).collect()
    }

    async fn create_node(&mut self, label: &str, properties: Properties) -> Result<GraphNode> {
        let statement = format!(
            "CREATE (n:{}) SET n = $props RETURN id(n), labels(n), properties(n)",
            quote_identifier(label)?
        );
        let rows = self.run(&statement, json!({ "props": properties })).await?;
        let row = rows
            .first()
            .ok_or_else(|| GraphError::Response("CREATE returned no row".into()))?;
        node_from_row(row)
    }

    async fn has_relationship(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
        properties: &Properties,
    ) -> Result<bool> {
        let statement = format!(
            "MATCH (a)-[r:{}]->(b) WHERE id(a) = $from AND id(b) = $to \
             AND all(k IN keys($props) WHERE r[k] = $props[k]) RETURN count(r)",
            quote_identifier(rel_type)?
        );
        let rows = self
            .run(&statement, json!({ "from": from, "to": to, "props": properties }))
            .await?;
        Ok(count_from_rows(&rows) > 0)
    }

    async fn create_relationship(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
        properties: Properties,
    ) -> Result<()> {
        let statement = format!(
            "MATCH (a), (b) WHERE id(a) = $from AND id(b) = $to \
             CREATE (a)-[r:{}]->(b) SET r = $props RETURN count(r)",
            quote_identifier(rel_type)?
        );
        let rows = self
            .run(&statement, json!({ "from": from, "to": to, "props": properties }))
            .await?;
        if count_from_rows(&rows) == 0 {
            return Err(GraphError::Response(format!(
                "Relationship {from} -> {to} not created"
            )));
        }
        Ok(())
    }

    async fn set_properties(&mut self, node: NodeId, properties: Properties) -> Result<()> {
        self.run(
            "MATCH (n) WHERE id(n) = $id SET n += $props",
            json!({ "id": node, "props": properties }),
        )
        .await?;
        Ok(())
    }

    async fn add_labels(&mut self, node: NodeId, labels: &[String]) -> Result<()> {
        if labels.is_empty() {
            return Ok(());
        }
        let quoted = labels
            .iter()
            .map(|l| quote_identifier(l))
            .collect::<Result<Vec<_>>>()?;
        let statement = format!("MATCH (n) WHERE id(n) = $id SET n:{}", quoted.join(":"));
        self.run(&statement, json!({ "id": node })).await?;
        Ok(())
    }

    async fn children(&mut self, label: &str) -> Result<Vec<(i64, Vec<i64>)>> {
        let statement = format!(
            "MATCH (n:{}) OPTIONAL MATCH (n)-[:{}]->(c) \
             RETURN n.volId, collect(c.volId) ORDER BY n.volId",
            quote_identifier(label)?,
            quote_identifier(CHILD)?
        );
        let rows = self.run(&statement, json!({})).await?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                let vol_id = row.first()?.as_i64()?;
                let children = row
                    .get(1)
                    .and_then(Value::as_array)
                    .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
                    .unwrap_or_default();
                Some((vol_id, children))
            })
            .collect())
    }

    async fn clear(&mut self) -> Result<()> {
        self.run("MATCH (n) DETACH DELETE n", json!({})).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("GeoPhysVol").unwrap(), "`GeoPhysVol`");
        assert_eq!(quote_identifier("physvol_2").unwrap(), "`physvol_2`");
        assert!(matches!(
            quote_identifier("a`) DETACH DELETE (n"),
            Err(GraphError::InvalidLabel(_))
        ));
        assert!(quote_identifier("").is_err());
    }

    #[test]
    fn test_endpoint_from_config() {
        let config = Config::from_vars(|key| match key {
            "NEO4J_URL" => Some("http://graph:7474/".into()),
            "NEO4J_DATABASE" => Some("atlas".into()),
            _ => None,
        });
        let client = Neo4jHttp::new(&config).unwrap();
        assert_eq!(client.endpoint, "http://graph:7474/db/atlas/tx/commit");
    }

    #[test]
    fn test_rows_and_nodes() {
        let response: TxResponse = serde_json::from_value(json!({
            "results": [{
                "columns": ["id(n)", "labels(n)", "properties(n)"],
                "data": [{ "row": [12, ["physvol"], { "volId": 3 }], "meta": [] }]
            }],
            "errors": []
        }))
        .unwrap();

        let rows = rows(response).unwrap();
        let node = node_from_row(&rows[0]).unwrap();
        assert_eq!(node.id, 12);
        assert_eq!(node.labels, vec!["physvol"]);
        assert_eq!(node.properties["volId"], 3);
    }

    #[test]
    fn test_node_id_must_be_numeric() {
        let row = vec![
            json!("4:6c7a1f0e-0000:12"),
            json!(["physvol"]),
            json!({ "volId": 3 }),
        ];
        assert!(matches!(node_from_row(&row), Err(GraphError::Response(_))));
    }

    #[test]
    fn test_cypher_error_surfaces() {
        let response: TxResponse = serde_json::from_value(json!({
            "results": [],
            "errors": [{
                "code": "Neo.ClientError.Statement.SyntaxError",
                "message": "Invalid input"
            }]
        }))
        .unwrap();

        match rows(response) {
            Err(GraphError::Cypher { code, .. }) => {
                assert_eq!(code, "Neo.ClientError.Statement.SyntaxError")
            }
            other => panic!("expected Cypher error, got {other:?}"),
        }
    }
}
