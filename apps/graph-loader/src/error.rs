// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for graph loading.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Node {label} with volId {vol_id} does not exist")]
    NodeNotFound { label: String, vol_id: i64 },

    #[error("Invalid label or relationship type '{0}'")]
    InvalidLabel(String),

    #[error("Neo4j connection failed: {0}")]
    Connection(String),

    #[error("Neo4j request failed: {0}")]
    Http(String),

    #[error("Cypher error {code}: {message}")]
    Cypher { code: String, message: String },

    #[error("Unexpected Neo4j response: {0}")]
    Response(String),

    #[error(transparent)]
    Geometry(#[from] geomodel_core::Error),
}

pub type Result<T> = std::result::Result<T, GraphError>;
