// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::schema::{ItemId, TableId};
use thiserror::Error;

/// Result type for GeoModel access
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading or resolving GeoModel records
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown table id {0}: not listed in GeoNodesTypes")]
    UnknownTable(TableId),

    #[error("Table '{0}' is not handled")]
    UnsupportedTable(String),

    #[error("Unknown node type '{0}'")]
    UnknownNodeType(String),

    #[error("No record with id {id} in table '{table}'")]
    MissingRecord { table: &'static str, id: ItemId },

    #[error("Expected a {expected} record, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("RootVolume table is empty")]
    MissingRoot,

    #[error("Required table '{0}' not found in database")]
    MissingTable(&'static str),

    #[error("Cannot decode column '{column}' of table '{table}': {source}")]
    Decode {
        table: &'static str,
        column: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn missing(table: &'static str, id: ItemId) -> Self {
        Error::MissingRecord { table, id }
    }
}
