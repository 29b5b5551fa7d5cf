// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Destination for flattened documents.

use crate::document::FlattenedDocument;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors that stop a batch from being delivered at all.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Transport error (HTTP status {status:?}): {message}")]
    Transport { status: Option<u16>, message: String },

    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A document the destination refused.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedDocument {
    /// Index of the document in the submitted batch.
    pub position: usize,
    pub status: u16,
    pub reason: String,
}

/// Outcome of a delivered batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SinkReport {
    pub stored: usize,
    pub rejected: Vec<RejectedDocument>,
}

impl SinkReport {
    pub fn all_stored(stored: usize) -> Self {
        Self {
            stored,
            rejected: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Receives the whole document buffer in a single call at the end of a run.
#[async_trait]
pub trait DocumentSink: Send {
    async fn store(&mut self, documents: &[FlattenedDocument]) -> Result<SinkReport, SinkError>;
}
