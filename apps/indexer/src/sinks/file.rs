// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Writes the bulk body to disk for offline loading with `curl --data-binary`.

use super::{bulk_body, BulkTarget};
use async_trait::async_trait;
use geomodel_processing::{DocumentSink, FlattenedDocument, SinkError, SinkReport};
use std::path::PathBuf;

pub struct NdjsonFileSink {
    path: PathBuf,
    target: BulkTarget,
}

impl NdjsonFileSink {
    pub fn new(path: impl Into<PathBuf>, target: BulkTarget) -> Self {
        Self {
            path: path.into(),
            target,
        }
    }
}

#[async_trait]
impl DocumentSink for NdjsonFileSink {
    async fn store(&mut self, documents: &[FlattenedDocument]) -> Result<SinkReport, SinkError> {
        let body = bulk_body(&self.target, documents)?;
        tokio::fs::write(&self.path, body).await?;
        tracing::info!(path = %self.path.display(), count = documents.len(), "Bulk file written");
        Ok(SinkReport::all_stored(documents.len()))
    }
}
