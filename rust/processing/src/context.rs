// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-run state: record source, document buffer and sink.

use crate::document::{DocumentEmitter, FlattenedDocument};
use crate::sink::{DocumentSink, SinkError, SinkReport};
use crate::walker::{TraversalStats, TreeWalker, DEFAULT_MAX_DEPTH};
use geomodel_core::{RecordSource, Result};

#[derive(Debug, Clone)]
pub struct TraversalConfig {
    /// Deepest level that is still descended into. Volumes at this depth are
    /// emitted but their children are not visited.
    pub max_depth: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Everything one run needs, created once and owned by the driver.
pub struct TraversalContext<S, K> {
    source: S,
    sink: K,
    emitter: DocumentEmitter,
    config: TraversalConfig,
}

impl<S, K> TraversalContext<S, K>
where
    S: RecordSource,
{
    pub fn new(source: S, sink: K, config: TraversalConfig) -> Self {
        Self {
            source,
            sink,
            emitter: DocumentEmitter::new(),
            config,
        }
    }

    /// Walk the whole tree below the root volume, buffering documents.
    pub fn traverse(&mut self) -> Result<TraversalStats> {
        let root = self.source.root()?;
        tracing::info!(
            root = root.vol_id,
            max_depth = self.config.max_depth,
            "Starting traversal"
        );

        let walker = TreeWalker::new(&self.source, &mut self.emitter, self.config.max_depth);
        let stats = walker.walk_root(&root)?;

        tracing::info!(
            visited = stats.visited,
            documents = stats.documents,
            deepest = stats.deepest,
            truncated = stats.truncated,
            "Traversal finished"
        );
        if !stats.not_expanded.is_empty() {
            tracing::info!(node_types = ?stats.not_expanded, "Nodes not expanded");
        }
        Ok(stats)
    }

    pub fn documents(&self) -> &[FlattenedDocument] {
        self.emitter.documents()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S, K> TraversalContext<S, K>
where
    K: DocumentSink,
{
    /// Send the buffered documents to the sink in one batch.
    pub async fn flush(&mut self) -> std::result::Result<SinkReport, SinkError> {
        let documents = self.emitter.take();
        tracing::info!(count = documents.len(), "Storing volumes");
        let report = self.sink.store(&documents).await?;
        for rejected in &report.rejected {
            tracing::warn!(
                position = rejected.position,
                status = rejected.status,
                reason = %rejected.reason,
                "Document rejected"
            );
        }
        tracing::info!(
            stored = report.stored,
            rejected = report.rejected.len(),
            "Bulk store done"
        );
        Ok(report)
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }
}
