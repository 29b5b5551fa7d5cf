// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! gm2index - flatten a GeoModel geometry database into search documents.
//!
//! Walks the volume tree of a GeoModel SQLite file from the root volume,
//! folds placement transforms along each path and bulk-indexes one document
//! per physical volume into Elasticsearch.
//!
//! # Modes
//!
//! - default: traverse and post to `$ES_URL/_bulk`
//! - `--output FILE`: write the bulk body to a file instead
//! - `--dry-run`: traverse only
//! - `--dump FILE`: write every table as JSON and exit
//! - `--children ID`: print the expanded children of one volume and exit

use anyhow::Context;
use clap::Parser;
use geomodel_core::{
    dump_tables, load_store, open_read_only, GeoModelStore, ItemId, TableId, ROOT_PARENT_TABLE,
};
use geomodel_processing::{
    children_expanded, DocumentSink, TraversalConfig, TraversalContext, DEFAULT_MAX_DEPTH,
};
use std::path::PathBuf;

mod config;
mod sinks;

use config::Config;
use sinks::{BulkTarget, ElasticSink, NdjsonFileSink};

#[derive(Parser, Debug)]
#[command(name = "gm2index")]
#[command(version, about = "Index a GeoModel geometry database into Elasticsearch")]
struct Cli {
    /// GeoModel SQLite file
    #[arg(short, long)]
    input: PathBuf,

    /// Deepest level whose volumes are still descended into
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Write the bulk body to this file instead of posting it
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write every table as JSON to this file and exit
    #[arg(long, value_name = "FILE")]
    dump: Option<PathBuf>,

    /// Print the expanded children of this volume and exit
    #[arg(long, value_name = "VOL_ID")]
    children: Option<ItemId>,

    /// Table id the `--children` volume lives in
    #[arg(long, default_value_t = ROOT_PARENT_TABLE, requires = "children")]
    children_table: TableId,

    /// Traverse without storing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    if let Err(e) = run(cli, config).await {
        tracing::error!(error = %format!("{e:#}"), "Indexing aborted");
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    tracing::info!(
        input = %cli.input.display(),
        max_depth = cli.max_depth,
        es_url = %config.es_url,
        es_index = %config.es_index,
        "Starting gm2index"
    );

    let pool = open_read_only(&cli.input)
        .await
        .with_context(|| format!("Cannot open {}", cli.input.display()))?;

    if let Some(path) = &cli.dump {
        let tables = dump_tables(&pool).await.context("Dumping tables")?;
        tokio::fs::write(path, serde_json::to_vec_pretty(&tables)?)
            .await
            .with_context(|| format!("Cannot write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Tables dumped");
        return Ok(());
    }

    let store = load_store(&pool).await.context("Loading geometry tables")?;
    pool.close().await;

    if let Some(vol_id) = cli.children {
        let expanded = children_expanded(&store, cli.children_table, vol_id)
            .with_context(|| format!("Expanding children of volume {vol_id}"))?;
        println!("{}", serde_json::to_string_pretty(&expanded)?);
        return Ok(());
    }

    let traversal = TraversalConfig {
        max_depth: cli.max_depth,
    };

    if cli.dry_run {
        let mut ctx = TraversalContext::new(store, (), traversal);
        let stats = ctx.traverse().context("Traversal failed")?;
        tracing::info!(documents = stats.documents, "Dry run, nothing stored");
        return Ok(());
    }

    let target = BulkTarget {
        index: config.es_index.clone(),
        doc_type: config.es_doc_type.clone(),
    };
    match cli.output {
        Some(path) => index(store, NdjsonFileSink::new(path, target), traversal).await,
        None => index(store, ElasticSink::new(&config)?, traversal).await,
    }
}

/// Traverse, then hand the buffer to the sink. Sink failures are logged and
/// do not fail the run.
async fn index<K: DocumentSink>(
    store: GeoModelStore,
    sink: K,
    traversal: TraversalConfig,
) -> anyhow::Result<()> {
    let mut ctx = TraversalContext::new(store, sink, traversal);
    ctx.traverse().context("Traversal failed")?;

    match ctx.flush().await {
        Ok(report) if report.is_complete() => {
            tracing::info!(stored = report.stored, "All volumes stored");
        }
        Ok(report) => {
            tracing::warn!(
                stored = report.stored,
                rejected = report.rejected.len(),
                "Some volumes were rejected"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Bulk store failed");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use geomodel_core::{
        ChildEdge, GeoRecord, GeoTable, LogVol, Material, NodeTypeEntry, PhysVol, RootVolume,
        Shape,
    };
    use geomodel_processing::{FlattenedDocument, SinkError, SinkReport};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct RejectingCluster {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DocumentSink for RejectingCluster {
        async fn store(&mut self, _documents: &[FlattenedDocument]) -> Result<SinkReport, SinkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SinkError::Transport {
                status: Some(503),
                message: "cluster unavailable".into(),
            })
        }
    }

    /// Root with one child volume; `child_vol` may point at a missing row.
    fn geometry(child_vol: ItemId) -> GeoModelStore {
        let mut store = GeoModelStore::new();
        for (id, node_type, table_name) in [
            (1, "GeoPhysVol", "PhysVols"),
            (3, "GeoLogVol", "LogVols"),
            (4, "GeoMaterial", "Materials"),
            (5, "GeoShape", "Shapes"),
        ] {
            store.insert_node_type(NodeTypeEntry {
                id,
                node_type: node_type.into(),
                table_name: table_name.into(),
            });
        }
        store.set_root(RootVolume {
            id: 1,
            vol_id: 1,
            vol_table: 1,
        });
        for id in 1..=2 {
            store.insert_record(GeoTable::PhysVols, GeoRecord::PhysVol(PhysVol { id, logvol: 1 }));
        }
        store.insert_record(
            GeoTable::LogVols,
            GeoRecord::LogVol(LogVol {
                id: 1,
                name: "Envelope".into(),
                shape: 1,
                material: 1,
            }),
        );
        store.insert_record(
            GeoTable::Shapes,
            GeoRecord::Shape(Shape {
                id: 1,
                shape_type: "Box".into(),
                parameters: "10,10,10".into(),
            }),
        );
        store.insert_record(
            GeoTable::Materials,
            GeoRecord::Material(Material {
                id: 1,
                name: "Iron".into(),
                density: None,
                elements: None,
            }),
        );
        store.insert_edge(ChildEdge {
            id: 1,
            parent_table: 1,
            parent_id: 1,
            position: 1,
            child_table: 1,
            child_id: child_vol,
        });
        store.finish()
    }

    #[tokio::test]
    async fn test_store_failure_still_completes_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = RejectingCluster {
            calls: Arc::clone(&calls),
        };
        let result = index(geometry(2), sink, TraversalConfig::default()).await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_traversal_failure_aborts_before_store() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = RejectingCluster {
            calls: Arc::clone(&calls),
        };
        let result = index(geometry(99), sink, TraversalConfig::default()).await;

        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("PhysVols"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
