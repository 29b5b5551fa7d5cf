// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! geomodel-graph - store GeoModel volume hierarchies in Neo4j.
//!
//! Every creating command is idempotent: nodes are looked up by label and
//! `volId` before being created, relationships by type and endpoints.

use anyhow::Context;
use clap::{Parser, Subcommand};
use geomodel_core::{load_store, open_read_only};
use std::path::PathBuf;

mod config;
mod error;
mod graph;
mod neo4j;

use config::Config;
use graph::{GraphLoader, Properties, PHYSVOL_LABEL};
use neo4j::Neo4jHttp;

#[derive(Parser, Debug)]
#[command(name = "geomodel-graph")]
#[command(version, about = "Load GeoModel volume hierarchies into Neo4j")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Get or create a physvol node and CHILD edges to the given children
    Add {
        vol_id: i64,
        child_ids: Vec<i64>,
    },

    /// Get or create a parent/child pair and the CHILD edge between them
    Child {
        parent_id: i64,
        child_id: i64,
        position: i64,
        #[arg(long, default_value = PHYSVOL_LABEL)]
        parent_label: String,
        #[arg(long, default_value = PHYSVOL_LABEL)]
        child_label: String,
    },

    /// Relate two existing nodes
    Rel {
        parent_id: i64,
        parent_label: String,
        child_id: i64,
        child_label: String,
        rel_type: String,
        /// Create the relationship even if one of this type exists
        #[arg(long)]
        allow_duplicates: bool,
    },

    /// Merge a JSON object of properties into an existing node
    Props {
        vol_id: i64,
        label: String,
        json: String,
    },

    /// Add labels to an existing node
    Labels {
        vol_id: i64,
        label: String,
        #[arg(required = true)]
        labels: Vec<String>,
    },

    /// List physvol nodes with their children
    List,

    /// Delete every node and relationship
    Clear,

    /// Mirror a GeoModel SQLite database into the graph
    Load {
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    if let Err(e) = run(cli.command, config).await {
        tracing::error!(error = %format!("{e:#}"), "Aborting");
        return Err(e);
    }
    Ok(())
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    tracing::debug!(url = %config.neo4j_url, database = %config.neo4j_database, "Connecting to Neo4j");
    let mut loader = GraphLoader::new(Neo4jHttp::new(&config)?);

    match command {
        Command::Add { vol_id, child_ids } => {
            loader.add(vol_id, &child_ids).await?;
            println!("created vol with volId {vol_id}");
        }
        Command::Child {
            parent_id,
            child_id,
            position,
            parent_label,
            child_label,
        } => {
            loader
                .add_child(parent_id, child_id, position, &parent_label, &child_label)
                .await?;
        }
        Command::Rel {
            parent_id,
            parent_label,
            child_id,
            child_label,
            rel_type,
            allow_duplicates,
        } => {
            let created = loader
                .add_relationship(
                    (parent_id, &parent_label),
                    (child_id, &child_label),
                    &rel_type,
                    !allow_duplicates,
                )
                .await?;
            if !created {
                tracing::info!(parent_id, child_id, rel_type = %rel_type, "Relationship exists already");
            }
        }
        Command::Props { vol_id, label, json } => {
            let properties: Properties =
                serde_json::from_str(&json).context("Properties must be a JSON object")?;
            loader.add_properties(vol_id, &label, properties).await?;
        }
        Command::Labels {
            vol_id,
            label,
            labels,
        } => {
            loader.add_labels(vol_id, &label, &labels).await?;
        }
        Command::List => {
            for (vol_id, children) in loader.list().await? {
                let rendered: String = children.iter().map(|c| format!("  <{c}>")).collect();
                println!("{vol_id}{rendered}");
            }
        }
        Command::Clear => {
            loader.clear().await?;
            println!("DB cleared");
        }
        Command::Load { input } => {
            let pool = open_read_only(&input)
                .await
                .with_context(|| format!("Cannot open {}", input.display()))?;
            let store = load_store(&pool).await.context("Loading geometry tables")?;
            pool.close().await;
            loader.load_geomodel(&store).await?;
        }
    }

    let stats = loader.stats();
    tracing::info!(
        nodes = stats.nodes,
        relationships = stats.relationships,
        "Done"
    );
    Ok(())
}
