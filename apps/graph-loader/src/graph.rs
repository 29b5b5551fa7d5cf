// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Idempotent volume-graph operations over an abstract graph store.
//!
//! Nodes are identified by a label and a `volId` property. Every creating
//! operation first looks the node or relationship up, so re-running the same
//! command leaves the graph unchanged.

use crate::error::{GraphError, Result};
use async_trait::async_trait;
use geomodel_core::{GeoModelStore, GeoRecord, GeoTable, ItemId, NodeKind, RecordSource, TableId};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};

/// Label used by the plain `add`/`list` commands.
pub const PHYSVOL_LABEL: &str = "physvol";

pub const CHILD: &str = "CHILD";
pub const LOGVOL: &str = "LOGVOL";
pub const SHAPE: &str = "SHAPE";
pub const MATERIAL: &str = "MATERIAL";

/// Store-assigned node identity.
pub type NodeId = i64;

pub type Properties = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub labels: Vec<String>,
    pub properties: Properties,
}

/// Minimal property-graph interface the loader needs.
#[async_trait]
pub trait GraphStore: Send {
    /// Nodes carrying `label` whose `volId` equals `vol_id`.
    async fn find_nodes(&mut self, label: &str, vol_id: i64) -> Result<Vec<GraphNode>>;

    /// Create a node with `label` and `properties` (which include `volId`).
    async fn create_node(&mut self, label: &str, properties: Properties) -> Result<GraphNode>;

    /// Whether a `rel_type` relationship `from -> to` exists whose properties
    /// include every entry of `properties`.
    async fn has_relationship(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
        properties: &Properties,
    ) -> Result<bool>;

    async fn create_relationship(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
        properties: Properties,
    ) -> Result<()>;

    /// Merge `properties` into the node's existing properties.
    async fn set_properties(&mut self, node: NodeId, properties: Properties) -> Result<()>;

    async fn add_labels(&mut self, node: NodeId, labels: &[String]) -> Result<()>;

    /// `volId` of every `label` node with the `volId`s of its `CHILD` targets.
    async fn children(&mut self, label: &str) -> Result<Vec<(i64, Vec<i64>)>>;

    /// Delete every node and relationship.
    async fn clear(&mut self) -> Result<()>;
}

/// Counts of what a command actually created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub nodes: usize,
    pub relationships: usize,
}

pub struct GraphLoader<S> {
    store: S,
    known: FxHashMap<(String, i64), NodeId>,
    stats: LoadStats,
}

impl<S: GraphStore> GraphLoader<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            known: FxHashMap::default(),
            stats: LoadStats::default(),
        }
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Existing node with this label and id, if any. Several matches are
    /// reported and the first one is used.
    async fn find(&mut self, label: &str, vol_id: i64) -> Result<Option<NodeId>> {
        if let Some(id) = self.known.get(&(label.to_string(), vol_id)) {
            return Ok(Some(*id));
        }

        let nodes = self.store.find_nodes(label, vol_id).await?;
        if nodes.len() > 1 {
            tracing::warn!(label, vol_id, count = nodes.len(), "Several nodes match, using the first");
        }
        let found = nodes.first().map(|n| n.id);
        if let Some(id) = found {
            self.known.insert((label.to_string(), vol_id), id);
        }
        Ok(found)
    }

    async fn require(&mut self, label: &str, vol_id: i64) -> Result<NodeId> {
        self.find(label, vol_id)
            .await?
            .ok_or_else(|| GraphError::NodeNotFound {
                label: label.to_string(),
                vol_id,
            })
    }

    /// Get or create; `extra` properties are only written on creation.
    async fn ensure(&mut self, label: &str, vol_id: i64, extra: Properties) -> Result<NodeId> {
        if let Some(id) = self.find(label, vol_id).await? {
            tracing::debug!(label, vol_id, "Node stored already");
            return Ok(id);
        }

        let mut properties = extra;
        properties.insert("volId".into(), Value::from(vol_id));
        let node = self.store.create_node(label, properties).await?;
        tracing::debug!(label, vol_id, "Node created");
        self.known.insert((label.to_string(), vol_id), node.id);
        self.stats.nodes += 1;
        Ok(node.id)
    }

    /// Create `from -[rel_type]-> to` unless an equal one exists.
    async fn link(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
        properties: Properties,
    ) -> Result<bool> {
        if self
            .store
            .has_relationship(from, to, rel_type, &properties)
            .await?
        {
            tracing::debug!(from, to, rel_type, "Relationship stored already");
            return Ok(false);
        }
        self.store
            .create_relationship(from, to, rel_type, properties)
            .await?;
        self.stats.relationships += 1;
        Ok(true)
    }

    /// Get or create a `physvol` node and `CHILD` edges to each child.
    pub async fn add(&mut self, vol_id: i64, child_ids: &[i64]) -> Result<()> {
        let parent = self.ensure(PHYSVOL_LABEL, vol_id, Properties::new()).await?;
        for &child_id in child_ids {
            let child = self.ensure(PHYSVOL_LABEL, child_id, Properties::new()).await?;
            self.link(parent, child, CHILD, Properties::new()).await?;
        }
        Ok(())
    }

    /// Get or create both nodes and the `CHILD` edge between them. A newly
    /// created child records its `position`.
    pub async fn add_child(
        &mut self,
        parent_id: i64,
        child_id: i64,
        position: i64,
        parent_label: &str,
        child_label: &str,
    ) -> Result<()> {
        let parent = self.ensure(parent_label, parent_id, Properties::new()).await?;
        let mut extra = Properties::new();
        extra.insert("position".into(), Value::from(position));
        let child = self.ensure(child_label, child_id, extra).await?;
        self.link(parent, child, CHILD, Properties::new()).await?;
        Ok(())
    }

    /// Relate two existing nodes. With `unique` an existing relationship of
    /// the same type is reused; without it a new one is always created.
    pub async fn add_relationship(
        &mut self,
        parent: (i64, &str),
        child: (i64, &str),
        rel_type: &str,
        unique: bool,
    ) -> Result<bool> {
        let from = self.require(parent.1, parent.0).await?;
        let to = self.require(child.1, child.0).await?;

        if unique {
            return self.link(from, to, rel_type, Properties::new()).await;
        }
        self.store
            .create_relationship(from, to, rel_type, Properties::new())
            .await?;
        self.stats.relationships += 1;
        Ok(true)
    }

    /// Merge properties into an existing node.
    pub async fn add_properties(&mut self, vol_id: i64, label: &str, properties: Properties) -> Result<()> {
        let node = self.require(label, vol_id).await?;
        self.store.set_properties(node, properties).await
    }

    pub async fn add_labels(&mut self, vol_id: i64, label: &str, labels: &[String]) -> Result<()> {
        let node = self.require(label, vol_id).await?;
        self.store.add_labels(node, labels).await
    }

    pub async fn list(&mut self) -> Result<Vec<(i64, Vec<i64>)>> {
        self.store.children(PHYSVOL_LABEL).await
    }

    pub async fn clear(&mut self) -> Result<()> {
        self.known.clear();
        self.store.clear().await
    }

    /// Mirror a GeoModel snapshot: one node per edge endpoint labelled with
    /// its node type, `CHILD` edges carrying the position, and
    /// `LOGVOL`/`SHAPE`/`MATERIAL` edges from each physical volume.
    pub async fn load_geomodel(&mut self, geo: &GeoModelStore) -> Result<LoadStats> {
        let before = self.stats;
        let root = geo.root()?;
        let mut volumes: Vec<(TableId, ItemId)> = vec![(root.vol_table, root.vol_id)];
        let mut seen: FxHashSet<(TableId, ItemId)> = FxHashSet::default();
        seen.insert((root.vol_table, root.vol_id));

        let root_label = geo.node_type(root.vol_table)?.node_type.clone();
        self.ensure(&root_label, root.vol_id, Properties::new()).await?;

        for edge in geo.edges() {
            let parent_label = geo.node_type(edge.parent_table)?.node_type.clone();
            let child_entry = geo.node_type(edge.child_table)?;
            let child_label = child_entry.node_type.clone();
            let child_is_volume = child_entry.kind().is_some_and(|k| k.is_physical_volume());

            let parent = self.ensure(&parent_label, edge.parent_id, Properties::new()).await?;
            let child = self.ensure(&child_label, edge.child_id, Properties::new()).await?;

            let mut properties = Properties::new();
            properties.insert("position".into(), Value::from(edge.position));
            self.link(parent, child, CHILD, properties).await?;

            if child_is_volume && seen.insert((edge.child_table, edge.child_id)) {
                volumes.push((edge.child_table, edge.child_id));
            }
        }

        for (table, vol_id) in volumes {
            let (kind, record) = geo.resolve(table, vol_id)?;
            self.link_references(geo, kind, record).await?;
        }

        let stats = LoadStats {
            nodes: self.stats.nodes - before.nodes,
            relationships: self.stats.relationships - before.relationships,
        };
        tracing::info!(
            nodes = stats.nodes,
            relationships = stats.relationships,
            edges = geo.edge_count(),
            "GeoModel loaded into graph"
        );
        Ok(stats)
    }

    async fn link_references(
        &mut self,
        geo: &GeoModelStore,
        kind: NodeKind,
        record: &GeoRecord,
    ) -> Result<()> {
        let Some(logvol_id) = record.logvol_ref() else {
            return Ok(());
        };
        let logvol = match geo.record(GeoTable::LogVols, logvol_id)? {
            GeoRecord::LogVol(logvol) => logvol,
            other => {
                return Err(GraphError::Geometry(geomodel_core::Error::TypeMismatch {
                    expected: NodeKind::LogVol.as_str(),
                    found: other.kind().as_str(),
                }))
            }
        };

        let volume = self.ensure(kind.as_str(), record.id(), Properties::new()).await?;
        let lv = self
            .ensure(NodeKind::LogVol.as_str(), logvol.id, Properties::new())
            .await?;
        self.link(volume, lv, LOGVOL, Properties::new()).await?;

        let shape = self
            .ensure(NodeKind::Shape.as_str(), logvol.shape, Properties::new())
            .await?;
        self.link(lv, shape, SHAPE, Properties::new()).await?;

        let material = self
            .ensure(NodeKind::Material.as_str(), logvol.material, Properties::new())
            .await?;
        self.link(lv, material, MATERIAL, Properties::new()).await?;
        Ok(())
    }
}
