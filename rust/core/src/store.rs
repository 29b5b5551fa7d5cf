// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory snapshot of a GeoModel database.
//!
//! The loader reads every table once into this store; traversal then runs
//! synchronously against it through [`RecordSource`]. Tests build stores by
//! hand with the same insert methods.

use crate::error::{Error, Result};
use crate::records::{ChildEdge, GeoRecord, RootVolume};
use crate::schema::{GeoTable, ItemId, NodeTypeEntry, TableId};
use crate::source::RecordSource;
use rustc_hash::FxHashMap;

/// Snapshot of the GeoModel tables, keyed for id lookups.
#[derive(Debug, Default)]
pub struct GeoModelStore {
    node_types: FxHashMap<TableId, NodeTypeEntry>,
    records: FxHashMap<(GeoTable, ItemId), GeoRecord>,
    children: FxHashMap<(TableId, ItemId), Vec<ChildEdge>>,
    root: Option<RootVolume>,
    duplicates: usize,
}

impl GeoModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_node_type(&mut self, entry: NodeTypeEntry) {
        if self.node_types.contains_key(&entry.id) {
            tracing::warn!(table_id = entry.id, "Duplicate GeoNodesTypes row, keeping the first");
            self.duplicates += 1;
            return;
        }
        self.node_types.insert(entry.id, entry);
    }

    /// Insert a record. A second row with the same id is ambiguous: it is
    /// logged and dropped so the first row wins.
    pub fn insert_record(&mut self, table: GeoTable, record: GeoRecord) {
        let key = (table, record.id());
        if self.records.contains_key(&key) {
            tracing::warn!(
                table = %table,
                id = key.1,
                "Found more than one row with the same id, using the first"
            );
            self.duplicates += 1;
            return;
        }
        self.records.insert(key, record);
    }

    /// Add a child edge. Edges are kept sorted by position once
    /// [`finish`](Self::finish) is called.
    pub fn insert_edge(&mut self, edge: ChildEdge) {
        self.children
            .entry((edge.parent_table, edge.parent_id))
            .or_default()
            .push(edge);
    }

    pub fn set_root(&mut self, root: RootVolume) {
        if let Some(existing) = self.root {
            tracing::warn!(
                kept = existing.vol_id,
                ignored = root.vol_id,
                "More than one RootVolume row, keeping the first"
            );
            self.duplicates += 1;
            return;
        }
        self.root = Some(root);
    }

    /// Sort every child list by position. Siblings sharing a position keep
    /// their insertion order.
    pub fn finish(mut self) -> Self {
        for edges in self.children.values_mut() {
            edges.sort_by_key(|e| e.position);
        }
        self
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn edge_count(&self) -> usize {
        self.children.values().map(Vec::len).sum()
    }

    /// Number of ambiguous rows dropped while loading.
    pub fn duplicate_count(&self) -> usize {
        self.duplicates
    }

    pub fn node_types(&self) -> impl Iterator<Item = &NodeTypeEntry> {
        self.node_types.values()
    }

    /// All child edges, in no particular parent order.
    pub fn edges(&self) -> impl Iterator<Item = &ChildEdge> {
        self.children.values().flatten()
    }

    /// All records of one table, in no particular order.
    pub fn records_of(&self, table: GeoTable) -> impl Iterator<Item = &GeoRecord> {
        self.records
            .iter()
            .filter(move |((t, _), _)| *t == table)
            .map(|(_, record)| record)
    }
}

impl RecordSource for GeoModelStore {
    fn root(&self) -> Result<RootVolume> {
        self.root.ok_or(Error::MissingRoot)
    }

    fn node_type(&self, table_id: TableId) -> Result<&NodeTypeEntry> {
        self.node_types
            .get(&table_id)
            .ok_or(Error::UnknownTable(table_id))
    }

    fn record(&self, table: GeoTable, item_id: ItemId) -> Result<&GeoRecord> {
        self.records
            .get(&(table, item_id))
            .ok_or_else(|| Error::missing(table.table_name(), item_id))
    }

    fn children(&self, parent_table: TableId, parent_id: ItemId) -> &[ChildEdge] {
        self.children
            .get(&(parent_table, parent_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{NameTag, PhysVol};
    use crate::schema::NodeKind;

    fn entry(id: TableId, node_type: &str, table_name: &str) -> NodeTypeEntry {
        NodeTypeEntry {
            id,
            node_type: node_type.into(),
            table_name: table_name.into(),
        }
    }

    fn edge(id: ItemId, parent_id: ItemId, position: i64, child_id: ItemId) -> ChildEdge {
        ChildEdge {
            id,
            parent_table: 1,
            parent_id,
            position,
            child_table: 1,
            child_id,
        }
    }

    #[test]
    fn test_resolve_known_record() {
        let mut store = GeoModelStore::new();
        store.insert_node_type(entry(1, "GeoPhysVol", "PhysVols"));
        store.insert_record(
            GeoTable::PhysVols,
            GeoRecord::PhysVol(PhysVol { id: 5, logvol: 2 }),
        );

        let (kind, record) = store.resolve(1, 5).unwrap();
        assert_eq!(kind, NodeKind::PhysVol);
        assert_eq!(record.logvol_ref(), Some(2));
    }

    #[test]
    fn test_resolve_failures() {
        let mut store = GeoModelStore::new();
        store.insert_node_type(entry(1, "GeoPhysVol", "PhysVols"));
        store.insert_node_type(entry(12, "GeoIdentifierTag", "IdentifierTags"));

        assert!(matches!(store.resolve(99, 1), Err(Error::UnknownTable(99))));
        assert!(matches!(
            store.resolve(1, 42),
            Err(Error::MissingRecord { table: "PhysVols", id: 42 })
        ));
        assert!(matches!(store.resolve(12, 1), Err(Error::UnsupportedTable(_))));
    }

    #[test]
    fn test_duplicate_record_keeps_first() {
        let mut store = GeoModelStore::new();
        store.insert_record(
            GeoTable::NameTags,
            GeoRecord::NameTag(NameTag {
                id: 3,
                name: "first".into(),
            }),
        );
        store.insert_record(
            GeoTable::NameTags,
            GeoRecord::NameTag(NameTag {
                id: 3,
                name: "second".into(),
            }),
        );

        assert_eq!(store.duplicate_count(), 1);
        match store.record(GeoTable::NameTags, 3).unwrap() {
            GeoRecord::NameTag(tag) => assert_eq!(tag.name, "first"),
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn test_children_sorted_by_position() {
        let mut store = GeoModelStore::new();
        store.insert_edge(edge(1, 10, 3, 100));
        store.insert_edge(edge(2, 10, 1, 101));
        store.insert_edge(edge(3, 10, 2, 102));
        store.insert_edge(edge(4, 11, 1, 103));
        let store = store.finish();

        let ids: Vec<_> = store.children(1, 10).iter().map(|e| e.child_id).collect();
        assert_eq!(ids, vec![101, 102, 100]);
        assert!(store.children(2, 10).is_empty());
        assert_eq!(store.edge_count(), 4);
    }

    #[test]
    fn test_missing_root() {
        let store = GeoModelStore::new();
        assert!(matches!(store.root(), Err(Error::MissingRoot)));
    }
}
