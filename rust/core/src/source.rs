// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed node resolution over any GeoModel record source.

use crate::error::{Error, Result};
use crate::records::{ChildEdge, GeoRecord, RootVolume};
use crate::schema::{GeoTable, ItemId, NodeKind, NodeTypeEntry, TableId};

/// Read-only access to GeoModel records.
///
/// Every lookup miss is an error; there is no skip-and-continue path.
pub trait RecordSource {
    fn root(&self) -> Result<RootVolume>;

    /// `GeoNodesTypes` row for a numeric table id.
    fn node_type(&self, table_id: TableId) -> Result<&NodeTypeEntry>;

    fn record(&self, table: GeoTable, item_id: ItemId) -> Result<&GeoRecord>;

    /// Direct children of `(parent_table, parent_id)`, ordered by position.
    fn children(&self, parent_table: TableId, parent_id: ItemId) -> &[ChildEdge];

    /// Resolve `(table id, item id)` to its node kind and record.
    fn resolve(&self, table_id: TableId, item_id: ItemId) -> Result<(NodeKind, &GeoRecord)> {
        let entry = self.node_type(table_id)?;
        let table = entry
            .table()
            .ok_or_else(|| Error::UnsupportedTable(entry.table_name.clone()))?;
        let kind = entry
            .kind()
            .or_else(|| table.node_kind())
            .ok_or_else(|| Error::UnknownNodeType(entry.node_type.clone()))?;
        let record = self.record(table, item_id)?;
        Ok((kind, record))
    }
}
