// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Depth-first walk over the GeoModel volume tree.
//!
//! At each level the walker scans the children of one physical volume in
//! position order:
//!
//! - a name tag is recorded at the current depth and labels later siblings
//!   and their subtrees
//! - a transform is folded into this level's accumulator and applies to every
//!   later sibling
//! - a physical volume is expanded, emitted with the current tags and
//!   accumulator, then descended into
//!
//! Ownership of the accumulator: each level starts from its own copy of the
//! incoming transform, and lends that copy down when it descends. The callee
//! copies again before folding anything, so folds made inside a subtree never
//! reach a later sibling. `FoldedTransform` is `Copy`, which makes the copy at
//! the top of [`TreeWalker::walk`] the single place this rule lives.

use crate::document::DocumentEmitter;
use crate::expand::expand_physical_volume;
use crate::tags::TagStack;
use geomodel_core::{
    Error, GeoRecord, ItemId, NodeKind, RecordSource, Result, RootVolume, TableId,
    ROOT_PARENT_TABLE,
};
use geomodel_geometry::FoldedTransform;
use serde::Serialize;
use std::collections::BTreeSet;

/// Depth bound used when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 20;

/// Key under which a node's children are stored in `ChildrenPositions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentKey {
    pub table: TableId,
    pub id: ItemId,
}

impl ParentKey {
    /// The root volume has no resolved table of its own; its children hang
    /// off the sentinel parent table.
    pub fn root(root: &RootVolume) -> Self {
        Self {
            table: ROOT_PARENT_TABLE,
            id: root.vol_id,
        }
    }
}

/// Counters collected during one walk.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TraversalStats {
    /// Child edges resolved.
    pub visited: usize,
    /// Documents emitted.
    pub documents: usize,
    /// Deepest depth at which a document was emitted.
    pub deepest: usize,
    /// Volumes at the depth limit that still had children.
    pub truncated: usize,
    /// Node types met but not expanded.
    pub not_expanded: BTreeSet<&'static str>,
}

pub struct TreeWalker<'a, S: ?Sized> {
    source: &'a S,
    emitter: &'a mut DocumentEmitter,
    max_depth: usize,
    stats: TraversalStats,
}

impl<'a, S> TreeWalker<'a, S>
where
    S: RecordSource + ?Sized,
{
    pub fn new(source: &'a S, emitter: &'a mut DocumentEmitter, max_depth: usize) -> Self {
        Self {
            source,
            emitter,
            max_depth,
            stats: TraversalStats::default(),
        }
    }

    /// Walk everything below the root volume, starting at depth 0 with no
    /// tags and the identity transform.
    pub fn walk_root(mut self, root: &RootVolume) -> Result<TraversalStats> {
        let mut tags = TagStack::new();
        self.walk(ParentKey::root(root), &mut tags, &FoldedTransform::identity(), 0)?;
        Ok(self.stats)
    }

    /// Walk the children of `parent` at `depth`.
    ///
    /// The first resolver or expansion failure aborts the walk; the failing
    /// node produces no document.
    pub fn walk(
        &mut self,
        parent: ParentKey,
        tags: &mut TagStack,
        incoming: &FoldedTransform,
        depth: usize,
    ) -> Result<()> {
        let source = self.source;
        let children = source.children(parent.table, parent.id);
        if children.is_empty() {
            tracing::trace!(parent = parent.id, depth, "Leaf volume");
            return Ok(());
        }

        let mut folded = *incoming;

        for edge in children {
            let (kind, record) = source.resolve(edge.child_table, edge.child_id)?;
            self.stats.visited += 1;

            tracing::debug!(
                depth,
                position = edge.position,
                node_type = %kind,
                id = edge.child_id,
                tags = ?tags.snapshot(),
                "Visiting child"
            );

            match kind {
                NodeKind::NameTag => match record {
                    GeoRecord::NameTag(tag) => tags.declare(depth, tag.name.clone()),
                    other => return Err(type_mismatch(kind, other)),
                },
                NodeKind::Transform | NodeKind::AlignableTransform => {
                    let transform = record
                        .as_transform()
                        .ok_or_else(|| type_mismatch(kind, record))?;
                    folded.fold(transform);
                }
                NodeKind::PhysVol | NodeKind::FullPhysVol => {
                    let volume = expand_physical_volume(source, record)?;
                    self.emitter.emit(depth, tags, &folded, &volume);
                    self.stats.documents += 1;
                    self.stats.deepest = self.stats.deepest.max(depth);

                    let child = ParentKey {
                        table: edge.child_table,
                        id: edge.child_id,
                    };
                    if depth < self.max_depth {
                        self.walk(child, tags, &folded, depth + 1)?;
                    } else if !source.children(child.table, child.id).is_empty() {
                        self.stats.truncated += 1;
                    }
                    tags.unwind(depth + 1);
                }
                other => {
                    self.stats.not_expanded.insert(other.as_str());
                }
            }
        }

        Ok(())
    }
}

fn type_mismatch(expected: NodeKind, found: &GeoRecord) -> Error {
    Error::TypeMismatch {
        expected: expected.as_str(),
        found: found.kind().as_str(),
    }
}
