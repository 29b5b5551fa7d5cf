// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GeoModel processing pipeline shared by the indexer and the graph loader.
//!
//! Walks the volume tree of a [`RecordSource`], folds transforms along each
//! path and emits one [`FlattenedDocument`] per physical volume visited.

pub mod context;
pub mod document;
pub mod expand;
pub mod sink;
pub mod tags;
pub mod walker;

pub use context::{TraversalConfig, TraversalContext};
pub use document::{DocumentEmitter, FlattenedDocument};
pub use expand::{
    children_expanded, expand_logical_volume, expand_physical_volume, expand_serial_transformer,
    ChildrenExpanded, ExpandedChild, ExpandedLogVol, ExpandedMaterial, ExpandedPhysVol,
    ExpandedSerialTransformer, ExpandedShape,
};
pub use sink::{DocumentSink, RejectedDocument, SinkError, SinkReport};
pub use tags::TagStack;
pub use walker::{ParentKey, TraversalStats, TreeWalker, DEFAULT_MAX_DEPTH};
