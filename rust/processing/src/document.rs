// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Flattened volume documents and the buffer they are collected in.

use crate::expand::ExpandedPhysVol;
use crate::tags::TagStack;
use geomodel_geometry::FoldedTransform;
use serde::{Deserialize, Serialize};

/// One indexed record per physical-volume visit. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlattenedDocument {
    pub depth: usize,
    pub tags: Vec<String>,
    /// Row-major rotation (9 values) followed by the translation (3 values).
    pub transform: [f64; 12],
    pub shape: String,
    pub dimensions: String,
    pub material: String,
    pub name: String,
}

impl FlattenedDocument {
    pub fn new(
        depth: usize,
        tags: &TagStack,
        transform: &FoldedTransform,
        volume: &ExpandedPhysVol,
    ) -> Self {
        let logvol = &volume.logvol;
        Self {
            depth,
            tags: tags.snapshot(),
            transform: transform.to_array(),
            shape: logvol.shape.shape_type.clone(),
            dimensions: logvol.shape.parameters.clone(),
            material: logvol.material.name.clone(),
            name: logvol.name.clone(),
        }
    }
}

/// In-memory document buffer, drained once at the end of a run.
#[derive(Debug, Default)]
pub struct DocumentEmitter {
    buffer: Vec<FlattenedDocument>,
}

impl DocumentEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from the walker state and append it.
    pub fn emit(
        &mut self,
        depth: usize,
        tags: &TagStack,
        transform: &FoldedTransform,
        volume: &ExpandedPhysVol,
    ) -> &FlattenedDocument {
        let doc = FlattenedDocument::new(depth, tags, transform, volume);
        tracing::trace!(depth, name = %doc.name, tags = ?doc.tags, "Emitted document");
        self.buffer.push(doc);
        &self.buffer[self.buffer.len() - 1]
    }

    pub fn documents(&self) -> &[FlattenedDocument] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Hand over the buffered documents, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<FlattenedDocument> {
        std::mem::take(&mut self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::{ExpandedLogVol, ExpandedMaterial, ExpandedShape};
    use geomodel_core::TransformRecord;

    fn volume(name: &str) -> ExpandedPhysVol {
        ExpandedPhysVol {
            id: 1,
            node_type: "GeoPhysVol",
            logvol: ExpandedLogVol {
                id: 1,
                name: name.into(),
                shape: ExpandedShape {
                    shape_type: "Tube".into(),
                    parameters: "RMin=0;RMax=5;ZHalf=20".into(),
                },
                material: ExpandedMaterial {
                    name: "Aluminium".into(),
                    density: None,
                },
            },
        }
    }

    #[test]
    fn test_document_fields() {
        let mut tags = TagStack::new();
        tags.declare(0, "Muon");
        let mut transform = FoldedTransform::identity();
        transform.fold(&TransformRecord::translation(1, 0.0, 0.0, 12.5));

        let doc = FlattenedDocument::new(3, &tags, &transform, &volume("Chamber"));
        assert_eq!(doc.depth, 3);
        assert_eq!(doc.tags, vec!["Muon"]);
        assert_eq!(doc.transform[11], 12.5);
        assert_eq!(doc.shape, "Tube");
        assert_eq!(doc.dimensions, "RMin=0;RMax=5;ZHalf=20");
        assert_eq!(doc.material, "Aluminium");
        assert_eq!(doc.name, "Chamber");
    }

    #[test]
    fn test_emitted_tags_are_a_snapshot() {
        let mut emitter = DocumentEmitter::new();
        let mut tags = TagStack::new();
        tags.declare(0, "first");
        emitter.emit(0, &tags, &FoldedTransform::identity(), &volume("A"));
        tags.declare(0, "second");

        assert_eq!(emitter.documents()[0].tags, vec!["first"]);
    }

    #[test]
    fn test_take_drains_buffer() {
        let mut emitter = DocumentEmitter::new();
        let tags = TagStack::new();
        emitter.emit(0, &tags, &FoldedTransform::identity(), &volume("A"));
        emitter.emit(1, &tags, &FoldedTransform::identity(), &volume("B"));

        let docs = emitter.take();
        assert_eq!(docs.len(), 2);
        assert!(emitter.is_empty());
    }

    #[test]
    fn test_document_json_shape() {
        let doc = FlattenedDocument::new(
            0,
            &TagStack::new(),
            &FoldedTransform::identity(),
            &volume("World"),
        );
        let json = serde_json::to_value(&doc).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys.len(),
            7,
            "unexpected document keys: {keys:?}"
        );
        assert_eq!(json["transform"].as_array().unwrap().len(), 12);
    }
}
