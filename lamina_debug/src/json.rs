// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON export of layer trees and committed changes.
//!
//! Layers become nested objects with a `children` array; rects are
//! `[x0, y0, x1, y1]` arrays. The output is meant for diffing layer trees
//! between runs and for loading into ad hoc tooling.

use std::io::{self, Write};

use kurbo::Rect;
use serde_json::{Value, json};

use lamina_core::layer::{GraphicsLayerId, GraphicsLayerStore, LayerChanges, LayerContents, NeedsDisplay};
use lamina_core::trace::PassSummary;

use crate::tree::phase_names;

/// Renders the subtree rooted at `layer`.
#[must_use]
pub fn layer_tree(store: &GraphicsLayerStore, layer: GraphicsLayerId) -> Value {
    let position = store.position(layer);
    let size = store.size(layer);
    let offset = store.offset_from_owner(layer);
    let flags = store.flags(layer);
    let children: Vec<Value> = store
        .children(layer)
        .map(|child| layer_tree(store, child))
        .collect();
    json!({
        "index": layer.index(),
        "role": store.role(layer).debug_name(),
        "owner": store.owner(layer).0,
        "position": [position.x, position.y],
        "size": [size.width, size.height],
        "offset_from_owner": [offset.x, offset.y],
        "draws_content": flags.draws_content,
        "masks_to_bounds": flags.masks_to_bounds,
        "contents_visible": flags.contents_visible,
        "opacity": store.opacity(layer),
        "painting_phase": phase_names(store.painting_phase(layer)),
        "contents": store.contents(layer).map(contents),
        "mask": store.mask_layer(layer).map(GraphicsLayerId::index),
        "replica": store.replica_layer(layer).map(GraphicsLayerId::index),
        "needs_display": needs_display(store.needs_display(layer)),
        "children": children,
    })
}

/// Renders every root layer's subtree, in slot order.
#[must_use]
pub fn forest(store: &GraphicsLayerStore) -> Value {
    Value::Array(
        store
            .roots()
            .into_iter()
            .map(|root| layer_tree(store, root))
            .collect(),
    )
}

/// Renders the change lists of one commit.
#[must_use]
pub fn changes(changes: &LayerChanges) -> Value {
    let repaint: Vec<Value> = changes
        .repaint
        .iter()
        .map(|(index, pending)| json!({ "index": index, "rects": needs_display(pending) }))
        .collect();
    json!({
        "added": changes.added,
        "removed": changes.removed,
        "geometry": changes.geometry,
        "properties": changes.properties,
        "repaint": repaint,
        "topology_changed": changes.topology_changed,
    })
}

/// Renders a pass summary.
#[must_use]
pub fn summary(s: &PassSummary) -> Value {
    json!({
        "generation": s.generation,
        "mappings": s.mappings,
        "layers_created": s.layers_created,
        "layers_released": s.layers_released,
        "hierarchy_rebuilds": s.hierarchy_rebuilds,
        "squash_changes": s.squash_changes,
        "geometry_updates": s.geometry_updates,
        "invalidated_elements": s.invalidated_elements,
        "root_fixed_background_changes": s.root_fixed_background_changes,
    })
}

/// Writes [`forest`] as pretty-printed JSON.
pub fn export(store: &GraphicsLayerStore, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &forest(store))?;
    writeln!(writer)
}

fn rect(r: Rect) -> Value {
    json!([r.x0, r.y0, r.x1, r.y1])
}

fn needs_display(pending: &NeedsDisplay) -> Value {
    match pending {
        NeedsDisplay::None => Value::Null,
        NeedsDisplay::Full => json!("full"),
        NeedsDisplay::Rects(rects) => Value::Array(rects.iter().copied().map(rect).collect()),
    }
}

fn contents(c: LayerContents) -> Value {
    match c {
        LayerContents::Image(surface) => json!({ "image": surface.0 }),
        LayerContents::Platform(surface) => json!({ "platform": surface.0 }),
    }
}
