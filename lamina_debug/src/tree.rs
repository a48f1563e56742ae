// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Indented text dumps of a committed layer tree.
//!
//! One line per layer, children indented two spaces below their parent, in
//! sublayer (paint) order:
//!
//! ```text
//! Primary Layer #1 pos=(0, 0) size=(800 x 600) draws phase=BACKGROUND|FOREGROUND|MASK
//!   Ancestor Clipping Layer #4 pos=(10, 10) size=(100 x 100) clips phase=none
//!     Primary Layer #4 pos=(0, 0) size=(50 x 50) offset=(-5, -5) draws phase=... display=full
//! ```

use std::fmt::Write as _;
use std::io::{self, Write};

use lamina_core::layer::{GraphicsLayerId, GraphicsLayerStore, NeedsDisplay};
use lamina_core::phase::PaintPhase;

/// Writes the subtree rooted at `root`.
pub fn write_tree(
    store: &GraphicsLayerStore,
    root: GraphicsLayerId,
    writer: &mut dyn Write,
) -> io::Result<()> {
    for (layer, depth) in store.descendants(root) {
        writeln!(writer, "{:indent$}{}", "", describe(store, layer), indent = depth * 2)?;
    }
    Ok(())
}

/// Writes every root layer's subtree, in slot order.
pub fn write_forest(store: &GraphicsLayerStore, writer: &mut dyn Write) -> io::Result<()> {
    for root in store.roots() {
        write_tree(store, root, writer)?;
    }
    Ok(())
}

/// Renders the subtree rooted at `root` to a string.
#[must_use]
pub fn render(store: &GraphicsLayerStore, root: GraphicsLayerId) -> String {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_tree(store, root, &mut out);
    String::from_utf8_lossy(&out).into_owned()
}

/// One line describing a single layer.
#[must_use]
pub fn describe(store: &GraphicsLayerStore, layer: GraphicsLayerId) -> String {
    let mut line = format!(
        "{} {} pos=({}, {}) size=({} x {})",
        store.role(layer).debug_name(),
        store.owner(layer),
        store.position(layer).x,
        store.position(layer).y,
        store.size(layer).width,
        store.size(layer).height,
    );
    let offset = store.offset_from_owner(layer);
    if offset.x != 0.0 || offset.y != 0.0 {
        let _ = write!(line, " offset=({}, {})", offset.x, offset.y);
    }
    let flags = store.flags(layer);
    if flags.draws_content {
        line.push_str(" draws");
    }
    if flags.masks_to_bounds {
        line.push_str(" clips");
    }
    if !flags.contents_visible {
        line.push_str(" hidden");
    }
    let opacity = store.opacity(layer);
    if opacity < 1.0 {
        let _ = write!(line, " opacity={opacity}");
    }
    if let Some(contents) = store.contents(layer) {
        let _ = write!(line, " contents={contents:?}");
    }
    if let Some(mask) = store.mask_layer(layer) {
        let _ = write!(line, " mask={}", mask.index());
    }
    if let Some(replica) = store.replica_layer(layer) {
        let _ = write!(line, " replica={}", replica.index());
    }
    let _ = write!(line, " phase={}", phase_names(store.painting_phase(layer)));
    match store.needs_display(layer) {
        NeedsDisplay::None => {}
        NeedsDisplay::Full => line.push_str(" display=full"),
        NeedsDisplay::Rects(rects) => {
            let _ = write!(line, " display=rects({})", rects.len());
        }
    }
    line
}

/// Names of the set phases joined with `|`, or `none`.
pub(crate) fn phase_names(phase: PaintPhase) -> String {
    let names: Vec<&str> = phase.iter_names().map(|(name, _)| name).collect();
    if names.is_empty() {
        "none".to_owned()
    } else {
        names.join("|")
    }
}
