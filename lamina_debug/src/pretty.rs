// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use lamina_core::trace::{
    HierarchyRebuildEvent, LayerChange, LayerField, PaintDispatchEvent, PaintTarget, PassSummary,
    PhaseBeginEvent, PhaseEndEvent, PhaseKind, RepaintRect, RoleToggleEvent, SquashAssignmentEvent,
    SquashChange, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the destination, consuming the sink.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Configuration => "config",
        PhaseKind::Hierarchy => "hierarchy",
        PhaseKind::Geometry => "geometry",
        PhaseKind::Commit => "commit",
    }
}

fn field_name(field: LayerField) -> &'static str {
    match field {
        LayerField::Geometry => "geometry",
        LayerField::Properties => "properties",
        LayerField::Display => "display",
        LayerField::Topology => "topology",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] gen={} {}",
            e.generation,
            phase_name(e.phase),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] gen={} {}",
            e.generation,
            phase_name(e.phase),
        );
    }

    fn on_role_toggle(&mut self, e: &RoleToggleEvent) {
        let verb = if e.created { "+" } else { "-" };
        let _ = writeln!(
            self.writer,
            "[role] gen={} {} {verb}{} layer={}",
            e.generation,
            e.element,
            e.role.debug_name(),
            e.layer_index,
        );
    }

    fn on_hierarchy_rebuild(&mut self, e: &HierarchyRebuildEvent) {
        let _ = writeln!(
            self.writer,
            "[hierarchy] gen={} {} layers={}",
            e.generation, e.element, e.layer_count,
        );
    }

    fn on_squash_assignment(&mut self, e: &SquashAssignmentEvent) {
        let change = match e.change {
            SquashChange::Assigned => "assigned",
            SquashChange::Evicted => "evicted",
        };
        let _ = writeln!(
            self.writer,
            "[squash] gen={} owner={} member={} slot={} {change}",
            e.generation, e.owner, e.member, e.index,
        );
    }

    fn on_paint_dispatch(&mut self, e: &PaintDispatchEvent) {
        let target = match e.target {
            PaintTarget::Owner => "owner".to_owned(),
            PaintTarget::SquashedMembers(n) => format!("squashed({n})"),
            PaintTarget::Scrollbar(orientation) => format!("scrollbar({orientation:?})"),
            PaintTarget::ScrollCorner => "corner".to_owned(),
        };
        let _ = writeln!(
            self.writer,
            "[paint] {} {} layer={} -> {target} dirty=({:.1}, {:.1}, {:.1}, {:.1})",
            e.element,
            e.role.debug_name(),
            e.layer_index,
            e.dirty.x0,
            e.dirty.y0,
            e.dirty.x1,
            e.dirty.y1,
        );
    }

    fn on_pass_summary(&mut self, s: &PassSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] gen={} mappings={} layers=+{}/-{} rebuilds={} squash={} \
             geometry={} invalidated={} root_bg={}",
            s.generation,
            s.mappings,
            s.layers_created,
            s.layers_released,
            s.hierarchy_rebuilds,
            s.squash_changes,
            s.geometry_updates,
            s.invalidated_elements,
            s.root_fixed_background_changes,
        );
    }

    fn on_layer_changes(&mut self, generation: u64, changes: &[LayerChange]) {
        let mut counts = [0_usize; 4];
        for change in changes {
            counts[change.field as usize] += 1;
        }
        let fields = [
            LayerField::Geometry,
            LayerField::Properties,
            LayerField::Display,
            LayerField::Topology,
        ]
        .iter()
        .zip(counts)
        .filter(|(_, n)| *n > 0)
        .map(|(field, n)| format!(" {}={n}", field_name(*field)))
        .collect::<String>();
        let _ = writeln!(
            self.writer,
            "[layers] gen={generation} changes={}{fields}",
            changes.len(),
        );
    }

    fn on_repaint_rects(&mut self, generation: u64, rects: &[RepaintRect]) {
        let full = rects.iter().filter(|r| r.rect.is_none()).count();
        let _ = writeln!(
            self.writer,
            "[repaint] gen={generation} rects={} full={full}",
            rects.len(),
        );
    }
}
