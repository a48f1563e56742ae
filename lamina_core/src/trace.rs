// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for compositing passes.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`Compositor`](crate::compositor::Compositor) calls at each stage of a
//! pass. All method bodies default to no-ops, so implementing only the events
//! you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! [`PassSummaryBuilder`] counts what happened during a pass and produces a
//! [`PassSummary`] at commit.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`LayerChange`] and
//!   [`RepaintRect`] events plus the corresponding `TraceSink` methods.

use kurbo::Rect;

use crate::layer::ElementId;
use crate::role::LayerRole;
use crate::scrolling::ScrollbarOrientation;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a compositing pass is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Mapping creation, squashing assignment and role configuration.
    Configuration,
    /// Internal hierarchy rebuilds and layer tree assembly.
    Hierarchy,
    /// Geometry and property updates, parent before child.
    Geometry,
    /// Draining dirty state into a published generation.
    Commit,
}

/// Whether a squashed element entered or left a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SquashChange {
    /// The member now occupies the slot.
    Assigned,
    /// The member was displaced or trimmed.
    Evicted,
}

/// Which routine a paint call was routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaintTarget {
    /// The owner element's paint routine.
    Owner,
    /// Each squashed member in turn; carries the member count.
    SquashedMembers(usize),
    /// A scrollbar widget.
    Scrollbar(ScrollbarOrientation),
    /// The scroll corner and resizer.
    ScrollCorner,
}

/// Which dirty channel a layer change came from.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerField {
    /// Position, size or transform.
    Geometry,
    /// Flags, effects, and layer references.
    Properties,
    /// Needs display.
    Display,
    /// Parent/child relationships.
    Topology,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Marks the beginning of a pass phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Generation the pass will publish.
    pub generation: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
}

/// Marks the end of a pass phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Generation the pass will publish.
    pub generation: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
}

/// Emitted when an auxiliary layer is created or released.
#[derive(Clone, Copy, Debug)]
pub struct RoleToggleEvent {
    /// Generation the pass will publish.
    pub generation: u64,
    /// The owning element.
    pub element: ElementId,
    /// The toggled role.
    pub role: LayerRole,
    /// Raw index of the layer.
    pub layer_index: u32,
    /// `true` on creation, `false` on release.
    pub created: bool,
}

/// Emitted when an element's internal layer hierarchy is rebuilt.
#[derive(Clone, Copy, Debug)]
pub struct HierarchyRebuildEvent {
    /// Generation the pass will publish.
    pub generation: u64,
    /// The element whose layers were re-attached.
    pub element: ElementId,
    /// Number of live layers the element owns.
    pub layer_count: usize,
}

/// Emitted when a squashing slot changes occupant.
#[derive(Clone, Copy, Debug)]
pub struct SquashAssignmentEvent {
    /// Generation the pass will publish.
    pub generation: u64,
    /// The element owning the squashing layer.
    pub owner: ElementId,
    /// The squashed element.
    pub member: ElementId,
    /// Slot index in the group.
    pub index: usize,
    /// What happened to the member.
    pub change: SquashChange,
}

/// Emitted for each paint callback the compositor routes.
#[derive(Clone, Copy, Debug)]
pub struct PaintDispatchEvent {
    /// The layer's owning element.
    pub element: ElementId,
    /// Raw index of the painted layer.
    pub layer_index: u32,
    /// The painted layer's role.
    pub role: LayerRole,
    /// Where the call was routed.
    pub target: PaintTarget,
    /// The requested dirty rect, in layer space.
    pub dirty: Rect,
}

/// Per-pass counters produced by [`PassSummaryBuilder`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Generation the pass published.
    pub generation: u64,
    /// Live mappings after the pass.
    pub mappings: usize,
    /// Graphics layers created.
    pub layers_created: u32,
    /// Graphics layers released.
    pub layers_released: u32,
    /// Internal hierarchies rebuilt.
    pub hierarchy_rebuilds: u32,
    /// Squashing slot assignments and evictions.
    pub squash_changes: u32,
    /// Mappings whose geometry was updated.
    pub geometry_updates: u32,
    /// Elements whose painted content was invalidated.
    pub invalidated_elements: u32,
    /// Root fixed background layer toggles.
    pub root_fixed_background_changes: u32,
}

/// A per-generation layer change record.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct LayerChange {
    /// Index of the layer that changed.
    pub layer_index: u32,
    /// Which channel changed.
    pub field: LayerField,
}

/// A rectangle a layer must repaint.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct RepaintRect {
    /// Index of the layer.
    pub layer_index: u32,
    /// Rect in layer space; the whole layer when `None`.
    pub rect: Option<Rect>,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from compositing passes.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the beginning of a pass phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a pass phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when an auxiliary layer is created or released.
    fn on_role_toggle(&mut self, e: &RoleToggleEvent) {
        _ = e;
    }

    /// Called when an element's internal hierarchy is rebuilt.
    fn on_hierarchy_rebuild(&mut self, e: &HierarchyRebuildEvent) {
        _ = e;
    }

    /// Called when a squashing slot changes occupant.
    fn on_squash_assignment(&mut self, e: &SquashAssignmentEvent) {
        _ = e;
    }

    /// Called for each routed paint callback.
    fn on_paint_dispatch(&mut self, e: &PaintDispatchEvent) {
        _ = e;
    }

    /// Called with the summary of a committed pass.
    fn on_pass_summary(&mut self, s: &PassSummary) {
        _ = s;
    }

    /// Called with per-generation layer changes (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_layer_changes(&mut self, generation: u64, changes: &[LayerChange]) {
        _ = (generation, changes);
    }

    /// Called with per-generation repaint rects (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_repaint_rects(&mut self, generation: u64, rects: &[RepaintRect]) {
        _ = (generation, rects);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RoleToggleEvent`].
    #[inline]
    pub fn role_toggle(&mut self, e: &RoleToggleEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_role_toggle(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`HierarchyRebuildEvent`].
    #[inline]
    pub fn hierarchy_rebuild(&mut self, e: &HierarchyRebuildEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_hierarchy_rebuild(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SquashAssignmentEvent`].
    #[inline]
    pub fn squash_assignment(&mut self, e: &SquashAssignmentEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_squash_assignment(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PaintDispatchEvent`].
    #[inline]
    pub fn paint_dispatch(&mut self, e: &PaintDispatchEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_paint_dispatch(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PassSummary`].
    #[inline]
    pub fn pass_summary(&mut self, s: &PassSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_pass_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits layer changes (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn layer_changes(&mut self, generation: u64, changes: &[LayerChange]) {
        if let Some(s) = &mut self.sink {
            s.on_layer_changes(generation, changes);
        }
    }

    /// Emits repaint rects (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn repaint_rects(&mut self, generation: u64, rects: &[RepaintRect]) {
        if let Some(s) = &mut self.sink {
            s.on_repaint_rects(generation, rects);
        }
    }
}

// ---------------------------------------------------------------------------
// PassSummaryBuilder
// ---------------------------------------------------------------------------

/// Counts events during a pass and produces a [`PassSummary`].
#[derive(Clone, Debug, Default)]
pub struct PassSummaryBuilder {
    summary: PassSummary,
}

impl PassSummaryBuilder {
    /// Starts counting for the given generation.
    #[must_use]
    pub fn new(generation: u64) -> Self {
        Self {
            summary: PassSummary {
                generation,
                ..PassSummary::default()
            },
        }
    }

    /// Records a role toggle.
    pub fn role_toggled(&mut self, created: bool) {
        if created {
            self.summary.layers_created += 1;
        } else {
            self.summary.layers_released += 1;
        }
    }

    /// Records a hierarchy rebuild.
    pub fn hierarchy_rebuilt(&mut self) {
        self.summary.hierarchy_rebuilds += 1;
    }

    /// Records a squashing slot change.
    pub fn squash_changed(&mut self) {
        self.summary.squash_changes += 1;
    }

    /// Records a geometry update.
    pub fn geometry_updated(&mut self) {
        self.summary.geometry_updates += 1;
    }

    /// Consumes the builder and produces the final [`PassSummary`].
    #[must_use]
    pub fn finish(
        self,
        mappings: usize,
        invalidated_elements: u32,
        root_fixed_background_changes: u32,
    ) -> PassSummary {
        PassSummary {
            mappings,
            invalidated_elements,
            root_fixed_background_changes,
            ..self.summary
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
