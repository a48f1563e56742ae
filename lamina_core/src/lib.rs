// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositing layer mapping for a paint-order element tree.
//!
//! `lamina_core` decides which elements of a laid-out document get their own
//! hardware-composited graphics layers, which auxiliary layers each of them
//! needs (clipping, masking, scrolling, foreground/background splits, and
//! squashing of several elements into one shared layer), and where every
//! layer sits. It is `no_std` compatible (with `alloc`) and keeps graphics
//! layers in a struct-of-arrays arena addressed by generational handles.
//!
//! # Architecture
//!
//! ```text
//!   LayoutProvider (element snapshots, paint order)
//!       │
//!       ▼
//!   Compositor::update()
//!       ├─ Configuration: assign backings, squash, toggle roles
//!       ├─ Hierarchy:     rebuild internal trees, attach children
//!       └─ Geometry:      position, size, snap, configure
//!       │
//!       ▼
//!   Compositor::commit() ──► CompositingUpdate ──► Presenter::apply()
//!                                                      │
//!                 ┌────────────────────────────────────┘
//!                 ▼
//!   Compositor::paint() ──► ElementPainter (per element, per phase)
//! ```
//!
//! **[`compositor`]**: The engine. Owns the arena and one mapping per
//! composited element, runs passes and publishes generations.
//!
//! **[`mapping`]**: [`CompositedLayerMapping`](mapping::CompositedLayerMapping):
//! the layers of one composited element and the lifecycle, hierarchy,
//! geometry, and squashing steps that maintain them.
//!
//! **[`role`]**: The closed set of [`LayerRole`](role::LayerRole)s a mapping
//! can hold, with the predicates that select subsets of them.
//!
//! **[`layer`]**: Struct-of-arrays graphics layer arena with generational
//! handles. Setters record changes in dirty channels; committing drains them
//! into [`LayerChanges`](layer::LayerChanges).
//!
//! **[`dirty`]**: Dirty channel assignments for `understory_dirty`.
//!
//! **[`paint`]**: Paint dispatch from a layer to the element paint
//! routines that fill it.
//!
//! **[`element`]** and **[`style`]**: The read-only view of layout and
//! style the compositor consumes.
//!
//! **[`scrolling`]**: The scrolling coordinator the compositor notifies.
//!
//! **[`backend`]**: The [`Presenter`](backend::Presenter) trait for the
//! graphics side.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! pass instrumentation, with a zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! **[`reasons`]**, **[`phase`]**, **[`geometry`]**, **[`transform`]**,
//! **[`config`]**: Supporting types.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-layer
//!   change and repaint-rect events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod compositor;
pub mod config;
pub mod dirty;
pub mod element;
pub mod geometry;
pub mod layer;
pub mod mapping;
pub mod paint;
pub mod phase;
pub mod reasons;
pub mod role;
pub mod scrolling;
pub mod style;
pub mod trace;
pub mod transform;

#[cfg(test)]
pub(crate) mod testing;
