// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants for the graphics layer arena.
//!
//! Every setter on [`GraphicsLayerStore`](crate::layer::GraphicsLayerStore)
//! compares the new value with the stored one and marks a channel only when
//! something actually changed. That is what makes a repeated pass over
//! unchanged layout produce an empty commit.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`GEOMETRY`] uses
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) with dependency edges from
//!   child to parent, since a layer's world transform depends on every
//!   ancestor's position and transform.
//! - **Local-only**: [`PROPERTIES`] and [`DISPLAY`] mark just the layer.
//! - **Structural**: [`TOPOLOGY`] is marked on attach/detach and on create
//!   or release; it triggers a traversal-order rebuild at commit.
//!
//! # Consumption
//!
//! [`GraphicsLayerStore::commit`](crate::layer::GraphicsLayerStore::commit)
//! drains all channels into [`LayerChanges`](crate::layer::LayerChanges).

use understory_dirty::Channel;

/// Position, size, transform, or transform origin changed; descendants need
/// their world transforms recomputed.
pub const GEOMETRY: Channel = Channel::new(0);

/// Non-geometric properties changed (draws-content, masks-to-bounds, mask
/// reference, painting phase, opacity, blend mode and so on).
pub const PROPERTIES: Channel = Channel::new(1);

/// Painted content needs to be redrawn, or external contents changed.
pub const DISPLAY: Channel = Channel::new(2);

/// Tree topology changed.
pub const TOPOLOGY: Channel = Channel::new(3);
