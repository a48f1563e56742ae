// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing, layer tree dumps, and JSON export for lamina
//! diagnostics.
//!
//! - [`pretty::PrettyPrintSink`]: a [`TraceSink`](lamina_core::trace::TraceSink)
//!   writing human-readable one-line-per-event output.
//! - [`tree`]: indented text dumps of a committed layer tree.
//! - [`json`]: layer trees, commit change lists, and pass summaries as
//!   `serde_json` values.

pub mod json;
pub mod pretty;
pub mod tree;
