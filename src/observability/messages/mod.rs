// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each event in the engine's diagnostic surface is a small struct
//! implementing [`Display`](std::fmt::Display) and [`StructuredLog`], so
//! call sites stay free of format strings and every event carries the same
//! fields whether it lands in a terminal or a log pipeline.
//!
//! # Usage Pattern
//!
//! ```rust
//! use trellis::observability::messages::engine::SplitDispatched;
//! use trellis::observability::messages::StructuredLog;
//! use trellis::traits::NodeId;
//!
//! let msg = SplitDispatched {
//!     container: NodeId::next(),
//!     branches: 3,
//!     max_concurrency: 4,
//! };
//! msg.log();
//! ```

use std::fmt::Display;
use tracing::Span;

pub mod engine;
pub mod processor;
pub mod validation;

/// Emits a message as a structured tracing event, and optionally opens a
/// span carrying the same fields.
pub trait StructuredLog: Display {
    fn log(&self);

    fn span(&self, name: &str) -> Span;
}
