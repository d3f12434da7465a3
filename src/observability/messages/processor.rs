// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for version-protocol and training lifecycle events.

use std::fmt::{Display, Formatter};

use tracing::Span;

use crate::observability::messages::StructuredLog;
use crate::traits::processor::NodeId;

/// A node transitioned into (or refreshed its metadata in) the immutable
/// state.
///
/// # Log Level
/// `debug!` - Editing-path event
pub struct ProcessorFinalised<'a> {
    pub id: NodeId,
    pub name: &'a str,
}

impl Display for ProcessorFinalised<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Processor {} ('{}') finalised", self.id, self.name)
    }
}

impl StructuredLog for ProcessorFinalised<'_> {
    fn log(&self) {
        tracing::debug!(processor = %self.id, name = self.name, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("finalise", span_name = name, processor = %self.id)
    }
}

/// A node was superseded by a new version.
///
/// # Log Level
/// `info!` - Pipeline topology changed
pub struct ProcessorReplaced {
    pub old: NodeId,
    pub new: NodeId,
}

impl Display for ProcessorReplaced {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Processor {} replaced by {}", self.old, self.new)
    }
}

impl StructuredLog for ProcessorReplaced {
    fn log(&self) {
        tracing::info!(old = %self.old, new = %self.new, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("replace", span_name = name, old = %self.old, new = %self.new)
    }
}

/// A node was permanently excluded from future pipeline versions.
///
/// # Log Level
/// `info!` - Pipeline topology changed
pub struct ProcessorDeleted {
    pub id: NodeId,
}

impl Display for ProcessorDeleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Processor {} deleted", self.id)
    }
}

impl StructuredLog for ProcessorDeleted {
    fn log(&self) {
        tracing::info!(processor = %self.id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("delete", span_name = name, processor = %self.id)
    }
}

/// A completed training batch was rolled back through a node and its
/// feedback delivered.
///
/// # Log Level
/// `debug!` - Training-path event
pub struct TrainedFromBatch {
    pub processor: NodeId,
    pub all: usize,
    pub successful: usize,
}

impl Display for TrainedFromBatch {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor {} trained from batch: {}/{} output(s) successful",
            self.processor, self.successful, self.all
        )
    }
}

impl StructuredLog for TrainedFromBatch {
    fn log(&self) {
        tracing::debug!(
            processor = %self.processor,
            all = self.all,
            successful = self.successful,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("train_from_batch", span_name = name, processor = %self.processor)
    }
}
