// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for split-join dispatch and join events.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use tracing::Span;

use crate::errors::ExecutionError;
use crate::observability::messages::StructuredLog;
use crate::traits::processor::NodeId;

/// A container fanned one input out to its branch workflows.
///
/// # Log Level
/// `debug!` - High-frequency data-path event
pub struct SplitDispatched {
    pub container: NodeId,
    pub branches: usize,
    pub max_concurrency: usize,
}

impl Display for SplitDispatched {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Container {} dispatched {} branch(es), max_concurrency={}",
            self.container, self.branches, self.max_concurrency
        )
    }
}

impl StructuredLog for SplitDispatched {
    fn log(&self) {
        tracing::debug!(
            container = %self.container,
            branches = self.branches,
            max_concurrency = self.max_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "split_join",
            span_name = name,
            container = %self.container,
            branches = self.branches,
        )
    }
}

/// All branches completed and were joined back into one output.
///
/// # Log Level
/// `debug!` - High-frequency data-path event
pub struct JoinCompleted {
    pub container: NodeId,
    pub branches: usize,
    pub duration: Duration,
}

impl Display for JoinCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Container {} joined {} branch output(s) in {:?}",
            self.container, self.branches, self.duration
        )
    }
}

impl StructuredLog for JoinCompleted {
    fn log(&self) {
        tracing::debug!(
            container = %self.container,
            branches = self.branches,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "join",
            span_name = name,
            container = %self.container,
            branches = self.branches,
        )
    }
}

/// A branch failed and the join was aborted.
///
/// # Log Level
/// `error!` - The whole `process` call fails with this branch's error
pub struct BranchFailure<'a> {
    pub container: NodeId,
    pub error: &'a ExecutionError,
}

impl Display for BranchFailure<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Container {} aborting join: {}",
            self.container, self.error
        )
    }
}

impl StructuredLog for BranchFailure<'_> {
    fn log(&self) {
        tracing::error!(
            container = %self.container,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "branch_failure",
            span_name = name,
            container = %self.container,
        )
    }
}

/// A training pass produced its cartesian fan-out across branches.
///
/// # Log Level
/// `debug!` - Training-path event; combination counts grow multiplicatively
pub struct TrainingFanOut {
    pub container: NodeId,
    pub branches: usize,
    pub combinations: usize,
}

impl Display for TrainingFanOut {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Container {} expanded {} branch(es) into {} training combination(s)",
            self.container, self.branches, self.combinations
        )
    }
}

impl StructuredLog for TrainingFanOut {
    fn log(&self) {
        tracing::debug!(
            container = %self.container,
            branches = self.branches,
            combinations = self.combinations,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "training_fan_out",
            span_name = name,
            container = %self.container,
            combinations = self.combinations,
        )
    }
}
