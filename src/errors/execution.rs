// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while data flows through a pipeline.
//!
//! Branch failures follow a single explicit policy: **propagate**. The
//! first failing branch aborts the join and surfaces here; the engine
//! never substitutes sentinel outputs and never stalls on a dead branch.

use thiserror::Error;

use crate::traits::processor::NodeId;

/// Comprehensive error type for the single-item and training data paths.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The node is still mutable and has never been finalised into a live
    /// pipeline version.
    #[error("processor {id} has not been finalised and cannot process data")]
    NotFinalised { id: NodeId },

    /// A branch of a split-join container returned an error; the join was
    /// aborted and remaining branch tasks cancelled.
    #[error("branch {index} (workflow {workflow}) failed: {source}")]
    BranchFailed {
        index: usize,
        workflow: NodeId,
        #[source]
        source: Box<ExecutionError>,
    },

    /// A branch task panicked or was cancelled before producing an output.
    #[error("branch task failed to complete: {detail}")]
    BranchPanicked { detail: String },

    /// A branch output carried no provenance, so it cannot be placed at
    /// its originating child's index.
    #[error("branch output carries no creator history and cannot be ordered")]
    UnattributedBranchOutput,

    /// A branch output's creator is not a child of the joining container.
    #[error("branch output created by {creator}, which is not a child workflow")]
    ForeignBranchOutput { creator: NodeId },

    /// Two branch outputs resolved to the same child workflow.
    #[error("duplicate branch output attributed to workflow {workflow}")]
    DuplicateBranchOutput { workflow: NodeId },

    /// Fewer outputs arrived than the container has children.
    #[error("no output arrived for branch {index} (workflow {workflow})")]
    MissingBranchOutput { index: usize, workflow: NodeId },

    /// A payload did not downcast to the type the processor requires.
    #[error("processor {id}: payload was not of the expected type ({expected})")]
    PayloadMismatch { id: NodeId, expected: &'static str },

    /// An element's injected logic failed.
    #[error("element logic '{name}' failed: {source}")]
    Logic {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ExecutionError {
    /// Wraps an opaque logic failure with the element logic's name.
    pub fn logic(name: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Logic {
            name: name.into(),
            source: source.into(),
        }
    }
}
