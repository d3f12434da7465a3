// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use crate::typedata::TypeData;

/// Errors that can occur when validating a pipeline node's wiring.
///
/// Validation runs before a node is finalised into the live pipeline; an
/// invalid node is never silently coerced into service.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Two adjacent children of a workflow have incompatible types.
    IncompatibleSequence {
        /// Index of the upstream child within the workflow.
        upstream_index: usize,
        upstream: TypeData,
        downstream: TypeData,
    },
    /// The first child cannot accept the workflow's declared input type.
    BadWorkflowStart { first: TypeData, workflow: TypeData },
    /// The last child cannot satisfy the workflow's declared output type.
    BadWorkflowEnd { last: TypeData, workflow: TypeData },
    /// A childless node whose type pair does not permit pass-through.
    EmptyNotPassThrough { type_data: TypeData },
    /// A split-join container's child count does not match its declared
    /// per-branch type signature.
    WorkflowCountMismatch { expected: usize, actual: usize },
    /// A child workflow's type does not equal the container's declared
    /// requirement at that branch index.
    WorkflowTypeMismatch {
        index: usize,
        required: TypeData,
        actual: TypeData,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::IncompatibleSequence {
                upstream_index,
                upstream,
                downstream,
            } => {
                write!(
                    f,
                    "child {} with type {} cannot come before a child with type {}",
                    upstream_index, upstream, downstream
                )
            }
            ValidationError::BadWorkflowStart { first, workflow } => {
                write!(
                    f,
                    "first child {} cannot start a workflow of type {}",
                    first, workflow
                )
            }
            ValidationError::BadWorkflowEnd { last, workflow } => {
                write!(
                    f,
                    "last child {} cannot end a workflow of type {}",
                    last, workflow
                )
            }
            ValidationError::EmptyNotPassThrough { type_data } => {
                write!(
                    f,
                    "node of type {} has no children and cannot act as a pass-through",
                    type_data
                )
            }
            ValidationError::WorkflowCountMismatch { expected, actual } => {
                write!(
                    f,
                    "container declares {} branch type(s) but holds {} workflow(s)",
                    expected, actual
                )
            }
            ValidationError::WorkflowTypeMismatch {
                index,
                required,
                actual,
            } => {
                write!(
                    f,
                    "branch {} must have type {} but workflow declares {}",
                    index, required, actual
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}
