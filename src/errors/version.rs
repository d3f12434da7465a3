// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by the immutable-version protocol.

use thiserror::Error;

use crate::errors::ValidationError;
use crate::traits::processor::NodeId;
use crate::versioning::VersionState;

/// Contract violations of the replace-and-finalize discipline. These are
/// synchronous, local, and non-recoverable: the caller holds the node in
/// the wrong state.
#[derive(Error, Debug)]
pub enum VersionError {
    /// Mutation was attempted on a node that is not in the `Mutable` state.
    /// The caller must `create_mutable_clone()` first.
    #[error("processor {id} is {state}; mutation requires a mutable clone")]
    MutationViolation { id: NodeId, state: VersionState },

    /// `replace_with` was called on a node that is mutable, already
    /// replaced, or deleted. No partial state change takes place.
    #[error("processor {id} is {state} and cannot be replaced")]
    ReplacementViolation { id: NodeId, state: VersionState },

    /// The proposed replacement failed wiring validation and was not
    /// finalised; the original node keeps its current version.
    #[error("replacement failed validation: {0}")]
    InvalidReplacement(#[from] ValidationError),
}
