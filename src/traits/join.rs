// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Injected merge strategy for split-join containers.

use crate::errors::ExecutionError;
use crate::mediator::{Mediator, Payload};

/// Computes a joined payload from the ordered branch outputs of a
/// split-join container. The slice order always equals the container's
/// declared child order, never branch completion order.
pub trait JoinStrategy: Send + Sync {
    fn join_payloads(&self, outputs: &[Mediator]) -> Result<Payload, ExecutionError>;
}

impl<F> JoinStrategy for F
where
    F: Fn(&[Mediator]) -> Result<Payload, ExecutionError> + Send + Sync,
{
    fn join_payloads(&self, outputs: &[Mediator]) -> Result<Payload, ExecutionError> {
        self(outputs)
    }
}
