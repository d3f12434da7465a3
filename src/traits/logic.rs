// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Injected transform strategy for atomic elements.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::errors::ExecutionError;
use crate::mediator::{Mediator, Payload};

/// The behavior an [`Element`](crate::pipeline::Element) delegates to.
///
/// One logic instance is shared across all versions of an element (mutable
/// clones included), so implementations with internal state must provide
/// their own interior mutability.
#[async_trait]
pub trait ElementLogic: Send + Sync {
    fn name(&self) -> &str;

    /// Transforms one payload on the single-item inference path.
    async fn apply(&self, input: &Payload) -> Result<Payload, ExecutionError>;

    /// Training path: all candidate payloads for the input. A classifier
    /// in training mode emits one payload per class hypothesis; the
    /// default is the single inference output.
    async fn apply_training(&self, input: &Payload) -> Result<Vec<Payload>, ExecutionError> {
        Ok(vec![self.apply(input).await?])
    }

    /// Called during lineage rollback with this element's own outputs from
    /// a completed training batch and the subset confirmed successful.
    fn training_complete(&self, _all: &HashSet<Mediator>, _successful: &HashSet<Mediator>) {}

    /// Post-training quality estimate, if this logic tracks one.
    fn success_rate(&self) -> Option<f64> {
        None
    }
}
