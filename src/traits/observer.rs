// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Notification contract for external listeners (presentation layer).
//!
//! The engine calls these as fire-and-forget notifications and never
//! blocks on or inspects their behavior. Implementations should return
//! quickly; anything slow belongs on the observer's own executor.

use crate::mediator::Mediator;

/// Listener registered on a processor; receives every mediator that
/// processor produces, in both single-item and training form, plus a
/// signal when a training batch has been fed back to the node.
pub trait ProcessObserver: Send + Sync {
    fn handle_processed_data(&self, _output: &Mediator) {}

    fn handle_processed_training_data(&self, _outputs: &[Mediator]) {}

    fn handle_trained(&self) {}
}
