// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The uniform processor contract shared by all pipeline node variants.
//!
//! Three variants implement [`Processor`]: atomic elements, sequential
//! workflows, and split-join containers. Each embeds a
//! [`ProcessorCore`](crate::pipeline::ProcessorCore) capability bundle and
//! gets the immutable-version protocol, observer management, and parent
//! linkage through the default methods here, so the variants only supply
//! their own processing semantics.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::{ExecutionError, ValidationError, VersionError};
use crate::mediator::{CompletedTrainingBatch, Mediator};
use crate::observability::messages::processor::{
    ProcessorDeleted, ProcessorFinalised, ProcessorReplaced,
};
use crate::observability::messages::validation::FinaliseRejected;
use crate::observability::messages::StructuredLog;
use crate::pipeline::ProcessorCore;
use crate::traits::observer::ProcessObserver;
use crate::typedata::TypeData;
use crate::versioning::{ImmutableVersion, VersionState};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide identity of one processor version.
///
/// Every node instance — including each mutable clone — gets a fresh id,
/// so an id names exactly one version. Mediator history records this id,
/// which is how join reordering and lineage rollback resolve "who created
/// this" without holding references into the node graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocates the next unused id.
    pub fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// The unit of pipeline composition.
///
/// Processing methods are only invocable on finalised nodes; mutators are
/// only invocable on mutable ones. Everything else is driven through the
/// embedded core by the default methods below.
#[async_trait]
pub trait Processor: Send + Sync {
    /// The embedded capability bundle (identity, type, version cell,
    /// observers, parent link).
    fn core(&self) -> &ProcessorCore;

    /// Checks this node's wiring. Run automatically before finalisation;
    /// an invalid node must not enter service.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// A new node in the `Mutable` state carrying a deep-enough copy of
    /// this node's configuration to edit independently.
    fn create_mutable_clone(&self) -> Arc<dyn Processor>;

    /// Single-item inference path.
    async fn process(&self, input: Mediator) -> Result<Mediator, ExecutionError>;

    /// Training path: returns all candidate outputs for the input. The
    /// fan-out set grows multiplicatively with composition depth.
    async fn process_training_data(&self, input: Mediator)
        -> Result<Vec<Mediator>, ExecutionError>;

    /// For each completed output, the predecessor mediator that is this
    /// node's own responsibility. Outputs whose predecessor cannot be
    /// resolved are absent from the mapping.
    fn create_backward_mapping(
        &self,
        completed: &HashSet<Mediator>,
        successful: &HashSet<Mediator>,
    ) -> HashMap<Mediator, Mediator>;

    /// Rolls the batch back through this node's own layer(s), feeding
    /// training feedback to the responsible children on the way.
    fn process_completed_training_batch(
        &self,
        batch: CompletedTrainingBatch,
    ) -> Result<CompletedTrainingBatch, ExecutionError>;

    fn name(&self) -> &str {
        self.core().name()
    }

    // ---- identity and type ----

    fn id(&self) -> NodeId {
        self.core().id()
    }

    fn type_data(&self) -> TypeData {
        self.core().type_data()
    }

    /// Replaces this node's declared type pair. Mutable nodes only.
    fn set_type_data(&self, type_data: TypeData) -> Result<(), VersionError> {
        self.core().guard_mutation()?;
        self.core().store_type_data(type_data);
        Ok(())
    }

    // ---- immutable-version protocol ----

    fn is_mutable(&self) -> bool {
        self.core().version().is_mutable()
    }

    fn is_deleted(&self) -> bool {
        self.core().version().is_deleted()
    }

    /// `Mutable → Immutable` after validation; idempotent on an immutable
    /// node (only the version metadata is refreshed).
    fn finalise(&self, version: ImmutableVersion) -> Result<(), ValidationError> {
        if let Err(error) = self.validate() {
            FinaliseRejected {
                processor: self.id(),
                error: &error,
            }
            .log();
            return Err(error);
        }
        self.core().version().finalise(version);
        ProcessorFinalised {
            id: self.id(),
            name: self.name(),
        }
        .log();
        Ok(())
    }

    /// Proposes `replacement` as this node's successor version. Valid only
    /// on an immutable, un-replaced, un-deleted node; finalises the
    /// replacement with linking version metadata and carries the observer
    /// set forward so observers need not re-subscribe per version.
    ///
    /// A replacement that already replaced another node detaches from that
    /// node first, which is what lets a span of versions be collapsed:
    /// `head.discard_replacement(); head.replace_with(tail)`.
    fn replace_with(&self, replacement: Arc<dyn Processor>) -> Result<(), VersionError> {
        let state = self.core().version().state();
        if state != VersionState::Immutable {
            return Err(VersionError::ReplacementViolation {
                id: self.id(),
                state,
            });
        }

        if let Some(stale) = replacement.core().version().previous_version() {
            stale.discard_replacement();
        }

        let version = ImmutableVersion::after(self.core().self_ref());
        replacement.finalise(version)?;
        replacement.core().inherit_observers(self.core().observers());
        self.core().version().mark_replaced(replacement.clone());

        ProcessorReplaced {
            old: self.id(),
            new: replacement.id(),
        }
        .log();
        Ok(())
    }

    /// Reverses a pending replacement (and any deletion), restoring this
    /// node to `Immutable` so a different replacement can be proposed.
    fn discard_replacement(&self) {
        if let Some(next) = self.core().version().discard_replacement() {
            next.core().version().clear_previous();
        }
    }

    /// Permanently excludes this node from future pipeline versions.
    fn delete(&self) {
        self.core().version().mark_deleted();
        ProcessorDeleted { id: self.id() }.log();
    }

    fn previous_version(&self) -> Option<Arc<dyn Processor>> {
        self.core().version().previous_version()
    }

    fn next_version(&self) -> Option<Arc<dyn Processor>> {
        self.core().version().next_version()
    }

    /// Walks successor links to the live tip of this node's version chain.
    fn current_version(&self) -> Option<Arc<dyn Processor>> {
        let mut current = self.core().self_ref().upgrade()?;
        while let Some(next) = current.next_version() {
            current = next;
        }
        Some(current)
    }

    // ---- observers and parent linkage ----

    fn observers(&self) -> Vec<Arc<dyn ProcessObserver>> {
        self.core().observers()
    }

    /// Replaces the observer set. Mutable nodes only; `replace_with`
    /// propagates the set forward across versions.
    fn set_observers(&self, observers: Vec<Arc<dyn ProcessObserver>>) -> Result<(), VersionError> {
        self.core().guard_mutation()?;
        self.core().inherit_observers(observers);
        Ok(())
    }

    /// The enclosing node, or `None` for the pipeline root.
    fn parent(&self) -> Option<Arc<dyn Processor>> {
        self.core().parent()
    }
}
