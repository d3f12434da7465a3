// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Immutable provenance-carrying wrappers around data items.
//!
//! A [`Mediator`] wraps one opaque payload together with the chain of
//! mediators that produced it. The chain is acyclic and strictly backward,
//! terminating at a root input mediator, so predecessors are held by
//! strong `Arc` links while a batch is alive and become garbage together
//! once nothing references their successors.
//!
//! Mediator identity is allocation identity: two mediators compare equal
//! only if they are the same node in the chain, which is what lineage
//! rollback keys its maps on.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::traits::processor::NodeId;

/// Opaque payload flowing through the pipeline.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Provenance record: which processor version produced a mediator.
///
/// Resolved after a join to place each branch output at its originating
/// child's index, and during rollback to bucket training outputs by child.
#[derive(Debug, Clone, Copy)]
pub struct History {
    creator: Option<NodeId>,
}

impl History {
    fn root() -> Self {
        Self { creator: None }
    }

    fn created_by(creator: NodeId) -> Self {
        Self {
            creator: Some(creator),
        }
    }

    /// Identity of the producing processor version, or `None` for a root
    /// input mediator.
    pub fn creator(&self) -> Option<NodeId> {
        self.creator
    }
}

struct MediatorInner {
    data: Payload,
    previous: Option<Mediator>,
    history: History,
}

/// One immutable node in a provenance chain.
#[derive(Clone)]
pub struct Mediator {
    inner: Arc<MediatorInner>,
}

impl Mediator {
    /// A root input mediator with no predecessor and no creator.
    pub fn root(data: Payload) -> Self {
        Self {
            inner: Arc::new(MediatorInner {
                data,
                previous: None,
                history: History::root(),
            }),
        }
    }

    /// The successor mediator produced when `creator` processes this one.
    pub fn create_next(&self, creator: NodeId, data: Payload) -> Self {
        Self {
            inner: Arc::new(MediatorInner {
                data,
                previous: Some(self.clone()),
                history: History::created_by(creator),
            }),
        }
    }

    /// The join-step mediator recorded when `creator` fans this mediator
    /// out and gathers the branch outputs back. Its payload is the ordered
    /// branch-output list itself, which is what rollback later unpacks.
    pub fn join(&self, creator: NodeId, branch_outputs: Vec<Mediator>) -> Self {
        self.create_next(creator, Arc::new(branch_outputs))
    }

    pub fn data(&self) -> &Payload {
        &self.inner.data
    }

    /// Downcasts the payload to a concrete type.
    pub fn payload_as<T: Any>(&self) -> Option<&T> {
        self.inner.data.downcast_ref::<T>()
    }

    pub fn previous(&self) -> Option<&Mediator> {
        self.inner.previous.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.inner.history
    }

    /// Number of mediators from this one back to (and including) the root.
    pub fn chain_len(&self) -> usize {
        let mut len = 1;
        let mut current = self.previous();
        while let Some(m) = current {
            len += 1;
            current = m.previous();
        }
        len
    }
}

impl PartialEq for Mediator {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Mediator {}

impl Hash for Mediator {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.inner) as usize).hash(state);
    }
}

impl fmt::Debug for Mediator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mediator")
            .field("creator", &self.inner.history.creator())
            .field("chain_len", &self.chain_len())
            .finish()
    }
}

/// The outcome of one training run: every output the pipeline produced and
/// the subset later confirmed successful.
///
/// Consumed top-down by `process_completed_training_batch`; each layer
/// extracts its own slice and rolls the rest back one step.
#[derive(Debug, Clone, Default)]
pub struct CompletedTrainingBatch {
    all: HashSet<Mediator>,
    successful: HashSet<Mediator>,
}

impl CompletedTrainingBatch {
    /// Builds a batch, restricting `successful` to members of `all` so the
    /// subset invariant holds by construction.
    pub fn new(all: HashSet<Mediator>, mut successful: HashSet<Mediator>) -> Self {
        successful.retain(|m| all.contains(m));
        Self { all, successful }
    }

    pub fn all(&self) -> &HashSet<Mediator> {
        &self.all
    }

    pub fn successful(&self) -> &HashSet<Mediator> {
        &self.successful
    }

    /// Rolls both sets back one provenance layer. Root mediators without a
    /// predecessor drop out of the batch.
    pub fn roll_back(&self) -> Self {
        let all = self
            .all
            .iter()
            .filter_map(|m| m.previous().cloned())
            .collect();
        let successful = self
            .successful
            .iter()
            .filter_map(|m| m.previous().cloned())
            .collect();
        Self::new(all, successful)
    }

    /// Rolls both sets back through an explicit backward mapping. Outputs
    /// without an entry in the mapping drop out of the batch.
    pub fn map_through(&self, mapping: &HashMap<Mediator, Mediator>) -> Self {
        let all = self
            .all
            .iter()
            .filter_map(|m| mapping.get(m).cloned())
            .collect();
        let successful = self
            .successful
            .iter()
            .filter_map(|m| mapping.get(m).cloned())
            .collect();
        Self::new(all, successful)
    }
}
