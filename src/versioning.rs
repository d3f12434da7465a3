// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The replace-and-finalize discipline behind every pipeline node.
//!
//! A node starts `Mutable`, becomes `Immutable` on finalisation, and is
//! thereafter only superseded — never edited. Edits go to a mutable clone
//! that is atomically swapped in with `replace_with`, so a task processing
//! data always sees one stable, immutable snapshot while the editor builds
//! the next version out-of-band. This is what makes concurrent pipeline
//! editing safe without locking the hot data path.
//!
//! State machine per node instance:
//!
//! ```text
//! MUTABLE --finalise--> IMMUTABLE --replace_with--> REPLACED
//!                           |  ^--discard_replacement--/
//!                           +--delete--> DELETED (terminal)
//! ```
//!
//! The version chain formed by `previous`/`next` links is private to each
//! node and distinct from the mediator provenance chain.

use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use crate::traits::processor::Processor;

/// Lifecycle state of one node instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionState {
    /// Created editable; not yet part of any live pipeline version.
    Mutable,
    /// Finalised; configuration frozen, safe to process data.
    Immutable,
    /// Superseded by a later version via `replace_with`.
    Replaced,
    /// Permanently excluded from future pipeline versions.
    Deleted,
}

impl fmt::Display for VersionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VersionState::Mutable => "mutable",
            VersionState::Immutable => "immutable",
            VersionState::Replaced => "replaced",
            VersionState::Deleted => "deleted",
        };
        f.write_str(label)
    }
}

/// Version metadata handed to a node when it is finalised.
///
/// Links the node to its direct predecessor in its private version chain.
/// The successor link lives on the predecessor's [`VersionCell`] and is
/// only written when that predecessor is replaced.
#[derive(Clone, Default)]
pub struct ImmutableVersion {
    previous: Option<Weak<dyn Processor>>,
}

impl ImmutableVersion {
    /// Version metadata for a replacement of `predecessor`.
    pub fn after(predecessor: Weak<dyn Processor>) -> Self {
        Self {
            previous: Some(predecessor),
        }
    }

    pub fn previous(&self) -> Option<Arc<dyn Processor>> {
        self.previous.as_ref().and_then(Weak::upgrade)
    }
}

struct VersionInner {
    state: VersionState,
    version: ImmutableVersion,
    /// At most one live successor at any time.
    next: Option<Arc<dyn Processor>>,
}

/// Per-node capability struct implementing the version state machine.
///
/// Embedded by every concrete processor variant; the [`Processor`] trait's
/// default methods drive it.
pub struct VersionCell {
    inner: RwLock<VersionInner>,
}

impl VersionCell {
    /// A fresh cell in the `Mutable` state.
    pub fn new_mutable() -> Self {
        Self {
            inner: RwLock::new(VersionInner {
                state: VersionState::Mutable,
                version: ImmutableVersion::default(),
                next: None,
            }),
        }
    }

    pub fn state(&self) -> VersionState {
        self.inner.read().expect("version lock poisoned").state
    }

    pub fn is_mutable(&self) -> bool {
        self.state() == VersionState::Mutable
    }

    pub fn is_deleted(&self) -> bool {
        self.state() == VersionState::Deleted
    }

    pub fn is_replaced(&self) -> bool {
        self.state() == VersionState::Replaced
    }

    /// `Mutable → Immutable`, recording the supplied version metadata.
    /// Idempotent on an already-immutable node: only the metadata is
    /// refreshed, no state transition happens.
    pub fn finalise(&self, version: ImmutableVersion) {
        let mut inner = self.inner.write().expect("version lock poisoned");
        if inner.state == VersionState::Mutable {
            inner.state = VersionState::Immutable;
        }
        inner.version = version;
    }

    /// Marks this node superseded by `next`. The caller has already
    /// verified the node is replaceable and finalised the successor.
    pub fn mark_replaced(&self, next: Arc<dyn Processor>) {
        let mut inner = self.inner.write().expect("version lock poisoned");
        inner.state = VersionState::Replaced;
        inner.next = Some(next);
    }

    /// Drops any pending replacement and restores the node to
    /// `Immutable`/un-replaced (also reversing a deletion), so a different
    /// replacement can be proposed. Returns the discarded successor so the
    /// caller can sever its back-link.
    pub fn discard_replacement(&self) -> Option<Arc<dyn Processor>> {
        let mut inner = self.inner.write().expect("version lock poisoned");
        if inner.state != VersionState::Mutable {
            inner.state = VersionState::Immutable;
        }
        inner.next.take()
    }

    /// Terminal transition; no further replacement is accepted.
    pub fn mark_deleted(&self) {
        let mut inner = self.inner.write().expect("version lock poisoned");
        inner.state = VersionState::Deleted;
    }

    /// Severs the predecessor link, used when this node's predecessor
    /// discards it as a replacement.
    pub fn clear_previous(&self) {
        let mut inner = self.inner.write().expect("version lock poisoned");
        inner.version = ImmutableVersion::default();
    }

    pub fn previous_version(&self) -> Option<Arc<dyn Processor>> {
        self.inner
            .read()
            .expect("version lock poisoned")
            .version
            .previous()
    }

    pub fn next_version(&self) -> Option<Arc<dyn Processor>> {
        self.inner
            .read()
            .expect("version lock poisoned")
            .next
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_cell_is_mutable() {
        let cell = VersionCell::new_mutable();
        assert!(cell.is_mutable());
        assert!(!cell.is_deleted());
        assert!(cell.next_version().is_none());
        assert!(cell.previous_version().is_none());
    }

    #[test]
    fn finalise_is_idempotent() {
        let cell = VersionCell::new_mutable();
        cell.finalise(ImmutableVersion::default());
        assert_eq!(cell.state(), VersionState::Immutable);
        cell.finalise(ImmutableVersion::default());
        assert_eq!(cell.state(), VersionState::Immutable);
    }

    #[test]
    fn discard_reverses_deletion() {
        let cell = VersionCell::new_mutable();
        cell.finalise(ImmutableVersion::default());
        cell.mark_deleted();
        assert!(cell.is_deleted());
        cell.discard_replacement();
        assert_eq!(cell.state(), VersionState::Immutable);
    }

    #[test]
    fn discard_on_mutable_cell_keeps_it_mutable() {
        let cell = VersionCell::new_mutable();
        assert!(cell.discard_replacement().is_none());
        assert!(cell.is_mutable());
    }
}
