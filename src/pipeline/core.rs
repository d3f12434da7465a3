// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Capability bundle embedded by every processor variant.
//!
//! Bundles the concerns the original design spread across delegating
//! mixins — identity, declared type, version state, observers, parent
//! linkage — into one struct the variants embed and the
//! [`Processor`](crate::traits::Processor) default methods drive.

use std::sync::{Arc, RwLock, Weak};

use crate::errors::{ExecutionError, VersionError};
use crate::mediator::Mediator;
use crate::traits::observer::ProcessObserver;
use crate::traits::processor::{NodeId, Processor};
use crate::typedata::TypeData;
use crate::versioning::VersionCell;

pub struct ProcessorCore {
    id: NodeId,
    name: String,
    type_data: RwLock<TypeData>,
    /// Weak self-reference, installed at construction via
    /// `Arc::new_cyclic`; used to stamp version metadata.
    me: Weak<dyn Processor>,
    /// Non-owning back-reference; the parent's child list owns this node.
    parent: RwLock<Option<Weak<dyn Processor>>>,
    observers: RwLock<Vec<Arc<dyn ProcessObserver>>>,
    version: VersionCell,
}

impl ProcessorCore {
    /// A fresh core in the `Mutable` state with a new identity.
    pub fn new(name: impl Into<String>, type_data: TypeData, me: Weak<dyn Processor>) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            type_data: RwLock::new(type_data),
            me,
            parent: RwLock::new(None),
            observers: RwLock::new(Vec::new()),
            version: VersionCell::new_mutable(),
        }
    }

    /// Core for a mutable clone: same configuration, fresh identity,
    /// fresh `Mutable` version cell.
    pub fn clone_for(&self, me: Weak<dyn Processor>) -> Self {
        Self {
            id: NodeId::next(),
            name: self.name.clone(),
            type_data: RwLock::new(self.type_data()),
            me,
            parent: RwLock::new(self.parent.read().expect("parent lock poisoned").clone()),
            observers: RwLock::new(self.observers()),
            version: VersionCell::new_mutable(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_data(&self) -> TypeData {
        *self.type_data.read().expect("type lock poisoned")
    }

    pub(crate) fn store_type_data(&self, type_data: TypeData) {
        *self.type_data.write().expect("type lock poisoned") = type_data;
    }

    pub fn version(&self) -> &VersionCell {
        &self.version
    }

    pub fn self_ref(&self) -> Weak<dyn Processor> {
        self.me.clone()
    }

    pub fn parent(&self) -> Option<Arc<dyn Processor>> {
        self.parent
            .read()
            .expect("parent lock poisoned")
            .as_ref()
            .and_then(Weak::upgrade)
    }

    pub(crate) fn set_parent(&self, parent: Option<Weak<dyn Processor>>) {
        *self.parent.write().expect("parent lock poisoned") = parent;
    }

    pub fn observers(&self) -> Vec<Arc<dyn ProcessObserver>> {
        self.observers
            .read()
            .expect("observer lock poisoned")
            .clone()
    }

    /// Installs an observer set without a mutability check; used when a
    /// replacement inherits its predecessor's observers.
    pub(crate) fn inherit_observers(&self, observers: Vec<Arc<dyn ProcessObserver>>) {
        *self.observers.write().expect("observer lock poisoned") = observers;
    }

    /// Fails fast unless the node is in the `Mutable` state.
    pub fn guard_mutation(&self) -> Result<(), VersionError> {
        if self.version.is_mutable() {
            Ok(())
        } else {
            Err(VersionError::MutationViolation {
                id: self.id,
                state: self.version.state(),
            })
        }
    }

    /// Fails fast if the node has never been finalised; data must only
    /// flow through immutable snapshots.
    pub fn guard_live(&self) -> Result<(), ExecutionError> {
        if self.version.is_mutable() {
            Err(ExecutionError::NotFinalised { id: self.id })
        } else {
            Ok(())
        }
    }

    pub(crate) fn notify_processed(&self, output: &Mediator) {
        for observer in self.observers.read().expect("observer lock poisoned").iter() {
            observer.handle_processed_data(output);
        }
    }

    pub(crate) fn notify_processed_training(&self, outputs: &[Mediator]) {
        for observer in self.observers.read().expect("observer lock poisoned").iter() {
            observer.handle_processed_training_data(outputs);
        }
    }

    pub(crate) fn notify_trained(&self) {
        for observer in self.observers.read().expect("observer lock poisoned").iter() {
            observer.handle_trained();
        }
    }
}
