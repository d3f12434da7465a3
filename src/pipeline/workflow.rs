// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Sequential pipeline node: an ordered sequence of child processors.
//!
//! A workflow threads a mediator through its children in order on the
//! inference path and composes their training fan-outs by cartesian
//! expansion. Each output additionally carries one provenance layer
//! attributed to the workflow itself, which is what lets a join resolve a
//! branch output back to its originating workflow.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, Weak};

use async_trait::async_trait;

use crate::errors::{ExecutionError, ValidationError, VersionError};
use crate::mediator::{CompletedTrainingBatch, Mediator};
use crate::observability::messages::processor::ProcessorFinalised;
use crate::observability::messages::validation::FinaliseRejected;
use crate::observability::messages::StructuredLog;
use crate::pipeline::ProcessorCore;
use crate::traits::processor::Processor;
use crate::typedata::TypeData;
use crate::versioning::ImmutableVersion;

/// Ordered sequence of child [`Processor`]s forming one branch.
pub struct Workflow {
    core: ProcessorCore,
    children: RwLock<Vec<Arc<dyn Processor>>>,
}

impl Workflow {
    /// A new mutable workflow with no children.
    pub fn new(name: impl Into<String>, type_data: TypeData) -> Arc<Self> {
        let name = name.into();
        Arc::new_cyclic(|me: &Weak<Self>| {
            let me: Weak<dyn Processor> = me.clone();
            Self {
                core: ProcessorCore::new(name, type_data, me),
                children: RwLock::new(Vec::new()),
            }
        })
    }

    /// Typed mutable clone; shares the child instances, copies the list.
    pub fn mutable_clone(&self) -> Arc<Workflow> {
        let children = self.children();
        Arc::new_cyclic(|me: &Weak<Self>| {
            let me: Weak<dyn Processor> = me.clone();
            Self {
                core: self.core.clone_for(me),
                children: RwLock::new(children),
            }
        })
    }

    pub fn children(&self) -> Vec<Arc<dyn Processor>> {
        self.children.read().expect("children lock poisoned").clone()
    }

    /// Replaces the child sequence and re-parents each child to this
    /// workflow. Mutable workflows only.
    pub fn set_children(&self, children: Vec<Arc<dyn Processor>>) -> Result<(), VersionError> {
        self.core.guard_mutation()?;
        for child in &children {
            child.core().set_parent(Some(self.core.self_ref()));
        }
        *self.children.write().expect("children lock poisoned") = children;
        Ok(())
    }
}

#[async_trait]
impl Processor for Workflow {
    fn core(&self) -> &ProcessorCore {
        &self.core
    }

    fn create_mutable_clone(&self) -> Arc<dyn Processor> {
        self.mutable_clone()
    }

    /// Pairwise and boundary type compatibility; an empty workflow must be
    /// a legal pass-through.
    fn validate(&self) -> Result<(), ValidationError> {
        let children = self.children();
        let own = self.type_data();

        if children.is_empty() {
            if own.can_be_empty_container() {
                return Ok(());
            }
            return Err(ValidationError::EmptyNotPassThrough { type_data: own });
        }

        let first = children.first().expect("non-empty").type_data();
        if !first.can_be_at_start_of_workflow(&own) {
            return Err(ValidationError::BadWorkflowStart {
                first,
                workflow: own,
            });
        }

        for (index, pair) in children.windows(2).enumerate() {
            let upstream = pair[0].type_data();
            let downstream = pair[1].type_data();
            if !upstream.can_come_before(&downstream) {
                return Err(ValidationError::IncompatibleSequence {
                    upstream_index: index,
                    upstream,
                    downstream,
                });
            }
        }

        let last = children.last().expect("non-empty").type_data();
        if !last.can_be_at_end_of_workflow(&own) {
            return Err(ValidationError::BadWorkflowEnd {
                last,
                workflow: own,
            });
        }

        Ok(())
    }

    /// Finalises children first so the whole branch becomes immutable as
    /// one unit, then validates and finalises this workflow. Children that
    /// are already immutable are left alone: re-finalising them with blank
    /// metadata would sever their version-chain links.
    fn finalise(&self, version: ImmutableVersion) -> Result<(), ValidationError> {
        for child in self.children() {
            if child.is_mutable() {
                child.finalise(ImmutableVersion::default())?;
            }
        }
        if let Err(error) = self.validate() {
            FinaliseRejected {
                processor: self.id(),
                error: &error,
            }
            .log();
            return Err(error);
        }
        self.core.version().finalise(version);
        ProcessorFinalised {
            id: self.id(),
            name: self.name(),
        }
        .log();
        Ok(())
    }

    async fn process(&self, input: Mediator) -> Result<Mediator, ExecutionError> {
        self.core.guard_live()?;
        let mut mediator = input;
        for child in self.children() {
            mediator = child.process(mediator).await?;
        }
        let output = mediator.create_next(self.id(), mediator.data().clone());
        self.core.notify_processed(&output);
        Ok(output)
    }

    async fn process_training_data(
        &self,
        input: Mediator,
    ) -> Result<Vec<Mediator>, ExecutionError> {
        self.core.guard_live()?;
        let mut frontier = vec![input];
        for child in self.children() {
            let mut expanded = Vec::new();
            for mediator in frontier {
                expanded.extend(child.process_training_data(mediator).await?);
            }
            frontier = expanded;
        }
        let outputs: Vec<Mediator> = frontier
            .into_iter()
            .map(|m| {
                let data = m.data().clone();
                m.create_next(self.id(), data)
            })
            .collect();
        self.core.notify_processed_training(&outputs);
        Ok(outputs)
    }

    /// Strips the workflow's own provenance layer, then composes the
    /// children's mappings in reverse order, ending at the mediators that
    /// entered the workflow.
    fn create_backward_mapping(
        &self,
        completed: &HashSet<Mediator>,
        successful: &HashSet<Mediator>,
    ) -> HashMap<Mediator, Mediator> {
        let mut mapping: HashMap<Mediator, Mediator> = completed
            .iter()
            .filter_map(|m| m.previous().map(|p| (m.clone(), p.clone())))
            .collect();
        let mut successful_frontier: HashSet<Mediator> = successful
            .iter()
            .filter_map(|m| mapping.get(m).cloned())
            .collect();

        for child in self.children().into_iter().rev() {
            let completed_frontier: HashSet<Mediator> = mapping.values().cloned().collect();
            let child_mapping =
                child.create_backward_mapping(&completed_frontier, &successful_frontier);

            successful_frontier = successful_frontier
                .iter()
                .filter_map(|m| child_mapping.get(m).cloned())
                .collect();
            mapping = mapping
                .into_iter()
                .filter_map(|(output, via)| {
                    child_mapping.get(&via).map(|p| (output, p.clone()))
                })
                .collect();
        }

        mapping
    }

    /// Rolls the batch through the workflow's own layer, then through each
    /// child in reverse order.
    fn process_completed_training_batch(
        &self,
        batch: CompletedTrainingBatch,
    ) -> Result<CompletedTrainingBatch, ExecutionError> {
        let mut batch = batch.roll_back();
        for child in self.children().into_iter().rev() {
            batch = child.process_completed_training_batch(batch)?;
        }
        Ok(batch)
    }
}
