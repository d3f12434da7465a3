// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Split-join container: concurrent branch workflows joined into one
//! output.
//!
//! On the inference path the container fans one input out to every child
//! workflow, waits for exactly one output per child, reorders the outputs
//! by provenance, and joins them through an injected [`JoinStrategy`].
//! On the training path it multiplies instead of collapsing: every
//! combination of one output per branch becomes one joined training
//! output whose payload is the ordered branch-mediator list — the
//! breadcrumb lineage rollback later unpacks to route feedback to the
//! exact child that produced each intermediate value.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, Weak};
use std::time::Instant;

use async_trait::async_trait;

use crate::config::EngineOptions;
use crate::engine;
use crate::errors::{ExecutionError, ValidationError, VersionError};
use crate::mediator::{CompletedTrainingBatch, Mediator};
use crate::observability::messages::engine::{
    BranchFailure, JoinCompleted, SplitDispatched, TrainingFanOut,
};
use crate::observability::messages::processor::ProcessorFinalised;
use crate::observability::messages::validation::FinaliseRejected;
use crate::observability::messages::StructuredLog;
use crate::pipeline::{ProcessorCore, Workflow};
use crate::traits::join::JoinStrategy;
use crate::traits::processor::{NodeId, Processor};
use crate::typedata::TypeData;
use crate::versioning::ImmutableVersion;

/// [`Processor`] holding parallel child [`Workflow`]s that run
/// concurrently on a shared input and rejoin.
pub struct SplitJoinContainer {
    core: ProcessorCore,
    /// Declared per-branch type signature; validation requires each child
    /// workflow's type to equal its slot exactly.
    required_workflow_type_data: RwLock<Vec<TypeData>>,
    workflows: RwLock<Vec<Arc<Workflow>>>,
    join_strategy: Arc<dyn JoinStrategy>,
    options: EngineOptions,
}

impl SplitJoinContainer {
    /// A new mutable container with no child workflows.
    pub fn new(
        name: impl Into<String>,
        type_data: TypeData,
        required_workflow_type_data: Vec<TypeData>,
        join_strategy: Arc<dyn JoinStrategy>,
        options: EngineOptions,
    ) -> Arc<Self> {
        let name = name.into();
        let options = options.clamped();
        Arc::new_cyclic(|me: &Weak<Self>| {
            let me: Weak<dyn Processor> = me.clone();
            Self {
                core: ProcessorCore::new(name, type_data, me),
                required_workflow_type_data: RwLock::new(required_workflow_type_data),
                workflows: RwLock::new(Vec::new()),
                join_strategy,
                options,
            }
        })
    }

    /// Typed mutable clone; shares the child workflows and join strategy,
    /// copies the branch signature.
    pub fn mutable_clone(&self) -> Arc<SplitJoinContainer> {
        let required = self.required_workflow_type_data();
        let workflows = self.workflows();
        let join_strategy = self.join_strategy.clone();
        let options = self.options.clone();
        Arc::new_cyclic(|me: &Weak<Self>| {
            let me: Weak<dyn Processor> = me.clone();
            Self {
                core: self.core.clone_for(me),
                required_workflow_type_data: RwLock::new(required),
                workflows: RwLock::new(workflows),
                join_strategy,
                options,
            }
        })
    }

    pub fn workflows(&self) -> Vec<Arc<Workflow>> {
        self.workflows.read().expect("workflow lock poisoned").clone()
    }

    /// Replaces the child workflows and re-parents them to this
    /// container. Mutable containers only.
    pub fn set_workflows(&self, workflows: Vec<Arc<Workflow>>) -> Result<(), VersionError> {
        self.core.guard_mutation()?;
        for workflow in &workflows {
            workflow.core().set_parent(Some(self.core.self_ref()));
        }
        *self.workflows.write().expect("workflow lock poisoned") = workflows;
        Ok(())
    }

    pub fn required_workflow_type_data(&self) -> Vec<TypeData> {
        self.required_workflow_type_data
            .read()
            .expect("signature lock poisoned")
            .clone()
    }

    /// Replaces the declared per-branch type signature. Mutable
    /// containers only.
    pub fn set_required_workflow_type_data(
        &self,
        required: Vec<TypeData>,
    ) -> Result<(), VersionError> {
        self.core.guard_mutation()?;
        *self
            .required_workflow_type_data
            .write()
            .expect("signature lock poisoned") = required;
        Ok(())
    }

    /// Buckets the branch mediators inside each joined training mediator
    /// by the child workflow that produced them.
    fn bucket_by_workflow(
        &self,
        joined: &HashSet<Mediator>,
    ) -> Result<HashMap<NodeId, HashSet<Mediator>>, ExecutionError> {
        let mut buckets: HashMap<NodeId, HashSet<Mediator>> = HashMap::new();
        for mediator in joined {
            let branches = mediator.payload_as::<Vec<Mediator>>().ok_or(
                ExecutionError::PayloadMismatch {
                    id: self.id(),
                    expected: "Vec<Mediator> (joined branch outputs)",
                },
            )?;
            for branch_output in branches {
                let creator = branch_output
                    .history()
                    .creator()
                    .ok_or(ExecutionError::UnattributedBranchOutput)?;
                buckets
                    .entry(creator)
                    .or_default()
                    .insert(branch_output.clone());
            }
        }
        Ok(buckets)
    }
}

#[async_trait]
impl Processor for SplitJoinContainer {
    fn core(&self) -> &ProcessorCore {
        &self.core
    }

    fn create_mutable_clone(&self) -> Arc<dyn Processor> {
        self.mutable_clone()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let required = self.required_workflow_type_data();
        let workflows = self.workflows();

        if required.len() != workflows.len() {
            return Err(ValidationError::WorkflowCountMismatch {
                expected: required.len(),
                actual: workflows.len(),
            });
        }

        for (index, (required, workflow)) in required.iter().zip(&workflows).enumerate() {
            let actual = workflow.type_data();
            if actual != *required {
                return Err(ValidationError::WorkflowTypeMismatch {
                    index,
                    required: *required,
                    actual,
                });
            }
        }

        Ok(())
    }

    /// Finalises child workflows first, then validates and finalises the
    /// container itself. Already-immutable workflows are left alone so
    /// their version-chain links survive a container swap.
    fn finalise(&self, version: ImmutableVersion) -> Result<(), ValidationError> {
        for workflow in self.workflows() {
            if workflow.is_mutable() {
                workflow.finalise(ImmutableVersion::default())?;
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
        let workflows = self.workflows();
        let started = Instant::now();

        SplitDispatched {
            container: self.id(),
            branches: workflows.len(),
            max_concurrency: self.options.max_concurrency,
        }
        .log();

        let ordered =
            match engine::run_branches(&workflows, input.clone(), self.options.max_concurrency)
                .await
            {
                Ok(ordered) => ordered,
                Err(error) => {
                    BranchFailure {
                        container: self.id(),
                        error: &error,
                    }
                    .log();
                    return Err(error);
                }
            };

        let payload = self.join_strategy.join_payloads(&ordered)?;
        let output = input.join(self.id(), ordered).create_next(self.id(), payload);

        JoinCompleted {
            container: self.id(),
            branches: workflows.len(),
            duration: started.elapsed(),
        }
        .log();

        self.core.notify_processed(&output);
        Ok(output)
    }

    async fn process_training_data(
        &self,
        input: Mediator,
    ) -> Result<Vec<Mediator>, ExecutionError> {
        self.core.guard_live()?;
        let workflows = self.workflows();

        let mut per_branch = Vec::with_capacity(workflows.len());
        for workflow in &workflows {
            per_branch.push(workflow.process_training_data(input.clone()).await?);
        }

        let combinations = engine::cartesian_product(&per_branch);
        TrainingFanOut {
            container: self.id(),
            branches: workflows.len(),
            combinations: combinations.len(),
        }
        .log();

        let mut outputs = Vec::with_capacity(combinations.len());
        for combination in combinations {
            let payload = self.join_strategy.join_payloads(&combination)?;
            outputs.push(
                input
                    .join(self.id(), combination)
                    .create_next(self.id(), payload),
            );
        }

        self.core.notify_processed_training(&outputs);
        Ok(outputs)
    }

    /// The container owns two provenance layers per output — the joined
    /// payload and the join step — so its own responsibility maps each
    /// output back to the mediator that entered the split.
    fn create_backward_mapping(
        &self,
        completed: &HashSet<Mediator>,
        _successful: &HashSet<Mediator>,
    ) -> HashMap<Mediator, Mediator> {
        completed
            .iter()
            .filter_map(|m| {
                m.previous()
                    .and_then(|join_step| join_step.previous())
                    .map(|p| (m.clone(), p.clone()))
            })
            .collect()
    }

    /// Rolls back past the joined-payload layer, redistributes each
    /// joined output's branch mediators to the child that produced them
    /// (successful set defaulting to empty for children with no confirmed
    /// outputs), recurses into each child, then rolls past the join step.
    fn process_completed_training_batch(
        &self,
        batch: CompletedTrainingBatch,
    ) -> Result<CompletedTrainingBatch, ExecutionError> {
        let batch = batch.roll_back();

        let mut all_buckets = self.bucket_by_workflow(batch.all())?;
        let mut successful_buckets = self.bucket_by_workflow(batch.successful())?;

        for workflow in self.workflows() {
            let Some(all) = all_buckets.remove(&workflow.id()) else {
                continue;
            };
            let successful = successful_buckets.remove(&workflow.id()).unwrap_or_default();
            workflow
                .process_completed_training_batch(CompletedTrainingBatch::new(all, successful))?;
            workflow.core().notify_trained();
        }

        Ok(batch.roll_back())
    }
}
