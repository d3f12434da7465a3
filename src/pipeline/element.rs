// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Atomic pipeline node: applies one injected transform.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use async_trait::async_trait;

use crate::errors::ExecutionError;
use crate::mediator::{CompletedTrainingBatch, Mediator};
use crate::observability::messages::processor::TrainedFromBatch;
use crate::observability::messages::StructuredLog;
use crate::pipeline::ProcessorCore;
use crate::traits::logic::ElementLogic;
use crate::traits::processor::Processor;
use crate::typedata::TypeData;

/// Leaf [`Processor`]: no children, delegates its transform to an
/// [`ElementLogic`] strategy shared across its versions.
pub struct Element {
    core: ProcessorCore,
    logic: Arc<dyn ElementLogic>,
}

impl Element {
    /// A new mutable element.
    pub fn new(
        name: impl Into<String>,
        type_data: TypeData,
        logic: Arc<dyn ElementLogic>,
    ) -> Arc<Self> {
        let name = name.into();
        Arc::new_cyclic(|me: &Weak<Self>| {
            let me: Weak<dyn Processor> = me.clone();
            Self {
                core: ProcessorCore::new(name, type_data, me),
                logic,
            }
        })
    }

    /// Typed mutable clone; configuration is copied, the logic instance is
    /// shared.
    pub fn mutable_clone(&self) -> Arc<Element> {
        let logic = self.logic.clone();
        Arc::new_cyclic(|me: &Weak<Self>| {
            let me: Weak<dyn Processor> = me.clone();
            Self {
                core: self.core.clone_for(me),
                logic,
            }
        })
    }

    pub fn logic(&self) -> &Arc<dyn ElementLogic> {
        &self.logic
    }
}

#[async_trait]
impl Processor for Element {
    fn core(&self) -> &ProcessorCore {
        &self.core
    }

    fn create_mutable_clone(&self) -> Arc<dyn Processor> {
        self.mutable_clone()
    }

    async fn process(&self, input: Mediator) -> Result<Mediator, ExecutionError> {
        self.core.guard_live()?;
        let data = self.logic.apply(input.data()).await?;
        let output = input.create_next(self.id(), data);
        self.core.notify_processed(&output);
        Ok(output)
    }

    async fn process_training_data(
        &self,
        input: Mediator,
    ) -> Result<Vec<Mediator>, ExecutionError> {
        self.core.guard_live()?;
        let payloads = self.logic.apply_training(input.data()).await?;
        let outputs: Vec<Mediator> = payloads
            .into_iter()
            .map(|data| input.create_next(self.id(), data))
            .collect();
        self.core.notify_processed_training(&outputs);
        Ok(outputs)
    }

    /// Base case of lineage rollback: each output is this element's own
    /// work, so it maps to its immediate predecessor.
    fn create_backward_mapping(
        &self,
        completed: &HashSet<Mediator>,
        _successful: &HashSet<Mediator>,
    ) -> HashMap<Mediator, Mediator> {
        completed
            .iter()
            .filter_map(|m| m.previous().map(|p| (m.clone(), p.clone())))
            .collect()
    }

    fn process_completed_training_batch(
        &self,
        batch: CompletedTrainingBatch,
    ) -> Result<CompletedTrainingBatch, ExecutionError> {
        self.logic.training_complete(batch.all(), batch.successful());
        self.core.notify_trained();
        TrainedFromBatch {
            processor: self.id(),
            all: batch.all().len(),
            successful: batch.successful().len(),
        }
        .log();

        let mapping = self.create_backward_mapping(batch.all(), batch.successful());
        Ok(batch.map_through(&mapping))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::PassThroughLogic;
    use crate::mediator::Payload;
    use crate::versioning::ImmutableVersion;

    fn passthrough_element() -> Arc<Element> {
        Element::new(
            "identity",
            TypeData::default(),
            Arc::new(PassThroughLogic::new("identity")),
        )
    }

    #[tokio::test]
    async fn process_requires_finalisation() {
        let element = passthrough_element();
        let input = Mediator::root(Arc::new(5i32) as Payload);

        let err = element.process(input.clone()).await.unwrap_err();
        assert!(matches!(err, ExecutionError::NotFinalised { .. }));

        element.finalise(ImmutableVersion::default()).unwrap();
        let output = element.process(input).await.unwrap();
        assert_eq!(output.payload_as::<i32>(), Some(&5));
        assert_eq!(output.history().creator(), Some(element.id()));
    }

    #[tokio::test]
    async fn mutable_clone_behaves_like_original() {
        let element = passthrough_element();
        element.finalise(ImmutableVersion::default()).unwrap();

        let clone = element.mutable_clone();
        assert!(clone.is_mutable());
        assert_ne!(clone.id(), element.id());
        assert_eq!(clone.type_data(), element.type_data());

        clone.finalise(ImmutableVersion::default()).unwrap();
        let input = Mediator::root(Arc::new(11i32) as Payload);
        let a = element.process(input.clone()).await.unwrap();
        let b = clone.process(input).await.unwrap();
        assert_eq!(a.payload_as::<i32>(), b.payload_as::<i32>());
    }

    #[tokio::test]
    async fn backward_mapping_points_at_immediate_previous() {
        let element = passthrough_element();
        element.finalise(ImmutableVersion::default()).unwrap();

        let input = Mediator::root(Arc::new(3i32) as Payload);
        let outputs = element.process_training_data(input.clone()).await.unwrap();
        assert_eq!(outputs.len(), 1);

        let completed: HashSet<_> = outputs.iter().cloned().collect();
        let mapping = element.create_backward_mapping(&completed, &HashSet::new());
        assert_eq!(mapping.get(&outputs[0]), Some(&input));
    }
}
