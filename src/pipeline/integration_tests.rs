// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! End-to-end scenarios spanning versioning, concurrent execution, and
//! training rollback.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::config::EngineOptions;
use crate::elements::{ClassifierLogic, DelayLogic, FnLogic, NearestCentroid, PassThroughLogic};
use crate::errors::ExecutionError;
use crate::mediator::{CompletedTrainingBatch, Mediator, Payload};
use crate::pipeline::{Element, SplitJoinContainer, Workflow};
use crate::traits::join::JoinStrategy;
use crate::traits::logic::ElementLogic;
use crate::traits::processor::Processor;
use crate::typedata::TypeData;
use crate::versioning::ImmutableVersion;

fn identity_element(name: &str) -> Arc<Element> {
    Element::new(
        name,
        TypeData::default(),
        Arc::new(PassThroughLogic::new(name)),
    )
}

fn branch(name: &str, logic: Arc<dyn ElementLogic>) -> Arc<Workflow> {
    let workflow = Workflow::new(name, TypeData::default());
    let element = Element::new(format!("{name}-element"), TypeData::default(), logic);
    workflow
        .set_children(vec![element as Arc<dyn Processor>])
        .unwrap();
    workflow
}

/// Joins branch outputs into the ordered vector of their `i32` payloads.
fn collect_labels() -> Arc<dyn JoinStrategy> {
    Arc::new(|outputs: &[Mediator]| -> Result<Payload, ExecutionError> {
        let labels: Vec<i32> = outputs
            .iter()
            .map(|m| m.payload_as::<i32>().copied().unwrap_or(i32::MIN))
            .collect();
        Ok(Arc::new(labels) as Payload)
    })
}

fn container(
    name: &str,
    branches: Vec<Arc<Workflow>>,
    join: Arc<dyn JoinStrategy>,
) -> Arc<SplitJoinContainer> {
    let required = branches.iter().map(|w| w.type_data()).collect();
    let container = SplitJoinContainer::new(
        name,
        TypeData::default(),
        required,
        join,
        EngineOptions::default(),
    );
    container.set_workflows(branches).unwrap();
    container
}

#[test]
fn replacement_chain_collapses_around_a_discarded_middle_version() {
    let a = identity_element("v1");
    a.finalise(ImmutableVersion::default()).unwrap();

    let b = a.mutable_clone();
    a.replace_with(b.clone()).unwrap();
    assert_eq!(a.next_version().unwrap().id(), b.id());
    assert_eq!(b.previous_version().unwrap().id(), a.id());

    // Propose C on top of B, then collapse the chain to A -> C directly.
    let c = b.mutable_clone();
    b.replace_with(c.clone()).unwrap();
    a.discard_replacement();
    a.replace_with(c.clone()).unwrap();

    assert_eq!(a.next_version().unwrap().id(), c.id());
    assert_eq!(c.previous_version().unwrap().id(), a.id());
    assert!(a.current_version().unwrap().id() == c.id());

    // B dropped out of the chain entirely.
    assert!(b.previous_version().is_none());
}

#[test]
fn replacement_requires_an_immutable_target() {
    let mutable = identity_element("unfinalised");
    let replacement = identity_element("candidate");
    let err = mutable.replace_with(replacement).unwrap_err();
    assert!(matches!(
        err,
        crate::errors::VersionError::ReplacementViolation { .. }
    ));
}

#[tokio::test]
async fn observers_survive_replacement() {
    struct Counter(std::sync::atomic::AtomicUsize);
    impl crate::traits::observer::ProcessObserver for Counter {
        fn handle_processed_data(&self, _: &Mediator) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    let counter = Arc::new(Counter(std::sync::atomic::AtomicUsize::new(0)));
    let v1 = identity_element("observed");
    v1.set_observers(vec![counter.clone() as Arc<dyn crate::traits::observer::ProcessObserver>])
        .unwrap();
    v1.finalise(ImmutableVersion::default()).unwrap();

    let v2 = v1.mutable_clone();
    v1.replace_with(v2.clone()).unwrap();
    assert_eq!(v2.observers().len(), 1);

    let input = Mediator::root(Arc::new(1i32) as Payload);
    v2.process(input).await.unwrap();
    assert_eq!(counter.0.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn join_order_follows_declared_branches_not_completion_order() {
    // Branch i emits label i but sleeps longest for the lowest index, so
    // completion order is the reverse of declared order.
    let branches: Vec<Arc<Workflow>> = (0..3)
        .map(|i| {
            let label = FnLogic::new(format!("label-{i}"), move |_: &Payload| {
                Ok(Arc::new(i as i32) as Payload)
            });
            let delayed = DelayLogic::new(
                Arc::new(label),
                Duration::from_millis(30 * (3 - i as u64)),
            );
            branch(&format!("branch-{i}"), Arc::new(delayed))
        })
        .collect();

    let container = container("ordered-join", branches, collect_labels());
    container.finalise(ImmutableVersion::default()).unwrap();

    let input = Mediator::root(Arc::new(vec![0.0f64]) as Payload);
    let output = container.process(input).await.unwrap();

    assert_eq!(output.payload_as::<Vec<i32>>(), Some(&vec![0, 1, 2]));
}

#[tokio::test]
async fn failing_branch_aborts_the_join() {
    let ok = branch("ok", Arc::new(PassThroughLogic::new("ok")));
    let failing = branch(
        "failing",
        Arc::new(FnLogic::new("failing", |_: &Payload| {
            Err(ExecutionError::logic("failing", anyhow::anyhow!("boom")))
        })),
    );

    let container = container("fallible", vec![ok, failing], collect_labels());
    container.finalise(ImmutableVersion::default()).unwrap();

    let input = Mediator::root(Arc::new(1i32) as Payload);
    let err = container.process(input).await.unwrap_err();
    assert!(matches!(err, ExecutionError::BranchFailed { index: 1, .. }));
}

#[tokio::test]
async fn training_fan_out_is_the_cartesian_product_of_branch_widths() {
    // Class hypotheses per branch: 2 and 3, so 6 joined combinations.
    let two = branch(
        "two-class",
        Arc::new(ClassifierLogic::new(
            "two",
            Box::new(NearestCentroid::new()),
            2,
        )),
    );
    let three = branch(
        "three-class",
        Arc::new(ClassifierLogic::new(
            "three",
            Box::new(NearestCentroid::new()),
            3,
        )),
    );

    let container = container("fan-out", vec![two, three], collect_labels());
    container.finalise(ImmutableVersion::default()).unwrap();

    let input = Mediator::root(Arc::new(vec![1.0f64, 2.0]) as Payload);
    let outputs = container.process_training_data(input).await.unwrap();

    assert_eq!(outputs.len(), 6);
    let mut seen = HashSet::new();
    for output in &outputs {
        let labels = output.payload_as::<Vec<i32>>().unwrap().clone();
        assert_eq!(labels.len(), 2);
        assert!((0..2).contains(&labels[0]));
        assert!((0..3).contains(&labels[1]));
        assert!(seen.insert(labels), "combination appeared twice");

        // Each output stacks the joined payload on top of the join step.
        let join_step = output.previous().unwrap();
        let branch_outputs = join_step.payload_as::<Vec<Mediator>>().unwrap();
        assert_eq!(branch_outputs.len(), 2);
    }
}

#[tokio::test]
async fn rollback_routes_feedback_to_the_branch_that_produced_it() {
    let logic = Arc::new(ClassifierLogic::new(
        "clf",
        Box::new(NearestCentroid::new()),
        2,
    ));
    let classifier_branch = branch("clf", logic.clone());
    let passthrough_branch = branch("pass", Arc::new(PassThroughLogic::new("pass")));

    let container = container(
        "trainable",
        vec![classifier_branch, passthrough_branch],
        collect_labels(),
    );
    container.finalise(ImmutableVersion::default()).unwrap();

    let input = Mediator::root(Arc::new(vec![7.0f64, 7.0]) as Payload);
    let outputs = container.process_training_data(input.clone()).await.unwrap();
    assert_eq!(outputs.len(), 2);

    // Confirm only the combination where the classifier guessed label 1.
    let successful: HashSet<Mediator> = outputs
        .iter()
        .filter(|o| o.payload_as::<Vec<i32>>().unwrap()[0] == 1)
        .cloned()
        .collect();
    assert_eq!(successful.len(), 1);
    let all: HashSet<Mediator> = outputs.iter().cloned().collect();

    let batch = CompletedTrainingBatch::new(all, successful);
    let rolled = container.process_completed_training_batch(batch).unwrap();

    // Two container layers rolled back: the batch now sits at the input.
    assert_eq!(rolled.all().len(), 1);
    assert!(rolled.all().contains(&input));
    assert!(rolled.successful().is_subset(rolled.all()));

    // The classifier trained on exactly the confirmed labelling: one
    // sample, label 1, which it now reproduces.
    assert_eq!(logic.success_rate(), Some(1.0));
    let prediction = logic
        .apply(&(Arc::new(vec![7.0f64, 7.0]) as Payload))
        .await
        .unwrap();
    assert_eq!(prediction.downcast_ref::<i32>(), Some(&1));
}

#[tokio::test]
async fn classifier_pipeline_trains_and_then_classifies() {
    let logic = Arc::new(ClassifierLogic::new(
        "clf",
        Box::new(NearestCentroid::new()),
        2,
    ));
    let element = Element::new("clf", TypeData::default(), logic.clone());
    let workflow = Workflow::new("clf-pipeline", TypeData::default());
    workflow
        .set_children(vec![element as Arc<dyn Processor>])
        .unwrap();
    workflow.finalise(ImmutableVersion::default()).unwrap();

    // Two training inputs, each fanning out to both class hypotheses;
    // confirm the hypothesis matching the obvious cluster.
    let low = Mediator::root(Arc::new(vec![0.0f64, 0.0]) as Payload);
    let high = Mediator::root(Arc::new(vec![9.0f64, 9.0]) as Payload);

    let mut all = HashSet::new();
    let mut successful = HashSet::new();
    for (input, wanted) in [(low, 0i32), (high, 1i32)] {
        let outputs = workflow.process_training_data(input).await.unwrap();
        assert_eq!(outputs.len(), 2);
        for output in outputs {
            let label = *output.payload_as::<i32>().unwrap();
            if label == wanted {
                successful.insert(output.clone());
            }
            all.insert(output);
        }
    }

    let batch = CompletedTrainingBatch::new(all, successful);
    let rolled = workflow.process_completed_training_batch(batch).unwrap();
    assert_eq!(rolled.all().len(), 2); // both root inputs
    assert_eq!(rolled.successful().len(), 2);

    assert_eq!(logic.success_rate(), Some(1.0));
    let near_high = Mediator::root(Arc::new(vec![8.0f64, 8.5]) as Payload);
    let prediction = workflow.process(near_high).await.unwrap();
    assert_eq!(prediction.payload_as::<i32>(), Some(&1));
}

#[tokio::test]
async fn nested_containers_roll_back_through_every_layer() {
    // inner split-join nested inside one branch of the outer one
    let inner = container(
        "inner",
        vec![
            branch("inner-a", Arc::new(PassThroughLogic::new("inner-a"))),
            branch("inner-b", Arc::new(PassThroughLogic::new("inner-b"))),
        ],
        collect_labels(),
    );

    let nested_workflow = Workflow::new("nested", TypeData::default());
    nested_workflow
        .set_children(vec![inner as Arc<dyn Processor>])
        .unwrap();

    let outer = container(
        "outer",
        vec![
            nested_workflow,
            branch("plain", Arc::new(PassThroughLogic::new("plain"))),
        ],
        Arc::new(|outputs: &[Mediator]| -> Result<Payload, ExecutionError> {
            Ok(outputs[0].data().clone())
        }),
    );
    outer.finalise(ImmutableVersion::default()).unwrap();

    let input = Mediator::root(Arc::new(3i32) as Payload);
    let outputs = outer.process_training_data(input.clone()).await.unwrap();
    assert_eq!(outputs.len(), 1);

    let all: HashSet<Mediator> = outputs.iter().cloned().collect();
    let batch = CompletedTrainingBatch::new(all.clone(), all);
    let rolled = outer.process_completed_training_batch(batch).unwrap();

    assert_eq!(rolled.all().len(), 1);
    assert!(rolled.all().contains(&input));
    assert!(rolled.successful().contains(&input));
}
