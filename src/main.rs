// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashSet;
use std::sync::Arc;

use trellis::config::EngineOptions;
use trellis::elements::{ClassifierLogic, FnLogic, NearestCentroid};
use trellis::errors::ExecutionError;
use trellis::mediator::{CompletedTrainingBatch, Mediator, Payload};
use trellis::pipeline::{Element, SplitJoinContainer, Workflow};
use trellis::traits::{ElementLogic, JoinStrategy, Processor};
use trellis::typedata::TypeData;
use trellis::versioning::ImmutableVersion;

fn feature_vector(input: &Payload) -> Result<&Vec<f64>, ExecutionError> {
    input
        .downcast_ref::<Vec<f64>>()
        .ok_or_else(|| ExecutionError::logic("demo", anyhow::anyhow!("payload was not Vec<f64>")))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("🧵 Trellis Demo: train a classifier pipeline, then split-join it");
    println!("═══════════════════════════════════════════════════════════════");

    // Step 1: a sequential pipeline holding one trainable classifier.
    let logic = Arc::new(ClassifierLogic::new(
        "cluster",
        Box::new(NearestCentroid::new()),
        2,
    ));
    let classifier = Element::new("cluster", TypeData::default(), logic.clone());
    let pipeline = Workflow::new("classify", TypeData::default());
    pipeline.set_children(vec![classifier as Arc<dyn Processor>])?;
    pipeline.finalise(ImmutableVersion::default())?;

    // Step 2: training. The fan-out emits every labelling hypothesis; we
    // confirm the ones matching the known cluster and feed the batch back.
    let corpus: [(Vec<f64>, i32); 4] = [
        (vec![0.2, 0.1], 0),
        (vec![0.0, 0.3], 0),
        (vec![8.9, 9.2], 1),
        (vec![9.4, 8.8], 1),
    ];

    let mut all = HashSet::new();
    let mut successful = HashSet::new();
    for (features, label) in &corpus {
        let input = Mediator::root(Arc::new(features.clone()) as Payload);
        for output in pipeline.process_training_data(input).await? {
            if output.payload_as::<i32>() == Some(label) {
                successful.insert(output.clone());
            }
            all.insert(output);
        }
    }
    println!(
        "📚 Training fan-out: {} candidate labellings, {} confirmed",
        all.len(),
        successful.len()
    );

    pipeline.process_completed_training_batch(CompletedTrainingBatch::new(all, successful))?;
    println!("🎓 Trained; success rate: {:?}", logic.success_rate());

    // Step 3: a split-join container running the trained classifier next
    // to a magnitude computation and joining both into a summary.
    let label_branch = Workflow::new("label", TypeData::default());
    label_branch.set_children(vec![
        Element::new("label", TypeData::default(), logic.clone()) as Arc<dyn Processor>,
    ])?;

    let magnitude_logic = FnLogic::new("magnitude", |input: &Payload| {
        let features = feature_vector(input)?;
        let magnitude = features.iter().map(|f| f * f).sum::<f64>().sqrt();
        Ok(Arc::new(magnitude) as Payload)
    });
    let magnitude_branch = Workflow::new("magnitude", TypeData::default());
    magnitude_branch.set_children(vec![
        Element::new("magnitude", TypeData::default(), Arc::new(magnitude_logic))
            as Arc<dyn Processor>,
    ])?;

    let summary_join: Arc<dyn JoinStrategy> =
        Arc::new(|outputs: &[Mediator]| -> Result<Payload, ExecutionError> {
            let label = *outputs[0].payload_as::<i32>().ok_or_else(|| {
                ExecutionError::logic("summary-join", anyhow::anyhow!("branch 0 was not a label"))
            })?;
            let magnitude = *outputs[1].payload_as::<f64>().ok_or_else(|| {
                ExecutionError::logic(
                    "summary-join",
                    anyhow::anyhow!("branch 1 was not a magnitude"),
                )
            })?;
            Ok(Arc::new(format!("class {label}, magnitude {magnitude:.2}")) as Payload)
        });

    let container = SplitJoinContainer::new(
        "summarise",
        TypeData::default(),
        vec![label_branch.type_data(), magnitude_branch.type_data()],
        summary_join,
        EngineOptions::default(),
    );
    container.set_workflows(vec![label_branch, magnitude_branch])?;
    container.finalise(ImmutableVersion::default())?;

    println!("\n🔀 Split-join inference:");
    for features in [vec![0.4f64, 0.2], vec![9.0, 9.1]] {
        let input = Mediator::root(Arc::new(features.clone()) as Payload);
        let output = container.process(input).await?;
        let summary = output
            .payload_as::<String>()
            .map(String::as_str)
            .unwrap_or("<no summary>");
        println!("   {:?} → {}", features, summary);
    }

    // Step 4: hot-swap a new container version while the old one stays a
    // stable snapshot for any in-flight work.
    let next = container.mutable_clone();
    container.replace_with(next.clone())?;
    println!(
        "\n🔁 Replaced container version {} with {}; current tip: {}",
        container.id(),
        next.id(),
        container.current_version().map(|p| p.id()).unwrap_or_else(|| container.id()),
    );

    println!("\n🎉 Demo complete!");
    Ok(())
}
