// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Trainable classifier element logic.
//!
//! On the inference path a classifier element downcasts its input to a
//! feature vector and emits the predicted label. On the training path it
//! does not consult the model at all: it emits one output per class
//! hypothesis, so the surrounding pipeline explores every labelling and
//! the completed-batch feedback later tells the classifier which
//! hypotheses survived downstream. That feedback loop is where training
//! data actually comes from — each successful output pairs its own label
//! with the feature vector of its immediate predecessor.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;

use crate::errors::ExecutionError;
use crate::mediator::{Mediator, Payload};
use crate::traits::classifier::{Classifier, TrainingSample};
use crate::traits::logic::ElementLogic;

/// [`ElementLogic`] adapter wrapping a [`Classifier`] with a fixed set of
/// class labels `0..classes`.
pub struct ClassifierLogic {
    name: String,
    classifier: Mutex<Box<dyn Classifier>>,
    classes: usize,
}

impl ClassifierLogic {
    pub fn new(name: impl Into<String>, classifier: Box<dyn Classifier>, classes: usize) -> Self {
        Self {
            name: name.into(),
            classifier: Mutex::new(classifier),
            classes,
        }
    }

    fn features<'a>(&self, input: &'a Payload) -> Result<&'a Vec<f64>, ExecutionError> {
        input
            .downcast_ref::<Vec<f64>>()
            .ok_or_else(|| ExecutionError::logic(&self.name, anyhow!("payload was not Vec<f64>")))
    }
}

#[async_trait]
impl ElementLogic for ClassifierLogic {
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, input: &Payload) -> Result<Payload, ExecutionError> {
        let features = self.features(input)?;
        let label = self
            .classifier
            .lock()
            .expect("classifier lock poisoned")
            .classify(features);
        Ok(Arc::new(label) as Payload)
    }

    /// One output per class hypothesis, independent of the current model.
    async fn apply_training(&self, input: &Payload) -> Result<Vec<Payload>, ExecutionError> {
        self.features(input)?;
        Ok((0..self.classes as i32)
            .map(|label| Arc::new(label) as Payload)
            .collect())
    }

    /// Trains on the successful outputs: each pairs its own label with the
    /// feature vector that produced it.
    fn training_complete(&self, _all: &HashSet<Mediator>, successful: &HashSet<Mediator>) {
        let samples: Vec<TrainingSample> = successful
            .iter()
            .filter_map(|output| {
                let label = *output.payload_as::<i32>()?;
                let features = output.previous()?.payload_as::<Vec<f64>>()?.clone();
                Some(TrainingSample::new(features, label))
            })
            .collect();

        if !samples.is_empty() {
            self.classifier
                .lock()
                .expect("classifier lock poisoned")
                .train(&samples);
        }
    }

    fn success_rate(&self) -> Option<f64> {
        Some(
            self.classifier
                .lock()
                .expect("classifier lock poisoned")
                .success_rate(),
        )
    }
}

/// Minimal [`Classifier`]: stores one centroid per label and classifies by
/// nearest centroid in Euclidean distance.
#[derive(Debug, Default)]
pub struct NearestCentroid {
    centroids: Vec<(i32, Vec<f64>)>,
    success_rate: f64,
}

impl NearestCentroid {
    pub fn new() -> Self {
        Self::default()
    }

    fn distance_squared(a: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
    }
}

impl Classifier for NearestCentroid {
    fn train(&mut self, samples: &[TrainingSample]) {
        let mut sums: Vec<(i32, Vec<f64>, usize)> = Vec::new();
        for sample in samples {
            match sums.iter_mut().find(|(label, ..)| *label == sample.label) {
                Some((_, sum, count)) => {
                    for (s, f) in sum.iter_mut().zip(&sample.features) {
                        *s += f;
                    }
                    *count += 1;
                }
                None => sums.push((sample.label, sample.features.clone(), 1)),
            }
        }

        self.centroids = sums
            .into_iter()
            .map(|(label, sum, count)| {
                let centroid = sum.into_iter().map(|s| s / count as f64).collect();
                (label, centroid)
            })
            .collect();

        let correct = samples
            .iter()
            .filter(|s| self.classify(&s.features) == s.label)
            .count();
        self.success_rate = if samples.is_empty() {
            0.0
        } else {
            correct as f64 / samples.len() as f64
        };
    }

    fn success_rate(&self) -> f64 {
        self.success_rate
    }

    fn classify(&self, features: &[f64]) -> i32 {
        self.centroids
            .iter()
            .min_by(|(_, a), (_, b)| {
                Self::distance_squared(a, features)
                    .total_cmp(&Self::distance_squared(b, features))
            })
            .map(|(label, _)| *label)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::processor::NodeId;

    fn sample(features: Vec<f64>, label: i32) -> TrainingSample {
        TrainingSample::new(features, label)
    }

    #[test]
    fn nearest_centroid_separates_clusters() {
        let mut classifier = NearestCentroid::new();
        classifier.train(&[
            sample(vec![0.0, 0.1], 0),
            sample(vec![0.1, 0.0], 0),
            sample(vec![5.0, 5.1], 1),
            sample(vec![5.1, 5.0], 1),
        ]);

        assert_eq!(classifier.classify(&[0.05, 0.05]), 0);
        assert_eq!(classifier.classify(&[4.9, 5.2]), 1);
        assert_eq!(classifier.success_rate(), 1.0);
    }

    #[tokio::test]
    async fn training_path_emits_every_class_hypothesis() {
        let logic = ClassifierLogic::new("clf", Box::new(NearestCentroid::new()), 3);
        let input = Arc::new(vec![1.0, 2.0]) as Payload;

        let outputs = logic.apply_training(&input).await.unwrap();
        let labels: Vec<i32> = outputs
            .iter()
            .map(|p| *p.downcast_ref::<i32>().unwrap())
            .collect();
        assert_eq!(labels, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn rejects_non_feature_payloads() {
        let logic = ClassifierLogic::new("clf", Box::new(NearestCentroid::new()), 2);
        let err = logic.apply(&(Arc::new("text") as Payload)).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Logic { .. }));
    }

    #[tokio::test]
    async fn trains_from_successful_lineage() {
        let logic = ClassifierLogic::new("clf", Box::new(NearestCentroid::new()), 2);
        let element = NodeId::next();

        let low = Mediator::root(Arc::new(vec![0.0, 0.0]) as Payload);
        let high = Mediator::root(Arc::new(vec![9.0, 9.0]) as Payload);
        let low_labelled = low.create_next(element, Arc::new(0i32) as Payload);
        let high_labelled = high.create_next(element, Arc::new(1i32) as Payload);

        let successful: HashSet<_> =
            [low_labelled.clone(), high_labelled.clone()].into_iter().collect();
        let all = successful.clone();
        logic.training_complete(&all, &successful);

        assert_eq!(logic.success_rate(), Some(1.0));
        let prediction = logic.apply(&(Arc::new(vec![8.5, 9.5]) as Payload)).await.unwrap();
        assert_eq!(prediction.downcast_ref::<i32>(), Some(&1));
    }
}
