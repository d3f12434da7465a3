// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Leaf classifier contract consumed by classifier elements.
//!
//! The engine relies on exactly three operations and treats samples and
//! feature vectors as opaque; the statistical algorithm behind them is an
//! external concern.

/// One labeled feature vector.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    pub features: Vec<f64>,
    pub label: i32,
}

impl TrainingSample {
    pub fn new(features: Vec<f64>, label: i32) -> Self {
        Self { features, label }
    }
}

/// Trainable classifier plugged into a
/// [`ClassifierLogic`](crate::elements::ClassifierLogic) element.
pub trait Classifier: Send + Sync {
    /// Fits the classifier to the given samples.
    fn train(&mut self, samples: &[TrainingSample]);

    /// Fraction of the last training set the classifier reproduces
    /// correctly, in `0.0..=1.0`.
    fn success_rate(&self) -> f64;

    /// Predicted label for one feature vector.
    fn classify(&self, features: &[f64]) -> i32;
}
