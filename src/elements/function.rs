// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Closure-backed and timing-shim element logics.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::ExecutionError;
use crate::mediator::Payload;
use crate::traits::logic::ElementLogic;

/// [`ElementLogic`] backed by a plain synchronous closure. The quickest
/// way to drop an ad-hoc transform into a pipeline.
pub struct FnLogic<F> {
    name: String,
    transform: F,
}

impl<F> FnLogic<F>
where
    F: Fn(&Payload) -> Result<Payload, ExecutionError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, transform: F) -> Self {
        Self {
            name: name.into(),
            transform,
        }
    }
}

#[async_trait]
impl<F> ElementLogic for FnLogic<F>
where
    F: Fn(&Payload) -> Result<Payload, ExecutionError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, input: &Payload) -> Result<Payload, ExecutionError> {
        (self.transform)(input)
    }
}

/// Wraps another logic and sleeps before delegating to it. Exists to make
/// branch completion order controllable in concurrency tests.
pub struct DelayLogic {
    inner: Arc<dyn ElementLogic>,
    delay: Duration,
}

impl DelayLogic {
    pub fn new(inner: Arc<dyn ElementLogic>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl ElementLogic for DelayLogic {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn apply(&self, input: &Payload) -> Result<Payload, ExecutionError> {
        tokio::time::sleep(self.delay).await;
        self.inner.apply(input).await
    }

    async fn apply_training(&self, input: &Payload) -> Result<Vec<Payload>, ExecutionError> {
        tokio::time::sleep(self.delay).await;
        self.inner.apply_training(input).await
    }
}
