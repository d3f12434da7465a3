// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Identity logic: forwards its input payload unchanged.

use async_trait::async_trait;

use crate::errors::ExecutionError;
use crate::mediator::Payload;
use crate::traits::logic::ElementLogic;

/// [`ElementLogic`] that passes its input through untouched. Useful as a
/// structural placeholder and as the simplest possible branch in tests.
pub struct PassThroughLogic {
    name: String,
}

impl PassThroughLogic {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl ElementLogic for PassThroughLogic {
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, input: &Payload) -> Result<Payload, ExecutionError> {
        Ok(input.clone())
    }
}
