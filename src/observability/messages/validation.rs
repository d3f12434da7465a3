// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for wiring validation rejections.

use std::fmt::{Display, Formatter};

use tracing::Span;

use crate::errors::ValidationError;
use crate::observability::messages::StructuredLog;
use crate::traits::processor::NodeId;

/// A node failed validation and was not finalised.
///
/// # Log Level
/// `warn!` - The editor proposed an invalid wiring; nothing entered service
pub struct FinaliseRejected<'a> {
    pub processor: NodeId,
    pub error: &'a ValidationError,
}

impl Display for FinaliseRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor {} rejected at finalisation: {}",
            self.processor, self.error
        )
    }
}

impl StructuredLog for FinaliseRejected<'_> {
    fn log(&self) {
        tracing::warn!(processor = %self.processor, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("validation", span_name = name, processor = %self.processor)
    }
}
