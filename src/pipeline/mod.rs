// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The three processor variants and their shared capability core.

pub mod container;
pub mod core;
pub mod element;
pub mod workflow;

#[cfg(test)]
mod integration_tests;

pub use container::SplitJoinContainer;
pub use core::ProcessorCore;
pub use element::Element;
pub use workflow::Workflow;
