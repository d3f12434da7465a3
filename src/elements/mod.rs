// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Ready-made [`ElementLogic`](crate::traits::ElementLogic)
//! implementations.

pub mod classifier;
pub mod function;
pub mod passthrough;

pub use classifier::{ClassifierLogic, NearestCentroid};
pub use function::{DelayLogic, FnLogic};
pub use passthrough::PassThroughLogic;
