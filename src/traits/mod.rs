// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod classifier;
pub mod join;
pub mod logic;
pub mod observer;
pub mod processor;

pub use classifier::{Classifier, TrainingSample};
pub use join::JoinStrategy;
pub use logic::ElementLogic;
pub use observer::ProcessObserver;
pub use processor::{NodeId, Processor};
