// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;        // engine options
pub mod elements;      // ready-made element logics
pub mod engine;        // concurrent split-join executor
pub mod errors;        // error handling
pub mod mediator;      // provenance-carrying data wrappers
pub mod observability;
pub mod pipeline;      // the processor variants
pub mod traits;        // unified abstractions
pub mod typedata;      // wiring-compatibility algebra
pub mod versioning;    // immutable-version protocol
