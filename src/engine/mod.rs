// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod split_join;

pub use split_join::{cartesian_product, reorder_by_creator, run_branches};
