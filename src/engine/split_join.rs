// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Concurrent branch dispatch and deterministic fan-in.
//!
//! One task per branch workflow, scheduled on the shared tokio runtime and
//! bounded by a semaphore so nested split-joins cannot multiply into
//! unbounded concurrency. Results are collected in completion order —
//! a race by construction — and then reordered by provenance: each output
//! mediator's creator id resolves to its originating workflow's index.
//! Join results are therefore independent of branch completion order,
//! which is a correctness property of the engine, not an implementation
//! accident.
//!
//! ## Failure policy
//!
//! Branch failures **propagate**: the first branch error aborts the join
//! with [`ExecutionError::BranchFailed`], and dropping the task set
//! cancels the remaining branches. A panicked or cancelled branch task
//! surfaces as [`ExecutionError::BranchPanicked`]. The engine never posts
//! sentinel outputs and never waits on a slot that cannot be filled.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::errors::ExecutionError;
use crate::mediator::Mediator;
use crate::pipeline::Workflow;
use crate::traits::processor::Processor;

/// Runs every branch workflow on a shared input concurrently and returns
/// the outputs ordered by the declared workflow order.
pub async fn run_branches(
    workflows: &[Arc<Workflow>],
    input: Mediator,
    max_concurrency: usize,
) -> Result<Vec<Mediator>, ExecutionError> {
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks: JoinSet<Result<Mediator, ExecutionError>> = JoinSet::new();

    for (index, workflow) in workflows.iter().enumerate() {
        let workflow = workflow.clone();
        let input = input.clone();
        let semaphore = semaphore.clone();

        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| ExecutionError::BranchPanicked {
                    detail: format!("semaphore closed: {}", e),
                })?;
            workflow
                .process(input)
                .await
                .map_err(|e| ExecutionError::BranchFailed {
                    index,
                    workflow: workflow.id(),
                    source: Box::new(e),
                })
        });
    }

    let mut completed = Vec::with_capacity(workflows.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(output)) => completed.push(output),
            Ok(Err(e)) => return Err(e),
            Err(join_error) => {
                return Err(ExecutionError::BranchPanicked {
                    detail: join_error.to_string(),
                })
            }
        }
    }

    reorder_by_creator(workflows, completed)
}

/// Places each output at its originating workflow's index by resolving
/// its provenance, never by arrival order.
pub fn reorder_by_creator(
    workflows: &[Arc<Workflow>],
    outputs: Vec<Mediator>,
) -> Result<Vec<Mediator>, ExecutionError> {
    let mut ordered: Vec<Option<Mediator>> = vec![None; workflows.len()];

    for output in outputs {
        let creator = output
            .history()
            .creator()
            .ok_or(ExecutionError::UnattributedBranchOutput)?;
        let index = workflows
            .iter()
            .position(|w| w.id() == creator)
            .ok_or(ExecutionError::ForeignBranchOutput { creator })?;
        if ordered[index].is_some() {
            return Err(ExecutionError::DuplicateBranchOutput { workflow: creator });
        }
        ordered[index] = Some(output);
    }

    ordered
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| ExecutionError::MissingBranchOutput {
                index,
                workflow: workflows[index].id(),
            })
        })
        .collect()
}

/// Every combination of one mediator per branch, in declared branch
/// order. The training fan-out of a split-join container is the full
/// cartesian product of its branches' outputs.
pub fn cartesian_product(per_branch: &[Vec<Mediator>]) -> Vec<Vec<Mediator>> {
    let mut combinations: Vec<Vec<Mediator>> = vec![Vec::new()];
    for branch_outputs in per_branch {
        let mut expanded = Vec::with_capacity(combinations.len() * branch_outputs.len());
        for combination in &combinations {
            for output in branch_outputs {
                let mut next = combination.clone();
                next.push(output.clone());
                expanded.push(next);
            }
        }
        combinations = expanded;
    }
    combinations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mediator::Payload;
    use crate::traits::processor::NodeId;

    fn mediator(n: i32) -> Mediator {
        Mediator::root(Arc::new(n) as Payload)
    }

    #[test]
    fn cartesian_product_multiplies_branch_widths() {
        let per_branch = vec![
            vec![mediator(0), mediator(1)],
            vec![mediator(2), mediator(3), mediator(4)],
        ];
        let combos = cartesian_product(&per_branch);
        assert_eq!(combos.len(), 6);
        for combo in &combos {
            assert_eq!(combo.len(), 2);
            assert!(per_branch[0].contains(&combo[0]));
            assert!(per_branch[1].contains(&combo[1]));
        }
    }

    #[test]
    fn cartesian_product_of_nothing_is_one_empty_combination() {
        assert_eq!(cartesian_product(&[]), vec![Vec::<Mediator>::new()]);
    }

    #[test]
    fn cartesian_product_with_an_empty_branch_is_empty() {
        let per_branch = vec![vec![mediator(0)], vec![]];
        assert!(cartesian_product(&per_branch).is_empty());
    }

    #[test]
    fn reorder_rejects_unattributed_outputs() {
        let err = reorder_by_creator(&[], vec![mediator(1)]).unwrap_err();
        assert!(matches!(err, ExecutionError::UnattributedBranchOutput));
    }

    #[test]
    fn reorder_rejects_foreign_creators() {
        let foreign = mediator(0).create_next(NodeId::next(), Arc::new(1i32) as Payload);
        let err = reorder_by_creator(&[], vec![foreign]).unwrap_err();
        assert!(matches!(err, ExecutionError::ForeignBranchOutput { .. }));
    }
}
