//! Leave-one-out evaluation.
//!
//! Every case is classified once against the rest of the case base. The
//! per-case units run on a dedicated rayon pool and report through a channel;
//! the calling thread is the only owner of the running totals.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use tracing::{debug, error, info};

use crate::case_base::CaseBase;
use crate::error::{CbrError, Result};
use crate::params::{is_uniform, Config};
use crate::retrieval::retrieve;
use crate::reuse::reuse;
use crate::types::Outcome;

const PROGRESS_EVERY: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Dispatching,
    Collecting,
    Done,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Evaluation {
    pub k: usize,
    pub weighted: bool,
    pub correct_count: usize,
    pub total_count: usize,
    /// Per-case outcomes in case index order.
    pub outcomes: Vec<Outcome>,
}

impl Evaluation {
    pub fn accuracy(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.correct_count as f64 / self.total_count as f64
        }
    }
}

#[derive(Default)]
struct Tally {
    correct: usize,
    outcomes: Vec<Outcome>,
}

impl Tally {
    fn merge(&mut self, outcome: Outcome) {
        if outcome.correct() {
            self.correct += 1;
        }
        self.outcomes.push(outcome);
    }

    fn total(&self) -> usize {
        self.outcomes.len()
    }

    fn accuracy(&self) -> f64 {
        self.correct as f64 / self.total().max(1) as f64
    }
}

/// Classifies case `index` using every other case as the candidate pool.
pub fn evaluate_case(
    case_base: &CaseBase,
    index: usize,
    weights: &[f64],
    k: usize,
) -> Result<Outcome> {
    let case = case_base.get(index).ok_or(CbrError::CaseNotFound(index))?;
    let retrieved = retrieve(&case.problem, case_base, Some(index), weights, k)?;
    let predicted = reuse(&retrieved, case_base)?;
    Ok(Outcome {
        index,
        predicted,
        actual: case.label,
    })
}

/// Runs leave-one-out cross-validation with `config.workers` parallel workers.
/// The first failing unit aborts the run.
pub fn leave_one_out(case_base: &CaseBase, config: &Config) -> Result<Evaluation> {
    config.validate()?;
    let weights = config.weights.resolve(case_base.schema())?;
    let available = case_base.len().saturating_sub(1);
    if config.k > available {
        return Err(CbrError::InsufficientCaseBase {
            k: config.k,
            available,
        });
    }
    let queries = config
        .sample
        .map_or(case_base.len(), |n| n.min(case_base.len()));

    let pool = ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .map_err(|e| CbrError::WorkerPool(e.to_string()))?;

    let weights = weights.as_slice();
    let tally = run_units(&pool, queries, |index| {
        evaluate_case(case_base, index, weights, config.k)
    })?;

    let mut outcomes = tally.outcomes;
    outcomes.sort_by_key(|o| o.index);
    let evaluation = Evaluation {
        k: config.k,
        weighted: !is_uniform(weights),
        correct_count: tally.correct,
        total_count: outcomes.len(),
        outcomes,
    };
    debug!(
        phase = ?Phase::Done,
        correct = evaluation.correct_count,
        total = evaluation.total_count,
        "loocv finished"
    );
    Ok(evaluation)
}

/// Runs `unit` for every query index on `pool` and merges the outcomes on the
/// calling thread. The first failing unit stops units that have not started
/// yet and its error is returned instead of a partial tally.
fn run_units<F>(pool: &ThreadPool, queries: usize, unit: F) -> Result<Tally>
where
    F: Fn(usize) -> Result<Outcome> + Sync,
{
    let mut phase = Phase::Idle;
    debug!(?phase, queries, workers = pool.current_num_threads(), "loocv run");

    let (tx, rx) = mpsc::channel::<Result<Outcome>>();
    let abort = AtomicBool::new(false);
    let unit = &unit;
    let mut tally = Tally::default();
    let mut failure = None;

    pool.in_place_scope(|scope| {
        phase = Phase::Dispatching;
        debug!(?phase);
        for index in 0..queries {
            let tx = tx.clone();
            let abort = &abort;
            scope.spawn(move |_| {
                if abort.load(Ordering::Relaxed) {
                    return;
                }
                let outcome = unit(index);
                if outcome.is_err() {
                    abort.store(true, Ordering::Relaxed);
                }
                // the receiver lives until the scope ends
                let _ = tx.send(outcome);
            });
        }
        drop(tx);

        phase = Phase::Collecting;
        debug!(?phase);
        for outcome in rx.iter() {
            match outcome {
                Ok(outcome) => {
                    tally.merge(outcome);
                    if tally.total() % PROGRESS_EVERY == 0 {
                        info!(
                            processed = tally.total(),
                            queries,
                            accuracy = tally.accuracy(),
                            "loocv progress"
                        );
                    }
                }
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }
    });

    if let Some(e) = failure {
        error!(error = %e, "loocv aborted");
        return Err(e);
    }
    Ok(tally)
}

/// Evaluates several configurations concurrently, one result per config in input order.
pub fn sweep(case_base: &CaseBase, configs: &[Config]) -> Result<Vec<Evaluation>> {
    configs
        .par_iter()
        .map(|config| leave_one_out(case_base, config))
        .collect()
}
