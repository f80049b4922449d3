use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::warn;

use crate::aggregate::global_similarity;
use crate::case_base::CaseBase;
use crate::error::{CbrError, Result};
use crate::types::{Neighbor, Problem};

/// The k most similar cases, most similar first; equal scores in ascending index order.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct RetrievalResult {
    pub neighbors: Vec<Neighbor>,
}

impl RetrievalResult {
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Neighbor> {
        self.neighbors.iter()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.neighbors.iter().map(|n| n.index).collect()
    }
}

/// Exhaustive k-NN over the case base, skipping `exclude`.
pub fn retrieve(
    query: &Problem,
    case_base: &CaseBase,
    exclude: Option<usize>,
    weights: &[f64],
    k: usize,
) -> Result<RetrievalResult> {
    let excluded = exclude.map_or(0, |i| usize::from(i < case_base.len()));
    let available = case_base.len() - excluded;
    if k > available {
        return Err(CbrError::InsufficientCaseBase { k, available });
    }

    let schema = case_base.schema();
    let mut neighbors = Vec::with_capacity(available);
    for (index, case) in case_base.cases().iter().enumerate() {
        if Some(index) == exclude {
            continue;
        }
        let similarity = match global_similarity(query, &case.problem, schema, weights) {
            Ok(s) => s,
            Err(CbrError::EmptyWeightSum) => {
                warn!(candidate = index, "pair cannot be scored, using similarity 0");
                0.0
            }
            Err(e) => return Err(e),
        };
        neighbors.push(Neighbor { index, similarity });
    }
    neighbors.sort_by_key(|n| (Reverse(OrderedFloat(n.similarity)), n.index));
    neighbors.truncate(k);
    Ok(RetrievalResult { neighbors })
}
