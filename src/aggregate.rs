use serde::{Deserialize, Serialize};

use crate::error::{CbrError, Result};
use crate::schema::Schema;
use crate::types::Problem;

/// Weighted average of the local similarities of every attribute present in
/// both problems. Attributes missing on either side contribute neither to the
/// sum nor to the weight total.
pub fn global_similarity(
    query: &Problem,
    candidate: &Problem,
    schema: &Schema,
    weights: &[f64],
) -> Result<f64> {
    let mut sum = 0.0;
    let mut weight_sum = 0.0;
    for ((attr, weight), (q, c)) in schema
        .attributes()
        .iter()
        .zip(weights)
        .zip(query.values.iter().zip(&candidate.values))
    {
        let (Some(q), Some(c)) = (q, c) else {
            continue;
        };
        let local = attr.measure.compare(&attr.name, q, c)?;
        sum += weight * local;
        weight_sum += weight;
    }
    if weight_sum > 0.0 {
        Ok((sum / weight_sum).clamp(0.0, 1.0))
    } else {
        Err(CbrError::EmptyWeightSum)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct AttributeSimilarity {
    pub attribute: String,
    pub weight: f64,
    /// `None` when the attribute is missing from either side.
    pub similarity: Option<f64>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Breakdown {
    pub attributes: Vec<AttributeSimilarity>,
    /// `None` when the pair cannot be scored.
    pub global: Option<f64>,
}

/// Per-attribute local similarities alongside the global score.
pub fn breakdown(
    query: &Problem,
    candidate: &Problem,
    schema: &Schema,
    weights: &[f64],
) -> Result<Breakdown> {
    let attributes = schema
        .attributes()
        .iter()
        .zip(weights)
        .zip(query.values.iter().zip(&candidate.values))
        .map(|((attr, weight), (q, c))| {
            let similarity = match (q, c) {
                (Some(q), Some(c)) => Some(attr.measure.compare(&attr.name, q, c)?),
                _ => None,
            };
            Ok(AttributeSimilarity {
                attribute: attr.name.clone(),
                weight: *weight,
                similarity,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let global = match global_similarity(query, candidate, schema, weights) {
        Ok(s) => Some(s),
        Err(CbrError::EmptyWeightSum) => None,
        Err(e) => return Err(e),
    };
    Ok(Breakdown { attributes, global })
}
