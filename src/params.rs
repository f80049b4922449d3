use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CbrError, Result};
use crate::schema::Schema;

/// Attribute weights. Every attribute weighs 1.0 unless overridden by name.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Weights {
    pub overrides: BTreeMap<String, f64>,
}

impl Weights {
    pub fn uniform() -> Self {
        Self::default()
    }

    pub fn from_map(overrides: BTreeMap<String, f64>) -> Self {
        Self { overrides }
    }

    /// Weights of the original adult-income weighted run.
    pub fn income() -> Self {
        let table = [
            ("education", 1.8),
            ("occupation", 1.6),
            ("age", 1.4),
            ("hours_per_week", 1.4),
            ("workclass", 1.2),
            ("marital_status", 1.0),
            ("relationship", 1.0),
            ("sex", 0.8),
            ("race", 0.6),
            ("native_country", 0.6),
        ];
        Self::from_map(table.iter().map(|(k, w)| (k.to_string(), *w)).collect())
    }

    pub fn with(mut self, attribute: &str, weight: f64) -> Self {
        self.overrides.insert(attribute.to_string(), weight);
        self
    }

    /// Weights laid out in schema order.
    pub fn resolve(&self, schema: &Schema) -> Result<Vec<f64>> {
        for (name, weight) in &self.overrides {
            if schema.position(name).is_none() {
                return Err(CbrError::UnknownAttribute(name.clone()));
            }
            if !weight.is_finite() || *weight < 0.0 {
                return Err(CbrError::InvalidWeight {
                    attribute: name.clone(),
                    weight: *weight,
                });
            }
        }
        Ok(schema
            .attributes()
            .iter()
            .map(|a| self.overrides.get(&a.name).copied().unwrap_or(1.0))
            .collect())
    }
}

/// True when every resolved weight is the same, whatever its value.
pub fn is_uniform(resolved: &[f64]) -> bool {
    resolved.windows(2).all(|w| w[0] == w[1])
}

/// Settings of one evaluation run, passed by reference to every stage.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Config {
    pub k: usize,
    pub weights: Weights,
    pub workers: usize,
    /// Evaluate only the first `n` cases as queries.
    pub sample: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            k: 10,
            weights: Weights::uniform(),
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            sample: None,
        }
    }
}

impl Config {
    pub fn with_k(k: usize) -> Self {
        Self { k, ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(CbrError::InvalidConfig("k must be at least 1".into()));
        }
        if self.workers == 0 {
            return Err(CbrError::InvalidConfig("workers must be at least 1".into()));
        }
        if self.sample == Some(0) {
            return Err(CbrError::InvalidConfig("sample must be at least 1".into()));
        }
        Ok(())
    }
}
