//! CSV loading for tabular case data.
//!
//! Produces one `Record` per retained row. A row with any missing field is
//! dropped, and a column is numeric only when all of its kept values parse as
//! finite numbers.

use anyhow::{anyhow, Context, Result};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::types::{Record, Value};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct LoadOptions {
    pub missing_marker: String,
    pub drop_columns: Vec<String>,
    /// Keep a random sample of this many rows.
    pub sample: Option<usize>,
    pub seed: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            missing_marker: "?".to_string(),
            drop_columns: Vec::new(),
            sample: None,
            seed: 42,
        }
    }
}

impl LoadOptions {
    /// The adult income preset: redundant columns dropped, 5000 sampled rows.
    pub fn adult() -> Self {
        Self {
            drop_columns: ["fnlwgt", "education_num", "capital_gain", "capital_loss"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            sample: Some(5000),
            ..Self::default()
        }
    }
}

pub fn load_csv<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    read_records(reader, options)
}

pub fn read_records<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    options: &LoadOptions,
) -> Result<Vec<Record>> {
    let headers = reader.headers()?.clone();
    for column in &options.drop_columns {
        if !headers.iter().any(|h| h == column) {
            warn!(column = column.as_str(), "column to drop is not present");
        }
    }
    let kept: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !options.drop_columns.iter().any(|c| c == h))
        .collect();
    if kept.is_empty() {
        return Err(anyhow!("no columns left to load"));
    }

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut dropped = 0usize;
    for (idx, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("Failed to read row {}", idx + 1))?;
        let fields: Option<Vec<String>> = kept
            .iter()
            .map(|(i, _)| {
                row.get(*i)
                    .filter(|f| !f.is_empty() && *f != options.missing_marker)
                    .map(str::to_string)
            })
            .collect();
        match fields {
            Some(fields) => rows.push(fields),
            None => dropped += 1,
        }
    }
    info!(kept = rows.len(), dropped, "rows with missing values removed");

    if let Some(n) = options.sample {
        if n < rows.len() {
            let mut rng = Pcg64::seed_from_u64(options.seed);
            let picked = rand::seq::index::sample(&mut rng, rows.len(), n);
            rows = picked.iter().map(|i| std::mem::take(&mut rows[i])).collect();
            info!(sample = n, seed = options.seed, "sampled rows");
        }
    }

    let numeric: Vec<bool> = (0..kept.len())
        .map(|col| {
            rows.iter()
                .all(|row| row[col].parse::<f64>().map_or(false, f64::is_finite))
        })
        .collect();

    Ok(rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&kept)
                .zip(&numeric)
                .map(|((field, (_, name)), is_numeric)| {
                    let value = match field.parse::<f64>() {
                        Ok(n) if *is_numeric => Value::Number(n),
                        _ => Value::Text(field),
                    };
                    (name.to_string(), value)
                })
                .collect()
        })
        .collect())
}
