use std::collections::BTreeMap;

use tracing::debug;

use crate::aggregate::{breakdown, Breakdown};
use crate::error::{CbrError, Result};
use crate::params::Config;
use crate::retrieval::{retrieve, RetrievalResult};
use crate::reuse::reuse;
use crate::schema::Schema;
use crate::types::{AttributeKind, Case, Label, Problem, Record, Value};

pub struct CaseBase {
    schema: Schema,
    label: String,
    cases: Vec<Case>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub label: Label,
    pub neighbors: RetrievalResult,
}

impl CaseBase {
    pub fn from_records(records: &[Record], label: &str) -> Result<Self> {
        Self::with_kinds(records, label, &BTreeMap::new())
    }

    pub fn with_kinds(
        records: &[Record],
        label: &str,
        declared: &BTreeMap<String, AttributeKind>,
    ) -> Result<Self> {
        if records.is_empty() {
            return Err(CbrError::EmptyCaseBase);
        }
        let schema = Schema::with_kinds(records, label, declared)?;
        let cases = records
            .iter()
            .enumerate()
            .map(|(index, record)| -> Result<Case> {
                let class = match record.get(label) {
                    None => return Err(CbrError::MissingLabel { index }),
                    Some(Value::Text(raw)) => Label::parse(raw).ok_or_else(|| {
                        CbrError::InvalidLabel {
                            index,
                            value: raw.clone(),
                        }
                    })?,
                    Some(other) => {
                        return Err(CbrError::InvalidLabel {
                            index,
                            value: other.to_string(),
                        })
                    }
                };
                let problem = schema.align(record, Some(label))?;
                Ok(Case {
                    problem,
                    label: class,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(cases = cases.len(), attributes = schema.len(), "case base built");
        Ok(Self {
            schema,
            label: label.to_string(),
            cases,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn label_attribute(&self) -> &str {
        &self.label
    }

    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    pub fn get(&self, index: usize) -> Option<&Case> {
        self.cases.get(index)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Builds a query problem from an unlabeled record.
    pub fn query(&self, record: &Record) -> Result<Problem> {
        self.schema.align(record, Some(&self.label))
    }

    /// Classifies a new record against the whole case base.
    pub fn classify(&self, record: &Record, config: &Config) -> Result<Classification> {
        config.validate()?;
        let query = self.query(record)?;
        let weights = config.weights.resolve(&self.schema)?;
        let neighbors = retrieve(&query, self, None, &weights, config.k)?;
        let label = reuse(&neighbors, self)?;
        Ok(Classification { label, neighbors })
    }

    /// Attribute-by-attribute similarity between a record and a stored case.
    pub fn explain(&self, record: &Record, index: usize, config: &Config) -> Result<Breakdown> {
        let query = self.query(record)?;
        let case = self.get(index).ok_or(CbrError::CaseNotFound(index))?;
        let weights = config.weights.resolve(&self.schema)?;
        breakdown(&query, &case.problem, &self.schema, &weights)
    }
}
