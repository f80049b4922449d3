use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CbrError, Result};
use crate::metrics::{Measure, Range};
use crate::types::{AttributeKind, Problem, Record, Value};

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub measure: Measure,
}

impl Attribute {
    pub fn kind(&self) -> AttributeKind {
        self.measure.kind()
    }
}

/// Serializable view of one schema entry, for reporting.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct AttributeSummary {
    pub name: String,
    pub kind: AttributeKind,
    pub range: Option<Range>,
}

/// Attribute schema derived once from the full set of records.
/// Attributes are kept in name order; `Problem` values follow the same order.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    attributes: Vec<Attribute>,
}

impl Schema {
    pub fn derive(records: &[Record], label: &str) -> Result<Self> {
        Self::with_kinds(records, label, &BTreeMap::new())
    }

    /// Derives the schema, forcing the kinds named in `declared`.
    /// Undeclared attributes are numeric when every present value is a number
    /// and categorical when every present value is text.
    pub fn with_kinds(
        records: &[Record],
        label: &str,
        declared: &BTreeMap<String, AttributeKind>,
    ) -> Result<Self> {
        let names: BTreeSet<&String> = records
            .iter()
            .flat_map(|r| r.keys())
            .filter(|name| name.as_str() != label)
            .collect();
        for name in declared.keys() {
            if !names.contains(name) {
                return Err(CbrError::UnknownAttribute(name.clone()));
            }
        }

        let mut attributes = Vec::with_capacity(names.len());
        for name in names {
            let values = records.iter().filter_map(|r| r.get(name));
            let kind = match declared.get(name) {
                Some(kind) => *kind,
                None => infer_kind(name, values.clone())?,
            };
            let measure = match kind {
                AttributeKind::Numeric => {
                    let mut range: Option<Range> = None;
                    for value in values {
                        let n = numeric_value(name, value)?;
                        match range.as_mut() {
                            Some(r) => r.include(n),
                            None => range = Some(Range::new(n, n)),
                        }
                    }
                    Measure::new(kind, Some(range.unwrap_or(Range::new(0.0, 0.0))))
                }
                AttributeKind::Categorical => Measure::new(kind, None),
            };
            let measure = measure.ok_or_else(|| CbrError::InvalidAttributeKind {
                attribute: name.clone(),
                detail: format!("no measure for {kind}"),
            })?;
            attributes.push(Attribute { name: name.clone(), measure });
        }
        Ok(Self { attributes })
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    pub fn summary(&self) -> Vec<AttributeSummary> {
        self.attributes
            .iter()
            .map(|a| AttributeSummary {
                name: a.name.clone(),
                kind: a.kind(),
                range: a.measure.range(),
            })
            .collect()
    }

    /// Lays a record out in schema order, coercing values to each attribute's kind.
    /// `label` names a key that is skipped; any other key outside the schema is an error.
    pub fn align(&self, record: &Record, label: Option<&str>) -> Result<Problem> {
        for key in record.keys() {
            if Some(key.as_str()) != label && self.position(key).is_none() {
                return Err(CbrError::UnknownAttribute(key.clone()));
            }
        }
        let values = self
            .attributes
            .iter()
            .map(|attr| {
                record
                    .get(&attr.name)
                    .map(|v| coerce(attr, v))
                    .transpose()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Problem { values })
    }
}

fn infer_kind<'a>(name: &str, values: impl Iterator<Item = &'a Value>) -> Result<AttributeKind> {
    let mut kind = None;
    for value in values {
        let this = match value {
            Value::Number(_) => AttributeKind::Numeric,
            Value::Text(_) => AttributeKind::Categorical,
        };
        match kind {
            None => kind = Some(this),
            Some(k) if k != this => {
                return Err(CbrError::InvalidAttributeKind {
                    attribute: name.to_string(),
                    detail: "mixes numeric and text values".to_string(),
                })
            }
            Some(_) => {}
        }
    }
    Ok(kind.unwrap_or(AttributeKind::Categorical))
}

fn numeric_value(name: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) if n.is_finite() => Ok(*n),
        other => Err(CbrError::InvalidAttributeKind {
            attribute: name.to_string(),
            detail: format!("'{other}' is not a finite number"),
        }),
    }
}

fn coerce(attr: &Attribute, value: &Value) -> Result<Value> {
    match attr.kind() {
        AttributeKind::Numeric => numeric_value(&attr.name, value).map(Value::Number),
        AttributeKind::Categorical => Ok(match value {
            Value::Number(n) => Value::Text(n.to_string()),
            text => text.clone(),
        }),
    }
}
