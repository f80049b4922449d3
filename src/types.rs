use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CbrError;

/// A raw attribute value as handed over by the data loader.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Number(_) => None,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// One loader row: attribute name to value, label column included.
pub type Record = BTreeMap<String, Value>;

/// Income class of a case.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    AtOrBelow,
    Above,
}

impl Label {
    /// Parses the adult dataset spelling, `>50K` or `<=50K`, with or without a trailing dot.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().trim_end_matches('.') {
            ">50K" => Some(Label::Above),
            "<=50K" => Some(Label::AtOrBelow),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Above => f.write_str(">50K"),
            Label::AtOrBelow => f.write_str("<=50K"),
        }
    }
}

#[repr(u8)]
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum AttributeKind {
    Numeric = 1,
    Categorical = 2,
}

impl FromStr for AttributeKind {
    type Err = CbrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "numeric" => Ok(AttributeKind::Numeric),
            "categorical" => Ok(AttributeKind::Categorical),
            other => Err(CbrError::InvalidAttributeKind {
                attribute: String::new(),
                detail: format!("unknown kind '{other}'"),
            }),
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Numeric => f.write_str("numeric"),
            AttributeKind::Categorical => f.write_str("categorical"),
        }
    }
}

/// Attribute values of a case (or query), positionally aligned with a `Schema`.
/// `None` marks a value missing from the source record.
#[derive(Clone, Debug, PartialEq)]
pub struct Problem {
    pub values: Vec<Option<Value>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Case {
    pub problem: Problem,
    pub label: Label,
}

/// A candidate case and its global similarity to the current query.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub similarity: f64,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub index: usize,
    pub predicted: Label,
    pub actual: Label,
}

impl Outcome {
    pub fn correct(&self) -> bool {
        self.predicted == self.actual
    }
}
