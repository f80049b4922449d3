//! Local similarity measures, one per attribute kind.
//!
//! A schema resolves every attribute to a `Measure` once, so comparisons
//! dispatch on an enum tag instead of inspecting value types per call.

use serde::{Deserialize, Serialize};

use crate::error::{CbrError, Result};
use crate::types::{AttributeKind, Value};

/// Observed value range of a numeric attribute.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn include(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Finite bounds with `min <= max`.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

pub trait LocalMeasure {
    /// Similarity in [0, 1], or `None` when a value does not fit the measure.
    fn similarity(&self, a: &Value, b: &Value) -> Option<f64>;
}

/// `1 - |a - b| / (max - min)` over values clamped into the observed range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearMeasure {
    pub range: Range,
}

impl LocalMeasure for LinearMeasure {
    fn similarity(&self, a: &Value, b: &Value) -> Option<f64> {
        let (a, b) = (a.as_number()?, b.as_number()?);
        if !self.range.is_valid() || !a.is_finite() || !b.is_finite() {
            return None;
        }
        let (a, b) = (self.range.clamp(a), self.range.clamp(b));
        let width = self.range.width();
        if width > 0.0 {
            Some((1.0 - (a - b).abs() / width).clamp(0.0, 1.0))
        } else {
            // no variance: both values clamp onto the single observed point
            Some(1.0)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EqualityMeasure;

impl LocalMeasure for EqualityMeasure {
    fn similarity(&self, a: &Value, b: &Value) -> Option<f64> {
        let (a, b) = (a.as_text()?, b.as_text()?);
        Some(if a == b { 1.0 } else { 0.0 })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Measure {
    Linear(LinearMeasure),
    Equality(EqualityMeasure),
}

impl Measure {
    pub fn new(kind: AttributeKind, range: Option<Range>) -> Option<Self> {
        match kind {
            AttributeKind::Numeric => range
                .filter(Range::is_valid)
                .map(|range| Measure::Linear(LinearMeasure { range })),
            AttributeKind::Categorical => Some(Measure::Equality(EqualityMeasure)),
        }
    }

    pub fn kind(&self) -> AttributeKind {
        match self {
            Measure::Linear(_) => AttributeKind::Numeric,
            Measure::Equality(_) => AttributeKind::Categorical,
        }
    }

    pub fn range(&self) -> Option<Range> {
        match self {
            Measure::Linear(m) => Some(m.range),
            Measure::Equality(_) => None,
        }
    }

    pub fn similarity(&self, a: &Value, b: &Value) -> Option<f64> {
        match self {
            Measure::Linear(m) => m.similarity(a, b),
            Measure::Equality(m) => m.similarity(a, b),
        }
    }

    /// Like `similarity`, reporting a kind/value mismatch against `attribute`.
    pub fn compare(&self, attribute: &str, a: &Value, b: &Value) -> Result<f64> {
        self.similarity(a, b).ok_or_else(|| CbrError::InvalidAttributeKind {
            attribute: attribute.to_string(),
            detail: format!("cannot compare '{a}' and '{b}' as {}", self.kind()),
        })
    }
}

/// Similarity of two values of one attribute of the given kind.
/// Numeric attributes need their normalization range.
pub fn local_similarity(
    kind: AttributeKind,
    a: &Value,
    b: &Value,
    range: Option<Range>,
) -> Result<f64> {
    let measure = Measure::new(kind, range).ok_or_else(|| CbrError::InvalidAttributeKind {
        attribute: String::new(),
        detail: "numeric attribute without a finite min <= max range".to_string(),
    })?;
    measure.compare("", a, b)
}
