//! Case-based reasoning classifier for tabular income data.
//!
//! Cases are compared attribute by attribute, the local scores are combined
//! into a weighted global similarity, the k most similar cases are retrieved
//! and their labels reused by majority vote. `loocv` measures the accuracy of
//! that cycle with leave-one-out cross-validation.

pub mod aggregate;
pub mod case_base;
pub mod error;
pub mod loader;
pub mod loocv;
pub mod metrics;
pub mod params;
pub mod retrieval;
pub mod reuse;
pub mod schema;
pub mod types;

pub use aggregate::{breakdown, global_similarity, AttributeSimilarity, Breakdown};
pub use case_base::{CaseBase, Classification};
pub use error::{CbrError, Result};
pub use loader::{load_csv, LoadOptions};
pub use loocv::{evaluate_case, leave_one_out, sweep, Evaluation};
pub use metrics::{local_similarity, Measure, Range};
pub use params::{Config, Weights};
pub use retrieval::{retrieve, RetrievalResult};
pub use reuse::reuse;
pub use schema::{Attribute, AttributeSummary, Schema};
pub use types::{AttributeKind, Case, Label, Neighbor, Outcome, Problem, Record, Value};
