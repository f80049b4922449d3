use thiserror::Error;

pub type Result<T> = std::result::Result<T, CbrError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CbrError {
    #[error("Invalid attribute kind for '{attribute}': {detail}")]
    InvalidAttributeKind { attribute: String, detail: String },

    #[error("No attribute could be scored: empty weight sum")]
    EmptyWeightSum,

    #[error("Insufficient case base: k = {k} but only {available} candidate cases")]
    InsufficientCaseBase { k: usize, available: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid weight {weight} for attribute '{attribute}'")]
    InvalidWeight { attribute: String, weight: f64 },

    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Case {index} has no label")]
    MissingLabel { index: usize },

    #[error("Case {index} has unrecognised label '{value}'")]
    InvalidLabel { index: usize, value: String },

    #[error("Case {0} not found")]
    CaseNotFound(usize),

    #[error("Retrieval returned no neighbors to vote on")]
    EmptyRetrieval,

    #[error("Case base is empty")]
    EmptyCaseBase,

    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}
