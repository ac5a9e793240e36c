// error.rs - Error taxonomy for the fitting/selection pipeline

use thiserror::Error;

/// Violations of the adjacency-matrix invariants, caught at construction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("adjacency matrix is not square ({rows}x{cols})")]
    NotSquare { rows: usize, cols: usize },

    #[error("adjacency matrix is not symmetric at ({i}, {j})")]
    NotSymmetric { i: usize, j: usize },

    #[error("adjacency matrix has a nonzero diagonal entry at node {node}")]
    NonzeroDiagonal { node: usize },
}

/// Failures of the spectral layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpectralError {
    /// An isolated node makes D^{-1/2} undefined.
    #[error("node {node} has degree zero; the normalized Laplacian is undefined")]
    DegenerateGraph { node: usize },

    #[error("unsupported divergence kind `{name}` (expected KL, L1 or L2)")]
    UnsupportedMetric { name: String },
}

/// Failures of the logistic estimator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EstimatorError {
    #[error("logistic fit did not converge within {iterations} iterations")]
    Convergence { iterations: usize },

    #[error("degenerate regression input: {0}")]
    DegenerateInput(String),

    #[error(transparent)]
    Spectral(#[from] SpectralError),
}

/// Failures of the generative search.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SearchError {
    /// No iteration can ever be eligible as best.
    #[error("max_iterations ({max_iterations}) must exceed warm_up ({warm_up})")]
    InvalidSearchWindow { warm_up: usize, max_iterations: usize },

    #[error(transparent)]
    Spectral(#[from] SpectralError),
}

/// Failures of the model-selection layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectionError {
    #[error("unknown model family `{name}`")]
    UnknownModel { name: String },

    #[error("no parameter range supplied for model family {model}")]
    MissingParameterRange { model: String },

    #[error("LG scoring requires previously generated candidate graphs")]
    NoLogitCandidates,

    #[error(transparent)]
    Spectral(#[from] SpectralError),
}
