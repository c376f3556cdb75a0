use thiserror::Error;

/// Errors surfaced by [`crate::solver::solve`].
///
/// Infeasibility is not an error; it is reported as
/// [`crate::data::SolverResult::Infeasible`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolveError {
    /// The problem instance is malformed. No model was built.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The underlying solver failed before it could decide feasibility,
    /// or it produced a solution that breaks the model.
    #[error("solver failure: {0}")]
    SolverFailure(String),
}

impl SolveError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SolveError::InvalidInput(msg.into())
    }
}
