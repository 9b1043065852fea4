use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConflictError {
    #[error("Cannot resolve conflicts of an empty group")]
    EmptyGroup,
    #[error("Scoring failed: {0}")]
    Scoring(String),
}
