use serde::Serialize;
use thiserror::Error;

/// Failure of an external run collaborator. Recorded in the block's output
/// slot; never propagated through the structural API.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ExecutionError {
    #[error("markdown render failed: {0}")]
    Render(String),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("search failed: {0}")]
    Search(String),
    #[error("{0} is not available")]
    Unavailable(String),
}
