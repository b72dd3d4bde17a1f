//! Directory error types.

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Directory returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Parse error: {0}")]
    Parse(String),
}
