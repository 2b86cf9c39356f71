use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinquoteError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unknown lender id: {0}")]
    UnknownLender(u32),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FinquoteError {
    fn from(e: serde_json::Error) -> Self {
        FinquoteError::SerializationError(e.to_string())
    }
}
