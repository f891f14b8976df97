// Typed errors with thiserror. The WASM facade flattens these to JS strings.

use thiserror::Error;

/// Journey engine error types.
#[derive(Error, Debug)]
pub enum JourneyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Marker index {index} out of range (have {count} milestones)")]
    MarkerOutOfRange { index: usize, count: usize },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for JourneyError {
    fn from(err: serde_json::Error) -> Self {
        JourneyError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = JourneyError::MarkerOutOfRange { index: 7, count: 3 };
        assert!(err.to_string().contains('7'));
        assert!(err.to_string().contains('3'));
    }
}
