use thiserror::Error;

/// Errors raised while collecting, laying out or assembling buffers.
///
/// Every variant carries enough context to locate the offending entity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Structural mismatch in {context}: expected {expected} bytes, found {actual}")]
    StructuralMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid graph reference: {0}")]
    InvalidGraphReference(String),
    #[error("Unsupported element shape: {0}")]
    UnsupportedElementShape(String),
    #[error("Usage conflict: {0}")]
    UsageConflict(String),
}

pub type Status<T> = Result<T, LayoutError>;

pub fn invalid_reference(msg: impl Into<String>) -> LayoutError {
    LayoutError::InvalidGraphReference(msg.into())
}

pub fn unsupported_shape(msg: impl Into<String>) -> LayoutError {
    LayoutError::UnsupportedElementShape(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = LayoutError::StructuralMismatch {
            context: "accessor 3".to_string(),
            expected: 12,
            actual: 10,
        };
        assert_eq!(
            err.to_string(),
            "Structural mismatch in accessor 3: expected 12 bytes, found 10"
        );

        let err = invalid_reference("primitive 0 references accessor 9");
        assert_eq!(
            err.to_string(),
            "Invalid graph reference: primitive 0 references accessor 9"
        );
    }
}
