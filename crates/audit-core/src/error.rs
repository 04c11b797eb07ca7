//! Error types for the audit data model.

/// Errors raised while parsing operator input into model values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("'{0}' is not a yes/no/not-applicable answer")]
    InvalidTristate(String),

    #[error("'{0}' is not a date in YYYY-MM-DD form")]
    InvalidDate(String),

    #[error("'{0}' is not an obligation class (expected mandatory or optional)")]
    InvalidObligation(String),

    #[error("'{0}' is not a quality verdict (expected conforme or non-conforme)")]
    InvalidVerdict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ModelError::InvalidDate("31/12/2024".into());
        assert!(err.to_string().contains("YYYY-MM-DD"));
        let err = ModelError::InvalidTristate("peut-etre".into());
        assert!(err.to_string().contains("peut-etre"));
    }
}
