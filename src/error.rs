//! Error taxonomy. The core does no I/O, so every variant is a caller or configuration error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// A malloc cache needs at least one entry.
    #[error("malloc cache capacity must be at least 1")]
    ZeroCapacity,
    #[error("invalid allocation size {size}: requests must be at least 1 byte")]
    InvalidSize { size: usize },
    #[error("a run needs at least one accessor thread")]
    NoAccessors,
    #[error("a cache pool needs at least one cache")]
    NoCaches,
    #[error("cost table: {0}")]
    CostTable(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_size_message_names_the_size() {
        let err = SimError::InvalidSize { size: 0 };
        assert_eq!(
            err.to_string(),
            "invalid allocation size 0: requests must be at least 1 byte"
        );
    }

    #[test]
    fn json_errors_convert() {
        let parse = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: SimError = parse.into();
        assert!(matches!(err, SimError::CostTable(_)));
    }
}
