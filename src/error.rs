//! Error aggregate for the search gateway.
//!
//! Each layer owns its error family; [`SearchError`] wraps them so a failure
//! anywhere in a batch can be reported as one message.

use thiserror::Error;

use crate::backend::BackendError;
use crate::registry::ConfigError;
use crate::search::CompileError;
use crate::service::ValidationError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("Invalid search origin date: {0}")]
    OriginDate(#[from] chrono::ParseError),
}

impl SearchError {
    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Config(_) => "config",
            Self::Compile(_) => "compile",
            Self::Backend(_) => "backend",
            Self::OriginDate(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_pass_through() {
        let err: SearchError = CompileError::InvalidSorting("sideways".into()).into();
        assert_eq!(err.to_string(), "Invalid sorting: sideways");
        assert_eq!(err.kind(), "compile");

        let err: SearchError = BackendError::Unavailable.into();
        assert_eq!(err.to_string(), "Search backend is not configured");
        assert_eq!(err.kind(), "backend");
    }

    #[test]
    fn test_config_not_found_message() {
        let err: SearchError = ConfigError::ConfigNotFound { name: "nope".into() }.into();
        assert_eq!(err.to_string(), "Config not found for: nope");
    }
}
