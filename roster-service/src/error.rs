use thiserror::Error;

use roster_core::DomainError;

use crate::repository::RepositoryError;

/// Failure of a roster use-case.
///
/// Domain failures abort the transaction before anything is written.
/// Storage failures carry the step that was running when they occurred.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{context}: {source}")]
    Repository {
        context: &'static str,
        #[source]
        source: RepositoryError,
    },
}

impl ServiceError {
    /// The domain failure kind, if this is one.
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(e) => Some(e),
            Self::Repository { .. } => None,
        }
    }
}

/// Attach the running step to a storage error.
pub(crate) trait RepositoryResultExt<T> {
    fn context(self, context: &'static str) -> Result<T, ServiceError>;
}

impl<T> RepositoryResultExt<T> for Result<T, RepositoryError> {
    fn context(self, context: &'static str) -> Result<T, ServiceError> {
        self.map_err(|source| ServiceError::Repository { context, source })
    }
}
