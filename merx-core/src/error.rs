use thiserror::Error;
use uuid::Uuid;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure taxonomy for the order lifecycle. `NotFound` is the one
/// domain error callers are expected to match on; the remaining
/// variants carry the original cause of a remote or storage fault.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Products could not be validated: {}", ids.join(", "))]
    UnknownProducts { ids: Vec<String> },

    #[error("Remote call failed: {cause}")]
    Dependency {
        #[source]
        cause: BoxError,
    },

    #[error("Storage failure: {cause}")]
    Storage {
        #[source]
        cause: BoxError,
    },
}

impl OrderError {
    pub fn dependency(cause: impl Into<BoxError>) -> Self {
        Self::Dependency { cause: cause.into() }
    }

    pub fn storage(cause: impl Into<BoxError>) -> Self {
        Self::Storage { cause: cause.into() }
    }
}
