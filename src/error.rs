use crate::models::OperationResult;
use crate::store::StoreError;
use thiserror::Error;

pub const DUPLICATE_EMAIL_MESSAGE: &str =
    "This email is already on the waitlist! Check your inbox for updates.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("document store is not available")]
    Unavailable,
    #[error("email already on the waitlist")]
    Duplicate,
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable => ServiceError::Unavailable,
            other => ServiceError::Store(other),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Other(err.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Message safe to show to a visitor
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Duplicate => DUPLICATE_EMAIL_MESSAGE.to_string(),
            ServiceError::Validation(msg) => msg.clone(),
            ServiceError::NotFound(what) => format!("{what} not found"),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn into_result(self) -> OperationResult {
        match self {
            ServiceError::Duplicate => OperationResult::duplicate(self.user_message()),
            other => OperationResult::failed(other.user_message()),
        }
    }
}
