use thiserror::Error;

use crate::backend::BackendError;

pub type ModelResult<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("backend error: {0}")]
    BackendError(#[from] BackendError),
    #[error("json error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("access to this resource is forbidden")]
    Forbidden,
}

impl ModelError {
    /// Message to surface to the user, the backend's own wording when there is one.
    pub fn message(&self) -> String {
        match self {
            Self::BackendError(e) => e.message(),
            Self::SerdeError(_) => String::from("unexpected data from backend"),
            Self::Forbidden => self.to_string(),
        }
    }
}
