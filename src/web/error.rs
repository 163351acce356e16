use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::{
    backend::BackendError,
    error::log_error,
    model::{ModelError, ResourceType},
};

pub type WebResult<T> = std::result::Result<T, WebError>;

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("AuthenticationRequired")]
    AuthenticationRequired,

    #[error("AuthenticationAdminRequired")]
    AuthenticationAdminRequired,

    #[error("AuthenticationInvalidCredentials. Error: {error}")]
    AuthenticationInvalidCredentials { error: BackendError },
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("ResourceNotFound: {resource_type:?}")]
    ResourceNotFound { resource_type: ResourceType },

    #[error("ResourceMutationError: {resource_type:?}, {action}. Error: {error}")]
    ResourceMutationError {
        resource_type: ResourceType,
        action: &'static str,
        error: ModelError,
    },

    #[error("ResourceBadRequest: {resource_type:?}, {reason}")]
    ResourceBadRequest {
        resource_type: ResourceType,
        reason: String,
    },

    #[error("ResourceConfirmationRequired: {resource_type:?}, {action}")]
    ResourceConfirmationRequired {
        resource_type: ResourceType,
        action: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("UploadMaterialTooLarge, limit: {max_bytes}")]
    UploadMaterialTooLarge { max_bytes: usize },

    #[error("UploadFailed. Error: {0}")]
    UploadFailed(#[from] BackendError),
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("ServerIoError: {0}")]
    ServerIoError(#[from] std::io::Error),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    pub fn client_display(&self) -> String {
        String::from("Internal server error.")
    }
}

impl AuthenticationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::AuthenticationAdminRequired => StatusCode::FORBIDDEN,
            Self::AuthenticationInvalidCredentials { error } => match error {
                BackendError::Api { .. } => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::AuthenticationRequired => String::from("Authentication required."),
            Self::AuthenticationAdminRequired => {
                String::from("Authentication error, this area is reserved for admins.")
            }
            Self::AuthenticationInvalidCredentials { error } => match error {
                BackendError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
                _ => String::from("Unable to sign in. Check your credentials."),
            },
        }
    }
}

impl ResourceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            Self::ResourceMutationError { .. } => StatusCode::BAD_GATEWAY,
            Self::ResourceBadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::ResourceConfirmationRequired { .. } => StatusCode::PRECONDITION_REQUIRED,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceNotFound { .. } => String::from("Resource error, resource not found."),
            Self::ResourceMutationError { action, error, .. } => {
                format!("Unable to {action}: {}", error.message())
            }
            Self::ResourceBadRequest { reason, .. } => format!("Resource error, {reason}."),
            Self::ResourceConfirmationRequired { action, .. } => {
                format!("Confirmation required to {action}.")
            }
        }
    }
}

impl UploadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UploadMaterialTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UploadFailed(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::UploadMaterialTooLarge { max_bytes } => format!(
                "The file is too large, the limit is {}MB.",
                max_bytes / (1024 * 1024)
            ),
            Self::UploadFailed(e) => format!("Unable to upload material: {}", e.message()),
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("ResourceError - {0}")]
    ResourceError(#[from] ResourceError),
    #[error("AuthenticationError - {0}")]
    AuthenticationError(#[from] AuthenticationError),
    #[error("UploadError - {0}")]
    UploadError(#[from] UploadError),
    #[error("ServerError - {0}")]
    ServerError(#[from] ServerError),
}

impl WebError {
    pub fn resource_not_found(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceNotFound {
            resource_type: r#type,
        })
    }

    pub fn resource_mutation_error(
        r#type: ResourceType,
        action: &'static str,
        error: ModelError,
    ) -> Self {
        Self::ResourceError(ResourceError::ResourceMutationError {
            resource_type: r#type,
            action,
            error,
        })
    }

    pub fn resource_bad_request<S: Into<String>>(r#type: ResourceType, reason: S) -> Self {
        Self::ResourceError(ResourceError::ResourceBadRequest {
            resource_type: r#type,
            reason: reason.into(),
        })
    }

    pub fn confirmation_required(r#type: ResourceType, action: &'static str) -> Self {
        Self::ResourceError(ResourceError::ResourceConfirmationRequired {
            resource_type: r#type,
            action,
        })
    }

    pub fn auth_required() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationRequired)
    }

    pub fn admin_required() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationAdminRequired)
    }

    pub fn auth_invalid_credentials(error: BackendError) -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationInvalidCredentials { error })
    }

    pub fn material_too_large(max_bytes: usize) -> Self {
        Self::UploadError(UploadError::UploadMaterialTooLarge { max_bytes })
    }

    pub fn material_upload_failed(error: BackendError) -> Self {
        Self::UploadError(UploadError::UploadFailed(error))
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            Self::ResourceError(e) => e.status_code(),
            Self::AuthenticationError(e) => e.status_code(),
            Self::UploadError(e) => e.status_code(),
            Self::ServerError(e) => e.status_code(),
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceError(e) => e.client_display(),
            Self::AuthenticationError(e) => e.client_display(),
            Self::UploadError(e) => e.client_display(),
            Self::ServerError(e) => e.client_display(),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message for the client
    pub message: String,
    /// HTTP status code (stringified)
    pub status_code: String,
    /// Optional debug details (only in debug mode)
    pub details: Option<String>,
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        log_error(&self);

        let status_code = self.status_code();
        let display = self.client_display();

        let body = ErrorResponse {
            message: display,
            status_code: status_code.as_str().to_string(),
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        };

        (status_code, Json(body)).into_response()
    }
}
