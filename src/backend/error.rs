use thiserror::Error;

pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("json error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("backend responded {status}: {message}")]
    Api { status: u16, message: String },
    #[error("backend is not configured")]
    NotConfigured,
}

impl BackendError {
    pub fn api<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Message suitable for showing to the user who triggered the request.
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::RequestError(_) => String::from("backend is unreachable"),
            Self::SerdeError(_) => String::from("backend sent an unexpected response"),
            Self::NotConfigured => String::from("backend is not configured"),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Pulls a human readable message out of an error body. The auth, rest and
/// storage services each use their own key for it.
pub fn message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_message_from_body() {
        assert_eq!(
            message_from_body(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(
            message_from_body(r#"{"code":"23503","message":"violates foreign key constraint"}"#).as_deref(),
            Some("violates foreign key constraint")
        );
        assert_eq!(message_from_body("<html>bad gateway</html>"), None);
    }

    #[test]
    fn test_status_and_message() {
        assert_eq!(BackendError::api(401, "jwt expired").status(), Some(401));
        assert_eq!(BackendError::NotConfigured.status(), None);
        assert_eq!(BackendError::api(400, "bad").message(), "bad");
    }
}
