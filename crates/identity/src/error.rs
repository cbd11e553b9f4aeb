use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider answered with a non-success status.
    #[error("identity provider rejected request ({status}): {message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },
    /// Network failure, timeout, or a response body that could not be decoded.
    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl IdentityError {
    pub fn code(&self) -> Option<&str> {
        match self {
            IdentityError::Rejected { code, .. } => code.as_deref(),
            IdentityError::Transport(_) => None,
        }
    }

    /// The provider's own explanation, when it sent one.
    pub fn provider_message(&self) -> Option<&str> {
        match self {
            IdentityError::Rejected { message, .. } => Some(message),
            IdentityError::Transport(_) => None,
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, IdentityError::Rejected { .. })
    }

    pub fn is_user_already_exists(&self) -> bool {
        self.code() == Some("user_already_exists")
    }

    pub fn is_invalid_credentials(&self) -> bool {
        match self {
            IdentityError::Rejected { code, message, .. } => {
                code.as_deref() == Some("invalid_credentials")
                    || message.contains("Invalid login credentials")
            }
            IdentityError::Transport(_) => false,
        }
    }

    /// Builds a rejection from a GoTrue error body. Newer servers send
    /// `error_code`/`msg`, older ones `error`/`error_description`.
    pub(crate) fn from_body(status: u16, body: &Value) -> Self {
        let field = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);

        let code = field("error_code").or_else(|| field("error"));
        let message = field("msg")
            .or_else(|| field("error_description"))
            .or_else(|| field("message"))
            .unwrap_or_else(|| format!("HTTP {status}"));

        IdentityError::Rejected {
            status,
            code,
            message,
        }
    }
}
