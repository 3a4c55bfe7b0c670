use thiserror::Error;

/// Message shown to callers for every failure that is not their fault.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to optimize KOLs";

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("upstream optimizer returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("bad upstream response: {0}")]
    BadUpstreamResponse(String),

    #[error("upstream request failed: {0}")]
    Transport(String),
}

impl OptimizeError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn bad_upstream(message: impl Into<String>) -> Self {
        Self::BadUpstreamResponse(message.into())
    }

    /// Only malformed caller input is the caller's fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }

    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidRequest(message) => message.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for OptimizeError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return Self::BadUpstreamResponse(error.to_string());
        }
        if let Some(status) = error.status() {
            return Self::Upstream {
                status: status.as_u16(),
                body: String::new(),
            };
        }
        Self::Transport(error.to_string())
    }
}
