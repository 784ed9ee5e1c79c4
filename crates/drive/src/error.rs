/// Errors from the drive client.
#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("url: {url} error_code: {code}, error: {message}")]
    Api {
        url: String,
        code: i64,
        message: String,
    },

    #[error("captcha requires interactive verification: {0}")]
    CaptchaChallenge(String),
}

impl DriveError {
    /// Application error code, when the remote returned one.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}
