use std::fmt;
use std::sync::RwLock;

/// Credentials of a logged-in user plus the current captcha token.
///
/// The captcha token is the only mutable part; it is replaced whenever a
/// new one is minted.
pub struct Session {
    access_token: String,
    user_id: String,
    device_id: String,
    captcha_token: RwLock<Option<String>>,
}

impl Session {
    pub fn new(access_token: &str, user_id: &str, device_id: &str) -> Self {
        Self {
            access_token: access_token.to_string(),
            user_id: user_id.to_string(),
            device_id: device_id.to_string(),
            captcha_token: RwLock::new(None),
        }
    }

    /// Seeds the session with a previously issued captcha token.
    pub fn with_captcha_token(self, token: Option<String>) -> Self {
        self.set_captcha_token(token.filter(|t| !t.is_empty()));
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn captcha_token(&self) -> Option<String> {
        self.captcha_token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_captcha_token(&self, token: Option<String>) {
        *self
            .captcha_token
            .write()
            .unwrap_or_else(|e| e.into_inner()) = token;
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("device_id", &self.device_id)
            .field("captcha_token", &self.captcha_token().map(|_| "<redacted>"))
            .finish()
    }
}
