//! Captcha shield payloads (`POST /v1/shield/captcha/init`).

use serde::{Deserialize, Serialize};

/// Request exchanging a signed assertion for a captcha token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptchaInitRequest {
    /// Guarded action as `METHOD:PATH`.
    pub action: String,
    pub client_id: String,
    pub device_id: String,
    /// Previously issued token, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captcha_token: Option<String>,
    pub meta: CaptchaMeta,
    pub redirect_uri: String,
}

/// Signed metadata of a captcha init request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptchaMeta {
    /// `"1." + <hex digest>` from the salted hash chain.
    pub captcha_sign: String,
    pub user_id: String,
    pub package_name: String,
    pub client_version: String,
    /// Millisecond timestamp used in the signed seed.
    pub timestamp: String,
}

/// Response of the captcha init endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptchaInitResponse {
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub captcha_token: String,
    #[serde(default)]
    pub expires_in: i64,
    /// Present when the shield demands an interactive challenge.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
}
