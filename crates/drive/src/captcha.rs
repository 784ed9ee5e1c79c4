//! Captcha shield exchange.

use chrono::Utc;
use pikpak_protocol::constants::CAPTCHA_INIT_PATH;
use pikpak_protocol::{CaptchaInitRequest, CaptchaInitResponse, CaptchaMeta};
use pikpak_signer::CaptchaSeed;
use reqwest::header::CONTENT_TYPE;
use tracing::info;

use crate::client::{JSON_CONTENT_TYPE, read_body};
use crate::{DriveClient, DriveError};

impl DriveClient {
    /// Mints a captcha token for `action` (`METHOD:PATH`) and stores it in
    /// the session.
    ///
    /// The assertion is signed from the client identity, the device id and
    /// the current millisecond timestamp. Failures are returned as is; the
    /// caller decides whether to try again.
    pub async fn refresh_captcha(&self, action: &str) -> Result<String, DriveError> {
        let timestamp_ms = Utc::now().timestamp_millis();
        let captcha_sign = self.signer.sign(&CaptchaSeed {
            client_id: &self.info.client_id,
            client_version: &self.info.client_version,
            package_name: &self.info.package_name,
            device_id: self.session.device_id(),
            timestamp_ms,
        });

        let request = CaptchaInitRequest {
            action: action.to_string(),
            client_id: self.info.client_id.clone(),
            device_id: self.session.device_id().to_string(),
            captcha_token: self.session.captcha_token(),
            meta: CaptchaMeta {
                captcha_sign,
                user_id: self.session.user_id().to_string(),
                package_name: self.info.package_name.clone(),
                client_version: self.info.client_version.clone(),
                timestamp: timestamp_ms.to_string(),
            },
            redirect_uri: self.info.redirect_uri.clone(),
        };

        let url = format!(
            "{}{CAPTCHA_INIT_PATH}?client_id={}",
            self.info.user_base_url, self.info.client_id
        );
        let resp = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;
        let body = read_body(&url, resp).await?;
        let issued: CaptchaInitResponse = serde_json::from_slice(&body)?;

        if issued.captcha_token.is_empty() {
            if !issued.url.is_empty() {
                return Err(DriveError::CaptchaChallenge(issued.url));
            }
            return Err(DriveError::Api {
                url,
                code: issued.error_code,
                message: "response carried no captcha token".into(),
            });
        }

        info!(action, expires_in = issued.expires_in, "captcha token issued");
        self.session
            .set_captcha_token(Some(issued.captcha_token.clone()));
        Ok(issued.captcha_token)
    }
}
