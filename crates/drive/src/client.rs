//! Drive metadata API client.

use std::sync::Arc;
use std::time::Duration;

use pikpak_protocol::constants::{CREATE_FILE_ACTION, ERROR_CODE_CAPTCHA_INVALID, FILES_PATH};
use pikpak_protocol::{ApiErrorBody, CreateFileRequest, CreateFileResponse};
use pikpak_signer::CaptchaChainSigner;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

use crate::{ClientInfo, DriveError, Session};

pub(crate) const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Fixed device profile headers expected by the drive.
const PROFILE_HEADERS: &[(&str, &str)] = &[
    ("Product_flavor_name", "cha"),
    ("X-User-Region", "1"),
    ("X-Alt-Capability", "3"),
    ("Country", "CN"),
];

/// PikPak drive client bound to one user session.
pub struct DriveClient {
    pub(crate) http: reqwest::Client,
    pub(crate) info: ClientInfo,
    pub(crate) session: Arc<Session>,
    pub(crate) signer: CaptchaChainSigner,
}

impl DriveClient {
    /// Creates a client whose requests time out after `timeout`.
    pub fn new(
        info: ClientInfo,
        session: Arc<Session>,
        signer: CaptchaChainSigner,
        timeout: Duration,
    ) -> Result<Self, DriveError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            info,
            session,
            signer,
        })
    }

    pub fn info(&self) -> &ClientInfo {
        &self.info
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Creates a file entry (or finds an existing one with the same hash).
    ///
    /// A captcha token is minted first when the session holds none. When
    /// the drive rejects the token, a new one is minted and the call is
    /// replayed exactly once.
    pub async fn create_file(
        &self,
        request: &CreateFileRequest,
    ) -> Result<CreateFileResponse, DriveError> {
        if self.session.captcha_token().is_none() {
            self.refresh_captcha(CREATE_FILE_ACTION).await?;
        }

        match self.post_create_file(request).await {
            Err(e) if e.code() == Some(ERROR_CODE_CAPTCHA_INVALID) => {
                warn!(action = CREATE_FILE_ACTION, "captcha token rejected, deriving a new one");
                self.refresh_captcha(CREATE_FILE_ACTION).await?;
                self.post_create_file(request).await
            }
            result => result,
        }
    }

    async fn post_create_file(
        &self,
        request: &CreateFileRequest,
    ) -> Result<CreateFileResponse, DriveError> {
        let url = format!("{}{FILES_PATH}", self.info.drive_base_url);
        let captcha_token = self.session.captcha_token().unwrap_or_default();

        let mut builder = self
            .http
            .post(&url)
            .bearer_auth(self.session.access_token())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header("X-Captcha-Token", captcha_token)
            .header("X-Client-Version-Code", &self.info.client_version_code)
            .header("X-Device-Id", self.session.device_id())
            .header("X-Peer-Id", self.session.device_id());
        for (name, value) in PROFILE_HEADERS {
            builder = builder.header(*name, *value);
        }

        let resp = builder.body(serde_json::to_vec(request)?).send().await?;
        let body = read_body(&url, resp).await?;
        let created: CreateFileResponse = serde_json::from_slice(&body)?;

        debug!(
            name = %request.name,
            file_id = %created.file.id,
            phase = %created.file.phase,
            "file entry created"
        );
        Ok(created)
    }
}

/// Reads a response body, turning error payloads and error statuses into
/// [`DriveError`]s.
pub(crate) async fn read_body(url: &str, resp: reqwest::Response) -> Result<Vec<u8>, DriveError> {
    let status = resp.status();
    let body = resp.bytes().await?.to_vec();

    if let Ok(err) = serde_json::from_slice::<ApiErrorBody>(&body)
        && err.error_code != 0
    {
        return Err(DriveError::Api {
            url: url.to_string(),
            code: err.error_code,
            message: err.message().to_string(),
        });
    }

    if !status.is_success() {
        return Err(DriveError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    Ok(body)
}
