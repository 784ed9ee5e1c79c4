//! Signed OSS multipart client.

use std::time::Duration;

use chrono::Utc;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use pikpak_protocol::constants::{OSS_CONTENT_TYPE, OSS_SECURITY_TOKEN_HEADER, OSS_USER_AGENT};
use pikpak_protocol::{InitiateMultipartUploadResult, UploadTarget};
use pikpak_signer::{CanonicalRequest, RequestSigner, http_date};
use pikpak_transfer::CompletionManifest;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, DATE, ETAG};
use tracing::{debug, info};

use crate::OssError;

/// Characters left unescaped in query values (RFC 3986 unreserved).
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// OSS multipart client.
///
/// Holds only the HTTP connection pool; credentials come with each
/// [`UploadTarget`], so one client serves any number of uploads.
#[derive(Clone)]
pub struct OssClient {
    http: reqwest::Client,
    scheme: String,
}

impl OssClient {
    /// Creates a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, OssError> {
        let http = reqwest::Client::builder()
            .user_agent(OSS_USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            scheme: "https".into(),
        })
    }

    /// Talks plain HTTP to the endpoint (for testing).
    #[cfg(test)]
    pub(crate) fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_string();
        self
    }

    /// Starts a multipart upload and returns its upload id.
    pub async fn initiate(&self, target: &UploadTarget) -> Result<String, OssError> {
        let resp = self.send(Method::POST, target, "uploads", Vec::new()).await?;
        let body = resp.text().await?;

        let result = InitiateMultipartUploadResult::from_xml(&body)
            .map_err(|e| OssError::Xml(e.to_string()))?;
        if result.upload_id.is_empty() {
            return Err(OssError::Xml("response has no UploadId".into()));
        }

        info!(key = %target.key, upload_id = %result.upload_id, "multipart upload initiated");
        Ok(result.upload_id)
    }

    /// Uploads one part and returns its ETag without quotes.
    pub async fn upload_part(
        &self,
        target: &UploadTarget,
        upload_id: &str,
        part_number: u32,
        data: Vec<u8>,
    ) -> Result<String, OssError> {
        let query = format!(
            "partNumber={part_number}&uploadId={}",
            encode_query_value(upload_id)
        );
        let resp = self.send(Method::PUT, target, &query, data).await?;

        let etag = resp
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_matches('"'))
            .filter(|v| !v.is_empty())
            .ok_or(OssError::MissingETag(part_number))?
            .to_string();

        Ok(etag)
    }

    /// Finalizes the upload with the ordered part list.
    pub async fn complete(
        &self,
        target: &UploadTarget,
        upload_id: &str,
        manifest: &CompletionManifest,
    ) -> Result<(), OssError> {
        let body = manifest
            .to_complete_body()
            .to_xml()
            .map_err(|e| OssError::Xml(e.to_string()))?;
        let query = format!("uploadId={}", encode_query_value(upload_id));

        let resp = self
            .send(Method::POST, target, &query, body.into_bytes())
            .await?;
        // Drain so the connection can be reused.
        let _ = resp.bytes().await?;

        info!(key = %target.key, parts = manifest.len(), "multipart upload completed");
        Ok(())
    }

    /// Signs and sends one request; non-2xx responses become
    /// [`OssError::Api`].
    async fn send(
        &self,
        method: Method,
        target: &UploadTarget,
        query: &str,
        body: Vec<u8>,
    ) -> Result<reqwest::Response, OssError> {
        let date = http_date(Utc::now());
        let canonical = CanonicalRequest::new(
            method.as_str(),
            format!("{}?{query}", target.resource()),
        )
        .content_type(OSS_CONTENT_TYPE)
        .date(&date)
        .header(OSS_SECURITY_TOKEN_HEADER, &target.security_token);
        let authorization = RequestSigner::new(&target.access_key_id, &target.access_key_secret)
            .authorization(&canonical)?;

        let url = format!(
            "{}://{}/{}?{query}",
            self.scheme, target.endpoint, target.key
        );
        debug!(method = %method, key = %target.key, query, bytes = body.len(), "OSS request");

        let resp = self
            .http
            .request(method, &url)
            .header(DATE, &date)
            .header(CONTENT_TYPE, OSS_CONTENT_TYPE)
            .header(OSS_SECURITY_TOKEN_HEADER, &target.security_token)
            .header(AUTHORIZATION, authorization)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OssError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }
}

fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}
