use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use pikpak_protocol::constants::{OSS_AUTH_SCHEME, OSS_HEADER_PREFIX};
use sha1::Sha1;

use crate::SignerError;

type HmacSha1 = Hmac<Sha1>;

/// Formats a timestamp as an RFC 7231 `Date` header value.
///
/// The same string must go into the `Date` header and the canonical string.
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// The signed parts of one outbound OSS request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalRequest {
    method: String,
    content_type: String,
    date: String,
    oss_headers: BTreeMap<String, String>,
    resource: String,
}

impl CanonicalRequest {
    /// Starts a request for `method` on `resource` (`/{bucket}/{key}?{query}`).
    pub fn new(method: &str, resource: impl Into<String>) -> Self {
        Self {
            method: method.to_string(),
            resource: resource.into(),
            ..Default::default()
        }
    }

    pub fn content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    /// Sets the already formatted date (see [`http_date`]).
    pub fn date(mut self, date: &str) -> Self {
        self.date = date.to_string();
        self
    }

    /// Adds an outbound header. Only `x-oss-*` headers (case-insensitive)
    /// take part in the signature; others are ignored.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.starts_with(OSS_HEADER_PREFIX) {
            self.oss_headers.insert(name, value.to_string());
        }
        self
    }

    /// Builds the newline-joined string to sign.
    ///
    /// Layout: method, empty content digest, content type, date, sorted
    /// `name:value` vendor headers, resource.
    pub fn canonical_string(&self) -> String {
        let mut out = String::with_capacity(128 + self.resource.len());
        out.push_str(&self.method);
        out.push('\n');
        // Content-MD5 is never sent.
        out.push('\n');
        out.push_str(&self.content_type);
        out.push('\n');
        out.push_str(&self.date);
        out.push('\n');
        for (name, value) in &self.oss_headers {
            out.push_str(name);
            out.push(':');
            out.push_str(value);
            out.push('\n');
        }
        out.push_str(&self.resource);
        out
    }
}

/// Signs OSS requests with the STS credentials of one upload target.
#[derive(Clone)]
pub struct RequestSigner {
    access_key_id: String,
    access_key_secret: String,
}

impl RequestSigner {
    pub fn new(access_key_id: &str, access_key_secret: &str) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            access_key_secret: access_key_secret.to_string(),
        }
    }

    /// Returns `base64(HMAC-SHA1(secret, canonical_string))`.
    pub fn sign(&self, request: &CanonicalRequest) -> Result<String, SignerError> {
        let mut mac = HmacSha1::new_from_slice(self.access_key_secret.as_bytes())
            .map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        mac.update(request.canonical_string().as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Returns the full `Authorization` header value: `OSS {id}:{signature}`.
    pub fn authorization(&self, request: &CanonicalRequest) -> Result<String, SignerError> {
        let signature = self.sign(request)?;
        Ok(format!(
            "{OSS_AUTH_SCHEME} {}:{signature}",
            self.access_key_id
        ))
    }
}
