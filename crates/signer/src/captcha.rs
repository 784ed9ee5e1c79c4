use std::fmt;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::SignerError;

/// Protocol version marker prefixed to every captcha signature.
pub const CAPTCHA_SIGN_VERSION: &str = "1.";

/// The only digest algorithm the chain currently understands.
const ALG_MD5: &str = "md5";

/// Salts shipped with client version 1.21.0.
const BUILTIN_SALTS: &[&str] = &[
    "",
    "E32cSkYXC2bciKJGxRsE8ZgwmH/YwkvpD6/O9guSOa2irCwciH4xPHaH",
    "QtqgfMgHP2TFl",
    "zOKgHT56L7nIzFzDpUGhpWFrgP53m3G6ML",
    "S",
    "THxpsktzfFXizUv7DK1y/N7NZ1WhayViluBEvAJJ8bA1Wr6",
    "y9PXH3xGUhG/zQI8CaapRw2LhldCaFM9CRlKpZXJvj+pifu",
    "+RaaG7T8FRTI4cP019N5y9ofLyHE9ySFUr",
    "6Pf1l8UTeuzYldGtb/d",
];

/// One step of the salted hash chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaltStep {
    pub alg: String,
    pub salt: String,
}

impl SaltStep {
    pub fn md5(salt: &str) -> Self {
        Self {
            alg: ALG_MD5.into(),
            salt: salt.into(),
        }
    }
}

/// Ordered, versioned salt table.
///
/// Accepted as JSON either as `{"version": "...", "steps": [...]}` or as
/// the bare step array the client ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaltTable {
    #[serde(default)]
    pub version: String,
    pub steps: Vec<SaltStep>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SaltTableRepr {
    Table(SaltTable),
    Steps(Vec<SaltStep>),
}

impl SaltTable {
    /// The table matching [`pikpak_protocol::constants::CLIENT_VERSION`].
    pub fn builtin() -> Self {
        Self {
            version: pikpak_protocol::constants::CLIENT_VERSION.into(),
            steps: BUILTIN_SALTS.iter().map(|s| SaltStep::md5(s)).collect(),
        }
    }

    /// Parses a table from JSON.
    ///
    /// Rejects tables without any step the chain can apply.
    pub fn from_json(json: &str) -> Result<Self, SignerError> {
        let table = match serde_json::from_str::<SaltTableRepr>(json)? {
            SaltTableRepr::Table(t) => t,
            SaltTableRepr::Steps(steps) => Self {
                version: String::new(),
                steps,
            },
        };
        if !table.steps.iter().any(|s| s.alg == ALG_MD5) {
            return Err(SignerError::EmptySaltTable);
        }
        Ok(table)
    }
}

impl Default for SaltTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Inputs concatenated into the chain seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaSeed<'a> {
    pub client_id: &'a str,
    pub client_version: &'a str,
    pub package_name: &'a str,
    pub device_id: &'a str,
    pub timestamp_ms: i64,
}

impl fmt::Display for CaptchaSeed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.client_id,
            self.client_version,
            self.package_name,
            self.device_id,
            self.timestamp_ms
        )
    }
}

/// Folds a seed through the salt table: `value = md5_hex(value + salt)`.
#[derive(Debug, Clone, Default)]
pub struct CaptchaChainSigner {
    table: SaltTable,
}

impl CaptchaChainSigner {
    pub fn new(table: SaltTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &SaltTable {
        &self.table
    }

    /// Returns the bare hex digest after the last supported step.
    ///
    /// Steps with an unknown algorithm tag are skipped.
    pub fn chain(&self, seed: &str) -> String {
        let mut value = seed.to_string();
        for step in self.table.steps.iter().filter(|s| s.alg == ALG_MD5) {
            let mut hasher = Md5::new();
            hasher.update(value.as_bytes());
            hasher.update(step.salt.as_bytes());
            value = hex::encode(hasher.finalize());
        }
        value
    }

    /// Returns the versioned signature submitted as `meta.captcha_sign`.
    pub fn sign(&self, seed: &CaptchaSeed<'_>) -> String {
        format!("{CAPTCHA_SIGN_VERSION}{}", self.chain(&seed.to_string()))
    }
}
