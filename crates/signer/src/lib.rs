//! Request signing for the OSS multipart protocol and the salted hash
//! chain behind captcha assertions.
//!
//! Both signers are pure: identical inputs (including the timestamp)
//! always produce identical output.

mod captcha;
mod error;
mod request;

pub use captcha::{CAPTCHA_SIGN_VERSION, CaptchaChainSigner, CaptchaSeed, SaltStep, SaltTable};
pub use error::SignerError;
pub use request::{CanonicalRequest, RequestSigner, http_date};
