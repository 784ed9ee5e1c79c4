//! Client for the PikPak drive metadata API.
//!
//! Creates file entries and keeps the session's captcha token fresh: a
//! token is minted through the captcha shield when none is held, and
//! re-minted once when the drive rejects it.

mod captcha;
mod client;
mod config;
mod error;
mod session;

pub use client::DriveClient;
pub use config::ClientInfo;
pub use error::DriveError;
pub use session::Session;

#[cfg(test)]
mod test_support;
