//! Protocol constants shared by the drive, captcha and OSS clients.

/// OAuth client identifier of the Android app.
pub const CLIENT_ID: &str = "YNxT9w7GMdWvEOKa";

/// App version reported in captcha metadata.
pub const CLIENT_VERSION: &str = "1.21.0";

/// Numeric version code sent as `X-Client-Version-Code`.
pub const CLIENT_VERSION_CODE: &str = "10083";

/// Android package identifier reported in captcha metadata.
pub const PACKAGE_NAME: &str = "com.pikcloud.pikpak";

/// Base URL of the drive metadata API.
pub const DRIVE_BASE_URL: &str = "https://api-drive.mypikpak.com";

/// Base URL of the user service hosting the captcha shield.
pub const USER_BASE_URL: &str = "https://user.mypikpak.com";

/// Redirect URI echoed in captcha init requests.
pub const REDIRECT_URI: &str = "https://api.mypikpak.com/v1/auth/callback";

/// Path of the file creation endpoint.
pub const FILES_PATH: &str = "/drive/v1/files";

/// Path of the captcha init endpoint.
pub const CAPTCHA_INIT_PATH: &str = "/v1/shield/captcha/init";

/// Captcha action guarding file creation (`METHOD:PATH`).
pub const CREATE_FILE_ACTION: &str = "POST:/drive/v1/files";

/// Drive error code returned when the captcha token is missing or expired.
pub const ERROR_CODE_CAPTCHA_INVALID: i64 = 9;

/// Drive resource kind for regular files.
pub const KIND_FILE: &str = "drive#file";

/// Upload type requesting a resumable (multipart) target.
pub const UPLOAD_TYPE_RESUMABLE: &str = "UPLOAD_TYPE_RESUMABLE";

/// Object provider placeholder expected by the drive.
pub const OBJ_PROVIDER_UNKNOWN: &str = "UPLOAD_TYPE_UNKNOWN";

// ---------------------------------------------------------------------------
// OSS
// ---------------------------------------------------------------------------

/// Vendor header prefix whose headers take part in request signing.
pub const OSS_HEADER_PREFIX: &str = "x-oss-";

/// Header carrying the STS security token.
pub const OSS_SECURITY_TOKEN_HEADER: &str = "X-Oss-Security-Token";

/// Authorization scheme of the OSS signature.
pub const OSS_AUTH_SCHEME: &str = "OSS";

/// Content type used for every OSS request.
pub const OSS_CONTENT_TYPE: &str = "application/octet-stream";

/// User agent of the Android OSS SDK.
pub const OSS_USER_AGENT: &str =
    "aliyun-sdk-android/2.9.5(Linux/Android 11/ONEPLUS%20A6000;RKQ1.201217.002)";

/// Hard limit on the number of parts in one multipart upload.
pub const OSS_MAX_PARTS: u64 = 10_000;
