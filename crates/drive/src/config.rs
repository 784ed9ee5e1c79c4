use pikpak_protocol::constants::{
    CLIENT_ID, CLIENT_VERSION, CLIENT_VERSION_CODE, DRIVE_BASE_URL, PACKAGE_NAME, REDIRECT_URI,
    USER_BASE_URL,
};

/// Identity the client presents and the endpoints it talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub client_id: String,
    pub client_version: String,
    pub client_version_code: String,
    pub package_name: String,
    pub drive_base_url: String,
    pub user_base_url: String,
    pub redirect_uri: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            client_id: CLIENT_ID.into(),
            client_version: CLIENT_VERSION.into(),
            client_version_code: CLIENT_VERSION_CODE.into(),
            package_name: PACKAGE_NAME.into(),
            drive_base_url: DRIVE_BASE_URL.into(),
            user_base_url: USER_BASE_URL.into(),
            redirect_uri: REDIRECT_URI.into(),
        }
    }
}
