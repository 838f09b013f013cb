//! Explicit session state of an authenticated client.

use crate::rpc::AccessLevel;

/// Authentication and continuity state of one client.
///
/// The bearer token and the session id are each set once, by the
/// authentication handshake and the first status poll respectively, and are
/// reused by every subsequent request.
#[derive(Debug, Clone)]
pub struct Session {
    /// URL of the vehicle, e.g. `http://192.168.10.1`.
    pub baseurl: String,

    /// Bearer token stored by a successful authentication.
    pub access_token: Option<String>,

    /// Server-assigned session identifier stored by the first status poll.
    pub session_id: Option<String>,

    /// Access level the vehicle granted.
    pub access_level: AccessLevel,
}
impl Session {
    /// Creates a fresh, unauthenticated session against the given base URL.
    pub fn new<S: Into<String>>(baseurl: S) -> Self {
        Self {
            baseurl: baseurl.into(),
            access_token: None,
            session_id: None,
            access_level: AccessLevel::None,
        }
    }

    /// Returns the URL of an API endpoint.
    pub fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/{}", self.baseurl, endpoint)
    }

    /// Returns the URL of a shared-memory path, outside the `/api` namespace.
    pub fn shm_url(&self, path: &str) -> String {
        format!("{}/shm{}", self.baseurl, path)
    }
}
