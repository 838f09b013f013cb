use crate::rpc::AccessLevel;
use thiserror::Error;

/// Represents to an error reported by the client.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The request could not be delivered at all.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The server answered with a 4xx/5xx status code.
    #[error("HTTP status {status} from `{endpoint}`")]
    Status { status: u16, endpoint: String },

    /// The server answered without a `data` envelope, reporting an error.
    #[error("server reported error: {message}")]
    Api { message: String },

    /// The response body could not be parsed as what was expected.
    #[error("bad response: {message}")]
    BadResponse { message: String },

    /// The operation requires pilot access, which the vehicle did not grant.
    #[error("pilot access required, but the vehicle granted {granted:?}")]
    PilotRequired { granted: AccessLevel },

    /// The configured credentials file could not be read.
    #[error("cannot read credentials file `{path}`: {message}")]
    Credentials { path: String, message: String },

    /// An I/O error occured.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// A polling loop was cancelled by its cancellation token.
    #[error("operation cancelled")]
    Cancelled,

    /// A polling loop reached its deadline before observing the awaited phase.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}
impl ClientError {
    pub fn transport<E: ToString>(err: E) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }

    pub fn bad_response<E: ToString>(err: E) -> Self {
        Self::BadResponse {
            message: err.to_string(),
        }
    }

    pub fn io(err: &std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

/// Represents to a failure of a custom comms exchange.
///
/// Comms failures are deliberately kept apart from [`ClientError`]: a skill
/// that fails to answer is recoverable for the caller, while the session
/// itself stays valid.
#[derive(Debug, Error)]
pub enum CommsError {
    /// The underlying request failed.
    #[error("comms request failed: {0}")]
    Request(#[from] ClientError),

    /// The skill's reply carried a `data` field that was not valid base64.
    #[error("skill reply payload was not valid base64: {message}")]
    Payload { message: String },
}
