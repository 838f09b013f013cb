pub mod vehicle;

use crate::{
    error::ClientError,
    rpc::{AccessLevel, AuthRequest, AuthResponse, REQUEST_LEVEL_PHONE, REQUEST_LEVEL_PILOT},
    session::Session,
};
use serde::{Serialize, de::DeserializeOwned};
use std::{io::Read, path::PathBuf, time::Duration};

/// Options of [`Client::connect`].
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Request pilot-level access, permitting direct flight control.
    pub pilot: bool,

    /// Path to a file holding the credentials blob, required by simulators.
    pub token_file: Option<PathBuf>,

    /// Time budget of each request, response included.
    pub timeout: Duration,
}
impl ConnectOptions {
    pub fn pilot(mut self, val: bool) -> Self {
        self.pilot = val;
        self
    }

    pub fn token_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.token_file = Some(path.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            pilot: false,
            token_file: None,
            timeout: Duration::from_secs(20),
        }
    }
}

/// A high-level wrapper of an authenticated connection to the vehicle.
#[derive(Debug)]
pub struct Client {
    agent: ureq::Agent,
    session: Session,
}
impl Client {
    /// Connects to the vehicle at the given base URL and authenticates.
    ///
    /// When pilot access is requested but the vehicle grants a lower level,
    /// this fails with [`ClientError::PilotRequired`] before any further
    /// request is issued.
    pub fn connect<S: Into<String>>(baseurl: S, options: ConnectOptions) -> Result<Self, ClientError> {
        let agent = ureq::AgentBuilder::new().timeout(options.timeout).build();
        let mut client = Self {
            agent,
            session: Session::new(baseurl),
        };
        client.authenticate(options.pilot, options.token_file.as_deref())?;
        Ok(client)
    }

    /// Returns the session state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    fn authenticate(
        &mut self,
        pilot: bool,
        token_file: Option<&std::path::Path>,
    ) -> Result<(), ClientError> {
        let mut request = AuthRequest {
            client_id: uuid::Uuid::new_v4().to_string(),
            requested_level: if pilot {
                REQUEST_LEVEL_PILOT
            } else {
                REQUEST_LEVEL_PHONE
            },
            commandeer: true,
            credentials: None,
        };
        if let Some(path) = token_file {
            let token =
                std::fs::read_to_string(path).map_err(|err| ClientError::Credentials {
                    path: path.display().to_string(),
                    message: err.to_string(),
                })?;
            request.credentials = Some(token.trim().to_owned());
        }

        let granted: AuthResponse = self.invoke("authentication", Some(&request))?;
        self.session.access_level = granted.access_level;
        if pilot && granted.access_level != AccessLevel::Pilot {
            return Err(ClientError::PilotRequired {
                granted: granted.access_level,
            });
        }
        self.session.access_token = granted.access_token;
        tracing::debug!(level = ?self.session.access_level, "authenticated");
        Ok(())
    }

    /// Sends a GET (no body) or POST (JSON body) request to an API endpoint
    /// and unwraps the `data` envelope of the JSON response.
    ///
    /// The bearer token rides along iff the session holds one. A 4xx/5xx
    /// status is a [`ClientError::Status`] error; a response body without a
    /// `data` key is a [`ClientError::Api`] error carrying the server's
    /// `error` text when present.
    pub fn request_json<P: Serialize>(
        &mut self,
        endpoint: &str,
        body: Option<&P>,
    ) -> Result<serde_json::Value, ClientError> {
        let url = self.session.api_url(endpoint);
        let method = if body.is_some() { "POST" } else { "GET" };
        let mut request = self
            .agent
            .request(method, &url)
            .set("Accept", "application/json");
        if let Some(token) = &self.session.access_token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        let response = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };
        let response = response.map_err(|err| match err {
            ureq::Error::Status(status, _) => ClientError::Status {
                status,
                endpoint: endpoint.to_owned(),
            },
            ureq::Error::Transport(transport) => ClientError::transport(transport),
        })?;

        let mut envelope: serde_json::Value = response
            .into_json()
            .map_err(ClientError::bad_response)?;
        match envelope.get_mut("data") {
            Some(data) => Ok(data.take()),
            None => Err(ClientError::Api {
                message: envelope
                    .get("error")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("no response data")
                    .to_owned(),
            }),
        }
    }

    /// Invokes an API endpoint and deserializes its `data` payload.
    pub(crate) fn invoke<P: Serialize, T: DeserializeOwned>(
        &mut self,
        endpoint: &str,
        params: Option<&P>,
    ) -> Result<T, ClientError> {
        let data = self.request_json(endpoint, params)?;
        serde_json::from_value(data).map_err(ClientError::bad_response)
    }

    /// Fetches raw bytes from the vehicle's shared memory, outside the `/api`
    /// namespace. Debug/experimental path, not a stable contract.
    pub fn fetch_shm(&self, path: &str) -> Result<Vec<u8>, ClientError> {
        let url = self.session.shm_url(path);
        let response = self.agent.get(&url).call().map_err(|err| match err {
            ureq::Error::Status(status, _) => ClientError::Status {
                status,
                endpoint: format!("shm{path}"),
            },
            ureq::Error::Transport(transport) => ClientError::transport(transport),
        })?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|err| ClientError::io(&err))?;
        Ok(bytes)
    }
}
