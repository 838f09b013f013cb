//! # The Vehicle API Protocol
//! Wire types of the vehicle's HTTP JSON API.
//!
//! ## The Conversation Model
//! Every endpoint lives under `{baseurl}/api/` and speaks JSON. A request is
//! a plain `GET`, or a `POST` with an endpoint-specific JSON body. A response
//! wraps its payload in a `{"data": ...}` envelope; absence of the top-level
//! `data` key means the server detected an error, whose text is carried in
//! the `error` field.
//!
//! ## Custom Comms
//! Opaque payloads for a skill are base64-encoded and posted to the
//! `custom_comms` endpoint, addressed by the skill's string key. The reply's
//! `data` field uses the same encoding.

use crate::error::{ClientError, CommsError};
use base64::prelude::*;
use serde::{Deserialize, Serialize};

/// Access level granted by the vehicle on authentication.
///
/// `PILOT` permits direct flight control (takeoff, land, skill switch);
/// `PHONE` is passive. Unknown levels reported by newer vehicles parse as
/// [`AccessLevel::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    #[default]
    None,
    Phone,
    Pilot,
    #[serde(other)]
    Other,
}

/// Flight phase reported by the status endpoint.
///
/// The client only observes phases, it never owns the transition: takeoff
/// polls until `FLYING` is reached and landing polls until the vehicle is no
/// longer `FLYING`. Every phase string the client has no use for parses as
/// [`FlightPhase::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightPhase {
    ReadyForGroundTakeoff,
    Flying,
    #[serde(other)]
    Other,
}

/// Requested access level codes for the authentication endpoint.
pub(crate) const REQUEST_LEVEL_PHONE: u32 = 4;
pub(crate) const REQUEST_LEVEL_PILOT: u32 = 8;

/// Parameters of the `authentication` endpoint.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct AuthRequest {
    pub client_id: String,
    pub requested_level: u32,
    pub commandeer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
}

/// Payload of the `authentication` endpoint's response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthResponse {
    #[serde(default)]
    pub access_level: AccessLevel,
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Parameters of the `status` endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusRequest {
    pub would_accept_pilot: bool,
    pub in_foreground: bool,
    pub media_mode: &'static str,
    pub takeoff_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Payload of the `status` endpoint's response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PilotStatus {
    /// Server-assigned session identifier, re-sent on subsequent polls to
    /// keep the session alive.
    #[serde(default)]
    pub session_id: Option<String>,

    /// Current flight phase, when the vehicle reports one.
    #[serde(default)]
    pub flight_phase: Option<FlightPhase>,

    /// Every other field of the status response, kept as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Parameters of the `async_command` endpoint.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct AsyncCommand {
    pub command: &'static str,
}

/// Parameters of the `set_skill/{key}` endpoint.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SetSkill {
    pub args: serde_json::Map<String, serde_json::Value>,
}

/// Parameters of the `set_fault_override/{faultId}` endpoint.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct FaultOverride {
    pub override_on: bool,
    pub fault_active: bool,
}

/// Parameters of the `custom_comms` endpoint.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CommsRequest {
    pub data: String,
    pub skill_key: String,
    pub no_response: bool,
}

/// A skill's reply to a custom comms exchange.
#[derive(Debug, Clone)]
pub struct CommsReply {
    /// The payload encoded by the skill, base64-decoded. `None` when the
    /// reply carried no `data` field.
    pub data: Option<Vec<u8>>,

    /// Metadata fields of the reply, kept as-is.
    pub meta: serde_json::Map<String, serde_json::Value>,
}
impl CommsReply {
    /// Parses a reply from the raw `custom_comms` response payload.
    ///
    /// A `null` payload (the server acknowledged a `no_response` exchange)
    /// parses as `None`. A `data` field that is not valid base64 is a
    /// [`CommsError::Payload`] error.
    pub(crate) fn from_value(value: serde_json::Value) -> Result<Option<Self>, CommsError> {
        let mut meta = match value {
            serde_json::Value::Null => return Ok(None),
            serde_json::Value::Object(map) => map,
            other => {
                return Err(CommsError::Request(ClientError::bad_response(format!(
                    "custom_comms reply is not an object: {other}"
                ))));
            }
        };
        let data = match meta.remove("data") {
            Some(serde_json::Value::String(encoded)) => Some(
                BASE64_STANDARD
                    .decode(encoded.as_bytes())
                    .map_err(|err| CommsError::Payload {
                        message: err.to_string(),
                    })?,
            ),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => {
                return Err(CommsError::Payload {
                    message: format!("expected a base64 string, got {other}"),
                });
            }
        };
        Ok(Some(Self { data, meta }))
    }
}
