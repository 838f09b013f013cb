//! Vehicle command helpers.

use super::Client;
use crate::{
    error::{ClientError, CommsError},
    poll::{CancelToken, PollPolicy},
    rpc::{
        AccessLevel, AsyncCommand, CommsReply, CommsRequest, FaultOverride, FlightPhase,
        PilotStatus, SetSkill, StatusRequest,
    },
};
use base64::prelude::*;
use tracing::{debug, info};

/// Fault codes raised when no phone is connected via UDP. Overridden before
/// takeoff so a phoneless pilot session can fly.
const PHONE_COMMS_FAULTS: [(&str, u32); 2] = [
    ("LOST_PHONE_COMMS_SHORT", 2),
    ("LOST_PHONE_COMMS_LONG", 3),
];

impl Client {
    /// Pings the vehicle to keep the session alive and returns its status.
    ///
    /// The server-assigned session id is stored and re-sent on every
    /// subsequent poll.
    pub fn update_pilot_status(&mut self) -> Result<PilotStatus, ClientError> {
        let request = StatusRequest {
            would_accept_pilot: true,
            in_foreground: true,
            media_mode: "FLIGHT_CONTROL",
            takeoff_type: "GROUND_TAKEOFF",
            session_id: self.session().session_id.clone(),
        };
        let status: PilotStatus = self.invoke("status", Some(&request))?;
        if let Some(session_id) = &status.session_id {
            self.session_mut().session_id = Some(session_id.clone());
        }
        Ok(status)
    }

    /// Sends opaque bytes to a skill and returns its decoded reply.
    ///
    /// The payload is base64-encoded for transport and the reply's `data`
    /// field is decoded on the way back. Failures stay behind the dedicated
    /// [`CommsError`] boundary: a failed exchange leaves the session intact.
    pub fn send_custom_comms(
        &mut self,
        skill_key: &str,
        data: &[u8],
        no_response: bool,
    ) -> Result<Option<CommsReply>, CommsError> {
        let request = CommsRequest {
            data: BASE64_STANDARD.encode(data),
            skill_key: skill_key.to_owned(),
            no_response,
        };
        let reply = self.request_json("custom_comms", Some(&request))?;
        CommsReply::from_value(reply)
    }

    /// Requests takeoff and polls until the vehicle is flying.
    ///
    /// Requires pilot access; without it, no network request is issued.
    /// Status is refreshed and the phone-comms faults are overridden first,
    /// then the status endpoint is polled once per `policy.interval`. The
    /// `ground_takeoff` command is issued exactly once, when the vehicle
    /// first reports `READY_FOR_GROUND_TAKEOFF`. Returns on `FLYING`, or
    /// earlier with a typed error when the policy's deadline expires or the
    /// token is cancelled.
    pub fn takeoff(&mut self, policy: &PollPolicy, cancel: &CancelToken) -> Result<(), ClientError> {
        self.require_pilot()?;

        self.update_pilot_status()?;
        self.disable_faults()?;

        let deadline = policy.deadline_from_now();
        let mut commanded = false;
        loop {
            // downsample to prevent spamming the endpoint
            policy.pause(cancel, deadline)?;
            let Some(phase) = self.update_pilot_status()?.flight_phase else {
                continue;
            };
            debug!(?phase, "flight phase");
            match phase {
                FlightPhase::ReadyForGroundTakeoff if !commanded => {
                    info!("publishing ground takeoff");
                    self.async_command("ground_takeoff")?;
                    commanded = true;
                }
                FlightPhase::Flying => {
                    info!("flying");
                    return Ok(());
                }
                _ => {}
            }
        }
    }

    /// Lands the vehicle, polling until it is no longer flying.
    ///
    /// Requires pilot access. The `land` command is re-issued on every
    /// iteration until the reported phase leaves `FLYING`; the same deadline
    /// and cancellation semantics as [`Client::takeoff`] apply.
    pub fn land(&mut self, policy: &PollPolicy, cancel: &CancelToken) -> Result<(), ClientError> {
        self.require_pilot()?;

        let deadline = policy.deadline_from_now();
        loop {
            info!("sending land");
            self.async_command("land")?;
            policy.pause(cancel, deadline)?;
            match self.update_pilot_status()?.flight_phase {
                Some(FlightPhase::Flying) | None => continue,
                Some(phase) => {
                    debug!(?phase, "landed");
                    return Ok(());
                }
            }
        }
    }

    /// Requests a specific skill to be active. Requires pilot access.
    pub fn set_skill(&mut self, skill_key: &str) -> Result<serde_json::Value, ClientError> {
        self.require_pilot()?;
        info!(skill_key, "requesting skill");
        self.request_json(
            &format!("set_skill/{skill_key}"),
            Some(&SetSkill {
                args: serde_json::Map::new(),
            }),
        )
    }

    /// Tells the vehicle to ignore missing phone info.
    ///
    /// Issued regardless of the granted access level.
    pub fn disable_faults(&mut self) -> Result<(), ClientError> {
        for (name, fault_id) in PHONE_COMMS_FAULTS {
            debug!(fault = name, fault_id, "overriding fault");
            self.request_json(
                &format!("set_fault_override/{fault_id}"),
                Some(&FaultOverride {
                    override_on: true,
                    fault_active: false,
                }),
            )?;
        }
        Ok(())
    }

    fn async_command(&mut self, command: &'static str) -> Result<(), ClientError> {
        self.request_json("async_command", Some(&AsyncCommand { command }))?;
        Ok(())
    }

    fn require_pilot(&self) -> Result<(), ClientError> {
        match self.session().access_level {
            AccessLevel::Pilot => Ok(()),
            granted => Err(ClientError::PilotRequired { granted }),
        }
    }
}
