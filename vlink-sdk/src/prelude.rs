//! The vlink SDK prelude

pub use crate::blocking::{Client, ConnectOptions};
pub use crate::error::{ClientError, CommsError};
pub use crate::poll::{CancelToken, PollPolicy};
pub use crate::rpc::{AccessLevel, CommsReply, FlightPhase, PilotStatus};
pub use crate::session::Session;
