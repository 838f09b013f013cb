//! # The vlink SDK
//! The vlink SDK provides an interface to a vehicle's onboard HTTP skill API:
//! authenticating a session, polling pilot status, driving takeoff and landing,
//! switching the active skill and exchanging opaque payloads with it.

pub mod blocking;
pub mod error;
pub mod poll;
pub mod prelude;
pub mod rpc;
pub mod session;

#[cfg(feature = "camera")]
pub mod frame;

pub use error::ClientError as Error;
