//! Boundary to the external meter driver.
//!
//! The driver owns the wire protocol, the security handshake and any retrying.
//! The gateway only needs three blocking calls from it: open a session, read one
//! register set into a [`RawTable`], close the session.

pub mod session;
pub mod simulated;
pub mod target;

pub use session::SessionGuard;
pub use simulated::{DriverStats, Script, SimulatedDriver};
pub use target::{ConnectionOptions, Credentials, Target, TargetId};

use crate::process::RawTable;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    /// Session could not be established (timeout, refusal, handshake failure).
    #[error("connection failed: {0}")]
    Connection(String),

    /// The meter answered the read with a nonzero status.
    #[error("device error {code}: {message}")]
    Device { code: i32, message: String },
}

/// Capability the gateway needs from a meter driver.
///
/// Calls block on network I/O; the gateway runs them on the blocking pool.
pub trait MeterDriver: Send + Sync + 'static {
    type Session: Send;

    fn connect(
        &self,
        target: &Target,
        options: &ConnectionOptions,
    ) -> Result<Self::Session, DriverError>;

    fn read(&self, session: &mut Self::Session, register_code: &str)
        -> Result<RawTable, DriverError>;

    fn close(&self, session: Self::Session);
}
