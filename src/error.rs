use crate::driver::{DriverError, TargetId};
use crate::process::TableError;
use thiserror::Error;

/// Error class of a [`GatewayError`], for callers that only care about the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    Connection,
    Device,
    SinkClosed,
    TaskAborted,
}

/// Errors surfaced by the gateway, per target or for a whole batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// Request rejected before any work started.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The driver could not open a session to the meter.
    #[error("connection to {target} failed: {reason}")]
    Connection { target: TargetId, reason: String },

    /// The meter (or its returned table) reported a nonzero status.
    #[error("device error {code} from {target}: {message}")]
    Device {
        target: TargetId,
        code: i32,
        message: String,
    },

    /// The result receiver went away before the reading could be delivered.
    #[error("result sink closed before reading from {target} was delivered")]
    SinkClosed { target: TargetId },

    /// The task for this target panicked or was torn down before finishing.
    #[error("task for {target} aborted before finishing")]
    TaskAborted { target: TargetId },
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            GatewayError::Connection { .. } => ErrorKind::Connection,
            GatewayError::Device { .. } => ErrorKind::Device,
            GatewayError::SinkClosed { .. } => ErrorKind::SinkClosed,
            GatewayError::TaskAborted { .. } => ErrorKind::TaskAborted,
        }
    }

    /// The meter this error belongs to, if it is a per-target error.
    pub fn target(&self) -> Option<&TargetId> {
        match self {
            GatewayError::InvalidArgument(_) => None,
            GatewayError::Connection { target, .. }
            | GatewayError::Device { target, .. }
            | GatewayError::SinkClosed { target }
            | GatewayError::TaskAborted { target } => Some(target),
        }
    }

    pub(crate) fn from_driver(target: &TargetId, err: DriverError) -> Self {
        match err {
            DriverError::Connection(reason) => GatewayError::Connection {
                target: target.clone(),
                reason,
            },
            DriverError::Device { code, message } => GatewayError::Device {
                target: target.clone(),
                code,
                message,
            },
        }
    }

    pub(crate) fn from_table(target: &TargetId, err: TableError) -> Self {
        GatewayError::Device {
            target: target.clone(),
            code: err.code,
            message: err.message,
        }
    }
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
