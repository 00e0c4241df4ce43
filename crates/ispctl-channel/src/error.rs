use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use ispctl_codec::CodecError;

/// Errors that can occur on a control channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Failed to open the video device node.
    #[error("failed to open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    /// Failed to start the transaction worker thread.
    #[error("failed to start transaction worker: {0}")]
    Worker(#[source] io::Error),

    /// The serialized request does not fit in the control buffer.
    ///
    /// Detected before any device call; the caller can shrink the payload
    /// or configure a larger capacity.
    #[error("request too large ({size} bytes, buffer capacity {capacity})")]
    SizeExceeded { size: usize, capacity: usize },

    /// An extended-control ioctl failed.
    #[error("{op} failed: {cause}: {source}")]
    Transport {
        op: &'static str,
        cause: TransportCause,
        source: io::Error,
    },

    /// The response bytes did not parse as the expected message shape.
    ///
    /// Not retried: the buffer is not self-describing enough to resync.
    #[error("protocol error: {0}")]
    Protocol(#[source] CodecError),

    /// The transaction did not complete within the configured limit.
    #[error("transaction timed out after {0:?}")]
    Timeout(Duration),

    /// An earlier timeout left the channel desynchronized.
    ///
    /// The worker may still be blocked inside an ioctl and the buffer state
    /// is no longer trustworthy; the only recovery is reopening the device.
    #[error("channel desynchronized by an earlier timeout; reopen the device")]
    Desynced,

    /// The transaction worker terminated unexpectedly.
    #[error("transaction worker terminated unexpectedly")]
    WorkerGone,
}

impl From<CodecError> for ChannelError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::PayloadTooLarge { size, capacity } => {
                ChannelError::SizeExceeded { size, capacity }
            }
            other => ChannelError::Protocol(other),
        }
    }
}

/// Classification of an ioctl failure by errno.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCause {
    /// The driver is temporarily busy (`EBUSY`/`EAGAIN`).
    Busy,
    /// This driver build does not support the control (`EINVAL`/`ENOTTY`).
    Unsupported,
    /// Insufficient permissions on the device node (`EACCES`/`EPERM`).
    PermissionDenied,
    /// Any other I/O failure.
    Io,
}

impl TransportCause {
    /// Classify an I/O error from an extended-control ioctl.
    pub fn classify(err: &io::Error) -> Self {
        match err.raw_os_error() {
            Some(code) if code == sys_errno::EBUSY || code == sys_errno::EAGAIN => {
                TransportCause::Busy
            }
            Some(code) if code == sys_errno::EINVAL || code == sys_errno::ENOTTY => {
                TransportCause::Unsupported
            }
            Some(code) if code == sys_errno::EACCES || code == sys_errno::EPERM => {
                TransportCause::PermissionDenied
            }
            _ => TransportCause::Io,
        }
    }
}

impl fmt::Display for TransportCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportCause::Busy => "device busy",
            TransportCause::Unsupported => "control unsupported by this driver",
            TransportCause::PermissionDenied => "permission denied",
            TransportCause::Io => "device I/O error",
        };
        f.write_str(name)
    }
}

#[cfg(unix)]
mod sys_errno {
    pub use libc::{EACCES, EAGAIN, EBUSY, EINVAL, ENOTTY, EPERM};
}

#[cfg(not(unix))]
mod sys_errno {
    pub const EACCES: i32 = 13;
    pub const EAGAIN: i32 = 11;
    pub const EBUSY: i32 = 16;
    pub const EINVAL: i32 = 22;
    pub const ENOTTY: i32 = 25;
    pub const EPERM: i32 = 1;
}

pub type Result<T> = std::result::Result<T, ChannelError>;
