//! Write-then-read V4L2 extended-control transaction channel.
//!
//! The VIV ISP driver multiplexes every configuration operation through a
//! single vendor-private extended control: the caller writes a JSON request
//! into the control's payload buffer with `VIDIOC_S_EXT_CTRLS`, then reads
//! the driver's JSON response back out of the *same* buffer with
//! `VIDIOC_G_EXT_CTRLS`. The two ioctls are one logical transaction; a
//! second request interleaved between them would silently corrupt the first
//! caller's response.
//!
//! [`ControlChannel`] models the pair as a single [`transact`] operation and
//! never exposes the halves separately.
//!
//! [`transact`]: ControlChannel::transact

pub mod channel;
pub mod device;
pub mod error;
#[cfg(unix)]
pub mod sys;

pub use channel::{ChannelConfig, ControlChannel};
pub use device::ExtControlDevice;
#[cfg(unix)]
pub use device::VideoDevice;
pub use error::{ChannelError, Result, TransportCause};
