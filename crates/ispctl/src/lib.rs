//! VIV ISP feature control for i.MX camera pipelines.
//!
//! ispctl drives the JSON control interface some i.MX ISP drivers expose
//! through one vendor-private V4L2 extended control: requests go in with
//! `VIDIOC_S_EXT_CTRLS`, responses come back out of the same buffer with
//! `VIDIOC_G_EXT_CTRLS`.
//!
//! # Crate Structure
//!
//! - [`codec`]: size-aware JSON codec for the fixed-capacity control buffer
//! - [`channel`]: the write-then-read transaction channel over the device
//! - [`client`]: typed feature operations (AEC, AWB, white balance, dewarp)

/// Re-export codec types.
pub mod codec {
    pub use ispctl_codec::*;
}

/// Re-export channel types.
pub mod channel {
    pub use ispctl_channel::*;
}

/// Re-export client types.
pub mod client {
    pub use ispctl_client::*;
}
