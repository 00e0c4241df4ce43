//! Minimal V4L2 extended-control ABI, as declared in `linux/videodev2.h`.
//!
//! Only the two ioctls and structs the control channel needs. Struct layout
//! notes: `v4l2_ext_control` is declared `__attribute__((packed))` in the
//! kernel header; `v4l2_ext_controls` is not.

#![allow(non_camel_case_types)]

use std::mem::size_of;
use std::os::raw::c_char;

/// Control class for user controls (`V4L2_CTRL_CLASS_USER`).
pub const V4L2_CTRL_CLASS_USER: u32 = 0x0098_0000;

/// Vendor-private VIV ISP control carrying the JSON payload.
///
/// Driver-specific; override via `ChannelConfig::ctrl_id` on hardware that
/// registers the control under a different id.
pub const VIV_EXT_CTRL_ID: u32 = 0x0098_F901;

#[repr(C)]
pub union v4l2_ext_control_value {
    pub value: i32,
    pub value64: i64,
    pub string: *mut c_char,
}

#[repr(C, packed)]
pub struct v4l2_ext_control {
    pub id: u32,
    pub size: u32,
    pub reserved2: [u32; 1],
    pub value: v4l2_ext_control_value,
}

#[repr(C)]
pub struct v4l2_ext_controls {
    pub ctrl_class: u32,
    pub count: u32,
    pub error_idx: u32,
    pub request_fd: i32,
    pub reserved: [u32; 1],
    pub controls: *mut v4l2_ext_control,
}

// _IOWR encoding: dir(2) | size(14) | type(8) | nr(8), from asm-generic/ioctl.h.
const IOC_NRSHIFT: libc::c_ulong = 0;
const IOC_TYPESHIFT: libc::c_ulong = 8;
const IOC_SIZESHIFT: libc::c_ulong = 16;
const IOC_DIRSHIFT: libc::c_ulong = 30;
const IOC_READ: libc::c_ulong = 2;
const IOC_WRITE: libc::c_ulong = 1;

const fn iowr(ty: u8, nr: u8, size: usize) -> libc::c_ulong {
    ((IOC_READ | IOC_WRITE) << IOC_DIRSHIFT)
        | ((size as libc::c_ulong) << IOC_SIZESHIFT)
        | ((ty as libc::c_ulong) << IOC_TYPESHIFT)
        | ((nr as libc::c_ulong) << IOC_NRSHIFT)
}

/// Read extended controls.
pub const VIDIOC_G_EXT_CTRLS: libc::c_ulong = iowr(b'V', 71, size_of::<v4l2_ext_controls>());
/// Write extended controls.
pub const VIDIOC_S_EXT_CTRLS: libc::c_ulong = iowr(b'V', 72, size_of::<v4l2_ext_controls>());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ext_control_is_packed() {
        // id(4) + size(4) + reserved2(4) + union(8), no padding.
        assert_eq!(size_of::<v4l2_ext_control>(), 20);
    }

    #[test]
    fn ext_controls_layout_matches_kernel() {
        #[cfg(target_pointer_width = "64")]
        assert_eq!(size_of::<v4l2_ext_controls>(), 32);
        #[cfg(target_pointer_width = "32")]
        assert_eq!(size_of::<v4l2_ext_controls>(), 24);
    }

    #[test]
    fn ioctl_numbers_use_v_type() {
        assert_eq!((VIDIOC_G_EXT_CTRLS >> 8) & 0xFF, b'V' as libc::c_ulong);
        assert_eq!(VIDIOC_G_EXT_CTRLS & 0xFF, 71);
        assert_eq!(VIDIOC_S_EXT_CTRLS & 0xFF, 72);
    }
}
