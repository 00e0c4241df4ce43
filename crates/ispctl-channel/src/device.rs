use std::io;

/// Device-level seam for the two halves of an extended-control transaction.
///
/// The real implementation is [`VideoDevice`]; tests substitute fakes that
/// script driver behavior. Both calls take the whole control buffer: the set
/// side carries the zero-padded request, the get side is overwritten by the
/// driver with the zero-padded response.
pub trait ExtControlDevice: Send {
    /// Issue the "set extended control" call with `buf` as payload.
    ///
    /// This is the step that asks the driver to act on the request; for
    /// write-style operations the effect takes place here.
    fn set_control(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Issue the "get extended control" call, letting the driver overwrite
    /// `buf` with its response.
    fn get_control(&mut self, buf: &mut [u8]) -> io::Result<()>;
}

#[cfg(unix)]
pub use real::VideoDevice;

#[cfg(unix)]
mod real {
    use std::ffi::CString;
    use std::io;
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    use tracing::debug;

    use super::ExtControlDevice;
    use crate::sys;

    /// An exclusively owned open video device node.
    ///
    /// Opened read-write and non-blocking (the ext-control ioctls are
    /// synchronous regardless); closed when dropped.
    pub struct VideoDevice {
        fd: OwnedFd,
        ctrl_id: u32,
    }

    impl VideoDevice {
        /// Open the device node at `path` for extended-control access.
        pub fn open(path: &Path, ctrl_id: u32) -> io::Result<Self> {
            let c_path = CString::new(path.as_os_str().as_bytes())
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL"))?;

            // SAFETY: `c_path` is a valid NUL-terminated string for the
            // duration of the call.
            let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_RDWR | libc::O_NONBLOCK) };
            if fd < 0 {
                return Err(io::Error::last_os_error());
            }

            debug!(path = %path.display(), fd, "opened video device");

            // SAFETY: `fd` is a freshly opened descriptor owned by nobody else.
            let fd = unsafe { OwnedFd::from_raw_fd(fd) };
            Ok(Self { fd, ctrl_id })
        }

        /// The control id this device addresses.
        pub fn ctrl_id(&self) -> u32 {
            self.ctrl_id
        }

        fn ext_ctrl_ioctl(&mut self, request: libc::c_ulong, buf: &mut [u8]) -> io::Result<()> {
            let mut ctrl = sys::v4l2_ext_control {
                id: self.ctrl_id,
                size: buf.len() as u32,
                reserved2: [0],
                value: sys::v4l2_ext_control_value {
                    string: buf.as_mut_ptr().cast(),
                },
            };
            let mut ctrls = sys::v4l2_ext_controls {
                ctrl_class: sys::V4L2_CTRL_CLASS_USER,
                count: 1,
                error_idx: 0,
                request_fd: 0,
                reserved: [0],
                controls: &mut ctrl,
            };

            // SAFETY: `ctrls` points at exactly one control whose payload
            // pointer covers `buf` for the duration of the call; the fd is
            // open and owned by this process.
            let rc = unsafe { libc::ioctl(self.fd.as_raw_fd(), request, &mut ctrls) };
            if rc < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }
    }

    impl ExtControlDevice for VideoDevice {
        fn set_control(&mut self, buf: &mut [u8]) -> io::Result<()> {
            self.ext_ctrl_ioctl(sys::VIDIOC_S_EXT_CTRLS, buf)
        }

        fn get_control(&mut self, buf: &mut [u8]) -> io::Result<()> {
            self.ext_ctrl_ioctl(sys::VIDIOC_G_EXT_CTRLS, buf)
        }
    }

    impl std::fmt::Debug for VideoDevice {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("VideoDevice")
                .field("fd", &self.fd.as_raw_fd())
                .field("ctrl_id", &format_args!("{:#x}", self.ctrl_id))
                .finish()
        }
    }
}
