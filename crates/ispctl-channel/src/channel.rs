use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use ispctl_codec::{fill, trim_padding, MessageCodec, DEFAULT_CAPACITY};

use crate::device::ExtControlDevice;
use crate::error::{ChannelError, Result, TransportCause};
#[cfg(unix)]
use crate::device::VideoDevice;
#[cfg(unix)]
use crate::sys::VIV_EXT_CTRL_ID;

/// Configuration for a control channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Vendor-private control id addressed by every transaction.
    pub ctrl_id: u32,
    /// Control buffer capacity in bytes. Default: 64 KiB.
    pub capacity: usize,
    /// Per-transaction time limit. `None` (the default) blocks forever,
    /// which matches the driver's own lack of a completion deadline.
    pub transact_timeout: Option<Duration>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            #[cfg(unix)]
            ctrl_id: VIV_EXT_CTRL_ID,
            #[cfg(not(unix))]
            ctrl_id: 0x0098_F901,
            capacity: DEFAULT_CAPACITY,
            transact_timeout: None,
        }
    }
}

enum WorkerCommand {
    Transact(Vec<u8>),
    Shutdown,
}

type WorkerReply = Result<Vec<u8>>;

/// One atomic-from-the-caller's-view transaction pipe to the ISP driver.
///
/// Owns the device handle and the control buffer exclusively. The `&mut
/// self` receiver on [`transact`] is the scoped exclusive-access guarantee
/// the protocol requires: at most one transaction can be in flight per
/// channel, and the set/get ioctl pair can never interleave with another
/// caller's. Share a channel across threads by wrapping it in a `Mutex` and
/// holding the guard for the whole call.
///
/// The device calls run on a dedicated worker thread so that a configured
/// [`ChannelConfig::transact_timeout`] can bound an otherwise uncancellable
/// blocking ioctl.
///
/// [`transact`]: ControlChannel::transact
pub struct ControlChannel {
    commands: mpsc::Sender<WorkerCommand>,
    replies: mpsc::Receiver<WorkerReply>,
    codec: MessageCodec,
    timeout: Option<Duration>,
    desynced: bool,
    worker: Option<thread::JoinHandle<()>>,
}

impl ControlChannel {
    /// Open the video device at `path` with the default configuration.
    #[cfg(unix)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, ChannelConfig::default())
    }

    /// Open the video device at `path` with an explicit configuration.
    #[cfg(unix)]
    pub fn open_with_config(path: impl AsRef<Path>, config: ChannelConfig) -> Result<Self> {
        let path = path.as_ref();
        let device = VideoDevice::open(path, config.ctrl_id).map_err(|source| {
            ChannelError::Open {
                path: path.to_path_buf(),
                source,
            }
        })?;
        debug!(path = %path.display(), capacity = config.capacity, "control channel open");
        Self::spawn(Box::new(device), config, true)
    }

    /// Build a channel over any [`ExtControlDevice`] implementation.
    ///
    /// No warm-up read is issued; this is the constructor test fakes use.
    pub fn with_device(
        device: impl ExtControlDevice + 'static,
        config: ChannelConfig,
    ) -> Result<Self> {
        Self::spawn(Box::new(device), config, false)
    }

    fn spawn(
        mut device: Box<dyn ExtControlDevice>,
        config: ChannelConfig,
        warm_up: bool,
    ) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel::<WorkerCommand>();
        let (reply_tx, reply_rx) = mpsc::channel::<WorkerReply>();
        let capacity = config.capacity;

        let worker = thread::Builder::new()
            .name("ispctl-transact".into())
            .spawn(move || {
                let mut buf = vec![0u8; capacity];

                if warm_up {
                    // Best-effort descriptor warm-up. Some driver builds
                    // reject the control until a request has been set at
                    // least once, so a failure here is not fatal.
                    if let Err(err) = device.get_control(&mut buf) {
                        debug!(error = %err, "warm-up read rejected");
                    }
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        WorkerCommand::Shutdown => break,
                        WorkerCommand::Transact(payload) => {
                            let reply = run_transaction(device.as_mut(), &mut buf, &payload);
                            if reply_tx.send(reply).is_err() {
                                break;
                            }
                        }
                    }
                }
            })
            .map_err(ChannelError::Worker)?;

        Ok(Self {
            commands: command_tx,
            replies: reply_rx,
            codec: MessageCodec::new(capacity),
            timeout: config.transact_timeout,
            desynced: false,
            worker: Some(worker),
        })
    }

    /// The control buffer capacity.
    pub fn capacity(&self) -> usize {
        self.codec.capacity()
    }

    /// Perform one write-then-read transaction.
    ///
    /// Serializes `request`, fails fast with [`ChannelError::SizeExceeded`]
    /// before any device call if it would not fit, then issues set followed
    /// by get in strict program order and decodes whatever the driver left
    /// in the buffer.
    ///
    /// The get completing without error does *not* imply a write-style
    /// request took effect; only fields present in the decoded response
    /// confirm state.
    pub fn transact<Req, Resp>(&mut self, request: &Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let payload = self.codec.encode(request)?;
        let response = self.transact_raw(payload)?;
        self.codec.decode(&response).map_err(ChannelError::from)
    }

    fn transact_raw(&mut self, payload: Vec<u8>) -> Result<Vec<u8>> {
        if self.desynced {
            return Err(ChannelError::Desynced);
        }

        debug!(request_len = payload.len(), "transact");
        self.commands
            .send(WorkerCommand::Transact(payload))
            .map_err(|_| ChannelError::WorkerGone)?;

        match self.timeout {
            None => self.replies.recv().map_err(|_| ChannelError::WorkerGone)?,
            Some(limit) => match self.replies.recv_timeout(limit) {
                Ok(reply) => reply,
                Err(RecvTimeoutError::Timeout) => {
                    // The worker may still be blocked inside the ioctl and
                    // will eventually write a response nobody consumes; the
                    // buffer state is no longer trustworthy.
                    self.desynced = true;
                    warn!(timeout = ?limit, "transaction timed out; channel desynchronized");
                    Err(ChannelError::Timeout(limit))
                }
                Err(RecvTimeoutError::Disconnected) => Err(ChannelError::WorkerGone),
            },
        }
    }
}

impl Drop for ControlChannel {
    fn drop(&mut self) {
        let _ = self.commands.send(WorkerCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            if self.desynced {
                // The worker might be stuck in an ioctl; joining could hang
                // forever. Let the thread finish on its own.
                return;
            }
            let _ = worker.join();
        }
    }
}

fn run_transaction(
    device: &mut dyn ExtControlDevice,
    buf: &mut [u8],
    payload: &[u8],
) -> Result<Vec<u8>> {
    fill(payload, buf);

    device
        .set_control(buf)
        .map_err(|source| ChannelError::Transport {
            op: "set ext control",
            cause: TransportCause::classify(&source),
            source,
        })?;

    device
        .get_control(buf)
        .map_err(|source| ChannelError::Transport {
            op: "get ext control",
            cause: TransportCause::classify(&source),
            source,
        })?;

    Ok(trim_padding(buf).to_vec())
}
