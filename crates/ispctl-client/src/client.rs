use std::path::Path;

use serde_json::Value;
use tracing::debug;

use ispctl_channel::{ChannelConfig, ControlChannel};

use crate::error::{ClientError, Result};
use crate::message::{
    identity_matrix, ColorOffset, DewarpFlags, DewarpReply, EnableReply, Request, WbConfig,
    WbGains, DEFAULT_STREAM_ID,
};

/// Tolerance used when verifying written gains against the driver's echo.
const GAIN_EPSILON: f64 = 1e-3;

/// Typed, validated feature operations on top of a [`ControlChannel`].
///
/// Every read re-queries the driver; nothing is cached, so there is no
/// local-state/driver-state divergence to reconcile. Writes discard the
/// driver's echo unless [`with_verify_writes`] is enabled, in which case
/// each write is confirmed by an immediate re-read.
///
/// [`with_verify_writes`]: FeatureClient::with_verify_writes
pub struct FeatureClient {
    channel: ControlChannel,
    stream_id: u32,
    verify_writes: bool,
}

impl FeatureClient {
    /// Open the video device at `path` with default channel configuration.
    #[cfg(unix)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_channel(ControlChannel::open(path)?))
    }

    /// Open the video device at `path` with an explicit channel configuration.
    #[cfg(unix)]
    pub fn open_with_config(path: impl AsRef<Path>, config: ChannelConfig) -> Result<Self> {
        Ok(Self::from_channel(ControlChannel::open_with_config(
            path, config,
        )?))
    }

    /// Build a client over an already-open channel.
    pub fn from_channel(channel: ControlChannel) -> Self {
        Self {
            channel,
            stream_id: DEFAULT_STREAM_ID,
            verify_writes: false,
        }
    }

    /// Address a different ISP output stream.
    pub fn with_stream_id(mut self, stream_id: u32) -> Self {
        self.stream_id = stream_id;
        self
    }

    /// Confirm every write by re-reading the feature afterwards.
    ///
    /// Off by default: the stock protocol trusts the driver and treats the
    /// echo as opaque.
    pub fn with_verify_writes(mut self, verify: bool) -> Self {
        self.verify_writes = verify;
        self
    }

    /// Whether auto-exposure is currently enabled.
    pub fn aec_enabled(&mut self) -> Result<bool> {
        let reply: EnableReply = self.channel.transact(&Request::AecGetEnable {
            streamid: self.stream_id,
        })?;
        Ok(reply.enable)
    }

    /// Enable or disable auto-exposure.
    pub fn set_aec_enabled(&mut self, enable: bool) -> Result<()> {
        self.write(&Request::AecSetEnable {
            streamid: self.stream_id,
            enable,
        })?;
        if self.verify_writes {
            let actual = self.aec_enabled()?;
            if actual != enable {
                return Err(verify_failed("set AEC enable", enable, actual));
            }
        }
        Ok(())
    }

    /// Whether auto-white-balance is currently enabled.
    pub fn awb_enabled(&mut self) -> Result<bool> {
        let reply: EnableReply = self.channel.transact(&Request::AwbGetEnable {
            streamid: self.stream_id,
        })?;
        Ok(reply.enable)
    }

    /// Enable or disable auto-white-balance.
    pub fn set_awb_enabled(&mut self, enable: bool) -> Result<()> {
        self.write(&Request::AwbSetEnable {
            streamid: self.stream_id,
            enable,
        })?;
        if self.verify_writes {
            let actual = self.awb_enabled()?;
            if actual != enable {
                return Err(verify_failed("set AWB enable", enable, actual));
            }
        }
        Ok(())
    }

    /// Read the full white-balance configuration.
    pub fn wb_config(&mut self) -> Result<WbConfig> {
        let config: WbConfig = self.channel.transact(&Request::WbGetConfig {
            streamid: self.stream_id,
        })?;
        Ok(config)
    }

    /// Write manual white-balance gains.
    ///
    /// The color-correction matrix is pinned to identity and the offsets to
    /// zero; only the gains are meaningfully varied by this protocol.
    pub fn set_wb_gains(&mut self, gains: WbGains) -> Result<()> {
        self.write(&Request::WbSetConfig {
            streamid: self.stream_id,
            matrix: identity_matrix(),
            offset: ColorOffset::default(),
            gains,
        })?;
        if self.verify_writes {
            let actual = self.wb_config()?.gains;
            if !gains.approx_eq(&actual, GAIN_EPSILON) {
                return Err(ClientError::VerifyFailed {
                    op: "set WB gains",
                    expected: format!("{gains:?}"),
                    actual: format!("{actual:?}"),
                });
            }
        }
        Ok(())
    }

    /// Whether lens-distortion correction is currently bypassed.
    pub fn dewarp_bypassed(&mut self) -> Result<bool> {
        let reply: DewarpReply = self.channel.transact(&Request::DewarpGetParams {
            streamid: self.stream_id,
        })?;
        Ok(reply.dwe.bypass)
    }

    /// Set or clear the dewarp bypass flag.
    pub fn set_dewarp_bypass(&mut self, bypass: bool) -> Result<()> {
        self.write(&Request::DewarpSetBypass {
            streamid: self.stream_id,
            dwe: DewarpFlags { bypass },
        })?;
        if self.verify_writes {
            let actual = self.dewarp_bypassed()?;
            if actual != bypass {
                return Err(verify_failed("set dewarp bypass", bypass, actual));
            }
        }
        Ok(())
    }

    /// Query sensor capabilities. The reply schema is driver-defined and
    /// deliberately left unvalidated.
    pub fn sensor_caps(&mut self) -> Result<Value> {
        let caps: Value = self.channel.transact(&Request::SensorQuery {
            streamid: self.stream_id,
        })?;
        Ok(caps)
    }

    /// Issue a write-style request and discard the echo.
    ///
    /// The echo still has to parse: the get half completing is the only
    /// signal the transaction ran, and an unparseable echo means the buffer
    /// holds something other than what this transaction produced.
    fn write(&mut self, request: &Request) -> Result<()> {
        debug!(?request, "feature write");
        let _echo: Value = self.channel.transact(request)?;
        Ok(())
    }
}

fn verify_failed(op: &'static str, expected: bool, actual: bool) -> ClientError {
    ClientError::VerifyFailed {
        op,
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    use serde_json::json;

    use ispctl_channel::{ChannelError, ExtControlDevice, TransportCause};
    use ispctl_codec::trim_padding;

    const EINVAL: i32 = 22;

    /// Scripted stand-in for the VIV driver: parses the request on set,
    /// updates its feature state, and leaves the response for the get half
    /// to copy back into the shared buffer.
    struct FakeIspDevice {
        aec: bool,
        awb: bool,
        dwe_bypass: bool,
        gains: Value,
        /// When set, writes are accepted but silently dropped.
        ignore_writes: bool,
        pending: Vec<u8>,
    }

    impl FakeIspDevice {
        fn new() -> Self {
            Self {
                aec: true,
                awb: true,
                dwe_bypass: false,
                gains: json!({"red": 1.0, "green.r": 1.0, "green.b": 1.0, "blue": 1.0}),
                ignore_writes: false,
                pending: Vec::new(),
            }
        }

        fn dispatch(&mut self, request: Value) -> io::Result<Value> {
            let id = request["id"].as_str().unwrap_or_default().to_string();
            match id.as_str() {
                "ae.g.en" => Ok(json!({"id": id, "streamid": 0, "enable": self.aec})),
                "ae.s.en" => {
                    if !self.ignore_writes {
                        self.aec = request["enable"].as_bool().unwrap_or(self.aec);
                    }
                    Ok(request)
                }
                "awb.g.en" => Ok(json!({"id": id, "streamid": 0, "enable": self.awb})),
                "awb.s.en" => {
                    if !self.ignore_writes {
                        self.awb = request["enable"].as_bool().unwrap_or(self.awb);
                    }
                    Ok(request)
                }
                "wb.g.cfg" => Ok(json!({
                    "matrix": [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
                    "offset": {"red": 0.0, "green": 0.0, "blue": 0.0},
                    "wb.gains": self.gains,
                })),
                "wb.s.cfg" => {
                    if !self.ignore_writes {
                        self.gains = request["wb.gains"].clone();
                    }
                    Ok(request)
                }
                "dwe.g.params" => Ok(json!({"dwe": {"bypass": self.dwe_bypass}})),
                "dwe.s.bypass" => {
                    if !self.ignore_writes {
                        self.dwe_bypass =
                            request["dwe"]["bypass"].as_bool().unwrap_or(self.dwe_bypass);
                    }
                    Ok(request)
                }
                "sensor.query" => Ok(json!({
                    "id": id,
                    "streamid": 0,
                    "sensor": {"name": "fake-sensor", "modes": [{"width": 4032, "height": 3040}]},
                })),
                _ => Err(io::Error::from_raw_os_error(EINVAL)),
            }
        }
    }

    impl ExtControlDevice for FakeIspDevice {
        fn set_control(&mut self, buf: &mut [u8]) -> io::Result<()> {
            let request: Value = serde_json::from_slice(trim_padding(buf))
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let response = self.dispatch(request)?;
            self.pending = serde_json::to_vec(&response)?;
            Ok(())
        }

        fn get_control(&mut self, buf: &mut [u8]) -> io::Result<()> {
            buf.fill(0);
            buf[..self.pending.len()].copy_from_slice(&self.pending);
            Ok(())
        }
    }

    fn client_over(device: FakeIspDevice) -> FeatureClient {
        let channel =
            ControlChannel::with_device(device, ChannelConfig::default()).expect("spawn channel");
        FeatureClient::from_channel(channel)
    }

    #[test]
    fn aec_set_then_get_roundtrip() {
        let mut client = client_over(FakeIspDevice::new());

        client.set_aec_enabled(false).unwrap();
        assert!(!client.aec_enabled().unwrap());

        client.set_aec_enabled(true).unwrap();
        assert!(client.aec_enabled().unwrap());

        // Setting twice is idempotent.
        client.set_aec_enabled(true).unwrap();
        assert!(client.aec_enabled().unwrap());
    }

    #[test]
    fn awb_and_dewarp_roundtrip() {
        let mut client = client_over(FakeIspDevice::new());

        client.set_awb_enabled(false).unwrap();
        assert!(!client.awb_enabled().unwrap());

        client.set_dewarp_bypass(true).unwrap();
        assert!(client.dewarp_bypassed().unwrap());

        client.set_dewarp_bypass(false).unwrap();
        assert!(!client.dewarp_bypassed().unwrap());
    }

    #[test]
    fn manual_wb_gains_roundtrip() {
        let mut client = client_over(FakeIspDevice::new());

        client
            .set_wb_gains(WbGains {
                red: 1.2,
                green_r: 1.0,
                green_b: 1.0,
                blue: 0.9,
            })
            .unwrap();

        let config = client.wb_config().unwrap();
        assert_eq!(config.gains.red, 1.2);
        assert_eq!(config.gains.blue, 0.9);
        assert_eq!(config.matrix, identity_matrix());
    }

    #[test]
    fn sensor_caps_pass_through_unvalidated() {
        let mut client = client_over(FakeIspDevice::new());
        let caps = client.sensor_caps().unwrap();
        assert_eq!(caps["sensor"]["name"], "fake-sensor");
    }

    #[test]
    fn unsupported_operation_is_transport_error() {
        struct RejectingDevice;
        impl ExtControlDevice for RejectingDevice {
            fn set_control(&mut self, _buf: &mut [u8]) -> io::Result<()> {
                Err(io::Error::from_raw_os_error(EINVAL))
            }
            fn get_control(&mut self, _buf: &mut [u8]) -> io::Result<()> {
                Ok(())
            }
        }

        let channel =
            ControlChannel::with_device(RejectingDevice, ChannelConfig::default()).unwrap();
        let mut client = FeatureClient::from_channel(channel);

        let result = client.aec_enabled();
        assert!(matches!(
            result,
            Err(ClientError::Channel(ChannelError::Transport {
                cause: TransportCause::Unsupported,
                ..
            }))
        ));
    }

    #[test]
    fn missing_reply_field_is_protocol_error() {
        struct EmptyObjectDevice;
        impl ExtControlDevice for EmptyObjectDevice {
            fn set_control(&mut self, _buf: &mut [u8]) -> io::Result<()> {
                Ok(())
            }
            fn get_control(&mut self, buf: &mut [u8]) -> io::Result<()> {
                buf.fill(0);
                buf[..2].copy_from_slice(b"{}");
                Ok(())
            }
        }

        let channel =
            ControlChannel::with_device(EmptyObjectDevice, ChannelConfig::default()).unwrap();
        let mut client = FeatureClient::from_channel(channel);

        let result = client.aec_enabled();
        assert!(matches!(
            result,
            Err(ClientError::Channel(ChannelError::Protocol(_)))
        ));
    }

    #[test]
    fn verify_mode_catches_ignored_writes() {
        let mut device = FakeIspDevice::new();
        device.ignore_writes = true;
        let mut client = client_over(device).with_verify_writes(true);

        let result = client.set_aec_enabled(false);
        assert!(matches!(result, Err(ClientError::VerifyFailed { .. })));

        let result = client.set_wb_gains(WbGains {
            red: 1.5,
            ..WbGains::balanced()
        });
        assert!(matches!(result, Err(ClientError::VerifyFailed { .. })));
    }

    #[test]
    fn verify_mode_accepts_honest_driver() {
        let mut client = client_over(FakeIspDevice::new()).with_verify_writes(true);

        client.set_awb_enabled(false).unwrap();
        client
            .set_wb_gains(WbGains {
                red: 1.2,
                green_r: 1.0,
                green_b: 1.0,
                blue: 0.9,
            })
            .unwrap();
        client.set_dewarp_bypass(true).unwrap();
    }

    #[test]
    fn stream_id_is_carried_on_requests() {
        struct StreamAssertingDevice {
            pending: Vec<u8>,
        }
        impl ExtControlDevice for StreamAssertingDevice {
            fn set_control(&mut self, buf: &mut [u8]) -> io::Result<()> {
                let request: Value = serde_json::from_slice(trim_padding(buf)).unwrap();
                assert_eq!(request["streamid"], 2);
                self.pending =
                    serde_json::to_vec(&json!({"enable": true})).unwrap();
                Ok(())
            }
            fn get_control(&mut self, buf: &mut [u8]) -> io::Result<()> {
                buf.fill(0);
                buf[..self.pending.len()].copy_from_slice(&self.pending);
                Ok(())
            }
        }

        let channel = ControlChannel::with_device(
            StreamAssertingDevice { pending: Vec::new() },
            ChannelConfig::default(),
        )
        .unwrap();
        let mut client = FeatureClient::from_channel(channel).with_stream_id(2);
        assert!(client.aec_enabled().unwrap());
    }
}
