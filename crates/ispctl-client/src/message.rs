use serde::{Deserialize, Serialize};

/// Stream index carried on every request. The driver currently only serves
/// stream 0; the field is reserved for multi-stream addressing.
pub const DEFAULT_STREAM_ID: u32 = 0;

/// Every request the driver understands, tagged by its `id` selector.
///
/// Serializes to the exact wire shapes of the VIV JSON protocol, dotted key
/// names included.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "id")]
pub enum Request {
    /// Query whether auto-exposure is enabled.
    #[serde(rename = "ae.g.en")]
    AecGetEnable { streamid: u32 },

    /// Enable or disable auto-exposure.
    #[serde(rename = "ae.s.en")]
    AecSetEnable { streamid: u32, enable: bool },

    /// Query whether auto-white-balance is enabled.
    #[serde(rename = "awb.g.en")]
    AwbGetEnable { streamid: u32 },

    /// Enable or disable auto-white-balance.
    #[serde(rename = "awb.s.en")]
    AwbSetEnable { streamid: u32, enable: bool },

    /// Query the full white-balance configuration.
    #[serde(rename = "wb.g.cfg")]
    WbGetConfig { streamid: u32 },

    /// Write a manual white-balance configuration.
    #[serde(rename = "wb.s.cfg")]
    WbSetConfig {
        streamid: u32,
        matrix: [f64; 9],
        offset: ColorOffset,
        #[serde(rename = "wb.gains")]
        gains: WbGains,
    },

    /// Query the dewarp parameters (bypass flag included).
    #[serde(rename = "dwe.g.params")]
    DewarpGetParams { streamid: u32 },

    /// Set or clear the dewarp bypass flag.
    #[serde(rename = "dwe.s.bypass")]
    DewarpSetBypass { streamid: u32, dwe: DewarpFlags },

    /// Query sensor capabilities.
    #[serde(rename = "sensor.query")]
    SensorQuery { streamid: u32 },
}

/// Reply carrying a single `enable` flag (AEC and AWB queries).
#[derive(Debug, Clone, Deserialize)]
pub struct EnableReply {
    pub enable: bool,
}

/// The nested `dwe` object of the dewarp protocol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DewarpFlags {
    pub bypass: bool,
}

/// Reply to a dewarp parameter query.
#[derive(Debug, Clone, Deserialize)]
pub struct DewarpReply {
    pub dwe: DewarpFlags,
}

/// Manual white-balance gains. The sensor has separate green gains for the
/// two green photosites of the Bayer pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WbGains {
    pub red: f64,
    #[serde(rename = "green.r")]
    pub green_r: f64,
    #[serde(rename = "green.b")]
    pub green_b: f64,
    pub blue: f64,
}

impl WbGains {
    /// Neutral gains (all 1.0).
    pub fn balanced() -> Self {
        Self {
            red: 1.0,
            green_r: 1.0,
            green_b: 1.0,
            blue: 1.0,
        }
    }

    /// Componentwise comparison with tolerance; the driver echoes gains
    /// through JSON floats, so exact equality is too strict.
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.red - other.red).abs() <= epsilon
            && (self.green_r - other.green_r).abs() <= epsilon
            && (self.green_b - other.green_b).abs() <= epsilon
            && (self.blue - other.blue).abs() <= epsilon
    }
}

impl Default for WbGains {
    fn default() -> Self {
        Self::balanced()
    }
}

/// Per-channel color offset of the white-balance block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorOffset {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

/// Full white-balance configuration as reported by `wb.g.cfg`.
///
/// Only the gains are guaranteed by the protocol; matrix and offset default
/// when a driver build omits them from the reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WbConfig {
    #[serde(default = "identity_matrix")]
    pub matrix: [f64; 9],
    #[serde(default)]
    pub offset: ColorOffset,
    #[serde(rename = "wb.gains")]
    pub gains: WbGains,
}

/// The 3×3 identity color-correction matrix, row-major.
pub fn identity_matrix() -> [f64; 9] {
    [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
}
