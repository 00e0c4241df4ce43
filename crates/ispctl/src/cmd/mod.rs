use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};

use ispctl_channel::ChannelConfig;
use ispctl_client::FeatureClient;

use crate::exit::{client_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod capture;
pub mod demo;
pub mod get;
pub mod set;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Cycle through ISP feature combinations on a timer.
    Demo(DemoArgs),
    /// Capture one still image from the camera.
    Capture(capture::CaptureArgs),
    /// Read one ISP feature.
    Get(GetArgs),
    /// Write one ISP feature.
    Set(SetArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Demo(args) => demo::run(args),
        Command::Capture(args) => capture::run(args, format),
        Command::Get(args) => get::run(args, format),
        Command::Set(args) => set::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Device/channel options shared by every control command.
#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// Video device node exposing the VIV control.
    #[arg(long, short = 'd', default_value = "/dev/video2")]
    pub device: PathBuf,
    /// Per-transaction time limit (e.g. 5s, 500ms). Unlimited when absent.
    #[arg(long)]
    pub timeout: Option<String>,
    /// Verify each write by re-reading it.
    #[arg(long)]
    pub verify: bool,
}

impl DeviceArgs {
    pub fn open_client(&self) -> CliResult<FeatureClient> {
        let mut config = ChannelConfig::default();
        if let Some(raw) = &self.timeout {
            config.transact_timeout = Some(parse_duration(raw)?);
        }
        let client = FeatureClient::open_with_config(&self.device, config)
            .map_err(|err| client_error("open device", err))?;
        Ok(client.with_verify_writes(self.verify))
    }
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Waiting time between feature transitions, in seconds.
    #[arg(long, short = 't', default_value_t = 5.0)]
    pub time: f64,
    /// Red gain for the manual white-balance phase.
    #[arg(long, short = 'r', default_value_t = 1.0)]
    pub red: f64,
    /// Green gain for the manual white-balance phase.
    #[arg(long, short = 'g', default_value_t = 1.0)]
    pub green: f64,
    /// Blue gain for the manual white-balance phase.
    #[arg(long, short = 'b', default_value_t = 1.0)]
    pub blue: f64,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Feature to read.
    #[arg(value_enum)]
    pub feature: GetFeature,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum GetFeature {
    /// Auto-exposure enabled flag.
    Aec,
    /// Auto-white-balance enabled flag.
    Awb,
    /// Full white-balance configuration.
    Wb,
    /// Dewarp bypass flag.
    DewarpBypass,
    /// Sensor capability structure.
    Sensor,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(subcommand)]
    pub command: set::SetCommand,
}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// On/off switch for boolean features.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(switch: Switch) -> bool {
        matches!(switch, Switch::On)
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn switch_converts_to_bool() {
        assert!(bool::from(Switch::On));
        assert!(!bool::from(Switch::Off));
    }
}
