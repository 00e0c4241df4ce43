use clap::Subcommand;
use ispctl_client::WbGains;
use serde_json::{json, Value};

use crate::cmd::{DeviceArgs, SetArgs, Switch};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{self, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum SetCommand {
    /// Enable or disable auto exposure.
    Aec {
        #[arg(value_enum)]
        state: Switch,
        #[command(flatten)]
        device: DeviceArgs,
    },
    /// Enable or disable auto white balance.
    Awb {
        #[arg(value_enum)]
        state: Switch,
        #[command(flatten)]
        device: DeviceArgs,
    },
    /// Bypass or re-engage dewarp correction.
    DewarpBypass {
        #[arg(value_enum)]
        state: Switch,
        #[command(flatten)]
        device: DeviceArgs,
    },
    /// Apply manual white balance gains. Disables AWB first.
    Wb {
        /// Red channel gain.
        #[arg(long, short = 'r', default_value_t = 1.0)]
        red: f64,
        /// Gain for both green channels.
        #[arg(long, short = 'g', default_value_t = 1.0)]
        green: f64,
        /// Blue channel gain.
        #[arg(long, short = 'b', default_value_t = 1.0)]
        blue: f64,
        #[command(flatten)]
        device: DeviceArgs,
    },
}

pub fn run(args: SetArgs, format: OutputFormat) -> CliResult<i32> {
    let (name, value): (&str, Value) = match args.command {
        SetCommand::Aec { state, device } => {
            let enable = bool::from(state);
            let mut client = device.open_client()?;
            client
                .set_aec_enabled(enable)
                .map_err(|err| client_error("set aec state", err))?;
            ("aec", json!(enable))
        }
        SetCommand::Awb { state, device } => {
            let enable = bool::from(state);
            let mut client = device.open_client()?;
            client
                .set_awb_enabled(enable)
                .map_err(|err| client_error("set awb state", err))?;
            ("awb", json!(enable))
        }
        SetCommand::DewarpBypass { state, device } => {
            let bypass = bool::from(state);
            let mut client = device.open_client()?;
            client
                .set_dewarp_bypass(bypass)
                .map_err(|err| client_error("set dewarp state", err))?;
            ("dewarp-bypass", json!(bypass))
        }
        SetCommand::Wb {
            red,
            green,
            blue,
            device,
        } => {
            let gains = WbGains {
                red,
                green_r: green,
                green_b: green,
                blue,
            };
            let mut client = device.open_client()?;
            client
                .set_awb_enabled(false)
                .map_err(|err| client_error("disable awb", err))?;
            client
                .set_wb_gains(gains)
                .map_err(|err| client_error("set wb gains", err))?;
            (
                "wb",
                json!({
                    "red": red,
                    "green.r": green,
                    "green.b": green,
                    "blue": blue,
                }),
            )
        }
    };
    output::print_feature(name, &value, format);
    Ok(SUCCESS)
}
