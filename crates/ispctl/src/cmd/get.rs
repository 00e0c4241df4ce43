use serde_json::{json, Value};

use crate::cmd::{GetArgs, GetFeature};
use crate::exit::{client_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{self, OutputFormat};

pub fn run(args: GetArgs, format: OutputFormat) -> CliResult<i32> {
    let mut client = args.device.open_client()?;
    let (name, value): (&str, Value) = match args.feature {
        GetFeature::Aec => (
            "aec",
            json!(client
                .aec_enabled()
                .map_err(|err| client_error("read aec state", err))?),
        ),
        GetFeature::Awb => (
            "awb",
            json!(client
                .awb_enabled()
                .map_err(|err| client_error("read awb state", err))?),
        ),
        GetFeature::Wb => {
            let config = client
                .wb_config()
                .map_err(|err| client_error("read wb config", err))?;
            let value = serde_json::to_value(config)
                .map_err(|err| CliError::new(DATA_INVALID, format!("read wb config: {err}")))?;
            ("wb", value)
        }
        GetFeature::DewarpBypass => (
            "dewarp-bypass",
            json!(client
                .dewarp_bypassed()
                .map_err(|err| client_error("read dewarp state", err))?),
        ),
        GetFeature::Sensor => (
            "sensor",
            client
                .sensor_caps()
                .map_err(|err| client_error("query sensor", err))?,
        ),
    };
    output::print_feature(name, &value, format);
    Ok(SUCCESS)
}
