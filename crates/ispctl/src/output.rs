use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FeatureOutput<'a> {
    feature: &'a str,
    value: &'a Value,
}

/// Print one feature name/value pair in the selected format.
pub fn print_feature(feature: &str, value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FeatureOutput { feature, value };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FEATURE", "VALUE"])
                .add_row(vec![feature.to_string(), compact(value)]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{feature}: {}", compact(value));
        }
    }
}

#[derive(Serialize)]
pub struct CaptureReport {
    pub method: String,
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub output: String,
    pub elapsed_ms: u128,
}

pub fn print_capture_report(report: &CaptureReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["METHOD", "DEVICE", "RESOLUTION", "OUTPUT", "ELAPSED"])
                .add_row(vec![
                    report.method.clone(),
                    report.device.clone(),
                    format!("{}x{}", report.width, report.height),
                    report.output.clone(),
                    format!("{} ms", report.elapsed_ms),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "captured {}x{} from {} via {} to {} in {} ms",
                report.width,
                report.height,
                report.device,
                report.method,
                report.output,
                report.elapsed_ms
            );
        }
    }
}

fn compact(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
