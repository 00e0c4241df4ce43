use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::Command as ProcessCommand;
use std::time::Instant;

use clap::{Args, ValueEnum};
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use crate::exit::{io_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::output::{self, CaptureReport, OutputFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CaptureMethod {
    /// Read one frame over mmap streaming I/O and encode it here.
    V4l2,
    /// Shell out to gst-launch-1.0 and let the pipeline write the file.
    Gstreamer,
}

#[derive(Debug, Args)]
pub struct CaptureArgs {
    /// Capture backend.
    #[arg(long, value_enum, default_value = "v4l2")]
    pub method: CaptureMethod,

    /// Video capture device node.
    #[arg(long, short = 'd', default_value = "/dev/video2")]
    pub device: PathBuf,

    /// Frame width in pixels.
    #[arg(long, default_value_t = 4032)]
    pub width: u32,

    /// Frame height in pixels.
    #[arg(long, default_value_t = 3040)]
    pub height: u32,

    /// Output JPEG path.
    #[arg(long, short = 'o', default_value = "capture.jpg")]
    pub output: PathBuf,
}

pub fn run(args: CaptureArgs, format: OutputFormat) -> CliResult<i32> {
    let started = Instant::now();
    match args.method {
        CaptureMethod::V4l2 => capture_v4l2(&args)?,
        CaptureMethod::Gstreamer => capture_gstreamer(&args)?,
    }
    let report = CaptureReport {
        method: match args.method {
            CaptureMethod::V4l2 => "v4l2",
            CaptureMethod::Gstreamer => "gstreamer",
        }
        .to_string(),
        device: args.device.display().to_string(),
        width: args.width,
        height: args.height,
        output: args.output.display().to_string(),
        elapsed_ms: started.elapsed().as_millis(),
    };
    output::print_capture_report(&report, format);
    Ok(SUCCESS)
}

fn capture_v4l2(args: &CaptureArgs) -> CliResult<()> {
    let device = Device::with_path(&args.device).map_err(|err| {
        CliError::new(
            FAILURE,
            format!("failed to open {}: {err}", args.device.display()),
        )
    })?;

    let mut fmt = device
        .format()
        .map_err(|err| CliError::new(FAILURE, format!("failed to query format: {err}")))?;
    fmt.width = args.width;
    fmt.height = args.height;
    fmt.fourcc = FourCC::new(b"YUYV");
    let fmt = device
        .set_format(&fmt)
        .map_err(|err| CliError::new(FAILURE, format!("failed to set format: {err}")))?;
    if fmt.fourcc != FourCC::new(b"YUYV") {
        return Err(CliError::new(
            FAILURE,
            format!("driver refused YUYV, offered {}", fmt.fourcc),
        ));
    }
    tracing::debug!(width = fmt.width, height = fmt.height, "negotiated frame format");

    let mut stream = Stream::with_buffers(&device, Type::VideoCapture, 4)
        .map_err(|err| CliError::new(FAILURE, format!("failed to start streaming: {err}")))?;
    let (frame, meta) = stream
        .next()
        .map_err(|err| CliError::new(FAILURE, format!("failed to capture frame: {err}")))?;

    let expected = (fmt.width * fmt.height * 2) as usize;
    if (meta.bytesused as usize) < expected {
        return Err(CliError::new(
            FAILURE,
            format!(
                "short frame: got {} bytes, expected {expected}",
                meta.bytesused
            ),
        ));
    }

    let rgb = yuyv_to_rgb(&frame[..expected], fmt.width as usize, fmt.height as usize);

    let file = File::create(&args.output)
        .map_err(|err| io_error(&format!("create {}", args.output.display()), err))?;
    let writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(writer, 100)
        .encode(&rgb, fmt.width, fmt.height, ExtendedColorType::Rgb8)
        .map_err(|err| CliError::new(FAILURE, format!("failed to encode jpeg: {err}")))?;
    Ok(())
}

fn capture_gstreamer(args: &CaptureArgs) -> CliResult<()> {
    let caps = format!(
        "video/x-raw,format=YUY2,width={},height={}",
        args.width, args.height
    );
    let source = format!("device={}", args.device.display());
    let sink = format!("location={}", args.output.display());
    let status = ProcessCommand::new("gst-launch-1.0")
        .args([
            "v4l2src",
            &source,
            "num-buffers=1",
            "!",
            &caps,
            "!",
            "jpegenc",
            "quality=100",
            "!",
            "filesink",
            &sink,
        ])
        .status()
        .map_err(|err| io_error("run gst-launch-1.0", err))?;
    if !status.success() {
        return Err(CliError::new(
            FAILURE,
            format!("gst-launch-1.0 exited with {status}"),
        ));
    }
    Ok(())
}

/// Convert packed YUYV 4:2:2 to RGB24 using integer BT.601 limited-range
/// coefficients. Each four-byte group carries two pixels sharing chroma.
fn yuyv_to_rgb(yuyv: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(width * height * 3);
    for group in yuyv.chunks_exact(4) {
        let y0 = group[0] as i32;
        let u = group[1] as i32;
        let y1 = group[2] as i32;
        let v = group[3] as i32;
        push_pixel(&mut rgb, y0, u, v);
        push_pixel(&mut rgb, y1, u, v);
    }
    rgb
}

fn push_pixel(rgb: &mut Vec<u8>, y: i32, u: i32, v: i32) {
    let c = (y - 16).max(0);
    let d = u - 128;
    let e = v - 128;
    let r = (298 * c + 409 * e + 128) >> 8;
    let g = (298 * c - 100 * d - 208 * e + 128) >> 8;
    let b = (298 * c + 516 * d + 128) >> 8;
    rgb.push(r.clamp(0, 255) as u8);
    rgb.push(g.clamp(0, 255) as u8);
    rgb.push(b.clamp(0, 255) as u8);
}
