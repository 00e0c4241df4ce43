use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ispctl_client::{FeatureClient, WbGains};

use crate::cmd::DemoArgs;
use crate::exit::{client_error, CliError, CliResult, INTERNAL, SUCCESS};

/// Extra wait after re-enabling AEC so the exposure loop settles before the
/// state line is printed.
const AEC_SETTLE: Duration = Duration::from_millis(500);

/// Granularity of the interruptible sleep.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

struct Step {
    label: &'static str,
    apply: fn(&mut FeatureClient, &WbGains) -> ispctl_client::Result<()>,
    settle: Option<Duration>,
}

fn dewarp_off(client: &mut FeatureClient, _: &WbGains) -> ispctl_client::Result<()> {
    client.set_dewarp_bypass(true)
}

fn awb_manual(client: &mut FeatureClient, gains: &WbGains) -> ispctl_client::Result<()> {
    client.set_awb_enabled(false)?;
    client.set_wb_gains(*gains)
}

fn aec_off(client: &mut FeatureClient, _: &WbGains) -> ispctl_client::Result<()> {
    client.set_aec_enabled(false)
}

fn aec_on(client: &mut FeatureClient, _: &WbGains) -> ispctl_client::Result<()> {
    client.set_aec_enabled(true)
}

fn awb_on(client: &mut FeatureClient, _: &WbGains) -> ispctl_client::Result<()> {
    client.set_awb_enabled(true)
}

fn dewarp_on(client: &mut FeatureClient, _: &WbGains) -> ispctl_client::Result<()> {
    client.set_dewarp_bypass(false)
}

/// One full cycle of the feature walk. "dewarp: ON" means the correction is
/// active, i.e. the bypass flag is cleared.
const SEQUENCE: &[Step] = &[
    Step {
        label: "dewarp: OFF  awb: ON      aec: ON",
        apply: dewarp_off,
        settle: None,
    },
    Step {
        label: "dewarp: OFF  awb: MANUAL  aec: ON",
        apply: awb_manual,
        settle: None,
    },
    Step {
        label: "dewarp: OFF  awb: MANUAL  aec: OFF",
        apply: aec_off,
        settle: None,
    },
    Step {
        label: "dewarp: OFF  awb: MANUAL  aec: ON",
        apply: aec_on,
        settle: Some(AEC_SETTLE),
    },
    Step {
        label: "dewarp: OFF  awb: ON      aec: ON",
        apply: awb_on,
        settle: None,
    },
    Step {
        label: "dewarp: ON   awb: ON      aec: ON",
        apply: dewarp_on,
        settle: None,
    },
];

pub fn run(args: DemoArgs) -> CliResult<i32> {
    let mut client = args.device.open_client()?;
    let gains = WbGains {
        red: args.red,
        green_r: args.green,
        green_b: args.green,
        blue: args.blue,
    };
    let wait = Duration::from_secs_f64(args.time.max(0.0));

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))
        .map_err(|err| CliError::new(INTERNAL, format!("failed to install signal handler: {err}")))?;

    // Establish the known starting state before walking the sequence.
    client
        .set_dewarp_bypass(false)
        .and_then(|_| client.set_aec_enabled(true))
        .and_then(|_| client.set_awb_enabled(true))
        .map_err(|err| client_error("initialize feature state", err))?;
    println!("dewarp: ON   awb: ON      aec: ON");

    'demo: loop {
        for step in SEQUENCE {
            if !pause(&running, wait) {
                break 'demo;
            }
            (step.apply)(&mut client, &gains)
                .map_err(|err| client_error("apply feature state", err))?;
            if let Some(settle) = step.settle {
                if !pause(&running, settle) {
                    break 'demo;
                }
            }
            println!("{}", step.label);
        }
    }

    tracing::info!("demo interrupted, exiting");
    Ok(SUCCESS)
}

/// Sleep for `duration` in small slices, returning early (false) when the
/// interrupt flag clears. The device calls themselves are not interruptible;
/// this sleep is the demo's only cancellation point.
fn pause(running: &AtomicBool, duration: Duration) -> bool {
    let mut remaining = duration;
    while remaining > Duration::ZERO {
        if !running.load(Ordering::SeqCst) {
            return false;
        }
        let nap = remaining.min(SLEEP_SLICE);
        thread::sleep(nap);
        remaining = remaining.saturating_sub(nap);
    }
    running.load(Ordering::SeqCst)
}
