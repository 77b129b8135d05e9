// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// RedotPay bridge — headless demo host.
//
// Plays the part of the merchant's pay screen: builds a `startPay` parameter
// bag, calls the bridge against the desktop stub platform, and prints the
// outcome and the alert a real screen would show.

mod data_dir;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde_json::{Value, json};

use redotpay_bridge::RedotPayBridge;
use redotpay_bridge::stub::StubPlatform;
use redotpay_core::BridgeConfig;
use redotpay_core::human_errors::{humanize_error, humanize_rejection};
use redotpay_core::types::{DismissReason, PaymentOutcome};

/// How long to wait for a simulated dismissal to be carried out.
const DISMISS_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Parser)]
#[command(name = "redotpay-demo", version, about = "Launch a RedotPay payment sheet headlessly")]
struct Cli {
    /// JSON parameter bag to pass as-is (`-` reads stdin). Overrides the
    /// individual field flags.
    #[arg(long)]
    params: Option<String>,

    /// Pre-order id from the order-creation endpoint.
    #[arg(long, default_value = "")]
    pre_order_id: String,

    /// Merchant JWT from the login endpoint.
    #[arg(long, default_value = "")]
    jwt_token: String,

    /// PEM public key.
    #[arg(long, default_value = "")]
    public_key: String,

    #[arg(long, default_value = "en")]
    language: String,

    /// Use the SDK's test environment.
    #[arg(long)]
    test: bool,

    /// Bridge config file (defaults to the per-user config location).
    #[arg(long)]
    bridge_config: Option<PathBuf>,

    /// Simulate an app with no foreground window yet.
    #[arg(long)]
    no_host: bool,

    /// Simulate a build without the payment SDK.
    #[arg(long)]
    module_missing: bool,

    /// After a successful launch, close the sheet after this many milliseconds.
    #[arg(long)]
    dismiss_after_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli
        .bridge_config
        .clone()
        .unwrap_or_else(data_dir::default_config_path);
    let config = BridgeConfig::load_or_default(&config_path);

    let params = match read_params(&cli) {
        Ok(params) => params,
        Err(e) => {
            eprintln!("Error: could not read parameters: {e}");
            return ExitCode::from(2);
        }
    };

    let platform = if cli.module_missing {
        StubPlatform::unavailable()
    } else {
        StubPlatform::simulated()
    };
    let platform = match platform {
        Ok(platform) => Arc::new(platform),
        Err(e) => {
            eprintln!("Error: could not start the main queue: {e}");
            return ExitCode::from(2);
        }
    };
    platform.set_host_available(!cli.no_host);

    let bridge = RedotPayBridge::new(platform.clone(), config);
    tracing::info!(module = bridge.module_name(), "demo host ready");

    let pending = match bridge.begin_pay(&params) {
        Ok(pending) => pending,
        Err(e) => {
            let alert = humanize_error(&e);
            eprintln!("{}: {}", alert.title, alert.message);
            return ExitCode::FAILURE;
        }
    };

    let outcome = pending.await;
    println!("{}", outcome.to_json());

    match outcome {
        PaymentOutcome::Success => {
            if let Some(ms) = cli.dismiss_after_ms {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                platform.dismiss_sheet(DismissReason::UserClosed);
                match wait_for_dismissal(&bridge).await {
                    Some(closed) => println!("{}", json!({ "dismissed": closed })),
                    None => eprintln!("sheet still open after {DISMISS_WAIT:?}"),
                }
            }
            ExitCode::SUCCESS
        }
        PaymentOutcome::Failure(rejection) => {
            let alert = humanize_rejection(&rejection);
            eprintln!("{}: {}", alert.title, alert.message);
            if alert.retriable {
                eprintln!("{}", alert.suggestion);
            }
            ExitCode::FAILURE
        }
    }
}

/// Parameter bag from `--params`, or built from the field flags the way the
/// sample pay screen does.
fn read_params(cli: &Cli) -> Result<Value, Box<dyn std::error::Error>> {
    match cli.params.as_deref() {
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(serde_json::from_str(&buf)?)
        }
        Some(path) => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
        None => Ok(json!({
            "preOrderId": cli.pre_order_id,
            "jwtToken": cli.jwt_token,
            "publicKey": cli.public_key,
            "language": cli.language,
            "isTest": cli.test,
        })),
    }
}

/// Poll until the session controller reports the sheet gone.
async fn wait_for_dismissal(bridge: &RedotPayBridge) -> Option<redotpay_core::types::SessionClosed> {
    let sessions = bridge.orchestrator().sessions();
    let deadline = tokio::time::Instant::now() + DISMISS_WAIT;
    while tokio::time::Instant::now() < deadline {
        if let Some(closed) = sessions.last_closed() {
            return Some(closed);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    None
}
