//! twinport
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!   HTTP/JSON     │  gateway (0.0.0.0:RESTPort)                          │
//!  ───────────────┼─▶ access log → request id → CORS → method gate       │
//!                 │     → route → RPC client ──┐                         │
//!                 │                            ▼                         │
//!   RPC           │  rpc (127.0.0.1:GRPCPort)                            │
//!  ───────────────┼─▶ panic recovery → Auth / Users handlers             │
//!                 │                            │                         │
//!                 │                            ▼                         │
//!                 │  resources: database · cache · mail                  │
//!                 └──────────────────────────────────────────────────────┘
//! ```
//!
//! Exit status: 0 after a requested shutdown, 1 on any fatal error.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use twinport::config::{Mode, CONFIG_PATH};
use twinport::lifecycle::{launch, signals};
use twinport::{Controllers, LiveInitializer};

#[derive(Parser, Debug)]
#[command(name = "twinport", version, about = "RPC server with a REST gateway")]
struct Args {
    /// Run in production mode (`DB.prod`, JSON logs to `Common.LogOutPath`)
    #[arg(long)]
    prod: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let status = launch(
        Path::new(CONFIG_PATH),
        Mode::from_prod_flag(args.prod),
        Arc::new(LiveInitializer),
        Controllers,
        signals::wait_for_signal(),
    )
    .await;

    ExitCode::from(status)
}
