//! `evkvm-server`: the publisher half of the evkvm software KVM switch.
//!
//! Captures from the configured local input devices, routes each event to
//! whichever subscriber is currently active, and encrypts anything destined
//! off-box before handing it to the transport.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use evkvm_core::publisher::{self, PublisherOptions};

/// Process exit code for a configuration error, per the BSD `sysexits.h`
/// convention the switch's CLI contract borrows for `EX_CONFIG`.
const EX_CONFIG: u8 = 78;

#[derive(Debug, Parser)]
#[command(
    name = "evkvm-server",
    about = "Capture local input and route it, encrypted, to subscribers"
)]
struct Cli {
    /// Path to the YAML configuration file describing devices, subscribers
    /// and hotkeys.
    #[arg(short = 'c', long = "config", default_value = "evkvm.yml")]
    config: PathBuf,

    /// Address the subscriber transport listens on.
    #[arg(short = 'b', long = "bind", default_value = "0.0.0.0:5555")]
    bind: SocketAddr,

    /// Increase log verbosity (-v debug, -vv trace). Conflicts with --quiet.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    quiet: bool,
}

fn init_logger(cli: &Cli) {
    let level = if cli.quiet {
        log::LevelFilter::Warn
    } else {
        match cli.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new().filter_level(level).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let permissions = evkvm_core::platform::check_permissions();
    if !permissions.all_granted() {
        evkvm_core::platform::print_permission_guidance();
        return ExitCode::from(EX_CONFIG);
    }

    init_logger(&cli);

    let config = match evkvm_core::config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(EX_CONFIG);
        }
    };

    let options = PublisherOptions {
        config,
        bind_addr: cli.bind,
    };

    match publisher::run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("publisher exited: {e}");
            if e.is_configuration() {
                ExitCode::from(EX_CONFIG)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
