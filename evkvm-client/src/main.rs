//! `evkvm-client`: the subscriber half of the evkvm software KVM switch.
//!
//! Connects to a publisher, decrypts whatever ciphertext frames this
//! machine's private key can open, and replays them onto a local synthetic
//! input device.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use evkvm_core::subscriber::{self, SubscriberOptions};
use zeroize::Zeroize;

/// Process exit code for a configuration error, matching the publisher's
/// `EX_CONFIG` contract.
const EX_CONFIG: u8 = 78;

#[derive(Debug, Parser)]
#[command(
    name = "evkvm-client",
    about = "Decrypt and replay input addressed to this machine"
)]
struct Cli {
    /// Address of the publisher to connect to, `host:port`.
    #[arg(long = "connect", default_value = "127.0.0.1:5555")]
    connect: SocketAddr,

    /// Path to this subscriber's PEM-encoded RSA private key.
    #[arg(short = 'i', long = "id-rsa")]
    id_rsa: PathBuf,

    /// Decrypt and log every received event but skip the final injection.
    /// Useful for testing without a real `/dev/uinput` node.
    #[arg(long = "simulate")]
    simulate: bool,

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

fn main() -> ExitCode {
    let cli = Cli::parse();

    if !cli.simulate {
        let permissions = evkvm_core::platform::check_permissions();
        if !permissions.all_granted() {
            evkvm_core::platform::print_permission_guidance();
            return ExitCode::from(EX_CONFIG);
        }
    }

    init_logger(&cli);

    let mut pem = match std::fs::read_to_string(&cli.id_rsa) {
        Ok(pem) => pem,
        Err(e) => {
            eprintln!("failed to read private key {}: {e}", cli.id_rsa.display());
            return ExitCode::from(EX_CONFIG);
        }
    };
    let private_key = match evkvm_core::crypto::private_key_from_pem(&pem) {
        Ok(key) => key,
        Err(e) => {
            pem.zeroize();
            eprintln!("invalid private key {}: {e}", cli.id_rsa.display());
            return ExitCode::from(EX_CONFIG);
        }
    };
    pem.zeroize();

    let options = SubscriberOptions {
        connect_addr: cli.connect,
        private_key,
        simulate: cli.simulate,
    };

    match subscriber::run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("subscriber exited: {e}");
            ExitCode::FAILURE
        }
    }
}
