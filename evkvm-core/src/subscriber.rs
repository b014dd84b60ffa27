//! The subscriber: receives every ciphertext frame the publisher broadcasts,
//! keeps only the ones it can decrypt, and replays them onto a local
//! synthetic input device.
//!
//! Grounded on `original_source/kybonet/client.py`'s `main` loop (`recv` →
//! `decrypt` → `json.loads` → `keyboard.play` / `device.write_event`),
//! reimplemented per the switch's redesign guidance: a decryption failure is
//! an ordinary "skip" branch, not an exception to catch.
//!
//! Kept synchronous, like the prototype: a subscriber only ever talks to one
//! publisher, so there is nothing for an async runtime to multiplex here.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use rsa::RsaPrivateKey;

use crate::crypto::{self, DecryptFailed};
use crate::event::EventRecord;
use crate::platform::linux::LinuxInjector;
use crate::platform::Injector;
use crate::transport::SubscriberTransport;

pub struct SubscriberOptions {
    pub connect_addr: SocketAddr,
    pub private_key: RsaPrivateKey,
    /// Do everything except the final injection — for testing without a
    /// real `/dev/uinput` device (§6's `--simulate` flag).
    pub simulate: bool,
}

/// Connects to the publisher and replays events until the connection is
/// closed or a read fails. Decryption failures, malformed payloads, and
/// injection failures are all non-fatal per §7 and are logged, not
/// propagated.
pub fn run(options: SubscriberOptions) -> Result<()> {
    let mut transport = SubscriberTransport::connect(options.connect_addr)
        .with_context(|| format!("connecting to publisher at {}", options.connect_addr))?;

    let mut injector: Option<Box<dyn Injector>> = if options.simulate {
        None
    } else {
        Some(Box::new(LinuxInjector::new()?))
    };

    log::info!(
        "subscriber connected to {} (simulate={})",
        options.connect_addr,
        options.simulate
    );

    loop {
        let ciphertext = transport
            .recv_frame()
            .context("receiving frame from publisher")?;
        handle_frame(&ciphertext, &options.private_key, injector.as_deref_mut());
    }
}

/// Processes one received ciphertext frame. Never returns an error: every
/// failure mode here (wrong-key decryption, malformed JSON, injection
/// trouble) is handled in place per §7's error taxonomy.
fn handle_frame(ciphertext: &[u8], private_key: &RsaPrivateKey, injector: Option<&mut dyn Injector>) {
    let plaintext = match crypto::decrypt(private_key, ciphertext) {
        Ok(p) => p,
        Err(DecryptFailed) => {
            log::debug!("dropping frame not addressed to this subscriber");
            return;
        }
    };

    let record: EventRecord = match serde_json::from_slice(&plaintext) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("malformed decrypted payload: {e}");
            return;
        }
    };

    if let Some(injector) = injector {
        if let Err(e) = injector.inject(&record) {
            log::warn!("injecting event failed: {e}");
        }
    }
}
