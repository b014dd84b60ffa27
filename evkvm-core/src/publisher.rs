//! The publisher: captures from local input devices, routes each event to
//! the currently active subscriber, and either leaves it alone (the local
//! destination is just whatever the OS already does with an ungrabbed
//! device) or encrypts and broadcasts it.
//!
//! Device capture is a single blocking OS thread polling every device fd at
//! once (grounded on the kybonet prototype's single-device `select.select`
//! loop in `server.py`, generalized to many fds via one `poll(2)` call
//! instead of a busy-wait). Outbound ciphertext crosses into the
//! Tokio-driven transport over a bounded channel: a full channel blocks the
//! capture thread, which is exactly the "transport send" suspension point
//! named in the switch's concurrency model — encryption is CPU-bound and
//! fast, but a slow or wedged subscriber connection must not be allowed to
//! silently buffer without limit.

use std::net::SocketAddr;
use std::sync::mpsc::{sync_channel, SyncSender};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;

use crate::config::PublisherConfig;
use crate::crypto;
use crate::event::{EventRecord, EV_KEY, KEY_REPEAT, KEY_UP};
use crate::hotkeys::HotkeyAction;
use crate::motion::MotionAccumulator;
use crate::platform::linux;
use crate::platform::InputDevice;
use crate::routing::{Destination, RoutingState};
use crate::transport::PublisherTransport;

/// Outbound ciphertext frames queued between the capture thread and the
/// transport's fan-out task. Small and bounded: input events are soft
/// real-time, so a backlog should apply backpressure, not grow unbounded.
const TRANSPORT_QUEUE_CAPACITY: usize = 256;

/// Startup-phase failures distinguished from mid-session ones because §6/§7
/// tie them to a different process exit code: a bad device roster is a
/// configuration error, a poll(2) failure mid-loop is not.
#[derive(Debug, thiserror::Error)]
pub enum PublisherError {
    #[error("no capturable input devices available (checked: {0:?})")]
    NoDevices(Vec<String>),
    #[error("failed to grab device '{0}': {1}")]
    GrabFailed(String, #[source] anyhow::Error),
    #[error(transparent)]
    Runtime(#[from] anyhow::Error),
}

impl PublisherError {
    /// Fatal-at-startup per §7: device-busy/grab-failed and an empty
    /// device roster both belong to the "configuration" error class.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::NoDevices(_) | Self::GrabFailed(..))
    }
}

pub struct PublisherOptions {
    pub config: PublisherConfig,
    pub bind_addr: SocketAddr,
}

/// Opens the configured devices, binds the transport, and runs the capture
/// loop until an exit hotkey fires or device enumeration comes up empty.
pub async fn run(options: PublisherOptions) -> Result<(), PublisherError> {
    let PublisherOptions { config, bind_addr } = options;

    let devices: Vec<Box<dyn InputDevice>> = linux::open_devices(&config.devices)
        .map_err(PublisherError::Runtime)?
        .into_iter()
        .map(|d| Box::new(d) as Box<dyn InputDevice>)
        .collect();
    if devices.is_empty() {
        return Err(PublisherError::NoDevices(config.devices.clone()));
    }

    let transport = Arc::new(
        PublisherTransport::bind(bind_addr)
            .await
            .context("binding transport listener")
            .map_err(PublisherError::Runtime)?,
    );
    log::info!(
        "publisher listening on {} with {} subscriber(s), {} device(s) captured",
        bind_addr,
        config.subscribers.len(),
        devices.len()
    );

    let (frame_tx, frame_rx) = sync_channel::<Vec<u8>>(TRANSPORT_QUEUE_CAPACITY);
    let relay_transport = Arc::clone(&transport);
    let relay = std::thread::spawn(move || {
        for frame in frame_rx.iter() {
            relay_transport.broadcast(frame);
        }
    });

    let capture_result = tokio::task::spawn_blocking(move || capture_loop(devices, config, frame_tx))
        .await
        .context("capture thread panicked")
        .map_err(PublisherError::Runtime)?;

    // `frame_tx` was moved into the capture thread and is dropped with it,
    // which ends the relay thread's `iter()` loop.
    let _ = relay.join();
    capture_result
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn capture_loop(
    mut devices: Vec<Box<dyn InputDevice>>,
    config: PublisherConfig,
    frame_tx: SyncSender<Vec<u8>>,
) -> Result<(), PublisherError> {
    for device in &mut devices {
        device
            .grab()
            .map_err(|e| PublisherError::GrabFailed(device.name().to_string(), e))?;
    }

    let mut routing = RoutingState::new();
    let mut motion = MotionAccumulator::new();

    let result = (|| -> Result<(), PublisherError> {
        loop {
            if devices.is_empty() {
                log::warn!("no input devices remain in the poll set, stopping capture");
                return Ok(());
            }

            let fds: Vec<_> = devices.iter().map(|d| d.raw_fd()).collect();
            let ready = linux::poll_readable(&fds).map_err(PublisherError::Runtime)?;

            for fd in ready {
                // Looked up fresh each time (not via the `fds` snapshot's
                // position) so a mid-batch device removal can't desync a
                // later fd's index against the shrinking `devices` vector.
                let Some(idx) = devices.iter().position(|d| d.raw_fd() == fd) else {
                    continue;
                };

                let records = match devices[idx].read_available() {
                    Ok(records) => records,
                    Err(e) => {
                        log::warn!("device '{}' read failed, dropping it: {e}", devices[idx].name());
                        devices.remove(idx);
                        continue;
                    }
                };

                for record in records {
                    let should_continue = handle_record(
                        record,
                        &mut routing,
                        &mut motion,
                        &config,
                        &frame_tx,
                        &mut devices,
                    );
                    if !should_continue {
                        return Ok(());
                    }
                }
                for flushed in motion.flush_all() {
                    dispatch(&flushed, &routing, &config, &frame_tx);
                }
            }
        }
    })();

    for device in &mut devices {
        let _ = device.ungrab();
    }

    result
}

/// §4.3 step 3: after a switch, grab devices if the newly-selected
/// destination is remote, or release them if it's local. `grab`/`ungrab`
/// are idempotent per device (§4.1), so calling this unconditionally after
/// every hotkey action is cheap and can never double-acquire or double-free.
fn reevaluate_grab(routing: &RoutingState, config: &PublisherConfig, devices: &mut [Box<dyn InputDevice>]) {
    let is_local = config
        .subscribers
        .get(routing.current_idx())
        .is_some_and(|s| s.is_local());

    for device in devices.iter_mut() {
        let result = if is_local { device.ungrab() } else { device.grab() };
        if let Err(e) = result {
            log::warn!("failed to re-evaluate grab state for '{}': {e}", device.name());
        }
    }
}

/// Processes one raw event. Returns `false` when an exit hotkey fired and
/// the capture loop should stop.
fn handle_record(
    record: EventRecord,
    routing: &mut RoutingState,
    motion: &mut MotionAccumulator,
    config: &PublisherConfig,
    frame_tx: &SyncSender<Vec<u8>>,
    devices: &mut [Box<dyn InputDevice>],
) -> bool {
    if record.is_relative_motion() {
        if let Some(flushed) = motion.push(&record) {
            dispatch(&flushed, routing, config, frame_tx);
        }
        return true;
    }

    // Normalizer step 3: key repeats (and anything that isn't a plain
    // press/release) never reach routing, hotkeys, or the transmitter.
    if record.etype == EV_KEY && record.value == KEY_REPEAT {
        return true;
    }

    if !record.is_key_event() {
        return true;
    }

    if let Some(action) = config.hotkeys.lookup(record.code) {
        if record.is_pressed() {
            // Hotkey presses are opaque: they never reach encryption and
            // never trigger the bound action. The action fires on release.
            return true;
        }
        return handle_hotkey(action, routing, config, frame_tx, devices);
    }

    if record.is_pressed() {
        if routing.is_pressed(record.code) {
            // Duplicate press (key-repeat filtering failed upstream, or a
            // race produced two presses with no release between them).
            return true;
        }
        routing.mark_pressed(record.code);
    } else if record.is_released() {
        routing.mark_released(record.code);
    }

    dispatch(&record, routing, config, frame_tx);
    true
}

fn handle_hotkey(
    action: HotkeyAction,
    routing: &mut RoutingState,
    config: &PublisherConfig,
    frame_tx: &SyncSender<Vec<u8>>,
    devices: &mut [Box<dyn InputDevice>],
) -> bool {
    // Release anything still held against the outgoing destination so a
    // switch mid-keystroke never leaves a phantom key down on either side.
    for code in routing.held_keys() {
        let release = EventRecord::key(code, KEY_UP, now_secs());
        dispatch(&release, routing, config, frame_tx);
    }
    routing.clear_pressed();

    match action {
        HotkeyAction::Next => {
            routing.next(config.subscribers.len());
            reevaluate_grab(routing, config, devices);
            true
        }
        HotkeyAction::SwitchTo(idx) => {
            if !routing.switch_to(idx, config.subscribers.len()) {
                log::warn!("hotkey targets subscriber index {idx}, out of range");
            } else {
                reevaluate_grab(routing, config, devices);
            }
            true
        }
        HotkeyAction::Exit => {
            log::info!("exit hotkey pressed, shutting down");
            false
        }
    }
}

/// Routes one already-decided event record to the currently selected
/// destination: nothing, for the local destination (the device is already
/// ungrabbed, so the OS has already delivered the raw event to this
/// machine's desktop — there is no publisher-side injection concept), or
/// serialize + encrypt + hand to the transport queue for a remote one.
/// Transport-send failures (§7: a full or closed channel) are logged and the
/// event is dropped — there is no retry queue by design.
fn dispatch(record: &EventRecord, routing: &RoutingState, config: &PublisherConfig, frame_tx: &SyncSender<Vec<u8>>) {
    let Some(subscriber) = config.subscribers.get(routing.current_idx()) else {
        log::warn!("current routing index has no matching subscriber, dropping event");
        return;
    };

    match &subscriber.destination {
        Destination::Local => {}
        Destination::Remote { public_key } => {
            let payload = match serde_json::to_vec(record) {
                Ok(p) => p,
                Err(e) => {
                    log::warn!("serializing event failed: {e}");
                    return;
                }
            };
            let ciphertext = match crypto::encrypt(public_key, &payload) {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("encrypting event for '{}' failed: {e}", subscriber.name);
                    return;
                }
            };
            if let Err(e) = frame_tx.send(ciphertext) {
                log::warn!("transport send failed, event lost: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{KEY_DOWN, REL_X};
    use crate::hotkeys::HotkeyTable;

    /// An in-memory stand-in for a real evdev device, so grab/ungrab
    /// behavior around routing switches can be tested without `/dev/input`.
    struct FakeDevice {
        grabbed: bool,
    }

    impl InputDevice for FakeDevice {
        fn name(&self) -> &str {
            "fake"
        }
        fn kind(&self) -> crate::platform::DeviceKind {
            crate::platform::DeviceKind::Both
        }
        fn grab(&mut self) -> anyhow::Result<()> {
            self.grabbed = true;
            Ok(())
        }
        fn ungrab(&mut self) -> anyhow::Result<()> {
            self.grabbed = false;
            Ok(())
        }
        fn is_grabbed(&self) -> bool {
            self.grabbed
        }
        fn raw_fd(&self) -> std::os::unix::io::RawFd {
            0
        }
        fn read_available(&mut self) -> anyhow::Result<Vec<EventRecord>> {
            Ok(vec![])
        }
    }

    fn local_config(hotkeys: HotkeyTable) -> PublisherConfig {
        PublisherConfig {
            devices: vec![],
            subscribers: vec![crate::routing::Subscriber {
                name: "laptop".to_string(),
                hotkey: None,
                destination: Destination::Local,
            }],
            hotkeys,
        }
    }

    /// A single remote subscriber, so tests can observe what actually
    /// crosses the wire instead of relying on a publisher-side injector
    /// (the publisher has none — see `dispatch`'s `Destination::Local` arm).
    fn remote_config(hotkeys: HotkeyTable) -> (PublisherConfig, rsa::RsaPrivateKey) {
        let (priv_key, pub_key) = crypto::generate_keypair().unwrap();
        let config = PublisherConfig {
            devices: vec![],
            subscribers: vec![crate::routing::Subscriber {
                name: "A".to_string(),
                hotkey: None,
                destination: Destination::Remote { public_key: pub_key },
            }],
            hotkeys,
        };
        (config, priv_key)
    }

    fn two_remote_config(hotkeys: HotkeyTable) -> (PublisherConfig, rsa::RsaPrivateKey, rsa::RsaPrivateKey) {
        let (priv_a, pub_a) = crypto::generate_keypair().unwrap();
        let (priv_b, pub_b) = crypto::generate_keypair().unwrap();
        let config = PublisherConfig {
            devices: vec![],
            subscribers: vec![
                crate::routing::Subscriber {
                    name: "A".to_string(),
                    hotkey: None,
                    destination: Destination::Remote { public_key: pub_a },
                },
                crate::routing::Subscriber {
                    name: "B".to_string(),
                    hotkey: None,
                    destination: Destination::Remote { public_key: pub_b },
                },
            ],
            hotkeys,
        };
        (config, priv_a, priv_b)
    }

    /// Compares only the scancode/value pair, not the capture timestamp:
    /// a synthesized release carries the switch's own wall-clock time, not
    /// the original press's.
    fn fields(records: &[EventRecord]) -> Vec<(i32, i32)> {
        records.iter().map(|r| (r.code, r.value)).collect()
    }

    fn drain_decrypted(frame_rx: &std::sync::mpsc::Receiver<Vec<u8>>, private_key: &rsa::RsaPrivateKey) -> Vec<EventRecord> {
        let mut out = Vec::new();
        while let Ok(frame) = frame_rx.try_recv() {
            if let Ok(plaintext) = crypto::decrypt(private_key, &frame) {
                out.push(serde_json::from_slice(&plaintext).unwrap());
            }
        }
        out
    }

    /// S1 — a plain key press/release to a single remote subscriber arrives
    /// unchanged, addressed only to that subscriber.
    #[test]
    fn s1_basic_key_round_trips_to_the_single_subscriber() {
        let mut hotkeys = HotkeyTable::new();
        hotkeys.bind(1, HotkeyAction::Next); // F9-ish placeholder scancode
        let (priv_key, pub_key) = crypto::generate_keypair().unwrap();
        let config = PublisherConfig {
            devices: vec![],
            subscribers: vec![crate::routing::Subscriber {
                name: "A".to_string(),
                hotkey: None,
                destination: Destination::Remote { public_key: pub_key },
            }],
            hotkeys,
        };
        let (frame_tx, frame_rx) = sync_channel(8);
        let mut routing = RoutingState::new();
        let mut motion = MotionAccumulator::new();

        handle_record(EventRecord::key(30, KEY_DOWN, 0.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        handle_record(EventRecord::key(30, KEY_UP, 1.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        drop(frame_tx);

        let received = drain_decrypted(&frame_rx, &priv_key);
        assert_eq!(received, vec![EventRecord::key(30, KEY_DOWN, 0.0), EventRecord::key(30, KEY_UP, 1.0)]);
    }

    /// S2 — switching destinations flushes a held modifier as a release to
    /// the outgoing subscriber; the hotkey itself never reaches either side.
    #[test]
    fn s2_switch_flushes_held_modifier_and_hides_the_hotkey() {
        const SWITCH_HOTKEY: i32 = 9; // stands in for F9
        const LEFT_SHIFT: i32 = 42;
        const A_KEY: i32 = 30;

        let mut hotkeys = HotkeyTable::new();
        hotkeys.bind(SWITCH_HOTKEY, HotkeyAction::Next);
        let (config, priv_a, priv_b) = two_remote_config(hotkeys);
        let (frame_tx, frame_rx) = sync_channel(16);
        let mut routing = RoutingState::new();
        let mut motion = MotionAccumulator::new();

        handle_record(EventRecord::key(LEFT_SHIFT, KEY_DOWN, 0.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        handle_record(EventRecord::key(SWITCH_HOTKEY, KEY_DOWN, 1.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        handle_record(EventRecord::key(SWITCH_HOTKEY, KEY_UP, 2.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        handle_record(EventRecord::key(A_KEY, KEY_DOWN, 3.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        handle_record(EventRecord::key(A_KEY, KEY_UP, 4.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        drop(frame_tx);

        let to_a = drain_decrypted(&frame_rx, &priv_a);
        let to_b = drain_decrypted(&frame_rx, &priv_b);

        // The release synthesized on switch carries the switch's own
        // wall-clock timestamp, not the original press's, so only the
        // scancode/press-or-release fields are compared here.
        assert_eq!(fields(&to_a), vec![(LEFT_SHIFT, KEY_DOWN), (LEFT_SHIFT, KEY_UP)]);
        assert_eq!(fields(&to_b), vec![(A_KEY, KEY_DOWN), (A_KEY, KEY_UP)]);
        for record in to_a.iter().chain(to_b.iter()) {
            assert_ne!(record.code, SWITCH_HOTKEY);
        }
    }

    /// §4.3 step 3 — switching to a local destination ungrabs every device;
    /// switching back to a remote one re-grabs them. `grab`/`ungrab` being
    /// idempotent (§4.1) is what makes calling this after every switch safe.
    #[test]
    fn switching_to_local_ungrabs_devices_and_back_regrabs_them() {
        const SWITCH_HOTKEY: i32 = 9;
        let mut hotkeys = HotkeyTable::new();
        hotkeys.bind(SWITCH_HOTKEY, HotkeyAction::Next);
        let (_priv_a, pub_a) = crypto::generate_keypair().unwrap();
        let config = PublisherConfig {
            devices: vec![],
            subscribers: vec![
                crate::routing::Subscriber {
                    name: "remote".to_string(),
                    hotkey: None,
                    destination: Destination::Remote { public_key: pub_a },
                },
                crate::routing::Subscriber {
                    name: "laptop".to_string(),
                    hotkey: None,
                    destination: Destination::Local,
                },
            ],
            hotkeys,
        };
        let (frame_tx, _frame_rx) = sync_channel(8);
        let mut routing = RoutingState::new();
        let mut motion = MotionAccumulator::new();
        let mut devices: Vec<Box<dyn InputDevice>> = vec![Box::new(FakeDevice { grabbed: true })];

        handle_record(
            EventRecord::key(SWITCH_HOTKEY, KEY_DOWN, 0.0),
            &mut routing,
            &mut motion,
            &config,
            &frame_tx,
            &mut devices,
        );
        handle_record(
            EventRecord::key(SWITCH_HOTKEY, KEY_UP, 1.0),
            &mut routing,
            &mut motion,
            &config,
            &frame_tx,
            &mut devices,
        );
        assert_eq!(routing.current_idx(), 1);
        assert!(!devices[0].is_grabbed(), "switching to the local destination must ungrab devices");

        handle_record(
            EventRecord::key(SWITCH_HOTKEY, KEY_DOWN, 2.0),
            &mut routing,
            &mut motion,
            &config,
            &frame_tx,
            &mut devices,
        );
        handle_record(
            EventRecord::key(SWITCH_HOTKEY, KEY_UP, 3.0),
            &mut routing,
            &mut motion,
            &config,
            &frame_tx,
            &mut devices,
        );
        assert_eq!(routing.current_idx(), 0);
        assert!(devices[0].is_grabbed(), "switching back to a remote destination must re-grab devices");
    }

    /// Hotkey opacity: a press of a bound hotkey never reaches the
    /// subscriber, and performs no action until release.
    #[test]
    fn hotkey_press_is_dropped_and_takes_no_effect_until_release() {
        let mut hotkeys = HotkeyTable::new();
        hotkeys.bind(59, HotkeyAction::Next);
        let (config, priv_key) = remote_config(hotkeys);
        let (frame_tx, frame_rx) = sync_channel(8);
        let mut routing = RoutingState::new();
        let mut motion = MotionAccumulator::new();

        handle_record(EventRecord::key(59, KEY_DOWN, 0.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        drop(frame_tx);

        assert_eq!(routing.current_idx(), 0);
        assert!(drain_decrypted(&frame_rx, &priv_key).is_empty());
    }

    /// Key-repeat events never reach routing or the transmitter.
    #[test]
    fn key_repeats_are_discarded_before_routing() {
        let (config, priv_key) = remote_config(HotkeyTable::new());
        let (frame_tx, frame_rx) = sync_channel(8);
        let mut routing = RoutingState::new();
        let mut motion = MotionAccumulator::new();

        handle_record(EventRecord::key(30, KEY_DOWN, 0.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        handle_record(EventRecord::key(30, KEY_REPEAT, 1.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        drop(frame_tx);

        assert_eq!(drain_decrypted(&frame_rx, &priv_key).len(), 1);
    }

    /// §4.4 duplicate-press suppression: a second press with no intervening
    /// release for the same scancode never reaches the destination.
    #[test]
    fn duplicate_press_without_release_is_suppressed() {
        let (config, priv_key) = remote_config(HotkeyTable::new());
        let (frame_tx, frame_rx) = sync_channel(8);
        let mut routing = RoutingState::new();
        let mut motion = MotionAccumulator::new();

        handle_record(EventRecord::key(30, KEY_DOWN, 0.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        handle_record(EventRecord::key(30, KEY_DOWN, 1.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        handle_record(EventRecord::key(30, KEY_UP, 2.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        handle_record(EventRecord::key(30, KEY_DOWN, 3.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        drop(frame_tx);

        let received = drain_decrypted(&frame_rx, &priv_key);
        assert_eq!(received.len(), 3, "second duplicate press must be dropped, but the re-press after release must not");
    }

    /// S6 — exit teardown flushes a held key's release to the active
    /// destination before returning `false` to stop the capture loop.
    #[test]
    fn s6_exit_hotkey_flushes_held_key_then_signals_stop() {
        const EXIT_HOTKEY: i32 = 88;
        const LEFT_SHIFT: i32 = 42;
        let mut hotkeys = HotkeyTable::new();
        hotkeys.bind(EXIT_HOTKEY, HotkeyAction::Exit);
        let (config, priv_key) = remote_config(hotkeys);
        let (frame_tx, frame_rx) = sync_channel(8);
        let mut routing = RoutingState::new();
        let mut motion = MotionAccumulator::new();

        handle_record(EventRecord::key(LEFT_SHIFT, KEY_DOWN, 0.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        handle_record(EventRecord::key(EXIT_HOTKEY, KEY_DOWN, 1.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        let should_continue =
            handle_record(EventRecord::key(EXIT_HOTKEY, KEY_UP, 2.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        drop(frame_tx);

        assert!(!should_continue);
        let received = drain_decrypted(&frame_rx, &priv_key);
        assert_eq!(fields(&received), vec![(LEFT_SHIFT, KEY_DOWN), (LEFT_SHIFT, KEY_UP)]);
    }

    /// Motion events pass through the same dispatch path; coalesced runs
    /// match S3/S4 (exercised directly in `motion.rs`).
    #[test]
    fn motion_flushes_dispatch_to_the_active_destination() {
        let (config, priv_key) = remote_config(HotkeyTable::new());
        let (frame_tx, frame_rx) = sync_channel(8);
        let mut routing = RoutingState::new();
        let mut motion = MotionAccumulator::new();

        handle_record(EventRecord::relative(REL_X, 1, 0.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        handle_record(EventRecord::relative(REL_X, 1, 1.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        for flushed in motion.flush_all() {
            dispatch(&flushed, &routing, &config, &frame_tx);
        }
        drop(frame_tx);

        assert_eq!(drain_decrypted(&frame_rx, &priv_key), vec![EventRecord::relative(REL_X, 2, 1.0)]);
    }

    /// Property 6 — while the local destination is selected, dispatching
    /// any volume of key or motion events transmits nothing: `dispatch`'s
    /// `Destination::Local` arm is a no-op, since the device is already
    /// ungrabbed and the OS has already delivered the raw event locally.
    #[test]
    fn local_destination_transmits_nothing() {
        let config = local_config(HotkeyTable::new());
        let (frame_tx, frame_rx) = sync_channel(8);
        let mut routing = RoutingState::new();
        let mut motion = MotionAccumulator::new();

        handle_record(EventRecord::key(30, KEY_DOWN, 0.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        handle_record(EventRecord::key(30, KEY_UP, 1.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        handle_record(EventRecord::relative(REL_X, 5, 2.0), &mut routing, &mut motion, &config, &frame_tx, &mut []);
        for flushed in motion.flush_all() {
            dispatch(&flushed, &routing, &config, &frame_tx);
        }
        drop(frame_tx);

        assert!(frame_rx.try_recv().is_err());
    }
}
