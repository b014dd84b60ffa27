//! Linux platform implementation: evdev device capture and uinput synthetic
//! injection.
//!
//! # Permissions
//!
//! Access to `/dev/input/event*` and `/dev/uinput` requires either root,
//! membership in the `input` group, or an appropriate udev rule.

use std::fs;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, Device, EventType, InputEvent, Key, RelativeAxisType};

use super::types::{DeviceInfo, DeviceKind, PermissionStatus};
use super::{InputDevice, Injector};
use crate::event::{EventRecord, EV_KEY, EV_REL, REL_WHEEL, REL_X, REL_Y};

// =============================================================================
// Permission handling
// =============================================================================

fn check_input_device_access() -> bool {
    match fs::read_dir("/dev/input") {
        Ok(entries) => entries.flatten().any(|entry| {
            let path = entry.path();
            path.to_string_lossy().contains("event") && Device::open(&path).is_ok()
        }),
        Err(_) => false,
    }
}

fn check_uinput_writable() -> bool {
    fs::OpenOptions::new()
        .write(true)
        .open("/dev/uinput")
        .is_ok()
}

pub fn get_permission_status() -> PermissionStatus {
    PermissionStatus {
        input_group_member: check_input_device_access(),
        uinput_writable: check_uinput_writable(),
    }
}

/// Prints setup guidance to stderr. Called before the logger is configured,
/// since a missing grant is exactly the kind of failure a user needs to see
/// even if they ran with `-q`.
pub fn print_permission_guidance() {
    eprintln!("Input device access not available.");
    eprintln!("To grant access, either:");
    eprintln!("  1. Run as root (not recommended for production)");
    eprintln!("  2. Add your user to the 'input' group:");
    eprintln!("     sudo usermod -aG input $USER");
    eprintln!("     Then log out and back in");
    eprintln!("  3. Set up a udev rule:");
    eprintln!("     echo 'KERNEL==\"event*\", SUBSYSTEM==\"input\", TAG+=\"uaccess\"' | sudo tee /etc/udev/rules.d/99-evkvm.rules");
    eprintln!("     sudo udevadm control --reload-rules && sudo udevadm trigger");
}

// =============================================================================
// Device enumeration
// =============================================================================

fn classify(device: &Device) -> Option<DeviceKind> {
    let is_keyboard = device
        .supported_keys()
        .is_some_and(|keys| keys.contains(Key::KEY_A));
    let is_pointer = device.supported_relative_axes().is_some_and(|axes| {
        axes.contains(RelativeAxisType::REL_X) && axes.contains(RelativeAxisType::REL_Y)
    });

    match (is_keyboard, is_pointer) {
        (true, true) => Some(DeviceKind::Both),
        (true, false) => Some(DeviceKind::Keyboard),
        (false, true) => Some(DeviceKind::Pointer),
        (false, false) => None,
    }
}

/// Lists every capturable input device under `/dev/input`, keyboard or
/// pointer, with its display name and device node path.
pub fn enumerate_devices() -> Result<Vec<DeviceInfo>> {
    let mut devices = Vec::new();
    let entries = fs::read_dir("/dev/input").context("reading /dev/input")?;

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.to_string_lossy().contains("event") {
            continue;
        }
        let device = match Device::open(&path) {
            Ok(d) => d,
            Err(_) => continue,
        };
        let Some(kind) = classify(&device) else {
            continue;
        };
        devices.push(DeviceInfo {
            name: device.name().unwrap_or("unknown").to_string(),
            path: path.to_string_lossy().into_owned(),
            kind,
        });
    }

    Ok(devices)
}

/// Opens every device in `enumerate_devices()` whose name is in `names`.
/// A name with no matching device is logged and skipped, not fatal;
/// the caller decides whether an empty result is fatal.
pub fn open_devices(names: &[String]) -> Result<Vec<LinuxDevice>> {
    let available = enumerate_devices()?;
    let mut opened = Vec::with_capacity(names.len());

    for name in names {
        let Some(info) = available.iter().find(|d| &d.name == name) else {
            log::warn!("configured device '{name}' not found, skipping");
            continue;
        };
        match Device::open(&info.path) {
            Ok(device) => opened.push(LinuxDevice {
                device,
                name: info.name.clone(),
                kind: info.kind,
                grabbed: false,
            }),
            Err(e) => log::warn!("failed to open device '{name}' at {}: {e}", info.path),
        }
    }

    Ok(opened)
}

// =============================================================================
// Capture
// =============================================================================

pub struct LinuxDevice {
    device: Device,
    name: String,
    kind: DeviceKind,
    grabbed: bool,
}

impl InputDevice for LinuxDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DeviceKind {
        self.kind
    }

    fn grab(&mut self) -> Result<()> {
        if !self.grabbed {
            self.device
                .grab()
                .with_context(|| format!("grabbing device '{}'", self.name))?;
            self.grabbed = true;
        }
        Ok(())
    }

    fn ungrab(&mut self) -> Result<()> {
        if self.grabbed {
            self.device
                .ungrab()
                .with_context(|| format!("ungrabbing device '{}'", self.name))?;
            self.grabbed = false;
        }
        Ok(())
    }

    fn is_grabbed(&self) -> bool {
        self.grabbed
    }

    fn raw_fd(&self) -> RawFd {
        self.device.as_raw_fd()
    }

    fn read_available(&mut self) -> Result<Vec<EventRecord>> {
        let events = self
            .device
            .fetch_events()
            .with_context(|| format!("reading from device '{}'", self.name))?;

        Ok(events
            .filter_map(|event| {
                let etype = match event.event_type() {
                    EventType::KEY => EV_KEY,
                    EventType::RELATIVE => EV_REL,
                    _ => return None,
                };
                let code = event.code() as i32;
                if etype == EV_REL && !matches!(code, REL_X | REL_Y | REL_WHEEL) {
                    return None;
                }
                let time = event
                    .timestamp()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs_f64())
                    .unwrap_or(0.0);
                Some(EventRecord {
                    etype,
                    code,
                    value: event.value(),
                    time,
                })
            })
            .collect())
    }
}

// =============================================================================
// Synthetic injection
// =============================================================================

/// A uinput virtual device with full keyboard and relative-pointer
/// capabilities, so it can reproduce anything the publisher forwards.
/// Grounded on `FakeDevice` in the kybonet prototype's `input_devices.py`.
pub struct LinuxInjector {
    device: VirtualDevice,
}

impl LinuxInjector {
    pub fn new() -> Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for code in 0u16..=255 {
            keys.insert(Key::new(code));
        }

        let mut axes = AttributeSet::<RelativeAxisType>::new();
        axes.insert(RelativeAxisType::REL_X);
        axes.insert(RelativeAxisType::REL_Y);
        axes.insert(RelativeAxisType::REL_WHEEL);

        let device = VirtualDeviceBuilder::new()
            .context("opening /dev/uinput")?
            .name("evkvm virtual input")
            .with_keys(&keys)
            .context("registering key capabilities")?
            .with_relative_axes(&axes)
            .context("registering relative-axis capabilities")?
            .build()
            .context("building virtual device")?;

        Ok(Self { device })
    }
}

impl Injector for LinuxInjector {
    fn inject(&mut self, record: &EventRecord) -> Result<()> {
        let etype = match record.etype {
            EV_KEY => EventType::KEY,
            EV_REL => EventType::RELATIVE,
            other => return Err(anyhow!("unsupported event type {other}")),
        };
        let event = InputEvent::new(etype, record.code as u16, record.value);
        self.device
            .emit(&[event])
            .context("emitting synthetic input event")
    }
}

/// Resolves a hotkey name such as `"F9"` or `"LEFTCTRL"` to its evdev
/// scancode, the way the kybonet prototype's `keycode_from_str` resolves
/// `"KEY_" + name.upper()` against the `ecodes` module.
pub fn key_name_to_code(name: &str) -> Option<i32> {
    let key = match name.to_uppercase().as_str() {
        "ESC" | "ESCAPE" => Key::KEY_ESC,
        "F1" => Key::KEY_F1,
        "F2" => Key::KEY_F2,
        "F3" => Key::KEY_F3,
        "F4" => Key::KEY_F4,
        "F5" => Key::KEY_F5,
        "F6" => Key::KEY_F6,
        "F7" => Key::KEY_F7,
        "F8" => Key::KEY_F8,
        "F9" => Key::KEY_F9,
        "F10" => Key::KEY_F10,
        "F11" => Key::KEY_F11,
        "F12" => Key::KEY_F12,
        "LEFTCTRL" | "CTRL" => Key::KEY_LEFTCTRL,
        "RIGHTCTRL" => Key::KEY_RIGHTCTRL,
        "LEFTALT" | "ALT" => Key::KEY_LEFTALT,
        "RIGHTALT" => Key::KEY_RIGHTALT,
        "LEFTSHIFT" | "SHIFT" => Key::KEY_LEFTSHIFT,
        "RIGHTSHIFT" => Key::KEY_RIGHTSHIFT,
        "LEFTMETA" | "META" | "SUPER" => Key::KEY_LEFTMETA,
        "RIGHTMETA" => Key::KEY_RIGHTMETA,
        "TAB" => Key::KEY_TAB,
        "SPACE" => Key::KEY_SPACE,
        "ENTER" => Key::KEY_ENTER,
        "SCROLLLOCK" => Key::KEY_SCROLLLOCK,
        "PAUSE" => Key::KEY_PAUSE,
        "A" => Key::KEY_A,
        "B" => Key::KEY_B,
        "C" => Key::KEY_C,
        "D" => Key::KEY_D,
        "E" => Key::KEY_E,
        "F" => Key::KEY_F,
        "G" => Key::KEY_G,
        "H" => Key::KEY_H,
        "I" => Key::KEY_I,
        "J" => Key::KEY_J,
        "K" => Key::KEY_K,
        "L" => Key::KEY_L,
        "M" => Key::KEY_M,
        "N" => Key::KEY_N,
        "O" => Key::KEY_O,
        "P" => Key::KEY_P,
        "Q" => Key::KEY_Q,
        "R" => Key::KEY_R,
        "S" => Key::KEY_S,
        "T" => Key::KEY_T,
        "U" => Key::KEY_U,
        "V" => Key::KEY_V,
        "W" => Key::KEY_W,
        "X" => Key::KEY_X,
        "Y" => Key::KEY_Y,
        "Z" => Key::KEY_Z,
        _ => return None,
    };
    Some(key.code() as i32)
}

/// Blocks until at least one of `fds` is readable, using a single
/// `poll(2)` call so one OS thread can service every capture device
/// without busy-waiting.
pub fn poll_readable(fds: &[RawFd]) -> Result<Vec<RawFd>> {
    use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

    let mut poll_fds: Vec<PollFd> = fds
        .iter()
        .map(|fd| PollFd::new(unsafe { std::os::fd::BorrowedFd::borrow_raw(*fd) }, PollFlags::POLLIN))
        .collect();

    poll(&mut poll_fds, PollTimeout::NONE).context("polling input devices")?;

    Ok(poll_fds
        .iter()
        .zip(fds)
        .filter_map(|(poll_fd, fd)| {
            poll_fd
                .revents()
                .is_some_and(|events| events.contains(PollFlags::POLLIN))
                .then_some(*fd)
        })
        .collect())
}
