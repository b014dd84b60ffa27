//! Platform-specific input device capture and synthetic injection.
//!
//! # Platform Support
//!
//! - **Linux**: evdev device capture + uinput synthetic injection
//!
//! Other platforms are out of scope: the switch's Non-goals exclude
//! anything beyond a Linux publisher and a Linux subscriber.

pub mod types;

#[cfg(target_os = "linux")]
pub mod linux;

pub mod broadcaster;

pub use broadcaster::{EventBroadcaster, SubscriptionId};
pub use types::{DeviceInfo, DeviceKind, PermissionStatus};

use anyhow::Result;

use crate::event::EventRecord;

/// One physical input device the publisher can capture from. Exclusive
/// `grab`/`ungrab` are idempotent so the capture loop can call them freely
/// around routing switches without tracking extra state.
pub trait InputDevice: Send {
    fn name(&self) -> &str;
    fn kind(&self) -> DeviceKind;

    /// Acquire exclusive access so events stop reaching every other
    /// consumer on the system (window managers, other applications).
    fn grab(&mut self) -> Result<()>;
    fn ungrab(&mut self) -> Result<()>;
    fn is_grabbed(&self) -> bool;

    /// Raw fd the capture loop's readiness selector polls.
    fn raw_fd(&self) -> std::os::unix::io::RawFd;

    /// Drains whatever events are currently available without blocking.
    /// Called only after the selector reports this fd is readable.
    fn read_available(&mut self) -> Result<Vec<EventRecord>>;
}

/// Synthesizes input events on a subscriber machine as if they came from a
/// physical keyboard and mouse attached to it.
pub trait Injector: Send {
    fn inject(&mut self, record: &EventRecord) -> Result<()>;
}

#[cfg(target_os = "linux")]
pub fn check_permissions() -> PermissionStatus {
    linux::get_permission_status()
}

#[cfg(not(target_os = "linux"))]
pub fn check_permissions() -> PermissionStatus {
    PermissionStatus {
        input_group_member: false,
        uinput_writable: false,
    }
}

/// Prints setup guidance to stderr for a failed `check_permissions()`.
/// Called before the logger is configured, since a missing grant is exactly
/// the kind of failure a user needs to see even if they ran with `-q`.
#[cfg(target_os = "linux")]
pub fn print_permission_guidance() {
    linux::print_permission_guidance();
}

#[cfg(not(target_os = "linux"))]
pub fn print_permission_guidance() {
    eprintln!("Input device access not available on this platform.");
}
