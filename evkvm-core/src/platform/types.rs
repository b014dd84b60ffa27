//! Small, platform-neutral descriptions of devices and permission state,
//! trimmed to the fields the switch's device layer actually needs.

/// What a device is used for once enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Keyboard,
    Pointer,
    /// Supports both key and relative-motion events (e.g. some combo
    /// receivers); captured as both a keyboard and a pointer source.
    Both,
}

/// A device discovered during enumeration, before it is opened.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub path: String,
    pub kind: DeviceKind,
}

/// Whether the current process can actually read from and write to input
/// devices on this platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionStatus {
    pub input_group_member: bool,
    pub uinput_writable: bool,
}

impl PermissionStatus {
    pub fn all_granted(&self) -> bool {
        self.input_group_member && self.uinput_writable
    }
}
