//! Neutral representation of a single input event, shared by every platform
//! backend and carried verbatim across the wire.

use serde::{Deserialize, Serialize};

/// Linux `EV_KEY` event type, reused directly as the wire `etype` value.
pub const EV_KEY: i32 = 1;
/// Linux `EV_REL` event type, reused directly as the wire `etype` value.
pub const EV_REL: i32 = 2;

/// Linux `REL_X` axis code.
pub const REL_X: i32 = 0;
/// Linux `REL_Y` axis code.
pub const REL_Y: i32 = 1;
/// Linux `REL_WHEEL` axis code.
pub const REL_WHEEL: i32 = 8;

/// `value` a key event carries when the key is released.
pub const KEY_UP: i32 = 0;
/// `value` a key event carries when the key is pressed.
pub const KEY_DOWN: i32 = 1;
/// `value` a key event carries on autorepeat; treated as a press for routing
/// purposes but never re-triggers a hotkey action.
pub const KEY_REPEAT: i32 = 2;

/// A single neutral input event: a key/button transition or a relative
/// motion delta on one axis, timestamped at capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub etype: i32,
    pub code: i32,
    pub value: i32,
    /// Seconds since the Unix epoch, as a float per the wire contract.
    /// Informational only: consumers never reorder on it.
    pub time: f64,
}

impl EventRecord {
    pub fn key(code: i32, value: i32, time: f64) -> Self {
        Self {
            etype: EV_KEY,
            code,
            value,
            time,
        }
    }

    pub fn relative(code: i32, value: i32, time: f64) -> Self {
        Self {
            etype: EV_REL,
            code,
            value,
            time,
        }
    }

    /// A key/button transition with a value of 0 (release), 1 (press) or
    /// 2 (autorepeat).
    pub fn is_key_event(&self) -> bool {
        self.etype == EV_KEY && matches!(self.value, KEY_UP | KEY_DOWN | KEY_REPEAT)
    }

    pub fn is_pressed(&self) -> bool {
        self.is_key_event() && self.value != KEY_UP
    }

    pub fn is_released(&self) -> bool {
        self.is_key_event() && self.value == KEY_UP
    }

    /// A relative-motion delta on one of the three axes this switch cares
    /// about: X, Y or the scroll wheel.
    pub fn is_relative_motion(&self) -> bool {
        self.etype == EV_REL && matches!(self.code, REL_X | REL_Y | REL_WHEEL)
    }
}
