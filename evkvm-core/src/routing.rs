//! Tracks which subscriber currently receives input, and which keys are
//! down so a destination switch mid-keystroke doesn't leave a phantom key
//! held on either side.
//!
//! Grounded on the `State` class in the kybonet prototype's `server.py`
//! (`next()`, `switch(sub)`), restructured per the switch's redesign
//! guidance into an immutable subscriber record plus a small state struct
//! instead of closures capturing a socket.

use std::collections::HashMap;

use rsa::RsaPublicKey;

/// Where a subscriber's encrypted events ultimately get delivered.
#[derive(Debug, Clone)]
pub enum Destination {
    /// Injected back into this same machine.
    Local,
    /// Sent over the network, encrypted to this public key.
    Remote { public_key: RsaPublicKey },
}

/// One configured destination for routed input.
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub name: String,
    /// Scancode that switches directly to this subscriber, if configured.
    pub hotkey: Option<i32>,
    pub destination: Destination,
}

impl Subscriber {
    pub fn is_local(&self) -> bool {
        matches!(self.destination, Destination::Local)
    }

    pub fn public_key(&self) -> Option<&RsaPublicKey> {
        match &self.destination {
            Destination::Local => None,
            Destination::Remote { public_key } => Some(public_key),
        }
    }
}

/// Which subscriber is currently active, and which scancodes are currently
/// held down against it.
#[derive(Debug, Clone, Default)]
pub struct RoutingState {
    current_idx: usize,
    /// Populated on press, removed on release or on a destination switch.
    pressed_keys: HashMap<i32, bool>,
}

impl RoutingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_idx(&self) -> usize {
        self.current_idx
    }

    pub fn mark_pressed(&mut self, scancode: i32) {
        self.pressed_keys.insert(scancode, true);
    }

    pub fn mark_released(&mut self, scancode: i32) {
        self.pressed_keys.remove(&scancode);
    }

    pub fn is_pressed(&self, scancode: i32) -> bool {
        self.pressed_keys.get(&scancode).copied().unwrap_or(false)
    }

    /// Every scancode currently considered held down, in no particular
    /// order. Used to synthesize release events for the outgoing
    /// destination when routing switches away from it mid-keystroke.
    pub fn held_keys(&self) -> Vec<i32> {
        self.pressed_keys.keys().copied().collect()
    }

    pub fn clear_pressed(&mut self) {
        self.pressed_keys.clear();
    }

    /// Advances to the next subscriber, wrapping around, and clears the
    /// held-key set so a switch mid-keystroke can't leave a phantom press.
    pub fn next(&mut self, subscriber_count: usize) -> usize {
        if subscriber_count == 0 {
            return self.current_idx;
        }
        self.current_idx = (self.current_idx + 1) % subscriber_count;
        self.clear_pressed();
        self.current_idx
    }

    /// Switches directly to subscriber `idx`. Returns `false` (and leaves
    /// routing unchanged) if `idx` is out of range.
    pub fn switch_to(&mut self, idx: usize, subscriber_count: usize) -> bool {
        if idx >= subscriber_count {
            return false;
        }
        self.current_idx = idx;
        self.clear_pressed();
        true
    }
}
