//! Hotkey dispatch as a plain data table rather than closures, per the
//! switch's redesign guidance: `state.next`/`state.switch(i)` in the kybonet
//! prototype's `server.py` are just a tagged action looked up by scancode.

/// The effect of pressing a bound hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    /// Advance routing to the next subscriber, wrapping around.
    Next,
    /// Route to subscriber at this index directly.
    SwitchTo(usize),
    /// Terminate the publisher process.
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HotkeyBinding {
    scancode: i32,
    action: HotkeyAction,
}

/// Scancode -> action lookup table, built once from configuration at
/// startup. First matching binding wins.
#[derive(Debug, Clone, Default)]
pub struct HotkeyTable {
    bindings: Vec<HotkeyBinding>,
}

impl HotkeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, scancode: i32, action: HotkeyAction) {
        self.bindings.push(HotkeyBinding { scancode, action });
    }

    pub fn lookup(&self, scancode: i32) -> Option<HotkeyAction> {
        self.bindings
            .iter()
            .find(|b| b.scancode == scancode)
            .map(|b| b.action)
    }

    pub fn contains(&self, scancode: i32) -> bool {
        self.bindings.iter().any(|b| b.scancode == scancode)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
