//! Coalesces consecutive relative-motion deltas on the same axis into a
//! single output event, so a physical mouse swept across many kernel events
//! produces one wire event per direction change instead of one per tick.
//!
//! Grounded on `RelativeMovement` in the kybonet prototype, generalized so a
//! delta on a second axis always flushes the first rather than merging into
//! it: a raw kernel event only ever carries one non-zero axis, and letting an
//! unrelated zero-valued axis "agree" with whatever is already accumulated
//! would silently fold unrelated motion together.

use crate::event::{EventRecord, REL_WHEEL, REL_X, REL_Y};

fn sign_conflicts(a: i32, b: i32) -> bool {
    a != 0 && b != 0 && (a as i64) * (b as i64) < 0
}

/// Accumulates relative motion across the three axes this switch forwards.
/// At most one axis is ever non-zero at a time in practice: a delta on a
/// fresh axis always flushes whatever was pending first.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionAccumulator {
    x: i32,
    y: i32,
    wheel: i32,
    time: f64,
    dirty: bool,
}

impl MotionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn component(&self, code: i32) -> i32 {
        match code {
            REL_X => self.x,
            REL_Y => self.y,
            REL_WHEEL => self.wheel,
            _ => 0,
        }
    }

    /// Whether `delta` on `code` can merge into the current accumulator
    /// instead of forcing a flush first.
    fn is_mergeable(&self, code: i32, delta: i32) -> bool {
        if !self.dirty {
            return true;
        }
        for axis in [REL_X, REL_Y, REL_WHEEL] {
            let acc = self.component(axis);
            let incoming = if axis == code { delta } else { 0 };
            if sign_conflicts(acc, incoming) {
                return false;
            }
            if acc == 0 && incoming != 0 && (self.x != 0 || self.y != 0 || self.wheel != 0) {
                return false;
            }
        }
        true
    }

    fn merge(&mut self, code: i32, delta: i32, time: f64) {
        match code {
            REL_X => self.x += delta,
            REL_Y => self.y += delta,
            REL_WHEEL => self.wheel += delta,
            _ => return,
        }
        self.time = time;
        self.dirty = true;
    }

    /// Feed one raw relative-motion event in. Returns a flushed event if the
    /// new delta could not merge into whatever was pending.
    pub fn push(&mut self, record: &EventRecord) -> Option<EventRecord> {
        debug_assert!(record.is_relative_motion());
        let flushed = if self.is_mergeable(record.code, record.value) {
            None
        } else {
            self.flush()
        };
        self.merge(record.code, record.value, record.time);
        flushed
    }

    /// Emit whatever is currently pending (up to three events, one per
    /// non-zero axis) and reset to empty. Call at the end of every capture
    /// batch so motion never waits indefinitely for a disagreeing delta.
    pub fn flush_all(&mut self) -> Vec<EventRecord> {
        let mut out = Vec::with_capacity(1);
        for (code, value) in [(REL_X, self.x), (REL_Y, self.y), (REL_WHEEL, self.wheel)] {
            if value != 0 {
                out.push(EventRecord::relative(code, value, self.time));
            }
        }
        self.reset();
        out
    }

    fn flush(&mut self) -> Option<EventRecord> {
        let events = self.flush_all();
        debug_assert!(events.len() <= 1, "at most one axis is pending at a time");
        events.into_iter().next()
    }

    fn reset(&mut self) {
        self.x = 0;
        self.y = 0;
        self.wheel = 0;
        self.dirty = false;
    }
}
