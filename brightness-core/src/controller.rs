//! Rate-limited brightness controller.
//!
//! The controller remembers the brightness that was last applied to the
//! display and, on every tick, moves it at most one percent towards the
//! target prescribed by the curve. A light switch flipping therefore fades
//! the display over several ticks instead of making it jump.
//!
//! One controller drives one display. The curve can be owned or shared
//! between several controllers (`&Curve`, `Arc<Curve>`).

use core::cmp::Ordering;

use crate::curve::{Curve, MAX_BRIGHTNESS};

#[derive(Debug, Clone)]
pub struct Controller<C = Curve> {
    curve: C,
    /// Brightness that was last commanded to the display
    applied: u8,
}

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Update {
    /// Brightness after this tick
    pub applied: u8,
    /// Brightness the curve prescribes for the reading
    pub target: u8,
    /// Whether `applied` moved, i.e. whether the display must be updated
    pub changed: bool,
}

impl Update {
    pub fn is_settled(&self) -> bool {
        self.applied == self.target
    }
}

impl<C: AsRef<Curve>> Controller<C> {
    /// Create a controller whose applied brightness is the curve value for
    /// the initial reading.
    pub fn new(curve: C, initial_lux: f64) -> Self {
        let applied = curve.as_ref().evaluate(initial_lux);
        Self { curve, applied }
    }

    /// Create a controller starting from a known brightness.
    pub fn with_applied(curve: C, applied: u8) -> Self {
        Self {
            curve,
            applied: applied.min(MAX_BRIGHTNESS),
        }
    }

    pub fn curve(&self) -> &Curve {
        self.curve.as_ref()
    }

    pub fn applied(&self) -> u8 {
        self.applied
    }

    pub fn target(&self, lux: f64) -> u8 {
        self.curve().evaluate(lux)
    }

    /// Advance the applied brightness one step towards the target for `lux`.
    pub fn tick(&mut self, lux: f64) -> Update {
        let target = self.target(lux);
        let changed = match target.cmp(&self.applied) {
            Ordering::Equal => false,
            Ordering::Greater => {
                self.applied += 1;
                true
            }
            Ordering::Less => {
                self.applied -= 1;
                true
            }
        };
        Update {
            applied: self.applied,
            target,
            changed,
        }
    }
}
