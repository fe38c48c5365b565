//! Hand gesture signal shared between the live session and the particle field

use std::fmt;

/// Scale the field expands to while the hand is open
pub const OPEN_SCALE: f32 = 2.5;

/// Scale the field contracts to for a closed or unrecognised hand
pub const CLOSED_SCALE: f32 = 0.5;

/// Discrete classification of the user's hand, produced only by the live session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GestureSignal {
    Open,
    Closed,
    /// No classification has arrived yet
    #[default]
    Unknown,
}

impl GestureSignal {
    /// Wire name used by the declared tool
    pub fn as_str(self) -> &'static str {
        match self {
            GestureSignal::Open => "OPEN",
            GestureSignal::Closed => "CLOSED",
            GestureSignal::Unknown => "UNKNOWN",
        }
    }

    /// Scale the field animates toward while this gesture is held.
    ///
    /// `Unknown` carries no confident reading and contracts exactly like `Closed`.
    pub fn target_scale(self) -> f32 {
        match self {
            GestureSignal::Open => OPEN_SCALE,
            GestureSignal::Closed | GestureSignal::Unknown => CLOSED_SCALE,
        }
    }
}

impl fmt::Display for GestureSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
