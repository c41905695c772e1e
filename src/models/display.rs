//! Resolved per-slot display output

use serde::Serialize;
use std::fmt;

use super::color::{CLEAR, Rgb};

/// Hazards active for a slot on the current tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HazardFlags {
    pub lightning: bool,
    pub high_wind: bool,
    pub windy: bool,
}

impl HazardFlags {
    #[must_use]
    pub fn any(self) -> bool {
        self.lightning || self.high_wind || self.windy
    }
}

impl fmt::Display for HazardFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.lightning {
            names.push("lightning");
        }
        if self.high_wind {
            names.push("high winds");
        }
        if self.windy {
            names.push("windy");
        }
        f.write_str(&names.join(","))
    }
}

/// Color and hazards for one slot at one animation tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayState {
    pub color: Rgb,
    pub hazards: HazardFlags,
}

impl DisplayState {
    /// LED off, no hazards
    #[must_use]
    pub fn off() -> Self {
        Self {
            color: CLEAR,
            hazards: HazardFlags::default(),
        }
    }
}
