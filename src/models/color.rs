//! RGB colors and the map palette

use serde::{Deserialize, Serialize};
use std::fmt;

/// One LED color, each channel 0-255
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b)
    }

    #[must_use]
    pub fn is_off(self) -> bool {
        self == CLEAR
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0, self.1, self.2)
    }
}

pub const VFR: Rgb = Rgb::new(0, 255, 0);
pub const VFR_FADE: Rgb = Rgb::new(0, 125, 0);
pub const MVFR: Rgb = Rgb::new(0, 0, 255);
pub const MVFR_FADE: Rgb = Rgb::new(0, 0, 125);
pub const IFR: Rgb = Rgb::new(255, 0, 0);
pub const IFR_FADE: Rgb = Rgb::new(125, 0, 0);
pub const LIFR: Rgb = Rgb::new(255, 0, 255);
pub const LIFR_FADE: Rgb = Rgb::new(125, 0, 125);
/// LED off
pub const CLEAR: Rgb = Rgb::new(0, 0, 0);
pub const LIGHTNING: Rgb = Rgb::new(255, 255, 255);
pub const HIGH_WINDS: Rgb = Rgb::new(255, 255, 0);
