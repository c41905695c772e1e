//! Condition classifier
//!
//! Turns one station's observation plus the current animation phase into the
//! color shown on its LED. Flight category picks the base color; hazards
//! override it in a fixed precedence order.

use serde::{Deserialize, Serialize};

use crate::models::color::{self, Rgb};
use crate::models::{DisplayState, FlightCategory, HazardFlags, Observation};

/// Feature toggles and wind limits used for classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub wind_animation: bool,
    pub lightning_animation: bool,
    /// Dim the category color on windy ticks instead of switching the LED off
    pub fade_instead_of_blink: bool,
    pub wind_blink_threshold_kt: u32,
    /// `None` disables the high winds color
    pub high_winds_threshold_kt: Option<u32>,
    /// Any reported gust animates, regardless of the blink threshold
    pub always_blink_for_gusts: bool,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            wind_animation: false,
            lightning_animation: true,
            fade_instead_of_blink: true,
            wind_blink_threshold_kt: 15,
            high_winds_threshold_kt: Some(25),
            always_blink_for_gusts: false,
        }
    }
}

/// Alternating animation tick. Hazards show on the off-phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnimationPhase {
    On,
    Off,
}

impl AnimationPhase {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            AnimationPhase::On => AnimationPhase::Off,
            AnimationPhase::Off => AnimationPhase::On,
        }
    }

    #[must_use]
    pub fn is_off_phase(self) -> bool {
        self == AnimationPhase::Off
    }
}

/// Base and windy-fade color of a flight category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryPalette {
    pub base: Rgb,
    pub fade: Rgb,
}

impl CategoryPalette {
    #[must_use]
    pub fn for_category(category: FlightCategory) -> Self {
        let (base, fade) = match category {
            FlightCategory::Vfr => (color::VFR, color::VFR_FADE),
            FlightCategory::Mvfr => (color::MVFR, color::MVFR_FADE),
            FlightCategory::Ifr => (color::IFR, color::IFR_FADE),
            FlightCategory::Lifr => (color::LIFR, color::LIFR_FADE),
            FlightCategory::Unknown => (color::CLEAR, color::CLEAR),
        };
        Self { base, fade }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hazard {
    Lightning,
    HighWind,
    Windy,
}

/// Highest priority first
const HAZARD_PRECEDENCE: [Hazard; 3] = [Hazard::Lightning, Hazard::HighWind, Hazard::Windy];

impl Hazard {
    fn is_active(self, flags: HazardFlags) -> bool {
        match self {
            Hazard::Lightning => flags.lightning,
            Hazard::HighWind => flags.high_wind,
            Hazard::Windy => flags.windy,
        }
    }

    fn color(self, palette: CategoryPalette, fade_instead_of_blink: bool) -> Rgb {
        match self {
            Hazard::Lightning => color::LIGHTNING,
            Hazard::HighWind => color::HIGH_WINDS,
            Hazard::Windy if fade_instead_of_blink => palette.fade,
            Hazard::Windy => color::CLEAR,
        }
    }
}

/// Pick the color for a set of hazard flags: first active hazard wins, else the base color
#[must_use]
pub fn resolve_color(flags: HazardFlags, palette: CategoryPalette, fade_instead_of_blink: bool) -> Rgb {
    HAZARD_PRECEDENCE
        .iter()
        .find(|hazard| hazard.is_active(flags))
        .map_or(palette.base, |hazard| hazard.color(palette, fade_instead_of_blink))
}

/// Pure observation-to-color classifier
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    thresholds: Thresholds,
}

impl Classifier {
    #[must_use]
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    #[must_use]
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Resolve the display state for one station. A missing observation is off.
    #[must_use]
    pub fn classify(&self, obs: Option<&Observation>, phase: AnimationPhase) -> DisplayState {
        let Some(obs) = obs else {
            return DisplayState::off();
        };

        let hazards = self.hazards(obs, phase);
        let palette = CategoryPalette::for_category(obs.flight_category);
        DisplayState {
            color: resolve_color(hazards, palette, self.thresholds.fade_instead_of_blink),
            hazards,
        }
    }

    fn hazards(&self, obs: &Observation, phase: AnimationPhase) -> HazardFlags {
        let t = &self.thresholds;
        let off_phase = phase.is_off_phase();

        let gusting = obs.wind_gust_kt > 0
            && (t.always_blink_for_gusts || obs.wind_gust_kt > t.wind_blink_threshold_kt);
        let windy = t.wind_animation
            && off_phase
            && (obs.wind_speed_kt >= t.wind_blink_threshold_kt || gusting);
        let high_wind = windy
            && t.high_winds_threshold_kt.is_some_and(|high| {
                obs.wind_speed_kt >= high || obs.wind_gust_kt >= high
            });
        let lightning = t.lightning_animation && off_phase && obs.has_lightning;

        HazardFlags {
            lightning,
            high_wind,
            windy,
        }
    }
}
