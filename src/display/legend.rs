//! Legend block: fixed reference LEDs explaining the map colors

use serde::{Deserialize, Serialize};
use std::fmt;

use super::classifier::{AnimationPhase, Thresholds};
use crate::models::color::{self, Rgb};

/// What a legend LED demonstrates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendSlot {
    Vfr,
    Mvfr,
    Ifr,
    Lifr,
    Lightning,
    Windy,
    HighWind,
}

/// Wiring order of the classic seven-LED legend
pub const DEFAULT_LEGEND_ORDER: [LegendSlot; 7] = [
    LegendSlot::Vfr,
    LegendSlot::Mvfr,
    LegendSlot::Ifr,
    LegendSlot::Lifr,
    LegendSlot::Lightning,
    LegendSlot::Windy,
    LegendSlot::HighWind,
];

impl LegendSlot {
    /// Color of this legend LED on the given tick
    #[must_use]
    pub fn color(self, phase: AnimationPhase, thresholds: &Thresholds) -> Rgb {
        let off_phase = phase.is_off_phase();
        match self {
            LegendSlot::Vfr => color::VFR,
            LegendSlot::Mvfr => color::MVFR,
            LegendSlot::Ifr => color::IFR,
            LegendSlot::Lifr => color::LIFR,
            LegendSlot::Lightning if !thresholds.lightning_animation => color::CLEAR,
            LegendSlot::Lightning if off_phase => color::LIGHTNING,
            LegendSlot::Windy if !thresholds.wind_animation => color::CLEAR,
            LegendSlot::Windy if off_phase && thresholds.fade_instead_of_blink => color::VFR_FADE,
            LegendSlot::Windy if off_phase => color::CLEAR,
            LegendSlot::HighWind
                if !thresholds.wind_animation || thresholds.high_winds_threshold_kt.is_none() =>
            {
                color::CLEAR
            }
            LegendSlot::HighWind if off_phase => color::HIGH_WINDS,
            LegendSlot::Lightning | LegendSlot::Windy | LegendSlot::HighWind => color::VFR,
        }
    }
}

impl fmt::Display for LegendSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LegendSlot::Vfr => "legend:vfr",
            LegendSlot::Mvfr => "legend:mvfr",
            LegendSlot::Ifr => "legend:ifr",
            LegendSlot::Lifr => "legend:lifr",
            LegendSlot::Lightning => "legend:lightning",
            LegendSlot::Windy => "legend:windy",
            LegendSlot::HighWind => "legend:high_wind",
        };
        f.write_str(name)
    }
}

/// Reserved legend LEDs placed after the airports
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegendSpec {
    /// Unused LEDs between the last airport and the legend
    pub offset: usize,
    pub slots: Vec<LegendSlot>,
}

impl LegendSpec {
    #[must_use]
    pub fn new(offset: usize, slots: Vec<LegendSlot>) -> Self {
        Self { offset, slots }
    }

    /// No legend at all
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// First `size` slots of the default order
    #[must_use]
    pub fn standard(size: usize, offset: usize) -> Self {
        Self {
            offset,
            slots: DEFAULT_LEGEND_ORDER.iter().copied().take(size).collect(),
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn animated() -> Thresholds {
        Thresholds {
            wind_animation: true,
            lightning_animation: true,
            ..Thresholds::default()
        }
    }

    #[rstest]
    #[case(LegendSlot::Vfr, color::VFR, color::VFR)]
    #[case(LegendSlot::Mvfr, color::MVFR, color::MVFR)]
    #[case(LegendSlot::Ifr, color::IFR, color::IFR)]
    #[case(LegendSlot::Lifr, color::LIFR, color::LIFR)]
    #[case(LegendSlot::Lightning, color::VFR, color::LIGHTNING)]
    #[case(LegendSlot::Windy, color::VFR, color::VFR_FADE)]
    #[case(LegendSlot::HighWind, color::VFR, color::HIGH_WINDS)]
    fn test_legend_blink(#[case] slot: LegendSlot, #[case] on: Rgb, #[case] off: Rgb) {
        let thresholds = animated();
        assert_eq!(slot.color(AnimationPhase::On, &thresholds), on);
        assert_eq!(slot.color(AnimationPhase::Off, &thresholds), off);
    }

    #[test]
    fn test_disabled_features_are_dark() {
        let thresholds = Thresholds {
            wind_animation: false,
            lightning_animation: false,
            ..Thresholds::default()
        };
        for slot in [LegendSlot::Lightning, LegendSlot::Windy, LegendSlot::HighWind] {
            for phase in [AnimationPhase::On, AnimationPhase::Off] {
                assert_eq!(slot.color(phase, &thresholds), color::CLEAR);
            }
        }
    }

    #[test]
    fn test_high_wind_legend_needs_threshold() {
        let thresholds = Thresholds {
            high_winds_threshold_kt: None,
            ..animated()
        };
        assert_eq!(LegendSlot::HighWind.color(AnimationPhase::Off, &thresholds), color::CLEAR);
    }

    #[test]
    fn test_windy_legend_blinks_without_fade() {
        let thresholds = Thresholds {
            fade_instead_of_blink: false,
            ..animated()
        };
        assert_eq!(LegendSlot::Windy.color(AnimationPhase::Off, &thresholds), color::CLEAR);
        assert_eq!(LegendSlot::Windy.color(AnimationPhase::On, &thresholds), color::VFR);
    }

    #[test]
    fn test_standard_legend_truncates_default_order() {
        let legend = LegendSpec::standard(4, 0);
        assert_eq!(legend.size(), 4);
        assert_eq!(legend.slots.last(), Some(&LegendSlot::Lifr));
    }
}
