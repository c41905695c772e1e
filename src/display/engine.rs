use serde::Serialize;
use tracing::debug;

use super::classifier::{AnimationPhase, Classifier};
use super::layout::{LayoutEntry, SlotSource, Strip, layout};
use super::legend::LegendSpec;
use crate::Result;
use crate::models::color::{CLEAR, Rgb};
use crate::models::ObservationSet;

/// One LED assignment handed to a render sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pixel {
    pub index: usize,
    pub color: Rgb,
}

/// Combines classification, layout and legend rules into per-tick pixels
#[derive(Debug, Clone)]
pub struct DisplayEngine {
    classifier: Classifier,
    airports: Vec<String>,
    legend: LegendSpec,
    strip: Strip,
    clear_placeholders: bool,
}

impl DisplayEngine {
    #[must_use]
    pub fn new(
        classifier: Classifier,
        airports: Vec<String>,
        legend: LegendSpec,
        strip: Strip,
        clear_placeholders: bool,
    ) -> Self {
        Self {
            classifier,
            airports,
            legend,
            strip,
            clear_placeholders,
        }
    }

    #[must_use]
    pub fn airports(&self) -> &[String] {
        &self.airports
    }

    /// Check that airports and legend fit on the strip
    pub fn layout(&self) -> Result<Vec<LayoutEntry>> {
        layout(&self.airports, &self.legend, self.strip)
    }

    /// Resolve every LED for one tick. Nothing is produced if the layout does not fit.
    pub fn frame(&self, observations: &ObservationSet, phase: AnimationPhase) -> Result<Vec<Pixel>> {
        let entries = self.layout()?;
        let mut pixels = Vec::with_capacity(entries.len());

        for entry in entries {
            let color = match &entry.source {
                SlotSource::Airport(code) => {
                    let state = self.classifier.classify(observations.get(code), phase);
                    debug!(
                        index = entry.index,
                        airport = %code,
                        color = %state.color,
                        hazards = %state.hazards,
                        "Setting LED"
                    );
                    state.color
                }
                SlotSource::Placeholder if self.clear_placeholders => CLEAR,
                SlotSource::Placeholder => continue,
                SlotSource::Legend(slot) => slot.color(phase, self.classifier.thresholds()),
            };
            pixels.push(Pixel {
                index: entry.index,
                color,
            });
        }

        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::classifier::Thresholds;
    use crate::models::color;
    use crate::models::{FlightCategory, Observation};
    use chrono::Utc;

    fn engine(airports: &[&str], legend: LegendSpec, length: usize, clear_placeholders: bool) -> DisplayEngine {
        DisplayEngine::new(
            Classifier::new(Thresholds::default()),
            airports.iter().map(ToString::to_string).collect(),
            legend,
            Strip { length },
            clear_placeholders,
        )
    }

    fn observations() -> ObservationSet {
        let now = Utc::now();
        ObservationSet::new(
            vec![
                Observation::new("KLIT", FlightCategory::Ifr, 5, 0, false, now),
                Observation::new("KXNA", FlightCategory::Vfr, 5, 0, true, now),
                // a placeholder must never be looked up, even if the feed sends it
                Observation::new("NULL", FlightCategory::Lifr, 0, 0, false, now),
            ],
            now,
        )
    }

    #[test]
    fn test_frame_colors_airports_and_legend() {
        let engine = engine(&["KLIT", "KXNA", "KFSM"], LegendSpec::standard(5, 0), 8, false);
        let pixels = engine.frame(&observations(), AnimationPhase::Off).unwrap();
        let colors: Vec<_> = pixels.iter().map(|p| (p.index, p.color)).collect();
        assert_eq!(
            colors,
            vec![
                (0, color::IFR),
                (1, color::LIGHTNING),
                (2, color::CLEAR),
                (3, color::VFR),
                (4, color::MVFR),
                (5, color::IFR),
                (6, color::LIFR),
                (7, color::LIGHTNING),
            ]
        );
    }

    #[test]
    fn test_placeholders_skipped_or_cleared() {
        let skipping = engine(&["KLIT", "NULL"], LegendSpec::none(), 2, false);
        let pixels = skipping.frame(&observations(), AnimationPhase::On).unwrap();
        assert_eq!(pixels.len(), 1);
        assert_eq!(pixels[0].index, 0);

        let clearing = engine(&["KLIT", "NULL"], LegendSpec::none(), 2, true);
        let pixels = clearing.frame(&observations(), AnimationPhase::On).unwrap();
        assert_eq!(pixels[1], Pixel { index: 1, color: color::CLEAR });
    }

    #[test]
    fn test_layout_error_produces_no_pixels() {
        let engine = engine(&["KLIT", "KXNA"], LegendSpec::standard(7, 0), 8, false);
        assert!(engine.frame(&observations(), AnimationPhase::On).is_err());
    }
}
