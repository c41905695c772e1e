//! Display module
//!
//! Everything between a cached observation set and the LED colors:
//! - Condition classification with hazard precedence
//! - LED index layout for airports, placeholders and the legend
//! - Per-tick frame assembly
//! - Day/night brightness scheduling

pub mod brightness;
pub mod classifier;
pub mod engine;
pub mod layout;
pub mod legend;

pub use brightness::BrightnessSchedule;
pub use classifier::{AnimationPhase, CategoryPalette, Classifier, Thresholds};
pub use engine::{DisplayEngine, Pixel};
pub use layout::{AirportSlot, LayoutEntry, PLACEHOLDER_CODE, SlotCode, SlotSource, Strip, layout};
pub use legend::{DEFAULT_LEGEND_ORDER, LegendSlot, LegendSpec};
