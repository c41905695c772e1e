//! Data models for the METAR map
//!
//! This module contains the core domain models organized by concern:
//! - Observation: one station's parsed METAR and the per-cycle observation set
//! - Color: RGB values and the fixed palette
//! - Display: resolved color and hazard flags for a slot

pub mod color;
pub mod display;
pub mod observation;

// Re-export all public types for convenient access
pub use color::Rgb;
pub use display::{DisplayState, HazardFlags};
pub use observation::{FlightCategory, Observation, ObservationSet, WeatherDetails};
