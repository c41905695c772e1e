//! `metarmap` - aviation weather LED map
//!
//! This library polls METAR observations for a list of airports, classifies
//! each airport's flight category and wind/lightning hazards, and lays the
//! resulting colors out on an addressable LED strip with a legend block.

pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod render;
pub mod scheduler;
pub mod telemetry;
pub mod weather;

// Re-export core types for public API
pub use config::MetarMapConfig;
pub use display::{AnimationPhase, Classifier, DisplayEngine, LegendSpec, Strip, Thresholds, layout};
pub use error::MetarMapError;
pub use models::{DisplayState, FlightCategory, Observation, ObservationSet, Rgb};
pub use render::{Frame, RenderSink};
pub use scheduler::{RefreshScheduler, SchedulerSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, MetarMapError>;
