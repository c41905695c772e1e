//! Error types and handling for the METAR map

use thiserror::Error;

/// Main error type for the METAR map
#[derive(Error, Debug)]
pub enum MetarMapError {
    /// Weather feed could not be reached or answered with an error
    #[error("Fetch error: {message}")]
    Fetch { message: String },

    /// Weather feed payload could not be decoded
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Airports plus legend do not fit on the strip
    #[error("Layout error: {required} LEDs required but strip has {available}")]
    Layout { required: usize, available: usize },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Render sink rejected a frame
    #[error("Render error: {message}")]
    Render { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl MetarMapError {
    /// Create a new fetch error
    pub fn fetch<S: Into<String>>(message: S) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new layout error
    #[must_use]
    pub fn layout(required: usize, available: usize) -> Self {
        Self::Layout {
            required,
            available,
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new render error
    pub fn render<S: Into<String>>(message: S) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            MetarMapError::Fetch { .. } => {
                "Unable to reach the weather feed. Showing last known conditions.".to_string()
            }
            MetarMapError::Parse { .. } => {
                "Weather feed returned data that could not be read.".to_string()
            }
            MetarMapError::Layout {
                required,
                available,
            } => format!(
                "Not enough LEDs: {required} needed, {available} available. Increase strip.led_count or remove airports."
            ),
            MetarMapError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            MetarMapError::Render { .. } => "LED output failed.".to_string(),
            MetarMapError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
