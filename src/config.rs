//! Configuration management for the METAR map
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::MetarMapError;
use crate::display::{
    BrightnessSchedule, DEFAULT_LEGEND_ORDER, LegendSlot, LegendSpec, PLACEHOLDER_CODE, Strip,
    Thresholds,
};
use anyhow::{Context, Result};
use chrono::NaiveTime;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Value of `high_winds_threshold_kt` that turns the high winds color off
pub const HIGH_WINDS_DISABLED: i32 = -1;

/// Root configuration structure for the METAR map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetarMapConfig {
    /// Weather feed settings
    #[serde(default)]
    pub feed: FeedConfig,
    /// Wind and lightning animation settings
    #[serde(default)]
    pub animation: AnimationConfig,
    /// Legend block settings
    #[serde(default)]
    pub legend: LegendConfig,
    /// LED strip settings
    #[serde(default)]
    pub strip: StripConfig,
    /// Night dimming settings
    #[serde(default)]
    pub dimming: DimmingConfig,
    /// Airport list, in LED wiring order
    #[serde(default)]
    pub airports: AirportsConfig,
    /// Where frames go
    #[serde(default)]
    pub output: OutputConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Weather feed configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Data server endpoint
    #[serde(default = "default_feed_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_feed_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_feed_max_retries")]
    pub max_retries: u32,
    /// Seconds between feed refreshes
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
    /// Look-back window for the most recent report
    #[serde(default = "default_hours_before_now")]
    pub hours_before_now: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Animation configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default)]
    pub wind_animation: bool,
    #[serde(default = "default_true")]
    pub lightning_animation: bool,
    /// Dim windy airports instead of blinking them off
    #[serde(default = "default_true")]
    pub fade_instead_of_blink: bool,
    /// Knots at which an airport starts to blink or fade
    #[serde(default = "default_wind_blink_threshold")]
    pub wind_blink_threshold_kt: u32,
    /// Knots for the high winds color, -1 to disable
    #[serde(default = "default_high_winds_threshold")]
    pub high_winds_threshold_kt: i32,
    /// Animate every reported gust, even below the blink threshold
    #[serde(default)]
    pub always_blink_for_gusts: bool,
    /// Milliseconds between animation ticks
    #[serde(default = "default_blink_speed_ms")]
    pub blink_speed_ms: u64,
}

/// Legend configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegendConfig {
    #[serde(default = "default_true")]
    pub show_legend: bool,
    /// Number of legend LEDs
    #[serde(default = "default_legend_size")]
    pub size: usize,
    /// Unused LEDs between the last airport and the legend
    #[serde(default)]
    pub offset: usize,
    /// Explicit legend order; defaults to the first `size` of the standard order
    #[serde(default)]
    pub slots: Option<Vec<LegendSlot>>,
}

/// LED strip configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripConfig {
    /// Total number of LEDs on the strip
    #[serde(default = "default_led_count")]
    pub led_count: usize,
    /// Normal brightness, 0.0 to 1.0
    #[serde(default = "default_brightness")]
    pub brightness: f32,
    /// Write black to placeholder LEDs instead of leaving them untouched
    #[serde(default)]
    pub clear_placeholders: bool,
}

/// Night dimming configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimmingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dim_brightness")]
    pub dim_brightness: f32,
    /// `HH:MM` local time
    #[serde(default = "default_bright_time_start")]
    pub bright_time_start: String,
    /// `HH:MM` local time
    #[serde(default = "default_dim_time_start")]
    pub dim_time_start: String,
    /// Follow local sunrise and sunset instead of the fixed times
    #[serde(default)]
    pub use_sunrise_sunset: bool,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Airport list configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirportsConfig {
    /// Inline ICAO codes; `NULL` reserves an LED
    #[serde(default)]
    pub codes: Vec<String>,
    /// File with one code per line, used when `codes` is empty
    #[serde(default)]
    pub file: Option<String>,
}

/// Frame output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// `log` or `json`
    #[serde(default = "default_output_sink")]
    pub sink: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_feed_base_url() -> String {
    "https://aviationweather.gov/cgi-bin/data/dataserver.php".to_string()
}

fn default_feed_timeout() -> u32 {
    30
}

fn default_feed_max_retries() -> u32 {
    3
}

fn default_refresh_interval() -> u64 {
    300
}

fn default_hours_before_now() -> u32 {
    5
}

fn default_user_agent() -> String {
    format!("metarmap/{}", crate::VERSION)
}

fn default_wind_blink_threshold() -> u32 {
    15
}

fn default_high_winds_threshold() -> i32 {
    25
}

fn default_blink_speed_ms() -> u64 {
    500
}

fn default_legend_size() -> usize {
    DEFAULT_LEGEND_ORDER.len()
}

fn default_led_count() -> usize {
    50
}

fn default_brightness() -> f32 {
    0.5
}

fn default_dim_brightness() -> f32 {
    0.1
}

fn default_bright_time_start() -> String {
    "07:00".to_string()
}

fn default_dim_time_start() -> String {
    "19:00".to_string()
}

fn default_output_sink() -> String {
    "log".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_feed_base_url(),
            timeout_seconds: default_feed_timeout(),
            max_retries: default_feed_max_retries(),
            refresh_interval_seconds: default_refresh_interval(),
            hours_before_now: default_hours_before_now(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            wind_animation: false,
            lightning_animation: true,
            fade_instead_of_blink: true,
            wind_blink_threshold_kt: default_wind_blink_threshold(),
            high_winds_threshold_kt: default_high_winds_threshold(),
            always_blink_for_gusts: false,
            blink_speed_ms: default_blink_speed_ms(),
        }
    }
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            show_legend: true,
            size: default_legend_size(),
            offset: 0,
            slots: None,
        }
    }
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            led_count: default_led_count(),
            brightness: default_brightness(),
            clear_placeholders: false,
        }
    }
}

impl Default for DimmingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dim_brightness: default_dim_brightness(),
            bright_time_start: default_bright_time_start(),
            dim_time_start: default_dim_time_start(),
            use_sunrise_sunset: false,
            latitude: None,
            longitude: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sink: default_output_sink(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn parse_time_of_day(name: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
        MetarMapError::config(format!("Invalid {name} '{value}'. Expected HH:MM")).into()
    })
}

impl MetarMapConfig {
    /// Load configuration from a file and `METARMAP_` environment variables.
    /// Without a path, the user config dir and then `./config.toml` are tried.
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Add environment variable overrides with METARMAP_ prefix
        builder = builder.add_source(
            Environment::with_prefix("METARMAP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: MetarMapConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("metarmap").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.feed.base_url.is_empty() {
            self.feed.base_url = default_feed_base_url();
        }
        if self.feed.timeout_seconds == 0 {
            self.feed.timeout_seconds = default_feed_timeout();
        }
        if self.feed.refresh_interval_seconds == 0 {
            self.feed.refresh_interval_seconds = default_refresh_interval();
        }
        if self.feed.user_agent.is_empty() {
            self.feed.user_agent = default_user_agent();
        }
        if self.animation.blink_speed_ms == 0 {
            self.animation.blink_speed_ms = default_blink_speed_ms();
        }
        if self.output.sink.is_empty() {
            self.output.sink = default_output_sink();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_legend()?;
        self.validate_dimming()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.feed.timeout_seconds > 300 {
            return Err(MetarMapError::config("Feed timeout cannot exceed 300 seconds").into());
        }

        if self.feed.max_retries > 10 {
            return Err(MetarMapError::config("Feed max retries cannot exceed 10").into());
        }

        if self.feed.refresh_interval_seconds < 60 {
            return Err(MetarMapError::config(
                "Feed refresh interval must be at least 60 seconds",
            )
            .into());
        }

        if self.animation.high_winds_threshold_kt < HIGH_WINDS_DISABLED {
            return Err(MetarMapError::config(format!(
                "High winds threshold must be >= 0 knots, or {HIGH_WINDS_DISABLED} to disable"
            ))
            .into());
        }

        if self.strip.led_count == 0 {
            return Err(MetarMapError::config("Strip LED count must be greater than 0").into());
        }

        for (name, value) in [
            ("strip brightness", self.strip.brightness),
            ("dim brightness", self.dimming.dim_brightness),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(MetarMapError::config(format!(
                    "{name} must be between 0.0 and 1.0, got {value}"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(MetarMapError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(MetarMapError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let valid_sinks = ["log", "json"];
        if !valid_sinks.contains(&self.output.sink.as_str()) {
            return Err(MetarMapError::config(format!(
                "Invalid output sink '{}'. Must be one of: {}",
                self.output.sink,
                valid_sinks.join(", ")
            ))
            .into());
        }

        if !self.feed.base_url.starts_with("http://") && !self.feed.base_url.starts_with("https://") {
            return Err(
                MetarMapError::config("Feed base URL must be a valid HTTP or HTTPS URL").into(),
            );
        }

        Ok(())
    }

    fn validate_legend(&self) -> Result<()> {
        let legend = &self.legend;
        match &legend.slots {
            Some(slots) if slots.len() != legend.size => Err(MetarMapError::config(format!(
                "Legend size is {} but {} legend slots are listed",
                legend.size,
                slots.len()
            ))
            .into()),
            None if legend.size > DEFAULT_LEGEND_ORDER.len() => Err(MetarMapError::config(format!(
                "Legend size cannot exceed {} without an explicit slot list",
                DEFAULT_LEGEND_ORDER.len()
            ))
            .into()),
            _ => Ok(()),
        }
    }

    fn validate_dimming(&self) -> Result<()> {
        parse_time_of_day("bright_time_start", &self.dimming.bright_time_start)?;
        parse_time_of_day("dim_time_start", &self.dimming.dim_time_start)?;

        if self.dimming.use_sunrise_sunset {
            match (self.dimming.latitude, self.dimming.longitude) {
                (Some(lat), Some(lng)) if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) => {}
                (Some(_), Some(_)) => {
                    return Err(MetarMapError::config("Dimming coordinates are out of range").into());
                }
                _ => {
                    return Err(MetarMapError::config(
                        "use_sunrise_sunset requires dimming.latitude and dimming.longitude",
                    )
                    .into());
                }
            }
        }

        Ok(())
    }

    /// Classification thresholds and animation toggles
    #[must_use]
    pub fn thresholds(&self) -> Thresholds {
        let a = &self.animation;
        Thresholds {
            wind_animation: a.wind_animation,
            lightning_animation: a.lightning_animation,
            fade_instead_of_blink: a.fade_instead_of_blink,
            wind_blink_threshold_kt: a.wind_blink_threshold_kt,
            high_winds_threshold_kt: u32::try_from(a.high_winds_threshold_kt).ok(),
            always_blink_for_gusts: a.always_blink_for_gusts,
        }
    }

    /// Legend block, empty when the legend is switched off
    #[must_use]
    pub fn legend_spec(&self) -> LegendSpec {
        if !self.legend.show_legend {
            return LegendSpec::none();
        }
        match &self.legend.slots {
            Some(slots) => LegendSpec::new(self.legend.offset, slots.clone()),
            None => LegendSpec::standard(self.legend.size, self.legend.offset),
        }
    }

    #[must_use]
    pub fn strip(&self) -> Strip {
        Strip {
            length: self.strip.led_count,
        }
    }

    pub fn brightness_schedule(&self) -> Result<BrightnessSchedule> {
        let d = &self.dimming;
        let location = match (d.use_sunrise_sunset, d.latitude, d.longitude) {
            (true, Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        };
        Ok(BrightnessSchedule {
            enabled: d.enabled,
            bright: self.strip.brightness,
            dim: d.dim_brightness,
            bright_start: parse_time_of_day("bright_time_start", &d.bright_time_start)?,
            dim_start: parse_time_of_day("dim_time_start", &d.dim_time_start)?,
            location,
        })
    }

    #[must_use]
    pub fn blink_interval(&self) -> Duration {
        Duration::from_millis(self.animation.blink_speed_ms)
    }

    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.feed.refresh_interval_seconds)
    }

    /// Upper bound for one refresh, retries included
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.feed.timeout_seconds) * u64::from(self.feed.max_retries + 1))
    }

    /// Airport codes in wiring order, from the inline list or the airports file
    pub fn load_airports(&self) -> Result<Vec<String>> {
        let codes = if self.airports.codes.is_empty() {
            match &self.airports.file {
                Some(path) => read_airports_file(Path::new(path))?,
                None => Vec::new(),
            }
        } else {
            self.airports
                .codes
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect()
        };

        if !codes.iter().any(|c| !c.eq_ignore_ascii_case(PLACEHOLDER_CODE)) {
            return Err(MetarMapError::config(
                "No airports configured. Set airports.codes or airports.file",
            )
            .into());
        }

        Ok(codes)
    }
}

/// One code per line; blank lines are ignored
pub fn read_airports_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .map_err(MetarMapError::from)
        .with_context(|| format!("Failed to read airports file: {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = MetarMapConfig::default();
        assert_eq!(
            config.feed.base_url,
            "https://aviationweather.gov/cgi-bin/data/dataserver.php"
        );
        assert_eq!(config.feed.timeout_seconds, 30);
        assert_eq!(config.animation.wind_blink_threshold_kt, 15);
        assert_eq!(config.animation.high_winds_threshold_kt, 25);
        assert_eq!(config.legend.size, 7);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_high_winds_can_be_disabled() {
        let mut config = MetarMapConfig::default();
        config.animation.high_winds_threshold_kt = HIGH_WINDS_DISABLED;
        assert!(config.validate().is_ok());
        assert_eq!(config.thresholds().high_winds_threshold_kt, None);

        config.animation.high_winds_threshold_kt = -5;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("High winds threshold"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = MetarMapConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = MetarMapConfig::default();
        config.feed.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));

        let mut config = MetarMapConfig::default();
        config.strip.brightness = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_legend_validation() {
        let mut config = MetarMapConfig::default();
        config.legend.size = 9;
        assert!(config.validate().is_err());

        config.legend.slots = Some(vec![LegendSlot::Vfr; 9]);
        assert!(config.validate().is_ok());
        assert_eq!(config.legend_spec().size(), 9);

        config.legend.slots = Some(vec![LegendSlot::Vfr; 2]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_hidden_legend_takes_no_leds() {
        let mut config = MetarMapConfig::default();
        config.legend.show_legend = false;
        assert_eq!(config.legend_spec().size(), 0);
    }

    #[test]
    fn test_sunrise_sunset_needs_coordinates() {
        let mut config = MetarMapConfig::default();
        config.dimming.use_sunrise_sunset = true;
        assert!(config.validate().is_err());

        config.dimming.latitude = Some(34.7465);
        config.dimming.longitude = Some(-92.2896);
        assert!(config.validate().is_ok());
        assert!(config.brightness_schedule().unwrap().location.is_some());
    }

    #[test]
    fn test_invalid_time_of_day() {
        let mut config = MetarMapConfig::default();
        config.dimming.dim_time_start = "7pm".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("dim_time_start"));
    }

    #[test]
    fn test_load_airports_inline() {
        let mut config = MetarMapConfig::default();
        config.airports.codes = vec!["KLIT".into(), " ".into(), "NULL".into(), "KXNA ".into()];
        assert_eq!(config.load_airports().unwrap(), vec!["KLIT", "NULL", "KXNA"]);
    }

    #[test]
    fn test_load_airports_requires_a_station() {
        let mut config = MetarMapConfig::default();
        assert!(config.load_airports().is_err());

        config.airports.codes = vec!["NULL".into()];
        assert!(config.load_airports().is_err());
    }

    #[test]
    fn test_load_airports_from_file() {
        let path = std::env::temp_dir().join(format!("metarmap-airports-{}", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "KLIT\n\nNULL\n  KXNA  ").unwrap();

        let mut config = MetarMapConfig::default();
        config.airports.file = Some(path.to_string_lossy().into_owned());
        let airports = config.load_airports();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(airports.unwrap(), vec!["KLIT", "NULL", "KXNA"]);
    }

    #[test]
    fn test_load_from_toml_file() {
        let path = std::env::temp_dir().join(format!("metarmap-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
[animation]
wind_animation = true
high_winds_threshold_kt = -1

[strip]
led_count = 20

[legend]
slots = ["vfr", "lightning"]
size = 2

[airports]
codes = ["KLIT", "NULL", "KXNA"]
"#,
        )
        .unwrap();

        let config = MetarMapConfig::load_from_path(Some(path.clone()));
        std::fs::remove_file(&path).unwrap();
        let config = config.unwrap();

        assert!(config.animation.wind_animation);
        assert_eq!(config.thresholds().high_winds_threshold_kt, None);
        assert_eq!(config.strip().length, 20);
        assert_eq!(
            config.legend_spec().slots,
            vec![LegendSlot::Vfr, LegendSlot::Lightning]
        );
        assert_eq!(config.load_airports().unwrap().len(), 3);
        // untouched sections keep their defaults
        assert_eq!(config.feed.refresh_interval_seconds, 300);
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = MetarMapConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("metarmap"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
