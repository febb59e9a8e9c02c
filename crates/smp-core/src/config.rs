//! # Configuration System
//!
//! YAML configuration for strong-motion processing:
//!
//! - Filter settings (roll-off, taper length, differentiation order)
//! - QC thresholds on initial/residual velocity and residual displacement
//! - Event onset detection (method, AIC window, buffer)
//! - Baseline correction strategy and its search ranges
//! - Strong-motion parameter thresholds and logging
//!
//! The configuration is read once and passed by reference into every stage.
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `SMP_CONFIG` environment variable
//! 2. `./smp.yaml` (current directory)
//! 3. `~/.config/smp/config.yaml` (user config)
//! 4. `/etc/smp/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! filter:
//!   rolloff: 4
//!   taper_length: 2.0
//!
//! qc:
//!   initial_velocity: 0.1
//!   residual_velocity: 0.1
//!   residual_displacement: 0.1
//!
//! event_detection:
//!   method: pwd
//!   buffer: 1.0
//!
//! baseline:
//!   method: abc2
//!   first_poly_order: [1, 2]
//!   third_poly_order: [1, 3]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::observe::LogConfig;

/// Error type for configuration operations.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found
    NotFound(String),
    /// Failed to read configuration file
    ReadError(String),
    /// Failed to parse configuration
    ParseError(String),
    /// Invalid configuration value
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(msg) => write!(f, "config not found: {}", msg),
            ConfigError::ReadError(msg) => write!(f, "failed to read config: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigError::ValidationError(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Butterworth filter and differentiation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Number of filter poles per band edge (1..=8)
    pub rolloff: usize,
    /// Cosine taper length in seconds for acausal filtering
    pub taper_length: f64,
    /// Central difference stencil width (3, 5, 7 or 9)
    pub differentiation_order: usize,
    /// Low cutoff in Hz, replacing the magnitude-table value when set
    pub low_cut_override: Option<f64>,
    /// High cutoff in Hz, replacing the magnitude-table value when set
    pub high_cut_override: Option<f64>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            rolloff: 4,
            taper_length: 2.0,
            differentiation_order: 5,
            low_cut_override: None,
            high_cut_override: None,
        }
    }
}

/// QC acceptance thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcConfig {
    /// Maximum initial velocity in cm/s
    pub initial_velocity: f64,
    /// Maximum residual velocity in cm/s
    pub residual_velocity: f64,
    /// Maximum residual displacement in cm
    pub residual_displacement: f64,
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            initial_velocity: 0.1,
            residual_velocity: 0.1,
            residual_displacement: 0.1,
        }
    }
}

/// Event onset detection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventMethod {
    /// P-phase picker on the damping energy of a damped oscillator
    #[default]
    Pwd,
    /// Akaike information criterion picker
    Aic,
}

/// Search window for the AIC picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AicMode {
    /// Whole record
    #[default]
    Full,
    /// Record truncated at the absolute peak
    ToPeak,
}

/// Event onset detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDetectionConfig {
    /// Picker to use
    pub method: EventMethod,
    /// AIC search window
    pub aic_mode: AicMode,
    /// Pre-event buffer in seconds
    pub buffer: f64,
}

impl Default for EventDetectionConfig {
    fn default() -> Self {
        Self {
            method: EventMethod::Pwd,
            aic_mode: AicMode::Full,
            buffer: 1.0,
        }
    }
}

/// Baseline correction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineMethod {
    /// Three segments: polynomial, quintic connector, polynomial
    #[default]
    Abc2,
    /// Two independent least-squares lines
    Linear,
    /// Two polynomials joined continuously at a moving break
    TwoSegment,
    /// Pre-event polynomial plus a least-squares B-spline
    AdaptiveSpline,
}

/// Baseline correction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Strategy to run when the first QC fails
    pub method: BaselineMethod,
    /// Inclusive polynomial order range for the first segment
    pub first_poly_order: [usize; 2],
    /// Inclusive polynomial order range for the last segment
    pub third_poly_order: [usize; 2],
    /// Break point step in samples
    pub moving_window: usize,
    /// Inclusive spline degree range (adaptive spline)
    pub spline_orders: [usize; 2],
    /// Inclusive interior knot count range (adaptive spline)
    pub spline_breaks: [usize; 2],
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            method: BaselineMethod::Abc2,
            first_poly_order: [1, 2],
            third_poly_order: [1, 3],
            moving_window: 200,
            spline_orders: [1, 3],
            spline_breaks: [1, 4],
        }
    }
}

/// Strong-motion parameter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrongMotionConfig {
    /// Parameters are computed only when the peak exceeds this %g
    pub threshold_pct_g: f64,
    /// Threshold in %g for bracketed duration
    pub bracketed_threshold_pct_g: f64,
}

impl Default for StrongMotionConfig {
    fn default() -> Self {
        Self {
            threshold_pct_g: 5.0,
            bracketed_threshold_pct_g: 5.0,
        }
    }
}

/// Complete processing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmConfig {
    /// Configuration version
    pub version: String,
    pub filter: FilterConfig,
    pub qc: QcConfig,
    pub event_detection: EventDetectionConfig,
    pub baseline: BaselineConfig,
    pub strong_motion: StrongMotionConfig,
    pub logging: LogConfig,
}

impl Default for SmConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            filter: FilterConfig::default(),
            qc: QcConfig::default(),
            event_detection: EventDetectionConfig::default(),
            baseline: BaselineConfig::default(),
            strong_motion: StrongMotionConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl SmConfig {
    /// Load configuration from the default search path.
    ///
    /// Search order:
    /// 1. `SMP_CONFIG` environment variable
    /// 2. `./smp.yaml`
    /// 3. `~/.config/smp/config.yaml`
    /// 4. `/etc/smp/config.yaml`
    ///
    /// Returns the default config if no file is found. A file that is found
    /// is validated before it is returned.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("SMP_CONFIG") {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            return Self::load_from(&path);
        }

        for path in &Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        Ok(Self::default())
    }

    /// Load and validate configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./smp.yaml")];

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "smp") {
            paths.push(config_dir.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/smp/config.yaml"));

        paths
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

        if !(1..=8).contains(&self.filter.rolloff) {
            return invalid("filter.rolloff must be 1-8");
        }
        if !(self.filter.taper_length.is_finite() && self.filter.taper_length > 0.0) {
            return invalid("filter.taper_length must be positive");
        }
        if ![3, 5, 7, 9].contains(&self.filter.differentiation_order) {
            return invalid("filter.differentiation_order must be 3, 5, 7 or 9");
        }
        if let (Some(lo), Some(hi)) = (self.filter.low_cut_override, self.filter.high_cut_override) {
            if lo >= hi {
                return invalid("filter.low_cut_override must be below high_cut_override");
            }
        }

        let qc = &self.qc;
        for (name, value) in [
            ("qc.initial_velocity", qc.initial_velocity),
            ("qc.residual_velocity", qc.residual_velocity),
            ("qc.residual_displacement", qc.residual_displacement),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be positive",
                    name
                )));
            }
        }

        if !(self.event_detection.buffer.is_finite() && self.event_detection.buffer >= 0.0) {
            return invalid("event_detection.buffer must be non-negative");
        }

        let baseline = &self.baseline;
        for (name, [lo, hi]) in [
            ("baseline.first_poly_order", baseline.first_poly_order),
            ("baseline.third_poly_order", baseline.third_poly_order),
            ("baseline.spline_orders", baseline.spline_orders),
            ("baseline.spline_breaks", baseline.spline_breaks),
        ] {
            if lo > hi {
                return Err(ConfigError::ValidationError(format!(
                    "{} range is reversed: [{}, {}]",
                    name, lo, hi
                )));
            }
        }
        if baseline.spline_orders[0] == 0 {
            return invalid("baseline.spline_orders must start at 1 or above");
        }
        if baseline.moving_window == 0 {
            return invalid("baseline.moving_window must be > 0");
        }

        if !(self.strong_motion.threshold_pct_g >= 0.0
            && self.strong_motion.bracketed_threshold_pct_g > 0.0)
        {
            return invalid("strong_motion thresholds must be positive");
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        serde_yaml::to_string(&Self::default()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SmConfig::default();
        assert_eq!(config.filter.rolloff, 4);
        assert_eq!(config.filter.taper_length, 2.0);
        assert_eq!(config.filter.differentiation_order, 5);
        assert_eq!(config.event_detection.method, EventMethod::Pwd);
        assert_eq!(config.baseline.method, BaselineMethod::Abc2);
        assert_eq!(config.baseline.moving_window, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
filter:
  rolloff: 2
  taper_length: 1.5
  low_cut_override: 0.2

qc:
  residual_displacement: 0.25

event_detection:
  method: aic
  aic_mode: to_peak

baseline:
  method: two_segment
  third_poly_order: [2, 2]
"#;

        let config = SmConfig::parse(yaml).unwrap();
        assert_eq!(config.filter.rolloff, 2);
        assert_eq!(config.filter.taper_length, 1.5);
        assert_eq!(config.filter.low_cut_override, Some(0.2));
        assert_eq!(config.qc.residual_displacement, 0.25);
        assert_eq!(config.qc.initial_velocity, 0.1);
        assert_eq!(config.event_detection.method, EventMethod::Aic);
        assert_eq!(config.event_detection.aic_mode, AicMode::ToPeak);
        assert_eq!(config.baseline.method, BaselineMethod::TwoSegment);
        assert_eq!(config.baseline.third_poly_order, [2, 2]);
        assert_eq!(config.baseline.first_poly_order, [1, 2]);
    }

    #[test]
    fn test_parse_rejects_unknown_method() {
        let yaml = "baseline:\n  method: cubic\n";
        assert!(matches!(SmConfig::parse(yaml), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation() {
        let mut config = SmConfig::default();
        config.filter.rolloff = 9;
        assert!(config.validate().is_err());

        let mut config = SmConfig::default();
        config.filter.differentiation_order = 4;
        assert!(config.validate().is_err());

        let mut config = SmConfig::default();
        config.qc.residual_velocity = 0.0;
        assert!(config.validate().is_err());

        let mut config = SmConfig::default();
        config.baseline.first_poly_order = [3, 1];
        assert!(config.validate().is_err());

        let mut config = SmConfig::default();
        config.filter.low_cut_override = Some(10.0);
        config.filter.high_cut_override = Some(5.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_yaml_round_trip() {
        let yaml = SmConfig::example_yaml();
        assert!(yaml.contains("filter:"));
        assert!(yaml.contains("baseline:"));
        let parsed = SmConfig::parse(&yaml).unwrap();
        assert_eq!(parsed, SmConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("smp-config-{}.yaml", std::process::id()));
        let mut config = SmConfig::default();
        config.event_detection.buffer = 2.5;
        config.save(&path).unwrap();
        let loaded = SmConfig::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.event_detection.buffer, 2.5);
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = SmConfig::load_from(Path::new("/nonexistent/smp.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
        assert!(err.to_string().starts_with("failed to read config"));
    }

    #[test]
    fn test_config_search_paths() {
        let paths = SmConfig::config_search_paths();
        assert!(!paths.is_empty());
        assert!(paths[0].ends_with("smp.yaml"));
    }
}
