use ghostrace_types::{
    CatalogError, Racer, RacerCatalog, RevealTiming, TimingError, STARTING_BANKROLL,
};
use serde::{Deserialize, Serialize};
use std::{path::Path, str::FromStr, time::Duration};
use thiserror::Error;
use tracing::Level;

/// Configuration for the [crate::Simulator], read from YAML.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_starting_bankroll")]
    pub starting_bankroll: i64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Interval between reveal frames.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Speed-up applied to wall-clock time during the reveal.
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
    #[serde(default)]
    pub reveal: RevealTiming,
    /// Replaces the default roster when set.
    #[serde(default)]
    pub racers: Option<Vec<Racer>>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: i64 },
    #[error("time_scale must be a positive number (got {value})")]
    InvalidTimeScale { value: f64 },
    #[error("invalid reveal timing")]
    Timing(#[from] TimingError),
    #[error("invalid roster")]
    Catalog(#[from] CatalogError),
}

pub struct ValidatedConfig {
    pub catalog: RacerCatalog,
    pub starting_bankroll: i64,
    pub log_level: Level,
    pub tick: Duration,
    pub time_scale: f64,
    pub reveal: RevealTiming,
}

fn default_starting_bankroll() -> i64 {
    STARTING_BANKROLL
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tick_ms() -> u64 {
    16
}

fn default_time_scale() -> f64 {
    1.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            starting_bankroll: default_starting_bankroll(),
            log_level: default_log_level(),
            tick_ms: default_tick_ms(),
            time_scale: default_time_scale(),
            reveal: RevealTiming::default(),
            racers: None,
        }
    }
}

impl Config {
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if self.starting_bankroll <= 0 {
            return Err(ConfigError::InvalidNonZero {
                field: "starting_bankroll",
                value: self.starting_bankroll,
            });
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::InvalidNonZero {
                field: "tick_ms",
                value: 0,
            });
        }
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(ConfigError::InvalidTimeScale {
                value: self.time_scale,
            });
        }
        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        let catalog = match self.racers {
            Some(racers) => RacerCatalog::new(racers)?,
            None => RacerCatalog::default(),
        };
        self.reveal.validate(catalog.len())?;

        Ok(ValidatedConfig {
            catalog,
            starting_bankroll: self.starting_bankroll,
            log_level,
            tick: Duration::from_millis(self.tick_ms),
            time_scale: self.time_scale,
            reveal: self.reveal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_yaml("{}").unwrap().validate().unwrap();
        assert_eq!(config.starting_bankroll, 100);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.tick, Duration::from_millis(16));
        assert_eq!(config.reveal, RevealTiming::default());
        assert_eq!(config.catalog, RacerCatalog::default());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
starting_bankroll: 250
log_level: debug
tick_ms: 50
time_scale: 4.0
reveal:
  base_ms: 3000
  gap_ms: 200
racers:
  - { id: bat, name: Batty Bea, odds: 1.5, icon: "🦇" }
  - { id: owl, name: Hoot Owen, odds: 4.0, icon: "🦉" }
"#;
        let config = Config::from_yaml(yaml).unwrap().validate().unwrap();
        assert_eq!(config.starting_bankroll, 250);
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.time_scale, 4.0);
        assert_eq!(config.reveal.base_ms, 3_000);
        assert_eq!(config.reveal.end_percent, 88.0);
        assert_eq!(config.catalog.len(), 2);
        assert_eq!(config.catalog.get("owl").unwrap().name, "Hoot Owen");
    }

    #[test]
    fn test_invalid_configs() {
        let cases = [
            "starting_bankroll: 0",
            "tick_ms: 0",
            "time_scale: -1.0",
            "log_level: loud",
            "reveal: { base_ms: 0 }",
            "reveal: { start_percent: 90.0, end_percent: 10.0 }",
            "reveal: { gap_ms: 18446744073709551615 }",
            "reveal: { start_percent: -.inf }",
            "reveal: { end_percent: .nan }",
            "racers: []",
            "racers: [{ id: a, name: A, odds: 0.0, icon: x }]",
        ];
        for yaml in cases {
            let result = Config::from_yaml(yaml).unwrap().validate();
            assert!(result.is_err(), "{yaml} should be rejected");
        }
        assert!(matches!(
            Config::from_yaml("reveal: { gap_ms: 18446744073709551615 }")
                .unwrap()
                .validate(),
            Err(ConfigError::Timing(TimingError::Overflow { racers: 6, .. }))
        ));
        assert!(matches!(
            Config::from_yaml("tick_ms: [1, 2]"),
            Err(ConfigError::Parse(_))
        ));
    }
}
