use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::models::MAX_IPS_PER_USER;

/// Errors raised while loading, saving or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for the log generator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Statistical constraints the generated log should satisfy
    #[serde(default)]
    pub conditions: Conditions,
    /// Shape of the synthetic user population
    #[serde(default)]
    pub population: PopulationConfig,
}

/// Statistical constraints for a generated log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    /// Share of each day's entries that should be Allow (upper bound)
    pub allow_limit: f64,
    /// Share of each day's entries that should be Deny (upper bound)
    pub deny_limit: f64,
    /// Share of each day's entries that should be Bypass (lower bound)
    pub bypass_min: f64,
    /// Distinct source IPs a multi-address user owns
    pub user_ip_count_limit: usize,
    /// First instant of the synthesized period
    pub start_date: NaiveDateTime,
    /// End of the synthesized period
    pub end_date: NaiveDateTime,
    /// Start of the daily rush-hour window
    pub rush_hours_start: NaiveTime,
    /// End of the daily rush-hour window
    pub rush_hours_end: NaiveTime,
    /// Share of each day's traffic placed inside the rush-hour window
    pub rush_hours_threshold: f64,
}

/// Synthetic user population shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of users generated up-front
    pub user_count: usize,
    /// How many of those users (taken from the front) own several IPs
    pub multi_ip_users: usize,
}

impl Default for Conditions {
    fn default() -> Self {
        let day = |d| NaiveDate::from_ymd_opt(2019, 10, d).unwrap_or_default();
        let at = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap_or_default();

        Conditions {
            allow_limit: 0.5,
            deny_limit: 0.1,
            bypass_min: 0.15,
            user_ip_count_limit: MAX_IPS_PER_USER,
            start_date: day(20).and_time(at(1)),
            end_date: day(30).and_time(at(18)),
            rush_hours_start: at(9),
            rush_hours_end: at(18),
            rush_hours_threshold: 0.7,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        PopulationConfig {
            user_count: 500,
            multi_ip_users: 151,
        }
    }
}

impl Conditions {
    /// Whole days between `start_date` and `end_date`
    pub fn day_span(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Inclusive hour range of the rush-hour window
    pub fn rush_hour_range(&self) -> (u32, u32) {
        (self.rush_hours_start.hour(), self.rush_hours_end.hour())
    }

    /// Check the constraint bundle is usable for generation
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fractions = [
            ("allow_limit", self.allow_limit),
            ("deny_limit", self.deny_limit),
            ("bypass_min", self.bypass_min),
            ("rush_hours_threshold", self.rush_hours_threshold),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if !(1..=MAX_IPS_PER_USER).contains(&self.user_ip_count_limit) {
            return Err(ConfigError::Invalid(format!(
                "user_ip_count_limit must be between 1 and {}, got {}",
                MAX_IPS_PER_USER, self.user_ip_count_limit
            )));
        }

        if self.day_span() < 1 {
            return Err(ConfigError::Invalid(format!(
                "period {} .. {} spans less than one day",
                self.start_date, self.end_date
            )));
        }

        if self.rush_hours_start > self.rush_hours_end {
            return Err(ConfigError::Invalid(format!(
                "rush hours start {} is after end {}",
                self.rush_hours_start, self.rush_hours_end
            )));
        }

        Ok(())
    }
}

impl PopulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_count == 0 {
            return Err(ConfigError::Invalid("user_count must be positive".to_string()));
        }
        if self.multi_ip_users > self.user_count {
            return Err(ConfigError::Invalid(format!(
                "multi_ip_users ({}) exceeds user_count ({})",
                self.multi_ip_users, self.user_count
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.conditions.validate()?;
        self.population.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_conditions() {
        let conditions = Conditions::default();
        assert_eq!(conditions.day_span(), 10);
        assert_eq!(conditions.rush_hour_range(), (9, 18));
        assert!(conditions.validate().is_ok());
    }

    #[test]
    fn test_default_population() {
        let population = PopulationConfig::default();
        assert_eq!(population.user_count, 500);
        assert_eq!(population.multi_ip_users, 151);
        assert!(population.validate().is_ok());
    }

    #[test]
    fn test_fraction_out_of_range() {
        let conditions = Conditions {
            deny_limit: 1.5,
            ..Conditions::default()
        };
        let err = conditions.validate().unwrap_err();
        assert!(err.to_string().contains("deny_limit"));
    }

    #[test]
    fn test_short_period_rejected() {
        let mut conditions = Conditions::default();
        conditions.end_date = conditions.start_date + chrono::Duration::hours(20);
        assert!(matches!(conditions.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_ip_limit_rejected() {
        let conditions = Conditions {
            user_ip_count_limit: 3,
            ..Conditions::default()
        };
        assert!(conditions.validate().is_err());
    }

    #[test]
    fn test_inverted_rush_hours_rejected() {
        let mut conditions = Conditions::default();
        std::mem::swap(&mut conditions.rush_hours_start, &mut conditions.rush_hours_end);
        assert!(conditions.validate().is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("generator.toml");

        let mut config = Config::default();
        config.conditions.allow_limit = 0.4;
        config.population.user_count = 20;
        config.population.multi_ip_users = 5;
        config.to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("generator.toml");
        std::fs::write(&path, "[population]\nuser_count = 10\nmulti_ip_users = 2\n").unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.population.user_count, 10);
        assert_eq!(loaded.conditions, Conditions::default());
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("generator.toml");
        std::fs::write(&path, "[population]\nuser_count = 2\nmulti_ip_users = 5\n").unwrap();

        assert!(matches!(Config::from_file(&path), Err(ConfigError::Invalid(_))));
    }
}
