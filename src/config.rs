// Configuration loading and parsing (config/survivor.toml).

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// survivor.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire survivor.toml file.
#[derive(Debug, Clone, Deserialize)]
struct SurvivorFile {
    pool: PoolSection,
    season: SeasonSection,
    data: DataSection,
    #[serde(default)]
    output: OutputSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolSection {
    /// Total entries in the pool.
    pub size: u32,
    /// How many ranked picks to recommend.
    #[serde(default = "default_n_picks")]
    pub n_picks: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeasonSection {
    /// Regular-season length in weeks.
    #[serde(default = "default_total_weeks")]
    pub total_weeks: u32,
    /// Date of the season's first game; used to derive the current week
    /// when `current_week` is not pinned explicitly.
    pub start_date: NaiveDate,
    /// Explicit current-week override (1..=total_weeks).
    #[serde(default)]
    pub current_week: Option<u32>,
    /// Last week of the optimization horizon; defaults to `total_weeks`.
    #[serde(default)]
    pub end_week: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSection {
    /// Path to the probability table CSV.
    pub table: String,
    /// Teams already burned in previous weeks.
    #[serde(default)]
    pub used_teams: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OutputSection {
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_n_picks() -> usize {
    5
}

fn default_total_weeks() -> u32 {
    18
}

// ---------------------------------------------------------------------------
// Assembled config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub pool: PoolSection,
    pub season: SeasonSection,
    pub data: DataSection,
    pub output: OutputSection,
}

impl Config {
    /// The week to optimize from: the explicit override if present,
    /// otherwise derived from today's date and the season start.
    pub fn current_week(&self, today: NaiveDate) -> u32 {
        self.season.current_week.unwrap_or_else(|| {
            current_week_for_date(today, self.season.start_date, self.season.total_weeks)
        })
    }

    /// The last week of the optimization horizon.
    pub fn end_week(&self) -> u32 {
        self.season.end_week.unwrap_or(self.season.total_weeks)
    }

    /// Resolve the `(current_week, end_week)` horizon for `today`.
    ///
    /// `validate()` can only compare `end_week` against an explicit
    /// `current_week`; a date-derived week is only known here, so a season
    /// that has already run past `end_week` is rejected at resolution time.
    pub fn horizon(&self, today: NaiveDate) -> Result<(u32, u32), ConfigError> {
        let current = self.current_week(today);
        let end = self.end_week();
        if end < current {
            return Err(ConfigError::ValidationError {
                field: "season.end_week".into(),
                message: format!("week {current} has already passed end_week ({end})"),
            });
        }
        Ok((current, end))
    }
}

/// Derive the week number from a calendar date: week 1 until the season
/// starts, then one week per 7 days, capped at `total_weeks`.
pub fn current_week_for_date(today: NaiveDate, start_date: NaiveDate, total_weeks: u32) -> u32 {
    if today < start_date {
        return 1;
    }
    let days = (today - start_date).num_days();
    let week = (days / 7) as u32 + 1;
    week.min(total_weeks.max(1))
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/survivor.toml` relative to
/// the given base directory.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("survivor.toml");
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;
    load_config_from_str(&text, &path)
}

/// Convenience wrapper: loads config relative to the current working
/// directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    load_config_from(&cwd)
}

fn load_config_from_str(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let file: SurvivorFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config = Config {
        pool: file.pool,
        season: file.season,
        data: file.data,
        output: file.output,
    };

    validate(&config)?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.pool.size == 0 {
        return Err(ConfigError::ValidationError {
            field: "pool.size".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.pool.n_picks == 0 {
        return Err(ConfigError::ValidationError {
            field: "pool.n_picks".into(),
            message: "must be greater than 0".into(),
        });
    }

    let total = config.season.total_weeks;
    if total == 0 {
        return Err(ConfigError::ValidationError {
            field: "season.total_weeks".into(),
            message: "must be greater than 0".into(),
        });
    }

    if let Some(week) = config.season.current_week {
        if week == 0 || week > total {
            return Err(ConfigError::ValidationError {
                field: "season.current_week".into(),
                message: format!("must be within 1..={total}"),
            });
        }
    }

    if let Some(end) = config.season.end_week {
        if end == 0 || end > total {
            return Err(ConfigError::ValidationError {
                field: "season.end_week".into(),
                message: format!("must be within 1..={total}"),
            });
        }
        if let Some(current) = config.season.current_week {
            if end < current {
                return Err(ConfigError::ValidationError {
                    field: "season.end_week".into(),
                    message: format!("must not precede current_week ({current})"),
                });
            }
        }
    }

    if config.data.table.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data.table".into(),
            message: "must point at a probability table CSV".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
