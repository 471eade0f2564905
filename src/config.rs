use crate::error::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Runtime configuration, read from `config.toml` in the working directory
/// when present. Every field has a default so the file is optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub reports: ReportConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file the denormalized table is written into.
    pub path: String,
    /// Destination table name.
    pub table: String,
    /// How many rows the post-load smoke check prints.
    pub sample_rows: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Width of the longest bar in rendered charts, in characters.
    pub chart_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            reports: ReportConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "movies_database.db".to_string(),
            table: "movie_ratings".to_string(),
            sample_rows: 5,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { chart_width: 50 }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";
        if !Path::new(config_path).exists() {
            return Ok(Config::default());
        }
        let config_content = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}
