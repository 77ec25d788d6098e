use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HarvestError;
use crate::sheet::column_index;

pub const DEFAULT_CONFIG_FILE: &str = "metric-harvest.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub source_sheet: Option<String>,
    #[serde(default)]
    pub target_sheet: Option<String>,
    #[serde(default)]
    pub source_column: Option<String>,
    #[serde(default)]
    pub start_marker: Option<String>,
    #[serde(default)]
    pub stop_marker: Option<String>,
    #[serde(default)]
    pub metric_name_path: Option<String>,
    #[serde(default)]
    pub request_delay_ms: Option<u64>,
    #[serde(default)]
    pub fairsharing_base: Option<String>,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
}

/// Values supplied on the command line; each one wins over the file.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub source_sheet: Option<String>,
    pub target_sheet: Option<String>,
    pub source_column: Option<String>,
    pub metric_name_path: Option<String>,
    pub request_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricJsonPath(Vec<String>);

impl MetricJsonPath {
    pub fn parse(value: &str) -> Result<Self, HarvestError> {
        let trimmed = value.trim();
        let segments = trimmed
            .split('.')
            .map(|segment| segment.to_string())
            .collect::<Vec<_>>();
        if trimmed.is_empty() || segments.iter().any(|segment| segment.is_empty()) {
            return Err(HarvestError::InvalidConfig {
                field: "metric_name_path",
                value: value.to_string(),
            });
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn as_dotted(&self) -> String {
        self.0.join(".")
    }
}

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub source_sheet: String,
    pub target_sheet: String,
    pub source_column: String,
    pub column_index: usize,
    pub start_marker: String,
    pub stop_marker: String,
    pub metric_name_path: MetricJsonPath,
    pub request_delay: Duration,
    pub fairsharing_base: String,
    pub http_timeout: Duration,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            source_sheet: "Tests".to_string(),
            target_sheet: "Metrics".to_string(),
            source_column: "A".to_string(),
            column_index: 0,
            start_marker: "START".to_string(),
            stop_marker: "END".to_string(),
            metric_name_path: MetricJsonPath(vec!["metadata".to_string(), "name".to_string()]),
            request_delay: Duration::from_millis(1000),
            fairsharing_base: "https://fairsharing.org".to_string(),
            http_timeout: Duration::from_secs(30),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(
        path: Option<&str>,
        overrides: &ConfigOverrides,
    ) -> Result<HarvestConfig, HarvestError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| HarvestError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content)
                .map_err(|err| HarvestError::ConfigParse(err.to_string()))?
        };

        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: &ConfigOverrides,
    ) -> Result<HarvestConfig, HarvestError> {
        let defaults = HarvestConfig::default();

        let source_column = overrides
            .source_column
            .clone()
            .or(config.source_column)
            .unwrap_or(defaults.source_column);
        let column_index = column_index(&source_column)?;

        let metric_name_path = match overrides
            .metric_name_path
            .as_deref()
            .or(config.metric_name_path.as_deref())
        {
            Some(value) => MetricJsonPath::parse(value)?,
            None => defaults.metric_name_path,
        };

        let start_marker = non_empty(
            "start_marker",
            config.start_marker.unwrap_or(defaults.start_marker),
        )?;
        let stop_marker = non_empty(
            "stop_marker",
            config.stop_marker.unwrap_or(defaults.stop_marker),
        )?;
        let source_sheet = non_empty(
            "source_sheet",
            overrides
                .source_sheet
                .clone()
                .or(config.source_sheet)
                .unwrap_or(defaults.source_sheet),
        )?;
        let target_sheet = non_empty(
            "target_sheet",
            overrides
                .target_sheet
                .clone()
                .or(config.target_sheet)
                .unwrap_or(defaults.target_sheet),
        )?;

        let request_delay = overrides
            .request_delay_ms
            .or(config.request_delay_ms)
            .map(Duration::from_millis)
            .unwrap_or(defaults.request_delay);

        let fairsharing_base = config
            .fairsharing_base
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or(defaults.fairsharing_base);

        Ok(HarvestConfig {
            source_sheet,
            target_sheet,
            source_column: source_column.trim().to_uppercase(),
            column_index,
            start_marker,
            stop_marker,
            metric_name_path,
            request_delay,
            fairsharing_base,
            http_timeout: config
                .http_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
        })
    }
}

fn non_empty(field: &'static str, value: String) -> Result<String, HarvestError> {
    if value.trim().is_empty() {
        return Err(HarvestError::InvalidConfig { field, value });
    }
    Ok(value)
}
