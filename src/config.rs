//! Session configuration file.
//!
//! # Example
//!
//! ```
//! use wcrt_bench::config::SessionConfig;
//! use wcrt_bench::model::MetricMode;
//!
//! let config = SessionConfig::from_json(r#"{
//!     "target": { "port": "/dev/ttyACM0", "baudrate": 9600 },
//!     "test": { "methods": ["het2", "rta", "rta4"], "task_metric": "total" }
//! }"#).unwrap();
//!
//! assert_eq!(config.metric_mode(), MetricMode::Total);
//! assert_eq!(config.catalog().unwrap().len(), 3);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};
use crate::model::{MethodCatalog, MetricMode, STANDARD_METHODS};
use crate::protocol::ValidationRules;
use crate::recovery::{RecoveryConfig, RetryPolicy};
use crate::session::SessionBuilder;
use crate::transport::SerialSettings;

/// What to test and how the firmware reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestSettings {
    /// Method names, case-insensitive. Must match the firmware build.
    pub methods: Vec<String>,
    /// `null`/absent means no extra metrics.
    pub task_metric: Option<MetricMode>,
    /// Largest task set in the run; width of detail-mode columns.
    pub task_count: Option<usize>,
    pub require_consistent_verdicts: bool,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            methods: STANDARD_METHODS
                .iter()
                .map(|(_, name)| name.to_string())
                .collect(),
            task_metric: None,
            task_count: None,
            require_consistent_verdicts: true,
        }
    }
}

/// Complete session configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub target: SerialSettings,
    pub test: TestSettings,
    pub recovery: RecoveryConfig,
}

impl SessionConfig {
    /// Load and validate a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BenchError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        self.catalog()?;

        if self.metric_mode() == MetricMode::Detail && self.test.task_count.unwrap_or(0) == 0 {
            return Err(BenchError::Config(
                "test.task_count is required with task_metric \"detail\"".to_string(),
            ));
        }

        if let RetryPolicy::Backoff { factor, .. } = self.recovery.retry {
            if factor == 0 {
                return Err(BenchError::Config(
                    "recovery.retry.factor must be at least 1".to_string(),
                ));
            }
        }

        if self.target.baudrate == 0 {
            return Err(BenchError::Config(
                "target.baudrate must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// The session's method catalog.
    pub fn catalog(&self) -> Result<MethodCatalog> {
        MethodCatalog::select(&self.test.methods)
    }

    pub fn metric_mode(&self) -> MetricMode {
        self.test.task_metric.unwrap_or_default()
    }

    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            require_consistent_verdicts: self.test.require_consistent_verdicts,
        }
    }

    /// A session builder carrying every setting of this configuration.
    pub fn session_builder(&self) -> Result<SessionBuilder> {
        let mut builder = SessionBuilder::new()
            .catalog(self.catalog()?)
            .metric_mode(self.metric_mode())
            .validation_rules(self.validation_rules())
            .recovery(self.recovery);

        if let Some(max) = self.test.task_count {
            builder = builder.max_tasks(max);
        }

        Ok(builder)
    }
}
