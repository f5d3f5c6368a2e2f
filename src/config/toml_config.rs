use crate::core::analysis::{AnalysisSettings, QuestionMap};
use crate::core::{ConfigProvider, SourceSpec};
use crate::domain::model::Value;
use crate::utils::error::{FeedbackError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    pub subject: SubjectConfig,
    pub analysis: Option<AnalysisConfig>,
    pub load: LoadConfig,
    pub store: Option<StoreConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: String,
    pub version: String,
}

/// `type = "file"` reads `path`; `type = "api"` fetches `endpoint`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub r#type: String,
    pub path: Option<String>,
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectConfig {
    pub user_id: String,
    pub survey_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub positive_threshold: Option<u8>,
    pub min_phrase_length: Option<usize>,
    pub top_n: Option<usize>,
    pub trend_tolerance: Option<f64>,
    /// Question text -> value name. Replaces the built-in mapping when present.
    pub question_map: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FeedbackError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FeedbackError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables are left as is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| FeedbackError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        match self.source.r#type.as_str() {
            "file" => {
                let path = validation::validate_required_field("source.path", &self.source.path)?;
                validation::validate_export_file("source.path", path)?;
            }
            "api" => {
                let endpoint =
                    validation::validate_required_field("source.endpoint", &self.source.endpoint)?;
                validation::validate_url("source.endpoint", endpoint)?;
                if let Some(timeout) = self.source.timeout_seconds {
                    validation::validate_positive_number(
                        "source.timeout_seconds",
                        timeout as usize,
                        1,
                    )?;
                }
            }
            other => {
                return Err(FeedbackError::InvalidConfigValueError {
                    field: "source.type".to_string(),
                    value: other.to_string(),
                    reason: "Supported source types: file, api".to_string(),
                })
            }
        }

        validation::validate_non_empty_string("subject.user_id", &self.subject.user_id)?;
        validation::validate_non_empty_string("subject.survey_id", &self.subject.survey_id)?;
        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_output_formats("load.output_formats", &self.load.output_formats)?;

        if let Some(compression) = self.load.compression.as_ref().filter(|c| c.enabled) {
            validation::validate_non_empty_string("load.compression.filename", &compression.filename)?;
        }
        if let Some(store) = &self.store {
            validation::validate_path("store.path", &store.path)?;
        }

        if let Some(analysis) = &self.analysis {
            if let Some(threshold) = analysis.positive_threshold {
                validation::validate_range("analysis.positive_threshold", threshold, 1, 5)?;
            }
            if let Some(top_n) = analysis.top_n {
                validation::validate_positive_number("analysis.top_n", top_n, 1)?;
            }
            if let Some(tolerance) = analysis.trend_tolerance {
                validation::validate_range("analysis.trend_tolerance", tolerance, 0.0, 4.0)?;
            }
            for (question, value) in analysis.question_map.iter().flatten() {
                value.parse::<Value>().map_err(|_| FeedbackError::InvalidConfigValueError {
                    field: format!("analysis.question_map.\"{}\"", question),
                    value: value.clone(),
                    reason: format!(
                        "Unknown value. Valid values: {}",
                        Value::ALL.map(|v| v.as_str()).join(", ")
                    ),
                })?;
            }
        }

        Ok(())
    }

    pub fn pipeline_name(&self) -> &str {
        &self.pipeline.name
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    fn question_map(&self) -> QuestionMap {
        let Some(configured) = self.analysis.as_ref().and_then(|a| a.question_map.as_ref()) else {
            return QuestionMap::default();
        };

        configured
            .iter()
            .fold(QuestionMap::empty(), |map, (question, value)| match value.parse::<Value>() {
                Ok(value) => map.with_mapping(question.clone(), value),
                Err(_) => {
                    tracing::warn!("Skipping question '{}' mapped to unknown value '{}'", question, value);
                    map
                }
            })
    }
}

impl ConfigProvider for TomlConfig {
    fn source(&self) -> SourceSpec {
        match self.source.r#type.as_str() {
            "api" => SourceSpec::Api {
                endpoint: self.source.endpoint.clone().unwrap_or_default(),
                headers: self
                    .source
                    .headers
                    .iter()
                    .flatten()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                bearer_token: self.source.token.clone(),
                timeout_seconds: self.source.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            },
            _ => SourceSpec::File {
                path: self.source.path.clone().unwrap_or_default(),
            },
        }
    }

    fn user_id(&self) -> &str {
        &self.subject.user_id
    }

    fn survey_id(&self) -> &str {
        &self.subject.survey_id
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.load.output_formats
    }

    fn archive_name(&self) -> Option<&str> {
        self.load
            .compression
            .as_ref()
            .filter(|c| c.enabled)
            .map(|c| c.filename.as_str())
    }

    fn store_path(&self) -> Option<&str> {
        self.store.as_ref().map(|s| s.path.as_str())
    }

    fn analysis(&self) -> AnalysisSettings {
        let defaults = AnalysisSettings::default();
        let configured = self.analysis.clone().unwrap_or_default();

        AnalysisSettings {
            positive_threshold: configured
                .positive_threshold
                .unwrap_or(defaults.positive_threshold),
            min_phrase_length: configured
                .min_phrase_length
                .unwrap_or(defaults.min_phrase_length),
            top_n: configured.top_n.unwrap_or(defaults.top_n),
            trend_tolerance: configured.trend_tolerance.unwrap_or(defaults.trend_tolerance),
            question_map: self.question_map(),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
