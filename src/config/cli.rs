use crate::core::analysis::AnalysisSettings;
use crate::core::{ConfigProvider, SourceSpec};
use crate::utils::error::{FeedbackError, Result};
use crate::utils::validation::{
    validate_export_file, validate_non_empty_string, validate_output_formats, validate_path,
    validate_positive_number, validate_range, validate_url, Validate,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "feedback-pulse")]
#[command(about = "Aggregate peer-feedback survey responses into a feedback report")]
pub struct CliConfig {
    /// JSON export of survey responses
    #[arg(long, conflicts_with = "endpoint")]
    pub input: Option<String>,

    /// HTTP endpoint serving the JSON export
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Bearer token for the export endpoint
    #[arg(long)]
    pub token: Option<String>,

    #[arg(long, default_value = "30")]
    pub timeout_seconds: u64,

    /// User the feedback is about
    #[arg(long)]
    pub user_id: String,

    #[arg(long)]
    pub survey_id: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_value = "json,csv")]
    pub formats: Vec<String>,

    /// Bundle outputs into this zip archive
    #[arg(long)]
    pub archive: Option<String>,

    /// Directory of the local document store; enables trends and persistence
    #[arg(long)]
    pub store_path: Option<String>,

    #[arg(long, default_value = "4")]
    pub positive_threshold: u8,

    /// Comment fragments must be longer than this to count as a theme
    #[arg(long, default_value = "10")]
    pub min_phrase_length: usize,

    #[arg(long, default_value = "3")]
    pub top_n: usize,

    #[arg(long, default_value = "0.25")]
    pub trend_tolerance: f64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl ConfigProvider for CliConfig {
    fn source(&self) -> SourceSpec {
        match &self.endpoint {
            Some(endpoint) => SourceSpec::Api {
                endpoint: endpoint.clone(),
                headers: BTreeMap::new(),
                bearer_token: self.token.clone(),
                timeout_seconds: self.timeout_seconds,
            },
            None => SourceSpec::File {
                path: self.input.clone().unwrap_or_default(),
            },
        }
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn survey_id(&self) -> &str {
        &self.survey_id
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn archive_name(&self) -> Option<&str> {
        self.archive.as_deref()
    }

    fn store_path(&self) -> Option<&str> {
        self.store_path.as_deref()
    }

    fn analysis(&self) -> AnalysisSettings {
        AnalysisSettings {
            positive_threshold: self.positive_threshold,
            min_phrase_length: self.min_phrase_length,
            top_n: self.top_n,
            trend_tolerance: self.trend_tolerance,
            ..AnalysisSettings::default()
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        match (&self.input, &self.endpoint) {
            (Some(input), None) => validate_export_file("input", input)?,
            (None, Some(endpoint)) => validate_url("endpoint", endpoint)?,
            _ => {
                return Err(FeedbackError::ConfigError {
                    message: "Exactly one of --input or --endpoint is required".to_string(),
                })
            }
        }

        validate_non_empty_string("user_id", &self.user_id)?;
        validate_non_empty_string("survey_id", &self.survey_id)?;
        validate_path("output_path", &self.output_path)?;
        validate_output_formats("formats", &self.formats)?;
        validate_positive_number("timeout_seconds", self.timeout_seconds as usize, 1)?;
        validate_positive_number("top_n", self.top_n, 1)?;
        validate_range("positive_threshold", self.positive_threshold, 1, 5)?;
        validate_range("trend_tolerance", self.trend_tolerance, 0.0, 4.0)?;

        if let Some(store_path) = &self.store_path {
            validate_path("store_path", store_path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_source() {
        let config = CliConfig::parse_from([
            "feedback-pulse",
            "--input",
            "responses.json",
            "--user-id",
            "u1",
            "--survey-id",
            "s1",
        ]);

        assert!(config.validate().is_ok());
        assert_eq!(
            config.source(),
            SourceSpec::File {
                path: "responses.json".to_string()
            }
        );
        assert_eq!(config.output_formats(), ["json", "csv"]);
        assert_eq!(config.analysis(), AnalysisSettings::default());
    }

    #[test]
    fn test_parse_api_source() {
        let config = CliConfig::parse_from([
            "feedback-pulse",
            "--endpoint",
            "https://example.org/export",
            "--token",
            "t0k",
            "--user-id",
            "u1",
            "--survey-id",
            "s1",
            "--formats",
            "csv",
            "--archive",
            "report.zip",
            "--min-phrase-length",
            "5",
        ]);

        assert!(config.validate().is_ok());
        match config.source() {
            SourceSpec::Api { bearer_token, .. } => assert_eq!(bearer_token.as_deref(), Some("t0k")),
            other => panic!("unexpected source {:?}", other),
        }
        assert_eq!(config.archive_name(), Some("report.zip"));
        assert_eq!(config.analysis().min_phrase_length, 5);
    }

    #[test]
    fn test_validation_requires_a_source() {
        let config = CliConfig::parse_from(["feedback-pulse", "--user-id", "u1", "--survey-id", "s1"]);
        assert!(matches!(
            config.validate(),
            Err(FeedbackError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_bad_threshold() {
        let config = CliConfig::parse_from([
            "feedback-pulse",
            "--input",
            "responses.json",
            "--user-id",
            "u1",
            "--survey-id",
            "s1",
            "--positive-threshold",
            "7",
        ]);
        assert!(config.validate().is_err());
    }
}
