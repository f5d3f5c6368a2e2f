use crate::adapters::http::HttpSource;
use crate::adapters::storage::LocalStorage;
use crate::adapters::store::DocumentStore;
use crate::core::analysis::FeedbackAnalyzer;
use crate::core::distribution::summarize_by_section;
use crate::domain::catalog::default_questionnaire;
use crate::domain::model::{
    FeedbackReport, Question, ReportBundle, SectionSummary, SurveyRecord,
};
use crate::domain::ports::{ConfigProvider, FeedbackRepository, Pipeline, SourceSpec, Storage};
use crate::utils::error::{FeedbackError, Result};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const REPORT_JSON: &str = "report.json";
pub const ENTRIES_JSON: &str = "entries.json";
pub const DISTRIBUTION_JSON: &str = "distribution.json";
pub const VALUE_SCORES_CSV: &str = "value_scores.csv";
pub const ALIGNMENT_CSV: &str = "stakeholder_alignment.csv";
pub const DISTRIBUTION_CSV: &str = "distribution.csv";

const LIST_SEPARATOR: &str = " | ";

/// Splits a JSON export into survey records.
///
/// Accepts an array of response objects, a `{"documents": [...]}` envelope or a
/// single response object. Non-object array items are skipped.
pub fn records_from_json(value: serde_json::Value) -> Result<Vec<SurveyRecord>> {
    match value {
        serde_json::Value::Array(items) => {
            let total = items.len();
            let records: Vec<SurveyRecord> = items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::Object(obj) => Some(SurveyRecord::new(obj)),
                    _ => None,
                })
                .collect();
            if records.len() < total {
                tracing::warn!(
                    "Skipped {} export items that are not objects",
                    total - records.len()
                );
            }
            Ok(records)
        }
        serde_json::Value::Object(mut obj) => match obj.remove("documents") {
            Some(documents @ serde_json::Value::Array(_)) => records_from_json(documents),
            Some(other) => {
                obj.insert("documents".to_string(), other);
                Ok(vec![SurveyRecord::new(obj)])
            }
            None => Ok(vec![SurveyRecord::new(obj)]),
        },
        other => Err(FeedbackError::ProcessingError {
            message: format!(
                "Survey export must be an array or object, got: {}",
                other
            ),
        }),
    }
}

pub fn value_scores_csv(report: &FeedbackReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "value",
        "average_score",
        "trend",
        "strengths",
        "opportunities",
        "supporting_quotes",
    ])?;

    for (value, score) in &report.value_scores {
        writer.write_record([
            value.to_string(),
            format!("{:.2}", score.average_score),
            score.trend.to_string(),
            score.strengths.join(LIST_SEPARATOR),
            score.opportunities.join(LIST_SEPARATOR),
            score.supporting_quotes.join(LIST_SEPARATOR),
        ])?;
    }

    finish_csv(writer)
}

pub fn alignment_csv(report: &FeedbackReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["stakeholder", "label", "alignment", "supporting_evidence"])?;

    for (stakeholder, alignment) in &report.stakeholder_alignment {
        writer.write_record([
            stakeholder.to_string(),
            stakeholder.label(),
            alignment.alignment.to_string(),
            alignment.supporting_evidence.join(LIST_SEPARATOR),
        ])?;
    }

    finish_csv(writer)
}

pub fn distribution_csv(sections: &[SectionSummary]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "section",
        "question_id",
        "question",
        "option",
        "count",
        "percentage",
    ])?;

    for section in sections {
        for question in &section.questions {
            for option in &question.distribution {
                writer.write_record([
                    section.section.clone(),
                    question.question_id.to_string(),
                    question.question.clone(),
                    option.option.clone(),
                    option.count.to_string(),
                    option.percentage.to_string(),
                ])?;
            }
        }
    }

    finish_csv(writer)
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| FeedbackError::ProcessingError {
            message: format!("CSV flush failed: {}", e),
        })?;
    String::from_utf8(bytes).map_err(|e| FeedbackError::ProcessingError {
        message: format!("CSV output is not UTF-8: {}", e),
    })
}

pub struct ReportPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    analyzer: FeedbackAnalyzer,
    questionnaire: Vec<Question>,
    repository: Option<Arc<dyn FeedbackRepository>>,
}

impl<S: Storage, C: ConfigProvider> ReportPipeline<S, C> {
    /// Opens the document store at the configured store path, if any.
    pub fn new(storage: S, config: C) -> Self {
        let repository = config.store_path().map(|path| {
            Arc::new(DocumentStore::new(LocalStorage::new(path.to_string())))
                as Arc<dyn FeedbackRepository>
        });
        let analyzer = FeedbackAnalyzer::new(config.analysis());

        Self {
            storage,
            config,
            analyzer,
            questionnaire: default_questionnaire(),
            repository,
        }
    }

    pub fn with_repository(mut self, repository: Arc<dyn FeedbackRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn with_questionnaire(mut self, questionnaire: Vec<Question>) -> Self {
        self.questionnaire = questionnaire;
        self
    }

    fn output_file(&self, name: &str) -> String {
        Path::new(self.config.output_path())
            .join(name)
            .to_string_lossy()
            .into_owned()
    }

    fn wants(&self, format: &str) -> bool {
        self.config.output_formats().iter().any(|f| f == format)
    }

    fn output_files(&self, bundle: &ReportBundle) -> Result<Vec<(&'static str, Vec<u8>)>> {
        let mut files = Vec::new();

        if self.wants("json") {
            files.push((REPORT_JSON, serde_json::to_vec_pretty(&bundle.report)?));
            files.push((ENTRIES_JSON, serde_json::to_vec_pretty(&bundle.entries)?));
            files.push((
                DISTRIBUTION_JSON,
                serde_json::to_vec_pretty(&bundle.sections)?,
            ));
        }

        if self.wants("csv") {
            files.push((VALUE_SCORES_CSV, bundle.value_scores_csv.clone().into_bytes()));
            files.push((ALIGNMENT_CSV, bundle.alignment_csv.clone().into_bytes()));
            files.push((DISTRIBUTION_CSV, bundle.distribution_csv.clone().into_bytes()));
        }

        Ok(files)
    }

    async fn persist(&self, bundle: &ReportBundle) -> Result<()> {
        let Some(repository) = &self.repository else {
            return Ok(());
        };

        repository
            .submit_feedback_batch(bundle.entries.clone())
            .await?;
        let report_id = repository.save_report(bundle.report.clone()).await?;

        tracing::info!(
            "Stored {} feedback entries and report {}",
            bundle.entries.len(),
            report_id
        );
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ReportPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<SurveyRecord>> {
        let records = match self.config.source() {
            SourceSpec::File { path } => {
                tracing::debug!("Reading survey export from: {}", path);
                let data = self.storage.read_file(&path).await?;
                let json: serde_json::Value = serde_json::from_slice(&data)?;
                records_from_json(json)?
            }
            spec @ SourceSpec::Api { .. } => {
                let source = HttpSource::from_spec(&spec)?;
                tracing::info!("Fetching survey export from: {}", source.endpoint());
                source.fetch().await?
            }
        };

        if records.is_empty() {
            tracing::warn!("Survey export contains no responses");
        }
        Ok(records)
    }

    async fn transform(&self, records: Vec<SurveyRecord>) -> Result<ReportBundle> {
        let user_id = self.config.user_id();
        let survey_id = self.config.survey_id();

        let entries = self
            .analyzer
            .convert_survey_to_feedback(&records, user_id, survey_id);
        tracing::debug!(
            "Converted {} responses into {} feedback entries",
            records.len(),
            entries.len()
        );

        let previous = match &self.repository {
            Some(repository) => repository.latest_report(user_id).await?,
            None => None,
        };
        if let Some(previous) = &previous {
            tracing::debug!("Comparing against previous report {}", previous.id);
        }

        let report = self
            .analyzer
            .generate_report(user_id, survey_id, &entries, previous.as_ref());
        let sections = summarize_by_section(&records, &self.questionnaire);

        Ok(ReportBundle {
            record_count: records.len(),
            value_scores_csv: value_scores_csv(&report)?,
            alignment_csv: alignment_csv(&report)?,
            distribution_csv: distribution_csv(&sections)?,
            entries,
            report,
            sections,
        })
    }

    async fn load(&self, bundle: ReportBundle) -> Result<String> {
        let files = self.output_files(&bundle)?;

        let output = match self.config.archive_name() {
            Some(archive) => {
                tracing::debug!("Creating ZIP archive with {} files", files.len());

                let zip_data = {
                    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                    for (name, data) in &files {
                        zip.start_file(*name, SimpleFileOptions::default())?;
                        zip.write_all(data)?;
                    }
                    zip.finish()?.into_inner()
                };

                let path = self.output_file(archive);
                tracing::debug!("Writing ZIP archive ({} bytes) to {}", zip_data.len(), path);
                self.storage.write_file(&path, &zip_data).await?;
                path
            }
            None => {
                for (name, data) in &files {
                    self.storage.write_file(&self.output_file(name), data).await?;
                }
                self.config.output_path().to_string()
            }
        };

        self.persist(&bundle).await?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analysis::AnalysisSettings;
    use crate::domain::model::{Trend, Value};
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &[u8]) {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                FeedbackError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.put(path, data).await;
            Ok(())
        }

        async fn exists(&self, path: &str) -> bool {
            self.files.lock().await.contains_key(path)
        }
    }

    struct MockConfig {
        source: SourceSpec,
        output_formats: Vec<String>,
        archive_name: Option<String>,
    }

    impl MockConfig {
        fn new(path: &str) -> Self {
            Self {
                source: SourceSpec::File {
                    path: path.to_string(),
                },
                output_formats: vec!["json".to_string(), "csv".to_string()],
                archive_name: None,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn source(&self) -> SourceSpec {
            self.source.clone()
        }

        fn user_id(&self) -> &str {
            "u1"
        }

        fn survey_id(&self) -> &str {
            "s1"
        }

        fn output_path(&self) -> &str {
            "out"
        }

        fn output_formats(&self) -> &[String] {
            &self.output_formats
        }

        fn archive_name(&self) -> Option<&str> {
            self.archive_name.as_deref()
        }

        fn store_path(&self) -> Option<&str> {
            None
        }

        fn analysis(&self) -> AnalysisSettings {
            AnalysisSettings::default()
        }
    }

    fn export() -> serde_json::Value {
        serde_json::json!([
            {
                "id": "r1",
                "How well does the person collaborate with others?": 5,
                "How well does the person collaborate with others?_comments": "Keeps everyone in the loop",
                "How respectful is the person in their interactions?": "Usually",
                "answers": {"1": "Very satisfied"}
            },
            {
                "id": "r2",
                "How well does the person collaborate with others?": 3,
                "How respectful is the person in their interactions?": "Always",
                "answers": {"1": "Neutral"}
            }
        ])
    }

    #[test]
    fn test_records_from_json_shapes() {
        let records = records_from_json(serde_json::json!([{"id": 1}, 7, {"id": 2}])).unwrap();
        assert_eq!(records.len(), 2);

        let single = records_from_json(serde_json::json!({"id": "solo"})).unwrap();
        assert_eq!(single[0].id().as_deref(), Some("solo"));

        let enveloped =
            records_from_json(serde_json::json!({"documents": [{"id": "a"}, {"id": "b"}]}))
                .unwrap();
        assert_eq!(enveloped.len(), 2);

        assert!(records_from_json(serde_json::json!("nope")).is_err());
    }

    #[tokio::test]
    async fn test_extract_from_file() {
        let storage = MockStorage::default();
        storage
            .put("responses.json", export().to_string().as_bytes())
            .await;
        let pipeline = ReportPipeline::new(storage, MockConfig::new("responses.json"));

        let records = pipeline.extract().await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_extract_missing_file_fails() {
        let pipeline = ReportPipeline::new(MockStorage::default(), MockConfig::new("missing.json"));
        assert!(matches!(
            pipeline.extract().await,
            Err(FeedbackError::IoError(_))
        ));
    }

    #[tokio::test]
    async fn test_transform_builds_report_and_tables() {
        let pipeline = ReportPipeline::new(MockStorage::default(), MockConfig::new("unused.json"));
        let records = records_from_json(export()).unwrap();

        let bundle = pipeline.transform(records).await.unwrap();

        assert_eq!(bundle.record_count, 2);
        assert_eq!(bundle.entries.len(), 4);
        let collaboration = &bundle.report.value_scores[&Value::Collaboration];
        assert_eq!(collaboration.average_score, 4.0);
        assert_eq!(collaboration.trend, Trend::Stable);
        assert_eq!(bundle.report.value_scores[&Value::Respect].average_score, 4.5);

        let lines: Vec<&str> = bundle.value_scores_csv.lines().collect();
        assert_eq!(
            lines[0],
            "value,average_score,trend,strengths,opportunities,supporting_quotes"
        );
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("Collaboration,4.00,stable"));

        assert!(bundle.alignment_csv.contains("PeopleWeHelp,People We Help,"));
        assert!(bundle
            .distribution_csv
            .contains("How satisfied are you with your current role?,Very satisfied,1,50"));
    }

    #[tokio::test]
    async fn test_load_writes_loose_files() {
        let storage = MockStorage::default();
        let pipeline = ReportPipeline::new(storage.clone(), MockConfig::new("unused.json"));
        let bundle = pipeline
            .transform(records_from_json(export()).unwrap())
            .await
            .unwrap();

        let output = pipeline.load(bundle).await.unwrap();

        assert_eq!(output, "out");
        let report = storage.get_file("out/report.json").await.unwrap();
        let report: FeedbackReport = serde_json::from_slice(&report).unwrap();
        assert_eq!(report.user_id, "u1");
        assert!(storage.get_file("out/value_scores.csv").await.is_some());
        assert!(storage.get_file("out/distribution.json").await.is_some());
    }

    #[tokio::test]
    async fn test_load_bundles_zip_archive() {
        let storage = MockStorage::default();
        let mut config = MockConfig::new("unused.json");
        config.archive_name = Some("feedback_report.zip".to_string());
        config.output_formats = vec!["csv".to_string()];
        let pipeline = ReportPipeline::new(storage.clone(), config);
        let bundle = pipeline.transform(Vec::new()).await.unwrap();

        let output = pipeline.load(bundle).await.unwrap();

        assert_eq!(output, "out/feedback_report.zip");
        let zip_data = storage.get_file(&output).await.unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(
            names,
            vec![DISTRIBUTION_CSV, ALIGNMENT_CSV, VALUE_SCORES_CSV]
        );
        assert!(storage.get_file("out/report.json").await.is_none());
    }
}
