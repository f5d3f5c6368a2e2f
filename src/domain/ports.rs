use crate::core::analysis::AnalysisSettings;
use crate::domain::model::{
    FeedbackEntry, FeedbackReport, FeedbackSurvey, ReportBundle, SurveyRecord, UserProfile,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

/// Where survey responses come from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    /// A JSON export relative to the storage root.
    File { path: String },
    /// A JSON export endpoint.
    Api {
        endpoint: String,
        headers: BTreeMap<String, String>,
        bearer_token: Option<String>,
        timeout_seconds: u64,
    },
}

pub trait ConfigProvider: Send + Sync {
    fn source(&self) -> SourceSpec;
    fn user_id(&self) -> &str;
    fn survey_id(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    /// When set, outputs are bundled into this zip archive instead of loose files.
    fn archive_name(&self) -> Option<&str>;
    fn store_path(&self) -> Option<&str>;
    fn analysis(&self) -> AnalysisSettings;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<SurveyRecord>>;
    async fn transform(&self, records: Vec<SurveyRecord>) -> Result<ReportBundle>;
    async fn load(&self, bundle: ReportBundle) -> Result<String>;
}

/// Document-database operations used by the survey application.
///
/// Create/submit/save calls assign a fresh id, ignoring any id already set on
/// the document, and return it.
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    async fn user_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;
    async fn create_user_profile(&self, profile: UserProfile) -> Result<String>;

    async fn active_survey(&self) -> Result<Option<FeedbackSurvey>>;
    async fn create_survey(&self, survey: FeedbackSurvey) -> Result<String>;

    async fn submit_feedback(&self, entry: FeedbackEntry) -> Result<String>;
    /// Stores all entries in a single write; ids are returned in input order.
    async fn submit_feedback_batch(&self, entries: Vec<FeedbackEntry>) -> Result<Vec<String>>;
    async fn user_feedback(&self, user_id: &str, survey_id: &str) -> Result<Vec<FeedbackEntry>>;

    async fn save_report(&self, report: FeedbackReport) -> Result<String>;
    async fn report(&self, report_id: &str) -> Result<Option<FeedbackReport>>;
    /// The user's report with the newest `generatedAt`.
    async fn latest_report(&self, user_id: &str) -> Result<Option<FeedbackReport>>;

    async fn add_survey_response(&self, record: SurveyRecord) -> Result<String>;
    async fn survey_responses(&self) -> Result<Vec<SurveyRecord>>;
    async fn delete_survey_response(&self, response_id: &str) -> Result<()>;
}
