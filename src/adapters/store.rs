use crate::domain::model::{
    FeedbackEntry, FeedbackReport, FeedbackSurvey, SurveyRecord, SurveyStatus, UserProfile,
};
use crate::domain::ports::{FeedbackRepository, Storage};
use crate::utils::error::{FeedbackError, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

pub const USERS: &str = "users";
pub const SURVEYS: &str = "surveys";
pub const FEEDBACK: &str = "feedback";
pub const REPORTS: &str = "reports";
pub const SURVEY_RESPONSES: &str = "survey_responses";

type Collection = BTreeMap<String, serde_json::Value>;

/// Serialises read-modify-write cycles of every store in the process, so two
/// handles on the same directory never interleave.
static WRITE_LOCK: Mutex<()> = Mutex::const_new(());

/// Document collections kept as `<collection>.json` id -> document maps.
pub struct DocumentStore<S: Storage> {
    storage: S,
    sequence: AtomicU64,
}

impl<S: Storage> DocumentStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            sequence: AtomicU64::new(0),
        }
    }

    fn file_name(collection: &str) -> String {
        format!("{}.json", collection)
    }

    /// A fresh `<prefix>-<millis>-<seq>` id not yet present in `documents`.
    fn next_id(&self, prefix: &str, documents: &Collection) -> String {
        loop {
            let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
            let id = format!("{}-{}-{}", prefix, Utc::now().timestamp_millis(), seq);
            if !documents.contains_key(&id) {
                return id;
            }
        }
    }

    async fn load_collection(&self, collection: &str) -> Result<Collection> {
        let file = Self::file_name(collection);
        if !self.storage.exists(&file).await {
            return Ok(Collection::new());
        }

        let bytes = self.storage.read_file(&file).await?;
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Collection::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save_collection(&self, collection: &str, documents: &Collection) -> Result<()> {
        let data = serde_json::to_vec_pretty(documents)?;
        self.storage
            .write_file(&Self::file_name(collection), &data)
            .await
    }

    async fn insert<T: Serialize + Send>(
        &self,
        collection: &str,
        prefix: &str,
        document: T,
    ) -> Result<String> {
        let mut ids = self.insert_many(collection, prefix, vec![document]).await?;
        ids.pop().ok_or_else(|| FeedbackError::ProcessingError {
            message: format!("No id assigned in '{}'", collection),
        })
    }

    /// Inserts all documents with one load and one save of the collection.
    async fn insert_many<T: Serialize + Send>(
        &self,
        collection: &str,
        prefix: &str,
        documents: Vec<T>,
    ) -> Result<Vec<String>> {
        let values = documents
            .into_iter()
            .map(|document| -> Result<serde_json::Map<String, serde_json::Value>> {
                match serde_json::to_value(document)? {
                    serde_json::Value::Object(object) => Ok(object),
                    _ => Err(FeedbackError::ProcessingError {
                        message: format!("Documents in '{}' must be JSON objects", collection),
                    }),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let _guard = WRITE_LOCK.lock().await;
        let mut stored = self.load_collection(collection).await?;
        let mut ids = Vec::with_capacity(values.len());
        for mut object in values {
            let id = self.next_id(prefix, &stored);
            object.insert("id".to_string(), serde_json::Value::String(id.clone()));
            stored.insert(id.clone(), serde_json::Value::Object(object));
            ids.push(id);
        }
        self.save_collection(collection, &stored).await?;

        tracing::debug!("Stored {} documents in {}", ids.len(), collection);
        Ok(ids)
    }

    async fn get<T: DeserializeOwned + Send>(&self, collection: &str, id: &str) -> Result<Option<T>> {
        let mut documents = self.load_collection(collection).await?;
        documents
            .remove(id)
            .map(serde_json::from_value)
            .transpose()
            .map_err(FeedbackError::from)
    }

    async fn all<T: DeserializeOwned + Send>(&self, collection: &str) -> Result<Vec<T>> {
        self.load_collection(collection)
            .await?
            .into_values()
            .map(|value| serde_json::from_value(value).map_err(FeedbackError::from))
            .collect()
    }
}

#[async_trait]
impl<S: Storage> FeedbackRepository for DocumentStore<S> {
    async fn user_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        self.get(USERS, user_id).await
    }

    async fn create_user_profile(&self, profile: UserProfile) -> Result<String> {
        self.insert(USERS, "user", profile).await
    }

    async fn active_survey(&self) -> Result<Option<FeedbackSurvey>> {
        let surveys: Vec<FeedbackSurvey> = self.all(SURVEYS).await?;
        Ok(surveys
            .into_iter()
            .find(|survey| survey.status == SurveyStatus::Active))
    }

    async fn create_survey(&self, survey: FeedbackSurvey) -> Result<String> {
        self.insert(SURVEYS, "survey", survey).await
    }

    async fn submit_feedback(&self, entry: FeedbackEntry) -> Result<String> {
        self.insert(FEEDBACK, "feedback", entry).await
    }

    async fn submit_feedback_batch(&self, entries: Vec<FeedbackEntry>) -> Result<Vec<String>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        self.insert_many(FEEDBACK, "feedback", entries).await
    }

    async fn user_feedback(&self, user_id: &str, survey_id: &str) -> Result<Vec<FeedbackEntry>> {
        let entries: Vec<FeedbackEntry> = self.all(FEEDBACK).await?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.to_user_id == user_id && entry.survey_id == survey_id)
            .collect())
    }

    async fn save_report(&self, report: FeedbackReport) -> Result<String> {
        self.insert(REPORTS, "report", report).await
    }

    async fn report(&self, report_id: &str) -> Result<Option<FeedbackReport>> {
        self.get(REPORTS, report_id).await
    }

    async fn latest_report(&self, user_id: &str) -> Result<Option<FeedbackReport>> {
        let reports: Vec<FeedbackReport> = self.all(REPORTS).await?;
        Ok(reports
            .into_iter()
            .filter(|report| report.user_id == user_id)
            .max_by_key(|report| report.generated_at))
    }

    async fn add_survey_response(&self, record: SurveyRecord) -> Result<String> {
        self.insert(SURVEY_RESPONSES, "response", record).await
    }

    async fn survey_responses(&self) -> Result<Vec<SurveyRecord>> {
        self.all(SURVEY_RESPONSES).await
    }

    async fn delete_survey_response(&self, response_id: &str) -> Result<()> {
        let _guard = WRITE_LOCK.lock().await;
        let mut documents = self.load_collection(SURVEY_RESPONSES).await?;
        if documents.remove(response_id).is_none() {
            return Err(FeedbackError::NotFound {
                collection: SURVEY_RESPONSES.to_string(),
                id: response_id.to_string(),
            });
        }
        self.save_collection(SURVEY_RESPONSES, &documents).await?;
        tracing::info!("Deleted survey response {}", response_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Rating, Value};
    use chrono::{Duration, TimeZone};
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        writes: Arc<AtomicUsize>,
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
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn exists(&self, path: &str) -> bool {
            self.files.lock().await.contains_key(path)
        }
    }

    fn entry(to_user_id: &str, survey_id: &str) -> FeedbackEntry {
        FeedbackEntry {
            id: String::new(),
            from_user_id: "peer".to_string(),
            to_user_id: to_user_id.to_string(),
            value: Value::Respect,
            rating: Rating::new(4).unwrap(),
            qualitative_feedback: "Kind".to_string(),
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            survey_id: survey_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_and_query_feedback() {
        let store = DocumentStore::new(MockStorage::default());

        let id = store.submit_feedback(entry("u1", "s1")).await.unwrap();
        store.submit_feedback(entry("u1", "s2")).await.unwrap();
        store.submit_feedback(entry("u2", "s1")).await.unwrap();

        let found = store.user_feedback("u1", "s1").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
        assert!(id.starts_with("feedback-"));
    }

    #[tokio::test]
    async fn test_two_handles_on_one_storage_keep_every_document() {
        let storage = MockStorage::default();
        let first = Arc::new(DocumentStore::new(storage.clone()));
        let second = Arc::new(DocumentStore::new(storage.clone()));

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..100 {
            let store = if i % 2 == 0 { first.clone() } else { second.clone() };
            tasks.spawn(async move { store.submit_feedback(entry("u1", "s1")).await });
        }

        let mut ids = HashSet::new();
        while let Some(joined) = tasks.join_next().await {
            ids.insert(joined.unwrap().unwrap());
        }
        assert_eq!(ids.len(), 100);
        assert_eq!(second.user_feedback("u1", "s1").await.unwrap().len(), 100);
    }

    #[tokio::test]
    async fn test_feedback_batch_is_one_write() {
        let storage = MockStorage::default();
        let store = DocumentStore::new(storage.clone());
        store.submit_feedback(entry("u1", "s0")).await.unwrap();
        let writes_before = storage.writes.load(Ordering::SeqCst);

        let ids = store
            .submit_feedback_batch((0..5).map(|_| entry("u1", "s1")).collect())
            .await
            .unwrap();

        assert_eq!(storage.writes.load(Ordering::SeqCst), writes_before + 1);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 5);
        let stored = store.user_feedback("u1", "s1").await.unwrap();
        assert_eq!(stored.len(), 5);
        assert!(stored.iter().all(|e| ids.contains(&e.id)));
        assert_eq!(store.user_feedback("u1", "s0").await.unwrap().len(), 1);

        assert!(store.submit_feedback_batch(Vec::new()).await.unwrap().is_empty());
        assert_eq!(storage.writes.load(Ordering::SeqCst), writes_before + 1);
    }

    #[tokio::test]
    async fn test_latest_report_picks_newest() {
        let store = DocumentStore::new(MockStorage::default());
        let analyzer = crate::core::analysis::FeedbackAnalyzer::default();
        let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        let older = analyzer.generate_report_at("u1", "s1", &[], None, base);
        let newer = analyzer.generate_report_at("u1", "s2", &[], None, base + Duration::days(30));
        let other = analyzer.generate_report_at("u2", "s3", &[], None, base + Duration::days(60));

        store.save_report(newer).await.unwrap();
        let older_id = store.save_report(older).await.unwrap();
        store.save_report(other).await.unwrap();

        let latest = store.latest_report("u1").await.unwrap().unwrap();
        assert_eq!(latest.survey_id, "s2");

        let fetched = store.report(&older_id).await.unwrap().unwrap();
        assert_eq!(fetched.id, older_id);
        assert!(store.latest_report("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_active_survey_and_profiles() {
        let store = DocumentStore::new(MockStorage::default());
        assert!(store.active_survey().await.unwrap().is_none());

        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let survey = FeedbackSurvey {
            id: String::new(),
            start_date: start,
            end_date: start + Duration::days(14),
            status: SurveyStatus::Draft,
            participants: vec!["u1".to_string()],
            completed_responses: vec![],
        };
        store.create_survey(survey.clone()).await.unwrap();
        assert!(store.active_survey().await.unwrap().is_none());

        let active_id = store
            .create_survey(FeedbackSurvey {
                status: SurveyStatus::Active,
                ..survey
            })
            .await
            .unwrap();
        assert_eq!(store.active_survey().await.unwrap().unwrap().id, active_id);

        let profile_id = store
            .create_user_profile(UserProfile {
                id: String::new(),
                name: "Ana".to_string(),
                email: "ana@example.org".to_string(),
                role: "Coordinator".to_string(),
                department: "Operations".to_string(),
                join_date: start,
                feedback_history: vec![],
            })
            .await
            .unwrap();
        let profile = store.user_profile(&profile_id).await.unwrap().unwrap();
        assert_eq!(profile.name, "Ana");
        assert!(store.user_profile("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_survey_response() {
        let store = DocumentStore::new(MockStorage::default());
        let record: SurveyRecord =
            serde_json::from_value(serde_json::json!({"answers": {"1": "Neutral"}})).unwrap();

        let id = store.add_survey_response(record).await.unwrap();
        assert_eq!(store.survey_responses().await.unwrap().len(), 1);

        store.delete_survey_response(&id).await.unwrap();
        assert!(store.survey_responses().await.unwrap().is_empty());

        let err = store.delete_survey_response(&id).await.unwrap_err();
        assert!(matches!(err, FeedbackError::NotFound { .. }));
    }
}
