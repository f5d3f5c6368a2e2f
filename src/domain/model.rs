use crate::utils::error::FeedbackError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Behavioural value rated in peer feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    Collaboration,
    Respect,
    Transparency,
    Communication,
}

impl Value {
    pub const ALL: [Value; 4] = [
        Value::Collaboration,
        Value::Respect,
        Value::Transparency,
        Value::Communication,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Value::Collaboration => "Collaboration",
            Value::Respect => "Respect",
            Value::Transparency => "Transparency",
            Value::Communication => "Communication",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Value {
    type Err = FeedbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Value::ALL
            .into_iter()
            .find(|value| value.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FeedbackError::ValidationError {
                message: format!("Unknown value '{}'", s),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StakeholderType {
    PeopleWeHelp,
    Supporters,
    Referrers,
}

impl StakeholderType {
    pub const ALL: [StakeholderType; 3] = [
        StakeholderType::PeopleWeHelp,
        StakeholderType::Supporters,
        StakeholderType::Referrers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StakeholderType::PeopleWeHelp => "PeopleWeHelp",
            StakeholderType::Supporters => "Supporters",
            StakeholderType::Referrers => "Referrers",
        }
    }

    /// Human readable label, e.g. "People We Help".
    pub fn label(&self) -> String {
        let mut label = String::new();
        for (i, ch) in self.as_str().char_indices() {
            if i > 0 && ch.is_ascii_uppercase() {
                label.push(' ');
            }
            label.push(ch);
        }
        label
    }
}

impl fmt::Display for StakeholderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rating on the 1-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;
    pub const NEUTRAL: Rating = Rating(3);

    pub fn new(value: u8) -> Result<Self, FeedbackError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Rating(value))
        } else {
            Err(FeedbackError::ValidationError {
                message: format!(
                    "Rating {} is outside {}..={}",
                    value,
                    Self::MIN,
                    Self::MAX
                ),
            })
        }
    }

    /// Rounds and clamps an arbitrary number onto the scale. NaN maps to neutral.
    pub fn clamped(value: f64) -> Self {
        if !value.is_finite() {
            return if value.is_nan() {
                Self::NEUTRAL
            } else if value > 0.0 {
                Rating(Self::MAX)
            } else {
                Rating(Self::MIN)
            };
        }
        let rounded = value.round().clamp(Self::MIN as f64, Self::MAX as f64);
        Rating(rounded as u8)
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = FeedbackError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trend::Improving => "improving",
            Trend::Stable => "stable",
            Trend::Declining => "declining",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    pub id: String,
    /// Tracked for storage only, never shown in reports.
    pub from_user_id: String,
    pub to_user_id: String,
    pub value: Value,
    pub rating: Rating,
    pub qualitative_feedback: String,
    pub timestamp: DateTime<Utc>,
    pub survey_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
    Draft,
    Active,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSurvey {
    pub id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: SurveyStatus,
    pub participants: Vec<String>,
    pub completed_responses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub department: String,
    pub join_date: DateTime<Utc>,
    #[serde(default)]
    pub feedback_history: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueScore {
    pub average_score: f64,
    pub trend: Trend,
    pub strengths: Vec<String>,
    pub opportunities: Vec<String>,
    pub supporting_quotes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeholderAlignment {
    /// Percentage, 0..=100.
    pub alignment: u8,
    pub supporting_evidence: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallTrends {
    pub strengths: Vec<String>,
    pub opportunities: Vec<String>,
    pub action_items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackReport {
    pub id: String,
    pub user_id: String,
    pub survey_id: String,
    pub generated_at: DateTime<Utc>,
    pub value_scores: BTreeMap<Value, ValueScore>,
    pub stakeholder_alignment: BTreeMap<StakeholderType, StakeholderAlignment>,
    pub overall_trends: OverallTrends,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionKind {
    Text,
    MultiChoice,
    Rating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub kind: QuestionKind,
    pub text: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub section: String,
}

/// Answer count for one option of a question, as drawn in response charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionCount {
    pub option: String,
    pub count: usize,
    pub percentage: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSummary {
    pub question_id: u32,
    pub question: String,
    pub kind: QuestionKind,
    pub distribution: Vec<OptionCount>,
    pub text_responses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSummary {
    pub section: String,
    pub questions: Vec<QuestionSummary>,
}

/// Everything the transform phase hands to the load phase.
#[derive(Debug, Clone)]
pub struct ReportBundle {
    pub record_count: usize,
    pub entries: Vec<FeedbackEntry>,
    pub report: FeedbackReport,
    pub sections: Vec<SectionSummary>,
    pub value_scores_csv: String,
    pub alignment_csv: String,
    pub distribution_csv: String,
}

/// One raw survey response as exported from the document database.
///
/// Peer-feedback exports key answers by question text at the top level and
/// carry `<question>_comments` beside them. Engagement-survey exports nest the
/// answers under `answers` (older documents use `responses`), keyed by the
/// question id or its text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurveyRecord {
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl SurveyRecord {
    pub fn new(data: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { data }
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    pub fn id(&self) -> Option<String> {
        match self.data.get("id")? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn from_user_id(&self) -> Option<&str> {
        self.str_field("fromUserId")
    }

    pub fn user_email(&self) -> Option<&str> {
        self.str_field("userEmail")
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.data.get("timestamp").and_then(parse_timestamp)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.data.get("createdAt").and_then(parse_timestamp)
    }

    /// Free-text comment attached to a question, empty when absent.
    pub fn comment_for(&self, question: &str) -> String {
        self.str_field(&format!("{}_comments", question))
            .unwrap_or_default()
            .to_string()
    }

    /// The nested answer map of engagement-survey documents.
    pub fn answers(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.data
            .get("answers")
            .and_then(|v| v.as_object())
            .or_else(|| self.data.get("responses").and_then(|v| v.as_object()))
    }

    /// Looks a question up by id, then by text, in the nested answers and
    /// finally at the top level of the document.
    pub fn answer_for(&self, question: &Question) -> Option<&serde_json::Value> {
        let id_key = question.id.to_string();
        self.answers()
            .and_then(|answers| {
                answers
                    .get(&id_key)
                    .or_else(|| answers.get(&question.text))
            })
            .or_else(|| self.data.get(&question.text))
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }
}

/// Accepts RFC 3339 strings, epoch milliseconds and `{seconds, nanoseconds}`
/// document timestamps.
pub fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok(),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        serde_json::Value::Object(obj) => {
            let seconds = obj.get("seconds").and_then(|v| v.as_i64())?;
            let nanos = obj
                .get("nanoseconds")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32;
            Utc.timestamp_opt(seconds, nanos).single()
        }
        _ => None,
    }
}
