use crate::domain::catalog::{expectations_served_by, stakeholder_expectations, DEFAULT_QUESTION_MAP};
use crate::domain::model::{
    FeedbackEntry, FeedbackReport, OverallTrends, Rating, StakeholderAlignment, StakeholderType,
    SurveyRecord, Trend, Value, ValueScore,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

const PHRASE_DELIMITERS: [char; 4] = ['.', ',', '!', '?'];

/// Survey question text -> rated value.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionMap {
    mappings: Vec<(String, Value)>,
}

impl Default for QuestionMap {
    fn default() -> Self {
        Self {
            mappings: DEFAULT_QUESTION_MAP
                .iter()
                .map(|(question, value)| (question.to_string(), *value))
                .collect(),
        }
    }
}

impl QuestionMap {
    pub fn empty() -> Self {
        Self {
            mappings: Vec::new(),
        }
    }

    /// Adds a mapping, replacing any existing mapping for the same question.
    pub fn with_mapping(mut self, question: impl Into<String>, value: Value) -> Self {
        let question = question.into();
        match self.mappings.iter_mut().find(|(q, _)| *q == question) {
            Some(existing) => existing.1 = value,
            None => self.mappings.push((question, value)),
        }
        self
    }

    pub fn value_for(&self, question: &str) -> Option<Value> {
        self.mappings
            .iter()
            .find(|(q, _)| q == question)
            .map(|(_, value)| *value)
    }

    /// Mappings grouped in value order, insertion order within a value.
    pub fn questions(&self) -> impl Iterator<Item = (&str, Value)> + '_ {
        Value::ALL.into_iter().flat_map(move |value| {
            self.mappings
                .iter()
                .filter(move |(_, v)| *v == value)
                .map(|(q, v)| (q.as_str(), *v))
        })
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    /// Ratings at or above this count as positive.
    pub positive_threshold: u8,
    /// Comment fragments must be longer than this to be considered.
    pub min_phrase_length: usize,
    pub top_n: usize,
    /// Minimum change in average score that counts as a trend.
    pub trend_tolerance: f64,
    pub question_map: QuestionMap,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            positive_threshold: 4,
            min_phrase_length: 10,
            top_n: 3,
            trend_tolerance: 0.25,
            question_map: QuestionMap::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualitativeSummary {
    pub strengths: Vec<String>,
    pub opportunities: Vec<String>,
    pub quotes: Vec<String>,
}

/// Converts free-form survey answers to a rating.
pub fn rating_from_answer(answer: &serde_json::Value) -> Rating {
    match answer {
        serde_json::Value::Number(n) => n.as_f64().map(Rating::clamped).unwrap_or(Rating::NEUTRAL),
        serde_json::Value::String(text) => {
            let lower = text.to_lowercase();
            let score = if lower.contains("excellent") || lower.contains("always") {
                5
            } else if lower.contains("very good") || lower.contains("usually") {
                4
            } else if lower.contains("good") || lower.contains("sometimes") {
                3
            } else if lower.contains("fair") || lower.contains("rarely") {
                2
            } else {
                1
            };
            Rating::clamped(score as f64)
        }
        _ => Rating::NEUTRAL,
    }
}

/// Mean rating of the value's entries, 0 when there are none.
pub fn calculate_value_score(entries: &[FeedbackEntry], value: Value) -> f64 {
    let (sum, count) = entries
        .iter()
        .filter(|entry| entry.value == value)
        .fold((0u32, 0u32), |(sum, count), entry| {
            (sum + entry.rating.get() as u32, count + 1)
        });

    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Compares two averages. A zero average means "no entries" and yields stable.
pub fn trend_between(previous: f64, current: f64, tolerance: f64) -> Trend {
    if previous <= 0.0 || current <= 0.0 {
        return Trend::Stable;
    }
    let delta = current - previous;
    if delta.abs() < f64::EPSILON {
        Trend::Stable
    } else if delta >= tolerance {
        Trend::Improving
    } else if delta <= -tolerance {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Fragments that occur more than once, each reported once, first-seen order.
fn recurring(fragments: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for fragment in &fragments {
        *counts.entry(fragment.as_str()).or_insert(0) += 1;
    }

    let mut seen = std::collections::HashSet::new();
    fragments
        .iter()
        .filter(|fragment| counts.get(fragment.as_str()).copied().unwrap_or(0) > 1)
        .filter(|fragment| seen.insert(fragment.as_str()))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct FeedbackAnalyzer {
    settings: AnalysisSettings,
}

impl FeedbackAnalyzer {
    pub fn new(settings: AnalysisSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    fn is_positive(&self, entry: &FeedbackEntry) -> bool {
        entry.rating.get() >= self.settings.positive_threshold
    }

    pub fn convert_survey_to_feedback(
        &self,
        records: &[SurveyRecord],
        user_id: &str,
        survey_id: &str,
    ) -> Vec<FeedbackEntry> {
        let now = Utc::now();
        let mut entries = Vec::new();

        for (index, record) in records.iter().enumerate() {
            let record_id = record.id().unwrap_or_else(|| format!("response-{}", index));
            let timestamp = record.timestamp().unwrap_or(now);
            let from_user_id = record.from_user_id().unwrap_or("anonymous");
            let before = entries.len();

            for (question, value) in self.settings.question_map.questions() {
                let Some(answer) = record.get(question) else {
                    continue;
                };
                entries.push(FeedbackEntry {
                    id: format!("{}-{}", record_id, value),
                    from_user_id: from_user_id.to_string(),
                    to_user_id: user_id.to_string(),
                    value,
                    rating: rating_from_answer(answer),
                    qualitative_feedback: record.comment_for(question),
                    timestamp,
                    survey_id: survey_id.to_string(),
                });
            }

            if entries.len() == before {
                tracing::debug!("Response {} has no mapped questions", record_id);
            }
        }

        entries
    }

    pub fn analyze_qualitative_feedback(
        &self,
        entries: &[FeedbackEntry],
        value: Value,
    ) -> QualitativeSummary {
        let mut strengths = Vec::new();
        let mut opportunities = Vec::new();

        let value_entries: Vec<&FeedbackEntry> =
            entries.iter().filter(|entry| entry.value == value).collect();

        for entry in &value_entries {
            let feedback = entry.qualitative_feedback.to_lowercase();
            let bucket = if self.is_positive(entry) {
                &mut strengths
            } else {
                &mut opportunities
            };

            feedback
                .split(PHRASE_DELIMITERS)
                .filter(|phrase| phrase.chars().count() > self.settings.min_phrase_length)
                .for_each(|phrase| bucket.push(phrase.trim().to_string()));
        }

        let quotes = value_entries
            .iter()
            .filter(|entry| self.is_positive(entry))
            .filter(|entry| !entry.qualitative_feedback.trim().is_empty())
            .map(|entry| entry.qualitative_feedback.clone())
            .take(self.settings.top_n)
            .collect();

        QualitativeSummary {
            strengths: recurring(strengths),
            opportunities: recurring(opportunities),
            quotes,
        }
    }

    pub fn calculate_stakeholder_alignment(
        &self,
        entries: &[FeedbackEntry],
        stakeholder: StakeholderType,
    ) -> StakeholderAlignment {
        let expectations = stakeholder_expectations(stakeholder);

        let mut total_score = 0.0;
        let mut max_possible = 0.0;
        let mut evidence = Vec::new();

        for value in Value::ALL {
            let value_entries: Vec<&FeedbackEntry> =
                entries.iter().filter(|entry| entry.value == value).collect();
            if value_entries.is_empty() {
                continue;
            }

            let relevant = expectations_served_by(value)
                .iter()
                .filter(|exp| expectations.contains(*exp))
                .count();
            if relevant == 0 {
                continue;
            }

            let average = calculate_value_score(entries, value);
            total_score += average * relevant as f64;
            max_possible += Rating::MAX as f64 * relevant as f64;

            evidence.extend(
                value_entries
                    .iter()
                    .filter(|entry| self.is_positive(entry))
                    .filter(|entry| !entry.qualitative_feedback.trim().is_empty())
                    .map(|entry| entry.qualitative_feedback.clone()),
            );
        }

        let alignment = if max_possible > 0.0 {
            ((total_score / max_possible) * 100.0).round().clamp(0.0, 100.0) as u8
        } else {
            0
        };
        evidence.truncate(self.settings.top_n);

        StakeholderAlignment {
            alignment,
            supporting_evidence: evidence,
        }
    }

    pub fn generate_report(
        &self,
        user_id: &str,
        survey_id: &str,
        entries: &[FeedbackEntry],
        previous: Option<&FeedbackReport>,
    ) -> FeedbackReport {
        self.generate_report_at(user_id, survey_id, entries, previous, Utc::now())
    }

    pub fn generate_report_at(
        &self,
        user_id: &str,
        survey_id: &str,
        entries: &[FeedbackEntry],
        previous: Option<&FeedbackReport>,
        generated_at: DateTime<Utc>,
    ) -> FeedbackReport {
        let mut value_scores = BTreeMap::new();
        for value in Value::ALL {
            let average_score = calculate_value_score(entries, value);
            let trend = previous
                .and_then(|report| report.value_scores.get(&value))
                .map(|prior| {
                    trend_between(
                        prior.average_score,
                        average_score,
                        self.settings.trend_tolerance,
                    )
                })
                .unwrap_or(Trend::Stable);
            let summary = self.analyze_qualitative_feedback(entries, value);

            value_scores.insert(
                value,
                ValueScore {
                    average_score,
                    trend,
                    strengths: summary.strengths,
                    opportunities: summary.opportunities,
                    supporting_quotes: summary.quotes,
                },
            );
        }

        let stakeholder_alignment = StakeholderType::ALL
            .into_iter()
            .map(|stakeholder| {
                (
                    stakeholder,
                    self.calculate_stakeholder_alignment(entries, stakeholder),
                )
            })
            .collect();

        let top_n = self.settings.top_n;
        let all_strengths: Vec<String> = value_scores
            .values()
            .flat_map(|score| score.strengths.iter().cloned())
            .collect();
        let all_opportunities: Vec<String> = value_scores
            .values()
            .flat_map(|score| score.opportunities.iter().cloned())
            .collect();
        let action_items = all_opportunities
            .iter()
            .take(top_n)
            .map(|opportunity| format!("Focus on {}", opportunity.to_lowercase()))
            .collect();

        tracing::debug!(
            "Generated report for {} from {} entries",
            user_id,
            entries.len()
        );

        FeedbackReport {
            id: format!("report-{}", generated_at.timestamp_millis()),
            user_id: user_id.to_string(),
            survey_id: survey_id.to_string(),
            generated_at,
            value_scores,
            stakeholder_alignment,
            overall_trends: OverallTrends {
                strengths: all_strengths.into_iter().take(top_n).collect(),
                opportunities: all_opportunities.into_iter().take(top_n).collect(),
                action_items,
            },
        }
    }

    pub fn generate_report_from_survey(
        &self,
        user_id: &str,
        survey_id: &str,
        records: &[SurveyRecord],
        previous: Option<&FeedbackReport>,
    ) -> FeedbackReport {
        let entries = self.convert_survey_to_feedback(records, user_id, survey_id);
        self.generate_report(user_id, survey_id, &entries, previous)
    }
}
