use crate::domain::model::{
    OptionCount, Question, QuestionKind, QuestionSummary, SectionSummary, SurveyRecord,
};
use std::cmp::Ordering;
use std::collections::HashMap;

pub const NO_RESPONSE: &str = "No response";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Counts answers per option, most frequent first.
pub fn answer_distribution<S: AsRef<str>>(answers: &[S]) -> Vec<OptionCount> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for answer in answers {
        let answer = answer.as_ref();
        if answer == NO_RESPONSE {
            continue;
        }
        let count = counts.entry(answer).or_insert(0);
        if *count == 0 {
            order.push(answer);
        }
        *count += 1;
    }

    let total: usize = counts.values().sum();
    let mut stats: Vec<OptionCount> = order
        .into_iter()
        .map(|option| {
            let count = counts[option];
            OptionCount {
                option: option.to_string(),
                count,
                percentage: percentage(count, total),
            }
        })
        .collect();

    // sort_by is stable: ties keep first-seen order
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}

fn percentage(count: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((count as f64 / total as f64) * 100.0).round() as u8
}

fn answer_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn summarize_question(records: &[SurveyRecord], question: &Question) -> QuestionSummary {
    let answers: Vec<String> = records
        .iter()
        .map(|record| {
            record
                .answer_for(question)
                .and_then(answer_text)
                .unwrap_or_else(|| NO_RESPONSE.to_string())
        })
        .collect();

    let (distribution, text_responses) = match question.kind {
        QuestionKind::Text => (
            Vec::new(),
            answers
                .into_iter()
                .filter(|answer| answer != NO_RESPONSE)
                .collect(),
        ),
        QuestionKind::MultiChoice | QuestionKind::Rating => {
            (answer_distribution(&answers), Vec::new())
        }
    };

    QuestionSummary {
        question_id: question.id,
        question: question.text.clone(),
        kind: question.kind,
        distribution,
        text_responses,
    }
}

/// Groups question summaries by section, sections in questionnaire order.
pub fn summarize_by_section(records: &[SurveyRecord], questions: &[Question]) -> Vec<SectionSummary> {
    let mut sections: Vec<SectionSummary> = Vec::new();

    for question in questions {
        let summary = summarize_question(records, question);
        match sections.iter_mut().find(|s| s.section == question.section) {
            Some(section) => section.questions.push(summary),
            None => sections.push(SectionSummary {
                section: question.section.clone(),
                questions: vec![summary],
            }),
        }
    }

    sections
}

/// Case-insensitive match on respondent e-mail and answer values.
pub fn search_responses<'a>(records: &'a [SurveyRecord], term: &str) -> Vec<&'a SurveyRecord> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return records.iter().collect();
    }

    records
        .iter()
        .filter(|record| {
            let mut haystack: Vec<String> = Vec::new();
            if let Some(email) = record.user_email() {
                haystack.push(email.to_string());
            }
            if let Some(answers) = record.answers() {
                haystack.extend(answers.values().filter_map(answer_text));
            }
            haystack.join(" ").to_lowercase().contains(&term)
        })
        .collect()
}

/// Orders records by `createdAt`; undated records follow, in input order.
pub fn sort_by_created(records: &mut [SurveyRecord], direction: SortDirection) {
    records.sort_by(|a, b| match (a.created_at(), b.created_at()) {
        (Some(x), Some(y)) => match direction {
            SortDirection::Ascending => x.cmp(&y),
            SortDirection::Descending => y.cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::default_questionnaire;
    use serde_json::json;

    fn record(value: serde_json::Value) -> SurveyRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_answer_distribution() {
        let answers = ["Always", "Rarely", "No response", "Always", "Sometimes", "Rarely", "Always"];
        let stats = answer_distribution(&answers);

        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].option, "Always");
        assert_eq!(stats[0].count, 3);
        assert_eq!(stats[0].percentage, 50);
        assert_eq!(stats[1].option, "Rarely");
        assert_eq!(stats[1].percentage, 33);
        assert_eq!(stats[2].option, "Sometimes");
        assert_eq!(stats[2].percentage, 17);
    }

    #[test]
    fn test_answer_distribution_empty() {
        let empty: [&str; 0] = [];
        assert!(answer_distribution(&empty).is_empty());
        assert!(answer_distribution(&["No response"]).is_empty());
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let stats = answer_distribution(&["B", "A", "A", "B"]);
        assert_eq!(stats[0].option, "B");
        assert_eq!(stats[1].option, "A");
    }

    #[test]
    fn test_summarize_by_section() {
        let records = vec![
            record(json!({"answers": {"1": "Very satisfied", "11": "More remote days"}})),
            record(json!({"responses": {"How satisfied are you with your current role?": "Neutral"}})),
            record(json!({"answers": {"1": "Very satisfied"}})),
        ];

        let sections = summarize_by_section(&records, &default_questionnaire());
        assert_eq!(sections.len(), 3);

        let first = &sections[0].questions[0];
        assert_eq!(first.question_id, 1);
        assert_eq!(first.distribution[0].option, "Very satisfied");
        assert_eq!(first.distribution[0].count, 2);
        assert_eq!(first.distribution[1].option, "Neutral");

        let unanswered = &sections[0].questions[1];
        assert!(unanswered.distribution.is_empty());

        let open = &sections[2].questions[0];
        assert_eq!(open.kind, QuestionKind::Text);
        assert_eq!(open.text_responses, vec!["More remote days"]);
    }

    #[test]
    fn test_search_responses() {
        let records = vec![
            record(json!({"userEmail": "ana@example.org", "answers": {"1": "Neutral"}})),
            record(json!({"userEmail": "bo@example.org", "answers": {"1": "Very satisfied"}})),
        ];

        assert_eq!(search_responses(&records, "").len(), 2);
        assert_eq!(search_responses(&records, "ANA@").len(), 1);
        assert_eq!(search_responses(&records, "satisfied").len(), 1);
        assert!(search_responses(&records, "nobody").is_empty());
    }

    #[test]
    fn test_sort_by_created() {
        let mut records = vec![
            record(json!({"id": "undated"})),
            record(json!({"id": "old", "createdAt": {"seconds": 100, "nanoseconds": 0}})),
            record(json!({"id": "new", "createdAt": "2024-05-01T00:00:00Z"})),
        ];

        sort_by_created(&mut records, SortDirection::Descending);
        let ids: Vec<_> = records.iter().filter_map(|r| r.id()).collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);

        sort_by_created(&mut records, SortDirection::Ascending);
        let ids: Vec<_> = records.iter().filter_map(|r| r.id()).collect();
        assert_eq!(ids, vec!["old", "new", "undated"]);
    }
}
