use crate::domain::model::{Question, QuestionKind, StakeholderType, Value};

pub struct ValueDefinition {
    pub value: Value,
    pub description: &'static str,
    pub behavioral_definitions: &'static [&'static str],
}

pub struct StakeholderExpectation {
    pub stakeholder: StakeholderType,
    pub expectations: &'static [&'static str],
}

pub const VALUE_DEFINITIONS: [ValueDefinition; 4] = [
    ValueDefinition {
        value: Value::Collaboration,
        description: "Working together effectively as a team",
        behavioral_definitions: &[
            "Engage the right people",
            "Share calendars and information",
            "Create space for team thinking",
            "Contribute to visibility",
        ],
    },
    ValueDefinition {
        value: Value::Respect,
        description: "Showing consideration for others",
        behavioral_definitions: &[
            "Consider others' time and needs",
            "Balance work demands respectfully",
        ],
    },
    ValueDefinition {
        value: Value::Transparency,
        description: "Being open and honest in communication",
        behavioral_definitions: &[
            "Provide timely, direct feedback",
            "Share information that affects work",
            "Avoid withholding relevant context",
        ],
    },
    ValueDefinition {
        value: Value::Communication,
        description: "Clear and effective information sharing",
        behavioral_definitions: &[
            "Be open about challenges and day-to-day experience",
            "Ensure consistent external updates",
        ],
    },
];

pub const STAKEHOLDER_EXPECTATIONS: [StakeholderExpectation; 3] = [
    StakeholderExpectation {
        stakeholder: StakeholderType::PeopleWeHelp,
        expectations: &[
            "Pets go home safely and in good condition",
            "Clear communication",
            "Timely updates",
            "Ability to rely on us despite limited proof",
        ],
    },
    StakeholderExpectation {
        stakeholder: StakeholderType::Supporters,
        expectations: &[
            "Appreciate transparency and proof of impact",
            "Want donations used responsibly",
        ],
    },
    StakeholderExpectation {
        stakeholder: StakeholderType::Referrers,
        expectations: &[
            "Clear, timely comms (within 12 hrs)",
            "Regular updates",
            "Smooth logistics",
            "Ability to rely on us",
        ],
    },
];

/// Peer-feedback questions and the value each one rates.
pub const DEFAULT_QUESTION_MAP: [(&str, Value); 4] = [
    (
        "How well does the person collaborate with others?",
        Value::Collaboration,
    ),
    (
        "How respectful is the person in their interactions?",
        Value::Respect,
    ),
    (
        "How transparent is the person in their communication?",
        Value::Transparency,
    ),
    (
        "How effective is the person's communication?",
        Value::Communication,
    ),
];

pub fn value_definition(value: Value) -> &'static ValueDefinition {
    match value {
        Value::Collaboration => &VALUE_DEFINITIONS[0],
        Value::Respect => &VALUE_DEFINITIONS[1],
        Value::Transparency => &VALUE_DEFINITIONS[2],
        Value::Communication => &VALUE_DEFINITIONS[3],
    }
}

pub fn stakeholder_expectations(stakeholder: StakeholderType) -> &'static [&'static str] {
    STAKEHOLDER_EXPECTATIONS
        .iter()
        .find(|exp| exp.stakeholder == stakeholder)
        .map(|exp| exp.expectations)
        .unwrap_or(&[])
}

/// Stakeholder expectations a value is taken to serve. Matching against
/// [`stakeholder_expectations`] is verbatim, so "Clear, timely comms" does not
/// satisfy "Clear, timely comms (within 12 hrs)".
pub fn expectations_served_by(value: Value) -> &'static [&'static str] {
    match value {
        Value::Collaboration => &[
            "Pets go home safely and in good condition",
            "Smooth logistics",
        ],
        Value::Respect => &[
            "Ability to rely on us despite limited proof",
            "Ability to rely on us",
        ],
        Value::Transparency => &[
            "Appreciate transparency and proof of impact",
            "Clear communication",
        ],
        Value::Communication => &["Clear, timely comms", "Regular updates", "Timely updates"],
    }
}

const GENERAL: &str = "General Engagement & Work Satisfaction";
const WORK_STYLE: &str = "MBTI-Inspired Work Style & Team Dynamics";
const OPEN: &str = "Open Feedback";

fn choice(id: u32, text: &str, section: &str, options: &[&str]) -> Question {
    Question {
        id,
        kind: QuestionKind::MultiChoice,
        text: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        section: section.to_string(),
    }
}

/// The engagement questionnaire whose responses are summarised per section.
pub fn default_questionnaire() -> Vec<Question> {
    vec![
        choice(
            1,
            "How satisfied are you with your current role?",
            GENERAL,
            &[
                "Very satisfied",
                "Somewhat satisfied",
                "Neutral",
                "Somewhat dissatisfied",
                "Very dissatisfied",
            ],
        ),
        choice(
            2,
            "Do you feel that your contributions are valued by your team and leadership?",
            GENERAL,
            &["Always", "Most of the time", "Sometimes", "Rarely", "Never"],
        ),
        choice(
            3,
            "How would you describe the communication within your team?",
            GENERAL,
            &[
                "Excellent – Clear, open, and effective",
                "Good – Mostly clear but can be improved",
                "Average – Sometimes unclear",
                "Poor – Often unclear or ineffective",
                "Very poor – Lack of communication",
            ],
        ),
        choice(
            4,
            "Do you feel supported in your professional growth and development?",
            GENERAL,
            &[
                "Yes, I receive strong support",
                "Somewhat, but I would like more guidance",
                "Neutral",
                "Not really, I feel limited in opportunities",
                "No, there is little to no support",
            ],
        ),
        choice(
            5,
            "How would you rate your work-life balance?",
            GENERAL,
            &[
                "Excellent – I can manage both well",
                "Good – I balance it most of the time",
                "Average – It could be better",
                "Poor – I struggle with balance",
                "Very poor – Work dominates my life",
            ],
        ),
        choice(
            6,
            "How do you prefer to make decisions at work?",
            WORK_STYLE,
            &[
                "Based on logic, facts, and objective analysis",
                "Based on personal values, emotions, and team dynamics",
            ],
        ),
        choice(
            7,
            "Which working style suits you best?",
            WORK_STYLE,
            &[
                "Working alone with minimal interruptions",
                "Collaborating with others regularly",
                "A mix of both",
            ],
        ),
        choice(
            8,
            "How do you approach new challenges?",
            WORK_STYLE,
            &[
                "I analyze the situation carefully before acting",
                "I take an intuitive approach and adapt as I go",
            ],
        ),
        choice(
            9,
            "How do you prefer to receive feedback?",
            WORK_STYLE,
            &[
                "Direct and to the point",
                "With a balance of positive reinforcement and constructive criticism",
                "Indirectly, through observations and gradual improvement suggestions",
            ],
        ),
        choice(
            10,
            "What best describes your approach to planning and structure at work?",
            WORK_STYLE,
            &[
                "I prefer a well-structured plan with clear steps",
                "I like flexibility and adjusting plans as needed",
            ],
        ),
        Question {
            id: 11,
            kind: QuestionKind::Text,
            text: "What is one thing the company could do to improve your experience at work?"
                .to_string(),
            options: Vec::new(),
            section: OPEN.to_string(),
        },
    ]
}
