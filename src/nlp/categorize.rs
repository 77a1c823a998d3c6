//! Keyword categorizer: free text → category, priority and due expression.
//!
//! Rules live in an ordered table and the first family that matches wins.
//! The order is the tie-break: "meeting before the gym" is work because the
//! work family is checked before health.

use serde::{Deserialize, Serialize};

use super::due::{DueExpr, extract_due};
use crate::task::{Category, Priority};

/// What a matching rule assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleOutcome {
    Assign { category: Category, priority: u8 },
    /// The text reads like a board query; it gets no category and no due.
    Isolated,
}

struct CategoryRule {
    keywords: &'static [&'static str],
    outcome: RuleOutcome,
}

const WORK_WORDS: &[&str] = &[
    "meeting",
    "report",
    "email",
    "deadline",
    "presentation",
    "client",
    "project",
    "boss",
    "office",
    "standup",
    "slides",
    "invoice",
    "review",
    "sync",
];

const HEALTH_WORDS: &[&str] = &[
    "gym",
    "workout",
    "doctor",
    "dentist",
    "yoga",
    "run",
    "jog",
    "medicine",
    "meds",
    "therapy",
    "physio",
    "checkup",
    "vitamins",
    "swim",
];

const CAREER_WORDS: &[&str] = &[
    "interview",
    "resume",
    "cv",
    "job",
    "linkedin",
    "portfolio",
    "networking",
    "application",
    "recruiter",
    "cover letter",
    "certification",
];

const ERRAND_WORDS: &[&str] = &[
    "buy",
    "groceries",
    "grocery",
    "milk",
    "pick up",
    "pickup",
    "laundry",
    "bank",
    "post office",
    "pharmacy",
    "shopping",
    "store",
    "return",
    "drop off",
];

const SHOW_WORDS: &[&str] = &["show"];

const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        keywords: WORK_WORDS,
        outcome: RuleOutcome::Assign { category: Category::Work, priority: 4 },
    },
    CategoryRule {
        keywords: HEALTH_WORDS,
        outcome: RuleOutcome::Assign { category: Category::Health, priority: 3 },
    },
    CategoryRule {
        keywords: CAREER_WORDS,
        outcome: RuleOutcome::Assign { category: Category::Career, priority: 4 },
    },
    CategoryRule {
        keywords: ERRAND_WORDS,
        outcome: RuleOutcome::Assign { category: Category::Errands, priority: 2 },
    },
    CategoryRule {
        keywords: SHOW_WORDS,
        outcome: RuleOutcome::Isolated,
    },
];

/// Result of categorizing a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categorization {
    /// `None` is the isolated sentinel: the text looked like a query.
    pub category: Option<Category>,
    pub priority: Priority,
    pub due: Option<DueExpr>,
}

impl Categorization {
    pub fn is_isolated(&self) -> bool {
        self.category.is_none()
    }
}

/// Categorize `text`. Pure: the same input always yields the same output.
pub fn categorize(text: &str) -> Categorization {
    let words = Words::new(text);

    let matched = CATEGORY_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| words.contains(kw)));

    match matched.map(|rule| rule.outcome) {
        Some(RuleOutcome::Assign { category, priority }) => Categorization {
            category: Some(category),
            priority: Priority::new(i64::from(priority)),
            due: extract_due(text),
        },
        Some(RuleOutcome::Isolated) => Categorization {
            category: None,
            priority: Priority::DEFAULT,
            due: None,
        },
        None => Categorization {
            category: Some(Category::Personal),
            priority: Priority::DEFAULT,
            due: extract_due(text),
        },
    }
}

/// Lower-cased word view of a text for keyword lookup.
struct Words {
    tokens: Vec<String>,
    /// Tokens re-joined with single spaces and padded, for phrase lookup.
    padded: String,
}

impl Words {
    fn new(text: &str) -> Self {
        let tokens: Vec<String> = text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        let padded = format!(" {} ", tokens.join(" "));
        Self { tokens, padded }
    }

    /// Whole-word match; single words also match with a plural `s`.
    fn contains(&self, keyword: &str) -> bool {
        if keyword.contains(' ') {
            return self.padded.contains(&format!(" {keyword} "));
        }
        self.tokens.iter().any(|t| {
            t == keyword || t.strip_suffix('s').is_some_and(|stem| stem == keyword)
        })
    }
}
