//! Closed vocabularies the pipelines answer with, and the option
//! normalisation rules shared by every prompt.
//!
//! Models see options with underscores replaced by spaces (`RETAIN AND
//! RECOMMEND`); their answers are normalised back by upper-casing and
//! replacing spaces with underscores before comparison.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Sentinel for "not determinable from the input". Distinct from absence.
pub const UNKNOWN_OPTION: &str = "UNKNOWN";

/// `"retain and recommend "` → `"RETAIN_AND_RECOMMEND"`.
pub fn normalize_option(answer: &str) -> String {
    answer.trim().to_uppercase().replace(' ', "_")
}

/// `"RETAIN_AND_RECOMMEND"` → `"RETAIN AND RECOMMEND"`.
pub fn display_option(option: &str) -> String {
    option.replace('_', " ")
}

/// A fixed set of options a model must pick from.
pub trait Choice: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    /// Match a model answer against the options after normalisation.
    fn parse(answer: &str) -> Option<Self> {
        let normalized = normalize_option(answer);
        Self::ALL.iter().copied().find(|c| c.as_str() == normalized)
    }

    /// Options as shown to the model.
    fn display_options() -> Vec<String> {
        Self::ALL.iter().map(|c| display_option(c.as_str())).collect()
    }

    /// Bullet list used in violation feedback.
    fn bullet_list() -> String {
        Self::ALL.iter().map(|c| format!("- {}\n", c.as_str())).collect()
    }
}

macro_rules! choice {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl Choice for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice! {
    /// How badly an issue affects the customer. Never unknown.
    Severity {
        Critical => "CRITICAL",
        High => "HIGH",
        Medium => "MEDIUM",
        Low => "LOW",
    }
}

choice! {
    /// How much a suggestion matters to the customer. Never unknown.
    Importance {
        Critical => "CRITICAL",
        High => "HIGH",
        Medium => "MEDIUM",
        Low => "LOW",
    }
}

choice! {
    Sentiment {
        Positive => "POSITIVE",
        Neutral => "NEUTRAL",
        Negative => "NEGATIVE",
    }
}

choice! {
    /// Plutchik's wheel, primary and low-intensity emotions.
    Emotion {
        Trust => "TRUST",
        Acceptance => "ACCEPTANCE",
        Fear => "FEAR",
        Apprehension => "APPREHENSION",
        Surprise => "SURPRISE",
        Distraction => "DISTRACTION",
        Sadness => "SADNESS",
        Pensiveness => "PENSIVENESS",
        Disgust => "DISGUST",
        Boredom => "BOREDOM",
        Anger => "ANGER",
        Annoyance => "ANNOYANCE",
        Anticipation => "ANTICIPATION",
        Interest => "INTEREST",
        Joy => "JOY",
        Serenity => "SERENITY",
    }
}

choice! {
    /// What the customer intends to do next. Reviews report the
    /// `UNKNOWN` sentinel when none applies.
    Intention {
        Retain => "RETAIN",
        Churn => "CHURN",
        RetainAndRecommend => "RETAIN_AND_RECOMMEND",
        ChurnAndDiscourage => "CHURN_AND_DISCOURAGE",
    }
}

/// Options shown to the model for a caller-supplied category list, with
/// the sentinel appended and duplicates removed.
pub fn category_options(categories: &[String]) -> Vec<String> {
    let mut options: Vec<String> = Vec::with_capacity(categories.len() + 1);
    for category in categories.iter().map(String::as_str).chain([UNKNOWN_OPTION]) {
        let shown = display_option(category);
        if !options.contains(&shown) {
            options.push(shown);
        }
    }
    options
}

/// Whether a model answer is acceptable for the category list: a member
/// after normalisation, or the sentinel.
pub fn is_valid_category(answer: &str, categories: &[String]) -> bool {
    let normalized = normalize_option(answer);
    normalized == UNKNOWN_OPTION || categories.iter().any(|c| normalize_option(c) == normalized)
}

/// Resolve a model answer to one of the caller's categories.
///
/// Categories are never invented: anything that is not a member, and any
/// answer when the list is empty, resolves to `UNKNOWN`.
pub fn resolve_category(answer: &str, categories: &[String]) -> String {
    let normalized = normalize_option(answer);
    categories
        .iter()
        .find(|c| normalize_option(c) == normalized)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_OPTION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_and_display() {
        assert_eq!(normalize_option(" retain and recommend"), "RETAIN_AND_RECOMMEND");
        assert_eq!(display_option("CHURN_AND_DISCOURAGE"), "CHURN AND DISCOURAGE");
    }

    #[test]
    fn test_parse_choices() {
        assert_eq!(Severity::parse("critical"), Some(Severity::Critical));
        assert_eq!(Intention::parse("Retain and Recommend"), Some(Intention::RetainAndRecommend));
        assert_eq!(Sentiment::parse("ecstatic"), None);
        assert_eq!(Emotion::ALL.len(), 16);
        assert!(Intention::parse(UNKNOWN_OPTION).is_none());
    }

    #[test]
    fn test_serialized_form() {
        let json = serde_json::to_string(&Intention::ChurnAndDiscourage).unwrap();
        assert_eq!(json, "\"CHURN_AND_DISCOURAGE\"");
        let parsed: Importance = serde_json::from_str("\"LOW\"").unwrap();
        assert_eq!(parsed, Importance::Low);
    }

    #[test]
    fn test_display_options() {
        let shown = Intention::display_options();
        assert!(shown.contains(&"RETAIN AND RECOMMEND".to_string()));
        assert_eq!(Severity::bullet_list(), "- CRITICAL\n- HIGH\n- MEDIUM\n- LOW\n");
    }

    #[test]
    fn test_resolve_category_member() {
        let list = categories(&["USER_INTERFACE", "PERFORMANCE"]);
        assert_eq!(resolve_category("user interface", &list), "USER_INTERFACE");
        assert_eq!(resolve_category("PERFORMANCE", &list), "PERFORMANCE");
    }

    #[test]
    fn test_resolve_category_never_invents() {
        let list = categories(&["PERFORMANCE"]);
        assert_eq!(resolve_category("PRICING", &list), UNKNOWN_OPTION);
        assert_eq!(resolve_category("PERFORMANCE", &[]), UNKNOWN_OPTION);
    }

    #[test]
    fn test_category_options() {
        let list = categories(&["USER_INTERFACE", "USER_INTERFACE", "UNKNOWN"]);
        assert_eq!(category_options(&list), vec!["USER INTERFACE", "UNKNOWN"]);
        assert_eq!(category_options(&[]), vec!["UNKNOWN"]);
    }

    #[test]
    fn test_is_valid_category() {
        let list = categories(&["BILLING"]);
        assert!(is_valid_category("billing", &list));
        assert!(is_valid_category("unknown", &list));
        assert!(!is_valid_category("SHIPPING", &list));
    }
}
