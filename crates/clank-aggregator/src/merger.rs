//! Merging two duplicates into one coherent item.

use std::path::Path;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use clank_core::{Result, UNKNOWN_OPTION};
use clank_llm::{Checks, LanguageModel, Predictor, Signature};

use crate::types::{Issue, Suggestion};

const MAX_TITLE_CHARS: usize = 100;
const MAX_STEPS: usize = 5;

#[derive(Debug, Serialize)]
pub struct IssuesToMerge {
    pub issue_a: Issue,
    pub issue_b: Issue,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MergedIssue {
    pub issue: Issue,
}

pub struct MergeIssues;

impl Signature for MergeIssues {
    const NAME: &'static str = "aggregator/issue_merger";
    const INSTRUCTIONS: &'static str = "
Merge, coherently, issue A and issue B, that customers have with a product, into a single issue.
- Maintain the core problem, context and nuances of both issues.
- Do not create information that is not present in any of the issues.";

    type Input = IssuesToMerge;
    type Output = MergedIssue;

    fn check(output: &MergedIssue, checks: &mut Checks) {
        let issue = &output.issue;
        checks.require(
            issue.title.chars().count() <= MAX_TITLE_CHARS,
            format!("The title cannot be longer than {} characters!", MAX_TITLE_CHARS),
        );
        checks.require(
            issue.steps.len() <= MAX_STEPS,
            format!(
                "The issue cannot have more than {} steps to reproduce ({})!",
                MAX_STEPS,
                issue.steps.len()
            ),
        );
    }
}

/// Merges two issues into one.
pub struct IssueMerger {
    predictor: Predictor<MergeIssues>,
}

impl IssueMerger {
    pub fn new(lm: Arc<dyn LanguageModel>, artifacts_path: &Path) -> Result<Self> {
        Ok(Self {
            predictor: Predictor::new(lm, artifacts_path)?,
        })
    }

    /// Identical issues merge to themselves without a model call.
    pub async fn merge(&self, a: &Issue, b: &Issue) -> Result<Issue> {
        if a == b {
            return Ok(a.clone());
        }

        let max_steps = a.steps.len() + b.steps.len();
        let input = IssuesToMerge {
            issue_a: a.clone(),
            issue_b: b.clone(),
        };

        let merged = self
            .predictor
            .predict(&input, |output, checks| {
                checks.suggest(
                    output.issue.steps.len() <= max_steps,
                    format!(
                        "The merged issue's `steps to reproduce` ({}) cannot be longer than the sum of the `steps to reproduce` of the original issues ({})!",
                        output.issue.steps.len(),
                        max_steps
                    ),
                );
            })
            .await?;

        Ok(merged.issue)
    }
}

#[derive(Debug, Serialize)]
pub struct SuggestionsToMerge {
    pub suggestion_a: Suggestion,
    pub suggestion_b: Suggestion,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MergedSuggestion {
    pub suggestion: Suggestion,
}

pub struct MergeSuggestions;

impl Signature for MergeSuggestions {
    const NAME: &'static str = "aggregator/suggestion_merger";
    const INSTRUCTIONS: &'static str = "
Merge, coherently, suggestion A and suggestion B, that customers have about a product, into a single suggestion.
- Maintain the core idea, context and nuances of both suggestions.
- Do not create information that is not present in any of the suggestions.";

    type Input = SuggestionsToMerge;
    type Output = MergedSuggestion;

    fn check(output: &MergedSuggestion, checks: &mut Checks) {
        let suggestion = &output.suggestion;
        checks.require(
            suggestion.title.chars().count() <= MAX_TITLE_CHARS,
            format!("The title cannot be longer than {} characters!", MAX_TITLE_CHARS),
        );
        checks.suggest(
            is_valid_reason(&suggestion.reason),
            format!(
                "The reason must start with `This will`, else be `{}`!",
                UNKNOWN_OPTION
            ),
        );
    }
}

pub(crate) fn is_valid_reason(reason: &str) -> bool {
    reason.trim_start().starts_with("This will") || reason.trim().eq_ignore_ascii_case(UNKNOWN_OPTION)
}

/// Reasons equal to the sentinel are reported empty.
pub(crate) fn normalize_reason(reason: String) -> String {
    if reason.trim().eq_ignore_ascii_case(UNKNOWN_OPTION) {
        String::new()
    } else {
        reason
    }
}

/// Empty reasons are shown to the model as the sentinel.
fn prompt_reason(suggestion: &Suggestion) -> Suggestion {
    let mut suggestion = suggestion.clone();
    if suggestion.reason.trim().is_empty() {
        suggestion.reason = UNKNOWN_OPTION.to_string();
    }
    suggestion
}

/// Merges two suggestions into one.
pub struct SuggestionMerger {
    predictor: Predictor<MergeSuggestions>,
}

impl SuggestionMerger {
    pub fn new(lm: Arc<dyn LanguageModel>, artifacts_path: &Path) -> Result<Self> {
        Ok(Self {
            predictor: Predictor::new(lm, artifacts_path)?,
        })
    }

    /// Identical suggestions merge to themselves without a model call.
    pub async fn merge(&self, a: &Suggestion, b: &Suggestion) -> Result<Suggestion> {
        if a == b {
            return Ok(a.clone());
        }

        let input = SuggestionsToMerge {
            suggestion_a: prompt_reason(a),
            suggestion_b: prompt_reason(b),
        };

        let merged = self.predictor.predict(&input, |_, _| {}).await?.suggestion;

        Ok(Suggestion {
            reason: normalize_reason(merged.reason),
            ..merged
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clank_llm::ScriptedModel;
    use serde_json::json;

    fn issue(title: &str, steps: &[&str]) -> Issue {
        Issue {
            title: title.into(),
            description: format!("{} happens every time.", title),
            steps: steps.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn suggestion(title: &str, reason: &str) -> Suggestion {
        Suggestion {
            title: title.into(),
            description: format!("{} would be welcome.", title),
            reason: reason.into(),
        }
    }

    #[tokio::test]
    async fn test_identical_issues_skip_model() {
        let lm = Arc::new(ScriptedModel::silent());
        let dir = tempfile::tempdir().unwrap();
        let merger = IssueMerger::new(lm.clone(), dir.path()).unwrap();

        let a = issue("App crashes on launch", &["Open the app"]);
        assert_eq!(merger.merge(&a, &a.clone()).await.unwrap(), a);
        assert_eq!(lm.calls(), 0);
    }

    #[tokio::test]
    async fn test_issue_with_too_many_steps_is_retried() {
        let six: Vec<String> = (1..=6).map(|i| format!("Step {}", i)).collect();
        let lm = Arc::new(ScriptedModel::new([
            ScriptedModel::answer(json!({"issue": {
                "title": "Crash on launch", "description": "Crashes.", "steps": six
            }})),
            ScriptedModel::answer(json!({"issue": {
                "title": "Crash on launch", "description": "Crashes.", "steps": ["Open the app"]
            }})),
        ]));
        let dir = tempfile::tempdir().unwrap();
        let merger = IssueMerger::new(lm.clone(), dir.path()).unwrap();

        let merged = merger
            .merge(
                &issue("App crashes on launch", &["Open the app"]),
                &issue("Crash at startup", &["Tap the icon"]),
            )
            .await
            .unwrap();

        assert_eq!(merged.steps, vec!["Open the app"]);
        assert_eq!(lm.calls(), 2);
    }

    #[tokio::test]
    async fn test_identical_suggestions_skip_model() {
        let lm = Arc::new(ScriptedModel::silent());
        let dir = tempfile::tempdir().unwrap();
        let merger = SuggestionMerger::new(lm.clone(), dir.path()).unwrap();

        let a = suggestion("Add dark mode", "UNKNOWN");
        assert_eq!(merger.merge(&a, &a).await.unwrap(), a);
        assert_eq!(lm.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_reason_is_derived_from_other_parent() {
        let lm = Arc::new(ScriptedModel::new([ScriptedModel::answer(json!({"suggestion": {
            "title": "Dark theme for the interface",
            "description": "A dark theme for night usage.",
            "reason": "This will reduce eye strain at night."
        }}))]));
        let dir = tempfile::tempdir().unwrap();
        let merger = SuggestionMerger::new(lm.clone(), dir.path()).unwrap();

        let merged = merger
            .merge(
                &suggestion("Add dark mode", "UNKNOWN"),
                &suggestion("Night theme", "This will reduce eye strain at night."),
            )
            .await
            .unwrap();

        assert_eq!(lm.calls(), 1);
        assert!(!merged.reason.is_empty());
        assert!(merged.reason.starts_with("This will"));
    }

    #[tokio::test]
    async fn test_unknown_reason_is_reported_empty() {
        let lm = Arc::new(ScriptedModel::new([ScriptedModel::answer(json!({"suggestion": {
            "title": "Dark theme for the interface",
            "description": "A dark theme.",
            "reason": "unknown"
        }}))]));
        let dir = tempfile::tempdir().unwrap();
        let merger = SuggestionMerger::new(lm.clone(), dir.path()).unwrap();

        let merged = merger
            .merge(&suggestion("Add dark mode", ""), &suggestion("Night theme", ""))
            .await
            .unwrap();

        assert_eq!(merged.reason, "");
        let prompt = &lm.prompts()[0][1].content;
        assert!(prompt.contains(r#""reason":"UNKNOWN""#));
    }

    #[test]
    fn test_reason_rules() {
        assert!(is_valid_reason("This will help"));
        assert!(is_valid_reason("Unknown"));
        assert!(!is_valid_reason("Because"));
        assert_eq!(normalize_reason("UNKNOWN".into()), "");
        assert_eq!(normalize_reason("This will help".into()), "This will help");
    }
}
