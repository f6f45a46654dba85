//! Issue extraction: list the stated issues, then classify each one.

use std::path::Path;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use clank_core::vocabulary::{category_options, is_valid_category, resolve_category, Choice};
use clank_core::{Error, Result, Severity};
use clank_llm::{Checks, LanguageModel, Predictor, Signature};

use crate::review::invalid_option;

const MAX_TITLE_CHARS: usize = 100;
const MAX_STEPS: usize = 5;

#[derive(Debug, Serialize)]
pub struct FeedbackInput {
    pub context: String,
    pub feedback: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GeneratedIssue {
    /// 4 to 10 words, which cannot contain the words `issue` (or synonyms),
    /// `customer` (or synonyms) or the product's name.
    #[schemars(length(max = 100))]
    pub title: String,
    /// Long, complete explanation, but without redundant information, using
    /// the feedback's original words. Must focus solely on the issue by
    /// depersonalizing the sentences.
    pub description: String,
    /// Precise steps, but very concise, if any, to be able to reproduce the
    /// issue, else `[]`.
    #[schemars(length(max = 5))]
    pub steps: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GeneratedIssues {
    /// If any, else `[]`.
    pub issues: Vec<GeneratedIssue>,
}

pub struct GenerateIssues;

impl Signature for GenerateIssues {
    const NAME: &'static str = "processor/issue_extractor/issue_generator";
    const INSTRUCTIONS: &'static str = "
List valid issues, that a customer has with a product (context is provided), from the customer's feedback.
- Issues that the customer did not explicitly state are invalid issues.
- If the customer is uncertain of an issue it is an invalid issue.
- Issues without steps to reproduce them are still valid issues.
- Suggestions, reviews, opinions or preferences are invalid issues.
- Lexicographic, syntactic, spelling, grammar or any other language mistakes of the feedback's text are invalid issues.
- Again, an issue cannot be supposed to be valid if the customer did not explicitly state it.";

    type Input = FeedbackInput;
    type Output = GeneratedIssues;

    fn check(output: &GeneratedIssues, checks: &mut Checks) {
        for issue in &output.issues {
            checks.require(
                issue.title.chars().count() <= MAX_TITLE_CHARS,
                format!(
                    "The title `{}` cannot be longer than {} characters!",
                    issue.title, MAX_TITLE_CHARS
                ),
            );
            checks.require(
                issue.steps.len() <= MAX_STEPS,
                format!(
                    "The issue `{}` cannot have more than {} steps to reproduce ({})!",
                    issue.title,
                    MAX_STEPS,
                    issue.steps.len()
                ),
            );
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IssueInfoInput {
    pub context: String,
    pub feedback: String,
    pub issue: String,
    pub severities: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct IssueInfo {
    /// The valid option that best fits.
    pub severity: String,
    /// The valid option that best fits, if any, else `UNKNOWN`.
    pub category: String,
}

pub struct InferIssueInfo;

impl Signature for InferIssueInfo {
    const NAME: &'static str = "processor/issue_extractor/info_inferrer";
    const INSTRUCTIONS: &'static str = "
Infer the following information from an issue that an LLM extracted from the feedback of a customer.
- Discern the severity, valid options (`severities`) are provided.
- Discern the category, valid options (`categories`) are provided.";

    type Input = IssueInfoInput;
    type Output = IssueInfo;

    fn check(output: &IssueInfo, checks: &mut Checks) {
        checks.require(
            Severity::parse(&output.severity).is_some(),
            invalid_option(
                "Severity",
                "the valid option that best fits",
                &output.severity,
                &Severity::bullet_list(),
            ),
        );
    }
}

/// An extracted issue with its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedIssue {
    pub title: String,
    pub description: String,
    pub steps: Vec<String>,
    pub severity: Severity,
    pub category: String,
}

pub struct IssueExtractor {
    generate: Predictor<GenerateIssues>,
    infer: Predictor<InferIssueInfo>,
}

impl IssueExtractor {
    pub fn new(lm: Arc<dyn LanguageModel>, artifacts_path: &Path) -> Result<Self> {
        Ok(Self {
            generate: Predictor::new(lm.clone(), artifacts_path)?,
            infer: Predictor::new(lm, artifacts_path)?,
        })
    }

    pub async fn extract(
        &self,
        context: &str,
        categories: &[String],
        feedback: &str,
    ) -> Result<Vec<ExtractedIssue>> {
        let generated = self
            .generate
            .predict(
                &FeedbackInput {
                    context: context.to_string(),
                    feedback: feedback.to_string(),
                },
                |_, _| {},
            )
            .await?
            .issues;

        debug!("Generated {} issues", generated.len());

        let mut issues = Vec::with_capacity(generated.len());
        for issue in generated {
            let input = IssueInfoInput {
                context: context.to_string(),
                feedback: feedback.to_string(),
                issue: issue.description.clone(),
                severities: Severity::display_options(),
                categories: category_options(categories),
            };

            let info = self
                .infer
                .predict(&input, |out, checks| {
                    if !categories.is_empty() {
                        checks.suggest(
                            is_valid_category(&out.category, categories),
                            invalid_option(
                                "Category",
                                "the valid option that best fits, if any, else `UNKNOWN`",
                                &out.category,
                                &bullets(categories),
                            ),
                        );
                    }
                })
                .await?;

            let severity = Severity::parse(&info.severity).ok_or_else(|| Error::Validation {
                signature: InferIssueInfo::NAME.to_string(),
                reason: format!("`{}` is not a valid severity", info.severity),
            })?;

            issues.push(ExtractedIssue {
                title: issue.title,
                description: issue.description,
                steps: issue.steps,
                severity,
                category: resolve_category(&info.category, categories),
            });
        }

        Ok(issues)
    }
}

pub(crate) fn bullets(options: &[String]) -> String {
    options.iter().map(|o| format!("- {}\n", o)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clank_core::UNKNOWN_OPTION;
    use clank_llm::ScriptedModel;
    use serde_json::json;

    fn categories(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn extractor(lm: Arc<ScriptedModel>) -> IssueExtractor {
        let dir = tempfile::tempdir().unwrap();
        IssueExtractor::new(lm, dir.path()).unwrap()
    }

    #[tokio::test]
    async fn test_two_stage_extraction() {
        let lm = Arc::new(ScriptedModel::new([
            ScriptedModel::answer(json!({"issues": [{
                "title": "Crash right after opening",
                "description": "The app closes right after opening it.",
                "steps": ["Open the app"]
            }]})),
            ScriptedModel::answer(json!({"severity": "critical", "category": "stability"})),
        ]));

        let issues = extractor(lm.clone())
            .extract(
                "A note-taking app",
                &categories(&["STABILITY", "DESIGN"]),
                "It crashes every time I open it!",
            )
            .await
            .unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Critical);
        assert_eq!(issues[0].category, "STABILITY");
        assert_eq!(lm.calls(), 2);

        let infer_prompt = &lm.prompts()[1][1].content;
        assert!(infer_prompt.contains(r#""severities":["CRITICAL","HIGH","MEDIUM","LOW"]"#));
        assert!(infer_prompt.contains(r#""categories":["STABILITY","DESIGN","UNKNOWN"]"#));
    }

    #[tokio::test]
    async fn test_invalid_severity_is_retried() {
        let lm = Arc::new(ScriptedModel::new([
            ScriptedModel::answer(json!({"issues": [{
                "title": "Slow sync", "description": "Sync takes minutes.", "steps": []
            }]})),
            ScriptedModel::answer(json!({"severity": "annoying", "category": "UNKNOWN"})),
            ScriptedModel::answer(json!({"severity": "medium", "category": "UNKNOWN"})),
        ]));

        let issues = extractor(lm.clone())
            .extract("A sync tool", &[], "Sync is slow.")
            .await
            .unwrap();

        assert_eq!(issues[0].severity, Severity::Medium);
        assert_eq!(lm.calls(), 3);
        let feedback = &lm.prompts()[2][3].content;
        assert!(feedback.contains("`annoying` is NOT a valid option"));
    }

    #[tokio::test]
    async fn test_category_is_never_invented() {
        let lm = Arc::new(ScriptedModel::new([
            ScriptedModel::answer(json!({"issues": [{
                "title": "Slow sync", "description": "Sync takes minutes.", "steps": []
            }]})),
            ScriptedModel::answer(json!({"severity": "LOW", "category": "PERFORMANCE"})),
        ]));

        let issues = extractor(lm.clone())
            .extract("A sync tool", &[], "Sync is slow.")
            .await
            .unwrap();

        assert_eq!(issues[0].category, UNKNOWN_OPTION);
        assert_eq!(lm.calls(), 2);
    }

    #[tokio::test]
    async fn test_no_issues_means_single_call() {
        let lm = Arc::new(ScriptedModel::new([ScriptedModel::answer(json!({"issues": []}))]));
        let issues = extractor(lm.clone())
            .extract("A game", &[], "Love it!")
            .await
            .unwrap();

        assert!(issues.is_empty());
        assert_eq!(lm.calls(), 1);
    }
}
