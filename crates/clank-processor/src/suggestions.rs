//! Suggestion extraction: list the stated suggestions, then classify each.

use std::path::Path;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use clank_core::vocabulary::{category_options, is_valid_category, resolve_category, Choice};
use clank_core::{Error, Importance, Result, UNKNOWN_OPTION};
use clank_llm::{Checks, LanguageModel, Predictor, Signature};

use crate::issues::{bullets, FeedbackInput};
use crate::review::invalid_option;

const MAX_TITLE_CHARS: usize = 100;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GeneratedSuggestion {
    /// 4 to 10 words, which cannot contain the words `suggestion` (or
    /// synonyms), `customer` (or synonyms) or the product's name.
    #[schemars(length(max = 100))]
    pub title: String,
    /// Long, complete explanation, but without redundant information, using
    /// the feedback's original words. Must focus solely on the suggestion by
    /// depersonalizing the sentences.
    pub description: String,
    /// The customer's motivation behind the proposal of the suggestion, if
    /// any must always start with `This will`, else `UNKNOWN`.
    pub reason: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GeneratedSuggestions {
    /// If any, else `[]`.
    pub suggestions: Vec<GeneratedSuggestion>,
}

pub struct GenerateSuggestions;

impl Signature for GenerateSuggestions {
    const NAME: &'static str = "processor/suggestion_extractor/suggestion_generator";
    const INSTRUCTIONS: &'static str = "
List valid improvement proposals, feature requests and ideas, that a customer has about a product (context is provided), from the customer's feedback.
- Suggestions that the customer did not explicitly state are invalid suggestions.
- If the customer is uncertain of a suggestion it is an invalid suggestion.
- Suggestions without reasons behind the proposals are still valid suggestions.
- Issues, concerns, complaints, reviews, opinions or preferences are invalid suggestions.
- Suggestions that come from an issue are invalid suggestions.
- Lexicographic, syntactic, spelling, grammar or any other language mistakes of the feedback's text are invalid suggestions.
- Again, a suggestion cannot be supposed to be valid if the customer did not explicitly state it.";

    type Input = FeedbackInput;
    type Output = GeneratedSuggestions;

    fn check(output: &GeneratedSuggestions, checks: &mut Checks) {
        for suggestion in &output.suggestions {
            checks.require(
                suggestion.title.chars().count() <= MAX_TITLE_CHARS,
                format!(
                    "The title `{}` cannot be longer than {} characters!",
                    suggestion.title, MAX_TITLE_CHARS
                ),
            );
            checks.suggest(
                is_valid_reason(&suggestion.reason),
                format!(
                    "The reason of `{}` must start with `This will`, else be `{}`!",
                    suggestion.title, UNKNOWN_OPTION
                ),
            );
        }
    }
}

fn is_valid_reason(reason: &str) -> bool {
    reason.trim_start().starts_with("This will") || reason.trim().eq_ignore_ascii_case(UNKNOWN_OPTION)
}

#[derive(Debug, Serialize)]
pub struct SuggestionInfoInput {
    pub context: String,
    pub feedback: String,
    pub suggestion: String,
    pub importances: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SuggestionInfo {
    /// The valid option that best fits.
    pub importance: String,
    /// The valid option that best fits, if any, else `UNKNOWN`.
    pub category: String,
}

pub struct InferSuggestionInfo;

impl Signature for InferSuggestionInfo {
    const NAME: &'static str = "processor/suggestion_extractor/info_inferrer";
    const INSTRUCTIONS: &'static str = "
Infer the following information from a suggestion that an LLM extracted from the feedback of a customer.
- Discern the importance, valid options (`importances`) are provided.
- Discern the category, valid options (`categories`) are provided.";

    type Input = SuggestionInfoInput;
    type Output = SuggestionInfo;

    fn check(output: &SuggestionInfo, checks: &mut Checks) {
        checks.require(
            Importance::parse(&output.importance).is_some(),
            invalid_option(
                "Importance",
                "the valid option that best fits",
                &output.importance,
                &Importance::bullet_list(),
            ),
        );
    }
}

/// An extracted suggestion with its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedSuggestion {
    pub title: String,
    pub description: String,
    /// Empty when the customer gave no motivation.
    pub reason: String,
    pub importance: Importance,
    pub category: String,
}

pub struct SuggestionExtractor {
    generate: Predictor<GenerateSuggestions>,
    infer: Predictor<InferSuggestionInfo>,
}

impl SuggestionExtractor {
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
    ) -> Result<Vec<ExtractedSuggestion>> {
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
            .suggestions;

        debug!("Generated {} suggestions", generated.len());

        let mut suggestions = Vec::with_capacity(generated.len());
        for suggestion in generated {
            let input = SuggestionInfoInput {
                context: context.to_string(),
                feedback: feedback.to_string(),
                suggestion: suggestion.description.clone(),
                importances: Importance::display_options(),
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

            let importance =
                Importance::parse(&info.importance).ok_or_else(|| Error::Validation {
                    signature: InferSuggestionInfo::NAME.to_string(),
                    reason: format!("`{}` is not a valid importance", info.importance),
                })?;

            let reason = if suggestion.reason.trim().eq_ignore_ascii_case(UNKNOWN_OPTION) {
                String::new()
            } else {
                suggestion.reason
            };

            suggestions.push(ExtractedSuggestion {
                title: suggestion.title,
                description: suggestion.description,
                reason,
                importance,
                category: resolve_category(&info.category, categories),
            });
        }

        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clank_llm::ScriptedModel;
    use serde_json::json;

    fn extractor(lm: Arc<ScriptedModel>) -> SuggestionExtractor {
        let dir = tempfile::tempdir().unwrap();
        SuggestionExtractor::new(lm, dir.path()).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_reason_is_reported_empty() {
        let lm = Arc::new(ScriptedModel::new([
            ScriptedModel::answer(json!({"suggestions": [
                {"title": "Dark theme for the editor", "description": "A dark theme.", "reason": "UNKNOWN"},
                {"title": "Export notes to PDF", "description": "PDF export.", "reason": "This will ease sharing."}
            ]})),
            ScriptedModel::answer(json!({"importance": "low", "category": "DESIGN"})),
            ScriptedModel::answer(json!({"importance": "HIGH", "category": "unknown"})),
        ]));

        let suggestions = extractor(lm.clone())
            .extract("A note-taking app", &["DESIGN".to_string()], "Dark mode and PDF export please")
            .await
            .unwrap();

        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].reason, "");
        assert_eq!(suggestions[0].importance, Importance::Low);
        assert_eq!(suggestions[0].category, "DESIGN");
        assert_eq!(suggestions[1].reason, "This will ease sharing.");
        assert_eq!(suggestions[1].category, UNKNOWN_OPTION);
        assert_eq!(lm.calls(), 3);
    }

    #[tokio::test]
    async fn test_invalid_importance_fails_after_retries() {
        let mut replies = vec![ScriptedModel::answer(json!({"suggestions": [
            {"title": "Offline mode for the app", "description": "Work offline.", "reason": "UNKNOWN"}
        ]}))];
        replies.extend(vec![
            ScriptedModel::answer(json!({"importance": "urgent", "category": "UNKNOWN"}));
            4
        ]);
        let lm = Arc::new(ScriptedModel::new(replies));

        let err = extractor(lm.clone())
            .extract("A notes app", &[], "Offline mode")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(lm.calls(), 5);
    }
}
