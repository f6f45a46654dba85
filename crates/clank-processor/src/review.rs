//! Review extraction: keywords, sentiment, emotions, intention and category
//! inferred in a single call.

use std::path::Path;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use clank_core::text::contains_emoji;
use clank_core::vocabulary::{
    category_options, display_option, is_valid_category, normalize_option, resolve_category,
    Choice,
};
use clank_core::{Emotion, Error, Intention, Result, Sentiment, UNKNOWN_OPTION};
use clank_llm::{Checks, LanguageModel, Predictor, Signature};

use crate::issues::bullets;

const MAX_KEYWORDS: usize = 10;
const MAX_KEYWORD_WORDS: usize = 3;
const MAX_EMOTIONS: usize = 4;

/// Violation message for an answer outside its option list.
pub(crate) fn invalid_option(field: &str, description: &str, value: &str, options: &str) -> String {
    format!(
        "{} must be {}! `{}` is NOT a valid option. Valid options are:\n{}",
        field, description, value, options
    )
}

#[derive(Debug, Serialize)]
pub struct ReviewInfoInput {
    pub context: String,
    pub feedback: String,
    pub sentiments: Vec<String>,
    pub emotions: Vec<String>,
    pub intentions: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReviewInfo {
    /// If any, else `[]`.
    #[schemars(length(max = 10))]
    pub keywords: Vec<String>,
    /// The valid option that best fits.
    pub sentiment: String,
    /// The valid options that best fit, if any, else `[]`.
    #[schemars(length(max = 4))]
    pub emotions: Vec<String>,
    /// The valid option that best fits, if any, else `UNKNOWN`.
    pub intention: String,
    /// The valid option that best fits, if any, else `UNKNOWN`.
    pub category: String,
}

pub struct InferReviewInfo;

impl Signature for InferReviewInfo {
    const NAME: &'static str = "processor/review_extractor";
    const INSTRUCTIONS: &'static str = "
Infer the following information from the customer's feedback of a product (context is provided).
- List the most important keywords, following the following rules:
    - Limit each keyword to 3 words maximum.
    - Only include keywords the customer explicitly stated.
    - Do not include emojis in the keywords.
    - Do not include the name of the product in the keywords.
- Discern the sentiment, valid options (`sentiments`) are provided.
- Discern the emotions, valid options (`emotions`) are provided.
- Discern the intention, valid options (`intentions`) are provided, following the following rules:
    - To `retain` means to have the intention to buy again, renew and/or recommend the product.
    - To `churn` means to have the intention to return, refund, cancel and/or discourage the product. Critical issues also cause customer churn.
    - To `recommend` cannot be assumed if the customer did not explicitly state it (except if synonyms were used).
    - To `discourage` is very likely if the customer has the intention to churn.
- Discern the category, valid options (`categories`) are provided.";

    type Input = ReviewInfoInput;
    type Output = ReviewInfo;

    fn check(output: &ReviewInfo, checks: &mut Checks) {
        checks.require(
            output.keywords.len() <= MAX_KEYWORDS,
            format!(
                "There cannot be more than {} keywords ({})!",
                MAX_KEYWORDS,
                output.keywords.len()
            ),
        );

        let long: Vec<&String> = output
            .keywords
            .iter()
            .filter(|k| k.split_whitespace().count() > MAX_KEYWORD_WORDS)
            .collect();
        checks.suggest(
            long.is_empty(),
            format!(
                "Each keyword must be {} words maximum! Keywords too long:\n{}",
                MAX_KEYWORD_WORDS,
                long.iter().map(|k| format!("- {}\n", k)).collect::<String>()
            ),
        );

        let emojis: Vec<&String> = output.keywords.iter().filter(|k| contains_emoji(k)).collect();
        checks.suggest(
            emojis.is_empty(),
            format!(
                "Keywords cannot include emojis! Keywords with emojis:\n{}",
                emojis.iter().map(|k| format!("- {}\n", k)).collect::<String>()
            ),
        );

        checks.require(
            Sentiment::parse(&output.sentiment).is_some(),
            invalid_option(
                "Sentiment",
                "the valid option that best fits",
                &output.sentiment,
                &Sentiment::bullet_list(),
            ),
        );

        checks.require(
            output.emotions.len() <= MAX_EMOTIONS,
            format!(
                "There cannot be more than {} emotions ({})!",
                MAX_EMOTIONS,
                output.emotions.len()
            ),
        );

        let invalid: Vec<&String> = output
            .emotions
            .iter()
            .filter(|e| Emotion::parse(e).is_none())
            .collect();
        checks.require(
            invalid.is_empty(),
            format!(
                "Emotions must be the valid options that best fit, if any, else `[]`! Invalid options:\n{}Valid options are:\n{}",
                invalid.iter().map(|e| format!("- {}\n", e)).collect::<String>(),
                Emotion::bullet_list()
            ),
        );

        let intention = normalize_option(&output.intention);
        checks.suggest(
            Intention::parse(&intention).is_some() || intention == UNKNOWN_OPTION,
            invalid_option(
                "Intention",
                "the valid option that best fits, if any, else `UNKNOWN`",
                &output.intention,
                &Intention::bullet_list(),
            ),
        );
    }
}

/// What a piece of feedback says about the product overall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Review {
    /// The feedback itself.
    pub content: String,
    pub keywords: Vec<String>,
    pub sentiment: Sentiment,
    pub emotions: Vec<Emotion>,
    /// An `Intention` or `UNKNOWN`.
    pub intention: String,
    pub category: String,
}

pub struct ReviewExtractor {
    infer: Predictor<InferReviewInfo>,
}

impl ReviewExtractor {
    pub fn new(lm: Arc<dyn LanguageModel>, artifacts_path: &Path) -> Result<Self> {
        Ok(Self {
            infer: Predictor::new(lm, artifacts_path)?,
        })
    }

    pub async fn extract(
        &self,
        context: &str,
        categories: &[String],
        feedback: &str,
    ) -> Result<Review> {
        let input = ReviewInfoInput {
            context: context.to_string(),
            feedback: feedback.to_string(),
            sentiments: Sentiment::display_options(),
            emotions: Emotion::display_options(),
            intentions: Intention::ALL
                .iter()
                .map(|i| display_option(i.as_str()))
                .chain([UNKNOWN_OPTION.to_string()])
                .collect(),
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

        let sentiment = Sentiment::parse(&info.sentiment).ok_or_else(|| Error::Validation {
            signature: InferReviewInfo::NAME.to_string(),
            reason: format!("`{}` is not a valid sentiment", info.sentiment),
        })?;

        let mut emotions: Vec<Emotion> = Vec::new();
        for emotion in info.emotions.iter().filter_map(|e| Emotion::parse(e)) {
            if !emotions.contains(&emotion) {
                emotions.push(emotion);
            }
        }

        let intention = Intention::parse(&info.intention)
            .map(|i| i.as_str().to_string())
            .unwrap_or_else(|| UNKNOWN_OPTION.to_string());

        Ok(Review {
            content: feedback.to_string(),
            keywords: clean_keywords(&info.keywords),
            sentiment,
            emotions,
            intention,
            category: resolve_category(&info.category, categories),
        })
    }
}

/// Lower-case, drop empty, long and emoji keywords, deduplicate in order.
fn clean_keywords(keywords: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for keyword in keywords {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty()
            || keyword.split_whitespace().count() > MAX_KEYWORD_WORDS
            || contains_emoji(&keyword)
            || cleaned.contains(&keyword)
        {
            continue;
        }
        cleaned.push(keyword);
    }
    cleaned
}
