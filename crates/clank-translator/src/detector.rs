//! Language detection.
//!
//! Emojis are stripped first; empty feedback is English. A statistical
//! detector restricted to six common languages answers when it is confident
//! and clearly ahead of the runner-up. Otherwise the language model decides.

use std::path::Path;
use std::sync::Arc;

use lingua::{Language, LanguageDetectorBuilder};
use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use clank_core::text::strip_emojis;
use clank_core::{Result, UNKNOWN_OPTION};
use clank_llm::{LanguageModel, Predictor, Signature};

use crate::languages::{is_known_language, LANGUAGES};

pub const DEFAULT_LANGUAGE: &str = "ENGLISH";
const MINIMUM_LENGTH: usize = 1;
const MINIMUM_CONFIDENCE: f64 = 0.25;
const MINIMUM_CONFIDENCE_DISTANCE: f64 = MINIMUM_CONFIDENCE / 2.0;

/// Scores how likely each candidate language is.
pub trait StatisticalDetector: Send + Sync {
    /// Upper-cased language names with confidences, most likely first.
    fn confidences(&self, text: &str) -> Vec<(String, f64)>;
}

static LINGUA: Lazy<lingua::LanguageDetector> = Lazy::new(|| {
    LanguageDetectorBuilder::from_languages(&[
        Language::English,
        Language::Spanish,
        Language::French,
        Language::Portuguese,
        Language::German,
        Language::Italian,
    ])
    .with_preloaded_language_models()
    .build()
});

/// `lingua` over English, Spanish, French, Portuguese, German and Italian.
#[derive(Default)]
pub struct LinguaDetector;

impl StatisticalDetector for LinguaDetector {
    fn confidences(&self, text: &str) -> Vec<(String, f64)> {
        LINGUA
            .compute_language_confidence_values(text)
            .into_iter()
            .map(|(language, confidence)| (language.to_string().to_uppercase(), confidence))
            .collect()
    }
}

/// The statistical answer, if it is trustworthy.
fn confident_language(confidences: &[(String, f64)]) -> Option<String> {
    let (language, top) = confidences.first()?;
    let runner_up = confidences.get(1).map_or(0.0, |(_, c)| *c);

    if *top < MINIMUM_CONFIDENCE || top - runner_up < MINIMUM_CONFIDENCE_DISTANCE {
        return None;
    }
    Some(language.clone())
}

#[derive(Debug, Serialize)]
pub struct DetectLanguageInput {
    pub feedback: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DetectedLanguage {
    /// The full name of the valid language that best fits, if any, else
    /// `UNKNOWN`.
    pub language: String,
}

pub struct DetectLanguage;

impl Signature for DetectLanguage {
    const NAME: &'static str = "translator/language_detector";
    const INSTRUCTIONS: &'static str = "
Detect the language from the customer's feedback.
- If the words are common in many languages including English, default to English.
- If there are lexicographic, syntactic, spelling, grammar or any other language mistakes, default to the most probable language.";

    type Input = DetectLanguageInput;
    type Output = DetectedLanguage;
}

pub struct LanguageDetector {
    statistical: Arc<dyn StatisticalDetector>,
    predictor: Predictor<DetectLanguage>,
}

impl LanguageDetector {
    pub fn new(lm: Arc<dyn LanguageModel>, artifacts_path: &Path) -> Result<Self> {
        Self::with_statistical(lm, artifacts_path, Arc::new(LinguaDetector))
    }

    pub fn with_statistical(
        lm: Arc<dyn LanguageModel>,
        artifacts_path: &Path,
        statistical: Arc<dyn StatisticalDetector>,
    ) -> Result<Self> {
        Ok(Self {
            statistical,
            predictor: Predictor::new(lm, artifacts_path)?,
        })
    }

    /// Upper-cased language name, or `UNKNOWN`.
    pub async fn detect(&self, feedback: &str) -> Result<String> {
        let feedback = strip_emojis(feedback);

        if feedback.trim().chars().count() < MINIMUM_LENGTH {
            return Ok(DEFAULT_LANGUAGE.to_string());
        }

        let confidences = self.statistical.confidences(&feedback);
        if let Some(language) = confident_language(&confidences) {
            return Ok(language);
        }

        debug!("Statistical detection inconclusive: {:?}", confidences.get(..2));

        let answer = self
            .predictor
            .predict(&DetectLanguageInput { feedback }, |out, checks| {
                let language = out.language.trim().to_uppercase();
                checks.suggest(
                    is_known_language(&language) || language == UNKNOWN_OPTION,
                    format!(
                        "Language must be the full name of the valid language that best fits, if any, else `{}`! `{}` is NOT a valid language. Valid languages are:\n{}",
                        UNKNOWN_OPTION,
                        language,
                        LANGUAGES.iter().map(|l| format!("- {}\n", l)).collect::<String>()
                    ),
                );
            })
            .await?;

        let language = answer.language.trim().to_uppercase();
        Ok(if is_known_language(&language) {
            language
        } else {
            UNKNOWN_OPTION.to_string()
        })
    }
}
