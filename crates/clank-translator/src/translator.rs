//! Feedback translation and the translator use cases.

use std::path::Path;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use clank_core::{tokens, Result, Usage};
use clank_llm::{Checks, LanguageModel, Predictor, Signature};

use crate::detector::LanguageDetector;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateInput {
    pub feedback: String,
    pub from_language: String,
    pub to_language: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct Translation {
    pub translation: String,
}

pub struct TranslateFeedback;

impl Signature for TranslateFeedback {
    const NAME: &'static str = "translator/feedback_translator";
    const INSTRUCTIONS: &'static str = "
Translate the customer's feedback from a language to a language.
Maintain the feedback's:
- Style
- Format (including newlines and tabs)
- Emphasis
- Emojis
- Punctuation
- Names
- Measures
- Units
- Dates (use the translated format)";

    type Input = TranslateInput;
    type Output = Translation;

    fn check(output: &Translation, checks: &mut Checks) {
        checks.require(!output.translation.is_empty(), "Translation cannot be empty!");
    }
}

pub struct FeedbackTranslator {
    predictor: Predictor<TranslateFeedback>,
}

impl FeedbackTranslator {
    pub fn new(lm: Arc<dyn LanguageModel>, artifacts_path: &Path) -> Result<Self> {
        Ok(Self {
            predictor: Predictor::new(lm, artifacts_path)?,
        })
    }

    /// Same-language requests return the feedback untouched.
    pub async fn translate(&self, input: &TranslateInput) -> Result<String> {
        if input.from_language == input.to_language {
            return Ok(input.feedback.clone());
        }

        Ok(self.predictor.predict(input, |_, _| {}).await?.translation)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DetectLanguageParams {
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DetectLanguageResult {
    /// Upper-cased language name, or `UNKNOWN`.
    pub language: String,
    pub usage: Usage,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TranslateFeedbackParams {
    pub feedback: String,
    pub from_language: String,
    pub to_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TranslateFeedbackResult {
    pub translation: String,
    pub usage: Usage,
}

pub struct Translator {
    detector: LanguageDetector,
    translator: FeedbackTranslator,
}

impl Translator {
    pub fn new(lm: Arc<dyn LanguageModel>, artifacts_path: &Path) -> Result<Self> {
        Ok(Self {
            detector: LanguageDetector::new(lm.clone(), artifacts_path)?,
            translator: FeedbackTranslator::new(lm, artifacts_path)?,
        })
    }

    pub fn with_detector(detector: LanguageDetector, translator: FeedbackTranslator) -> Self {
        Self {
            detector,
            translator,
        }
    }

    pub async fn detect_language(
        &self,
        params: &DetectLanguageParams,
    ) -> Result<DetectLanguageResult> {
        let language = self.detector.detect(&params.feedback).await?;
        let usage =
            Usage::estimate::<DetectLanguageResult, _>(params, tokens::count(&language), 1);

        Ok(DetectLanguageResult { language, usage })
    }

    pub async fn translate_feedback(
        &self,
        params: &TranslateFeedbackParams,
    ) -> Result<TranslateFeedbackResult> {
        let translation = self
            .translator
            .translate(&TranslateInput {
                feedback: params.feedback.clone(),
                from_language: params.from_language.clone(),
                to_language: params.to_language.clone(),
            })
            .await?;
        let usage =
            Usage::estimate::<TranslateFeedbackResult, _>(params, tokens::count(&translation), 1);

        Ok(TranslateFeedbackResult { translation, usage })
    }
}
