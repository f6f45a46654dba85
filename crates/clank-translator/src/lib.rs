//! Clank Translator: detects the language of customer feedback and
//! translates it.
//!
//! Detection is statistical first (a handful of common languages); short or
//! ambiguous texts fall back to the language model.

pub mod detector;
pub mod languages;
pub mod translator;

pub use detector::{LanguageDetector, LinguaDetector, StatisticalDetector, DEFAULT_LANGUAGE};
pub use translator::{
    DetectLanguageParams, DetectLanguageResult, FeedbackTranslator, TranslateFeedbackParams,
    TranslateFeedbackResult, Translator,
};
