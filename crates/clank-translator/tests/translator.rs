//! Translator use cases with a scripted model.

use std::sync::Arc;

use serde_json::json;

use clank_core::{tokens, Error, Usage};
use clank_llm::ScriptedModel;
use clank_translator::{
    DetectLanguageParams, DetectLanguageResult, FeedbackTranslator, LanguageDetector,
    StatisticalDetector, TranslateFeedbackParams, Translator,
};

struct Unsure;

impl StatisticalDetector for Unsure {
    fn confidences(&self, _text: &str) -> Vec<(String, f64)> {
        vec![("ENGLISH".into(), 0.2), ("SPANISH".into(), 0.2)]
    }
}

fn translator(lm: Arc<ScriptedModel>, dir: &tempfile::TempDir) -> Translator {
    Translator::with_detector(
        LanguageDetector::with_statistical(lm.clone(), dir.path(), Arc::new(Unsure)).unwrap(),
        FeedbackTranslator::new(lm, dir.path()).unwrap(),
    )
}

#[tokio::test]
async fn test_same_language_is_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let lm = Arc::new(ScriptedModel::silent());
    let translator = translator(lm.clone(), &dir);

    let result = translator
        .translate_feedback(&TranslateFeedbackParams {
            feedback: "Great app!\n\tLove it 😍".into(),
            from_language: "ENGLISH".into(),
            to_language: "ENGLISH".into(),
        })
        .await
        .unwrap();

    assert_eq!(result.translation, "Great app!\n\tLove it 😍");
    assert_eq!(lm.calls(), 0);
}

#[tokio::test]
async fn test_translates_with_model() {
    let dir = tempfile::tempdir().unwrap();
    let lm = Arc::new(ScriptedModel::new([ScriptedModel::answer(
        json!({"translation": "¡Gran aplicación! 😍"}),
    )]));
    let translator = translator(lm.clone(), &dir);

    let result = translator
        .translate_feedback(&TranslateFeedbackParams {
            feedback: "Great app! 😍".into(),
            from_language: "ENGLISH".into(),
            to_language: "SPANISH".into(),
        })
        .await
        .unwrap();

    assert_eq!(result.translation, "¡Gran aplicación! 😍");
    assert_eq!(lm.calls(), 1);
    assert_eq!(result.usage.output, tokens::count("¡Gran aplicación! 😍") + 100);
}

#[tokio::test]
async fn test_empty_translation_fails() {
    let dir = tempfile::tempdir().unwrap();
    let lm = Arc::new(ScriptedModel::new(vec![
        ScriptedModel::answer(json!({"translation": ""}));
        4
    ]));
    let translator = translator(lm.clone(), &dir);

    let err = translator
        .translate_feedback(&TranslateFeedbackParams {
            feedback: "Great app!".into(),
            from_language: "ENGLISH".into(),
            to_language: "GERMAN".into(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation { .. }));
}

#[tokio::test]
async fn test_detect_language_usage() {
    let dir = tempfile::tempdir().unwrap();
    let lm = Arc::new(ScriptedModel::new([ScriptedModel::answer(
        json!({"language": "english"}),
    )]));
    let translator = translator(lm.clone(), &dir);
    let params = DetectLanguageParams {
        feedback: "ok".into(),
    };

    let result = translator.detect_language(&params).await.unwrap();

    assert_eq!(result.language, "ENGLISH");
    assert_eq!(
        result.usage,
        Usage::estimate::<DetectLanguageResult, _>(&params, tokens::count("ENGLISH"), 1)
    );
}
