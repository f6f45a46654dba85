//! Validate-then-retry prediction.
//!
//! A `Predictor` renders a signature's prompt, asks the model, parses the
//! answer and runs the checks. Violations are fed back to the model and the
//! call is retried. Hard violations (`require`) that survive every retry fail
//! the call; soft ones (`suggest`) are logged and the last answer is kept.

use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use clank_core::{Error, Result};

use crate::artifacts::{load_demos, Demo};
use crate::signature::{parse_answer, render_prompt, Signature};
use crate::types::{ChatMessage, LanguageModel, SYSTEM_PROMPT};

pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Violations recorded while checking one answer.
#[derive(Debug, Default)]
pub struct Checks {
    hard: Vec<String>,
    soft: Vec<String>,
}

impl Checks {
    /// Record a hard violation when `condition` is false.
    pub fn require(&mut self, condition: bool, message: impl Into<String>) {
        if !condition {
            self.hard.push(message.into());
        }
    }

    /// Record a soft violation when `condition` is false.
    pub fn suggest(&mut self, condition: bool, message: impl Into<String>) {
        if !condition {
            self.soft.push(message.into());
        }
    }

    pub fn is_clean(&self) -> bool {
        self.hard.is_empty() && self.soft.is_empty()
    }

    pub fn has_hard(&self) -> bool {
        !self.hard.is_empty()
    }

    fn messages(&self) -> impl Iterator<Item = &String> {
        self.hard.iter().chain(self.soft.iter())
    }

    fn feedback(&self) -> String {
        let mut feedback = String::from(
            "Your previous answer is not acceptable. Fix the following and answer again with a single JSON object:\n",
        );
        for message in self.messages() {
            feedback.push_str(&format!("- {}\n", message.trim_end()));
        }
        feedback
    }

    fn summary(&self) -> String {
        self.messages()
            .map(|m| m.trim_end().to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Runs one signature against a language model.
pub struct Predictor<S: Signature> {
    lm: Arc<dyn LanguageModel>,
    demos: Vec<Demo>,
    max_retries: usize,
    _signature: PhantomData<fn() -> S>,
}

impl<S: Signature> Predictor<S> {
    /// Create a predictor with the demos compiled for `S`, if any.
    pub fn new(lm: Arc<dyn LanguageModel>, artifacts_path: &Path) -> Result<Self> {
        let demos = load_demos(artifacts_path, S::NAME, S::VERSION)?;
        Ok(Self::with_demos(lm, demos))
    }

    pub fn with_demos(lm: Arc<dyn LanguageModel>, demos: Vec<Demo>) -> Self {
        Self {
            lm,
            demos,
            max_retries: DEFAULT_MAX_RETRIES,
            _signature: PhantomData,
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn demos(&self) -> &[Demo] {
        &self.demos
    }

    /// Ask the model, retrying with feedback until the answer passes both
    /// the signature's checks and `check`.
    pub async fn predict<F>(&self, input: &S::Input, check: F) -> Result<S::Output>
    where
        F: Fn(&S::Output, &mut Checks),
    {
        let prompt = render_prompt::<S>(&self.demos, input)?;
        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];

        let mut attempt = 0;
        loop {
            debug!("Predicting {} (attempt {})", S::NAME, attempt + 1);
            let completion = self.lm.complete(&messages).await?;

            let mut checks = Checks::default();
            let output = match parse_answer::<S::Output>(&completion.content) {
                Ok(output) => {
                    S::check(&output, &mut checks);
                    check(&output, &mut checks);
                    Some(output)
                }
                Err(reason) => {
                    checks.require(false, reason);
                    None
                }
            };

            if checks.is_clean() {
                if let Some(output) = output {
                    return Ok(output);
                }
            }

            if attempt >= self.max_retries {
                return match output {
                    Some(output) if !checks.has_hard() => {
                        warn!(
                            "{} accepted with unresolved suggestions: {}",
                            S::NAME,
                            checks.summary()
                        );
                        Ok(output)
                    }
                    _ => Err(Error::Validation {
                        signature: S::NAME.to_string(),
                        reason: checks.summary(),
                    }),
                };
            }

            debug!("{} answer rejected: {}", S::NAME, checks.summary());
            messages.push(ChatMessage::assistant(completion.content));
            messages.push(ChatMessage::user(checks.feedback()));
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Serialize)]
    struct CountInput {
        text: String,
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    struct CountOutput {
        words: Vec<String>,
    }

    struct ListWords;

    impl Signature for ListWords {
        const NAME: &'static str = "test/list_words";
        const INSTRUCTIONS: &'static str = "List the words of the text.";
        type Input = CountInput;
        type Output = CountOutput;

        fn check(output: &CountOutput, checks: &mut Checks) {
            checks.require(output.words.len() <= 3, "At most 3 words!");
        }
    }

    fn input() -> CountInput {
        CountInput {
            text: "one two".into(),
        }
    }

    fn answer(words: &[&str]) -> String {
        ScriptedModel::answer(json!({ "words": words }))
    }

    #[tokio::test]
    async fn test_first_answer_accepted() {
        let lm = Arc::new(ScriptedModel::new([answer(&["one", "two"])]));
        let predictor = Predictor::<ListWords>::with_demos(lm.clone(), Vec::new());

        let output = predictor.predict(&input(), |_, _| {}).await.unwrap();
        assert_eq!(output.words, vec!["one", "two"]);
        assert_eq!(lm.calls(), 1);

        let prompts = lm.prompts();
        assert_eq!(prompts[0][0].content, SYSTEM_PROMPT);
        assert!(prompts[0][1].content.contains("List the words of the text."));
    }

    #[tokio::test]
    async fn test_retries_with_feedback() {
        let lm = Arc::new(ScriptedModel::new([
            "not json at all".to_string(),
            answer(&["a", "b", "c", "d"]),
            answer(&["one", "two"]),
        ]));
        let predictor = Predictor::<ListWords>::with_demos(lm.clone(), Vec::new());

        let output = predictor.predict(&input(), |_, _| {}).await.unwrap();
        assert_eq!(output.words.len(), 2);
        assert_eq!(lm.calls(), 3);

        let last = lm.prompts().pop().unwrap();
        assert_eq!(last.len(), 6);
        assert!(last[5].content.contains("At most 3 words!"));
    }

    #[tokio::test]
    async fn test_hard_violation_exhausts_retries() {
        let lm = Arc::new(ScriptedModel::new(vec![answer(&["a", "b", "c", "d"]); 4]));
        let predictor = Predictor::<ListWords>::with_demos(lm.clone(), Vec::new());

        let err = predictor.predict(&input(), |_, _| {}).await.unwrap_err();
        match err {
            Error::Validation { signature, reason } => {
                assert_eq!(signature, "test/list_words");
                assert!(reason.contains("At most 3 words!"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(lm.calls(), 1 + DEFAULT_MAX_RETRIES);
    }

    #[tokio::test]
    async fn test_soft_violation_accepts_last_answer() {
        let lm = Arc::new(ScriptedModel::new([answer(&["x"]), answer(&["y"])]));
        let predictor =
            Predictor::<ListWords>::with_demos(lm.clone(), Vec::new()).with_max_retries(1);

        let output = predictor
            .predict(&input(), |out, checks| {
                checks.suggest(out.words.contains(&"one".to_string()), "Use the text's words.")
            })
            .await
            .unwrap();
        assert_eq!(output.words, vec!["y"]);
        assert_eq!(lm.calls(), 2);
    }

    #[tokio::test]
    async fn test_loads_demos_from_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("test")).unwrap();
        std::fs::write(
            dir.path().join("test/list_words.json"),
            r#"{"version": 1, "demos": [{"input": {"text": "hi you"}, "output": {"words": ["hi", "you"]}}]}"#,
        )
        .unwrap();

        let lm = Arc::new(ScriptedModel::new([answer(&["one"])]));
        let predictor = Predictor::<ListWords>::new(lm.clone(), dir.path()).unwrap();
        assert_eq!(predictor.demos().len(), 1);

        predictor.predict(&input(), |_, _| {}).await.unwrap();
        assert!(lm.prompts()[0][1].content.contains(r#"{"text":"hi you"}"#));
    }
}
