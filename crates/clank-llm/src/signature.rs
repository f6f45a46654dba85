//! Static, versioned prompt signatures.
//!
//! A signature names one task the model performs: its instructions, the
//! JSON it receives and the JSON it must answer with. The user prompt is
//! rendered from `PROMPT_TEMPLATE`; the model answers with
//! `{"reasoning": "...", "output": ...}`, reasoning first.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use clank_core::Result;

use crate::artifacts::Demo;
use crate::predictor::Checks;

pub const PROMPT_TEMPLATE: &str = "{instructions}

---

Follow the following format.

Input: the task input, as a JSON object.
Answer: a single JSON object {\"reasoning\": ..., \"output\": ...} where `reasoning` thinks step by step in order to produce the output, and `output` matches this JSON schema:
{schema}

---

{demos}Input: {input}
Answer:";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(instructions|demos|schema|input)\}").expect("valid regex"));

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("valid regex"));

/// A task the model can be asked to perform.
pub trait Signature: Send + Sync + 'static {
    /// Unique name, also the artifact path relative to the artifacts root.
    const NAME: &'static str;
    /// Bumped whenever instructions or shapes change, invalidating artifacts.
    const VERSION: u32 = 1;
    const INSTRUCTIONS: &'static str;

    type Input: Serialize + Send + Sync;
    type Output: DeserializeOwned + JsonSchema + Send;

    /// Structural checks every answer must pass, before per-call checks.
    fn check(_output: &Self::Output, _checks: &mut Checks) {}
}

/// Render the user prompt for `input`.
///
/// Placeholders are substituted in a single pass, so braces inside the
/// substituted text are never interpreted.
pub fn render_prompt<S: Signature>(demos: &[Demo], input: &S::Input) -> Result<String> {
    let schema = serde_json::to_string_pretty(&schemars::schema_for!(S::Output))?;
    let input = serde_json::to_string(input)?;
    let demos = render_demos(demos)?;

    Ok(PLACEHOLDER
        .replace_all(PROMPT_TEMPLATE, |caps: &Captures| match &caps[1] {
            "instructions" => S::INSTRUCTIONS.trim().to_string(),
            "demos" => demos.clone(),
            "schema" => schema.clone(),
            _ => input.clone(),
        })
        .into_owned())
}

fn render_demos(demos: &[Demo]) -> Result<String> {
    let mut rendered = String::new();
    for demo in demos {
        let answer = json!({
            "reasoning": demo.reasoning.clone().unwrap_or_default(),
            "output": demo.output,
        });
        rendered.push_str(&format!(
            "Input: {}\nAnswer: {}\n\n---\n\n",
            serde_json::to_string(&demo.input)?,
            serde_json::to_string(&answer)?
        ));
    }
    Ok(rendered)
}

/// Extract and deserialize the `output` of a model answer.
///
/// Tolerates code fences and prose around the JSON object. An object
/// without an `output` key is taken as the output itself.
pub fn parse_answer<T: DeserializeOwned>(content: &str) -> std::result::Result<T, String> {
    let text = CODE_FENCE
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(content);

    let start = text
        .find('{')
        .ok_or_else(|| "The answer must be a JSON object, none was found!".to_string())?;
    let end = text
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| "The answer's JSON object is not closed!".to_string())?;

    let value: Value = serde_json::from_str(&text[start..=end])
        .map_err(|e| format!("The answer is not valid JSON: {}", e))?;

    let output = match value {
        Value::Object(mut map) if map.contains_key("output") => {
            map.remove("output").unwrap_or(Value::Null)
        }
        other => other,
    };

    serde_json::from_value(output)
        .map_err(|e| format!("The answer's `output` does not match the schema: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize)]
    struct EchoInput {
        text: String,
    }

    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    struct EchoOutput {
        text: String,
    }

    struct Echo;

    impl Signature for Echo {
        const NAME: &'static str = "test/echo";
        const INSTRUCTIONS: &'static str = "\nRepeat the {input} text.\n";
        type Input = EchoInput;
        type Output = EchoOutput;
    }

    #[test]
    fn test_render_prompt() {
        let input = EchoInput {
            text: "braces {schema} stay".into(),
        };
        let prompt = render_prompt::<Echo>(&[], &input).unwrap();

        assert!(prompt.starts_with("Repeat the {input} text."));
        assert!(prompt.contains(r#"Input: {"text":"braces {schema} stay"}"#));
        assert!(prompt.contains("\"text\""));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_render_demos() {
        let demos = vec![Demo {
            input: json!({"text": "hi"}),
            reasoning: Some("Echo it.".into()),
            output: json!({"text": "hi"}),
        }];
        let prompt = render_prompt::<Echo>(&demos, &EchoInput { text: "yo".into() }).unwrap();
        assert!(prompt.contains(r#"Answer: {"output":{"text":"hi"},"reasoning":"Echo it."}"#));
    }

    #[test]
    fn test_parse_answer_plain() {
        let out: EchoOutput =
            parse_answer(r#"{"reasoning": "easy", "output": {"text": "ok"}}"#).unwrap();
        assert_eq!(out.text, "ok");
    }

    #[test]
    fn test_parse_answer_fenced_with_prose() {
        let content = "Sure!\n```json\n{\"reasoning\": \"r\", \"output\": {\"text\": \"x\"}}\n```\nDone.";
        let out: EchoOutput = parse_answer(content).unwrap();
        assert_eq!(out.text, "x");
    }

    #[test]
    fn test_parse_answer_bare_output() {
        let out: EchoOutput = parse_answer(r#"{"text": "bare"}"#).unwrap();
        assert_eq!(out.text, "bare");
    }

    #[test]
    fn test_parse_answer_failures() {
        assert!(parse_answer::<EchoOutput>("no json here").is_err());
        assert!(parse_answer::<EchoOutput>(r#"{"output": {"other": 1}}"#).is_err());
        assert!(parse_answer::<EchoOutput>("{broken").is_err());
    }
}
