//! Heuristic token usage reported alongside every operation.
//!
//! These figures are estimates, not measurements: the prompt side is the
//! token count of the result schema plus the request, padded for the fixed
//! instructions; the completion side is the answer padded for the reasoning.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tokens;

/// Fixed allowance for system prompt, instructions and demos per call.
pub const PROMPT_OVERHEAD: u64 = 1500;
/// Fixed allowance for the reasoning that precedes each answer.
pub const COMPLETION_OVERHEAD: u64 = 100;

/// Estimated token cost of an operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Usage {
    pub input: u64,
    pub output: u64,
}

impl Usage {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Embeddings have no generative output.
    pub fn for_embedding(text: &str) -> Self {
        Self {
            input: tokens::count(text),
            output: 0,
        }
    }

    /// Estimate the cost of `calls` model calls answering `params` with a
    /// result shaped like `R`.
    pub fn estimate<R, P>(params: &P, response_tokens: u64, calls: u64) -> Self
    where
        R: JsonSchema,
        P: Serialize,
    {
        if calls == 0 {
            return Self::zero();
        }

        let schema = serde_json::to_string(&schemars::schema_for!(R)).unwrap_or_default();
        let request = serde_json::to_string(params).unwrap_or_default();
        let prompt_tokens = tokens::count(&(schema + &request));

        Self {
            input: (prompt_tokens + PROMPT_OVERHEAD) * calls,
            output: (response_tokens + COMPLETION_OVERHEAD) * calls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, JsonSchema)]
    struct Answer {
        option: i64,
    }

    #[derive(Serialize)]
    struct Params {
        text: String,
    }

    #[test]
    fn test_zero_calls_is_zero() {
        let params = Params { text: "hello".into() };
        assert_eq!(Usage::estimate::<Answer, _>(&params, 10, 0), Usage::zero());
    }

    #[test]
    fn test_estimate_scales_with_calls() {
        let params = Params { text: "App crashes on launch".into() };
        let one = Usage::estimate::<Answer, _>(&params, 1, 1);
        let three = Usage::estimate::<Answer, _>(&params, 1, 3);
        assert!(one.input > PROMPT_OVERHEAD);
        assert_eq!(one.output, 1 + COMPLETION_OVERHEAD);
        assert_eq!(three.input, one.input * 3);
        assert_eq!(three.output, one.output * 3);
    }

    #[test]
    fn test_embedding_has_no_output() {
        let usage = Usage::for_embedding("battery drains fast");
        assert!(usage.input > 0);
        assert_eq!(usage.output, 0);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Usage { input: 3, output: 4 }).unwrap();
        assert_eq!(json, serde_json::json!({"input": 3, "output": 4}));
    }
}
