//! Issue and suggestion shapes shared by the aggregator operations.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A problem a customer has with the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Issue {
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

/// An improvement a customer proposes for the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Suggestion {
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
