use serde::{Deserialize, Serialize};
use validator::Validate;

/// Options the learner picks for a fresh question set. Values are passed
/// to the generator verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RegenerationCriteria {
    #[validate(length(max = 64))]
    pub difficulty: String,
    #[validate(length(max = 64))]
    pub taxonomy: String,
    #[validate(length(max = 64))]
    pub format: String,
}

/// Everything the question generator needs to produce a new set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GenerationRequest {
    #[validate(length(min = 1, message = "extracted_text must not be empty"))]
    pub extracted_text: String,
    #[serde(default)]
    pub previous_questions: Vec<String>,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub taxonomy: String,
    #[serde(default)]
    pub format: String,
}

impl GenerationRequest {
    pub fn new(
        extracted_text: String,
        previous_questions: Vec<String>,
        criteria: RegenerationCriteria,
    ) -> Self {
        Self {
            extracted_text,
            previous_questions,
            difficulty: criteria.difficulty,
            taxonomy: criteria.taxonomy,
            format: criteria.format,
        }
    }
}
