use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateQuizResponse {
    /// Serialized question set, validated before it is returned.
    pub quiz: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateQuizError {
    pub error: String,
}
