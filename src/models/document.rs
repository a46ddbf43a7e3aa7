use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Source material the current quiz was generated from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContext {
    pub extracted_text: String,
    pub explanation: String,
    pub audio_file: Option<String>,
}

impl DocumentContext {
    pub fn has_content(&self) -> bool {
        !self.extracted_text.trim().is_empty()
    }

    /// Stable fingerprint of the extracted text, used to notice document changes.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.extracted_text)
    }
}

pub fn fingerprint(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    hex::encode(digest)
}
