use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

const MAX_GRAPHEMES: usize = 256;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct InquirerName(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameError {
    Empty,
    TooLong,
}

impl AsRef<str> for InquirerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl InquirerName {
    /// Trims the input; rejects it if nothing is left or it runs past 256 graphemes.
    pub fn parse(s: &str) -> Result<Self, NameError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(NameError::Empty);
        }
        if trimmed.graphemes(true).count() > MAX_GRAPHEMES {
            return Err(NameError::TooLong);
        }
        Ok(Self(trimmed.to_string()))
    }
}
