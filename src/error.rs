//! Errors which can occur while OCRing a single item.
//!
//! Application plumbing uses [`anyhow`] like everything else. But the
//! per-item pipeline needs to know exactly what went wrong, so that the caller
//! can decide whether to record the failure in the output or to abort the run.

use std::{error, fmt};

/// Fallback used when the service reports a failure without any messages.
pub const UNKNOWN_OCR_ERROR: &str = "Unknown OCR error";

/// Something went wrong while building, sending or interpreting an OCR
/// request.
#[derive(Debug)]
pub enum OcrError {
    /// The item has no binary payload under the requested property.
    MissingBinary { property: String },

    /// The binary payload exists, but we couldn't get its bytes.
    BinaryData {
        property: String,
        error: anyhow::Error,
    },

    /// The service answered, but reported a failure in the response body.
    Service { messages: Vec<String> },

    /// Network, HTTP status or body decoding failure.
    Transport(anyhow::Error),
}

impl OcrError {
    /// Build a service error from the messages reported by the service.
    pub fn service<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OcrError::Service {
            messages: messages.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for OcrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OcrError::MissingBinary { property } => {
                write!(f, "No binary data found in property: {property}")
            }
            OcrError::BinaryData { property, error } => {
                write!(f, "could not read binary data in property {property}: {error:#}")
            }
            OcrError::Service { messages } => {
                let joined = messages.join(", ");
                if joined.is_empty() {
                    write!(f, "OCR.space API error: {UNKNOWN_OCR_ERROR}")
                } else {
                    write!(f, "OCR.space API error: {joined}")
                }
            }
            // Use the alternate format so the whole cause chain ends up in
            // output records.
            OcrError::Transport(error) => write!(f, "{error:#}"),
        }
    }
}

impl error::Error for OcrError {}

/// An [`OcrError`] tagged with the index of the item that caused it.
///
/// The index is attached once, at the per-item boundary.
#[derive(Debug)]
pub struct ItemError {
    /// The zero-based index of the failing item.
    pub item_index: usize,

    /// What went wrong.
    pub error: OcrError,
}

impl ItemError {
    /// Attach an item index to an error.
    pub fn new(item_index: usize, error: OcrError) -> Self {
        Self { item_index, error }
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item {}: {}", self.item_index, self.error)
    }
}

impl error::Error for ItemError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_joins_messages() {
        let err = OcrError::service(["bad file", "too large"]);
        assert_eq!(err.to_string(), "OCR.space API error: bad file, too large");
    }

    #[test]
    fn service_error_without_messages_uses_fallback() {
        let err = OcrError::service(Vec::<String>::new());
        assert_eq!(err.to_string(), "OCR.space API error: Unknown OCR error");
    }

    #[test]
    fn item_error_mentions_index_once() {
        let err = ItemError::new(
            3,
            OcrError::MissingBinary {
                property: "data".to_owned(),
            },
        );
        let msg = err.to_string();
        assert_eq!(msg, "item 3: No binary data found in property: data");
        assert_eq!(msg.matches("item 3").count(), 1);
    }

    #[test]
    fn transport_error_includes_cause_chain() {
        let err = OcrError::Transport(
            anyhow::anyhow!("connection refused").context("failed to call OCR.space"),
        );
        assert_eq!(err.to_string(), "failed to call OCR.space: connection refused");
    }
}
