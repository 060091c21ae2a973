//! Interpreting `/parse/image` responses.
//!
//! The service reports most failures inside an HTTP 200 response, using its
//! own `OCRExitCode` field. Only an exit code of exactly 1 counts as success.

use schemars::JsonSchema;

use crate::{error::OcrError, prelude::*};

/// Separator placed between the text of consecutive pages.
const PAGE_SEPARATOR: &str = "\n\n";

/// The parts of an OCR.space response we look at. The raw response is kept
/// separately and passed through to the output.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OcrResponse {
    /// 1 on success. Anything else, including a missing value, is a failure.
    #[serde(rename = "OCRExitCode", default)]
    pub exit_code: Option<Value>,

    /// Failure messages, sent either as a list or as a single string.
    #[serde(rename = "ErrorMessage", default)]
    pub error_message: Option<ErrorMessages>,

    /// One result per page.
    #[serde(rename = "ParsedResults", default)]
    pub parsed_results: Option<Vec<ParsedResult>>,

    /// Processing time reported by the service. Usually a numeric string.
    #[serde(rename = "ProcessingTimeInMilliseconds", default)]
    pub processing_time_ms: Option<Value>,
}

impl OcrResponse {
    /// Did the service report success?
    pub fn is_success(&self) -> bool {
        self.exit_code.as_ref().and_then(Value::as_f64) == Some(1.0)
    }

    /// Per-page results, in page order.
    pub fn pages(&self) -> &[ParsedResult] {
        self.parsed_results.as_deref().unwrap_or_default()
    }
}

/// `ErrorMessage` comes in two shapes.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessages {
    List(Vec<String>),
    Single(String),
}

impl ErrorMessages {
    /// Convert into a list of messages.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            ErrorMessages::List(messages) => messages,
            ErrorMessages::Single(message) => vec![message],
        }
    }
}

/// OCR output for a single page.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ParsedResult {
    #[serde(rename = "ParsedText", default)]
    pub parsed_text: Option<String>,

    #[serde(rename = "TextOrientation", default)]
    pub text_orientation: Option<Value>,

    #[serde(rename = "FileParseExitCode", default)]
    pub file_parse_exit_code: Option<Value>,

    /// Only present when an overlay was requested.
    #[serde(rename = "TextOverlay", default)]
    pub text_overlay: Option<TextOverlay>,
}

/// Word and line bounding boxes.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TextOverlay {
    #[serde(rename = "Lines", default)]
    pub lines: Option<Vec<Value>>,
}

/// Metadata surfaced as `ocrResults` in the output record.
///
/// Only the first page's orientation and exit code are reported, however many
/// pages came back.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResults {
    /// The complete, unmodified service response.
    pub full_response: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_in_milliseconds: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_orientation: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_parse_exit_code: Option<Value>,
}

/// The result of a successful OCR request.
#[derive(Clone, Debug, PartialEq)]
pub struct OcrResult {
    /// Text of all pages, joined by blank lines and trimmed.
    pub extracted_text: String,

    /// Response metadata.
    pub ocr_results: OcrResults,

    /// First-page overlay lines, if an overlay was requested and returned.
    pub word_coordinates: Option<Vec<Value>>,
}

/// Interpret a raw response body.
pub fn interpret_response(raw: Value, overlay_required: bool) -> Result<OcrResult, OcrError> {
    let response = serde_json::from_value::<OcrResponse>(raw.clone()).map_err(|err| {
        OcrError::Transport(
            anyhow::Error::new(err).context("failed to parse OCR.space response"),
        )
    })?;
    trace!(?response, "OCR.space response");

    if !response.is_success() {
        let messages = response
            .error_message
            .map(ErrorMessages::into_vec)
            .unwrap_or_default();
        return Err(OcrError::service(messages));
    }

    let pages = response.pages();
    let extracted_text = pages
        .iter()
        .map(|page| page.parsed_text.as_deref().unwrap_or_default())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
        .trim()
        .to_owned();

    let first_page = pages.first();
    let word_coordinates = if overlay_required {
        first_page
            .and_then(|page| page.text_overlay.as_ref())
            .and_then(|overlay| overlay.lines.clone())
    } else {
        None
    };

    Ok(OcrResult {
        extracted_text,
        ocr_results: OcrResults {
            processing_time_in_milliseconds: response.processing_time_ms.clone(),
            text_orientation: first_page.and_then(|page| page.text_orientation.clone()),
            file_parse_exit_code: first_page
                .and_then(|page| page.file_parse_exit_code.clone()),
            full_response: raw,
        },
        word_coordinates,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn two_page_response() -> Value {
        json!({
            "OCRExitCode": 1,
            "IsErroredOnProcessing": false,
            "ProcessingTimeInMilliseconds": "1203",
            "ParsedResults": [
                {
                    "ParsedText": "  First page\r\n",
                    "TextOrientation": "0",
                    "FileParseExitCode": 1,
                    "TextOverlay": {
                        "Lines": [
                            {
                                "LineText": "First",
                                "Words": [{ "WordText": "First", "Left": 10, "Top": 4 }]
                            }
                        ],
                        "HasOverlay": true
                    }
                },
                {
                    "ParsedText": "Second page  ",
                    "TextOrientation": "90",
                    "FileParseExitCode": 2
                }
            ]
        })
    }

    #[test]
    fn joins_pages_with_blank_lines_and_trims() {
        let result = interpret_response(two_page_response(), false).unwrap();
        assert_eq!(result.extracted_text, "First page\r\n\n\nSecond page");
    }

    #[test]
    fn surfaces_first_page_metadata_only() {
        let raw = two_page_response();
        let result = interpret_response(raw.clone(), false).unwrap();
        assert_eq!(result.ocr_results.full_response, raw);
        assert_eq!(
            result.ocr_results.processing_time_in_milliseconds,
            Some(json!("1203"))
        );
        assert_eq!(result.ocr_results.text_orientation, Some(json!("0")));
        assert_eq!(result.ocr_results.file_parse_exit_code, Some(json!(1)));
    }

    #[test]
    fn word_coordinates_require_overlay_request() {
        let result = interpret_response(two_page_response(), false).unwrap();
        assert_eq!(result.word_coordinates, None);

        let result = interpret_response(two_page_response(), true).unwrap();
        let lines = result.word_coordinates.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["LineText"], json!("First"));
    }

    #[test]
    fn word_coordinates_absent_when_service_omits_overlay() {
        let raw = json!({
            "OCRExitCode": 1,
            "ParsedResults": [{ "ParsedText": "text" }]
        });
        let result = interpret_response(raw, true).unwrap();
        assert_eq!(result.word_coordinates, None);
    }

    #[test]
    fn missing_pages_give_empty_text() {
        let raw = json!({ "OCRExitCode": 1 });
        let result = interpret_response(raw, true).unwrap();
        assert_eq!(result.extracted_text, "");
        assert_eq!(result.ocr_results.text_orientation, None);
        assert_eq!(result.ocr_results.file_parse_exit_code, None);
        assert_eq!(result.word_coordinates, None);
    }

    #[test]
    fn missing_parsed_text_counts_as_empty() {
        let raw = json!({
            "OCRExitCode": 1,
            "ParsedResults": [{ "ParsedText": null }, { "ParsedText": "b" }]
        });
        let result = interpret_response(raw, false).unwrap();
        assert_eq!(result.extracted_text, "b");
    }

    #[test]
    fn non_success_exit_codes_are_service_errors() {
        for exit_code in [json!(0), json!(2), json!(3), json!(4), json!("1"), Value::Null] {
            let raw = json!({
                "OCRExitCode": exit_code,
                "ErrorMessage": ["File failed validation", "Bad format"]
            });
            let err = interpret_response(raw, false).unwrap_err();
            assert_eq!(
                err.to_string(),
                "OCR.space API error: File failed validation, Bad format"
            );
        }
    }

    #[test]
    fn missing_exit_code_is_a_failure() {
        let err = interpret_response(json!({}), false).unwrap_err();
        assert!(matches!(err, OcrError::Service { .. }));
        assert_eq!(err.to_string(), "OCR.space API error: Unknown OCR error");
    }

    #[test]
    fn single_string_error_message_is_accepted() {
        let raw = json!({ "OCRExitCode": 99, "ErrorMessage": "Timed out waiting for results" });
        let err = interpret_response(raw, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "OCR.space API error: Timed out waiting for results"
        );
    }

    #[test]
    fn unexpected_shapes_are_transport_errors() {
        let raw = json!({ "OCRExitCode": 1, "ParsedResults": "nope" });
        let err = interpret_response(raw, false).unwrap_err();
        assert!(matches!(err, OcrError::Transport(_)));
    }
}
