//! Workflow items: the records we read and write.
//!
//! An input [`Item`] is a JSON field map plus zero or more named binary
//! payloads. Each input item produces exactly one [`OutputRecord`], which
//! carries the original fields plus whatever the OCR pipeline added.

use std::collections::BTreeMap;

use base64::{Engine as _, prelude::BASE64_STANDARD};
use schemars::JsonSchema;

use crate::{ocr_space::response::OcrResult, prelude::*};

/// An input record.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, Serialize)]
pub struct Item {
    /// Arbitrary fields, copied into the output record.
    #[serde(default)]
    pub json: Map<String, Value>,

    /// Named binary payloads. These are passed through to the output
    /// unchanged.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub binary: BTreeMap<String, BinaryData>,
}

impl Item {
    /// Parse an item from a JSON value.
    pub fn from_json(value: Value) -> Result<Self> {
        serde_json::from_value::<Self>(value).context("failed to deserialize item")
    }
}

/// A binary attachment on an [`Item`].
///
/// The bytes are either stored inline as Base64 in `data`, or on disk at
/// `path`.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryData {
    /// Standard Base64-encoded file contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    /// Path to a file containing the contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// The original file name, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// The file extension, without a leading dot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,

    /// The MIME type, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Any other metadata attached upstream (`fileSize`, `id` and so on).
    /// We never look at it, but it must survive into the output.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BinaryData {
    /// The declared file name, ignoring empty strings.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref().filter(|s| !s.is_empty())
    }

    /// The declared file extension, ignoring empty strings.
    pub fn file_extension(&self) -> Option<&str> {
        self.file_extension.as_deref().filter(|s| !s.is_empty())
    }

    /// The declared MIME type, ignoring empty strings.
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref().filter(|s| !s.is_empty())
    }

    /// Fetch the raw bytes of this payload.
    pub async fn load_bytes(&self) -> Result<Vec<u8>> {
        match (&self.data, &self.path) {
            (Some(data), _) => BASE64_STANDARD
                .decode(data.trim())
                .context("failed to decode Base64 binary data"),
            (None, Some(path)) => tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read binary data from {:?}", path)),
            (None, None) => Err(anyhow!("binary data has neither `data` nor `path`")),
        }
    }
}

/// Which input item an output record came from.
#[derive(Clone, Copy, Debug, Deserialize, JsonSchema, PartialEq, Eq, Serialize)]
pub struct PairedItem {
    /// Index of the input item.
    pub item: usize,
}

/// An output record.
#[derive(Clone, Debug, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    /// The input fields, plus either OCR results or an `error` field.
    pub json: Map<String, Value>,

    /// The input's binary payloads, unchanged.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub binary: BTreeMap<String, BinaryData>,

    /// The input item this record was produced from.
    pub paired_item: PairedItem,

    /// Did OCR fail for this item? Input fields may contain their own
    /// `error`, so we can't infer this from `json`.
    #[serde(skip)]
    failed: bool,
}

impl OutputRecord {
    /// Build a record for a successfully OCRed item.
    pub fn succeeded(item: &Item, item_index: usize, result: OcrResult) -> Result<Self> {
        let mut json = item.json.clone();
        json.insert(
            "extractedText".to_owned(),
            Value::String(result.extracted_text),
        );
        json.insert(
            "ocrResults".to_owned(),
            serde_json::to_value(&result.ocr_results)
                .context("failed to serialize OCR results")?,
        );
        if let Some(lines) = result.word_coordinates {
            json.insert("wordCoordinates".to_owned(), Value::Array(lines));
        }
        Ok(Self {
            json,
            binary: item.binary.clone(),
            paired_item: PairedItem { item: item_index },
            failed: false,
        })
    }

    /// Build a record for an item that failed, when failures are being
    /// recorded instead of aborting the run.
    pub fn failed(item: &Item, item_index: usize, message: String) -> Self {
        let mut json = item.json.clone();
        json.insert("error".to_owned(), Value::String(message));
        Self {
            json,
            binary: item.binary.clone(),
            paired_item: PairedItem { item: item_index },
            failed: true,
        }
    }

    /// Does this record represent a captured failure?
    pub fn is_failure(&self) -> bool {
        self.failed
    }

    /// The captured error message, if this record represents a failure.
    pub fn error(&self) -> Option<&str> {
        if self.failed {
            self.json.get("error").and_then(Value::as_str)
        } else {
            None
        }
    }

    /// Convert to a JSON value for output.
    pub fn to_json(&self) -> Result<Value> {
        serde_json::to_value(self).context("failed to serialize output record")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ocr_space::response::OcrResults;

    #[test]
    fn item_defaults_missing_fields() {
        let item = Item::from_json(json!({})).unwrap();
        assert!(item.json.is_empty());
        assert!(item.binary.is_empty());
    }

    #[test]
    fn item_parses_binary_metadata() {
        let item = Item::from_json(json!({
            "json": { "id": 7 },
            "binary": {
                "data": {
                    "data": "aGVsbG8=",
                    "fileName": "scan.png",
                    "fileExtension": "png",
                    "mimeType": "image/png"
                }
            }
        }))
        .unwrap();
        let binary = &item.binary["data"];
        assert_eq!(binary.file_name(), Some("scan.png"));
        assert_eq!(binary.file_extension(), Some("png"));
        assert_eq!(binary.mime_type(), Some("image/png"));
        assert_eq!(item.json["id"], json!(7));
    }

    #[test]
    fn empty_metadata_counts_as_missing() {
        let binary = BinaryData {
            file_name: Some(String::new()),
            file_extension: Some(String::new()),
            ..BinaryData::default()
        };
        assert_eq!(binary.file_name(), None);
        assert_eq!(binary.file_extension(), None);
    }

    #[tokio::test]
    async fn load_bytes_decodes_base64() -> Result<()> {
        let binary = BinaryData {
            data: Some("aGVsbG8=".to_owned()),
            ..BinaryData::default()
        };
        assert_eq!(binary.load_bytes().await?, b"hello");
        Ok(())
    }

    #[tokio::test]
    async fn load_bytes_reads_path() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("image.jpg");
        std::fs::write(&path, b"\xff\xd8\xff")?;
        let binary = BinaryData {
            path: Some(path),
            ..BinaryData::default()
        };
        assert_eq!(binary.load_bytes().await?, b"\xff\xd8\xff");
        Ok(())
    }

    #[tokio::test]
    async fn load_bytes_rejects_empty_payload() {
        let binary = BinaryData::default();
        assert!(binary.load_bytes().await.is_err());
    }

    #[test]
    fn failed_record_keeps_fields_and_binary() {
        let item = Item::from_json(json!({
            "json": { "id": "a" },
            "binary": { "data": { "data": "aGVsbG8=" } }
        }))
        .unwrap();
        let record = OutputRecord::failed(&item, 2, "boom".to_owned());
        assert!(record.is_failure());
        assert_eq!(record.error(), Some("boom"));
        assert_eq!(record.json["id"], json!("a"));
        assert_eq!(record.binary, item.binary);
        assert_eq!(record.paired_item, PairedItem { item: 2 });
        let value = record.to_json().unwrap();
        assert_eq!(value["pairedItem"]["item"], json!(2));
    }

    #[test]
    fn unknown_binary_metadata_passes_through() {
        let input = json!({
            "json": {},
            "binary": {
                "data": {
                    "data": "aGVsbG8=",
                    "fileName": "a.png",
                    "fileSize": "5 B",
                    "fileType": "image",
                    "id": "filesystem-v2:abc"
                }
            }
        });
        let item = Item::from_json(input.clone()).unwrap();
        assert_eq!(item.binary["data"].file_name(), Some("a.png"));
        assert_eq!(item.binary["data"].extra["fileSize"], json!("5 B"));

        let record = OutputRecord::failed(&item, 0, "boom".to_owned());
        let value = record.to_json().unwrap();
        assert_eq!(value["binary"], input["binary"]);
    }

    #[test]
    fn input_error_field_is_not_a_failure() {
        let item = Item::from_json(json!({ "json": { "error": "from upstream" } })).unwrap();
        let record = OutputRecord::succeeded(
            &item,
            0,
            OcrResult {
                extracted_text: "text".to_owned(),
                ocr_results: OcrResults {
                    full_response: json!({ "OCRExitCode": 1 }),
                    processing_time_in_milliseconds: None,
                    text_orientation: None,
                    file_parse_exit_code: None,
                },
                word_coordinates: None,
            },
        )
        .unwrap();
        assert!(!record.is_failure());
        assert_eq!(record.error(), None);
        assert_eq!(record.json["error"], json!("from upstream"));
    }
}
