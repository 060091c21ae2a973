//! Building multipart upload requests.

use mime_guess::mime::Mime;
use reqwest::multipart::{Form, Part};

use crate::{items::BinaryData, prelude::*};

use super::options::OcrRequestOptions;

/// Value sent for boolean flags that are switched on. Flags that are off are
/// left out of the form entirely.
const FLAG_ENABLED: &str = "true";

/// A fully-resolved `/parse/image` upload, before it is turned into a
/// [`Form`].
///
/// Keeping this separate from [`Form`] lets us inspect exactly what will be
/// sent.
#[derive(Clone, Debug)]
pub struct OcrForm {
    /// The file name reported for the `file` part.
    pub file_name: String,

    /// Content type of the `file` part.
    pub mime_type: String,

    /// The file contents.
    pub bytes: Vec<u8>,

    /// Text fields, in the order they will be sent.
    pub fields: Vec<(&'static str, String)>,
}

impl OcrForm {
    /// Build the upload for a binary payload.
    pub fn build(
        binary: &BinaryData,
        bytes: Vec<u8>,
        item_index: usize,
        options: &OcrRequestOptions,
    ) -> Self {
        let file_name = file_name_for(binary, item_index);
        let mime_type = binary
            .mime_type()
            .filter(|mime_type| mime_type.parse::<Mime>().is_ok())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| {
                mime_guess::from_path(&file_name)
                    .first_or_octet_stream()
                    .to_string()
            });

        let mut fields = vec![
            (
                "filetype",
                binary.file_extension().unwrap_or_default().to_owned(),
            ),
            ("language", options.language.code().to_owned()),
            ("OCREngine", options.engine.code().to_owned()),
        ];
        let flags = [
            ("detectOrientation", options.detect_orientation),
            ("isOverlayRequired", options.overlay_required),
            ("scale", options.scale),
            ("isTable", options.table),
        ];
        for (name, enabled) in flags {
            if enabled {
                fields.push((name, FLAG_ENABLED.to_owned()));
            }
        }

        Self {
            file_name,
            mime_type,
            bytes,
            fields,
        }
    }

    /// Look up a text field by name.
    #[cfg(test)]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field_name, _)| *field_name == name)
            .map(|(_, value)| value.as_str())
    }

    /// Convert to a `reqwest` multipart form.
    pub fn into_multipart(self) -> Result<Form> {
        let part = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime_type)
            .context("invalid MIME type for upload")?;
        let mut form = Form::new().part("file", part);
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        Ok(form)
    }
}

/// Pick the file name to upload under: the declared name if we have one,
/// otherwise `document_<index>.<extension>`.
pub fn file_name_for(binary: &BinaryData, item_index: usize) -> String {
    match binary.file_name() {
        Some(name) => name.to_owned(),
        None => format!(
            "document_{}.{}",
            item_index,
            binary.file_extension().unwrap_or("jpg")
        ),
    }
}
