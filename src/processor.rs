//! Running items through OCR, one at a time.
//!
//! Each item goes through the same steps: find its binary payload, build an
//! upload, send it, and interpret the response. Items are processed strictly
//! in order, and nothing is shared between items except the output.
//!
//! When `continue_on_fail` is set, a failing item becomes an output record
//! with an `error` field and we move on. Otherwise the first failure ends the
//! run.

use std::sync::{Arc, Mutex};

use futures::{StreamExt as _, stream};

use crate::{
    async_utils::BoxedStream,
    error::{ItemError, OcrError},
    items::{Item, OutputRecord},
    ocr_space::{
        client::OcrTransport, options::OcrRequestOptions, request::OcrForm,
        response::{OcrResult, interpret_response},
    },
    prelude::*,
    ui::Ui,
};

/// Per-run settings.
#[derive(Clone, Debug)]
pub struct ProcessorConfig {
    /// The binary property holding the image.
    pub binary_property_name: String,

    /// Options sent with every request.
    pub options: OcrRequestOptions,

    /// Record failures in the output instead of aborting.
    pub continue_on_fail: bool,
}

/// Sends items to an [`OcrTransport`] and builds output records.
pub struct OcrProcessor {
    config: ProcessorConfig,
    transport: Arc<dyn OcrTransport>,
}

impl OcrProcessor {
    /// Create a new processor.
    pub fn new(config: ProcessorConfig, transport: Arc<dyn OcrTransport>) -> Self {
        Self { config, transport }
    }

    /// OCR a single item, without applying any failure policy.
    #[instrument(level = "debug", skip_all, fields(item_index = item_index))]
    pub async fn ocr_item(&self, item: &Item, item_index: usize) -> Result<OcrResult, OcrError> {
        let property = &self.config.binary_property_name;
        let binary = item
            .binary
            .get(property)
            .ok_or_else(|| OcrError::MissingBinary {
                property: property.clone(),
            })?;
        let bytes = binary
            .load_bytes()
            .await
            .map_err(|error| OcrError::BinaryData {
                property: property.clone(),
                error,
            })?;

        let form = OcrForm::build(binary, bytes, item_index, &self.config.options);
        info!("Uploading file for OCR: {}", form.file_name);
        let response = self
            .transport
            .parse_image(form)
            .await
            .map_err(OcrError::Transport)?;
        debug!(%response, "OCR.space response");

        interpret_response(response, self.config.options.overlay_required)
    }

    /// Process a single item, applying our failure policy.
    ///
    /// Returns an error only if `continue_on_fail` is off.
    pub async fn process_item(
        &self,
        item: &Item,
        item_index: usize,
    ) -> Result<OutputRecord, ItemError> {
        match self.ocr_item(item, item_index).await {
            Ok(result) => OutputRecord::succeeded(item, item_index, result)
                .map_err(|err| ItemError::new(item_index, OcrError::Transport(err))),
            Err(error) if self.config.continue_on_fail => {
                warn!(item_index, %error, "OCR failed, recording error and continuing");
                Ok(OutputRecord::failed(item, item_index, error.to_string()))
            }
            Err(error) => Err(ItemError::new(item_index, error)),
        }
    }

    /// Process a stream of items.
    ///
    /// Items are pulled one at a time, so item `i + 1` is never read until
    /// item `i` has produced a record. After the first error, the input is
    /// never polled again and the stream ends.
    ///
    /// Collected, this is the run's `Result<Vec<OutputRecord>, ItemError>`:
    /// per-item failures arrive as an [`ItemError`] inside the
    /// [`anyhow::Error`].
    pub fn process_stream(
        self: Arc<Self>,
        input: BoxedStream<Result<Item>>,
    ) -> BoxedStream<Result<OutputRecord>> {
        let state = (input.enumerate(), self, false);
        stream::unfold(state, |(mut input, processor, failed)| async move {
            if failed {
                return None;
            }
            let (item_index, item) = input.next().await?;
            let record = match item {
                Ok(item) => processor
                    .process_item(&item, item_index)
                    .await
                    .map_err(anyhow::Error::from),
                Err(err) => Err(err.context(format!("failed to read item {item_index}"))),
            };
            let failed = record.is_err();
            Some((record, (input, processor, failed)))
        })
        .boxed()
    }
}

/// Counts of what happened during a run.
#[derive(Clone, Debug, Default)]
pub struct OutputCounters {
    /// How many records did we write?
    pub total_record_count: usize,

    /// How many of them are captured failures?
    pub failure_count: usize,
}

impl OutputCounters {
    /// Wrap a stream of records, counting them as they go by.
    pub fn wrap_stream(
        stream: BoxedStream<Result<OutputRecord>>,
    ) -> (BoxedStream<Result<OutputRecord>>, Arc<Mutex<OutputCounters>>) {
        let counters = Arc::new(Mutex::new(Self::default()));
        let counters_clone = counters.clone();
        let stream = stream
            .map(move |record| {
                let record = record?;
                counters_clone.update(&record);
                Ok(record)
            })
            .boxed();
        (stream, counters)
    }
}

/// Methods on the shared `Mutex<OutputCounters>` we actually hold.
pub trait OutputCountersExt {
    /// Count a record.
    fn update(&self, record: &OutputRecord);

    /// Report our totals to the user.
    fn finish(&self, ui: &Ui) -> OutputCounters;
}

impl OutputCountersExt for Mutex<OutputCounters> {
    fn update(&self, record: &OutputRecord) {
        let mut counters = self.lock().expect("lock poisoned");
        counters.total_record_count += 1;
        if record.is_failure() {
            counters.failure_count += 1;
        }
    }

    fn finish(&self, ui: &Ui) -> OutputCounters {
        let counters = self.lock().expect("lock poisoned").to_owned();
        ui.display_message(
            "📄",
            &format!("{} records written", counters.total_record_count),
        );
        if counters.failure_count > 0 {
            ui.display_message(
                "❌",
                &format!(
                    "{} records could not be OCRed and contain an `error` field",
                    counters.failure_count
                ),
            );
        }
        counters
    }
}
