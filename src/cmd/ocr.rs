//! The `ocr` subcommand.

use std::sync::Arc;

use clap::Args;
use futures::StreamExt as _;

use crate::{
    async_utils::io::{count_jsonl_records, read_jsonl, write_output},
    items::Item,
    ocr_space::{client::ClientOpts, options::NodeOpts},
    prelude::*,
    processor::{OcrProcessor, OutputCounters, OutputCountersExt as _, ProcessorConfig},
    ui::{Activity, Ui},
};

/// OCR command line arguments.
#[derive(Debug, Args)]
pub struct OcrOpts {
    /// Input JSONL file of items. Defaults to standard input.
    pub input_path: Option<PathBuf>,

    /// Output JSONL file. Defaults to standard output.
    #[clap(short = 'o', long = "out")]
    pub output_path: Option<PathBuf>,

    /// Record failures as an `error` field on the output record and keep
    /// going, instead of stopping at the first failure.
    #[clap(long)]
    pub continue_on_fail: bool,

    /// Limit processing to the first N items.
    #[clap(long)]
    pub take_first: Option<usize>,

    #[clap(flatten)]
    pub node_opts: NodeOpts,

    #[clap(flatten)]
    pub client_opts: ClientOpts,
}

/// The `ocr` subcommand.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_ocr(ui: Ui, opts: &OcrOpts) -> Result<()> {
    let client = opts.client_opts.create_client()?;
    let config = ProcessorConfig {
        binary_property_name: opts.node_opts.binary_property_name.clone(),
        options: opts.node_opts.request_options(),
        continue_on_fail: opts.continue_on_fail,
    };
    debug!(?config, endpoint = client.endpoint(), "OCR configuration");
    let processor = Arc::new(OcrProcessor::new(config, Arc::new(client)));

    // Open up our input and parse it into items.
    let mut count = match opts.input_path.as_deref() {
        Some(path) => count_jsonl_records(&ui, path).await?,
        None => None,
    };
    let mut input = read_jsonl(opts.input_path.as_deref())
        .await?
        .map(|value| Item::from_json(value?))
        .boxed();
    if let Some(take_first) = opts.take_first {
        input = input.take(take_first).boxed();
        count = count.map(|count| count.min(take_first as u64));
    }

    let pb = ui.start(Activity::OcrItems, count);

    let (records, counters) = OutputCounters::wrap_stream(processor.process_stream(input));
    let output = pb
        .wrap_stream(records)
        .map(|record| record?.to_json())
        .boxed();
    write_output(opts.output_path.as_deref(), output).await?;

    counters.finish(&ui);
    Ok(())
}
