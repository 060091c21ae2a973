//! I/O utilities.
//!
//! We read items as JSON Lines from a file or standard input, and write output
//! records as JSON Lines to a file or standard output. Everything is streamed,
//! so we never hold more than one item in memory at a time.

use futures::{TryStreamExt as _, pin_mut, stream::StreamExt as _};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt as _, AsyncRead, AsyncWrite, AsyncWriteExt as _, BufReader, BufWriter},
};
use tokio_stream::wrappers::LinesStream;

use crate::{
    prelude::*,
    ui::{Activity, Ui},
};

use super::BoxedStream;

/// A stream of [`serde_json::Value`] values.
pub type JsonStream = BoxedStream<Result<Value>>;

/// Open a file or standard input for reading.
async fn create_reader(
    path: Option<&Path>,
) -> Result<Box<dyn AsyncRead + Unpin + Send + Sync + 'static>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .await
                .with_context(|| format!("Failed to open file at path: {:?}", path))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(tokio::io::stdin())),
    }
}

/// Count the non-blank lines in a JSONL file, so we can show a real progress
/// bar.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn count_jsonl_records(ui: &Ui, path: &Path) -> Result<Option<u64>> {
    // Named pipes and the like can only be read once.
    if !path.is_file() {
        return Ok(None);
    }

    let spinner = ui.start(Activity::CountingItems, None);
    let reader = BufReader::new(create_reader(Some(path)).await?);
    let count = LinesStream::new(reader.lines())
        .try_fold(0u64, |acc, line| async move {
            Ok(if line.trim().is_empty() { acc } else { acc + 1 })
        })
        .await
        .with_context(|| format!("Failed to read lines from {:?}", path))?;
    spinner.finish_with_message(format!("Found {count} items"));
    Ok(Some(count))
}

/// Read JSONL from a file or stdin. Blank lines are skipped.
pub async fn read_jsonl(path: Option<&Path>) -> Result<JsonStream> {
    let description = match path {
        Some(path) => path.display().to_string(),
        None => "stdin".to_owned(),
    };
    let reader = BufReader::new(create_reader(path).await?);
    let lines = LinesStream::new(reader.lines())
        .try_filter(|line| futures::future::ready(!line.trim().is_empty()));
    Ok(lines
        .map(move |line| {
            let line = line.with_context(|| format!("Failed to read line from {}", description))?;
            serde_json::from_str::<Value>(&line).with_context(|| {
                format!("Failed to parse JSON from line in {}: {:?}", description, line)
            })
        })
        .boxed())
}

/// Create an [`AsyncWrite`] for a file or stdout.
pub async fn create_writer(
    path: Option<&Path>,
) -> Result<Box<dyn AsyncWrite + Unpin + Send + Sync + 'static>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .await
                .with_context(|| format!("Failed to create file at path: {:?}", path))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(tokio::io::stdout())),
    }
}

/// Write a stream of JSON values to either standard output or a file, one per
/// line.
///
/// Values are flushed as they arrive. If the stream yields an error, we flush
/// what we already have and then return the error.
pub async fn write_output(path: Option<&Path>, stream: JsonStream) -> Result<()> {
    let mut writer = BufWriter::new(create_writer(path).await?);
    pin_mut!(stream);
    let mut result = Ok(());
    while let Some(value) = stream.next().await {
        let value = match value {
            Ok(value) => value,
            Err(err) => {
                result = Err(err);
                break;
            }
        };
        let json = serde_json::to_string(&value)
            .with_context(|| format!("Failed to serialize JSON: {:?}", value))?;
        writer
            .write_all(json.as_bytes())
            .await
            .context("Failed to write JSON to output")?;
        writer
            .write_all(b"\n")
            .await
            .context("Failed to write newline to output")?;
    }
    writer.flush().await.context("Failed to flush output")?;
    result
}

#[cfg(test)]
mod tests {
    use futures::{StreamExt as _, TryStreamExt as _};

    use super::*;

    #[tokio::test]
    async fn reads_jsonl_skipping_blank_lines() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("items.jsonl");
        std::fs::write(&path, "{\"a\":1}\n\n  \n{\"a\":2}\n")?;

        let ui = Ui::init_for_tests();
        assert_eq!(count_jsonl_records(&ui, &path).await?, Some(2));

        let values = read_jsonl(Some(&path))
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        assert_eq!(values, vec![serde_json::json!({"a": 1}), serde_json::json!({"a": 2})]);
        Ok(())
    }

    #[tokio::test]
    async fn bad_json_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("items.jsonl");
        std::fs::write(&path, "{\"a\":1}\nnot json\n")?;

        let results = read_jsonl(Some(&path)).await?.collect::<Vec<_>>().await;
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        Ok(())
    }

    #[tokio::test]
    async fn write_output_keeps_records_before_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.jsonl");
        let stream = futures::stream::iter(vec![
            Ok(serde_json::json!({"n": 1})),
            Err(anyhow!("boom")),
            Ok(serde_json::json!({"n": 2})),
        ])
        .boxed();

        let err = write_output(Some(&path), stream).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(std::fs::read_to_string(&path)?, "{\"n\":1}\n");
        Ok(())
    }
}
