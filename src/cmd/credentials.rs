//! The `test-credentials` subcommand.

use clap::Args;

use crate::{ocr_space::client::ClientOpts, prelude::*, ui::Ui};

/// Credential test command line arguments.
#[derive(Debug, Args)]
pub struct CredentialsOpts {
    #[clap(flatten)]
    pub client_opts: ClientOpts,
}

/// The `test-credentials` subcommand.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_test_credentials(ui: Ui, opts: &CredentialsOpts) -> Result<()> {
    let client = opts.client_opts.create_client()?;
    client.test_credentials().await?;
    ui.display_message("🔑", "OCR.space API key accepted");
    Ok(())
}
