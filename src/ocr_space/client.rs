//! HTTP client for the OCR.space API.

use std::{fmt, time::Duration};

use clap::Args;
use reqwest::multipart::Form;

use crate::prelude::*;

use super::request::OcrForm;

/// Default API server.
pub const DEFAULT_API_BASE: &str = "https://api.ocr.space";

/// Path of the OCR endpoint, relative to the API base.
const PARSE_IMAGE_PATH: &str = "/parse/image";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "apikey";

/// Image used to check that an API key works.
const CREDENTIAL_TEST_IMAGE_URL: &str =
    "https://via.placeholder.com/150x50/000000/FFFFFF?text=TEST";

/// Message reported when the credential check fails.
pub const AUTHENTICATION_FAILED: &str =
    "Authentication failed. Please check your API key.";

/// Connection options for the OCR.space API.
#[derive(Args, Clone, Debug)]
pub struct ClientOpts {
    /// Your OCR.space API key.
    #[clap(long, env = "OCR_SPACE_API_KEY", hide_env_values = true)]
    pub api_key: ApiKey,

    /// Override the API server URL.
    #[clap(long, env = "OCR_SPACE_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// A timeout, in seconds, for each request to the API.
    #[clap(long)]
    pub timeout: Option<u64>,
}

impl ClientOpts {
    /// Create a client using these options.
    pub fn create_client(&self) -> Result<OcrSpaceClient> {
        OcrSpaceClient::new(
            self.api_key.clone(),
            &self.api_base,
            self.timeout.map(Duration::from_secs),
        )
    }
}

/// An OCR.space API key. Never printed.
#[derive(Clone)]
pub struct ApiKey(String);

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

/// Something that can send an upload to `/parse/image` and return the JSON
/// body of the response.
///
/// Transport failures (network errors, non-2xx status, undecodable bodies)
/// are returned as errors. Failures reported inside the body are not.
#[async_trait]
pub trait OcrTransport: Send + Sync + 'static {
    async fn parse_image(&self, form: OcrForm) -> Result<Value>;
}

/// Our real [`OcrTransport`].
#[derive(Clone, Debug)]
pub struct OcrSpaceClient {
    client: reqwest::Client,
    api_key: ApiKey,
    endpoint: String,
}

impl OcrSpaceClient {
    /// Create a new client.
    pub fn new(api_key: ApiKey, api_base: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to create HTTP client")?;
        let endpoint = format!("{}{}", api_base.trim_end_matches('/'), PARSE_IMAGE_PATH);
        Ok(Self {
            client,
            api_key,
            endpoint,
        })
    }

    /// The full URL we post to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST a multipart form and parse the JSON response.
    async fn post_form(&self, form: Form) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key.0)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("failed to send request to {}", self.endpoint))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "OCR.space request failed (status {}): {}",
                status,
                body.trim()
            ));
        }
        response
            .json::<Value>()
            .await
            .context("failed to parse OCR.space response as JSON")
    }

    /// Check that our API key is accepted, by OCRing a tiny placeholder image
    /// by URL.
    #[instrument(level = "debug", skip_all)]
    pub async fn test_credentials(&self) -> Result<()> {
        let form = Form::new()
            .text("url", CREDENTIAL_TEST_IMAGE_URL)
            .text("language", "eng");
        let response = self.post_form(form).await?;
        debug!(%response, "Credential test response");
        check_credential_response(&response)
    }
}

#[async_trait]
impl OcrTransport for OcrSpaceClient {
    async fn parse_image(&self, form: OcrForm) -> Result<Value> {
        self.post_form(form.into_multipart()?).await
    }
}

/// The credential check passes only if the body reports `OCRExitCode` 1.
pub fn check_credential_response(response: &Value) -> Result<()> {
    if response.get("OCRExitCode").and_then(Value::as_f64) == Some(1.0) {
        Ok(())
    } else {
        Err(anyhow!(AUTHENTICATION_FAILED))
    }
}
