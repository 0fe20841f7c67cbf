use reqwest::{
    Client, ClientBuilder, StatusCode,
    multipart::{Form, Part},
};
use std::path::Path;

pub const PROCESS_PATH: &str = "/process";

#[derive(Debug, Clone)]
pub struct ProcessClient {
    base_url: String,
    http: Client,
}

// Thin wrapper so the workflow doesn't care about reqwest internals
#[derive(Debug)]
pub struct ProcessResponse {
    inner: reqwest::Response,
}

impl ProcessResponse {
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    pub fn is_ok(&self) -> bool {
        self.status() == StatusCode::OK
    }

    pub async fn bytes(self) -> Result<Vec<u8>, reqwest::Error> {
        Ok(self.inner.bytes().await?.to_vec())
    }

    pub async fn text(self) -> Result<String, reqwest::Error> {
        self.inner.text().await
    }
}

/// Build the `months` + `file` form. A missing file leaves the `file` field out.
pub async fn upload_form(months: &str, file: Option<&Path>) -> std::io::Result<Form> {
    let form = Form::new().text("months", months.to_string());

    let Some(path) = file else {
        return Ok(form);
    };

    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".into());

    Ok(form.part("file", Part::bytes(bytes).file_name(file_name)))
}

impl ProcessClient {
    pub fn new(base_url: &str) -> Self {
        let client = ClientBuilder::new()
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn process_url(&self) -> String {
        format!("{}{}", self.base_url, PROCESS_PATH)
    }

    // Single POST, no timeout and no retry
    pub async fn process(&self, form: Form) -> Result<ProcessResponse, reqwest::Error> {
        let url = self.process_url();
        tracing::info!(%url, "sending upload");

        let inner = self.http.post(&url).multipart(form).send().await?;
        tracing::info!(status = %inner.status(), "backend answered");

        Ok(ProcessResponse { inner })
    }
}
