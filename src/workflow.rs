//! Upload the chosen file with the month selection, save what comes back.
use crate::api::{ProcessClient, upload_form};
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const RESULT_FILE_NAME: &str = "Result.xlsx";
pub const RESULT_CONTENT_TYPE: &str = "application/vnd.ms-excel";
pub const DOWNLOAD_NOTICE: &str = "Click on ok to download the file";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server rejected the upload (HTTP {status}): {message}")]
    Server { status: u16, message: String },
}

/// Binary result ready to be written somewhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Blocking user notifications
pub trait Notifier {
    fn alert(&mut self, message: &str);
}

impl Notifier for VecDeque<String> {
    fn alert(&mut self, message: &str) {
        self.push_back(message.to_string());
    }
}

pub trait DownloadSink {
    fn deliver(&mut self, artifact: Artifact) -> io::Result<PathBuf>;
}

/// Writes artifacts into a directory, replacing any previous result
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&mut self, artifact: Artifact) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&artifact.file_name);
        fs::write(&path, &artifact.bytes)?;
        Ok(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Downloaded(PathBuf),
    Rejected { status: u16, message: String },
    Failed(String),
}

/// Run one upload. Server rejections are alerted then swallowed, transport
/// failures are only logged.
pub async fn generate<N, S>(
    client: &ProcessClient,
    months: &str,
    file: Option<&Path>,
    notifier: &mut N,
    sink: &mut S,
) -> Outcome
where
    N: Notifier + ?Sized,
    S: DownloadSink + ?Sized,
{
    tracing::info!(months, file = ?file, "generating report");

    match upload(client, months, file, notifier, sink).await {
        Ok(path) => {
            tracing::info!(path = %path.display(), "result saved");
            Outcome::Downloaded(path)
        }
        Err(UploadError::Server { status, message }) => {
            tracing::warn!(status, %message, "upload rejected");
            Outcome::Rejected { status, message }
        }
        Err(e) => {
            tracing::error!(error = %e, "upload failed");
            Outcome::Failed(e.to_string())
        }
    }
}

async fn upload<N, S>(
    client: &ProcessClient,
    months: &str,
    file: Option<&Path>,
    notifier: &mut N,
    sink: &mut S,
) -> Result<PathBuf, UploadError>
where
    N: Notifier + ?Sized,
    S: DownloadSink + ?Sized,
{
    let form = upload_form(months, file).await?;
    let response = client.process(form).await?;

    if !response.is_ok() {
        let status = response.status().as_u16();
        let message = response.text().await?;
        notifier.alert(&message);
        return Err(UploadError::Server { status, message });
    }

    // Raised before the body is read, so it fires even if reading fails
    notifier.alert(DOWNLOAD_NOTICE);
    let bytes = response.bytes().await?;

    let artifact = Artifact {
        file_name: RESULT_FILE_NAME.to_string(),
        content_type: RESULT_CONTENT_TYPE.to_string(),
        bytes,
    };
    Ok(sink.deliver(artifact)?)
}
