//! Model Artifact Download from Google Drive
//!
//! Populates an empty models directory from a shared Drive folder using the
//! Drive v3 REST API.

use crate::config::ApiConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

/// Extension of a file still being downloaded
const PARTIAL_EXTENSION: &str = "part";

/// Download errors
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unusable file name: {0:?}")]
    InvalidFileName(String),
}

/// File entry in a Drive folder listing
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Minimal Google Drive client
#[derive(Debug, Clone)]
pub struct DriveClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl DriveClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: DRIVE_FILES_URL.to_string(),
        }
    }

    /// Point the client at another files endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn key_query(&self) -> Vec<(&'static str, String)> {
        self.api_key
            .iter()
            .map(|key| ("key", key.clone()))
            .collect()
    }

    /// List all files in a Drive folder
    pub async fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFile>, DownloadError> {
        let listing: FileList = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", format!("'{}' in parents", folder_id)),
                ("fields", "files(id, name)".to_string()),
            ])
            .query(&self.key_query())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if listing.files.is_empty() {
            info!("No files found in the folder with ID: {}", folder_id);
        } else {
            info!("Found {} files in the folder.", listing.files.len());
        }
        Ok(listing.files)
    }

    /// Download one file into `output_dir`, streaming chunk by chunk.
    ///
    /// Bytes go to a `.part` file that is renamed into place only once the
    /// whole body has arrived. A failed transfer leaves nothing behind.
    pub async fn download_file(
        &self,
        file: &DriveFile,
        output_dir: &Path,
    ) -> Result<PathBuf, DownloadError> {
        let name = safe_file_name(&file.name)?;
        let output_path = output_dir.join(name);
        let partial_path = output_dir.join(format!("{}.{}", name, PARTIAL_EXTENSION));
        tokio::fs::create_dir_all(output_dir).await?;

        if let Err(e) = self.fetch(file, &partial_path).await {
            match tokio::fs::remove_file(&partial_path).await {
                Err(cleanup) if cleanup.kind() != std::io::ErrorKind::NotFound => {
                    warn!("Could not remove {}: {}", partial_path.display(), cleanup)
                }
                _ => {}
            }
            return Err(e);
        }
        tokio::fs::rename(&partial_path, &output_path).await?;

        info!("Downloaded {} to {}", file.name, output_path.display());
        Ok(output_path)
    }

    async fn fetch(&self, file: &DriveFile, path: &Path) -> Result<(), DownloadError> {
        let mut response = self
            .http
            .get(format!("{}/{}", self.base_url, file.id))
            .query(&[("alt", "media")])
            .query(&self.key_query())
            .send()
            .await?
            .error_for_status()?;

        let total = response.content_length();
        let mut received: u64 = 0;
        let mut out = tokio::fs::File::create(path).await?;
        while let Some(chunk) = response.chunk().await? {
            out.write_all(&chunk).await?;
            received += chunk.len() as u64;
            if let Some(total) = total.filter(|t| *t > 0) {
                info!("Downloading {}: {}%", file.name, received * 100 / total);
            }
        }
        out.flush().await?;
        Ok(())
    }

    /// Download every file of a folder. Failed files are logged and skipped.
    ///
    /// Returns the number of files written.
    pub async fn download_folder(
        &self,
        folder_id: &str,
        output_dir: &Path,
    ) -> Result<usize, DownloadError> {
        let files = self.list_files(folder_id).await?;
        if files.is_empty() {
            warn!("No files found in the folder.");
            return Ok(0);
        }

        let mut written = 0;
        for file in &files {
            info!("Starting download for {} (ID: {})", file.name, file.id);
            match self.download_file(file, output_dir).await {
                Ok(_) => written += 1,
                Err(e) => error!("Error downloading file {}: {}", file.name, e),
            }
        }
        Ok(written)
    }
}

/// Make sure the models directory exists and is populated.
///
/// Creates the directory when missing. An empty directory is filled from the
/// configured Drive folder; a non-empty one is left untouched. Leftover
/// `.part` files do not count as content.
pub async fn prepare_models_dir(config: &ApiConfig) -> Result<(), DownloadError> {
    let dir = &config.models_dir;
    if !tokio::fs::try_exists(dir).await? {
        tokio::fs::create_dir_all(dir).await?;
        info!("Created '{}' directory.", dir.display());
    }

    if has_models(dir).await? {
        info!("Models already exist. Skipping download.");
        return Ok(());
    }

    match &config.google_drive_folder_id {
        Some(folder_id) => {
            info!("Downloading models from Google Drive folder: {}", folder_id);
            let client = DriveClient::new(config.google_drive_api_key.clone());
            let written = client.download_folder(folder_id, dir).await?;
            info!("Downloaded {} model file(s)", written);
        }
        None => warn!(
            "'{}' is empty and GOOGLE_DRIVE_FOLDER_ID is not set; starting without models",
            dir.display()
        ),
    }
    Ok(())
}

/// Whether `dir` holds anything besides unfinished downloads
async fn has_models(dir: &Path) -> Result<bool, std::io::Error> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(PARTIAL_EXTENSION) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Strip any directory components from a remote file name
fn safe_file_name(name: &str) -> Result<&str, DownloadError> {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| DownloadError::InvalidFileName(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("models-{}-{}", name, std::process::id()))
    }

    /// Serve one response whose declared length may exceed the bytes sent
    async fn serve_once(payload: &'static [u8], declared_len: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\ncontent-length: {}\r\n\r\n",
                declared_len
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(payload).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}/files", addr)
    }

    fn artifact() -> DriveFile {
        DriveFile {
            id: "1a".into(),
            name: "linear_regression_model.json".into(),
        }
    }

    #[tokio::test]
    async fn test_download_renames_complete_file() {
        let dir = scratch_dir("complete");
        let _ = std::fs::remove_dir_all(&dir);
        let body: &'static [u8] = br#"{"intercept": 1.0, "coefficients": {}}"#;
        let client = DriveClient::new(None).with_base_url(serve_once(body, body.len()).await);

        let path = client.download_file(&artifact(), &dir).await.unwrap();
        assert_eq!(path, dir.join("linear_regression_model.json"));
        assert_eq!(std::fs::read(&path).unwrap(), body);
        assert!(!dir.join("linear_regression_model.json.part").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_interrupted_download_leaves_no_artifact() {
        let dir = scratch_dir("interrupted");
        let _ = std::fs::remove_dir_all(&dir);
        let url = serve_once(b"{\"intercept\"", 1000).await;
        let client = DriveClient::new(None).with_base_url(url);

        assert!(client.download_file(&artifact(), &dir).await.is_err());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_partial_files_do_not_count_as_models() {
        let dir = scratch_dir("leftover");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("xgboost_model.onnx.part"), b"trunc").unwrap();
        assert!(!has_models(&dir).await.unwrap());

        std::fs::write(dir.join("xgboost_model.onnx"), b"onnx").unwrap();
        assert!(has_models(&dir).await.unwrap());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("xgboost_model.onnx").unwrap(), "xgboost_model.onnx");
        assert_eq!(safe_file_name("../../etc/passwd").unwrap(), "passwd");
        assert!(safe_file_name("..").is_err());
        assert!(safe_file_name("").is_err());
    }

    #[test]
    fn test_parse_listing() {
        let listing: FileList = serde_json::from_str(
            r#"{"files": [{"id": "1a", "name": "linear_regression_model.onnx"}]}"#,
        )
        .unwrap();
        assert_eq!(
            listing.files,
            vec![DriveFile {
                id: "1a".into(),
                name: "linear_regression_model.onnx".into(),
            }]
        );

        let empty: FileList = serde_json::from_str("{}").unwrap();
        assert!(empty.files.is_empty());
    }

    #[tokio::test]
    async fn test_creates_missing_dir_without_folder() {
        let dir = scratch_dir("create");
        let _ = std::fs::remove_dir_all(&dir);
        let config = ApiConfig {
            models_dir: dir.clone(),
            ..Default::default()
        };

        prepare_models_dir(&config).await.unwrap();
        assert!(dir.is_dir());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_skips_populated_dir() {
        let dir = scratch_dir("populated");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("linear_regression_model.json"), "{}").unwrap();
        // An unreachable folder id proves no download is attempted
        let config = ApiConfig {
            models_dir: dir.clone(),
            google_drive_folder_id: Some("unreachable".into()),
            ..Default::default()
        };

        prepare_models_dir(&config).await.unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
