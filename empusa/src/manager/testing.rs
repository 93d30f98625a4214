//! In-memory HTTP transport for unit tests.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use parking_lot::Mutex;

use super::error::{ManagerError, ManagerResult};
use super::traits::{ByteProgress, HttpClient, HttpResponse};

/// Serves canned documents and assets keyed by URL.
#[derive(Default)]
pub(crate) struct FakeHttpClient {
    documents: HashMap<String, HttpResponse>,
    assets: HashMap<String, Vec<u8>>,
    hide_length: bool,
    requests: Mutex<Vec<String>>,
}

impl FakeHttpClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_document(mut self, url: &str, status: u16, body: &str) -> Self {
        self.documents
            .insert(url.to_string(), HttpResponse::new(status, body));
        self
    }

    pub(crate) fn with_asset(mut self, url: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.assets.insert(url.to_string(), bytes.into());
        self
    }

    /// Download without announcing a content length.
    pub(crate) fn without_content_length(mut self) -> Self {
        self.hide_length = true;
        self
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

impl HttpClient for FakeHttpClient {
    fn get(&self, url: &str) -> ManagerResult<HttpResponse> {
        self.requests.lock().push(url.to_string());
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| ManagerError::Network {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            })
    }

    fn download(
        &self,
        url: &str,
        dest: &Path,
        on_progress: ByteProgress<'_>,
    ) -> ManagerResult<u64> {
        self.requests.lock().push(url.to_string());
        let bytes = self
            .assets
            .get(url)
            .ok_or_else(|| ManagerError::DownloadFailed {
                url: url.to_string(),
                reason: "GET request failed with status 404 Not Found".to_string(),
            })?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| ManagerError::create_dir(parent, e))?;
        }

        let total = bytes.len() as u64;
        let announced = (!self.hide_length).then_some(total);
        let half = bytes.len() / 2;
        fs::write(dest, &bytes[..half]).map_err(|e| ManagerError::write(dest, e))?;
        on_progress(half as u64, announced);
        fs::write(dest, bytes).map_err(|e| ManagerError::write(dest, e))?;
        on_progress(total, announced);

        Ok(total)
    }
}
