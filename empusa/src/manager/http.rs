//! Blocking HTTP transport backed by reqwest.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, CONTENT_LENGTH};
use tracing::debug;

use super::config::ManagerConfig;
use super::error::{ManagerError, ManagerResult};
use super::traits::{ByteProgress, HttpClient, HttpResponse};

/// Buffer size for reading/writing during downloads (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// `Accept` header for release API requests.
const API_ACCEPT: &str = "application/vnd.github+json, application/json";

/// HTTP client for release APIs, catalogs and asset downloads.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
    pub(crate) timeout: Duration,
}

impl ReqwestClient {
    /// Create a client with the given timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> ManagerResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|e| ManagerError::Network {
                url: String::new(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, timeout })
    }

    /// Create a client from a manager configuration.
    pub fn from_config(config: &ManagerConfig) -> ManagerResult<Self> {
        Self::new(config.timeout, &config.user_agent)
    }

    fn send_error(&self, url: &str, e: reqwest::Error) -> ManagerError {
        if e.is_timeout() {
            ManagerError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            ManagerError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }

    /// Stream the response body to the destination file.
    fn stream_to_file(
        &self,
        url: &str,
        mut response: Response,
        dest: &Path,
        on_progress: ByteProgress<'_>,
    ) -> ManagerResult<u64> {
        let total_size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|len| *len > 0);

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| ManagerError::create_dir(parent, e))?;
        }
        let file = File::create(dest).map_err(|e| ManagerError::write(dest, e))?;

        let mut writer = BufWriter::new(file);
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut downloaded = 0u64;

        loop {
            let bytes_read = response.read(&mut buffer).map_err(|e| {
                if e.kind() == std::io::ErrorKind::TimedOut {
                    ManagerError::Timeout {
                        url: url.to_string(),
                        timeout_secs: self.timeout.as_secs(),
                    }
                } else {
                    ManagerError::DownloadFailed {
                        url: url.to_string(),
                        reason: format!("read error: {}", e),
                    }
                }
            })?;

            if bytes_read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..bytes_read])
                .map_err(|e| ManagerError::write(dest, e))?;

            downloaded += bytes_read as u64;
            on_progress(downloaded, total_size);
        }

        writer.flush().map_err(|e| ManagerError::write(dest, e))?;

        Ok(downloaded)
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> ManagerResult<HttpResponse> {
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, API_ACCEPT)
            .send()
            .map_err(|e| self.send_error(url, e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| self.send_error(url, e))?
            .to_vec();

        Ok(HttpResponse { status, body })
    }

    fn download(
        &self,
        url: &str,
        dest: &Path,
        on_progress: ByteProgress<'_>,
    ) -> ManagerResult<u64> {
        debug!(url = %url, dest = %dest.display(), "Downloading");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| self.send_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ManagerError::DownloadFailed {
                url: url.to_string(),
                reason: format!("GET request failed with status {}", status),
            });
        }

        self.stream_to_file(url, response, dest, on_progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_with_timeout() {
        let client = ReqwestClient::new(Duration::from_secs(60), "empusa-test").unwrap();
        assert_eq!(client.timeout.as_secs(), 60);
    }

    #[test]
    fn test_client_from_config() {
        let config = ManagerConfig::default().with_timeout(Duration::from_secs(5));
        let client = ReqwestClient::from_config(&config).unwrap();
        assert_eq!(client.timeout, Duration::from_secs(5));
    }
}
