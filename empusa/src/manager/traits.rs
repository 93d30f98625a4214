//! Seams between the pipeline and its external collaborators.

use std::path::Path;
use std::sync::Arc;

use super::error::ManagerResult;

/// Byte-level download progress: `(received, content_length)`.
///
/// `content_length` is `None` when the server did not announce one.
pub type ByteProgress<'a> = &'a dyn Fn(u64, Option<u64>);

/// A fully buffered HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Blocking HTTP transport.
///
/// Implementations map transport failures to [`ManagerError::Network`] or
/// [`ManagerError::Timeout`]; non-success statuses are returned as responses
/// by `get` and as errors by `download`.
///
/// [`ManagerError::Network`]: super::ManagerError::Network
/// [`ManagerError::Timeout`]: super::ManagerError::Timeout
pub trait HttpClient: Send + Sync {
    /// GET a small document (API metadata, catalogs).
    fn get(&self, url: &str) -> ManagerResult<HttpResponse>;

    /// Stream `url` into `dest`, returning the number of bytes written.
    fn download(&self, url: &str, dest: &Path, on_progress: ByteProgress<'_>)
        -> ManagerResult<u64>;
}

impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    fn get(&self, url: &str) -> ManagerResult<HttpResponse> {
        (**self).get(url)
    }

    fn download(
        &self,
        url: &str,
        dest: &Path,
        on_progress: ByteProgress<'_>,
    ) -> ManagerResult<u64> {
        (**self).download(url, dest, on_progress)
    }
}

/// Archive decompression.
pub trait ArchiveExtractor: Send + Sync {
    /// Extract `archive` into `dest_dir`, reporting the fraction of entries
    /// written. Returns the number of files extracted.
    fn extract(
        &self,
        archive: &Path,
        dest_dir: &Path,
        on_progress: &dyn Fn(f64),
    ) -> ManagerResult<usize>;

    /// List entry names without extracting.
    fn list_contents(&self, archive: &Path) -> ManagerResult<Vec<String>>;
}
