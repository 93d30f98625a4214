//! Remote catalog retrieval.

use tracing::{info, warn};

use super::error::{ManagerError, ManagerResult};
use super::traits::HttpClient;
use crate::resource::{builtin_catalog, parse_catalog, Catalog};

/// Fetch and parse a catalog document.
pub fn fetch_catalog<C: HttpClient + ?Sized>(client: &C, url: &str) -> ManagerResult<Catalog> {
    let response = client.get(url)?;
    if !response.is_success() {
        return Err(ManagerError::ApiError {
            url: url.to_string(),
            status: response.status,
            message: response.text(),
        });
    }

    let catalog = parse_catalog(&response.text()).map_err(|e| ManagerError::DecodeFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    info!(url = %url, resources = catalog.len(), "Fetched resource catalog");
    Ok(catalog)
}

/// Fetch the catalog at `url`, falling back to the built-in catalog.
///
/// Without a URL the built-in catalog is returned directly.
pub fn load_catalog<C: HttpClient + ?Sized>(client: &C, url: Option<&str>) -> Catalog {
    let Some(url) = url else {
        return builtin_catalog();
    };

    match fetch_catalog(client, url) {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!(url = %url, error = %e, "Failed to fetch catalog, using built-in catalog");
            builtin_catalog()
        }
    }
}
