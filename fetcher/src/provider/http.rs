//! Status policy for provider pages.

use crate::artefact::download::{DownloadError, HttpClient};
use crate::error::{FetchError, Result};

/// GET a provider page and return its body.
///
/// # Errors
///
/// Returns [`FetchError::NotFound`] on HTTP 404 and
/// [`FetchError::UpstreamError`] on any other non-200 status or transport
/// failure.
pub fn fetch_page(http: &dyn HttpClient, url: &str) -> Result<String> {
    log::debug!("fetching provider page {url}");
    let response = http.get_text(url).map_err(|err| match err {
        DownloadError::NotFound { url } => FetchError::NotFound { url },
        other => FetchError::UpstreamError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    })?;

    match response.status {
        200 => Ok(response.body),
        404 => Err(FetchError::NotFound {
            url: url.to_owned(),
        }),
        status => Err(FetchError::UpstreamError {
            url: url.to_owned(),
            reason: format!("unexpected status code (got {status})"),
        }),
    }
}
