//! Locator resolution.

use evsub_core::TransportError;
use url::Url;

/// Turn a locator into an absolute `http(s)` URL.
///
/// Absolute locators are used as-is. Relative ones (`/stream`, `events`) are
/// joined onto `base`; without a base they are rejected.
pub(crate) fn resolve_locator(base: Option<&Url>, locator: &str) -> Result<Url, TransportError> {
    let invalid = |reason: String| TransportError::InvalidLocator {
        locator: locator.to_string(),
        reason,
    };

    let url = match Url::parse(locator) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = base.ok_or_else(|| {
                invalid("relative locator and no base URL configured".to_string())
            })?;
            base.join(locator).map_err(|e| invalid(e.to_string()))?
        }
        Err(e) => return Err(invalid(e.to_string())),
    };

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}
