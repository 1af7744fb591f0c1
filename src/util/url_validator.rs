use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
}

/// Validates a configured feed source URL.
///
/// Sources are operator-supplied, so only the shape is checked: the URL
/// must parse, use `http` or `https`, and name a host.
pub fn validate_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}

/// Validates an item link before handing it to the system browser.
///
/// Item links come from untrusted feeds. Anything that is not a plain
/// http(s) URL (e.g. `file://`, `javascript:`, or a string that could be
/// read as a command-line flag) is refused with a user-facing message.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, String> {
    if url_str.chars().any(char::is_control) {
        return Err("Link contains control characters".to_string());
    }
    validate_url(url_str).map_err(|e| format!("Refusing to open link: {}", e))
}
