//! URL normalization for outbound requests and scraped links.

use url::Url;

use super::FetchError;

/// Parse and normalize a request URL.
///
/// Surrounding whitespace is trimmed, only `http`/`https` are accepted and
/// any fragment is dropped. Query strings are kept byte-for-byte since the
/// archives encode their search parameters there.
pub fn normalize_url(input: &str) -> Result<Url, FetchError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FetchError::InvalidUrl("empty URL".into()));
    }

    let mut parsed = Url::parse(trimmed).map_err(|e| FetchError::InvalidUrl(format!("{trimmed}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(FetchError::InvalidUrl(format!("unsupported scheme: {scheme}"))),
    }

    parsed.set_fragment(None);
    Ok(parsed)
}

/// Resolve an `href` scraped from a listing page against the site base URL.
pub fn resolve_href(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(|mut u| {
        u.set_fragment(None);
        u.to_string()
    })
}
