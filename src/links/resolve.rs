use crate::{UrlError, UrlResult};
use url::Url;

/// Replaces Windows path separators with forward slashes
pub fn normalize_separators(href: &str) -> String {
    href.trim().replace('\\', "/")
}

/// Resolves a record link against the site's base URL
///
/// # Resolution Steps
///
/// 1. Trim the href; reject if empty
/// 2. Replace `\` separators with `/`
/// 3. Join with the base URL (dot segments are collapsed by the join)
/// 4. Reject anything that is not http(s) after resolution
///
/// # Examples
///
/// ```
/// use openquake::links::resolve_record_url;
/// use url::Url;
///
/// let base = Url::parse("https://earthquake.phivolcs.dost.gov.ph").unwrap();
/// let url = resolve_record_url(r"..\2023_Earthquake_Information\January\a.html", &base).unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://earthquake.phivolcs.dost.gov.ph/2023_Earthquake_Information/January/a.html"
/// );
/// ```
pub fn resolve_record_url(href: &str, base_url: &Url) -> UrlResult<Url> {
    let href = normalize_separators(href);
    if href.is_empty() {
        return Err(UrlError::Empty);
    }

    let resolved = base_url
        .join(&href)
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    match resolved.scheme() {
        "http" | "https" => Ok(resolved),
        other => Err(UrlError::InvalidScheme(other.to_string())),
    }
}
