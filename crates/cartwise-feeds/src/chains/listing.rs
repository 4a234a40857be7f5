//! Helpers shared by adapters that discover feed files in listings.

use std::sync::OnceLock;

use regex::Regex;
use reqwest::Url;

use crate::error::AcquisitionError;

/// Store numbers appear zero-padded to three digits in feed file names.
pub(crate) fn padded_store(store_code: &str) -> String {
    format!("{:0>3}", store_code.trim())
}

/// File-name prefix for a store's full feed, e.g.
/// `PriceFull7290027600007-012-`.
pub(crate) fn file_prefix(kind: &str, chain_code: &str, store_code: &str) -> String {
    format!("{kind}{chain_code}-{}-", padded_store(store_code))
}

/// Newest name starting with `prefix`. Names end in a timestamp, so
/// lexicographic order is chronological.
pub(crate) fn newest_with_prefix<'a>(
    names: impl IntoIterator<Item = &'a str>,
    prefix: &str,
) -> Option<&'a str> {
    names.into_iter().filter(|n| n.starts_with(prefix)).max()
}

/// Absolute URLs of every `href` in `html`, resolved against `base`.
pub(crate) fn extract_links(html: &str, base: &str) -> Vec<String> {
    static HREF: OnceLock<Regex> = OnceLock::new();
    let re = HREF.get_or_init(|| Regex::new(r#"href=["']([^"']+)["']"#).expect("valid regex"));
    let base = Url::parse(base).ok();

    re.captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().replace("&amp;", "&"))
        .filter_map(|href| {
            if href.starts_with("http://") || href.starts_with("https://") {
                Some(href)
            } else {
                base.as_ref()
                    .and_then(|b| b.join(&href).ok())
                    .map(String::from)
            }
        })
        .collect()
}

/// The last path segment of a URL, without query string.
pub(crate) fn file_name_of(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

pub(crate) fn no_feed(chain_alias: &str, store_code: &str, kind: &str) -> AcquisitionError {
    AcquisitionError::FeedUnavailable {
        context: format!("{chain_alias} store {store_code}"),
        reason: format!("no {kind} file listed"),
    }
}

/// Joins a base URL and a path segment with exactly one slash.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
