//! URL helper functions used throughout the crawler.
//!
//! These are deliberate string transforms rather than a general URL library:
//! the crawler treats `host` as everything up to the first `/` (ports
//! included) and resolves relative links by directory concatenation without
//! dot-segment normalization, so filenames and dedup keys stay stable.

use std::sync::LazyLock;

use regex::Regex;

/// Longest filename the store will generate.
const MAX_FILENAME_LEN: usize = 240;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*)://([^/]+)(/.*)?$").expect("URL regex is valid")
});

static INVALID_FILENAME_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("filename regex is valid"));

/// Components of a parsed URL. Scheme and host are lowercased; the path
/// always starts with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: String,
    pub host: String,
    pub path: String,
}

/// Parse `scheme://host[/path…]` into its components.
///
/// The host is everything between `://` and the next `/`, so a port stays
/// part of the host and is compared as part of the domain filter.
pub fn parse(url: &str) -> Option<UrlParts> {
    let caps = URL_PATTERN.captures(url)?;
    Some(UrlParts {
        scheme: caps[1].to_ascii_lowercase(),
        host: caps[2].to_ascii_lowercase(),
        path: caps
            .get(3)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "/".to_string()),
    })
}

/// Remove the fragment portion (everything from the first `#`).
pub fn strip_fragment(url: &str) -> &str {
    match url.find('#') {
        Some(pos) => &url[..pos],
        None => url,
    }
}

/// Resolve an href against its base URL, returning a fragment-free absolute
/// URL, or `None` when the link is empty, non-navigational, or the base
/// cannot be parsed.
pub fn resolve(base_url: &str, href: &str) -> Option<String> {
    let link = href.trim();
    if link.is_empty() {
        return None;
    }
    if link.starts_with("mailto:") || link.starts_with("javascript:") {
        return None;
    }
    if link.starts_with("http://") || link.starts_with("https://") {
        return Some(strip_fragment(link).to_string());
    }
    if let Some(schemeless) = link.strip_prefix("//") {
        let base = parse(base_url)?;
        return Some(format!("{}://{}", base.scheme, strip_fragment(schemeless)));
    }

    let base = parse(base_url)?;
    let path = if link.starts_with('/') {
        link.to_string()
    } else {
        // Relative links join the directory of the base path, keeping any
        // dot segments as-is.
        let directory = match base.path.rfind('/') {
            Some(pos) => &base.path[..=pos],
            None => "/",
        };
        format!("{}{}", directory, link)
    };

    let absolute = format!("{}://{}{}", base.scheme, base.host, path);
    Some(strip_fragment(&absolute).to_string())
}

/// Lowercased dotted extension of the URL's filename, ignoring query and
/// fragment. Empty when the filename has no dot.
pub fn extension_of(url: &str) -> String {
    let clean = strip_fragment(url);
    let clean = match clean.find('?') {
        Some(pos) => &clean[..pos],
        None => clean,
    };
    let filename = match clean.rfind('/') {
        Some(pos) => &clean[pos + 1..],
        None => clean,
    };
    match filename.rfind('.') {
        Some(pos) => filename[pos..].to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Whether the URL's query string marks it as a forced download.
pub fn query_indicates_download(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.contains("format=pdf") || lower.contains("format=doc") || lower.contains("download=1")
}

/// Build a filesystem-safe artifact name of the form `prefix__host_path`.
///
/// The extension is appended only when the name does not already contain it,
/// runs of characters outside `[A-Za-z0-9._-]` collapse to a single `_`, and
/// the result is capped at 240 characters.
pub fn sanitize_filename(parts: &UrlParts, extension: &str, prefix: &str) -> String {
    let path = if parts.path.is_empty() || parts.path == "/" {
        "/index"
    } else {
        parts.path.as_str()
    };
    let flattened = path.replace('/', "_");

    let mut name = format!("{}__{}{}", prefix, parts.host, flattened);
    if !extension.is_empty() && !name.contains(extension) {
        name.push_str(extension);
    }

    let mut name = INVALID_FILENAME_RUN.replace_all(&name, "_").into_owned();
    // All remaining characters are ASCII, so a byte truncation is safe.
    if name.len() > MAX_FILENAME_LEN {
        name.truncate(MAX_FILENAME_LEN);
    }
    name
}
