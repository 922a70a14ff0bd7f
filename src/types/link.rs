// ABOUTME: URL normalization for deployment and log links.
// ABOUTME: The provider reports bare hosts; consumers need an explicit scheme.

/// Scheme prefixed onto bare hosts.
pub const DEFAULT_SCHEME: &str = "https";

/// Normalize a provider-supplied URL so that it carries an explicit scheme.
///
/// Bare hosts and host/path pairs (`my-app-abc.now.sh/path`) get `https://`
/// prepended; values that already have a scheme are kept as-is. Surrounding
/// whitespace is trimmed and an empty input stays empty.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if has_scheme(trimmed) {
        return trimmed.to_string();
    }

    let host = trimmed.trim_start_matches('/');
    format!("{DEFAULT_SCHEME}://{host}")
}

fn has_scheme(value: &str) -> bool {
    match value.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
