//! Turning URL bar input into something a session can load.

use crate::shell::config::ShellConfig;
use url::form_urlencoded;

const URL_PREFIXES: [&str; 4] = ["http://", "https://", "about:", "file://"];

/// Does the (trimmed) input look like an address rather than a search query?
pub fn looks_like_url(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    if URL_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return true;
    }

    text.contains('.') && !text.contains(' ')
}

/// Resolve URL bar input to the URL to load.
///
/// Addresses with a scheme and `about:` URIs are used as typed, other addresses get
/// `https://`. Everything else is sent to the configured search provider. Returns `None`
/// for blank input.
///
/// ```
/// use tabshell::config::ShellConfig;
/// use tabshell::input::resolve_input;
///
/// let cfg = ShellConfig::default();
/// assert_eq!(resolve_input("example.com", &cfg).as_deref(), Some("https://example.com"));
/// assert_eq!(
///     resolve_input("rust lang", &cfg).as_deref(),
///     Some("https://www.google.com/search?q=rust+lang")
/// );
/// assert_eq!(resolve_input("   ", &cfg), None);
/// ```
pub fn resolve_input(text: &str, config: &ShellConfig) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if looks_like_url(text) {
        if text.contains("://") || text.to_ascii_lowercase().starts_with("about:") {
            return Some(text.to_string());
        }
        return Some(format!("https://{text}"));
    }

    let query: String = form_urlencoded::byte_serialize(text.as_bytes()).collect();
    Some(format!("{}{}", config.search_url, query))
}
