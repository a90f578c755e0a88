use std::sync::OnceLock;

use regex::Regex;

// ASCII-only case folding: Unicode folding lets `[a-z]` match the Kelvin sign and long s.
const URL_PATTERN: &str = concat!(
    r"(?i-u)^(https?://)",
    r"((([a-z0-9]([a-z0-9-]*[a-z0-9])*)\.)+[a-z]{2,}|(([0-9]{1,3}\.){3}[0-9]{1,3}))",
    r"(:[0-9]+)?(/[-a-z0-9%_.~+]*)*",
    r"(\?[;&a-z0-9%_.~+=-]*)?",
    r"(#[-a-z0-9_]*)?$",
);

const DOMAIN_PATTERN: &str = r"(?i-u)^(([a-z0-9]([a-z0-9-]*[a-z0-9])*)\.)+[a-z]{2,}$";

static URL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
static DOMAIN_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

fn matches(cell: &'static OnceLock<Option<Regex>>, pattern: &str, candidate: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(candidate))
}

/// Absolute http(s) URL: host name or dotted IPv4, optional port, path, query and fragment.
pub fn is_valid_url(candidate: &str) -> bool {
    matches(&URL_REGEX, URL_PATTERN, candidate)
}

/// Bare host name as entered in the add-domain form.
pub fn is_valid_domain(candidate: &str) -> bool {
    matches(&DOMAIN_REGEX, DOMAIN_PATTERN, candidate)
}
