//! Input validation for long URLs and user-chosen short codes.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Codes that would shadow service endpoints. Compared case-insensitively.
const RESERVED_CODES: &[&str] = &["admin", "api", "health", "www", "root", "login", "status"];

static CUSTOM_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\-_.]{4,10}$").unwrap());

/// Validates a long URL.
///
/// The URL must be absolute, use the `http` or `https` scheme and carry a
/// non-empty host. Returns the rejection reason on failure.
///
/// The stored string is sent back verbatim as a `Location` header, so input
/// that the parser would have to repair is rejected rather than fixed up:
/// surrounding whitespace, characters outside printable ASCII, and a scheme
/// not followed by `//`.
///
/// # Examples
///
/// ```ignore
/// assert!(validate_long_url("https://example.com/a").is_ok());
/// assert!(validate_long_url("ftp://example.com").is_err());
/// assert!(validate_long_url("/relative/path").is_err());
/// assert!(validate_long_url("http:example.com").is_err());
/// ```
pub fn validate_long_url(input: &str) -> Result<(), String> {
    if input.trim() != input {
        return Err("URL must not have leading or trailing whitespace".to_string());
    }

    if !input.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(
            "URL must contain only printable ASCII; percent-encode other characters".to_string(),
        );
    }

    let url = Url::parse(input).map_err(|e| format!("invalid URL: {e}"))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported URL scheme: {other}")),
    }

    // the parser accepts `http:host` and `http:/host` and fills in the slashes
    let has_authority = input
        .split_once(':')
        .is_some_and(|(_, rest)| rest.starts_with("//"));
    if !has_authority {
        return Err("URL must have the form scheme://host".to_string());
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err("URL must have a host".to_string()),
    }
}

/// Validates a user-provided custom short code.
///
/// # Rules
///
/// - 4-10 characters from `A-Z a-z 0-9 - _ .`
/// - Not a reserved word (case-insensitive)
/// - Not purely numeric
pub fn validate_custom_code(code: &str) -> Result<(), String> {
    if !CUSTOM_CODE_RE.is_match(code) {
        return Err(
            "custom code must be 4-10 characters of letters, digits, '-', '_' or '.'".to_string(),
        );
    }

    if RESERVED_CODES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(code))
    {
        return Err(format!("custom code '{code}' is reserved"));
    }

    if code.bytes().all(|b| b.is_ascii_digit()) {
        return Err("custom code cannot be purely numeric".to_string());
    }

    Ok(())
}
