//! Input validation and sanitisation helpers.
//!
//! None of these form a security boundary on their own; they reject obviously
//! malformed input before it reaches storage, logs or the network.

use rand::RngCore;
use url::Url;

/// Maximum accepted length of an email address.
const MAX_EMAIL_LEN: usize = 254;

/// Escapes characters with meaning in HTML.
pub fn sanitize_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '/' => escaped.push_str("&#x2F;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Checks that `email` looks like `local@domain.tld`.
///
/// Accepts exactly one `@`, no whitespace, a non-empty local part and a
/// domain containing a dot with characters on both sides.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Trims, truncates to `max_len` characters and strips angle brackets.
pub fn sanitize_form_input(input: &str, max_len: usize) -> String {
    input
        .trim()
        .chars()
        .take(max_len)
        .filter(|c| !matches!(c, '<' | '>'))
        .collect()
}

/// Parses `url`, accepting only the `http` and `https` schemes.
pub fn parse_http_url(url: &str) -> Option<Url> {
    Url::parse(url)
        .ok()
        .filter(|parsed| matches!(parsed.scheme(), "http" | "https"))
}

/// Returns true if `url` parses with an `http` or `https` scheme.
pub fn is_valid_url(url: &str) -> bool {
    parse_http_url(url).is_some()
}

/// Generates 16 random bytes rendered as 32 lowercase hex characters.
pub fn generate_secure_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}
