//! Scrubs credentials, connection strings and filesystem paths out of error
//! text before it is logged or handed back to a caller.

use regex::Regex;
use std::sync::LazyLock;

/// URL with embedded user:password
static CREDENTIAL_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[a-zA-Z][a-zA-Z0-9+.-]*://[^\s/@:]+:[^\s/@]+@\S+").unwrap()
});

/// key=value or key: value where the key names a secret
static SECRET_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(macaroon|password|passwd|secret|token|api[_-]?key|auth(?:orization)?)(\s*[=:]\s*)[^\s,;]+",
    )
    .unwrap()
});

/// Long hex blobs (serialized macaroons, raw keys). Pubkeys are 66 chars and survive.
static LONG_HEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9a-fA-F]{96,}\b").unwrap());

/// Absolute or relative paths with at least two segments
static PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(^|[\s'"(=])((?:~|\.{1,2})?(?:/[\w.-]+){2,}/?)"#).unwrap()
});

/// Redact sensitive fragments from a message.
pub fn sanitize(message: &str) -> String {
    let out = CREDENTIAL_URL_RE.replace_all(message, "[REDACTED_URL]");
    let out = SECRET_PAIR_RE.replace_all(&out, "${1}${2}[REDACTED]");
    let out = LONG_HEX_RE.replace_all(&out, "[REDACTED_HEX]");
    let out = PATH_RE.replace_all(&out, "${1}[REDACTED_PATH]");
    out.into_owned()
}

/// Sanitized `{:#}` rendering of an error chain.
pub fn error_message(err: &anyhow::Error) -> String {
    sanitize(&format!("{:#}", err))
}
