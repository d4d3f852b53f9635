//! Cache keys for rendered images.
//!
//! Keys are derived from the claims by replacing every character outside
//! `[A-Za-z0-9_]` with `-`:
//!
//! ```text
//! title="Hello World!"                 →  Hello-World-.png
//! title="A", description="B C"         →  A___B-C.png
//! ```
//!
//! Replacement happens per UTF-16 code unit, so `é` becomes `-` and an emoji
//! becomes `--`. Claims with identical sanitized forms share a key.

use std::fmt;

use crate::token::Claims;

/// Separator between the sanitized title and description.
const DESCRIPTION_SEPARATOR: &str = "___";

/// Extension appended to every key.
const KEY_EXTENSION: &str = ".png";

/// Cache key identifying a rendered image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a set of claims.
    ///
    /// An empty description is treated as absent.
    pub fn from_claims(claims: &Claims) -> Self {
        let mut key = sanitize(&claims.title);
        if let Some(description) = claims.effective_description() {
            key.push_str(DESCRIPTION_SEPARATOR);
            key.push_str(&sanitize(description));
        }
        key.push_str(KEY_EXTENSION);
        CacheKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Replace every non-word character with `-`, once per UTF-16 code unit.
pub fn sanitize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            for _ in 0..c.len_utf16() {
                out.push('-');
            }
        }
    }
    out
}
