//! `application/x-www-form-urlencoded` body decoding.

use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use thiserror::Error;

/// Errors from unescaping a form value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    /// A `%` not followed by two hex digits.
    #[error("invalid escape {0:?}")]
    InvalidEscape(String),

    /// Decoded bytes are not UTF-8.
    #[error("decoded value is not valid UTF-8")]
    InvalidUtf8,
}

/// Unescape a query/form value: `+` becomes a space, `%XX` becomes a byte.
pub fn query_unescape(value: &str) -> Result<String, FormError> {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            match escape {
                Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => i += 3,
                _ => {
                    let end = (i + 3).min(bytes.len());
                    return Err(FormError::InvalidEscape(
                        String::from_utf8_lossy(&bytes[i..end]).into_owned(),
                    ));
                }
            }
        } else {
            i += 1;
        }
    }

    let spaced = value.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| FormError::InvalidUtf8)
}

/// Parse `key1=val1&key2=val2`.
///
/// Pairs without `=` are dropped. Values that fail to unescape are kept raw.
/// A repeated key keeps its first position and takes the last value.
pub fn parse_form(body: &str) -> IndexMap<String, String> {
    let mut form = IndexMap::new();
    for part in body.split('&') {
        let Some((key, raw)) = part.split_once('=') else {
            continue;
        };
        let value = query_unescape(raw).unwrap_or_else(|_| raw.to_string());
        form.insert(key.to_string(), value);
    }
    form
}
