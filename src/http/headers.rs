//! Ordered, text-addressable header store.
//!
//! # Responsibilities
//! - Hold request headers as an ordered list of lines
//! - Expose the flat `"Name: Value\r\n"` text form to hooks
//! - Case-insensitive lookup and first-match mutation
//!
//! # Design Decisions
//! - Duplicate names are separate lines; order is wire order
//! - `set`/`remove` only touch the first matching line, other lines with the
//!   same name are left as they are
//! - Stored names are never re-cased
//! - Lines without a `": "` separator are kept verbatim but never match

use std::fmt;
use std::str::FromStr;

/// Line terminator of the text form.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Separator between name and value within a line.
pub const NAME_VALUE_SEPARATOR: &str = ": ";

/// A single line of the header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLine {
    /// A `Name: Value` line.
    Field { name: String, value: String },
    /// A line that has no `": "` separator.
    Malformed(String),
}

impl HeaderLine {
    /// Parse one line (without terminator), splitting on the first `": "`.
    pub fn parse(line: &str) -> Self {
        match line.split_once(NAME_VALUE_SEPARATOR) {
            Some((name, value)) => HeaderLine::Field {
                name: name.to_string(),
                value: value.to_string(),
            },
            None => HeaderLine::Malformed(line.to_string()),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            HeaderLine::Field { name: stored, .. } => stored.eq_ignore_ascii_case(name),
            HeaderLine::Malformed(_) => false,
        }
    }
}

impl fmt::Display for HeaderLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderLine::Field { name, value } => write!(f, "{}{}{}", name, NAME_VALUE_SEPARATOR, value),
            HeaderLine::Malformed(raw) => f.write_str(raw),
        }
    }
}

/// Ordered header lines of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBlock {
    lines: Vec<HeaderLine>,
}

impl HeaderBlock {
    /// Create an empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line at the end, even if the name already exists.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.lines.push(HeaderLine::Field {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Value of the first line whose name matches, or `default`.
    pub fn get(&self, name: &str, default: &str) -> String {
        self.find(name)
            .and_then(|idx| match &self.lines[idx] {
                HeaderLine::Field { value, .. } => Some(value.clone()),
                HeaderLine::Malformed(_) => None,
            })
            .unwrap_or_else(|| default.to_string())
    }

    /// Replace the value of the first matching line, or append a new line.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.find(name) {
            Some(idx) => {
                if let HeaderLine::Field { value: stored, .. } = &mut self.lines[idx] {
                    *stored = value.to_string();
                }
            }
            None => self.append(name, value),
        }
    }

    /// Remove the first matching line. No-op if absent.
    pub fn remove(&mut self, name: &str) {
        if let Some(idx) = self.find(name) {
            self.lines.remove(idx);
        }
    }

    /// Well-formed `(name, value)` pairs in order. Malformed lines are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            HeaderLine::Field { name, value } => Some((name.as_str(), value.as_str())),
            HeaderLine::Malformed(_) => None,
        })
    }

    /// Number of lines, malformed ones included.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.lines.iter().position(|line| line.matches(name))
    }
}

impl fmt::Display for HeaderBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            write!(f, "{}{}", line, LINE_TERMINATOR)?;
        }
        Ok(())
    }
}

impl FromStr for HeaderBlock {
    type Err = std::convert::Infallible;

    /// Parse the flat text form. Blank lines are dropped.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let lines = text
            .split(LINE_TERMINATOR)
            .filter(|line| !line.is_empty())
            .map(HeaderLine::parse)
            .collect();
        Ok(Self { lines })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(text: &str) -> HeaderBlock {
        text.parse().unwrap()
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let headers = block("Accept: */*\r\nX-Token: abc\r\n");
        assert_eq!(headers.get("x-token", "none"), "abc");
        assert_eq!(headers.get("X-TOKEN", "none"), "abc");
        assert_eq!(headers.get("missing", "none"), "none");
    }

    #[test]
    fn test_set_replaces_first_duplicate_only() {
        let mut headers = block("X-A: 1\r\nX-A: 2\r\n");
        headers.set("x-a", "9");
        assert_eq!(headers.to_string(), "X-A: 9\r\nX-A: 2\r\n");
    }

    #[test]
    fn test_set_appends_with_caller_case() {
        let mut headers = block("Accept: */*\r\n");
        headers.set("X-Forwarded-For", "10.0.0.1");
        assert_eq!(headers.to_string(), "Accept: */*\r\nX-Forwarded-For: 10.0.0.1\r\n");
    }

    #[test]
    fn test_remove_first_match() {
        let mut headers = block("Cookie: a=1\r\nAccept: */*\r\nCookie: b=2\r\n");
        headers.remove("COOKIE");
        assert_eq!(headers.to_string(), "Accept: */*\r\nCookie: b=2\r\n");

        headers.remove("not-there");
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_value_may_contain_separator() {
        let headers = block("Referer: http://a: b\r\n");
        assert_eq!(headers.get("referer", ""), "http://a: b");
    }

    #[test]
    fn test_malformed_lines_are_kept_but_never_match() {
        let text = "garbage\r\nHost: example.com\r\n";
        let headers = block(text);

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("garbage", "default"), "default");
        assert_eq!(headers.iter().count(), 1);
        assert_eq!(headers.to_string(), text);
    }

    #[test]
    fn test_blank_lines_dropped() {
        let headers = block("A: 1\r\n\r\nB: 2\r\n");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.to_string(), "A: 1\r\nB: 2\r\n");
    }
}
