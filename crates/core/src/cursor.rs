//! Slice cursor: pulls delimiter-separated tokens off the front of a line
//! without splitting it into an owned array.

/// Remaining, not yet consumed part of a line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    pub fn new(rest: &'a str) -> Self {
        Self { rest }
    }

    /// Take everything up to the first `delimiter` and move past it.
    /// Without a delimiter the whole remainder is returned and the cursor
    /// becomes empty.
    pub fn take_until(&mut self, delimiter: char) -> &'a str {
        match self.rest.find(delimiter) {
            Some(p) => {
                let token = &self.rest[..p];
                self.rest = &self.rest[p + delimiter.len_utf8()..];
                token
            }
            None => std::mem::take(&mut self.rest),
        }
    }

    /// Next whitespace-separated word. Runs of spaces and tabs count as
    /// one separator.
    pub fn next_word(&mut self) -> Option<&'a str> {
        let rest = self.rest.trim_start();
        if rest.is_empty() {
            self.rest = rest;
            return None;
        }
        let end = rest
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(rest.len());
        self.rest = &rest[end..];
        Some(&rest[..end])
    }

    /// Consume a single leading `c`, returning whether it was there.
    pub fn eat(&mut self, c: char) -> bool {
        match self.rest.strip_prefix(c) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn rest(&self) -> &'a str {
        self.rest
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = &'a str;

    /// Whitespace-separated words.
    fn next(&mut self) -> Option<&'a str> {
        self.next_word()
    }
}

/// Split a trimmed line into its directive symbol and the rest of the line.
/// Returns `None` for blank lines and `#` comments.
pub fn classify_line(line: &str) -> Option<(&str, Cursor<'_>)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let split = line
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(line.len());
    let symbol = &line[..split];
    let rest = line[split..].trim_start();
    Some((symbol, Cursor::new(rest)))
}
