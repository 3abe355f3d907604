//! A single record of the package index.

use std::fmt;

use super::fields;

/// One blank-line-delimited record of the package index.
///
/// A block is semantically a set of `KEY: value` fields but is stored as the
/// raw lines it was parsed from. Lines that are not recognized (comments,
/// unknown fields, continuation text) are kept verbatim and in order.
///
/// # Example
///
/// ```
/// use binhost::manifest::Block;
///
/// let mut block = Block::from_lines(["CPV: app-misc/foo-1.0", "SIZE: 1024"]);
///
/// assert_eq!(block.get("CPV"), Some("app-misc/foo-1.0"));
/// assert_eq!(block.get("PATH"), None);
///
/// block.set("PATH", "app-misc/foo-1.0.tbz2");
/// assert_eq!(block.lines().last().map(String::as_str), Some("PATH: app-misc/foo-1.0.tbz2"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    lines: Vec<String>,
}

impl Block {
    /// Create an empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a block from raw lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Raw lines of the block, in document order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Append a raw line.
    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Number of lines in the block.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if the block holds no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Look up a field value.
    ///
    /// Returns the trimmed text after the colon of the first line that starts
    /// with `key:`. A line such as `PATHS: x` does not match the key `PATH`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| field_value(line, key))
    }

    /// Set a field value.
    ///
    /// Every line starting with `key:` is rewritten to `key: value`. If there
    /// is no such line, one is appended to the end of the block.
    pub fn set(&mut self, key: &str, value: &str) {
        let line = format!("{}: {}", key, value);
        let mut found = false;

        for existing in self
            .lines
            .iter_mut()
            .filter(|l| field_value(l, key).is_some())
        {
            existing.clone_from(&line);
            found = true;
        }

        if !found {
            self.lines.push(line);
        }
    }

    /// The `PATH` field of a package block.
    pub fn path(&self) -> Option<&str> {
        self.get(fields::PATH)
    }

    /// The `CPV` field of a package block.
    pub fn cpv(&self) -> Option<&str> {
        self.get(fields::CPV)
    }

    /// The `PACKAGES` count of a header block, if present and numeric.
    pub fn package_count(&self) -> Option<usize> {
        self.get(fields::PACKAGES).and_then(|v| v.parse().ok())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Value of `line` if it carries the field `key`.
fn field_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.strip_prefix(key)?.strip_prefix(':').map(str::trim)
}
