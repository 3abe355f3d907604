//! Whole-document parsing, single-package merging and serialization.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use super::block::Block;
use super::fields;

/// What [`Manifest::update`] did with the package block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// An existing block with the same `PATH` was replaced in place.
    Replaced,

    /// No block with that `PATH` existed; the incoming one was appended.
    Appended,

    /// The incoming manifest had no block for the path; only the header moved.
    HeaderOnly,
}

/// A parsed package index.
///
/// Block 0 is the header, blocks 1.. are package blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    blocks: Vec<Block>,
}

impl Manifest {
    /// Parse index text.
    ///
    /// Whitespace-only lines separate blocks. Runs of separators, as well as
    /// leading and trailing ones, never produce empty blocks, so text with and
    /// without a trailing newline parses the same.
    ///
    /// # Example
    ///
    /// ```
    /// use binhost::manifest::Manifest;
    ///
    /// let manifest = Manifest::parse("\nPACKAGES: 1\n\n\nPATH: a/b-1.tbz2\n\n");
    ///
    /// assert_eq!(manifest.len(), 2);
    /// assert_eq!(manifest.packages()[0].path(), Some("a/b-1.tbz2"));
    /// ```
    pub fn parse(text: &str) -> Self {
        let mut blocks = Vec::new();
        let mut current = Block::new();

        for line in text.split('\n') {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    blocks.push(std::mem::take(&mut current));
                }
            } else {
                current.push_line(line);
            }
        }

        if !current.is_empty() {
            blocks.push(current);
        }

        Self { blocks }
    }

    /// Create a manifest from already assembled blocks.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// All blocks, header first.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of blocks, header included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if the document has no blocks at all.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The global header block.
    pub fn header(&self) -> Option<&Block> {
        self.blocks.first()
    }

    /// The package blocks, in document order.
    pub fn packages(&self) -> &[Block] {
        self.blocks.get(1..).unwrap_or(&[])
    }

    /// Number of package blocks.
    pub fn package_count(&self) -> usize {
        self.blocks.len().saturating_sub(1)
    }

    /// Find the package block whose `PATH` equals `path`.
    pub fn find_package(&self, path: &str) -> Option<&Block> {
        self.packages().iter().find(|b| b.path() == Some(path))
    }

    /// Merge a single package from `other` into this manifest.
    ///
    /// The header is replaced wholesale by `other`'s header. Then the block of
    /// `other` with `PATH == package_path` replaces the block with the same
    /// path here, keeping its position, or is appended if there is none.
    /// Other package blocks are never touched.
    pub fn update(&mut self, other: &Manifest, package_path: &str) -> MergeAction {
        if let Some(header) = other.header() {
            match self.blocks.first_mut() {
                Some(own) => own.clone_from(header),
                None => self.blocks.push(header.clone()),
            }
        }

        let Some(incoming) = other.find_package(package_path) else {
            return MergeAction::HeaderOnly;
        };

        let existing = self
            .blocks
            .iter()
            .skip(1)
            .position(|b| b.path() == Some(package_path));

        match existing {
            Some(index) => {
                self.blocks[index + 1] = incoming.clone();
                MergeAction::Replaced
            }
            None => {
                self.blocks.push(incoming.clone());
                MergeAction::Appended
            }
        }
    }

    /// Serialize the manifest.
    ///
    /// The header `PACKAGES` field is first set to the number of package
    /// blocks. Blocks are written in order, each line newline-terminated, with
    /// one blank line between blocks.
    pub fn build(&mut self) -> String {
        let count = self.package_count().to_string();
        if let Some(header) = self.blocks.first_mut() {
            header.set(fields::PACKAGES, &count);
        }
        self.to_string()
    }
}

impl FromStr for Manifest {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Renders the blocks as they are, without recomputing `PACKAGES`.
impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", block)?;
        }
        Ok(())
    }
}
