//! Absolute and relative node addresses.
//!
//! Nodes are named by position, not by identity. An [`Address`] is a path from the
//! root snippet: below a snippet scope a segment is a tabstop index, below a choice
//! it is a 1-based branch number. `[2, 2]` therefore names "branch 2 of the choice
//! at tabstop 2". The empty address names the root snippet itself.
//!
//! Function nodes refer to their arguments with an [`ArgRef`], either relative (a
//! tabstop in the nearest enclosing snippet scope) or absolute.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::SnipError;

/// Path of segments from the root snippet to a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(Vec<u32>);

impl Address {
    /// The address of the root snippet.
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Create an address from its segments.
    pub fn new(segments: impl Into<Vec<u32>>) -> Self {
        Self(segments.into())
    }

    /// The segments of this address.
    pub fn segments(&self) -> &[u32] {
        &self.0
    }

    /// Whether this is the root address.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Extend the address by one segment.
    #[must_use]
    pub fn child(&self, segment: u32) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }
}

impl From<u32> for Address {
    fn from(index: u32) -> Self {
        Self(vec![index])
    }
}

impl From<Vec<u32>> for Address {
    fn from(segments: Vec<u32>) -> Self {
        Self(segments)
    }
}

impl From<&[u32]> for Address {
    fn from(segments: &[u32]) -> Self {
        Self(segments.to_vec())
    }
}

impl<const N: usize> From<[u32; N]> for Address {
    fn from(segments: [u32; N]) -> Self {
        Self(segments.to_vec())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "[]");
        }
        for segment in &self.0 {
            write!(f, "[{segment}]")?;
        }
        Ok(())
    }
}

/// Parses `2.2`, `[2][2]` or `root`.
impl FromStr for Address {
    type Err = SnipError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == "root" || trimmed == "[]" {
            return Ok(Self::root());
        }

        let normalized = trimmed.replace("][", ".").replace(['[', ']'], "");
        normalized
            .split('.')
            .map(|part| {
                part.trim().parse::<u32>().map_err(|e| SnipError::InvalidAddress {
                    input: input.to_string(),
                    reason: format!("segment '{part}' is not a number ({e})"),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// Argument reference of a function node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgRef {
    /// Tabstop index in the nearest enclosing snippet scope.
    Relative(u32),
    /// Path from the root snippet.
    Absolute(Address),
}

impl ArgRef {
    /// Shorthand for a relative reference.
    pub const fn rel(index: u32) -> Self {
        Self::Relative(index)
    }

    /// Shorthand for an absolute reference.
    pub fn abs(address: impl Into<Address>) -> Self {
        Self::Absolute(address.into())
    }
}

impl From<u32> for ArgRef {
    fn from(index: u32) -> Self {
        Self::Relative(index)
    }
}

impl From<Address> for ArgRef {
    fn from(address: Address) -> Self {
        Self::Absolute(address)
    }
}

impl fmt::Display for ArgRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relative(index) => write!(f, "{index}"),
            Self::Absolute(address) => write!(f, "ai{address}"),
        }
    }
}
