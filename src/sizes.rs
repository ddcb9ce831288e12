//! Output size list parsing.
//!
//! A size list is a comma-separated string of entries:
//!
//! ```text
//! source            # label "source", no resize
//! 500               # label "500", 500px wide
//! thumb=200         # label "thumb", 200px wide
//! full=0            # label "full", no resize
//! ```
//!
//! Labels become directory names under the output root, so they may not
//! contain path separators. A repeated label replaces the earlier entry.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reserved label meaning "emit at the composited width".
pub const SOURCE_LABEL: &str = "source";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeListError {
    #[error("size list has no entries")]
    Empty,
    #[error("invalid width in size entry {entry:?}")]
    InvalidWidth { entry: String },
    #[error("invalid size label {label:?}")]
    InvalidLabel { label: String },
}

/// Named output widths. Width `0` means no resize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeRequests(BTreeMap<String, u32>);

impl SizeRequests {
    pub fn parse(list: &str) -> Result<Self, SizeListError> {
        let mut sizes = BTreeMap::new();

        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (label, width) = parse_entry(entry)?;
            sizes.insert(label, width);
        }

        if sizes.is_empty() {
            return Err(SizeListError::Empty);
        }
        Ok(Self(sizes))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(label, width)| (label.as_str(), *width))
    }

    pub fn width(&self, label: &str) -> Option<u32> {
        self.0.get(label).copied()
    }
}

fn parse_entry(entry: &str) -> Result<(String, u32), SizeListError> {
    let (label, width) = match entry.split_once('=') {
        Some((label, width)) => {
            let width = width.trim().parse::<u32>().map_err(|_| SizeListError::InvalidWidth {
                entry: entry.to_string(),
            })?;
            (label.trim(), width)
        }
        None if entry == SOURCE_LABEL => (entry, 0),
        None => {
            let width = entry.parse::<u32>().map_err(|_| SizeListError::InvalidWidth {
                entry: entry.to_string(),
            })?;
            (entry, width)
        }
    };

    validate_label(label)?;
    Ok((label.to_string(), width))
}

fn validate_label(label: &str) -> Result<(), SizeListError> {
    let bad = label.is_empty()
        || label == "."
        || label == ".."
        || label.contains(['/', '\\'])
        || label.chars().any(char::is_control);
    if bad {
        return Err(SizeListError::InvalidLabel {
            label: label.to_string(),
        });
    }
    Ok(())
}

impl FromStr for SizeRequests {
    type Err = SizeListError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SizeRequests {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .iter()
            .map(|(label, width)| match (label, width) {
                (SOURCE_LABEL, 0) => SOURCE_LABEL.to_string(),
                (l, w) if l == w.to_string() => l.to_string(),
                (l, w) => format!("{l}={w}"),
            })
            .collect();
        write!(f, "{}", entries.join(","))
    }
}
