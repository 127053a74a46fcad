//! Fixed-width lines and column arithmetic.
//!
//! Columns are 0-based and widths count characters, not bytes. Inputs are
//! expected to be single-byte text, but slicing stays on character
//! boundaries either way.

use std::fmt;

use crate::error::FormatError;
use crate::layout::Alignment;

/// One fixed-width line, either read from input or produced by the writer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Record {
    data: String,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(width: usize) -> Self {
        Self {
            data: String::with_capacity(width),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    pub fn into_string(self) -> String {
        self.data
    }

    /// Width of the line in characters.
    pub fn len(&self) -> usize {
        self.data.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The `len` columns starting at `pos`, or `None` if the line is too short.
    pub fn field(&self, pos: usize, len: usize) -> Option<&str> {
        slice(&self.data, pos, len)
    }

    /// Append `text` padded to exactly `width` columns.
    pub fn push_field(
        &mut self,
        member: &'static str,
        text: &str,
        width: usize,
        pad: char,
        align: Alignment,
    ) -> Result<(), FormatError> {
        let len = text.chars().count();
        if len > width {
            return Err(FormatError::Overflow {
                member,
                value: text.to_string(),
                len,
                width,
            });
        }
        let fill = width - len;
        match align {
            Alignment::Left => {
                self.data.push_str(text);
                self.data.extend(std::iter::repeat_n(pad, fill));
            }
            Alignment::Right => {
                self.data.extend(std::iter::repeat_n(pad, fill));
                self.data.push_str(text);
            }
        }
        Ok(())
    }
}

impl From<&str> for Record {
    fn from(line: &str) -> Self {
        Self {
            data: line.to_string(),
        }
    }
}

impl From<String> for Record {
    fn from(data: String) -> Self {
        Self { data }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data)
    }
}

/// Slice `len` characters of `line` starting at column `pos`.
///
/// Returns `None` when the line ends before `pos + len`.
pub fn slice(line: &str, pos: usize, len: usize) -> Option<&str> {
    if line.is_ascii() {
        return line.get(pos..pos.checked_add(len)?);
    }
    let mut bounds = line
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(line.len()));
    let start = bounds.nth(pos)?;
    let end = if len == 0 {
        start
    } else {
        bounds.nth(len - 1)?
    };
    Some(&line[start..end])
}

/// Remove pad characters from the side alignment put them on.
///
/// Left-aligned values carry trailing pad, right-aligned values leading pad.
pub fn strip(text: &str, pad: char, align: Alignment) -> &str {
    match align {
        Alignment::Left => text.trim_end_matches(pad),
        Alignment::Right => text.trim_start_matches(pad),
    }
}
