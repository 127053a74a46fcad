//! Error types for layout planning, decoding and encoding.
//!
//! The three families map onto the three phases of a codec call:
//!
//! - [`SchemaError`] - a type's declared layout is malformed. Raised when the
//!   type plan is first built and cached, so every later call for the same
//!   type fails the same way.
//! - [`ParseError`] - input text does not match the layout.
//! - [`FormatError`] - a value cannot be written into its declared columns.
//!
//! [`TransformError`] is the narrow error a single value conversion returns;
//! the reader and writer wrap it with the member and line it happened on.

use thiserror::Error;

/// A value conversion failed inside a [`Transform`](crate::Transform).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The text could not be parsed into the target type.
    #[error("{0}")]
    Invalid(String),

    /// The value has no exact representation in the configured format.
    #[error("value cannot be represented without truncation: {0}")]
    Truncation(String),

    /// The value contains a character a fixed-width line cannot carry.
    #[error("unsupported character {0:?}")]
    UnsupportedChar(char),
}

impl TransformError {
    pub fn invalid(message: impl Into<String>) -> Self {
        TransformError::Invalid(message.into())
    }
}

/// A type's declared layout cannot be turned into a type plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{type_name}: type declares no fields")]
    Empty { type_name: &'static str },

    #[error("{type_name}.{member}: duplicate order index {order}")]
    DuplicateOrder {
        type_name: &'static str,
        member: &'static str,
        order: u32,
    },

    #[error("{type_name}.{member}: width must be omitted for composite members")]
    CompositeWidth {
        type_name: &'static str,
        member: &'static str,
    },

    #[error("{type_name}.{member}: scalar members need a positive width")]
    MissingWidth {
        type_name: &'static str,
        member: &'static str,
    },

    #[error("{type_name}.{member}: constant {value:?} does not fit in {width} columns")]
    ConstantOverflow {
        type_name: &'static str,
        member: &'static str,
        value: String,
        width: usize,
    },

    #[error(
        "{type_name}.{member}: multi-line member cannot share a type with scalar fields"
    )]
    MixedShape {
        type_name: &'static str,
        member: &'static str,
    },

    #[error(
        "{type_name}.{member}: repeated group is followed by `{follower}`, which has no sentinel"
    )]
    UnclassifiableTrailer {
        type_name: &'static str,
        member: &'static str,
        follower: &'static str,
    },

    #[error("{type_name}: layout refers back to itself")]
    Recursive { type_name: &'static str },
}

/// Input text does not match the layout being decoded.
///
/// Line numbers are 1-based positions in the original input, blank lines
/// included.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(
        "line {line}: `{member}` spans columns {offset}..{} but the line has {len} characters",
        .offset + .width
    )]
    ShortLine {
        line: usize,
        member: &'static str,
        offset: usize,
        width: usize,
        len: usize,
    },

    #[error(
        "line {line}: unexpected sentinel value {found:?} for `{member}`, expected {expected:?}"
    )]
    UnexpectedSentinel {
        line: usize,
        member: &'static str,
        expected: String,
        found: String,
    },

    #[error("line {line}: cannot decode `{member}` from {text:?}: {source}")]
    InvalidValue {
        line: usize,
        member: &'static str,
        text: String,
        source: TransformError,
    },

    #[error("line {line}: slots of `{member}` disagree ({first:?} vs {other:?})")]
    SlotConflict {
        line: usize,
        member: &'static str,
        first: String,
        other: String,
    },

    #[error(
        "line {line}: missing trailer for `{member}` (expected a line starting with {sentinel:?})"
    )]
    MissingTrailer {
        line: usize,
        member: &'static str,
        sentinel: String,
    },

    #[error("line {line}: expected a `{type_name}` record but the input ended")]
    UnexpectedEnd {
        line: usize,
        type_name: &'static str,
    },

    #[error("line {line}: element of `{member}` consumed no input")]
    NoProgress { line: usize, member: &'static str },

    #[error("line {line}: {count} line(s) left over after the last record")]
    TrailingInput { line: usize, count: usize },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// A value cannot be written into its declared columns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error(
        "field overflow for {member}: {value:?} needs {len} columns but only {width} are declared"
    )]
    Overflow {
        member: &'static str,
        value: String,
        len: usize,
        width: usize,
    },

    #[error("cannot encode `{member}`: {source}")]
    Rejected {
        member: &'static str,
        source: TransformError,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Any error the codec can return.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Format(#[from] FormatError),
}
