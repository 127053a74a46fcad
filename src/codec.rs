//! Entry points: whole records to and from text.

use tracing::debug;

use crate::error::{FormatError, ParseError};
use crate::layout::FixedWidth;
use crate::plan::plan;
use crate::reader::LineCursor;
use crate::record::Record;

/// Separator written between encoded lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// How [`encode_with`] joins lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    pub line_ending: LineEnding,
    /// Terminate the last line as well.
    pub final_newline: bool,
}

impl EncodeOptions {
    pub fn crlf(mut self) -> Self {
        self.line_ending = LineEnding::CrLf;
        self
    }

    pub fn with_final_newline(mut self) -> Self {
        self.final_newline = true;
        self
    }
}

/// Decode one `T` from text. Either line ending is accepted.
pub fn decode<T: FixedWidth>(text: &str) -> Result<T, ParseError> {
    decode_lines(text.lines())
}

/// Decode one `T` from pre-split lines.
///
/// Every line must be consumed by `T`, one record line at a time. A single
/// empty last line, left by splitting text that ends in a line terminator,
/// is ignored. Any other empty line is decoded like the rest and fails as a
/// short line.
pub fn decode_lines<'a, T: FixedWidth>(
    lines: impl IntoIterator<Item = &'a str>,
) -> Result<T, ParseError> {
    let plan = plan::<T>()?;
    let mut numbered: Vec<(usize, &str)> = lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| (i + 1, line.strip_suffix('\r').unwrap_or(line)))
        .collect();
    if numbered.last().is_some_and(|(_, line)| line.is_empty()) {
        numbered.pop();
    }

    let mut cursor = LineCursor::new(&numbered);
    let value = plan.decode_record(&mut cursor, &[])?;
    if cursor.remaining() > 0 {
        return Err(ParseError::TrailingInput {
            line: cursor.line_no(),
            count: cursor.remaining(),
        });
    }
    debug!(
        type_name = plan.type_name(),
        lines = numbered.len(),
        "decoded record"
    );
    Ok(value)
}

/// Encode `value` as LF-separated lines with no trailing newline.
pub fn encode<T: FixedWidth>(value: &T) -> Result<String, FormatError> {
    encode_with(value, &EncodeOptions::default())
}

pub fn encode_with<T: FixedWidth>(
    value: &T,
    options: &EncodeOptions,
) -> Result<String, FormatError> {
    let records = encode_records(value)?;
    let separator = options.line_ending.as_str();
    let mut text = records
        .iter()
        .map(Record::as_str)
        .collect::<Vec<_>>()
        .join(separator);
    if options.final_newline && !records.is_empty() {
        text.push_str(separator);
    }
    Ok(text)
}

/// Encode `value` into its lines.
pub fn encode_records<T: FixedWidth>(value: &T) -> Result<Vec<Record>, FormatError> {
    let plan = plan::<T>()?;
    let mut records = Vec::new();
    plan.encode_record(value, &mut records)?;
    debug!(
        type_name = plan.type_name(),
        lines = records.len(),
        "encoded record"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Layout, field};
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default, PartialEq)]
    struct Code {
        value: String,
    }

    impl FixedWidth for Code {
        fn layout() -> Layout<Self> {
            Layout::<Self>::new().field(
                "value",
                field(0, 4).left(),
                |c| &c.value,
                |c| &mut c.value,
            )
        }
    }

    #[test]
    fn test_line_ending_text() {
        assert_eq!(LineEnding::Lf.as_str(), "\n");
        assert_eq!(LineEnding::CrLf.as_str(), "\r\n");
    }

    #[test]
    fn test_encode_options() {
        let code = Code {
            value: "AB".to_string(),
        };
        assert_eq!(encode(&code).unwrap(), "AB  ");
        let options = EncodeOptions::default().crlf().with_final_newline();
        assert_eq!(encode_with(&code, &options).unwrap(), "AB  \r\n");
    }

    #[test]
    fn test_decode_accepts_final_terminator() {
        let code: Code = decode("AB  \r\n").unwrap();
        assert_eq!(code.value, "AB");
        let code: Code = decode_lines("AB  \n".split('\n')).unwrap();
        assert_eq!(code.value, "AB");
    }

    #[test]
    fn test_decode_rejects_blank_line() {
        let err = decode::<Code>("\r\nAB  \r\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::ShortLine {
                line: 1,
                member: "value",
                offset: 0,
                width: 4,
                len: 0,
            }
        );
    }

    #[test]
    fn test_decode_rejects_leftover_lines() {
        let err = decode::<Code>("AB  \n\nCD  ").unwrap_err();
        assert_eq!(err, ParseError::TrailingInput { line: 2, count: 2 });
    }

    #[test]
    fn test_decode_empty_input() {
        let err = decode::<Code>("").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedEnd {
                line: 1,
                type_name: "Code"
            }
        );
    }
}
