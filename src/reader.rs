//! Decoding lines into records.
//!
//! Single-line records are sliced column by column. Blocks hand each member
//! the line cursor in turn. Repeated groups have no declared length: a
//! [`GroupScanner`] peeks at each upcoming line and keeps accepting elements
//! until a line carries the sentinel of whatever follows the group.

use tracing::trace;

use crate::error::ParseError;
use crate::layout::FixedWidth;
use crate::plan::{Binding, Sentinel, Shape, TypePlan};
use crate::record;

/// Non-empty input lines with their 1-based line numbers, consumed in order.
#[derive(Debug)]
pub(crate) struct LineCursor<'a> {
    lines: &'a [(usize, &'a str)],
    next: usize,
}

impl<'a> LineCursor<'a> {
    pub(crate) fn new(lines: &'a [(usize, &'a str)]) -> Self {
        Self { lines, next: 0 }
    }

    pub(crate) fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.next).map(|(_, line)| *line)
    }

    pub(crate) fn advance(&mut self) -> Option<(usize, &'a str)> {
        let entry = self.lines.get(self.next).copied()?;
        self.next += 1;
        Some(entry)
    }

    /// Line number of the next unconsumed line, or one past the last line.
    pub(crate) fn line_no(&self) -> usize {
        match self.lines.get(self.next) {
            Some((number, _)) => *number,
            None => self.lines.last().map_or(1, |(number, _)| number + 1),
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.next
    }

    pub(crate) fn remaining(&self) -> usize {
        self.lines.len() - self.next
    }
}

/// What ends a repeated group.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Scope<'s> {
    /// Sentinel of the member that follows the group. When set, the group
    /// must be closed by it.
    pub(crate) trailer: Option<&'s Sentinel>,
    /// Sentinels that end an enclosing scope.
    pub(crate) enclosing: &'s [&'s Sentinel],
}

/// Role of the next unconsumed line from the point of view of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineRole {
    Element,
    Trailer,
    EnclosingTrailer,
    EndOfInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GroupState {
    Accumulating,
    Closed,
}

/// Decides, one peeked line at a time, whether a repeated group continues.
///
/// `Accumulating` moves to `Closed` when the peeked line carries the group's
/// trailer sentinel. Running into the end of input or an enclosing scope's
/// sentinel also closes the group, unless the group has a trailer of its own,
/// in which case the trailer is missing.
#[derive(Debug)]
pub(crate) struct GroupScanner<'s> {
    member: &'static str,
    scope: Scope<'s>,
    state: GroupState,
}

impl<'s> GroupScanner<'s> {
    pub(crate) fn new(member: &'static str, scope: Scope<'s>) -> Self {
        Self {
            member,
            scope,
            state: GroupState::Accumulating,
        }
    }

    pub(crate) fn classify(&self, line: Option<&str>) -> LineRole {
        let Some(line) = line else {
            return LineRole::EndOfInput;
        };
        if self.scope.trailer.is_some_and(|s| s.matches(line)) {
            LineRole::Trailer
        } else if self.scope.enclosing.iter().any(|s| s.matches(line)) {
            LineRole::EnclosingTrailer
        } else {
            LineRole::Element
        }
    }

    /// Feed the next unconsumed line without consuming it.
    pub(crate) fn observe(
        &mut self,
        line: Option<&str>,
        line_no: usize,
    ) -> Result<GroupState, ParseError> {
        if self.state == GroupState::Closed {
            return Ok(GroupState::Closed);
        }
        match self.classify(line) {
            LineRole::Element => {}
            LineRole::Trailer => self.state = GroupState::Closed,
            LineRole::EndOfInput | LineRole::EnclosingTrailer => match self.scope.trailer {
                Some(trailer) => {
                    return Err(ParseError::MissingTrailer {
                        line: line_no,
                        member: self.member,
                        sentinel: trailer.text().to_string(),
                    });
                }
                None => self.state = GroupState::Closed,
            },
        }
        Ok(self.state)
    }
}

/// Decode elements of a repeated group until the scanner closes it.
pub(crate) fn decode_group<E: FixedWidth>(
    plan: &TypePlan<E>,
    member: &'static str,
    items: &mut Vec<E>,
    cursor: &mut LineCursor<'_>,
    scope: Scope<'_>,
) -> Result<(), ParseError> {
    // Groups nested in an element stop where this group stops, and where
    // the next element begins if elements are sentinel-led.
    let mut stops: Vec<&Sentinel> = scope.enclosing.to_vec();
    stops.extend(scope.trailer);
    if plan.shape() == Shape::Block {
        stops.extend(plan.sentinel());
    }

    let mut scanner = GroupScanner::new(member, scope);
    while scanner.observe(cursor.peek(), cursor.line_no())? == GroupState::Accumulating {
        let start = cursor.position();
        items.push(plan.decode_record(cursor, &stops)?);
        if cursor.position() == start {
            return Err(ParseError::NoProgress {
                line: cursor.line_no(),
                member,
            });
        }
    }
    trace!(
        member,
        elements = items.len(),
        line = cursor.line_no(),
        "repeated group closed"
    );
    Ok(())
}

impl<T: FixedWidth> TypePlan<T> {
    /// Decode one `T`, consuming one line for a single-line record or as many
    /// as its members need for a block.
    pub(crate) fn decode_record(
        &self,
        cursor: &mut LineCursor<'_>,
        stops: &[&Sentinel],
    ) -> Result<T, ParseError> {
        let mut target = T::default();
        match self.shape() {
            Shape::Line => {
                let Some((line_no, line)) = cursor.advance() else {
                    return Err(ParseError::UnexpectedEnd {
                        line: cursor.line_no(),
                        type_name: self.type_name(),
                    });
                };
                self.decode_line(&mut target, line, line_no, 0)?;
            }
            Shape::Block => self.decode_block(&mut target, cursor, stops)?,
        }
        Ok(target)
    }

    /// Decode the fields of a single-line record starting at column `base`.
    pub(crate) fn decode_line(
        &self,
        target: &mut T,
        line: &str,
        line_no: usize,
        base: usize,
    ) -> Result<(), ParseError> {
        // stripped text of the first slot of each stored member
        let mut assigned: Vec<Option<&str>> = vec![None; self.bindings.len()];

        for field in &self.fields {
            let offset = base + field.offset.unwrap_or(0);
            let binding = &self.bindings[field.member_index];
            if let Binding::Composite(access) = binding {
                access.decode_inline(target, line, line_no, offset)?;
                continue;
            }

            let width = field.width.unwrap_or(0);
            let raw = record::slice(line, offset, width).ok_or_else(|| ParseError::ShortLine {
                line: line_no,
                member: field.member,
                offset,
                width,
                len: line.chars().count(),
            })?;
            let text = record::strip(raw, field.pad, field.align);

            match binding {
                Binding::Stored(access) => match assigned[field.member_index] {
                    Some(first) if first != text => {
                        return Err(ParseError::SlotConflict {
                            line: line_no,
                            member: field.member,
                            first: first.to_string(),
                            other: text.to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        access.decode_into(target, text).map_err(|source| {
                            ParseError::InvalidValue {
                                line: line_no,
                                member: field.member,
                                text: text.to_string(),
                                source,
                            }
                        })?;
                        assigned[field.member_index] = Some(text);
                    }
                },
                Binding::Constant(value) => {
                    let expected = record::strip(value, field.pad, field.align);
                    if text != expected {
                        return Err(ParseError::UnexpectedSentinel {
                            line: line_no,
                            member: field.member,
                            expected: expected.to_string(),
                            found: text.to_string(),
                        });
                    }
                }
                Binding::Computed(_) | Binding::Composite(_) | Binding::Repeated(_) => {}
            }
        }
        Ok(())
    }

    fn decode_block(
        &self,
        target: &mut T,
        cursor: &mut LineCursor<'_>,
        stops: &[&Sentinel],
    ) -> Result<(), ParseError> {
        for (index, field) in self.fields.iter().enumerate() {
            let follower = self.followers.get(index).and_then(Option::as_ref);
            match &self.bindings[field.member_index] {
                Binding::Composite(access) => {
                    let mut inner = stops.to_vec();
                    inner.extend(follower);
                    access.decode_lines(target, cursor, &inner)?;
                }
                Binding::Repeated(access) => {
                    let scope = Scope {
                        trailer: follower,
                        enclosing: stops,
                    };
                    access.decode_group(target, cursor, scope)?;
                }
                Binding::Stored(_) | Binding::Computed(_) | Binding::Constant(_) => {}
            }
        }
        Ok(())
    }
}
