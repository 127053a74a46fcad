//! Encoding records into lines.

use crate::error::FormatError;
use crate::layout::FixedWidth;
use crate::plan::{Binding, Shape, TypePlan};
use crate::record::Record;

impl<T: FixedWidth> TypePlan<T> {
    /// Append the lines of `value` to `out`: one for a single-line record,
    /// one per member line for a block.
    pub(crate) fn encode_record(
        &self,
        value: &T,
        out: &mut Vec<Record>,
    ) -> Result<(), FormatError> {
        match self.shape() {
            Shape::Line => {
                let mut line = Record::with_capacity(self.line_width().unwrap_or(0));
                self.encode_line(value, &mut line)?;
                out.push(line);
            }
            Shape::Block => {
                for field in &self.fields {
                    match &self.bindings[field.member_index] {
                        Binding::Composite(access) => access.encode_lines(value, out)?,
                        Binding::Repeated(access) => access.encode_group(value, out)?,
                        Binding::Stored(_) | Binding::Computed(_) | Binding::Constant(_) => {}
                    }
                }
            }
        }
        Ok(())
    }

    /// Append every slot of a single-line record to `buf`.
    ///
    /// A member written to several slots is rendered once and the same text
    /// goes into each slot.
    pub(crate) fn encode_line(&self, value: &T, buf: &mut Record) -> Result<(), FormatError> {
        let mut rendered: Vec<Option<String>> = vec![None; self.bindings.len()];

        for field in &self.fields {
            let binding = &self.bindings[field.member_index];
            if let Binding::Composite(access) = binding {
                access.encode_inline(value, buf)?;
                continue;
            }

            let slot = &mut rendered[field.member_index];
            if slot.is_none() {
                let text = match binding {
                    Binding::Stored(access) => access.encode(value),
                    Binding::Computed(access) => access.encode(value),
                    Binding::Constant(text) => Ok(text.clone()),
                    Binding::Composite(_) | Binding::Repeated(_) => Ok(String::new()),
                }
                .map_err(|source| FormatError::Rejected {
                    member: field.member,
                    source,
                })?;
                *slot = Some(text);
            }
            let text = slot.as_deref().unwrap_or_default();
            buf.push_field(
                field.member,
                text,
                field.width.unwrap_or(0),
                field.pad,
                field.align,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;
    use crate::layout::{Layout, field, group};
    use crate::plan::plan;
    use crate::transform::Transform;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default)]
    struct Trailer {
        count: u32,
    }

    impl FixedWidth for Trailer {
        fn layout() -> Layout<Self> {
            Layout::<Self>::new()
                .constant("start", field(0, 5).left(), "&")
                .field("count", field(1, 3), |t| &t.count, |t| &mut t.count)
                .constant("spacer", [field(2, 2).pad(' '), field(4, 4).pad(' ')], "")
                .computed("tenfold", field(3, 4), |t| t.count * 10)
        }
    }

    fn encode<T: FixedWidth>(value: &T) -> Result<Vec<String>, FormatError> {
        let plan = plan::<T>()?;
        let mut out = Vec::new();
        plan.encode_record(value, &mut out)?;
        Ok(out.into_iter().map(Record::into_string).collect())
    }

    #[test]
    fn test_line_pads_every_slot() {
        let lines = encode(&Trailer { count: 12 }).unwrap();
        assert_eq!(lines, vec!["&    012  0120    ".to_string()]);
    }

    #[derive(Debug, Default)]
    struct Shared {
        code: String,
    }

    impl FixedWidth for Shared {
        fn layout() -> Layout<Self> {
            Layout::<Self>::new().field(
                "code",
                [field(0, 3).left(), field(1, 3).left()],
                |s| &s.code,
                |s| &mut s.code,
            )
        }
    }

    #[test]
    fn test_multi_slot_member_repeats_its_value() {
        let lines = encode(&Shared {
            code: "AB".to_string(),
        })
        .unwrap();
        assert_eq!(lines, vec!["AB AB ".to_string()]);
    }

    #[test]
    fn test_overflow_names_the_member() {
        let err = encode(&Shared {
            code: "ABCD".to_string(),
        })
        .unwrap_err();
        assert_eq!(
            err,
            FormatError::Overflow {
                member: "code",
                value: "ABCD".to_string(),
                len: 4,
                width: 3,
            }
        );
    }

    struct Refuse;

    impl Transform<u8> for Refuse {
        fn decode(&self, _text: &str) -> Result<u8, TransformError> {
            Ok(0)
        }

        fn encode(&self, value: &u8) -> Result<String, TransformError> {
            Err(TransformError::invalid(format!("{value} refused")))
        }
    }

    #[derive(Debug, Default)]
    struct Refused {
        id: u8,
    }

    impl FixedWidth for Refused {
        fn layout() -> Layout<Self> {
            Layout::<Self>::new().field_with("id", field(0, 2), Refuse, |r| &r.id, |r| &mut r.id)
        }
    }

    #[test]
    fn test_transform_failure_is_wrapped() {
        let err = encode(&Refused { id: 3 }).unwrap_err();
        assert_eq!(
            err,
            FormatError::Rejected {
                member: "id",
                source: TransformError::invalid("3 refused"),
            }
        );
    }

    #[derive(Debug, Default)]
    struct Item {
        id: u8,
    }

    impl FixedWidth for Item {
        fn layout() -> Layout<Self> {
            Layout::<Self>::new().field("id", field(0, 2), |i| &i.id, |i| &mut i.id)
        }
    }

    #[derive(Debug, Default)]
    struct Batch {
        items: Vec<Item>,
        trailer: Trailer,
    }

    impl FixedWidth for Batch {
        fn layout() -> Layout<Self> {
            Layout::<Self>::new()
                .repeated("items", group(0), |b| &b.items, |b| &mut b.items)
                .composite("trailer", group(1), |b| &b.trailer, |b| &mut b.trailer)
        }
    }

    #[test]
    fn test_block_writes_each_member_on_its_own_lines() {
        let batch = Batch {
            items: vec![Item { id: 1 }, Item { id: 2 }],
            trailer: Trailer { count: 2 },
        };
        let lines = encode(&batch).unwrap();
        assert_eq!(
            lines,
            vec![
                "01".to_string(),
                "02".to_string(),
                "&    002  0020    ".to_string(),
            ]
        );
    }
}
