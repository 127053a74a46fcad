//! Declarative field metadata.
//!
//! A type takes part in the codec by implementing [`FixedWidth`] and listing
//! its members once in a [`Layout`]. Each member owns one or more
//! [`FieldSpec`] slots describing where it sits on the line:
//!
//! ```
//! use fixedwidth_rs::{FixedWidth, Layout, field};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Header {
//!     bank_id: u32,
//!     account: u64,
//! }
//!
//! impl FixedWidth for Header {
//!     fn layout() -> Layout<Self> {
//!         Layout::<Self>::new()
//!             .constant("start", field(0, 3), "*03")
//!             .field("bank_id", field(1, 5), |h| &h.bank_id, |h| &mut h.bank_id)
//!             .field("account", field(2, 15), |h| &h.account, |h| &mut h.account)
//!     }
//! }
//!
//! let header = Header { bank_id: 164, account: 5555333111 };
//! assert_eq!(
//!     fixedwidth_rs::encode(&header).unwrap(),
//!     "*0300164000005555333111"
//! );
//! ```
//!
//! A type that declares any scalar member is a single-line record. A type that
//! declares only composite and repeated members is a multi-line block, and each
//! of its members starts on a line of its own.

use std::fmt;

use crate::error::{SchemaError, TransformError};
use crate::plan::{CompositeAccess, CompositeCodec, GroupAccess, GroupCodec};
use crate::transform::{FieldValue, Natural, Transform};

/// Which side of a field its value is flushed against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Alignment {
    /// Value first, pad characters trailing.
    Left,
    /// Pad characters leading, value last.
    #[default]
    Right,
}

/// Position and padding of one output slot.
///
/// `order` places the slot among all slots of its type; gaps are allowed but
/// ties are not. `width` is required for scalar members and must be omitted
/// for composite and repeated members, whose width comes from their own layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    pub order: u32,
    pub width: Option<usize>,
    pub pad: char,
    pub align: Alignment,
}

impl FieldSpec {
    pub const fn new(order: u32) -> Self {
        Self {
            order,
            width: None,
            pad: '0',
            align: Alignment::Right,
        }
    }

    pub const fn width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    pub const fn pad(mut self, pad: char) -> Self {
        self.pad = pad;
        self
    }

    pub const fn align(mut self, align: Alignment) -> Self {
        self.align = align;
        self
    }

    /// Left-align and pad with spaces, the usual shape of free text.
    pub const fn left(self) -> Self {
        self.pad(' ').align(Alignment::Left)
    }
}

/// A scalar slot: `width` columns, zero-padded and right-aligned.
pub const fn field(order: u32, width: usize) -> FieldSpec {
    FieldSpec::new(order).width(width)
}

/// A composite or repeated-group slot; its width is derived.
pub const fn group(order: u32) -> FieldSpec {
    FieldSpec::new(order)
}

/// The ordered slots a single member is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slots(Vec<FieldSpec>);

impl Slots {
    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.0.iter()
    }
}

impl From<FieldSpec> for Slots {
    fn from(spec: FieldSpec) -> Self {
        Slots(vec![spec])
    }
}

impl<const N: usize> From<[FieldSpec; N]> for Slots {
    fn from(specs: [FieldSpec; N]) -> Self {
        Slots(specs.to_vec())
    }
}

impl From<Vec<FieldSpec>> for Slots {
    fn from(specs: Vec<FieldSpec>) -> Self {
        Slots(specs)
    }
}

/// A type with a fixed-width layout.
///
/// `Default` supplies the blank instance the reader fills in.
pub trait FixedWidth: Default + 'static {
    fn layout() -> Layout<Self>;
}

pub(crate) trait ScalarAccess<T>: Send + Sync {
    fn encode(&self, record: &T) -> Result<String, TransformError>;
    fn decode_into(&self, record: &mut T, text: &str) -> Result<(), TransformError>;
}

pub(crate) trait ComputedAccess<T>: Send + Sync {
    fn encode(&self, record: &T) -> Result<String, TransformError>;
}

/// A nested member whose own plan is looked up when the parent is planned.
pub(crate) trait Resolve<R: ?Sized>: Send + Sync {
    fn resolve(&self) -> Result<Box<R>, SchemaError>;
}

pub(crate) enum MemberKind<T> {
    Stored(Box<dyn ScalarAccess<T>>),
    Computed(Box<dyn ComputedAccess<T>>),
    Constant(String),
    Composite(Box<dyn Resolve<dyn CompositeAccess<T>>>),
    Repeated(Box<dyn Resolve<dyn GroupAccess<T>>>),
}

pub(crate) struct Member<T> {
    pub(crate) name: &'static str,
    pub(crate) slots: Vec<FieldSpec>,
    pub(crate) kind: MemberKind<T>,
}

/// The declared members of `T`, in declaration order.
///
/// Start a chain with `Layout::<Self>::new()` so the accessor closures of
/// the first member already know the record type.
pub struct Layout<T> {
    pub(crate) members: Vec<Member<T>>,
}

impl<T: 'static> Default for Layout<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Layout<T> {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// A stored scalar using the default conversion for `V`.
    pub fn field<V: FieldValue>(
        self,
        name: &'static str,
        slots: impl Into<Slots>,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        self.field_with(name, slots, Natural, get, get_mut)
    }

    /// A stored scalar converted by `transform` instead of the default.
    pub fn field_with<V: 'static, X: Transform<V>>(
        self,
        name: &'static str,
        slots: impl Into<Slots>,
        transform: X,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        let access = StoredScalar {
            get,
            get_mut,
            transform,
        };
        self.push(name, slots.into(), MemberKind::Stored(Box::new(access)))
    }

    /// A literal written verbatim and checked on read.
    ///
    /// A constant in the first slot of a type is that type's sentinel.
    pub fn constant(
        self,
        name: &'static str,
        slots: impl Into<Slots>,
        value: impl fmt::Display,
    ) -> Self {
        self.push(name, slots.into(), MemberKind::Constant(value.to_string()))
    }

    /// A value derived from the record when writing; skipped when reading.
    pub fn computed<V: FieldValue>(
        self,
        name: &'static str,
        slots: impl Into<Slots>,
        compute: fn(&T) -> V,
    ) -> Self {
        self.computed_with(name, slots, Natural, compute)
    }

    pub fn computed_with<V: 'static, X: Transform<V>>(
        self,
        name: &'static str,
        slots: impl Into<Slots>,
        transform: X,
        compute: fn(&T) -> V,
    ) -> Self {
        let access = ComputedScalar { compute, transform };
        self.push(name, slots.into(), MemberKind::Computed(Box::new(access)))
    }

    /// A nested record.
    pub fn composite<C: FixedWidth>(
        self,
        name: &'static str,
        spec: FieldSpec,
        get: fn(&T) -> &C,
        get_mut: fn(&mut T) -> &mut C,
    ) -> Self {
        let member = CompositeMember { get, get_mut };
        self.push(name, spec.into(), MemberKind::Composite(Box::new(member)))
    }

    /// A variable-length run of `E` records.
    ///
    /// The run ends at the sentinel of the member declared after it, or at
    /// the end of the enclosing scope when nothing follows.
    pub fn repeated<E: FixedWidth>(
        self,
        name: &'static str,
        spec: FieldSpec,
        get: fn(&T) -> &Vec<E>,
        get_mut: fn(&mut T) -> &mut Vec<E>,
    ) -> Self {
        let member = RepeatedMember { name, get, get_mut };
        self.push(name, spec.into(), MemberKind::Repeated(Box::new(member)))
    }

    fn push(mut self, name: &'static str, slots: Slots, kind: MemberKind<T>) -> Self {
        self.members.push(Member {
            name,
            slots: slots.0,
            kind,
        });
        self
    }
}

struct StoredScalar<T, V, X> {
    get: fn(&T) -> &V,
    get_mut: fn(&mut T) -> &mut V,
    transform: X,
}

impl<T, V, X: Transform<V>> ScalarAccess<T> for StoredScalar<T, V, X> {
    fn encode(&self, record: &T) -> Result<String, TransformError> {
        self.transform.encode((self.get)(record))
    }

    fn decode_into(&self, record: &mut T, text: &str) -> Result<(), TransformError> {
        *(self.get_mut)(record) = self.transform.decode(text)?;
        Ok(())
    }
}

struct ComputedScalar<T, V, X> {
    compute: fn(&T) -> V,
    transform: X,
}

impl<T, V, X: Transform<V>> ComputedAccess<T> for ComputedScalar<T, V, X> {
    fn encode(&self, record: &T) -> Result<String, TransformError> {
        self.transform.encode(&(self.compute)(record))
    }
}

struct CompositeMember<T, C> {
    get: fn(&T) -> &C,
    get_mut: fn(&mut T) -> &mut C,
}

impl<T: 'static, C: FixedWidth> Resolve<dyn CompositeAccess<T>> for CompositeMember<T, C> {
    fn resolve(&self) -> Result<Box<dyn CompositeAccess<T>>, SchemaError> {
        let plan = crate::plan::plan::<C>()?;
        Ok(Box::new(CompositeCodec::new(self.get, self.get_mut, plan)))
    }
}

struct RepeatedMember<T, E> {
    name: &'static str,
    get: fn(&T) -> &Vec<E>,
    get_mut: fn(&mut T) -> &mut Vec<E>,
}

impl<T: 'static, E: FixedWidth> Resolve<dyn GroupAccess<T>> for RepeatedMember<T, E> {
    fn resolve(&self) -> Result<Box<dyn GroupAccess<T>>, SchemaError> {
        let plan = crate::plan::plan::<E>()?;
        Ok(Box::new(GroupCodec::new(
            self.name,
            self.get,
            self.get_mut,
            plan,
        )))
    }
}
