//! Type plans: the resolved, ordered field table for a layout.
//!
//! [`plan`] turns a type's declared [`Layout`](crate::Layout) into a
//! [`TypePlan`] once per process. Plans are immutable after they are built and
//! shared through `Arc`, so concurrent readers need no further locking. A
//! layout that fails validation is cached as that failure.
//!
//! Building a plan resolves:
//!
//! - the total order of every slot of every member
//! - column offsets and the line width of single-line records
//! - whether the type is a single-line record or a multi-line block
//! - the type's leading sentinel, if its first slot is a constant
//! - the sentinel that closes each repeated group

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::error::{FormatError, ParseError, SchemaError};
use crate::layout::{
    Alignment, ComputedAccess, FieldSpec, FixedWidth, Member, MemberKind, ScalarAccess,
};
use crate::reader::{LineCursor, Scope};
use crate::record::{self, Record};

/// How a type occupies lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// All fields sit on one line.
    Line,
    /// Each member starts on its own line and may span several.
    Block,
}

/// How a scalar slot gets its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarRole {
    /// Read into and written from a member.
    Stored,
    /// Derived from the record when writing, skipped when reading.
    Computed,
    /// A literal, written verbatim and checked when reading.
    Constant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ScalarRole),
    Composite,
    RepeatedGroup,
}

/// One resolved slot of a type plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPlan {
    pub member: &'static str,
    pub order: u32,
    /// Declared width for scalars, derived width for single-line composites.
    pub width: Option<usize>,
    /// Column offset within the line; `None` for members of a block.
    pub offset: Option<usize>,
    pub pad: char,
    pub align: Alignment,
    pub kind: FieldKind,
    pub(crate) member_index: usize,
}

/// A literal at column 0 that identifies which kind of line is next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinel {
    member: &'static str,
    width: usize,
    pad: char,
    align: Alignment,
    text: String,
}

impl Sentinel {
    fn from_constant(field: &FieldPlan, value: &str) -> Self {
        Self {
            member: field.member,
            width: field.width.unwrap_or(0),
            pad: field.pad,
            align: field.align,
            text: record::strip(value, field.pad, field.align).to_string(),
        }
    }

    /// The member that carries the sentinel.
    pub fn member(&self) -> &'static str {
        self.member
    }

    /// The literal with its pad stripped.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether `line` starts with this sentinel.
    pub fn matches(&self, line: &str) -> bool {
        record::slice(line, 0, self.width)
            .is_some_and(|raw| record::strip(raw, self.pad, self.align) == self.text)
    }
}

/// Type-level facts a parent plan needs about a nested type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlanSummary {
    pub(crate) type_name: &'static str,
    pub(crate) shape: Shape,
    pub(crate) width: Option<usize>,
    pub(crate) sentinel: Option<Sentinel>,
}

pub(crate) enum Binding<T> {
    Stored(Box<dyn ScalarAccess<T>>),
    Computed(Box<dyn ComputedAccess<T>>),
    Constant(String),
    Composite(Box<dyn CompositeAccess<T>>),
    Repeated(Box<dyn GroupAccess<T>>),
}

/// A nested record member, bound to its own plan.
pub(crate) trait CompositeAccess<T>: Send + Sync {
    fn child(&self) -> &PlanSummary;
    fn decode_inline(
        &self,
        record: &mut T,
        line: &str,
        line_no: usize,
        offset: usize,
    ) -> Result<(), ParseError>;
    fn decode_lines(
        &self,
        record: &mut T,
        cursor: &mut LineCursor<'_>,
        stops: &[&Sentinel],
    ) -> Result<(), ParseError>;
    fn encode_inline(&self, record: &T, buf: &mut Record) -> Result<(), FormatError>;
    fn encode_lines(&self, record: &T, out: &mut Vec<Record>) -> Result<(), FormatError>;
}

/// A repeated-group member, bound to its element plan.
pub(crate) trait GroupAccess<T>: Send + Sync {
    fn decode_group(
        &self,
        record: &mut T,
        cursor: &mut LineCursor<'_>,
        scope: Scope<'_>,
    ) -> Result<(), ParseError>;
    fn encode_group(&self, record: &T, out: &mut Vec<Record>) -> Result<(), FormatError>;
}

pub(crate) struct CompositeCodec<T, C> {
    get: fn(&T) -> &C,
    get_mut: fn(&mut T) -> &mut C,
    plan: Arc<TypePlan<C>>,
}

impl<T, C> CompositeCodec<T, C> {
    pub(crate) fn new(
        get: fn(&T) -> &C,
        get_mut: fn(&mut T) -> &mut C,
        plan: Arc<TypePlan<C>>,
    ) -> Self {
        Self { get, get_mut, plan }
    }
}

impl<T, C: FixedWidth> CompositeAccess<T> for CompositeCodec<T, C> {
    fn child(&self) -> &PlanSummary {
        &self.plan.summary
    }

    fn decode_inline(
        &self,
        record: &mut T,
        line: &str,
        line_no: usize,
        offset: usize,
    ) -> Result<(), ParseError> {
        self.plan
            .decode_line((self.get_mut)(record), line, line_no, offset)
    }

    fn decode_lines(
        &self,
        record: &mut T,
        cursor: &mut LineCursor<'_>,
        stops: &[&Sentinel],
    ) -> Result<(), ParseError> {
        *(self.get_mut)(record) = self.plan.decode_record(cursor, stops)?;
        Ok(())
    }

    fn encode_inline(&self, record: &T, buf: &mut Record) -> Result<(), FormatError> {
        self.plan.encode_line((self.get)(record), buf)
    }

    fn encode_lines(&self, record: &T, out: &mut Vec<Record>) -> Result<(), FormatError> {
        self.plan.encode_record((self.get)(record), out)
    }
}

pub(crate) struct GroupCodec<T, E> {
    member: &'static str,
    get: fn(&T) -> &Vec<E>,
    get_mut: fn(&mut T) -> &mut Vec<E>,
    plan: Arc<TypePlan<E>>,
}

impl<T, E> GroupCodec<T, E> {
    pub(crate) fn new(
        member: &'static str,
        get: fn(&T) -> &Vec<E>,
        get_mut: fn(&mut T) -> &mut Vec<E>,
        plan: Arc<TypePlan<E>>,
    ) -> Self {
        Self {
            member,
            get,
            get_mut,
            plan,
        }
    }
}

impl<T, E: FixedWidth> GroupAccess<T> for GroupCodec<T, E> {
    fn decode_group(
        &self,
        record: &mut T,
        cursor: &mut LineCursor<'_>,
        scope: Scope<'_>,
    ) -> Result<(), ParseError> {
        let items = (self.get_mut)(record);
        items.clear();
        crate::reader::decode_group(&self.plan, self.member, items, cursor, scope)
    }

    fn encode_group(&self, record: &T, out: &mut Vec<Record>) -> Result<(), FormatError> {
        for item in (self.get)(record) {
            self.plan.encode_record(item, out)?;
        }
        Ok(())
    }
}

/// The resolved layout of `T`, shared by the reader and the writer.
pub struct TypePlan<T> {
    pub(crate) summary: PlanSummary,
    pub(crate) fields: Vec<FieldPlan>,
    pub(crate) bindings: Vec<Binding<T>>,
    /// Per field of a block: the sentinel of the field after it.
    pub(crate) followers: Vec<Option<Sentinel>>,
}

impl<T> TypePlan<T> {
    pub fn type_name(&self) -> &'static str {
        self.summary.type_name
    }

    pub fn shape(&self) -> Shape {
        self.summary.shape
    }

    /// Slots in the order they are read and written.
    pub fn fields(&self) -> &[FieldPlan] {
        &self.fields
    }

    /// Total width of a single-line record; `None` for blocks.
    pub fn line_width(&self) -> Option<usize> {
        self.summary.width
    }

    pub fn sentinel(&self) -> Option<&Sentinel> {
        self.summary.sentinel.as_ref()
    }
}

impl<T> fmt::Debug for TypePlan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypePlan")
            .field("type_name", &self.summary.type_name)
            .field("shape", &self.summary.shape)
            .field("width", &self.summary.width)
            .field("sentinel", &self.summary.sentinel)
            .field("fields", &self.fields)
            .finish()
    }
}

type PlanSlot<T> = Result<Arc<TypePlan<T>>, SchemaError>;

static PLANS: LazyLock<DashMap<TypeId, Arc<dyn Any + Send + Sync>>> = LazyLock::new(DashMap::new);

thread_local! {
    static IN_PROGRESS: RefCell<Vec<TypeId>> = const { RefCell::new(Vec::new()) };
}

/// The plan for `T`, built on first use and cached for the process lifetime.
///
/// Two threads planning the same type at once may both build it; the first
/// plan published is the one every caller gets.
pub fn plan<T: FixedWidth>() -> Result<Arc<TypePlan<T>>, SchemaError> {
    let key = TypeId::of::<T>();
    if let Some(cached) = lookup::<T>(key) {
        return cached;
    }

    // Built without holding a map shard: nested types re-enter the cache.
    let built: PlanSlot<T> = build_guarded::<T>(key).map(Arc::new);
    match &built {
        Ok(plan) => debug!(
            type_name = plan.type_name(),
            shape = ?plan.shape(),
            fields = plan.fields().len(),
            width = ?plan.line_width(),
            "built type plan"
        ),
        Err(err) => warn!(%err, "rejected fixed-width layout"),
    }

    let published = PLANS
        .entry(key)
        .or_insert_with(|| Arc::new(built.clone()) as Arc<dyn Any + Send + Sync>)
        .value()
        .clone();
    match published.downcast_ref::<PlanSlot<T>>() {
        Some(slot) => slot.clone(),
        None => built,
    }
}

fn lookup<T: FixedWidth>(key: TypeId) -> Option<PlanSlot<T>> {
    let entry = PLANS.get(&key)?;
    entry.value().downcast_ref::<PlanSlot<T>>().cloned()
}

fn build_guarded<T: FixedWidth>(key: TypeId) -> Result<TypePlan<T>, SchemaError> {
    let reentered = IN_PROGRESS.with(|stack| {
        let mut stack = stack.borrow_mut();
        if stack.contains(&key) {
            true
        } else {
            stack.push(key);
            false
        }
    });
    if reentered {
        return Err(SchemaError::Recursive {
            type_name: short_type_name::<T>(),
        });
    }
    let result = build::<T>();
    IN_PROGRESS.with(|stack| {
        stack.borrow_mut().retain(|id| *id != key);
    });
    result
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    if full.contains('<') {
        return full;
    }
    full.rsplit("::").next().unwrap_or(full)
}

fn build<T: FixedWidth>() -> Result<TypePlan<T>, SchemaError> {
    let type_name = short_type_name::<T>();
    let layout = T::layout();

    let mut fields = Vec::new();
    let mut bindings = Vec::with_capacity(layout.members.len());
    for member in layout.members {
        let Member { name, slots, kind } = member;
        // a member without slots takes no columns and is left alone
        if slots.is_empty() {
            continue;
        }
        let member_index = bindings.len();

        let (binding, kind, child_width) = match kind {
            MemberKind::Stored(access) => {
                check_scalar_slots(type_name, name, &slots)?;
                (Binding::Stored(access), FieldKind::Scalar(ScalarRole::Stored), None)
            }
            MemberKind::Computed(access) => {
                check_scalar_slots(type_name, name, &slots)?;
                (
                    Binding::Computed(access),
                    FieldKind::Scalar(ScalarRole::Computed),
                    None,
                )
            }
            MemberKind::Constant(value) => {
                check_scalar_slots(type_name, name, &slots)?;
                let len = value.chars().count();
                if let Some(width) = slots.iter().filter_map(|s| s.width).find(|w| *w < len) {
                    return Err(SchemaError::ConstantOverflow {
                        type_name,
                        member: name,
                        value,
                        width,
                    });
                }
                (
                    Binding::Constant(value),
                    FieldKind::Scalar(ScalarRole::Constant),
                    None,
                )
            }
            MemberKind::Composite(member) => {
                check_group_slot(type_name, name, &slots)?;
                let access = member.resolve()?;
                let width = access.child().width;
                (Binding::Composite(access), FieldKind::Composite, width)
            }
            MemberKind::Repeated(member) => {
                check_group_slot(type_name, name, &slots)?;
                let access = member.resolve()?;
                (Binding::Repeated(access), FieldKind::RepeatedGroup, None)
            }
        };

        for spec in &slots {
            fields.push(FieldPlan {
                member: name,
                order: spec.order,
                width: spec.width.or(child_width),
                offset: None,
                pad: spec.pad,
                align: spec.align,
                kind,
                member_index,
            });
        }
        bindings.push(binding);
    }

    if fields.is_empty() {
        return Err(SchemaError::Empty { type_name });
    }
    fields.sort_by_key(|f| f.order);
    if let Some(pair) = fields.windows(2).find(|pair| pair[0].order == pair[1].order) {
        return Err(SchemaError::DuplicateOrder {
            type_name,
            member: pair[1].member,
            order: pair[1].order,
        });
    }

    let has_scalars = fields
        .iter()
        .any(|f| matches!(f.kind, FieldKind::Scalar(_)));
    let (shape, width) = if has_scalars {
        let mut offset = 0;
        for field in fields.iter_mut() {
            let single_line = match &bindings[field.member_index] {
                Binding::Composite(access) => access.child().shape == Shape::Line,
                Binding::Repeated(_) => false,
                _ => true,
            };
            if !single_line {
                return Err(SchemaError::MixedShape {
                    type_name,
                    member: field.member,
                });
            }
            field.offset = Some(offset);
            offset += field.width.unwrap_or(0);
        }
        (Shape::Line, Some(offset))
    } else {
        (Shape::Block, None)
    };

    let sentinel = leading_sentinel(&fields[0], &bindings);

    let mut followers = Vec::new();
    if shape == Shape::Block {
        for (index, field) in fields.iter().enumerate() {
            let follower = fields.get(index + 1);
            let sentinel = follower.and_then(|next| leading_sentinel(next, &bindings));
            if let (FieldKind::RepeatedGroup, Some(next), None) = (field.kind, follower, &sentinel)
            {
                return Err(SchemaError::UnclassifiableTrailer {
                    type_name,
                    member: field.member,
                    follower: next.member,
                });
            }
            followers.push(sentinel);
        }
    }

    Ok(TypePlan {
        summary: PlanSummary {
            type_name,
            shape,
            width,
            sentinel,
        },
        fields,
        bindings,
        followers,
    })
}

fn check_scalar_slots(
    type_name: &'static str,
    member: &'static str,
    slots: &[FieldSpec],
) -> Result<(), SchemaError> {
    if slots.iter().any(|s| s.width.unwrap_or(0) == 0) {
        return Err(SchemaError::MissingWidth { type_name, member });
    }
    Ok(())
}

fn check_group_slot(
    type_name: &'static str,
    member: &'static str,
    slots: &[FieldSpec],
) -> Result<(), SchemaError> {
    if slots.iter().any(|s| s.width.is_some()) {
        return Err(SchemaError::CompositeWidth { type_name, member });
    }
    Ok(())
}

/// The sentinel a line (or block) starting with `field` can be recognised by.
fn leading_sentinel<T>(field: &FieldPlan, bindings: &[Binding<T>]) -> Option<Sentinel> {
    match &bindings[field.member_index] {
        Binding::Constant(value) => Some(Sentinel::from_constant(field, value)),
        Binding::Composite(access) => access.child().sentinel.clone(),
        _ => None,
    }
}
