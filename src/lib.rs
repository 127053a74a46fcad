//! # fixedwidth-rs
//!
//! A declarative codec for fixed-width (positional) text records.
//!
//! Legacy batch formats such as bank positive-pay files carry every field at
//! a fixed column range, padded to width, instead of delimiting it. This crate
//! maps Rust types to and from such lines from one declaration per type.
//!
//! ## Overview
//!
//! - **Layouts**: a type implements [`FixedWidth`] and lists its members with
//!   their order, width, pad character and alignment.
//! - **Type plans**: each layout is resolved once into a [`TypePlan`] that the
//!   reader and writer share.
//! - **Sentinels**: a constant in a record's first column identifies the kind
//!   of line, which is how variable-length repeated groups find their end.
//! - **Transforms**: values convert through [`FieldValue`] by default or a
//!   declared [`Transform`] such as [`ImpliedDecimal`].
//!
//! ## Example
//!
//! ```
//! use fixedwidth_rs::{Decimal, FixedWidth, ImpliedDecimal, Layout, field, group};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Payment {
//!     serial: u64,
//!     amount: Decimal,
//! }
//!
//! impl FixedWidth for Payment {
//!     fn layout() -> Layout<Self> {
//!         Layout::<Self>::new()
//!             .field("serial", field(0, 6), |p| &p.serial, |p| &mut p.serial)
//!             .field_with(
//!                 "amount",
//!                 field(1, 8),
//!                 ImpliedDecimal::pennies(),
//!                 |p| &p.amount,
//!                 |p| &mut p.amount,
//!             )
//!     }
//! }
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Totals {
//!     count: u32,
//! }
//!
//! impl FixedWidth for Totals {
//!     fn layout() -> Layout<Self> {
//!         Layout::<Self>::new()
//!             .constant("start", field(0, 1), "&")
//!             .field("count", field(1, 4), |t| &t.count, |t| &mut t.count)
//!     }
//! }
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Batch {
//!     payments: Vec<Payment>,
//!     totals: Totals,
//! }
//!
//! impl FixedWidth for Batch {
//!     fn layout() -> Layout<Self> {
//!         Layout::<Self>::new()
//!             .repeated("payments", group(0), |b| &b.payments, |b| &mut b.payments)
//!             .composite("totals", group(1), |b| &b.totals, |b| &mut b.totals)
//!     }
//! }
//!
//! let text = "00001200001050\n00001300000025\n&0002";
//! let batch: Batch = fixedwidth_rs::decode(text).unwrap();
//! assert_eq!(batch.payments.len(), 2);
//! assert_eq!(batch.payments[0].amount, "10.50".parse().unwrap());
//! assert_eq!(fixedwidth_rs::encode(&batch).unwrap(), text);
//! ```

pub mod codec;
pub mod decimal;
pub mod error;
pub mod layout;
pub mod plan;
mod reader;
pub mod record;
pub mod transform;
mod writer;

pub use codec::{
    EncodeOptions, LineEnding, decode, decode_lines, encode, encode_records, encode_with,
};
pub use decimal::Decimal;
pub use error::{Error, FormatError, ParseError, SchemaError, TransformError};
pub use layout::{Alignment, FieldSpec, FixedWidth, Layout, Slots, field, group};
pub use plan::{FieldKind, FieldPlan, ScalarRole, Sentinel, Shape, TypePlan, plan};
pub use record::Record;
pub use transform::{DateFormat, FieldValue, ImpliedDecimal, Natural, Transform};
