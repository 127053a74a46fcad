//! Positive-pay issue file records.
//!
//! A file is one header line followed by check groups. Each group lists its
//! check records and closes with a trailer carrying the record count and the
//! total amount:
//!
//! ```text
//! *03 BBBBB AAAAAAAAAAAAAAA 0                              header, 24 columns
//! SSSSSSSSSS MMddyy AAAAAAAAAAAAAAA 320 $$$$$$$$$$ payee   check, 85 columns
//! &               NNNNN     $$$$$$$$$$                    trailer, 80 columns
//! ```

use fixedwidth_rs::{Decimal, FixedWidth, ImpliedDecimal, Layout, field, group};
use time::Date;
use time::macros::date;

use crate::date::IssueDateFormat;

/// Transaction code the bank expects on every issued check.
pub const ISSUED_CHECK: u16 = 320;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositivePayFile {
    pub header: FileHeader,
    pub check_groups: Vec<CheckGroup>,
}

impl FixedWidth for PositivePayFile {
    fn layout() -> Layout<Self> {
        Layout::<Self>::new()
            .composite("header", group(0), |f| &f.header, |f| &mut f.header)
            .repeated(
                "check_groups",
                group(1),
                |f| &f.check_groups,
                |f| &mut f.check_groups,
            )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHeader {
    pub bank_id: u32,
    pub account_number: u64,
}

impl FixedWidth for FileHeader {
    fn layout() -> Layout<Self> {
        Layout::<Self>::new()
            .constant("start", field(0, 3), "*03")
            .field("bank_id", field(1, 5), |h| &h.bank_id, |h| &mut h.bank_id)
            .field(
                "account_number",
                field(2, 15),
                |h| &h.account_number,
                |h| &mut h.account_number,
            )
            .constant("always_zero", field(3, 1), 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRecord {
    pub check_serial: u64,
    pub issue_date: Date,
    pub account_number: u64,
    pub amount: Decimal,
    pub payee: String,
}

impl Default for CheckRecord {
    fn default() -> Self {
        Self {
            check_serial: 0,
            issue_date: date!(2000 - 01 - 01),
            account_number: 0,
            amount: Decimal::ZERO,
            payee: String::new(),
        }
    }
}

impl FixedWidth for CheckRecord {
    fn layout() -> Layout<Self> {
        Layout::<Self>::new()
            .field(
                "check_serial",
                field(0, 10),
                |c| &c.check_serial,
                |c| &mut c.check_serial,
            )
            .field_with(
                "issue_date",
                field(1, 6),
                IssueDateFormat,
                |c| &c.issue_date,
                |c| &mut c.issue_date,
            )
            .field(
                "account_number",
                field(2, 15),
                |c| &c.account_number,
                |c| &mut c.account_number,
            )
            .constant("transaction_code", field(3, 3), ISSUED_CHECK)
            .field_with(
                "amount",
                field(4, 10),
                ImpliedDecimal::pennies(),
                |c| &c.amount,
                |c| &mut c.amount,
            )
            .field("payee", field(5, 41).left(), |c| &c.payee, |c| &mut c.payee)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckGroup {
    pub records: Vec<CheckRecord>,
    pub trailer: CheckGroupTrailer,
}

impl CheckGroup {
    /// A group whose trailer matches `records`.
    ///
    /// Returns `None` if the count or the total does not fit the trailer's
    /// numeric types.
    pub fn from_records(records: Vec<CheckRecord>) -> Option<Self> {
        let trailer = CheckGroupTrailer::summarize(&records)?;
        Some(Self { records, trailer })
    }
}

impl FixedWidth for CheckGroup {
    fn layout() -> Layout<Self> {
        Layout::<Self>::new()
            .repeated("records", group(0), |g| &g.records, |g| &mut g.records)
            .composite("trailer", group(1), |g| &g.trailer, |g| &mut g.trailer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckGroupTrailer {
    pub record_count: u32,
    pub total_amount: Decimal,
}

impl CheckGroupTrailer {
    /// Count and total of `records`.
    pub fn summarize(records: &[CheckRecord]) -> Option<Self> {
        let total_amount = records
            .iter()
            .try_fold(Decimal::ZERO, |sum, r| sum.checked_add(&r.amount))?;
        Some(Self {
            record_count: u32::try_from(records.len()).ok()?,
            total_amount,
        })
    }
}

impl FixedWidth for CheckGroupTrailer {
    fn layout() -> Layout<Self> {
        Layout::<Self>::new()
            .constant("start", field(0, 15).left(), "&")
            .field(
                "record_count",
                field(1, 5),
                |t| &t.record_count,
                |t| &mut t.record_count,
            )
            .constant("spacer", [field(2, 3).pad(' '), field(4, 47).pad(' ')], "")
            .field_with(
                "total_amount",
                field(3, 10),
                ImpliedDecimal::pennies(),
                |t| &t.total_amount,
                |t| &mut t.total_amount,
            )
    }
}
