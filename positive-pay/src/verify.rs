//! Business checks the codec itself does not make.
//!
//! Decoding accepts any trailer that parses. Before a file is sent to the bank
//! its trailers should agree with their check records, and every check should
//! be drawn on the account named in the header.

use std::fmt;

use fixedwidth_rs::Decimal;

use crate::model::{CheckGroupTrailer, PositivePayFile};

/// One disagreement found by [`verify`]. Groups and records count from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discrepancy {
    RecordCount {
        group: usize,
        declared: u32,
        actual: usize,
    },
    TotalAmount {
        group: usize,
        declared: Decimal,
        actual: Decimal,
    },
    /// The group's amounts cannot be summed without overflow.
    TotalOverflow { group: usize },
    AccountMismatch {
        group: usize,
        record: usize,
        expected: u64,
        found: u64,
    },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::RecordCount {
                group,
                declared,
                actual,
            } => write!(
                f,
                "group {group}: trailer declares {declared} record(s), found {actual}"
            ),
            Discrepancy::TotalAmount {
                group,
                declared,
                actual,
            } => write!(
                f,
                "group {group}: trailer total {declared} does not match records total {actual}"
            ),
            Discrepancy::TotalOverflow { group } => {
                write!(f, "group {group}: record amounts overflow")
            }
            Discrepancy::AccountMismatch {
                group,
                record,
                expected,
                found,
            } => write!(
                f,
                "group {group}, record {record}: account {found}, header account {expected}"
            ),
        }
    }
}

/// Compare every trailer with its records and every record with the header.
pub fn verify(file: &PositivePayFile) -> Vec<Discrepancy> {
    let mut found = Vec::new();
    let expected = file.header.account_number;

    for (index, check_group) in file.check_groups.iter().enumerate() {
        let group = index + 1;
        let trailer = &check_group.trailer;

        if usize::try_from(trailer.record_count).ok() != Some(check_group.records.len()) {
            found.push(Discrepancy::RecordCount {
                group,
                declared: trailer.record_count,
                actual: check_group.records.len(),
            });
        }

        let actual = check_group
            .records
            .iter()
            .try_fold(Decimal::ZERO, |sum, r| sum.checked_add(&r.amount));
        match actual {
            Some(actual) if actual != trailer.total_amount => {
                found.push(Discrepancy::TotalAmount {
                    group,
                    declared: trailer.total_amount,
                    actual,
                });
            }
            Some(_) => {}
            None => found.push(Discrepancy::TotalOverflow { group }),
        }

        for (record, check) in check_group.records.iter().enumerate() {
            if check.account_number != expected {
                found.push(Discrepancy::AccountMismatch {
                    group,
                    record: record + 1,
                    expected,
                    found: check.account_number,
                });
            }
        }
    }
    found
}

/// Rewrite every trailer from its records.
pub fn recompute_trailers(file: &mut PositivePayFile) -> Result<(), Discrepancy> {
    for (index, check_group) in file.check_groups.iter_mut().enumerate() {
        check_group.trailer = CheckGroupTrailer::summarize(&check_group.records)
            .ok_or(Discrepancy::TotalOverflow { group: index + 1 })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CheckGroup, CheckRecord, FileHeader};
    use pretty_assertions::assert_eq;

    fn check(account_number: u64, amount: &str) -> CheckRecord {
        CheckRecord {
            account_number,
            amount: amount.parse().unwrap(),
            ..CheckRecord::default()
        }
    }

    fn file(groups: Vec<CheckGroup>) -> PositivePayFile {
        PositivePayFile {
            header: FileHeader {
                bank_id: 164,
                account_number: 5555333111,
            },
            check_groups: groups,
        }
    }

    #[test]
    fn test_consistent_file_has_no_discrepancies() {
        let group = CheckGroup::from_records(vec![check(5555333111, "10.00")]).unwrap();
        assert!(verify(&file(vec![group])).is_empty());
    }

    #[test]
    fn test_reports_every_disagreement() {
        let mut group = CheckGroup::from_records(vec![
            check(5555333111, "10.00"),
            check(42, "5.00"),
        ])
        .unwrap();
        group.trailer.record_count = 3;
        group.trailer.total_amount = "16.00".parse().unwrap();

        assert_eq!(
            verify(&file(vec![group])),
            vec![
                Discrepancy::RecordCount {
                    group: 1,
                    declared: 3,
                    actual: 2,
                },
                Discrepancy::TotalAmount {
                    group: 1,
                    declared: "16.00".parse().unwrap(),
                    actual: "15.00".parse().unwrap(),
                },
                Discrepancy::AccountMismatch {
                    group: 1,
                    record: 2,
                    expected: 5555333111,
                    found: 42,
                },
            ]
        );
    }

    #[test]
    fn test_recompute_trailers() {
        let mut broken = file(vec![CheckGroup {
            records: vec![check(5555333111, "1.50"), check(5555333111, "2.50")],
            trailer: CheckGroupTrailer::default(),
        }]);
        assert_eq!(verify(&broken).len(), 2);
        recompute_trailers(&mut broken).unwrap();
        assert!(verify(&broken).is_empty());
        assert_eq!(broken.check_groups[0].trailer.record_count, 2);
    }

    #[test]
    fn test_display() {
        let discrepancy = Discrepancy::RecordCount {
            group: 2,
            declared: 1,
            actual: 0,
        };
        assert_eq!(
            discrepancy.to_string(),
            "group 2: trailer declares 1 record(s), found 0"
        );
    }
}
