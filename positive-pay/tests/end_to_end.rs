use fixedwidth_rs::{Decimal, EncodeOptions, ParseError};
use positive_pay::{
    CheckGroup, CheckRecord, Discrepancy, Error, FileHeader, PositivePayFile, load, parse, render,
    store, store_with, verify,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use time::macros::date;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/pos_AP_20200207.txt")
}

fn fixture_text() -> String {
    fs::read_to_string(fixture_path()).unwrap()
}

fn expected_file() -> PositivePayFile {
    let record = CheckRecord {
        check_serial: 19983,
        issue_date: date!(2020 - 02 - 03),
        account_number: 5555333111,
        amount: "1050.00".parse().unwrap(),
        payee: "T & T TESTPAYEE, L.P".to_string(),
    };
    PositivePayFile {
        header: FileHeader {
            bank_id: 164,
            account_number: 5555333111,
        },
        check_groups: vec![CheckGroup::from_records(vec![record]).unwrap()],
    }
}

#[test]
fn test_decode_bank_file() {
    let file = load(fixture_path()).unwrap();
    assert_eq!(file, expected_file());

    let group = &file.check_groups[0];
    assert_eq!(group.trailer.record_count, 1);
    assert_eq!(group.trailer.total_amount, Decimal::new(105000, 2));
    assert_eq!(group.records[0].payee, "T & T TESTPAYEE, L.P");
}

#[test]
fn test_reencode_is_byte_exact() {
    let text = fixture_text();
    let file = parse(&text).unwrap();
    assert_eq!(render(&file, &EncodeOptions::default()).unwrap(), text);

    let lines: Vec<usize> = text.lines().map(str::len).collect();
    assert_eq!(lines, vec![24, 85, 80]);
}

#[test]
fn test_encode_from_model() {
    let text = render(&expected_file(), &EncodeOptions::default()).unwrap();
    assert_eq!(text, fixture_text());
}

#[test]
fn test_fixture_verifies() {
    assert!(verify(&load(fixture_path()).unwrap()).is_empty());
}

#[test]
fn test_several_groups_and_an_empty_one() {
    let mut file = expected_file();
    let second = CheckRecord {
        check_serial: 19984,
        issue_date: date!(1999 - 12 - 31),
        account_number: 5555333111,
        amount: "0.99".parse().unwrap(),
        payee: "ACME".to_string(),
    };
    file.check_groups
        .push(CheckGroup::from_records(vec![second.clone(), second]).unwrap());
    file.check_groups
        .push(CheckGroup::from_records(Vec::new()).unwrap());

    let text = render(&file, &EncodeOptions::default()).unwrap();
    assert_eq!(text.lines().count(), 1 + 2 + 3 + 1);
    let decoded = parse(&text).unwrap();
    let counts: Vec<usize> = decoded.check_groups.iter().map(|g| g.records.len()).collect();
    assert_eq!(counts, vec![1, 2, 0]);
    assert_eq!(decoded, file);
}

#[test]
fn test_store_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out").join("positive_pay.txt");
    store(&path, &expected_file()).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), fixture_text());
    assert_eq!(load(&path).unwrap(), expected_file());
}

#[test]
fn test_crlf_output_still_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("crlf.txt");
    let options = EncodeOptions::default().crlf().with_final_newline();
    store_with(&path, &expected_file(), &options).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(written.matches("\r\n").count(), 3);
    assert_eq!(load(&path).unwrap(), expected_file());
}

#[test]
fn test_missing_trailer_is_reported_with_path() {
    let text = fixture_text();
    let truncated: Vec<&str> = text.lines().take(2).collect();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("truncated.txt");
    fs::write(&path, truncated.join("\n")).unwrap();

    let err = load(&path).unwrap_err();
    let Error::Parse { source, .. } = &err else {
        panic!("expected a parse error, got {err:?}");
    };
    assert_eq!(
        source,
        &ParseError::MissingTrailer {
            line: 3,
            member: "records",
            sentinel: "&".to_string(),
        }
    );
    assert!(err.to_string().contains("truncated.txt"));
}

#[test]
fn test_wrong_transaction_code() {
    let text = fixture_text().replacen("111320", "111321", 1);
    let err = parse(&text).unwrap_err();
    assert_eq!(
        err,
        ParseError::UnexpectedSentinel {
            line: 2,
            member: "transaction_code",
            expected: "320".to_string(),
            found: "321".to_string(),
        }
    );
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = load(dir.path().join("absent.txt")).unwrap_err();
    assert!(matches!(err, Error::Read { .. }));
}

#[test]
fn test_tampered_trailer_fails_verification() {
    let text = fixture_text().replacen("&              00001", "&              00002", 1);
    let file = parse(&text).unwrap();
    assert_eq!(
        verify(&file),
        vec![Discrepancy::RecordCount {
            group: 1,
            declared: 2,
            actual: 1,
        }]
    );
}
