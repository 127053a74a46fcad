//! Issue dates as written by the bank: `MMddyy`.

use fixedwidth_rs::{Transform, TransformError};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Month};

const MMDDYY: &[BorrowedFormatItem<'static>] =
    format_description!("[month][day][year repr:last_two]");

/// Two-digit years below this are in the 2000s, the rest in the 1900s.
pub const CENTURY_PIVOT: i32 = 50;

/// `MMddyy` with a fixed century pivot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueDateFormat;

impl IssueDateFormat {
    fn digits(text: &str, range: std::ops::Range<usize>) -> Result<u8, TransformError> {
        text[range]
            .parse()
            .map_err(|_| TransformError::invalid(format!("{text:?} is not an MMddyy date")))
    }
}

impl Transform<Date> for IssueDateFormat {
    fn decode(&self, text: &str) -> Result<Date, TransformError> {
        // the field is zero padded, so a leading zero month arrives stripped
        let text = format!("{:0>6}", text.trim());
        if text.len() != 6 || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TransformError::invalid(format!(
                "{text:?} is not an MMddyy date"
            )));
        }
        let month = Self::digits(&text, 0..2)?;
        let day = Self::digits(&text, 2..4)?;
        let yy = i32::from(Self::digits(&text, 4..6)?);
        let year = if yy < CENTURY_PIVOT { 2000 + yy } else { 1900 + yy };

        let month = Month::try_from(month)
            .map_err(|e| TransformError::invalid(format!("{text:?}: {e}")))?;
        Date::from_calendar_date(year, month, day)
            .map_err(|e| TransformError::invalid(format!("{text:?}: {e}")))
    }

    fn encode(&self, value: &Date) -> Result<String, TransformError> {
        let first = 1900 + CENTURY_PIVOT;
        if !(first..first + 100).contains(&value.year()) {
            return Err(TransformError::Truncation(format!(
                "{value} cannot be written with a two-digit year"
            )));
        }
        value
            .format(MMDDYY)
            .map_err(|e| TransformError::Truncation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_decode_issue_date() {
        assert_eq!(IssueDateFormat.decode("020320").unwrap(), date!(2020 - 02 - 03));
        // as handed over by the reader after stripping zero pad
        assert_eq!(IssueDateFormat.decode("20320").unwrap(), date!(2020 - 02 - 03));
        assert_eq!(IssueDateFormat.decode("123199").unwrap(), date!(1999 - 12 - 31));
    }

    #[test]
    fn test_century_pivot() {
        assert_eq!(IssueDateFormat.decode("010149").unwrap().year(), 2049);
        assert_eq!(IssueDateFormat.decode("010150").unwrap().year(), 1950);
    }

    #[test]
    fn test_rejects_bad_dates() {
        assert!(IssueDateFormat.decode("130120").is_err());
        assert!(IssueDateFormat.decode("023020").is_err());
        assert!(IssueDateFormat.decode("02AB20").is_err());
        assert!(IssueDateFormat.decode("1020320").is_err());
    }

    #[test]
    fn test_encode_issue_date() {
        assert_eq!(IssueDateFormat.encode(&date!(2020 - 02 - 03)).unwrap(), "020320");
        assert_eq!(IssueDateFormat.encode(&date!(1999 - 12 - 31)).unwrap(), "123199");
        assert!(matches!(
            IssueDateFormat.encode(&date!(2050 - 01 - 01)),
            Err(TransformError::Truncation(_))
        ));
    }
}
