//! Conversions between field text and typed values.
//!
//! Every scalar member resolves to exactly one [`Transform`]. Members declared
//! with [`Layout::field`](crate::Layout::field) use [`Natural`], which
//! delegates to the value type's [`FieldValue`] impl; members declared with
//! [`Layout::field_with`](crate::Layout::field_with) use the transform given
//! there, which always takes precedence.
//!
//! Transforms see text with the pad characters already stripped and return
//! text that the writer pads back out to the slot width.

use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::decimal::Decimal;
use crate::error::TransformError;

/// Two-way conversion between stripped field text and a value of type `V`.
pub trait Transform<V>: Send + Sync + 'static {
    fn decode(&self, text: &str) -> Result<V, TransformError>;
    fn encode(&self, value: &V) -> Result<String, TransformError>;
}

/// A value type with a default field conversion.
pub trait FieldValue: Sized + 'static {
    fn from_field(text: &str) -> Result<Self, TransformError>;
    fn to_field(&self) -> Result<String, TransformError>;
}

/// The default conversion of the value type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Natural;

impl<V: FieldValue> Transform<V> for Natural {
    fn decode(&self, text: &str) -> Result<V, TransformError> {
        V::from_field(text)
    }

    fn encode(&self, value: &V) -> Result<String, TransformError> {
        value.to_field()
    }
}

impl FieldValue for String {
    fn from_field(text: &str) -> Result<Self, TransformError> {
        Ok(text.to_string())
    }

    fn to_field(&self) -> Result<String, TransformError> {
        match self.chars().find(|c| c.is_control()) {
            Some(c) => Err(TransformError::UnsupportedChar(c)),
            None => Ok(self.clone()),
        }
    }
}

macro_rules! integer_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn from_field(text: &str) -> Result<Self, TransformError> {
                    // a field made entirely of pad reads as zero
                    let text = text.trim();
                    if text.is_empty() {
                        return Ok(0);
                    }
                    text.parse::<$ty>().map_err(|e| {
                        TransformError::invalid(format!(
                            "{text:?} is not a valid {}: {e}",
                            stringify!($ty)
                        ))
                    })
                }

                fn to_field(&self) -> Result<String, TransformError> {
                    Ok(self.to_string())
                }
            }
        )*
    };
}

integer_field!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl FieldValue for Decimal {
    fn from_field(text: &str) -> Result<Self, TransformError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Decimal::ZERO);
        }
        text.parse()
    }

    fn to_field(&self) -> Result<String, TransformError> {
        Ok(self.to_string())
    }
}

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

impl FieldValue for Date {
    fn from_field(text: &str) -> Result<Self, TransformError> {
        Date::parse(text.trim(), ISO_DATE)
            .map_err(|e| TransformError::invalid(format!("{text:?} is not a date: {e}")))
    }

    fn to_field(&self) -> Result<String, TransformError> {
        self.format(ISO_DATE)
            .map_err(|e| TransformError::Truncation(e.to_string()))
    }
}

/// Blank fields read as `None`; `None` writes as a blank field.
impl<V: FieldValue> FieldValue for Option<V> {
    fn from_field(text: &str) -> Result<Self, TransformError> {
        if text.trim().is_empty() {
            Ok(None)
        } else {
            V::from_field(text).map(Some)
        }
    }

    fn to_field(&self) -> Result<String, TransformError> {
        match self {
            Some(value) => value.to_field(),
            None => Ok(String::new()),
        }
    }
}

/// Implied-precision amounts: a decimal written as whole minor units.
///
/// With two fraction digits `1050.00` is written `105000` and read back as
/// `1050.00`. Values with more significant fractional digits than configured
/// are rejected rather than rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImpliedDecimal {
    fraction_digits: u32,
}

impl ImpliedDecimal {
    pub const fn new(fraction_digits: u32) -> Self {
        Self { fraction_digits }
    }

    /// Two implied digits, for currencies counted in cents.
    pub const fn pennies() -> Self {
        Self::new(2)
    }

    pub fn fraction_digits(&self) -> u32 {
        self.fraction_digits
    }
}

impl Transform<Decimal> for ImpliedDecimal {
    fn decode(&self, text: &str) -> Result<Decimal, TransformError> {
        if self.fraction_digits > Decimal::MAX_SCALE {
            return Err(TransformError::invalid(format!(
                "{} implied digits exceed the supported scale of {}",
                self.fraction_digits,
                Decimal::MAX_SCALE
            )));
        }
        let text = text.trim();
        if text.is_empty() {
            return Ok(Decimal::new(0, self.fraction_digits));
        }
        let units: i128 = text.parse().map_err(|e| {
            TransformError::invalid(format!("{text:?} is not a whole number of minor units: {e}"))
        })?;
        Ok(Decimal::new(units, self.fraction_digits))
    }

    fn encode(&self, value: &Decimal) -> Result<String, TransformError> {
        value
            .rescaled(self.fraction_digits)
            .map(|units| units.to_string())
            .ok_or_else(|| {
                TransformError::Truncation(format!(
                    "{value} has more than {} fractional digits",
                    self.fraction_digits
                ))
            })
    }
}

/// Dates in a fixed `time` format description, e.g. `[year][month][day]`.
#[derive(Debug, Clone)]
pub struct DateFormat {
    items: Vec<BorrowedFormatItem<'static>>,
}

impl DateFormat {
    pub fn new(description: &'static str) -> Result<Self, TransformError> {
        let items = time::format_description::parse_borrowed::<2>(description).map_err(|e| {
            TransformError::invalid(format!("bad date format {description:?}: {e}"))
        })?;
        Ok(Self { items })
    }
}

impl Transform<Date> for DateFormat {
    fn decode(&self, text: &str) -> Result<Date, TransformError> {
        Date::parse(text, self.items.as_slice())
            .map_err(|e| TransformError::invalid(format!("{text:?} is not a date: {e}")))
    }

    fn encode(&self, value: &Date) -> Result<String, TransformError> {
        value
            .format(self.items.as_slice())
            .map_err(|e| TransformError::Truncation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn test_natural_integers() {
        assert_eq!(<Natural as Transform<i32>>::decode(&Natural, "164").unwrap(), 164);
        assert_eq!(<Natural as Transform<u64>>::decode(&Natural, "").unwrap(), 0);
        assert_eq!(Transform::<i64>::encode(&Natural, &-3).unwrap(), "-3");
        assert!(<Natural as Transform<u8>>::decode(&Natural, "300").is_err());
        assert!(<Natural as Transform<i32>>::decode(&Natural, "12x").is_err());
    }

    #[test]
    fn test_text_rejects_control_characters() {
        let err = Transform::<String>::encode(&Natural, &"A\nB".to_string()).unwrap_err();
        assert_eq!(err, TransformError::UnsupportedChar('\n'));
        assert_eq!(
            Transform::<String>::encode(&Natural, &"T & T".to_string()).unwrap(),
            "T & T"
        );
    }

    #[test]
    fn test_optional_blank_field() {
        let none: Option<u32> = Natural.decode("").unwrap();
        assert_eq!(none, None);
        let some: Option<u32> = Natural.decode("7").unwrap();
        assert_eq!(some, Some(7));
        assert_eq!(Transform::<Option<u32>>::encode(&Natural, &None).unwrap(), "");
    }

    #[test]
    fn test_implied_decimal_two_digits() {
        let pennies = ImpliedDecimal::pennies();
        let amount = Decimal::new(1050, 0);
        assert_eq!(pennies.encode(&amount).unwrap(), "105000");
        assert_eq!(pennies.decode("0000105000").unwrap(), Decimal::new(105000, 2));
        assert_eq!(pennies.decode("").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_implied_decimal_is_configurable() {
        let mills = ImpliedDecimal::new(3);
        assert_eq!(mills.encode(&"1.5".parse().unwrap()).unwrap(), "1500");
        assert_eq!(mills.decode("1500").unwrap(), "1.5".parse().unwrap());

        let whole = ImpliedDecimal::new(0);
        assert_eq!(whole.encode(&Decimal::new(1050, 0)).unwrap(), "1050");
    }

    #[test]
    fn test_implied_decimal_refuses_to_truncate() {
        let err = ImpliedDecimal::pennies()
            .encode(&"10.505".parse().unwrap())
            .unwrap_err();
        assert!(matches!(err, TransformError::Truncation(_)));
    }

    #[test]
    fn test_implied_decimal_scale_limit() {
        let err = ImpliedDecimal::new(40).decode("0000000001").unwrap_err();
        assert!(matches!(err, TransformError::Invalid(_)));
        let finest = ImpliedDecimal::new(Decimal::MAX_SCALE).decode("1").unwrap();
        assert_eq!(finest.scale(), Decimal::MAX_SCALE);
    }

    #[test]
    fn test_date_format() {
        let format = DateFormat::new("[year][month][day]").unwrap();
        let date = Date::from_calendar_date(2020, Month::February, 3).unwrap();
        assert_eq!(format.encode(&date).unwrap(), "20200203");
        assert_eq!(format.decode("20200203").unwrap(), date);
        assert!(format.decode("20201303").is_err());
    }

    #[test]
    fn test_iso_date_default() {
        let date: Date = Natural.decode("2020-02-03").unwrap();
        assert_eq!(Transform::<Date>::encode(&Natural, &date).unwrap(), "2020-02-03");
    }
}
