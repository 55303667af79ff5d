//! Numeric tower: exact arbitrary-precision integers and arbitrary-precision decimals.
//!
//! Arithmetic stays exact while both operands are integers and promotes both sides
//! to [`BigDecimal`] as soon as one operand is a decimal. Decimals are kept
//! normalized (no trailing zeros) and always print with at least one fractional
//! digit, so `(* 1.5 2)` prints as `3.0` and never collapses into the integer `3`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use crate::{Error, ErrorKind};

/// Largest decimal exponent a literal may carry, in either direction
const MAX_LITERAL_EXPONENT: u64 = 4096;

#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Integer(BigInt),
    Decimal(BigDecimal),
}

impl Number {
    /// Build a decimal, normalizing its scale
    pub fn decimal(value: BigDecimal) -> Self {
        Number::Decimal(value.normalized())
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Integer(n) => n.is_zero(),
            Number::Decimal(d) => d.is_zero(),
        }
    }

    /// This number as a decimal (integers get scale 0)
    pub fn to_decimal(&self) -> BigDecimal {
        match self {
            Number::Integer(n) => BigDecimal::new(n.clone(), 0),
            Number::Decimal(d) => d.clone(),
        }
    }

    pub fn negate(&self) -> Number {
        match self {
            Number::Integer(n) => Number::Integer(-n),
            Number::Decimal(d) => Number::decimal(-d.clone()),
        }
    }

    pub fn add(&self, other: &Number) -> Number {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => Number::Integer(a + b),
            _ => Number::decimal(self.to_decimal() + other.to_decimal()),
        }
    }

    pub fn subtract(&self, other: &Number) -> Number {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => Number::Integer(a - b),
            _ => Number::decimal(self.to_decimal() - other.to_decimal()),
        }
    }

    pub fn multiply(&self, other: &Number) -> Number {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => Number::Integer(a * b),
            _ => Number::decimal(self.to_decimal() * other.to_decimal()),
        }
    }

    /// Integer division truncates toward zero; decimal division is carried out
    /// to the default decimal precision.
    pub fn divide(&self, other: &Number) -> Result<Number, Error> {
        if other.is_zero() {
            return Err(Error::eval(ErrorKind::DivisionByZero, "Division by zero"));
        }
        Ok(match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => Number::Integer(a / b),
            _ => Number::decimal(self.to_decimal() / other.to_decimal()),
        })
    }

    /// `1 / self`
    pub fn reciprocal(&self) -> Result<Number, Error> {
        Number::Integer(BigInt::one()).divide(self)
    }

    /// Numeric ordering across integers and decimals
    pub fn compare(&self, other: &Number) -> Ordering {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a.cmp(b),
            _ => self.to_decimal().cmp(&other.to_decimal()),
        }
    }
}

impl FromStr for Number {
    type Err = Error;

    /// A literal containing `.` is a decimal (optionally with an exponent),
    /// anything else must be an exact integer.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let not_a_number = || Error::eval(ErrorKind::NotANumber, format!("Not a number: {text}"));
        if text.contains('.') {
            let value = BigDecimal::from_str(text)
                .map_err(|_| not_a_number())?
                .normalized();
            let (_, scale) = value.as_bigint_and_exponent();
            if scale.unsigned_abs() > MAX_LITERAL_EXPONENT {
                return Err(not_a_number());
            }
            Ok(Number::decimal(value))
        } else {
            BigInt::from_str(text)
                .map(Number::Integer)
                .map_err(|_| not_a_number())
        }
    }
}

impl From<BigInt> for Number {
    fn from(n: BigInt) -> Self {
        Number::Integer(n)
    }
}

impl From<BigDecimal> for Number {
    fn from(d: BigDecimal) -> Self {
        Number::decimal(d)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Number {
            fn from(n: $int_type) -> Self {
                Number::Integer(BigInt::from(n))
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(i64);
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);
impl_from_integer!(u64);

fn fmt_decimal(value: &BigDecimal, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let (digits, scale) = value.as_bigint_and_exponent();
    if scale <= 0 {
        let exponent = u32::try_from(-scale).map_err(|_| fmt::Error)?;
        let whole = digits * BigInt::from(10u8).pow(exponent);
        return write!(f, "{whole}.0");
    }

    let scale = usize::try_from(scale).map_err(|_| fmt::Error)?;
    let sign = if digits.is_negative() { "-" } else { "" };
    let mut text = digits.abs().to_string();
    if text.len() <= scale {
        text.insert_str(0, &"0".repeat(scale + 1 - text.len()));
    }
    let (whole, fraction) = text.split_at(text.len() - scale);
    write!(f, "{sign}{whole}.{fraction}")
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(n) => write!(f, "{n}"),
            Number::Decimal(d) => fmt_decimal(d, f),
        }
    }
}
