//! Exact arbitrary-precision values.
//!
//! [`Value`] is a thin wrapper over [`BigRational`] that adds the fallible
//! operations the engine needs: division, floored modulo and exponentiation
//! all signal a [`ValueError`] when the result is undefined, so callers can
//! distinguish "undefined" from "zero". Total operations (add, sub, mul,
//! neg) are exposed through the standard operator traits.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::error::ValueError;

/// An exact rational value. Equality, ordering and the canonical string
/// form are total and exact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Value(BigRational);

impl Value {
    /// Parse a canonical numeral: an optionally signed decimal integer or
    /// `numerator/denominator` pair.
    pub fn parse(input: &str) -> Result<Value, ValueError> {
        let s = input.trim();
        let bad = || ValueError::InvalidNumeral(input.to_string());
        if let Some((num, den)) = s.split_once('/') {
            let n = BigInt::from_str(num.trim()).map_err(|_| bad())?;
            let d = BigInt::from_str(den.trim()).map_err(|_| bad())?;
            if d.is_zero() {
                return Err(bad());
            }
            Ok(Value(BigRational::new(n, d)))
        } else {
            let n = BigInt::from_str(s).map_err(|_| bad())?;
            Ok(Value(BigRational::from_integer(n)))
        }
    }

    pub fn zero() -> Value {
        Value(BigRational::zero())
    }

    pub fn one() -> Value {
        Value(BigRational::one())
    }

    pub fn from_bigint(n: BigInt) -> Value {
        Value(BigRational::from_integer(n))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_integer(&self) -> bool {
        self.0.is_integer()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// The integer this value denotes, if it is one.
    pub fn to_integer(&self) -> Option<BigInt> {
        if self.0.is_integer() {
            Some(self.0.to_integer())
        } else {
            None
        }
    }

    /// Numerator as a value (sign carried here).
    pub fn numerator(&self) -> Value {
        Value::from_bigint(self.0.numer().clone())
    }

    /// Denominator as a value (always positive).
    pub fn denominator(&self) -> Value {
        Value::from_bigint(self.0.denom().clone())
    }

    pub fn abs(&self) -> Value {
        Value(self.0.abs())
    }

    pub fn floor(&self) -> Value {
        Value(self.0.floor())
    }

    /// Compare absolute magnitudes.
    pub fn cmp_abs(&self, other: &Value) -> Ordering {
        self.0.abs().cmp(&other.0.abs())
    }

    /// `|self| < |other|`.
    pub fn abs_lt(&self, other: &Value) -> bool {
        self.cmp_abs(other) == Ordering::Less
    }

    /// Number of decimal digits in the truncated absolute value.
    /// `0` has one digit.
    pub fn digit_len(&self) -> usize {
        let trunc = self.0.abs().to_integer();
        trunc.to_string().len()
    }

    pub fn checked_div(&self, rhs: &Value) -> Result<Value, ValueError> {
        if rhs.is_zero() {
            return Err(ValueError::DivisionByZero);
        }
        Ok(Value(&self.0 / &rhs.0))
    }

    /// Floored integer quotient. Defined only for integer operands with a
    /// nonzero divisor.
    pub fn checked_div_floor(&self, rhs: &Value) -> Result<Value, ValueError> {
        let (a, b) = self.integer_pair(rhs, ValueError::UndefinedModulo)?;
        Ok(Value::from_bigint(a.div_floor(&b)))
    }

    /// Floored remainder, the counterpart of [`Self::checked_div_floor`]:
    /// `a == b * (a div_floor b) + (a mod_floor b)`.
    pub fn checked_mod(&self, rhs: &Value) -> Result<Value, ValueError> {
        let (a, b) = self.integer_pair(rhs, ValueError::UndefinedModulo)?;
        Ok(Value::from_bigint(a.mod_floor(&b)))
    }

    fn integer_pair(
        &self,
        rhs: &Value,
        err: fn(String, String) -> ValueError,
    ) -> Result<(BigInt, BigInt), ValueError> {
        let fail = || err(self.to_string(), rhs.to_string());
        let a = self.to_integer().ok_or_else(fail)?;
        let b = rhs.to_integer().ok_or_else(fail)?;
        if b.is_zero() {
            return Err(fail());
        }
        Ok((a, b))
    }

    /// Exact power with an integer exponent, square-and-multiply.
    ///
    /// Undefined for fractional exponents (would not stay exact), for
    /// `0^0`, and for negative exponents on zero.
    pub fn checked_pow(&self, exp: &Value) -> Result<Value, ValueError> {
        let fail = || ValueError::UndefinedPower(self.to_string(), exp.to_string());
        let e = exp.to_integer().and_then(|n| n.to_i64()).ok_or_else(fail)?;
        if self.is_zero() && e <= 0 {
            return Err(fail());
        }
        let mut result = BigRational::one();
        let mut base = self.0.clone();
        let mut n = e.unsigned_abs();
        while n > 0 {
            if n & 1 == 1 {
                result *= &base;
            }
            n >>= 1;
            if n > 0 {
                base = &base * &base;
            }
        }
        if e < 0 {
            result = BigRational::one() / result;
        }
        Ok(Value(result))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Ratio prints "n/d" for non-integers and the bare numerator
        // otherwise, which is exactly the canonical key form.
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::from_bigint(BigInt::from(n))
    }
}

macro_rules! forward_binop {
    ($trait:ident, $method:ident) => {
        impl std::ops::$trait for &Value {
            type Output = Value;
            fn $method(self, rhs: &Value) -> Value {
                Value(std::ops::$trait::$method(&self.0, &rhs.0))
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);

impl std::ops::Neg for &Value {
    type Output = Value;
    fn neg(self) -> Value {
        Value(-&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Value {
        Value::parse(s).unwrap()
    }

    #[test]
    fn parse_and_format_roundtrip() {
        assert_eq!(v("123").to_string(), "123");
        assert_eq!(v("-42").to_string(), "-42");
        assert_eq!(v("1/8").to_string(), "1/8");
        assert_eq!(v("-6/4").to_string(), "-3/2");
        assert!(Value::parse("12a").is_err());
        assert!(Value::parse("1/0").is_err());
    }

    #[test]
    fn division_by_zero_is_a_domain_error() {
        assert_eq!(
            v("5").checked_div(&Value::zero()),
            Err(ValueError::DivisionByZero)
        );
        assert_eq!(v("6").checked_div(&v("4")).unwrap(), v("3/2"));
    }

    #[test]
    fn floored_mod_matches_floored_div() {
        let a = v("-7");
        let b = v("3");
        let q = a.checked_div_floor(&b).unwrap();
        let r = a.checked_mod(&b).unwrap();
        assert_eq!(&(&b * &q) + &r, a);
        assert_eq!(r, v("2"));
    }

    #[test]
    fn mod_requires_integers() {
        assert!(v("1/2").checked_mod(&v("3")).is_err());
        assert!(v("5").checked_mod(&Value::zero()).is_err());
    }

    #[test]
    fn pow_is_exact() {
        assert_eq!(v("2").checked_pow(&v("10")).unwrap(), v("1024"));
        assert_eq!(v("2").checked_pow(&v("-3")).unwrap(), v("1/8"));
        assert_eq!(v("-3").checked_pow(&v("3")).unwrap(), v("-27"));
        assert!(v("0").checked_pow(&v("0")).is_err());
        assert!(v("0").checked_pow(&v("-1")).is_err());
        assert!(v("2").checked_pow(&v("1/2")).is_err());
    }

    #[test]
    fn digit_len_counts_decimal_digits() {
        assert_eq!(v("0").digit_len(), 1);
        assert_eq!(v("-123123").digit_len(), 6);
        assert_eq!(v("7/2").digit_len(), 1);
    }
}
