//! Integer factor splitting for the proof search.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed};

/// Split `n` into two factors whose product is `n`, smallest prime
/// factor first, by trial division up to the square root. Primes (and
/// `0`, `±1`) come back as `(1, n)`. For negative `n` the absolute value
/// is factored and the sign rides on the cofactor.
pub fn factorize(n: &BigInt) -> (BigInt, BigInt) {
    let abs = n.abs();
    if abs <= BigInt::one() {
        return (BigInt::one(), n.clone());
    }
    let root = abs.sqrt();
    let mut candidate = BigInt::from(2);
    while candidate <= root {
        if abs.is_multiple_of(&candidate) {
            let mut cofactor = &abs / &candidate;
            if n.is_negative() {
                cofactor = -cofactor;
            }
            return (candidate, cofactor);
        }
        candidate += 1;
    }
    (BigInt::one(), n.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(n: i64) -> BigInt {
        BigInt::from(n)
    }

    #[test]
    fn splits_composites_smallest_factor_first() {
        assert_eq!(factorize(&big(12)), (big(2), big(6)));
        assert_eq!(factorize(&big(35)), (big(5), big(7)));
        assert_eq!(factorize(&big(49)), (big(7), big(7)));
    }

    #[test]
    fn primes_pair_with_one() {
        assert_eq!(factorize(&big(13)), (big(1), big(13)));
        assert_eq!(factorize(&big(-7)), (big(1), big(-7)));
    }

    #[test]
    fn negative_numbers_keep_sign_on_one_factor() {
        let (a, b) = factorize(&big(-12));
        assert_eq!(&a * &b, big(-12));
        assert_eq!(a, big(2));
        assert_eq!(b, big(-6));
    }

    #[test]
    fn product_always_reconstructs() {
        for n in -60i64..=60 {
            if n == 0 || n == 1 || n == -1 {
                continue;
            }
            let v = big(n);
            let (a, b) = factorize(&v);
            assert_eq!(&a * &b, v, "factorize({n})");
        }
    }

    #[test]
    fn zero_and_units_are_left_alone() {
        assert_eq!(factorize(&big(0)), (big(1), big(0)));
        assert_eq!(factorize(&big(1)), (big(1), big(1)));
        assert_eq!(factorize(&big(-1)), (big(1), big(-1)));
    }
}
