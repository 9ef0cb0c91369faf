//! Pairwise combination of two mappings.

use synth_ast::{Node, Op, Value};

use crate::mapping::Mapping;

/// Cross-product `a` and `b` into a fresh mapping holding every pairwise
/// sum, difference and product, plus quotients that come out exactly
/// integral, remainders where defined, and powers whose operands both
/// stay within the decimal digit count of `bound`. Domain failures skip
/// the single combination that produced them.
///
/// `bound` is conventionally the base digit string repeated twice, which
/// keeps exponent growth within a couple of digits of the base itself.
pub fn merge(a: &Mapping, b: &Mapping, bound: &Value) -> Mapping {
    let pow_limit = Value::from(bound.digit_len() as i64);
    let mut out = Mapping::new();

    for ea in a.iter() {
        for eb in b.iter() {
            let lhs = || ea.node.clone();
            let rhs = || eb.node.clone();

            out.insert(&ea.value + &eb.value, Node::binary(Op::Add, lhs(), rhs()));
            out.insert(&ea.value - &eb.value, Node::binary(Op::Sub, lhs(), rhs()));
            out.insert(&ea.value * &eb.value, Node::binary(Op::Mul, lhs(), rhs()));

            if let Ok(q) = ea.value.checked_div(&eb.value) {
                if q.is_integer() {
                    out.insert(q, Node::binary(Op::Div, lhs(), rhs()));
                }
            }

            if let Ok(r) = ea.value.checked_mod(&eb.value) {
                out.insert(r, Node::binary(Op::Mod, lhs(), rhs()));
            }

            let within_bound = ea.value.cmp_abs(&pow_limit) != std::cmp::Ordering::Greater
                && eb.value.cmp_abs(&pow_limit) != std::cmp::Ordering::Greater;
            if within_bound {
                if let Ok(p) = ea.value.checked_pow(&eb.value) {
                    out.insert(p, Node::binary(Op::Pow, lhs(), rhs()));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn singleton(text: &str) -> Mapping {
        let mut m = Mapping::new();
        m.insert(Value::parse(text).unwrap(), Node::leaf(text).unwrap());
        m
    }

    fn bound() -> Value {
        Value::parse("1212").unwrap()
    }

    #[test]
    fn produces_all_defined_combinations() {
        let out = merge(&singleton("6"), &singleton("3"), &bound());
        for key in ["9", "3", "18", "2", "0", "-9", "-18"] {
            assert!(out.contains(key), "missing {key}");
        }
        // 6^3 is pruned: |6| exceeds the 4-digit length of the bound
        assert!(!out.contains("216"));
    }

    #[test]
    fn inexact_quotients_are_skipped() {
        let out = merge(&singleton("7"), &singleton("2"), &bound());
        assert!(!out.contains("7/2"));
        assert!(out.contains("14"));
    }

    #[test]
    fn division_by_zero_is_non_fatal() {
        let mut zero = Mapping::new();
        zero.insert(
            Value::zero(),
            Node::binary(Op::Sub, Node::leaf("1").unwrap(), Node::leaf("1").unwrap()),
        );
        let out = merge(&singleton("5"), &zero, &bound());
        // sum, difference, product still land
        assert!(out.contains("5"));
        assert!(out.contains("0"));
    }

    #[test]
    fn small_operands_do_power() {
        let out = merge(&singleton("2"), &singleton("3"), &bound());
        assert!(out.contains("8"));
        // negation closure interacts: (-2)^3 and 2^(-3) land too
        assert!(out.contains("-8"));
        assert!(out.contains("1/8"));
    }
}
