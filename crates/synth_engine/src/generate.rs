//! Combinatorial dictionary seeding from a base digit string.

use rustc_hash::FxHashMap;
use synth_ast::{Node, Value};
use tracing::trace;

use crate::error::EngineError;
use crate::mapping::Mapping;
use crate::merge::merge;

/// Recursive digit-splitting generator, memoized per digit substring.
/// The memo lives for one base string; a new base needs a new generator.
pub struct Generator {
    memo: FxHashMap<String, Mapping>,
    bound: Value,
}

impl Generator {
    pub fn new(bound: Value) -> Generator {
        Generator {
            memo: FxHashMap::default(),
            bound,
        }
    }

    /// Build the mapping for `digits`: merge every prefix/suffix split,
    /// then add the literal numeral itself.
    ///
    /// Each split point computes a fresh merge and overwrites the previous
    /// one, so only the final split's combinations survive. Deliberate:
    /// the self-merge in `Dictionary::build` recovers most of the dropped
    /// combinations (see DESIGN.md before changing this to a union).
    pub fn generate(&mut self, digits: &str) -> Result<Mapping, EngineError> {
        if let Some(known) = self.memo.get(digits) {
            return Ok(known.clone());
        }
        let mut mapping = Mapping::new();
        for i in 1..digits.len() {
            let left = self.generate(&digits[..i])?;
            let right = self.generate(&digits[i..])?;
            mapping = merge(&left, &right, &self.bound);
        }
        let literal = Node::leaf(digits)?;
        mapping.insert(Value::parse(digits)?, literal);
        trace!(digits, entries = mapping.len(), "generated sub-mapping");
        self.memo.insert(digits.to_string(), mapping.clone());
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator_for(base: &str) -> Generator {
        let bound = Value::parse(&format!("{base}{base}")).unwrap();
        Generator::new(bound)
    }

    #[test]
    fn single_digit_is_just_the_literal() {
        let mut g = generator_for("7");
        let m = g.generate("7").unwrap();
        assert_eq!(m.len(), 2); // literal and its negation
        assert_eq!(m.get("7").unwrap().node.render(), "7");
        assert!(m.contains("-7"));
    }

    #[test]
    fn literal_always_present_for_longer_strings() {
        let mut g = generator_for("123");
        let m = g.generate("123").unwrap();
        assert!(m.contains("123"));
        assert!(m.contains("-123"));
        assert_eq!(m.get("123").unwrap().node.render(), "123");
    }

    #[test]
    fn last_split_wins() {
        // "123" splits as 1|23 then 12|3; only 12|3 combinations survive.
        let mut g = generator_for("123");
        let m = g.generate("123").unwrap();
        assert!(m.contains("15")); // 12 + 3
        assert!(m.contains("36")); // 12 * 3
        assert!(m.contains("4")); // 12 / 3
        assert!(!m.contains("24")); // 1 + 23 belonged to the discarded split
    }

    #[test]
    fn memo_returns_consistent_mappings() {
        let mut g = generator_for("55");
        let a = g.generate("5").unwrap();
        let b = g.generate("5").unwrap();
        assert_eq!(a.len(), b.len());
        // memoized nodes share identity
        assert!(a.get("5").unwrap().node.ptr_eq(&b.get("5").unwrap().node));
    }
}
