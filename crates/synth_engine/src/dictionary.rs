//! Dictionary construction and queries.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use synth_ast::{Node, Value};
use tracing::debug;

use crate::error::EngineError;
use crate::generate::Generator;
use crate::mapping::{Entry, Mapping};
use crate::merge::merge;

/// A growing knowledge base of expressions over one base digit string.
///
/// Built once per base; every successful proof query writes its derived
/// results back in, so later queries get cheaper. Queries must be
/// serialized by the caller; the dictionary is single-threaded state.
pub struct Dictionary {
    pub(crate) map: Mapping,
    pub(crate) rng: ChaCha8Rng,
    base: String,
}

impl Dictionary {
    /// Build the initial knowledge base for `base`. Non-digit characters
    /// are stripped first.
    pub fn build(base: &str) -> Result<Dictionary, EngineError> {
        Self::build_impl(base, ChaCha8Rng::from_entropy())
    }

    /// Like [`Self::build`] but with a fixed diversification seed, so
    /// repeated runs explore identically.
    pub fn build_seeded(base: &str, seed: u64) -> Result<Dictionary, EngineError> {
        Self::build_impl(base, ChaCha8Rng::seed_from_u64(seed))
    }

    fn build_impl(base: &str, rng: ChaCha8Rng) -> Result<Dictionary, EngineError> {
        let digits: String = base.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Err(EngineError::EmptyBase);
        }
        // Headroom above the base's own magnitude for the power pruning.
        let bound = Value::parse(&format!("{digits}{digits}"))?;

        let mut generator = Generator::new(bound.clone());
        let mut map = generator.generate(&digits)?;

        // The literal base merged with itself buys the degenerate
        // combinations (0, 1, twice and square of the base) even when the
        // split recursion discarded them.
        let mut trivial = Mapping::new();
        trivial.insert(Value::parse(&digits)?, Node::leaf(&digits)?);
        let trivial_squared = merge(&trivial, &trivial, &bound);
        map.union(&trivial);
        map.union(&trivial_squared);

        // One more level of operator composition across everything known.
        let composed = merge(&map, &map, &bound);
        map.union(&composed);

        debug!(base = %digits, entries = map.len(), "dictionary initialized");
        Ok(Dictionary {
            map,
            rng,
            base: digits,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The cheapest known node for a canonical value string.
    pub fn lookup(&self, key: &str) -> Option<Node> {
        self.map.get(key).map(|e| e.node.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains(key)
    }

    /// Snapshot of all entries, descending magnitude.
    pub fn entries(&self) -> Vec<Entry> {
        self.map.sorted_entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_literal_is_always_present() {
        let dict = Dictionary::build_seeded("123", 1).unwrap();
        assert!(dict.contains("123"));
        assert!(dict.contains("-123"));
        assert_eq!(dict.lookup("123").unwrap().render(), "123");
    }

    #[test]
    fn non_digit_characters_are_stripped() {
        let dict = Dictionary::build_seeded(" 1,2-3 ", 1).unwrap();
        assert_eq!(dict.base(), "123");
        assert!(dict.contains("123"));
    }

    #[test]
    fn empty_base_is_rejected() {
        assert!(matches!(
            Dictionary::build("abc"),
            Err(EngineError::EmptyBase)
        ));
    }

    #[test]
    fn trivial_self_merge_contributes_zero_and_one() {
        let dict = Dictionary::build_seeded("123", 1).unwrap();
        assert!(dict.contains("0"));
        assert!(dict.contains("1"));
        assert!(dict.contains("246")); // 123 + 123
    }

    #[test]
    fn negation_closure_holds_everywhere() {
        let dict = Dictionary::build_seeded("47", 1).unwrap();
        for entry in dict.entries() {
            let negated = (-&entry.value).to_string();
            assert!(dict.contains(&negated), "missing negation of {}", entry.value);
        }
    }
}
