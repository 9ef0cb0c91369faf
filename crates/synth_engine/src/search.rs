//! Heuristic proof search.
//!
//! Extends the dictionary on demand: a query for a target value either
//! hits an existing key or decomposes the target through a fixed
//! sequence of strategies, recording every intermediate derivation back
//! into the dictionary so later queries start further ahead.
//!
//! Strategy order per call: factor split, then five full passes over the
//! keys sorted by descending magnitude — repeated exact division,
//! inverse multiplication, modulo decomposition, subtraction, addition.
//! The first pass that derives a result wins. Inside the division and
//! modulo passes a success continues scanning from a random earlier key
//! with 1-in-3 probability (bounded by a jump cap), which diversifies
//! the shapes repeated queries settle on.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::{One, Signed};
use rand::Rng;
use synth_ast::{Node, Op, Value};
use tracing::{debug, trace};

use crate::dictionary::Dictionary;
use crate::error::EngineError;
use crate::factor::factorize;
use crate::mapping::Entry;

/// Chance denominator for the keep-scanning jumps: 1 in 3.
const DIVERSIFY_ODDS: u32 = 3;
/// Upper bound on jump-backs within one pass so scanning cannot loop.
const MAX_JUMPS: u32 = 4;

struct Session<'a> {
    requested: Value,
    progress: Option<&'a mut dyn FnMut(&str)>,
}

impl Dictionary {
    /// Prove `target` with an unbounded depth budget.
    pub fn prove(&mut self, target: &str) -> Result<String, EngineError> {
        self.prove_with(target, None, None)
    }

    /// Prove `target`, optionally bounding recursion depth and observing
    /// intermediate results. The callback fires whenever the dictionary
    /// gains an entry for the requested value itself, which happens when
    /// a deep sub-proof resolves it before the outer derivation returns.
    pub fn prove_with(
        &mut self,
        target: &str,
        max_depth: Option<u64>,
        on_progress: Option<&mut dyn FnMut(&str)>,
    ) -> Result<String, EngineError> {
        let value = Value::parse(target)?;
        let node = self.prove_expr(&value, max_depth, on_progress)?;
        Ok(node.render())
    }

    /// As [`Self::prove_with`], returning the proof node itself.
    pub fn prove_expr(
        &mut self,
        target: &Value,
        max_depth: Option<u64>,
        on_progress: Option<&mut dyn FnMut(&str)>,
    ) -> Result<Node, EngineError> {
        let mut session = Session {
            requested: target.clone(),
            progress: on_progress,
        };
        let depth = max_depth.unwrap_or(u64::MAX);
        let node = self.prove_ast(target, depth, &mut session)?;
        debug!(target = %target, proof = %node.render(), "proved");
        Ok(node)
    }

    fn prove_ast(
        &mut self,
        target: &Value,
        depth: u64,
        session: &mut Session<'_>,
    ) -> Result<Node, EngineError> {
        // Non-integer targets split into numerator over denominator. The
        // quotient does not key as either part, so nothing is recorded.
        if !target.is_integer() {
            if depth == 0 {
                return Err(EngineError::DepthExhausted {
                    target: target.to_string(),
                });
            }
            let numer = self.prove_ast(&target.numerator(), depth - 1, session)?;
            let denom = self.prove_ast(&target.denominator(), depth - 1, session)?;
            return Ok(Node::binary(Op::Div, numer, denom));
        }

        let key = target.to_string();
        if let Some(node) = self.lookup(&key) {
            return Ok(node);
        }
        if depth == 0 {
            return Err(EngineError::DepthExhausted { target: key });
        }

        trace!(target = %key, depth, "decomposing");

        if let Some(node) = self.try_factor_split(target, depth, session) {
            return Ok(node);
        }

        let entries: Vec<Entry> = self
            .map
            .sorted_entries()
            .into_iter()
            .filter(|e| !e.value.is_zero())
            .collect();

        if let Some(node) = self.pass_division(target, depth, &entries, session) {
            return Ok(node);
        }
        if let Some(node) = self.pass_inverse_mul(target, &entries, session) {
            return Ok(node);
        }
        if let Some(node) = self.pass_modulo(target, depth, &entries, session) {
            return Ok(node);
        }
        if let Some(node) = self.pass_subtraction(target, depth, &entries, session) {
            return Ok(node);
        }
        if let Some(node) = self.pass_addition(target, depth, &entries, session) {
            return Ok(node);
        }

        Err(EngineError::ProofNotFound { target: key })
    }

    /// Record a freshly derived proof and notify the caller when it
    /// resolves the requested value (directly or through its negation).
    fn record(&mut self, value: &Value, node: &Node, session: &mut Session<'_>) {
        self.map.insert(value.clone(), node.clone());
        trace!(value = %value, rendering = %node.render(), "dictionary extended");
        let requested = &session.requested;
        if value == requested || &(-value) == requested {
            if let Some(callback) = session.progress.as_mut() {
                if let Some(best) = self.map.get(&requested.to_string()) {
                    callback(&best.node.render());
                }
            }
        }
    }

    /// Split the target into two non-unit factors and prove each.
    fn try_factor_split(
        &mut self,
        target: &Value,
        depth: u64,
        session: &mut Session<'_>,
    ) -> Option<Node> {
        let int = target.to_integer()?;
        if int.abs() <= BigInt::one() {
            return None;
        }
        let (small, big) = factorize(&int);
        if small.abs() == BigInt::one() || big.abs() == BigInt::one() {
            return None;
        }
        let small_node = self
            .prove_ast(&Value::from_bigint(small), depth - 1, session)
            .ok()?;
        let big_node = self
            .prove_ast(&Value::from_bigint(big), depth - 1, session)
            .ok()?;
        let node = Node::binary(Op::Mul, small_node, big_node);
        self.record(target, &node, session);
        Some(node)
    }

    /// Strategy (a): peel off as many exact divisions by a key as keep
    /// shrinking the magnitude, giving `key^times * quotient`.
    fn pass_division(
        &mut self,
        target: &Value,
        depth: u64,
        entries: &[Entry],
        session: &mut Session<'_>,
    ) -> Option<Node> {
        let mut found = None;
        let mut jumps = 0u32;
        let mut i = 0usize;
        while i < entries.len() {
            let entry = &entries[i];
            let mut quotient = target.clone();
            let mut times = 0u32;
            loop {
                match quotient.checked_div(&entry.value) {
                    Ok(next) if next.is_integer() && next.abs_lt(&quotient) => {
                        quotient = next;
                        times += 1;
                    }
                    _ => break,
                }
            }
            if times > 0 {
                if let Some(node) = self.derive_division(entry, times, &quotient, depth, session)
                {
                    self.record(target, &node, session);
                    found = Some(node);
                    if i > 0
                        && jumps < MAX_JUMPS
                        && self.rng.gen_range(0..DIVERSIFY_ODDS) == 0
                    {
                        jumps += 1;
                        i = self.rng.gen_range(0..i);
                        continue;
                    }
                    break;
                }
            }
            i += 1;
        }
        found
    }

    fn derive_division(
        &mut self,
        entry: &Entry,
        times: u32,
        quotient: &Value,
        depth: u64,
        session: &mut Session<'_>,
    ) -> Option<Node> {
        let quotient_node = self.prove_ast(quotient, depth - 1, session).ok()?;
        if times == 1 {
            return Some(Node::binary(Op::Mul, entry.node.clone(), quotient_node));
        }
        let times_node = self
            .prove_ast(&Value::from(i64::from(times)), depth - 1, session)
            .ok()?;
        Some(Node::binary(
            Op::Mul,
            Node::binary(Op::Pow, entry.node.clone(), times_node),
            quotient_node,
        ))
    }

    /// Strategy (b): if `target * key` is already known, the target is
    /// that entry divided back by the key.
    fn pass_inverse_mul(
        &mut self,
        target: &Value,
        entries: &[Entry],
        session: &mut Session<'_>,
    ) -> Option<Node> {
        for entry in entries {
            let product = target * &entry.value;
            if let Some(product_node) = self.lookup(&product.to_string()) {
                let node = Node::binary(Op::Div, product_node, entry.node.clone());
                self.record(target, &node, session);
                return Some(node);
            }
        }
        None
    }

    /// Strategy (c): `target = key * (target div key) + (target mod key)`
    /// whenever the remainder shrinks the magnitude.
    fn pass_modulo(
        &mut self,
        target: &Value,
        depth: u64,
        entries: &[Entry],
        session: &mut Session<'_>,
    ) -> Option<Node> {
        let one = Value::one();
        let mut found = None;
        let mut jumps = 0u32;
        let mut i = 0usize;
        while i < entries.len() {
            let entry = &entries[i];
            // A magnitude-1 divisor leaves the quotient equal to the
            // target itself, which would recurse without shrinking.
            if entry.value.cmp_abs(&one) != Ordering::Greater {
                i += 1;
                continue;
            }
            let remainder = match target.checked_mod(&entry.value) {
                Ok(r) => r,
                Err(_) => {
                    i += 1;
                    continue;
                }
            };
            if remainder.abs_lt(target) {
                if let Some(node) =
                    self.derive_modulo(entry, target, &remainder, depth, session)
                {
                    self.record(target, &node, session);
                    found = Some(node);
                    if i > 0
                        && jumps < MAX_JUMPS
                        && self.rng.gen_range(0..DIVERSIFY_ODDS) == 0
                    {
                        jumps += 1;
                        i = self.rng.gen_range(0..i);
                        continue;
                    }
                    break;
                }
            }
            i += 1;
        }
        found
    }

    fn derive_modulo(
        &mut self,
        entry: &Entry,
        target: &Value,
        remainder: &Value,
        depth: u64,
        session: &mut Session<'_>,
    ) -> Option<Node> {
        let quotient = target.checked_div_floor(&entry.value).ok()?;
        let quotient_node = self.prove_ast(&quotient, depth - 1, session).ok()?;
        let remainder_node = self.prove_ast(remainder, depth - 1, session).ok()?;
        Some(Node::binary(
            Op::Add,
            Node::binary(Op::Mul, entry.node.clone(), quotient_node),
            remainder_node,
        ))
    }

    /// Strategy (d): `target = key + (target - key)` when the difference
    /// shrinks the magnitude.
    fn pass_subtraction(
        &mut self,
        target: &Value,
        depth: u64,
        entries: &[Entry],
        session: &mut Session<'_>,
    ) -> Option<Node> {
        for entry in entries {
            let difference = target - &entry.value;
            if difference.abs_lt(target) {
                if let Ok(diff_node) = self.prove_ast(&difference, depth - 1, session) {
                    let node = Node::binary(Op::Add, entry.node.clone(), diff_node);
                    self.record(target, &node, session);
                    return Some(node);
                }
            }
        }
        None
    }

    /// Strategy (e): `target = (target + key) - key` when the sum is
    /// known already or shrinks the magnitude.
    fn pass_addition(
        &mut self,
        target: &Value,
        depth: u64,
        entries: &[Entry],
        session: &mut Session<'_>,
    ) -> Option<Node> {
        for entry in entries {
            let sum = target + &entry.value;
            if self.map.contains(&sum.to_string()) || sum.abs_lt(target) {
                if let Ok(sum_node) = self.prove_ast(&sum, depth - 1, session) {
                    let node = Node::binary(Op::Sub, sum_node, entry.node.clone());
                    self.record(target, &node, session);
                    return Some(node);
                }
            }
        }
        None
    }
}
