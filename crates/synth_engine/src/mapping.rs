//! Value-to-node mapping with cheapest-rendering-wins inserts.
//!
//! Keys are canonical value strings. Every insert also inserts the
//! negated value wrapped in unary minus, so the mapping is closed under
//! negation. When a later insert renders shorter than the entry it
//! collides with, the existing entry is upgraded in place through
//! [`Node::replace`]: expressions already holding that node as a
//! subexpression pick up the shorter form and their caches invalidate.

use rustc_hash::FxHashMap;
use synth_ast::{Node, Value};

/// One mapping entry: the exact value and the cheapest known node for it.
#[derive(Debug, Clone)]
pub struct Entry {
    pub value: Value,
    pub node: Node,
}

#[derive(Debug, Default, Clone)]
pub struct Mapping {
    entries: FxHashMap<String, Entry>,
}

impl Mapping {
    pub fn new() -> Mapping {
        Mapping::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Insert `value` and its negation, keeping the cheaper rendering for
    /// each key.
    pub fn insert(&mut self, value: Value, node: Node) {
        let neg_value = -&value;
        let neg_node = Node::neg(node.clone());
        self.insert_entry(value, node);
        self.insert_entry(neg_value, neg_node);
    }

    /// Single-key insert, no negation closure. Used for unions of
    /// mappings that are already closed and for deserialized exports.
    pub(crate) fn insert_entry(&mut self, value: Value, node: Node) {
        let key = value.to_string();
        match self.entries.get(&key) {
            Some(existing) => {
                // A candidate that contains the existing entry as a
                // subexpression renders strictly longer than it, so the
                // strict inequality also rules out replacement cycles.
                if node.render().len() < existing.node.render().len() {
                    existing.node.replace(&node);
                }
            }
            None => {
                self.entries.insert(key, Entry { value, node });
            }
        }
    }

    /// Fold every entry of `other` into `self`, cheaper rendering wins.
    pub fn union(&mut self, other: &Mapping) {
        for entry in other.iter() {
            self.insert_entry(entry.value.clone(), entry.node.clone());
        }
    }

    /// All entries ordered by descending absolute value; ties broken by
    /// key string so the order is reproducible.
    pub fn sorted_entries(&self) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| {
            b.value
                .cmp_abs(&a.value)
                .then_with(|| a.value.to_string().cmp(&b.value.to_string()))
        });
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synth_ast::Op;

    fn leaf(text: &str) -> Node {
        Node::leaf(text).unwrap()
    }

    fn val(s: &str) -> Value {
        Value::parse(s).unwrap()
    }

    #[test]
    fn insert_adds_negation() {
        let mut m = Mapping::new();
        m.insert(val("7"), leaf("7"));
        assert!(m.contains("7"));
        assert!(m.contains("-7"));
        assert_eq!(m.get("-7").unwrap().node.render(), "-7");
    }

    #[test]
    fn cheaper_rendering_replaces_in_place() {
        let mut m = Mapping::new();
        let verbose = Node::binary(Op::Add, Node::binary(Op::Add, leaf("1"), leaf("1")), leaf("1"));
        m.insert(val("3"), verbose.clone());
        // something else references the dictionary node
        let holder = Node::binary(Op::Mul, m.get("3").unwrap().node.clone(), leaf("2"));
        assert_eq!(holder.render(), "(1+1+1)*2");

        m.insert(val("3"), leaf("3"));
        assert_eq!(m.get("3").unwrap().node.render(), "3");
        // the holder sees the upgrade through the shared identity
        assert_eq!(holder.render(), "3*2");
    }

    #[test]
    fn longer_rendering_is_ignored() {
        let mut m = Mapping::new();
        m.insert(val("3"), leaf("3"));
        m.insert(
            val("3"),
            Node::binary(Op::Add, leaf("1"), leaf("2")),
        );
        assert_eq!(m.get("3").unwrap().node.render(), "3");
    }

    #[test]
    fn sorted_entries_descend_by_magnitude() {
        let mut m = Mapping::new();
        for t in ["2", "10", "5"] {
            m.insert(val(t), leaf(t));
        }
        let order: Vec<String> = m
            .sorted_entries()
            .iter()
            .map(|e| e.value.to_string())
            .collect();
        assert_eq!(order[0], "-10");
        assert_eq!(order[1], "10");
        assert_eq!(order.last().unwrap(), "2");
    }
}
