//! Expression nodes with shared mutable identity.
//!
//! A [`Node`] is a cheap-clone handle onto a reference-counted cell. All
//! holders of a handle (operator parents, dictionary entries) observe the
//! same cell, so [`Node::replace`] can redirect every holder at once by
//! swapping the cell's contents. Each cell tracks its operator parents
//! through weak back-references; those exist purely so cache invalidation
//! can propagate upward and never keep a parent alive.
//!
//! Construction normalizes signs once: double negation collapses, a
//! negated operand of `*` or `/` hoists its sign outward, and `+`/`-`
//! with a negated right child flips the operator instead. Dictionary keys
//! are rendered strings, so canonical sign placement keeps sign variants
//! from piling up as distinct entries.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use crate::error::ValueError;
use crate::op::{Op, Side};
use crate::value::Value;

/// Rendering context: the immediately enclosing operator, if any, and
/// which side this node occupies under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RenderCtx {
    Root,
    Child(Op, Side),
}

/// The two node shapes.
#[derive(Clone)]
pub enum NodeKind {
    /// A literal numeral. Renders as its source text.
    Leaf { text: String, value: Value },
    /// An operator applied to one (unary) or two (binary) children.
    Op { op: Op, children: Vec<Node> },
}

#[derive(Default)]
struct NodeCache {
    rendered: FxHashMap<RenderCtx, String>,
    value: Option<Value>,
    trace: Option<String>,
}

impl NodeCache {
    fn is_empty(&self) -> bool {
        self.rendered.is_empty() && self.value.is_none() && self.trace.is_none()
    }

    fn clear(&mut self) {
        self.rendered.clear();
        self.value = None;
        self.trace = None;
    }
}

struct NodeCell {
    kind: NodeKind,
    parents: Vec<WeakNode>,
    cache: NodeCache,
}

/// Handle to an expression node. Clones share the underlying cell.
#[derive(Clone)]
pub struct Node {
    cell: Rc<RefCell<NodeCell>>,
}

/// Non-owning handle used for parent back-references.
#[derive(Clone)]
pub struct WeakNode {
    cell: Weak<RefCell<NodeCell>>,
}

impl WeakNode {
    pub fn upgrade(&self) -> Option<Node> {
        self.cell.upgrade().map(|cell| Node { cell })
    }

    fn is(&self, node: &Node) -> bool {
        std::ptr::eq(self.cell.as_ptr(), Rc::as_ptr(&node.cell))
    }
}

/// A rendered derivation trace with the value it arrives at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub text: String,
    pub value: Value,
}

impl Node {
    fn from_kind(kind: NodeKind) -> Node {
        let node = Node {
            cell: Rc::new(RefCell::new(NodeCell {
                kind,
                parents: Vec::new(),
                cache: NodeCache::default(),
            })),
        };
        for child in node.children() {
            child.register_parent(&node);
        }
        node
    }

    /// A leaf wrapping a literal numeral.
    pub fn leaf(text: &str) -> Result<Node, ValueError> {
        let value = Value::parse(text)?;
        Ok(Node::from_kind(NodeKind::Leaf {
            text: text.to_string(),
            value,
        }))
    }

    /// Unary negation. `neg(neg(x))` yields `x` itself, not a wrapper.
    pub fn neg(child: Node) -> Node {
        if let Some(inner) = child.unwrap_neg() {
            return inner;
        }
        Node::from_kind(NodeKind::Op {
            op: Op::Neg,
            children: vec![child],
        })
    }

    /// A binary operator node with sign normalization applied.
    pub fn binary(op: Op, lhs: Node, rhs: Node) -> Node {
        debug_assert!(!op.is_unary());
        match op {
            Op::Mul | Op::Div => match (lhs.unwrap_neg(), rhs.unwrap_neg()) {
                (Some(a), Some(b)) => return Node::binary(op, a, b),
                (Some(a), None) => return Node::neg(Node::binary(op, a, rhs)),
                (None, Some(b)) => return Node::neg(Node::binary(op, lhs, b)),
                (None, None) => {}
            },
            Op::Add => {
                if let Some(b) = rhs.unwrap_neg() {
                    return Node::binary(Op::Sub, lhs, b);
                }
            }
            Op::Sub => {
                if let Some(b) = rhs.unwrap_neg() {
                    return Node::binary(Op::Add, lhs, b);
                }
            }
            _ => {}
        }
        Node::from_kind(NodeKind::Op {
            op,
            children: vec![lhs, rhs],
        })
    }

    /// The negated child, if this node is a unary negation.
    fn unwrap_neg(&self) -> Option<Node> {
        match &self.cell.borrow().kind {
            NodeKind::Op { op: Op::Neg, children } => Some(children[0].clone()),
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.cell.borrow().kind, NodeKind::Leaf { .. })
    }

    /// The operator tag, or `None` for leaves.
    pub fn op(&self) -> Option<Op> {
        match &self.cell.borrow().kind {
            NodeKind::Leaf { .. } => None,
            NodeKind::Op { op, .. } => Some(*op),
        }
    }

    pub fn children(&self) -> Vec<Node> {
        match &self.cell.borrow().kind {
            NodeKind::Leaf { .. } => Vec::new(),
            NodeKind::Op { children, .. } => children.clone(),
        }
    }

    /// Run `f` against this node's shape without cloning it.
    pub fn with_kind<R>(&self, f: impl FnOnce(&NodeKind) -> R) -> R {
        f(&self.cell.borrow().kind)
    }

    /// Two handles onto the same cell.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    // --- parent tracking --------------------------------------------------

    /// Record `parent` as holding this node as a child. Stale entries are
    /// pruned while we are here; duplicates are dropped.
    pub fn register_parent(&self, parent: &Node) {
        let mut cell = self.cell.borrow_mut();
        cell.parents.retain(|w| w.upgrade().is_some());
        if !cell.parents.iter().any(|w| w.is(parent)) {
            cell.parents.push(WeakNode {
                cell: Rc::downgrade(&parent.cell),
            });
        }
    }

    pub fn unregister_parent(&self, parent: &Node) {
        let mut cell = self.cell.borrow_mut();
        cell.parents
            .retain(|w| !w.is(parent) && w.upgrade().is_some());
    }

    // --- rendering --------------------------------------------------------

    /// Canonical minimally-parenthesized form, top-level context.
    pub fn render(&self) -> String {
        self.render_ctx(RenderCtx::Root)
    }

    /// Render as a child of `enclosing`, on the given side.
    pub fn render_in(&self, enclosing: Op, side: Side) -> String {
        self.render_ctx(RenderCtx::Child(enclosing, side))
    }

    fn render_ctx(&self, ctx: RenderCtx) -> String {
        if let Some(cached) = self.cell.borrow().cache.rendered.get(&ctx) {
            return cached.clone();
        }
        let (op, children) = match &self.cell.borrow().kind {
            NodeKind::Leaf { text, .. } => return text.clone(),
            NodeKind::Op { op, children } => (*op, children.clone()),
        };
        let body = if op.is_unary() {
            format!("-{}", children[0].render_in(op, Side::Right))
        } else {
            format!(
                "{}{}{}",
                children[0].render_in(op, Side::Left),
                op.symbol(),
                children[1].render_in(op, Side::Right)
            )
        };
        let rendered = match ctx {
            RenderCtx::Root => body,
            RenderCtx::Child(parent, side) => {
                if needs_parens(op, parent, side) {
                    format!("({body})")
                } else {
                    body
                }
            }
        };
        self.cell
            .borrow_mut()
            .cache
            .rendered
            .insert(ctx, rendered.clone());
        rendered
    }

    // --- evaluation -------------------------------------------------------

    /// Exact value of this expression. Domain failures (division by zero,
    /// undefined modulo or power) propagate as [`ValueError`].
    pub fn evaluate(&self) -> Result<Value, ValueError> {
        if let Some(v) = &self.cell.borrow().cache.value {
            return Ok(v.clone());
        }
        let (op, children) = match &self.cell.borrow().kind {
            NodeKind::Leaf { value, .. } => return Ok(value.clone()),
            NodeKind::Op { op, children } => (*op, children.clone()),
        };
        let value = if op.is_unary() {
            -&children[0].evaluate()?
        } else {
            let a = children[0].evaluate()?;
            let b = children[1].evaluate()?;
            match op {
                Op::Add => &a + &b,
                Op::Sub => &a - &b,
                Op::Mul => &a * &b,
                Op::Div => a.checked_div(&b)?,
                Op::Mod => a.checked_mod(&b)?,
                Op::Pow => a.checked_pow(&b)?,
                Op::Neg => unreachable!("unary handled above"),
            }
        };
        self.cell.borrow_mut().cache.value = Some(value.clone());
        Ok(value)
    }

    /// Human-readable derivation: one `rendered = value` line per operator
    /// node, innermost first.
    pub fn trace(&self) -> Result<Trace, ValueError> {
        let value = self.evaluate()?;
        if let Some(text) = &self.cell.borrow().cache.trace {
            return Ok(Trace {
                text: text.clone(),
                value,
            });
        }
        let mut text = String::new();
        if !self.is_leaf() {
            for child in self.children() {
                text.push_str(&child.trace()?.text);
            }
            text.push_str(&format!("{} = {}\n", self.render(), value));
        }
        self.cell.borrow_mut().cache.trace = Some(text.clone());
        Ok(Trace { text, value })
    }

    // --- replacement and invalidation -------------------------------------

    /// Redirect this node's identity to `other`'s shape. Every holder of
    /// this handle sees the new shape; `other`'s parents are folded into
    /// this node's parent set and all transitively reachable parent caches
    /// are invalidated.
    pub fn replace(&self, other: &Node) {
        if self.ptr_eq(other) {
            return;
        }
        for child in self.children() {
            child.unregister_parent(self);
        }
        let new_kind = other.cell.borrow().kind.clone();
        let other_parents: Vec<WeakNode> = other.cell.borrow().parents.clone();
        {
            let mut cell = self.cell.borrow_mut();
            cell.kind = new_kind;
            for incoming in other_parents {
                if incoming.upgrade().is_none() || incoming.is(self) {
                    continue;
                }
                if !cell.parents.iter().any(|w| {
                    std::ptr::eq(w.cell.as_ptr(), incoming.cell.as_ptr())
                }) {
                    cell.parents.push(incoming);
                }
            }
        }
        for child in self.children() {
            child.register_parent(self);
        }
        self.invalidate();
    }

    /// Clear this node's caches and walk the parent back-references doing
    /// the same. A parent whose cache is already empty stops the walk:
    /// its own ancestors must already be clean.
    pub fn invalidate(&self) {
        let parents = {
            let mut cell = self.cell.borrow_mut();
            cell.cache.clear();
            cell.parents.retain(|w| w.upgrade().is_some());
            cell.parents.clone()
        };
        for weak in parents {
            if let Some(parent) = weak.upgrade() {
                if !parent.cell.borrow().cache.is_empty() {
                    parent.invalidate();
                }
            }
        }
    }
}

fn needs_parens(child: Op, parent: Op, side: Side) -> bool {
    let (cp, pp) = (child.precedence(), parent.precedence());
    if cp > pp {
        return false;
    }
    if cp < pp {
        return true;
    }
    !(child == parent && child.assoc_safe(side))
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.try_borrow() {
            Ok(cell) => match &cell.kind {
                NodeKind::Leaf { text, .. } => write!(f, "Leaf({text})"),
                NodeKind::Op { op, children } => {
                    write!(f, "Op({op}, {} children)", children.len())
                }
            },
            Err(_) => f.write_str("Node(<borrowed>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(text: &str) -> Node {
        Node::leaf(text).unwrap()
    }

    #[test]
    fn leaf_renders_as_its_text() {
        assert_eq!(leaf("123").render(), "123");
        assert_eq!(leaf("123").evaluate().unwrap(), Value::parse("123").unwrap());
    }

    #[test]
    fn precedence_drives_parens() {
        // (1+2)*3 needs parens on the left child only
        let n = Node::binary(Op::Mul, Node::binary(Op::Add, leaf("1"), leaf("2")), leaf("3"));
        assert_eq!(n.render(), "(1+2)*3");
        // 1+2*3 needs none
        let n = Node::binary(Op::Add, leaf("1"), Node::binary(Op::Mul, leaf("2"), leaf("3")));
        assert_eq!(n.render(), "1+2*3");
    }

    #[test]
    fn same_op_assoc_rules() {
        // a-b on the left of - keeps its shape; on the right it parenthesizes
        let l = Node::binary(Op::Sub, Node::binary(Op::Sub, leaf("5"), leaf("2")), leaf("1"));
        assert_eq!(l.render(), "5-2-1");
        let r = Node::binary(Op::Sub, leaf("5"), Node::binary(Op::Sub, leaf("2"), leaf("1")));
        assert_eq!(r.render(), "5-(2-1)");
        // same-precedence different operator always parenthesizes
        let m = Node::binary(Op::Sub, Node::binary(Op::Add, leaf("1"), leaf("2")), leaf("3"));
        assert_eq!(m.render(), "(1+2)-3");
    }

    #[test]
    fn power_chains_follow_right_associativity() {
        let left = Node::binary(Op::Pow, Node::binary(Op::Pow, leaf("2"), leaf("3")), leaf("2"));
        assert_eq!(left.render(), "(2^3)^2");
        let right = Node::binary(Op::Pow, leaf("2"), Node::binary(Op::Pow, leaf("3"), leaf("2")));
        assert_eq!(right.render(), "2^3^2");
    }

    #[test]
    fn double_negation_collapses() {
        let inner = leaf("7");
        let once = Node::neg(inner.clone());
        let twice = Node::neg(once);
        assert!(twice.ptr_eq(&inner));
    }

    #[test]
    fn sign_hoists_through_mul_and_div() {
        let n = Node::binary(Op::Mul, leaf("2"), Node::neg(leaf("3")));
        assert_eq!(n.op(), Some(Op::Neg));
        assert_eq!(n.render(), "-(2*3)");
        let both = Node::binary(Op::Mul, Node::neg(leaf("2")), Node::neg(leaf("3")));
        assert_eq!(both.render(), "2*3");
        let div = Node::binary(Op::Div, Node::neg(leaf("6")), leaf("3"));
        assert_eq!(div.render(), "-(6/3)");
    }

    #[test]
    fn add_sub_flip_on_negated_right_child() {
        let n = Node::binary(Op::Add, leaf("5"), Node::neg(leaf("3")));
        assert_eq!(n.render(), "5-3");
        let n = Node::binary(Op::Sub, leaf("5"), Node::neg(leaf("3")));
        assert_eq!(n.render(), "5+3");
    }

    #[test]
    fn evaluate_dispatches_and_caches() {
        let n = Node::binary(
            Op::Add,
            Node::binary(Op::Pow, leaf("2"), leaf("5")),
            Node::binary(Op::Mod, leaf("7"), leaf("4")),
        );
        assert_eq!(n.evaluate().unwrap(), Value::from(35));
        // second call hits the cache
        assert_eq!(n.evaluate().unwrap(), Value::from(35));
    }

    #[test]
    fn evaluate_propagates_domain_errors() {
        let n = Node::binary(Op::Div, leaf("1"), Node::binary(Op::Sub, leaf("2"), leaf("2")));
        assert_eq!(n.evaluate(), Err(ValueError::DivisionByZero));
    }

    #[test]
    fn trace_lists_inner_steps_first() {
        let n = Node::binary(Op::Mul, Node::binary(Op::Add, leaf("1"), leaf("2")), leaf("3"));
        let t = n.trace().unwrap();
        assert_eq!(t.value, Value::from(9));
        assert_eq!(t.text, "1+2 = 3\n(1+2)*3 = 9\n");
    }

    #[test]
    fn replace_redirects_all_holders() {
        let long = Node::binary(Op::Add, Node::binary(Op::Add, leaf("1"), leaf("1")), leaf("1"));
        let holder = Node::binary(Op::Mul, long.clone(), leaf("2"));
        assert_eq!(holder.render(), "(1+1+1)*2");
        assert_eq!(holder.evaluate().unwrap(), Value::from(6));

        long.replace(&leaf("3"));
        assert_eq!(holder.render(), "3*2");
        assert_eq!(holder.evaluate().unwrap(), Value::from(6));
    }

    #[test]
    fn replace_invalidates_transitive_parents() {
        let a = Node::binary(Op::Add, leaf("2"), leaf("2"));
        let b = Node::binary(Op::Mul, a.clone(), leaf("10"));
        let c = Node::binary(Op::Sub, b.clone(), leaf("1"));
        assert_eq!(c.render(), "(2+2)*10-1");
        a.replace(&leaf("4"));
        assert_eq!(c.render(), "4*10-1");
        assert_eq!(c.evaluate().unwrap(), Value::from(39));
    }

    #[test]
    fn stale_parents_are_pruned_not_fatal() {
        let child = leaf("5");
        {
            let parent = Node::binary(Op::Add, child.clone(), leaf("1"));
            assert_eq!(parent.render(), "5+1");
        }
        // parent dropped; invalidation must skip the dead back-reference
        child.invalidate();
        assert_eq!(child.render(), "5");
    }

    #[test]
    fn neg_renders_with_parens_around_lower_precedence() {
        let n = Node::neg(Node::binary(Op::Add, leaf("1"), leaf("2")));
        assert_eq!(n.render(), "-(1+2)");
        let p = Node::neg(Node::binary(Op::Pow, leaf("2"), leaf("3")));
        assert_eq!(p.render(), "-(2^3)");
    }
}
