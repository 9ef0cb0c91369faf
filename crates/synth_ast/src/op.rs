//! Operator tags and precedence.

use std::fmt;

/// Which side of a binary operator a child sits on. Relevant for
/// parenthesization: `-` and `/` only associate on the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// Operator tag for expression nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    /// Unary negation. Renders as a prefix `-`.
    Neg,
}

impl Op {
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub | Op::Neg => "-",
            Op::Mul => "*",
            Op::Div => "/",
            Op::Mod => "%",
            Op::Pow => "^",
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            Op::Add | Op::Sub => 1,
            Op::Mul | Op::Div | Op::Mod => 2,
            Op::Pow => 3,
            Op::Neg => 4,
        }
    }

    pub fn is_unary(self) -> bool {
        matches!(self, Op::Neg)
    }

    /// Whether a same-operator child may drop its parentheses on `side`.
    /// `+` and `*` are safe on either side; `-` and `/` only on the
    /// left; `^` only on the right (it is right-associative, not
    /// associative); `%` never.
    pub fn assoc_safe(self, side: Side) -> bool {
        match self {
            Op::Add | Op::Mul => true,
            Op::Sub | Op::Div => side == Side::Left,
            Op::Pow => side == Side::Right,
            Op::Mod | Op::Neg => false,
        }
    }

    /// Recover an operator from its serialized symbol. `-` is ambiguous
    /// and resolved by arity.
    pub fn from_symbol(symbol: &str, arity: usize) -> Option<Op> {
        match (symbol, arity) {
            ("+", 2) => Some(Op::Add),
            ("-", 2) => Some(Op::Sub),
            ("-", 1) => Some(Op::Neg),
            ("*", 2) => Some(Op::Mul),
            ("/", 2) => Some(Op::Div),
            ("%", 2) => Some(Op::Mod),
            ("^", 2) => Some(Op::Pow),
            _ => None,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
