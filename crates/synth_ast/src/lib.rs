//! Expression node model for the synthesis engine.
//!
//! Provides exact rational [`Value`]s, shared-identity expression
//! [`Node`]s with canonical minimally-parenthesized rendering, lazy
//! evaluation and trace caches with parent-driven invalidation, and a
//! JSON-friendly serialized form.

pub mod error;
pub mod node;
pub mod op;
pub mod repr;
pub mod value;

pub use error::{AstError, ValueError};
pub use node::{Node, NodeKind, Trace, WeakNode};
pub use op::{Op, Side};
pub use repr::NodeRepr;
pub use value::Value;
