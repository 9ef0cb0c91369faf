//! Serialized node shape.
//!
//! A leaf serializes to its bare numeral; an operator node to
//! `{"operator": "...", "children": [...]}`. Deserialization rebuilds
//! nodes through the normalizing constructors, so sign placement is
//! canonical again even if the input was not.

use serde::{Deserialize, Serialize};

use crate::error::AstError;
use crate::node::{Node, NodeKind};
use crate::op::Op;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeRepr {
    Leaf(String),
    Operator {
        operator: String,
        children: Vec<NodeRepr>,
    },
}

impl Node {
    pub fn to_repr(&self) -> NodeRepr {
        self.with_kind(|kind| match kind {
            NodeKind::Leaf { text, .. } => NodeRepr::Leaf(text.clone()),
            NodeKind::Op { op, children } => NodeRepr::Operator {
                operator: op.symbol().to_string(),
                children: children.iter().map(Node::to_repr).collect(),
            },
        })
    }

    pub fn from_repr(repr: &NodeRepr) -> Result<Node, AstError> {
        match repr {
            NodeRepr::Leaf(text) => Ok(Node::leaf(text)?),
            NodeRepr::Operator { operator, children } => {
                let kids = children
                    .iter()
                    .map(Node::from_repr)
                    .collect::<Result<Vec<_>, _>>()?;
                let op = Op::from_symbol(operator, kids.len()).ok_or_else(|| {
                    AstError::UnknownOperator {
                        op: operator.clone(),
                        arity: kids.len(),
                    }
                })?;
                let mut kids = kids.into_iter();
                match op {
                    Op::Neg => {
                        let inner = kids.next().ok_or(AstError::EmptyOperator)?;
                        Ok(Node::neg(inner))
                    }
                    _ => {
                        let lhs = kids.next().ok_or(AstError::EmptyOperator)?;
                        let rhs = kids.next().ok_or(AstError::EmptyOperator)?;
                        Ok(Node::binary(op, lhs, rhs))
                    }
                }
            }
        }
    }
}
