//! Recursive-descent parser over the rendered expression grammar.
//!
//! Accepts everything the node renderer emits: integers, `+ - * / % ^`,
//! unary minus and parentheses. Precedence mirrors the renderer: unary
//! minus binds tightest, then `^` (right-associative), then `* / %`,
//! then `+ -` (left-associative). So `-2^2` is `(-2)^2` and `2^-3` is a
//! negative exponent, matching the canonical rendering of those nodes.

use nom::{
    branch::alt,
    character::complete::{char, digit1, multispace0},
    combinator::map,
    multi::fold_many0,
    sequence::{delimited, pair, preceded},
    IResult,
};

use synth_ast::{Node, Op, Value};

use crate::error::ParseError;

// Intermediate tree; lowered to `Node` once parsing succeeds.
#[derive(Debug, Clone)]
enum ParseNode {
    Number(String),
    Binary(Op, Box<ParseNode>, Box<ParseNode>),
    Neg(Box<ParseNode>),
}

impl ParseNode {
    fn lower(self) -> Result<Node, ParseError> {
        match self {
            ParseNode::Number(text) => Ok(Node::leaf(&text)?),
            ParseNode::Binary(op, lhs, rhs) => {
                Ok(Node::binary(op, lhs.lower()?, rhs.lower()?))
            }
            ParseNode::Neg(inner) => Ok(Node::neg(inner.lower()?)),
        }
    }
}

fn integer(input: &str) -> IResult<&str, ParseNode> {
    map(digit1, |s: &str| ParseNode::Number(s.to_string()))(input)
}

fn atom(input: &str) -> IResult<&str, ParseNode> {
    alt((
        integer,
        delimited(
            pair(char('('), multispace0),
            expr,
            pair(multispace0, char(')')),
        ),
    ))(input)
}

// Unary minus binds tighter than `^`.
fn signed(input: &str) -> IResult<&str, ParseNode> {
    alt((
        map(preceded(pair(char('-'), multispace0), signed), |inner| {
            ParseNode::Neg(Box::new(inner))
        }),
        atom,
    ))(input)
}

// Right-associative exponentiation.
fn power(input: &str) -> IResult<&str, ParseNode> {
    let (input, base) = signed(input)?;
    match preceded(delimited(multispace0, char('^'), multispace0), power)(input) {
        Ok((rest, exp)) => Ok((
            rest,
            ParseNode::Binary(Op::Pow, Box::new(base), Box::new(exp)),
        )),
        Err(_) => Ok((input, base)),
    }
}

fn term_op(c: char) -> Op {
    match c {
        '*' => Op::Mul,
        '/' => Op::Div,
        _ => Op::Mod,
    }
}

fn term(input: &str) -> IResult<&str, ParseNode> {
    let (input, init) = power(input)?;
    fold_many0(
        pair(
            delimited(multispace0, alt((char('*'), char('/'), char('%'))), multispace0),
            power,
        ),
        move || init.clone(),
        |acc, (op, rhs)| ParseNode::Binary(term_op(op), Box::new(acc), Box::new(rhs)),
    )(input)
}

fn expr(input: &str) -> IResult<&str, ParseNode> {
    let (input, init) = term(input)?;
    fold_many0(
        pair(
            delimited(multispace0, alt((char('+'), char('-'))), multispace0),
            term,
        ),
        move || init.clone(),
        |acc, (op, rhs)| {
            let op = if op == '+' { Op::Add } else { Op::Sub };
            ParseNode::Binary(op, Box::new(acc), Box::new(rhs))
        },
    )(input)
}

/// Parse an expression string into a node.
pub fn parse(input: &str) -> Result<Node, ParseError> {
    let trimmed = input.trim();
    match expr(trimmed) {
        Ok((rest, tree)) => {
            if rest.trim().is_empty() {
                tree.lower()
            } else {
                Err(ParseError::UnconsumedInput(rest.to_string()))
            }
        }
        Err(e) => Err(ParseError::NomError(e.to_string())),
    }
}

/// Parse and evaluate in one go.
pub fn evaluate_str(input: &str) -> Result<Value, ParseError> {
    Ok(parse(input)?.evaluate()?)
}
