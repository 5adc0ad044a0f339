//! The parsed Cypher expression model consumed by the translator.
//!
//! Parsing is an external collaborator; these types are the contract it
//! delivers. Only the expression surface the translator walks is
//! modeled here, not full query structure.

use std::fmt;

#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Null,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Operator {
    // binary
    Addition,         // +
    Subtraction,      // -
    Multiplication,   // *
    Division,         // /
    ModuloDivision,   // %
    Equal,            // =
    NotEqual,         // <>
    LessThan,         // <
    GreaterThan,      // >
    LessThanEqual,    // <=
    GreaterThanEqual, // >=
    RegexMatch,       // =~
    And,
    Or,
    In, // IN [...]
    // String predicates
    StartsWith, // STARTS WITH
    EndsWith,   // ENDS WITH
    Contains,   // CONTAINS
    // null-safe comparison against a literal
    Is,    // IS
    IsNot, // IS NOT
    // unary
    Not,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum AssignmentOperator {
    /// `SET n.prop = value`
    Assignment,
    /// `SET n:Label`
    LabelAssignment,
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        let token = match value {
            Operator::Addition => "+",
            Operator::Subtraction => "-",
            Operator::Multiplication => "*",
            Operator::Division => "/",
            Operator::ModuloDivision => "%",
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::LessThan => "<",
            Operator::GreaterThan => ">",
            Operator::LessThanEqual => "<=",
            Operator::GreaterThanEqual => ">=",
            Operator::RegexMatch => "=~",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::In => "IN",
            Operator::StartsWith => "STARTS WITH",
            Operator::EndsWith => "ENDS WITH",
            Operator::Contains => "CONTAINS",
            Operator::Is => "IS",
            Operator::IsNot => "IS NOT",
            Operator::Not => "NOT",
        };

        token.to_string()
    }
}

/// Reads a named field out of an atom's property bag, e.g. `n.name`.
#[derive(Debug, PartialEq, Clone)]
pub struct PropertyLookup {
    pub atom: Box<Expression>,
    pub symbols: Vec<String>,
}

/// A label/type test against a pattern variable, e.g. `n:Admin`.
#[derive(Debug, PartialEq, Clone)]
pub struct KindMatcher {
    pub reference: Box<Expression>,
    pub kinds: Vec<String>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct BinaryOp {
    pub operator: Operator,
    pub l_operand: Box<Expression>,
    pub r_operand: Box<Expression>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct UnaryOp {
    pub operator: Operator,
    pub operand: Box<Expression>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionInvocation {
    pub name: String,
    pub distinct: bool,
    pub args: Vec<Expression>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    /// A literal, such as a number, string, boolean, or null.
    Literal(Literal),

    /// A variable (e.g. n, x, or even backtick-quoted names).
    Variable(String),

    /// A list literal: a vector of expressions.
    List(Vec<Expression>),

    PropertyLookup(PropertyLookup),

    KindMatcher(KindMatcher),

    BinaryOp(BinaryOp),

    UnaryOp(UnaryOp),

    Parenthetical(Box<Expression>),

    FunctionInvocation(FunctionInvocation),
}

impl Expression {
    pub fn variable(symbol: impl Into<String>) -> Expression {
        Expression::Variable(symbol.into())
    }

    /// Shorthand for `variable.field`.
    pub fn property(symbol: impl Into<String>, field: impl Into<String>) -> Expression {
        Expression::PropertyLookup(PropertyLookup {
            atom: Box::new(Expression::variable(symbol)),
            symbols: vec![field.into()],
        })
    }

    pub fn binary(l_operand: Expression, operator: Operator, r_operand: Expression) -> Expression {
        Expression::BinaryOp(BinaryOp {
            operator,
            l_operand: Box::new(l_operand),
            r_operand: Box::new(r_operand),
        })
    }

    pub fn unary(operator: Operator, operand: Expression) -> Expression {
        Expression::UnaryOp(UnaryOp {
            operator,
            operand: Box::new(operand),
        })
    }

    pub fn kind_matcher(symbol: impl Into<String>, kinds: Vec<&str>) -> Expression {
        Expression::KindMatcher(KindMatcher {
            reference: Box::new(Expression::variable(symbol)),
            kinds: kinds.into_iter().map(str::to_string).collect(),
        })
    }

    pub fn function(name: impl Into<String>, args: Vec<Expression>) -> Expression {
        Expression::FunctionInvocation(FunctionInvocation {
            name: name.into(),
            distinct: false,
            args,
        })
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
