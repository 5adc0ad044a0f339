//! SQL operators and their classification.
//!
//! Operators prefixed with `Cypher` are placeholders carried over from
//! the source dialect. They exist only while an expression is being
//! rewritten; none of them may survive into a finished tree.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Unset,

    Assignment,
    KindAssignment,

    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Concatenate,

    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,

    And,
    Or,
    Not,

    Is,
    IsNot,
    In,

    Like,
    ILike,
    RegexMatch,

    /// `&&`, PostgreSQL array overlap.
    PGArrayOverlap,

    /// Source-dialect property access, replaced with a JSON operator
    /// during rewriting.
    PropertyLookup,
    /// `->`, JSON field access.
    JSONField,
    /// `->>`, JSON field access as text.
    JSONTextField,
    /// `?`, JSONB key existence.
    JSONBFieldExists,

    CypherAdd,
    CypherContains,
    CypherStartsWith,
    CypherEndsWith,
    CypherRegexMatch,
}

impl Operator {
    /// Property lookups travel through three operator spellings: the
    /// source-dialect placeholder and the two JSON access forms it
    /// rewrites into.
    pub fn is_property_lookup(&self) -> bool {
        matches!(
            self,
            Operator::PropertyLookup | Operator::JSONField | Operator::JSONTextField
        )
    }

    pub fn is_comparator(&self) -> bool {
        matches!(
            self,
            Operator::Equals
                | Operator::NotEquals
                | Operator::LessThan
                | Operator::LessThanOrEqualTo
                | Operator::GreaterThan
                | Operator::GreaterThanOrEqualTo
        )
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Operator::And | Operator::Or | Operator::Not)
    }

    /// True for operators that must be rewritten away before a tree is
    /// handed to the consumer.
    pub fn is_cypher_originated(&self) -> bool {
        matches!(
            self,
            Operator::CypherAdd
                | Operator::CypherContains
                | Operator::CypherStartsWith
                | Operator::CypherEndsWith
                | Operator::CypherRegexMatch
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Operator::Unset => "",
            Operator::Assignment | Operator::KindAssignment => "=",
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::Concatenate => "||",
            Operator::Equals => "=",
            Operator::NotEquals => "<>",
            Operator::LessThan => "<",
            Operator::LessThanOrEqualTo => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqualTo => ">=",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
            Operator::Is => "IS",
            Operator::IsNot => "IS NOT",
            Operator::In => "IN",
            Operator::Like => "LIKE",
            Operator::ILike => "ILIKE",
            Operator::RegexMatch => "~",
            Operator::PGArrayOverlap => "&&",
            Operator::PropertyLookup => "->",
            Operator::JSONField => "->",
            Operator::JSONTextField => "->>",
            Operator::JSONBFieldExists => "?",
            Operator::CypherAdd => "+",
            Operator::CypherContains => "CONTAINS",
            Operator::CypherStartsWith => "STARTS WITH",
            Operator::CypherEndsWith => "ENDS WITH",
            Operator::CypherRegexMatch => "=~",
        };

        write!(f, "{}", token)
    }
}
