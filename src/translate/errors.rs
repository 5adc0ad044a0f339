use thiserror::Error;

use crate::pgsql::{DataType, Identifier, Operator};

/// Failure reported by a [`KindMapper`](super::KindMapper)
/// implementation. Cancellation is its own variant so callers can
/// propagate it verbatim.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum KindMapperError {
    #[error("unknown kinds: {0:?}")]
    UnknownKinds(Vec<String>),

    #[error("kind lookup failed: {0}")]
    Lookup(String),

    #[error("kind lookup cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranslationError {
    // Reference errors
    #[error("unable to find identifier {0}")]
    UnboundIdentifier(String),

    #[error("expected a variable for the kind matcher reference")]
    InvalidKindMatcherReference,

    #[error("unexpected kind matcher reference data type: {0}")]
    InvalidKindMatcherBinding(DataType),

    #[error("failed to translate kinds: {0}")]
    KindMapping(#[from] KindMapperError),

    // Type errors
    #[error("left and right operands for binary expression \"{operator}\" are not compatible: {left} != {right}")]
    IncompatibleOperands {
        operator: Operator,
        left: DataType,
        right: DataType,
    },

    #[error("expected a compound identifier to have only 2 components but found: {0}")]
    InvalidCompoundIdentifierArity(usize),

    #[error("expected the property lookup field to be a text literal")]
    InvalidPropertyLookupField,

    #[error("type {0} has no array form")]
    NoArrayForm(DataType),

    #[error("function call has return signature of type {signature} but is being compared using operator {operator} against type {other}")]
    FunctionComparison {
        signature: DataType,
        operator: Operator,
        other: DataType,
    },

    #[error("coalesce has type {signature} but is being compared against type {other} - ensure that all arguments in the coalesce function match the type of the other side of the comparison")]
    CoalesceComparison { signature: DataType, other: DataType },

    #[error("expected {expected} data type but found {found} as right operand for operator {operator}")]
    InvalidPatternOperand {
        expected: DataType,
        found: DataType,
        operator: Operator,
    },

    #[error("invalid comparison between types {0} and {1}")]
    InvalidEntityComparison(DataType, DataType),

    // Shape errors
    #[error("expected at least one expression on the translation stack")]
    EmptyExpressionStack,

    #[error("unexpected expression variant on the stack: expected {0}")]
    UnexpectedExpression(&'static str),

    #[error("clause ended with unbalanced depths (parenthetical: {parenthetical}, conjunction: {conjunction}, disjunction: {disjunction})")]
    UnbalancedClause {
        parenthetical: i64,
        conjunction: i64,
        disjunction: i64,
    },

    #[error("unexpected operator {found} for binary expression \"{operator}\" left operand")]
    InvalidPatternLeftOperand { found: Operator, operator: Operator },

    #[error("unsupported temporal component {component} for function {function}")]
    UnsupportedTemporalComponent {
        component: String,
        function: Identifier,
    },

    // Unsupported features
    #[error("unsupported comparison for composite array type {0}")]
    UnsupportedCompositeArray(DataType),

    #[error("comparison for path identifiers is unsupported")]
    UnsupportedPathComparison,

    #[error("unsupported function {0}")]
    UnsupportedFunction(String),

    #[error("function {function} expects {expected} argument(s)")]
    InvalidFunctionArity { function: String, expected: usize },

    #[error("unsupported argument for function {function}: expected an entity variable")]
    InvalidFunctionArgument { function: String },

    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),
}
