//! The SQL expression model produced by translation.
//!
//! Expressions are tagged variants owned by value; rewrite passes
//! consume a node and return its replacement, so no shared ownership is
//! needed while a tree is being reshaped. The model serializes with
//! `serde` so downstream planners can cache or dump translated trees.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::data_type::DataType;
use super::operator::Operator;

/// Well-known column names on the node and edge relations. Compound
/// identifiers referencing these columns carry fixed types during
/// inference.
pub mod columns {
    pub const GRAPH_ID: &str = "graph_id";
    pub const ID: &str = "id";
    pub const START_ID: &str = "start_id";
    pub const END_ID: &str = "end_id";
    pub const KIND_ID: &str = "kind_id";
    pub const KIND_IDS: &str = "kind_ids";
    pub const PROPERTIES: &str = "properties";
}

/// SQL function names the translator emits.
pub mod functions {
    pub const EXTRACT: &str = "extract";
    pub const JSONB_TO_TEXT_ARRAY: &str = "jsonb_to_text_array";
    pub const JSONB_ARRAY_LENGTH: &str = "jsonb_array_length";
    pub const ARRAY_LENGTH: &str = "array_length";
    pub const ARRAY_AGG: &str = "array_agg";
    pub const CHAR_LENGTH: &str = "char_length";
    pub const COUNT: &str = "count";
    pub const COALESCE: &str = "coalesce";
    pub const LOWER: &str = "lower";
    pub const UPPER: &str = "upper";
    pub const STRING_TO_ARRAY: &str = "string_to_array";
    pub const NOW: &str = "now";
    pub const CURRENT_DATE: &str = "current_date";
    pub const CURRENT_TIME: &str = "current_time";
    pub const LOCALTIME: &str = "localtime";
    pub const LOCALTIMESTAMP: &str = "localtimestamp";
}

/// The `epoch` field selector used inside `extract(epoch from ..)`.
pub const EPOCH: &str = "epoch";

/// Identifiers that belong to the SQL vocabulary rather than to the
/// translated query. They are skipped during dependency extraction.
pub fn is_reserved_identifier(identifier: &Identifier) -> bool {
    identifier.as_str() == EPOCH
}

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Identifier(value)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A dotted identifier path. Column references are exactly two
/// components long; longer paths are reserved for composite access and
/// are rejected where a column reference is required.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompoundIdentifier(pub Vec<Identifier>);

impl CompoundIdentifier {
    pub fn column_ref(root: Identifier, column: &str) -> Self {
        CompoundIdentifier(vec![root, Identifier::from(column)])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn root(&self) -> Option<&Identifier> {
        self.0.first()
    }

    /// The column component of a two-part reference.
    pub fn column(&self) -> Option<&Identifier> {
        if self.0.len() == 2 {
            self.0.last()
        } else {
            None
        }
    }
}

impl fmt::Display for CompoundIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, identifier) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", identifier)?;
        }
        Ok(())
    }
}

/// An ordered set of identifiers. Ordering is stable so dependency
/// sets can key constraint storage and render deterministically.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct IdentifierSet(BTreeSet<Identifier>);

impl IdentifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(identifier: Identifier) -> Self {
        let mut set = Self::new();
        set.insert(identifier);
        set
    }

    pub fn insert(&mut self, identifier: Identifier) {
        self.0.insert(identifier);
    }

    pub fn contains(&self, identifier: &Identifier) -> bool {
        self.0.contains(identifier)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_subset_of(&self, other: &IdentifierSet) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn merge(&mut self, other: &IdentifierSet) {
        for identifier in &other.0 {
            self.0.insert(identifier.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
        self.0.iter()
    }
}

impl FromIterator<Identifier> for IdentifierSet {
    fn from_iter<T: IntoIterator<Item = Identifier>>(iter: T) -> Self {
        IdentifierSet(iter.into_iter().collect())
    }
}

/// A literal value together with its SQL type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Numeric(f64),
    Text(String),
    Array(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub value: Value,
    pub cast_type: DataType,
}

impl Literal {
    pub fn new(value: Value, cast_type: DataType) -> Self {
        Literal { value, cast_type }
    }

    pub fn null() -> Self {
        Literal::new(Value::Null, DataType::Unknown)
    }

    pub fn boolean(value: bool) -> Self {
        Literal::new(Value::Boolean(value), DataType::Boolean)
    }

    pub fn int4(value: i32) -> Self {
        Literal::new(Value::Int32(value), DataType::Int4)
    }

    pub fn int8(value: i64) -> Self {
        Literal::new(Value::Int64(value), DataType::Int8)
    }

    pub fn numeric(value: f64) -> Self {
        Literal::new(Value::Numeric(value), DataType::Numeric)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Literal::new(Value::Text(value.into()), DataType::Text)
    }

    pub fn int2_array(values: Vec<i16>) -> Self {
        Literal::new(
            Value::Array(values.into_iter().map(Value::Int16).collect()),
            DataType::Int2Array,
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpression {
    pub operator: Operator,
    pub operand: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpression {
    pub l_operand: Expression,
    pub operator: Operator,
    pub r_operand: Expression,
}

/// A parenthesized sub-expression. Pushed empty as a placeholder when
/// the source opens a parenthesis and populated when it closes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parenthetical {
    pub expression: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeCast {
    pub expression: Expression,
    pub cast_type: DataType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub function: Identifier,
    pub parameters: Vec<Expression>,
    pub distinct: bool,
    pub cast_type: DataType,
}

impl FunctionCall {
    pub fn new(function: &str, parameters: Vec<Expression>, cast_type: DataType) -> Self {
        FunctionCall {
            function: Identifier::from(function),
            parameters,
            distinct: false,
            cast_type,
        }
    }
}

/// SQL `ANY(array)`, used to flatten `IN` comparisons. The cast type is
/// always an array type; scalar hints are promoted on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnyExpression {
    pub expression: Expression,
    pub cast_type: DataType,
}

impl AnyExpression {
    pub fn new(expression: Expression, data_type: DataType) -> Self {
        let cast_type = if data_type.is_array_type() || !data_type.is_known() {
            data_type
        } else {
            data_type.to_array_type().unwrap_or(DataType::AnyArray)
        };

        AnyExpression {
            expression,
            cast_type,
        }
    }

    /// Wrap an expression, taking the cast type from the expression's
    /// own hint.
    pub fn hinted(expression: Expression) -> Self {
        let hint = expression.type_hint().unwrap_or(DataType::Unknown);
        AnyExpression::new(expression, hint)
    }
}

/// A projection with a FROM clause, embedded as an expression. Carries
/// forms like `epoch FROM now()` inside `extract(..)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionFrom {
    pub projection: Vec<Expression>,
    pub from: Vec<Expression>,
}

/// A column projected out of a composite row value: `(identifier).column`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowColumnReference {
    pub identifier: Identifier,
    pub column: Identifier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Literal(Literal),
    Identifier(Identifier),
    CompoundIdentifier(CompoundIdentifier),
    RowColumnReference(RowColumnReference),
    Unary(Box<UnaryExpression>),
    Binary(Box<BinaryExpression>),
    Parenthetical(Box<Parenthetical>),
    TypeCast(Box<TypeCast>),
    FunctionCall(FunctionCall),
    Any(Box<AnyExpression>),
    ProjectionFrom(Box<ProjectionFrom>),
}

impl Expression {
    pub fn binary(l_operand: Expression, operator: Operator, r_operand: Expression) -> Expression {
        Expression::Binary(Box::new(BinaryExpression {
            l_operand,
            operator,
            r_operand,
        }))
    }

    pub fn unary(operator: Operator, operand: Expression) -> Expression {
        Expression::Unary(Box::new(UnaryExpression { operator, operand }))
    }

    pub fn type_cast(expression: Expression, cast_type: DataType) -> Expression {
        Expression::TypeCast(Box::new(TypeCast {
            expression,
            cast_type,
        }))
    }

    pub fn any(expression: Expression, data_type: DataType) -> Expression {
        Expression::Any(Box::new(AnyExpression::new(expression, data_type)))
    }

    /// The declared type of a type-hinted node: literals, type casts,
    /// function calls, and any-expressions. `None` for nodes whose type
    /// must be inferred.
    pub fn type_hint(&self) -> Option<DataType> {
        match self {
            Expression::Literal(literal) => Some(literal.cast_type),
            Expression::TypeCast(cast) => Some(cast.cast_type),
            Expression::FunctionCall(call) => Some(call.cast_type),
            Expression::Any(any) => Some(any.cast_type),
            _ => None,
        }
    }
}

fn escape_text(value: &str) -> String {
    value.replace('\'', "''")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::Int16(value) => write!(f, "{}", value),
            Value::Int32(value) => write!(f, "{}", value),
            Value::Int64(value) => write!(f, "{}", value),
            Value::Numeric(value) => write!(f, "{}", value),
            Value::Text(value) => write!(f, "'{}'", escape_text(value)),
            Value::Array(values) => {
                write!(f, "ARRAY[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;

        // Array literals spell out their element type
        if matches!(self.value, Value::Array(_)) && self.cast_type.is_known() {
            write!(f, "::{}", self.cast_type)?;
        }

        Ok(())
    }
}

/// Whether rendering this expression already yields a parenthesized
/// form, making an extra wrapping redundant.
fn renders_parenthesized(expression: &Expression) -> bool {
    match expression {
        Expression::Parenthetical(_) => true,
        Expression::Binary(binary) => matches!(
            binary.operator,
            Operator::JSONField
                | Operator::JSONTextField
                | Operator::JSONBFieldExists
                | Operator::PropertyLookup
        ),
        _ => false,
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(literal) => write!(f, "{}", literal),
            Expression::Identifier(identifier) => write!(f, "{}", identifier),
            Expression::CompoundIdentifier(compound) => write!(f, "{}", compound),
            Expression::RowColumnReference(reference) => {
                write!(f, "({}).{}", reference.identifier, reference.column)
            }
            Expression::Unary(unary) => write!(f, "{} {}", unary.operator, unary.operand),
            Expression::Binary(binary) => {
                if renders_parenthesized(self) {
                    write!(
                        f,
                        "({} {} {})",
                        binary.l_operand, binary.operator, binary.r_operand
                    )
                } else {
                    write!(
                        f,
                        "{} {} {}",
                        binary.l_operand, binary.operator, binary.r_operand
                    )
                }
            }
            Expression::Parenthetical(parenthetical) => match &parenthetical.expression {
                Some(inner) => write!(f, "({})", inner),
                None => write!(f, "()"),
            },
            Expression::TypeCast(cast) => {
                if matches!(cast.expression, Expression::Binary(_))
                    && !renders_parenthesized(&cast.expression)
                {
                    write!(f, "({})::{}", cast.expression, cast.cast_type)
                } else {
                    write!(f, "{}::{}", cast.expression, cast.cast_type)
                }
            }
            Expression::FunctionCall(call) => {
                // Niladic temporal keywords render without parentheses
                if call.parameters.is_empty()
                    && matches!(
                        call.function.as_str(),
                        functions::CURRENT_DATE
                            | functions::CURRENT_TIME
                            | functions::LOCALTIME
                            | functions::LOCALTIMESTAMP
                    )
                {
                    return write!(f, "{}", call.function);
                }

                write!(f, "{}(", call.function)?;
                if call.distinct {
                    write!(f, "DISTINCT ")?;
                }
                for (index, parameter) in call.parameters.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", parameter)?;
                }
                write!(f, ")")?;

                if call.cast_type.is_known() {
                    write!(f, "::{}", call.cast_type)?;
                }

                Ok(())
            }
            Expression::Any(any) => write!(f, "ANY({})", any.expression),
            Expression::ProjectionFrom(projection) => {
                for (index, item) in projection.projection.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, " FROM ")?;
                for (index, source) in projection.from.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", source)?;
                }
                Ok(())
            }
        }
    }
}
