//! SQL data types and the conversion lattice used during translation.
//!
//! The lattice is the single authority for type questions asked while
//! rewriting expressions: whether two types compare under an operator,
//! what type a binary expression produces, and how scalar and array
//! forms map onto each other. Keeping every answer here means a change
//! to one conversion rule ripples through inference and rewriting
//! without scattered conditionals.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::operator::Operator;

/// A PostgreSQL data type as seen by the translator.
///
/// `Unknown` is a pipeline-safe sentinel: the type has not been
/// determined yet but may become known by a later inference pass.
/// `Unset` is an explicit error state and never unifies with anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Unset,
    Unknown,

    Boolean,
    Int2,
    Int4,
    Int8,
    Numeric,
    Text,
    Date,
    TimeWithTimeZone,
    TimeWithoutTimeZone,
    TimestampWithTimeZone,
    TimestampWithoutTimeZone,
    JSONB,

    // Composite row types for graph entities
    NodeComposite,
    EdgeComposite,
    PathComposite,
    ExpansionRootNode,
    ExpansionTerminalNode,
    ExpansionEdge,

    BooleanArray,
    Int2Array,
    Int4Array,
    Int8Array,
    NumericArray,
    TextArray,
    JSONBArray,
    NodeCompositeArray,
    EdgeCompositeArray,

    /// An array whose element type is not pinned down. `to_array_type`
    /// of `Unknown` and of `AnyArray` itself both land here.
    AnyArray,
}

impl DataType {
    /// True unless the type is the `Unknown` sentinel or the `Unset`
    /// error state.
    pub fn is_known(&self) -> bool {
        !matches!(self, DataType::Unknown | DataType::Unset)
    }

    pub fn is_array_type(&self) -> bool {
        matches!(
            self,
            DataType::BooleanArray
                | DataType::Int2Array
                | DataType::Int4Array
                | DataType::Int8Array
                | DataType::NumericArray
                | DataType::TextArray
                | DataType::JSONBArray
                | DataType::NodeCompositeArray
                | DataType::EdgeCompositeArray
                | DataType::AnyArray
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Int2 | DataType::Int4 | DataType::Int8 | DataType::Numeric
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            DataType::Date
                | DataType::TimeWithTimeZone
                | DataType::TimeWithoutTimeZone
                | DataType::TimestampWithTimeZone
                | DataType::TimestampWithoutTimeZone
        )
    }

    /// The element type of an array type. `None` for non-array types.
    pub fn array_base_type(&self) -> Option<DataType> {
        let base = match self {
            DataType::BooleanArray => DataType::Boolean,
            DataType::Int2Array => DataType::Int2,
            DataType::Int4Array => DataType::Int4,
            DataType::Int8Array => DataType::Int8,
            DataType::NumericArray => DataType::Numeric,
            DataType::TextArray => DataType::Text,
            DataType::JSONBArray => DataType::JSONB,
            DataType::NodeCompositeArray => DataType::NodeComposite,
            DataType::EdgeCompositeArray => DataType::EdgeComposite,
            DataType::AnyArray => DataType::Unknown,
            _ => return None,
        };

        Some(base)
    }

    /// The array form of a type. Array types map to themselves and
    /// `Unknown` maps to `AnyArray` so partially-typed expressions can
    /// keep flowing. `None` for types with no array form.
    pub fn to_array_type(&self) -> Option<DataType> {
        if self.is_array_type() {
            return Some(*self);
        }

        let array = match self {
            DataType::Boolean => DataType::BooleanArray,
            DataType::Int2 => DataType::Int2Array,
            DataType::Int4 => DataType::Int4Array,
            DataType::Int8 => DataType::Int8Array,
            DataType::Numeric => DataType::NumericArray,
            DataType::Text => DataType::TextArray,
            DataType::JSONB => DataType::JSONBArray,
            DataType::NodeComposite => DataType::NodeCompositeArray,
            DataType::EdgeComposite => DataType::EdgeCompositeArray,
            DataType::Unknown => DataType::AnyArray,
            _ => return None,
        };

        Some(array)
    }

    fn is_node_composite(&self) -> bool {
        matches!(
            self,
            DataType::NodeComposite | DataType::ExpansionRootNode | DataType::ExpansionTerminalNode
        )
    }

    fn is_edge_composite(&self) -> bool {
        matches!(self, DataType::EdgeComposite | DataType::ExpansionEdge)
    }

    /// Whether a value of this type can be compared against `other`
    /// using `operator`.
    ///
    /// `Unknown` unifies with any known type in one direction; `Unset`
    /// never compares. JSONB is never directly comparable: a property
    /// lookup has to be rewritten to a typed field access first.
    pub fn is_comparable(&self, other: DataType, operator: Operator) -> bool {
        if matches!(self, DataType::Unset) || matches!(other, DataType::Unset) {
            return false;
        }

        if matches!(self, DataType::Unknown) || matches!(other, DataType::Unknown) {
            return true;
        }

        if matches!(self, DataType::JSONB) || matches!(other, DataType::JSONB) {
            return false;
        }

        if *self == other {
            return true;
        }

        if self.is_numeric() && other.is_numeric() {
            return true;
        }

        if self.is_temporal() && other.is_temporal() {
            return true;
        }

        if self.is_node_composite() && other.is_node_composite() {
            return true;
        }

        if self.is_edge_composite() && other.is_edge_composite() {
            return true;
        }

        if self.is_array_type() && other.is_array_type() {
            return match (self.array_base_type(), other.array_base_type()) {
                (Some(left), Some(right)) => left.is_comparable(right, operator),
                _ => false,
            };
        }

        false
    }

    /// The type produced by `self operator other`, or `None` when the
    /// pair is incompatible under the operator.
    ///
    /// Comparators and boolean operators produce `Boolean`; arithmetic
    /// widens numerics; concatenation produces text when either side is
    /// text and an array type when either side is an array.
    pub fn operator_result_type(&self, other: DataType, operator: Operator) -> Option<DataType> {
        if matches!(self, DataType::Unset) || matches!(other, DataType::Unset) {
            return None;
        }

        match operator {
            Operator::And | Operator::Or => {
                let boolean_like = |data_type: DataType| {
                    matches!(data_type, DataType::Boolean | DataType::Unknown)
                };

                (boolean_like(*self) && boolean_like(other)).then_some(DataType::Boolean)
            }

            operator if operator.is_comparator() => self
                .is_comparable(other, operator)
                .then_some(DataType::Boolean),

            Operator::Concatenate => self.concatenation_result_type(other),

            // The Cypher `+` operator is ambiguous between addition and
            // concatenation until its operands are typed.
            Operator::CypherAdd => {
                if self.is_array_type() || other.is_array_type() {
                    self.concatenation_result_type(other)
                } else if matches!(self, DataType::Text) && matches!(other, DataType::Text) {
                    Some(DataType::Text)
                } else {
                    self.arithmetic_result_type(other)
                }
            }

            Operator::Add
            | Operator::Subtract
            | Operator::Multiply
            | Operator::Divide
            | Operator::Modulo => self.arithmetic_result_type(other),

            _ => {
                if *self == other {
                    Some(*self)
                } else if !self.is_known() {
                    Some(other)
                } else if !other.is_known() {
                    Some(*self)
                } else {
                    None
                }
            }
        }
    }

    fn concatenation_result_type(&self, other: DataType) -> Option<DataType> {
        if self.is_array_type() || other.is_array_type() {
            if *self == other {
                return Some(*self);
            }

            if !self.is_known() {
                return Some(other);
            }

            if !other.is_known() {
                return Some(*self);
            }

            // element || array and array || element both produce the array
            if other.array_base_type() == Some(*self) {
                return Some(other);
            }

            if self.array_base_type() == Some(other) {
                return Some(*self);
            }

            return None;
        }

        if matches!(self, DataType::Text) || matches!(other, DataType::Text) {
            return Some(DataType::Text);
        }

        None
    }

    fn arithmetic_result_type(&self, other: DataType) -> Option<DataType> {
        if !self.is_known() {
            return (other.is_numeric() || !other.is_known()).then_some(other);
        }

        if !other.is_known() {
            return self.is_numeric().then_some(*self);
        }

        if self.is_numeric() && other.is_numeric() {
            return Some(if numeric_rank(*self) >= numeric_rank(other) {
                *self
            } else {
                other
            });
        }

        None
    }
}

fn numeric_rank(data_type: DataType) -> u8 {
    match data_type {
        DataType::Int2 => 1,
        DataType::Int4 => 2,
        DataType::Int8 => 3,
        DataType::Numeric => 4,
        _ => 0,
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Unset => "unset",
            DataType::Unknown => "unknown",
            DataType::Boolean => "bool",
            DataType::Int2 => "int2",
            DataType::Int4 => "int4",
            DataType::Int8 => "int8",
            DataType::Numeric => "numeric",
            DataType::Text => "text",
            DataType::Date => "date",
            DataType::TimeWithTimeZone => "timetz",
            DataType::TimeWithoutTimeZone => "time",
            DataType::TimestampWithTimeZone => "timestamptz",
            DataType::TimestampWithoutTimeZone => "timestamp",
            DataType::JSONB => "jsonb",
            DataType::NodeComposite => "nodecomposite",
            DataType::EdgeComposite => "edgecomposite",
            DataType::PathComposite => "pathcomposite",
            DataType::ExpansionRootNode => "expansionrootnode",
            DataType::ExpansionTerminalNode => "expansionterminalnode",
            DataType::ExpansionEdge => "expansionedge",
            DataType::BooleanArray => "bool[]",
            DataType::Int2Array => "int2[]",
            DataType::Int4Array => "int4[]",
            DataType::Int8Array => "int8[]",
            DataType::NumericArray => "numeric[]",
            DataType::TextArray => "text[]",
            DataType::JSONBArray => "jsonb[]",
            DataType::NodeCompositeArray => "nodecomposite[]",
            DataType::EdgeCompositeArray => "edgecomposite[]",
            DataType::AnyArray => "anyarray",
        };

        write!(f, "{}", name)
    }
}
