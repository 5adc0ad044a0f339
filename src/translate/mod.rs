//! Translation of parsed Cypher expressions into the SQL expression
//! model.
//!
//! The [`Translator`] walks a Cypher expression tree bottom-up,
//! pushing translated leaves onto an [`ExpressionTreeTranslator`] and
//! combining them as operators complete. Boolean leaves that finish at
//! the outermost conjunction level are distributed to the constraint
//! tracker, scoped to the identifiers they reference, for later join
//! planning.
//!
//! A translator instance serves exactly one translation: its state is
//! not reentrant and the first error recorded wins.

pub mod constraints;
pub mod errors;
pub mod expression;
pub mod functions;
pub mod scope;

use crate::cypher;
use crate::pgsql::{
    columns, AnyExpression, CompoundIdentifier, DataType, Expression, Literal, Operator, Value,
};

pub use constraints::{Constraint, ConstraintTracker};
pub use errors::{KindMapperError, TranslationError};
pub use expression::{
    conjoin_expressions, decompose_property_lookup, extract_identifier_references,
    infer_expression_type, type_cast_expression, ExpressionTreeBuilder, ExpressionTreeTranslator,
    PropertyLookupRef,
};
pub use scope::{Binding, Scope};

#[cfg(test)]
use mockall::automock;

/// Resolves symbolic kind names (labels and edge types) to their
/// numeric ids.
///
/// This is the only collaborator allowed to perform I/O: resolving a
/// kind may hit the schema store, so implementations may block and
/// should surface cancellation as [`KindMapperError::Cancelled`].
#[cfg_attr(test, automock)]
pub trait KindMapper {
    fn map_kinds(&self, kinds: &[String]) -> Result<Vec<i16>, KindMapperError>;
}

pub fn translate_operator(operator: cypher::Operator) -> Operator {
    match operator {
        cypher::Operator::Addition => Operator::CypherAdd,
        cypher::Operator::Subtraction => Operator::Subtract,
        cypher::Operator::Multiplication => Operator::Multiply,
        cypher::Operator::Division => Operator::Divide,
        cypher::Operator::ModuloDivision => Operator::Modulo,
        cypher::Operator::Equal => Operator::Equals,
        cypher::Operator::NotEqual => Operator::NotEquals,
        cypher::Operator::LessThan => Operator::LessThan,
        cypher::Operator::GreaterThan => Operator::GreaterThan,
        cypher::Operator::LessThanEqual => Operator::LessThanOrEqualTo,
        cypher::Operator::GreaterThanEqual => Operator::GreaterThanOrEqualTo,
        cypher::Operator::RegexMatch => Operator::CypherRegexMatch,
        cypher::Operator::And => Operator::And,
        cypher::Operator::Or => Operator::Or,
        cypher::Operator::In => Operator::In,
        cypher::Operator::StartsWith => Operator::CypherStartsWith,
        cypher::Operator::EndsWith => Operator::CypherEndsWith,
        cypher::Operator::Contains => Operator::CypherContains,
        cypher::Operator::Is => Operator::Is,
        cypher::Operator::IsNot => Operator::IsNot,
        cypher::Operator::Not => Operator::Not,
    }
}

/// Map SET-clause assignment forms. Exposed for the clause planner;
/// WHERE translation never reaches these.
pub fn translate_assignment_operator(operator: cypher::AssignmentOperator) -> Operator {
    match operator {
        cypher::AssignmentOperator::Assignment => Operator::Assignment,
        cypher::AssignmentOperator::LabelAssignment => Operator::KindAssignment,
    }
}

pub(crate) fn translate_literal(literal: &cypher::Literal) -> Literal {
    match literal {
        cypher::Literal::Integer(value) => Literal::int8(*value),
        cypher::Literal::Float(value) => Literal::numeric(*value),
        cypher::Literal::Boolean(value) => Literal::boolean(*value),
        cypher::Literal::String(value) => Literal::text(value.clone()),
        cypher::Literal::Null => Literal::null(),
    }
}

/// Translate a list of literal elements into a typed array literal.
/// Numeric elements widen to a common type; anything else must agree.
fn translate_list_literal(items: &[cypher::Expression]) -> Result<Literal, TranslationError> {
    let mut values = Vec::with_capacity(items.len());
    let mut element_type = DataType::Unknown;

    for item in items {
        let cypher::Expression::Literal(literal) = item else {
            return Err(TranslationError::UnsupportedExpression(
                "list literals must contain literal values".to_string(),
            ));
        };

        let translated = translate_literal(literal);

        if element_type == DataType::Unknown {
            element_type = translated.cast_type;
        } else if translated.cast_type.is_known() && translated.cast_type != element_type {
            element_type = element_type
                .operator_result_type(translated.cast_type, Operator::Add)
                .ok_or_else(|| {
                    TranslationError::UnsupportedExpression(
                        "list literal with mixed element types".to_string(),
                    )
                })?;
        }

        values.push(translated.value);
    }

    let cast_type = element_type.to_array_type().unwrap_or(DataType::AnyArray);
    Ok(Literal::new(Value::Array(values), cast_type))
}

/// Walks one parsed Cypher expression tree and drives the expression
/// tree translator. Create a fresh instance per translation.
pub struct Translator<'a> {
    pub(crate) scope: &'a Scope,
    pub(crate) kind_mapper: &'a dyn KindMapper,
    pub(crate) tree_translator: ExpressionTreeTranslator,
    error: Option<TranslationError>,
}

impl<'a> Translator<'a> {
    pub fn new(scope: &'a Scope, kind_mapper: &'a dyn KindMapper) -> Self {
        Translator {
            scope,
            kind_mapper,
            tree_translator: ExpressionTreeTranslator::new(),
            error: None,
        }
    }

    /// Record a translation failure. Only the first error is kept;
    /// later pushes and pops remain legal so a visitor can drain.
    pub fn set_error(&mut self, error: TranslationError) {
        if self.error.is_none() {
            log::debug!("translation failed: {}", error);
            self.error = Some(error);
        }
    }

    /// Translate an expression, leaving its result on the stack for
    /// [`pop_expression`](Self::pop_expression). Used for projection
    /// items.
    pub fn translate_expression(&mut self, expression: &cypher::Expression) {
        if let Err(error) = self.walk(expression) {
            self.set_error(error);
        }
    }

    /// Translate a WHERE clause: walk the predicate, flush every
    /// completed boolean leaf into the constraint tracker, and verify
    /// the depth counters returned to zero.
    pub fn translate_where_clause(&mut self, expression: &cypher::Expression) {
        self.translate_expression(expression);

        if self.error.is_some() {
            return;
        }

        if let Err(error) = self.tree_translator.pop_remaining_expressions_as_constraints() {
            self.set_error(error);
            return;
        }

        if let Err(error) = self.tree_translator.assert_balanced() {
            self.set_error(error);
        }
    }

    pub fn pop_expression(&mut self) -> Result<Expression, TranslationError> {
        self.tree_translator.pop()
    }

    /// Surface the first error, or hand the finished tree translator
    /// to the consumer for constraint consumption.
    pub fn finish(self) -> Result<ExpressionTreeTranslator, TranslationError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.tree_translator),
        }
    }

    pub(crate) fn walk(&mut self, expression: &cypher::Expression) -> Result<(), TranslationError> {
        match expression {
            cypher::Expression::Literal(literal) => {
                self.tree_translator
                    .push(Expression::Literal(translate_literal(literal)));
                Ok(())
            }

            cypher::Expression::Variable(symbol) => {
                let binding = self
                    .scope
                    .lookup_string(symbol)
                    .ok_or_else(|| TranslationError::UnboundIdentifier(symbol.clone()))?;

                self.tree_translator
                    .push(Expression::Identifier(binding.identifier.clone()));
                Ok(())
            }

            cypher::Expression::List(items) => {
                let literal = translate_list_literal(items)?;
                self.tree_translator.push(Expression::Literal(literal));
                Ok(())
            }

            cypher::Expression::PropertyLookup(lookup) => self.translate_property_lookup(lookup),

            cypher::Expression::KindMatcher(matcher) => self.translate_kind_matcher(matcher),

            cypher::Expression::UnaryOp(unary) => {
                self.walk(&unary.operand)?;

                let operand = self.tree_translator.pop()?;
                self.tree_translator
                    .push(Expression::unary(translate_operator(unary.operator), operand));
                Ok(())
            }

            cypher::Expression::BinaryOp(binary) => {
                let operator = translate_operator(binary.operator);

                // Boolean operators are tracked from the moment the
                // walker enters them so nested operators see the
                // enclosing depth
                if matches!(operator, Operator::And | Operator::Or) {
                    self.tree_translator.push_operator(operator);
                }

                self.walk(&binary.l_operand)?;
                self.walk(&binary.r_operand)?;

                self.tree_translator.pop_push_operator(self.scope, operator)
            }

            cypher::Expression::Parenthetical(inner) => {
                self.tree_translator.push_parenthetical();
                self.walk(inner)?;

                let wrapped = self.tree_translator.pop()?;
                let mut parenthetical = self.tree_translator.pop_parenthetical()?;
                parenthetical.expression = Some(wrapped);

                self.tree_translator
                    .push(Expression::Parenthetical(Box::new(parenthetical)));
                Ok(())
            }

            cypher::Expression::FunctionInvocation(call) => {
                self.translate_function_invocation(call)
            }
        }
    }

    fn translate_property_lookup(
        &mut self,
        lookup: &cypher::PropertyLookup,
    ) -> Result<(), TranslationError> {
        self.walk(&lookup.atom)?;

        let [symbol] = lookup.symbols.as_slice() else {
            return Err(TranslationError::UnsupportedExpression(
                "nested property lookups are not supported".to_string(),
            ));
        };

        match self.tree_translator.pop()? {
            Expression::Identifier(identifier) => {
                self.tree_translator
                    .push(Expression::CompoundIdentifier(CompoundIdentifier::column_ref(
                        identifier,
                        columns::PROPERTIES,
                    )));
                self.tree_translator
                    .push(Expression::Literal(Literal::text(symbol.clone())));

                self.tree_translator
                    .pop_push_operator(self.scope, Operator::PropertyLookup)
            }

            Expression::FunctionCall(call) => self.translate_temporal_component(call, symbol),

            other => Err(TranslationError::UnsupportedExpression(format!(
                "property lookup on {}",
                other
            ))),
        }
    }

    fn translate_kind_matcher(
        &mut self,
        matcher: &cypher::KindMatcher,
    ) -> Result<(), TranslationError> {
        let cypher::Expression::Variable(symbol) = matcher.reference.as_ref() else {
            return Err(TranslationError::InvalidKindMatcherReference);
        };

        let binding = self
            .scope
            .lookup_string(symbol)
            .ok_or_else(|| TranslationError::UnboundIdentifier(symbol.clone()))?;
        let identifier = binding.identifier.clone();
        let data_type = binding.data_type;

        let kind_ids = self.kind_mapper.map_kinds(&matcher.kinds)?;
        log::debug!(
            "matcher for {} resolved {} kind id(s)",
            symbol,
            kind_ids.len()
        );

        let kind_ids_literal = Expression::Literal(Literal::int2_array(kind_ids));

        match data_type {
            // Nodes hold all their kinds; matching is an array overlap
            DataType::NodeComposite
            | DataType::ExpansionRootNode
            | DataType::ExpansionTerminalNode => {
                self.tree_translator
                    .push(Expression::CompoundIdentifier(CompoundIdentifier::column_ref(
                        identifier,
                        columns::KIND_IDS,
                    )));
                self.tree_translator.push(kind_ids_literal);

                self.tree_translator
                    .pop_push_operator(self.scope, Operator::PGArrayOverlap)
            }

            // Edges carry exactly one kind
            DataType::EdgeComposite | DataType::ExpansionEdge => {
                self.tree_translator
                    .push(Expression::CompoundIdentifier(CompoundIdentifier::column_ref(
                        identifier,
                        columns::KIND_ID,
                    )));
                self.tree_translator
                    .push(Expression::Any(Box::new(AnyExpression::hinted(
                        kind_ids_literal,
                    ))));

                self.tree_translator
                    .pop_push_operator(self.scope, Operator::Equals)
            }

            other => Err(TranslationError::InvalidKindMatcherBinding(other)),
        }
    }
}
