//! Expression tree building, rewriting, and type inference.
//!
//! Translation runs bottom-up over a stack: the walker pushes leaves,
//! and popping an operator combines the top of the stack into a new
//! node while rewrite rules replace source-dialect operators with SQL
//! operators and reconcile partially-known types. Boolean leaves that
//! complete at the outermost conjunction level are peeled off into the
//! constraint tracker instead of joining the tree.

use crate::pgsql::{
    columns, functions, is_reserved_identifier, AnyExpression, BinaryExpression,
    CompoundIdentifier, DataType, Expression, FunctionCall, Identifier, IdentifierSet, Literal,
    Operator, Parenthetical, UnaryExpression, Value,
};

use super::constraints::{Constraint, ConstraintTracker};
use super::errors::TranslationError;
use super::scope::Scope;

/// View the property lookup inside an expression, unwrapping
/// any-expression wrappers introduced by membership rewrites.
pub(crate) fn as_property_lookup(expression: &Expression) -> Option<&BinaryExpression> {
    match expression {
        Expression::Any(any) => as_property_lookup(&any.expression),
        Expression::Binary(binary) if binary.operator.is_property_lookup() => Some(binary),
        _ => None,
    }
}

/// Take ownership of the property lookup inside an expression,
/// discarding any-expression wrappers.
pub(crate) fn into_property_lookup(
    expression: Expression,
) -> Result<BinaryExpression, TranslationError> {
    match expression {
        Expression::Any(any) => into_property_lookup(any.expression),
        Expression::Binary(binary) if binary.operator.is_property_lookup() => Ok(*binary),
        _ => Err(TranslationError::UnexpectedExpression("property lookup")),
    }
}

/// Flip the operator of a property lookup in place, leaving any
/// wrapping intact.
fn set_property_lookup_operator(expression: &mut Expression, operator: Operator) {
    match expression {
        Expression::Any(any) => set_property_lookup_operator(&mut any.expression, operator),
        Expression::Binary(binary) if binary.operator.is_property_lookup() => {
            binary.operator = operator;
        }
        _ => {}
    }
}

/// A decomposed property lookup: the property bag column reference and
/// the field read from it.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyLookupRef {
    pub reference: CompoundIdentifier,
    pub field: String,
}

/// Split a property lookup into its column reference and field name.
/// The right operand of a property lookup must be a text literal.
pub fn decompose_property_lookup(
    expression: &Expression,
) -> Result<PropertyLookupRef, TranslationError> {
    let Some(lookup) = as_property_lookup(expression) else {
        return Err(TranslationError::UnexpectedExpression("property lookup"));
    };

    let Expression::CompoundIdentifier(reference) = &lookup.l_operand else {
        return Err(TranslationError::UnexpectedExpression(
            "compound identifier",
        ));
    };

    match &lookup.r_operand {
        Expression::Literal(literal) if literal.cast_type == DataType::Text => {
            match &literal.value {
                Value::Text(field) => Ok(PropertyLookupRef {
                    reference: reference.clone(),
                    field: field.clone(),
                }),
                _ => Err(TranslationError::InvalidPropertyLookupField),
            }
        }
        _ => Err(TranslationError::InvalidPropertyLookupField),
    }
}

/// Rewrite a property lookup for a desired result type.
///
/// Array results read the raw JSON field and convert it; text and
/// still-unknown results read the field as text directly; every other
/// scalar reads as text and casts to the target type.
pub(crate) fn rewrite_property_lookup(
    mut lookup: BinaryExpression,
    data_type: DataType,
) -> Expression {
    if data_type.is_array_type() {
        lookup.operator = Operator::JSONField;

        return Expression::FunctionCall(FunctionCall::new(
            functions::JSONB_TO_TEXT_ARRAY,
            vec![Expression::Binary(Box::new(lookup))],
            data_type,
        ));
    }

    lookup.operator = Operator::JSONTextField;

    match data_type {
        DataType::Text | DataType::Unknown => Expression::Binary(Box::new(lookup)),
        _ => Expression::type_cast(Expression::Binary(Box::new(lookup)), data_type),
    }
}

/// The element type of an array type, or the type itself when it has
/// no element form. Used where a lookup's target may or may not have
/// been narrowed to an array yet.
fn array_base(data_type: DataType) -> DataType {
    data_type.array_base_type().unwrap_or(data_type)
}

fn to_array(data_type: DataType) -> Result<DataType, TranslationError> {
    data_type
        .to_array_type()
        .ok_or(TranslationError::NoArrayForm(data_type))
}

/// Infer the type of an expression bottom-up, returning `Unknown`
/// rather than failing when the tree is only partially typed.
pub fn infer_expression_type(expression: &Expression) -> Result<DataType, TranslationError> {
    match expression {
        Expression::Identifier(_) | Expression::RowColumnReference(_) => Ok(DataType::Unknown),

        Expression::CompoundIdentifier(compound) => {
            if compound.len() != 2 {
                return Err(TranslationError::InvalidCompoundIdentifierArity(
                    compound.len(),
                ));
            }

            // Well known column names carry fixed types
            let column = compound.column().map(Identifier::as_str);

            Ok(match column {
                Some(columns::GRAPH_ID)
                | Some(columns::ID)
                | Some(columns::START_ID)
                | Some(columns::END_ID) => DataType::Int8,
                Some(columns::KIND_ID) => DataType::Int2,
                Some(columns::KIND_IDS) => DataType::Int2Array,
                Some(columns::PROPERTIES) => DataType::JSONB,
                _ => DataType::Unknown,
            })
        }

        Expression::Literal(_)
        | Expression::TypeCast(_)
        | Expression::FunctionCall(_)
        | Expression::Any(_) => Ok(expression.type_hint().unwrap_or(DataType::Unknown)),

        Expression::Binary(binary) => match binary.operator {
            // Field reads stay unknown so future inspections may
            // re-cast them
            Operator::PropertyLookup | Operator::JSONField | Operator::JSONTextField => {
                Ok(DataType::Unknown)
            }

            Operator::And
            | Operator::Or
            | Operator::Equals
            | Operator::NotEquals
            | Operator::GreaterThan
            | Operator::GreaterThanOrEqualTo
            | Operator::LessThan
            | Operator::LessThanOrEqualTo
            | Operator::In
            | Operator::JSONBFieldExists
            | Operator::Like
            | Operator::ILike
            | Operator::PGArrayOverlap => Ok(DataType::Boolean),

            _ => infer_binary_expression_type(binary),
        },

        Expression::Parenthetical(parenthetical) => match &parenthetical.expression {
            Some(inner) => infer_expression_type(inner),
            None => Ok(DataType::Unknown),
        },

        _ => {
            log::debug!("unable to infer a type hint for expression: {}", expression);
            Ok(DataType::Unknown)
        }
    }
}

/// Reconcile the operand hints of a binary expression through the
/// lattice. Operators that imply a type (string predicates, boolean
/// combinators) stand in when neither operand is hinted.
fn infer_binary_expression_type(
    expression: &BinaryExpression,
) -> Result<DataType, TranslationError> {
    let left_hint = expression.l_operand.type_hint();
    let right_hint = expression.r_operand.type_hint();

    match (left_hint, right_hint) {
        (Some(left), Some(right)) => left
            .operator_result_type(right, expression.operator)
            .ok_or(TranslationError::IncompatibleOperands {
                operator: expression.operator,
                left,
                right,
            }),

        (Some(left), None) => {
            let inferred = infer_expression_type(&expression.r_operand)?;

            if inferred == DataType::Unknown {
                // Assume the untyped side is convertible
                Ok(left)
            } else {
                left.operator_result_type(inferred, expression.operator)
                    .ok_or(TranslationError::IncompatibleOperands {
                        operator: expression.operator,
                        left,
                        right: inferred,
                    })
            }
        }

        (None, Some(right)) => {
            let inferred = infer_expression_type(&expression.l_operand)?;

            if inferred == DataType::Unknown {
                Ok(right)
            } else {
                right
                    .operator_result_type(inferred, expression.operator)
                    .ok_or(TranslationError::IncompatibleOperands {
                        operator: expression.operator,
                        left: inferred,
                        right,
                    })
            }
        }

        (None, None) => match expression.operator {
            // String predicates imply text operands
            Operator::CypherStartsWith | Operator::CypherContains | Operator::CypherEndsWith => {
                Ok(DataType::Text)
            }

            // Boolean combinators imply boolean operands
            Operator::And | Operator::Or => Ok(DataType::Boolean),

            _ => {
                let left = infer_expression_type(&expression.l_operand)?;
                let right = infer_expression_type(&expression.r_operand)?;

                if left == DataType::Unknown && right == DataType::Unknown {
                    // May be resolved elsewhere; not an error here
                    Ok(DataType::Unknown)
                } else {
                    left.operator_result_type(right, expression.operator).ok_or(
                        TranslationError::IncompatibleOperands {
                            operator: expression.operator,
                            left,
                            right,
                        },
                    )
                }
            }
        },
    }
}

/// Cast an expression to a type. Property lookups are rewritten for
/// the target type instead of being wrapped in a cast, since the
/// rewrite already chooses the right JSON operator and cast.
pub fn type_cast_expression(
    expression: Expression,
    data_type: DataType,
) -> Result<Expression, TranslationError> {
    if as_property_lookup(&expression).is_some() {
        let lookup = into_property_lookup(expression)?;
        return Ok(rewrite_property_lookup(lookup, data_type));
    }

    Ok(Expression::type_cast(expression, data_type))
}

/// Rewrite property-lookup operands of a binary expression to the type
/// demanded by the opposite operand and the operator.
fn rewrite_property_lookup_operands(
    expression: BinaryExpression,
) -> Result<BinaryExpression, TranslationError> {
    let BinaryExpression {
        mut l_operand,
        operator,
        mut r_operand,
    } = expression;

    let has_left_lookup = as_property_lookup(&l_operand).is_some();
    let has_right_lookup = as_property_lookup(&r_operand).is_some();

    // Direct property comparisons prefer JSONB on both sides
    if has_left_lookup && has_right_lookup {
        set_property_lookup_operator(&mut l_operand, Operator::JSONField);
        set_property_lookup_operator(&mut r_operand, Operator::JSONField);

        return Ok(BinaryExpression {
            l_operand,
            operator,
            r_operand,
        });
    }

    if has_left_lookup {
        let lookup = into_property_lookup(l_operand)?;

        l_operand = if let Expression::Any(any) = &r_operand {
            // The lookup is the <value> of a <value> IN <list>
            // expression; its type is the list's element type
            rewrite_property_lookup(lookup, array_base(any.cast_type))
        } else {
            let right_hint = infer_expression_type(&r_operand)?;

            match operator {
                Operator::In => rewrite_property_lookup(lookup, array_base(right_hint)),

                Operator::CypherStartsWith
                | Operator::CypherEndsWith
                | Operator::CypherContains
                | Operator::RegexMatch
                | Operator::CypherRegexMatch => rewrite_property_lookup(lookup, DataType::Text),

                _ => rewrite_property_lookup(lookup, right_hint),
            }
        };
    }

    if has_right_lookup {
        let lookup = into_property_lookup(r_operand)?;
        let left_hint = infer_expression_type(&l_operand)?;

        r_operand = match operator {
            Operator::In => rewrite_property_lookup(lookup, to_array(left_hint)?),

            Operator::CypherStartsWith
            | Operator::CypherEndsWith
            | Operator::CypherContains
            | Operator::RegexMatch
            | Operator::CypherRegexMatch => rewrite_property_lookup(lookup, DataType::Text),

            _ => rewrite_property_lookup(lookup, left_hint),
        };
    }

    Ok(BinaryExpression {
        l_operand,
        operator,
        r_operand,
    })
}

fn function_call_comparator_error(
    call: &FunctionCall,
    operator: Operator,
    comparison_type: DataType,
) -> TranslationError {
    // Coalesce has ill-defined conversion semantics in the source
    // dialect; a dedicated message reduces the surprise of running on
    // a non-graph-native substrate.
    if call.function.as_str() == functions::COALESCE {
        TranslationError::CoalesceComparison {
            signature: call.cast_type,
            other: comparison_type,
        }
    } else {
        TranslationError::FunctionComparison {
            signature: call.cast_type,
            operator,
            other: comparison_type,
        }
    }
}

/// Copy type hints into function-like operands (`ANY(..)` wrappers and
/// function calls) whose declared type is still unknown, validating
/// against the peer operand when both sides are known.
fn apply_function_like_type_hints(
    expression: BinaryExpression,
) -> Result<BinaryExpression, TranslationError> {
    let BinaryExpression {
        l_operand,
        operator,
        r_operand,
    } = expression;

    let (l_operand, r_operand) = hint_function_like_left(l_operand, operator, r_operand)?;
    let (l_operand, r_operand) = hint_function_like_right(l_operand, operator, r_operand)?;

    Ok(BinaryExpression {
        l_operand,
        operator,
        r_operand,
    })
}

fn hint_function_like_left(
    l_operand: Expression,
    operator: Operator,
    r_operand: Expression,
) -> Result<(Expression, Expression), TranslationError> {
    match l_operand {
        Expression::Any(mut any) => {
            let right_hint = infer_expression_type(&r_operand)?;

            if !any.cast_type.is_known() {
                any.cast_type = to_array(right_hint)?;
                Ok((Expression::Any(any), r_operand))
            } else if !right_hint.is_known() {
                let base = array_base(any.cast_type);
                Ok((
                    Expression::Any(any),
                    Expression::type_cast(r_operand, base),
                ))
            } else {
                let base = array_base(any.cast_type);

                if !base.is_comparable(right_hint, operator) {
                    Err(TranslationError::FunctionComparison {
                        signature: any.cast_type,
                        operator,
                        other: right_hint,
                    })
                } else {
                    Ok((Expression::Any(any), r_operand))
                }
            }
        }

        Expression::FunctionCall(mut call) => {
            let right_hint = infer_expression_type(&r_operand)?;

            if !call.cast_type.is_known() {
                call.cast_type = right_hint;
            }

            if operator.is_comparator() && !call.cast_type.is_comparable(right_hint, operator) {
                return Err(function_call_comparator_error(&call, operator, right_hint));
            }

            Ok((Expression::FunctionCall(call), r_operand))
        }

        other => Ok((other, r_operand)),
    }
}

fn hint_function_like_right(
    l_operand: Expression,
    operator: Operator,
    r_operand: Expression,
) -> Result<(Expression, Expression), TranslationError> {
    match r_operand {
        Expression::Any(mut any) => {
            let left_hint = infer_expression_type(&l_operand)?;

            if !any.cast_type.is_known() {
                if !left_hint.is_known() {
                    // Nothing to pin the element type to; keep the
                    // array castable
                    any.cast_type = DataType::AnyArray;
                } else {
                    any.cast_type = to_array(left_hint)?;
                }

                Ok((l_operand, Expression::Any(any)))
            } else if !left_hint.is_known() {
                let base = array_base(any.cast_type);
                Ok((
                    Expression::type_cast(l_operand, base),
                    Expression::Any(any),
                ))
            } else {
                let base = array_base(any.cast_type);

                if !any.cast_type.is_comparable(left_hint, operator)
                    && !base.is_comparable(left_hint, operator)
                {
                    Err(TranslationError::FunctionComparison {
                        signature: any.cast_type,
                        operator,
                        other: left_hint,
                    })
                } else {
                    Ok((l_operand, Expression::Any(any)))
                }
            }
        }

        Expression::FunctionCall(mut call) => {
            let left_hint = infer_expression_type(&l_operand)?;

            if !call.cast_type.is_known() {
                call.cast_type = left_hint;
                Ok((l_operand, Expression::FunctionCall(call)))
            } else if !left_hint.is_known() {
                let base = array_base(call.cast_type);
                Ok((
                    Expression::type_cast(l_operand, base),
                    Expression::FunctionCall(call),
                ))
            } else if operator.is_comparator()
                && !call.cast_type.is_comparable(left_hint, operator)
            {
                Err(function_call_comparator_error(&call, operator, left_hint))
            } else {
                Ok((l_operand, Expression::FunctionCall(call)))
            }
        }

        other => Ok((l_operand, other)),
    }
}

/// Hint application run whenever a binary expression is formed or
/// popped. Fresh property lookups become text-field reads; all other
/// operators go through operand rewriting and function-like hinting.
pub(crate) fn apply_binary_expression_type_hints(
    mut expression: BinaryExpression,
) -> Result<BinaryExpression, TranslationError> {
    if expression.operator == Operator::PropertyLookup {
        expression.operator = Operator::JSONTextField;
        return Ok(expression);
    }

    let expression = rewrite_property_lookup_operands(expression)?;
    apply_function_like_type_hints(expression)
}

/// A property lookup under a unary operator is a bare predicate; force
/// it boolean.
fn apply_unary_expression_type_hints(
    expression: UnaryExpression,
) -> Result<UnaryExpression, TranslationError> {
    let UnaryExpression { operator, operand } = expression;

    let operand = if as_property_lookup(&operand).is_some() {
        let lookup = into_property_lookup(operand)?;
        rewrite_property_lookup(lookup, DataType::Boolean)
    } else {
        operand
    };

    Ok(UnaryExpression { operator, operand })
}

/// Collect the non-reserved identifiers an expression references.
pub fn extract_identifier_references(expression: &Expression) -> IdentifierSet {
    let mut dependencies = IdentifierSet::new();
    collect_identifier_references(expression, &mut dependencies);
    dependencies
}

fn collect_identifier_references(expression: &Expression, dependencies: &mut IdentifierSet) {
    match expression {
        Expression::Literal(_) => {}

        Expression::Identifier(identifier) => {
            if !is_reserved_identifier(identifier) {
                dependencies.insert(identifier.clone());
            }
        }

        Expression::CompoundIdentifier(compound) => {
            if let Some(root) = compound.root() {
                if !is_reserved_identifier(root) {
                    dependencies.insert(root.clone());
                }
            }
        }

        Expression::RowColumnReference(reference) => {
            if !is_reserved_identifier(&reference.identifier) {
                dependencies.insert(reference.identifier.clone());
            }
        }

        Expression::Unary(unary) => collect_identifier_references(&unary.operand, dependencies),

        Expression::Binary(binary) => {
            collect_identifier_references(&binary.l_operand, dependencies);
            collect_identifier_references(&binary.r_operand, dependencies);
        }

        Expression::Parenthetical(parenthetical) => {
            if let Some(inner) = &parenthetical.expression {
                collect_identifier_references(inner, dependencies);
            }
        }

        Expression::TypeCast(cast) => {
            collect_identifier_references(&cast.expression, dependencies)
        }

        Expression::FunctionCall(call) => {
            for parameter in &call.parameters {
                collect_identifier_references(parameter, dependencies);
            }
        }

        Expression::Any(any) => collect_identifier_references(&any.expression, dependencies),

        Expression::ProjectionFrom(projection) => {
            for item in &projection.projection {
                collect_identifier_references(item, dependencies);
            }
            for source in &projection.from {
                collect_identifier_references(source, dependencies);
            }
        }
    }
}

/// Fold expressions into a single conjunction, re-running hint
/// application for each joined pair.
pub fn conjoin_expressions(
    expressions: Vec<Expression>,
) -> Result<Option<Expression>, TranslationError> {
    let mut conjoined: Option<Expression> = None;

    for expression in expressions {
        conjoined = Some(match conjoined {
            None => expression,
            Some(existing) => {
                let joined = apply_binary_expression_type_hints(BinaryExpression {
                    l_operand: existing,
                    operator: Operator::And,
                    r_operand: expression,
                })?;

                Expression::Binary(Box::new(joined))
            }
        });
    }

    Ok(conjoined)
}

/// LIFO container for expressions under assembly. Popping a unary or
/// binary node applies type-hint rewrites before handing it back.
#[derive(Debug, Default)]
pub struct ExpressionTreeBuilder {
    stack: Vec<Expression>,
}

impl ExpressionTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn push(&mut self, expression: Expression) {
        self.stack.push(expression);
    }

    pub fn peek(&self) -> Option<&Expression> {
        self.stack.last()
    }

    pub fn pop(&mut self) -> Result<Expression, TranslationError> {
        let next = self
            .stack
            .pop()
            .ok_or(TranslationError::EmptyExpressionStack)?;

        match next {
            Expression::Unary(unary) => Ok(Expression::Unary(Box::new(
                apply_unary_expression_type_hints(*unary)?,
            ))),

            Expression::Binary(binary) => Ok(Expression::Binary(Box::new(
                apply_binary_expression_type_hints(*binary)?,
            ))),

            other => Ok(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CompositeFamily {
    Node,
    NodeArray,
    Edge,
    EdgeArray,
    Path,
}

fn composite_family(data_type: DataType) -> Option<CompositeFamily> {
    match data_type {
        DataType::NodeComposite | DataType::ExpansionRootNode | DataType::ExpansionTerminalNode => {
            Some(CompositeFamily::Node)
        }
        DataType::NodeCompositeArray => Some(CompositeFamily::NodeArray),
        DataType::EdgeComposite | DataType::ExpansionEdge => Some(CompositeFamily::Edge),
        DataType::EdgeCompositeArray => Some(CompositeFamily::EdgeArray),
        DataType::PathComposite => Some(CompositeFamily::Path),
        _ => None,
    }
}

/// Rewrite comparisons between bound entities to compare their
/// identity columns. For example `match (n1)-[]->(n2) where n1 <> n2`
/// compares `n1.id` against `n2.id`.
fn rewrite_identity_operands(
    scope: &Scope,
    expression: &mut BinaryExpression,
) -> Result<(), TranslationError> {
    let (l_identifier, r_identifier) =
        match (&expression.l_operand, &expression.r_operand) {
            (Expression::Identifier(left), Expression::Identifier(right)) => {
                (left.clone(), right.clone())
            }
            _ => return Ok(()),
        };

    let l_binding = scope
        .lookup(&l_identifier)
        .ok_or_else(|| TranslationError::UnboundIdentifier(l_identifier.to_string()))?;
    let r_binding = scope
        .lookup(&r_identifier)
        .ok_or_else(|| TranslationError::UnboundIdentifier(r_identifier.to_string()))?;

    use CompositeFamily::*;

    match (
        composite_family(l_binding.data_type),
        composite_family(r_binding.data_type),
    ) {
        // Scalar comparisons are left alone
        (None, None) => Ok(()),

        (Some(Path), _) | (_, Some(Path)) => Err(TranslationError::UnsupportedPathComparison),

        (Some(NodeArray), _) | (Some(EdgeArray), _) => Err(
            TranslationError::UnsupportedCompositeArray(l_binding.data_type),
        ),

        (Some(Node), Some(Node | NodeArray)) | (Some(Edge), Some(Edge | EdgeArray)) => {
            expression.l_operand = Expression::CompoundIdentifier(
                CompoundIdentifier::column_ref(l_identifier, columns::ID),
            );
            expression.r_operand = Expression::CompoundIdentifier(
                CompoundIdentifier::column_ref(r_identifier, columns::ID),
            );
            Ok(())
        }

        _ => Err(TranslationError::InvalidEntityComparison(
            l_binding.data_type,
            r_binding.data_type,
        )),
    }
}

/// Where the pattern wildcard lands when a string predicate becomes
/// `LIKE`.
#[derive(Debug, Clone, Copy)]
enum WildcardPlacement {
    /// CONTAINS: `%value%`
    Both,
    /// STARTS WITH: `value%`
    Trailing,
    /// ENDS WITH: `%value`
    Leading,
}

fn percent() -> Expression {
    Expression::Literal(Literal::text("%"))
}

fn concatenate(l_operand: Expression, r_operand: Expression) -> Expression {
    Expression::binary(l_operand, Operator::Concatenate, r_operand)
}

fn wrap_with_wildcards(placement: WildcardPlacement, inner: Expression) -> Expression {
    match placement {
        WildcardPlacement::Both => concatenate(percent(), concatenate(inner, percent())),
        WildcardPlacement::Trailing => concatenate(inner, percent()),
        WildcardPlacement::Leading => concatenate(percent(), inner),
    }
}

/// Owns the builder, the constraint tracker, and the depth counters
/// that drive constraint extraction.
///
/// Depth bookkeeping: each `AND`/`OR` operator occurrence increments
/// its depth when the walker enters the operator and decrements it when
/// the operator is popped. A conjunction popped at the outermost
/// boolean scope peels its completed operand off as a constraint; a
/// disjunction popped there fuses its operands into one `OR` node,
/// since a disjunction cannot be split across tables.
#[derive(Debug, Default)]
pub struct ExpressionTreeTranslator {
    pub identifier_constraints: ConstraintTracker,

    projection_constraints: Vec<Constraint>,
    tree_builder: ExpressionTreeBuilder,
    parenthetical_depth: i64,
    disjunction_depth: i64,
    conjunction_depth: i64,
}

impl ExpressionTreeTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.tree_builder.depth()
    }

    pub fn push(&mut self, expression: Expression) {
        self.tree_builder.push(expression);
    }

    pub fn peek(&self) -> Option<&Expression> {
        self.tree_builder.peek()
    }

    pub fn pop(&mut self) -> Result<Expression, TranslationError> {
        self.tree_builder.pop()
    }

    pub fn constrain(
        &mut self,
        dependencies: IdentifierSet,
        expression: Expression,
    ) -> Result<(), TranslationError> {
        self.identifier_constraints.constrain(dependencies, expression)
    }

    pub fn constrain_identifier(
        &mut self,
        identifier: Identifier,
        expression: Expression,
    ) -> Result<(), TranslationError> {
        self.constrain(IdentifierSet::of(identifier), expression)
    }

    /// Record a constraint produced by a projection; merged into the
    /// result of [`consume_all`](Self::consume_all).
    pub fn add_projection_constraint(&mut self, constraint: Constraint) {
        self.projection_constraints.push(constraint);
    }

    pub fn consume(&mut self, identifier: &Identifier) -> Result<Constraint, TranslationError> {
        self.consume_set(&IdentifierSet::of(identifier.clone()))
    }

    pub fn consume_set(
        &mut self,
        identifiers: &IdentifierSet,
    ) -> Result<Constraint, TranslationError> {
        self.identifier_constraints.consume_set(identifiers)
    }

    pub fn consume_all(&mut self) -> Result<Constraint, TranslationError> {
        let mut constraint = self.identifier_constraints.consume_all()?;

        if self.projection_constraints.is_empty() {
            return Ok(constraint);
        }

        let mut expressions: Vec<Expression> = constraint.expression.take().into_iter().collect();

        for projection_constraint in self.projection_constraints.drain(..) {
            constraint
                .dependencies
                .merge(&projection_constraint.dependencies);

            if let Some(expression) = projection_constraint.expression {
                expressions.push(expression);
            }
        }

        constraint.expression = conjoin_expressions(expressions)?;
        Ok(constraint)
    }

    fn pop_expression_as_constraint(&mut self) -> Result<(), TranslationError> {
        let next = self.pop()?;
        let dependencies = extract_identifier_references(&next);

        // A bare property lookup used as a boolean leaf becomes a
        // boolean-typed predicate
        let next = if as_property_lookup(&next).is_some() {
            let lookup = into_property_lookup(next)?;
            rewrite_property_lookup(lookup, DataType::Boolean)
        } else {
            next
        };

        self.constrain(dependencies, next)
    }

    /// Drain whatever remains on the stack into the constraint tracker
    /// at the end of a clause.
    pub fn pop_remaining_expressions_as_constraints(&mut self) -> Result<(), TranslationError> {
        while !self.tree_builder.is_empty() {
            self.pop_expression_as_constraint()?;
        }

        Ok(())
    }

    /// Handle an `OR` popped at the outermost boolean scope: fuse the
    /// top two operands back into one expression, or constrain the
    /// operand directly when it is the last one standing.
    fn constrain_disjoint_operand_pair(&mut self) -> Result<(), TranslationError> {
        if self.tree_builder.is_empty() {
            return Err(TranslationError::EmptyExpressionStack);
        }

        let right_operand = self.tree_builder.pop()?;
        let right_dependencies = extract_identifier_references(&right_operand);

        if self.tree_builder.is_empty() {
            // Top of the disjunction chain
            return self.constrain(right_dependencies, right_operand);
        }

        let left_operand = self.tree_builder.pop()?;

        let or_expression = apply_binary_expression_type_hints(BinaryExpression {
            l_operand: left_operand,
            operator: Operator::Or,
            r_operand: right_operand,
        })?;

        // The disjunction may not be complete yet; put it back
        self.push(Expression::Binary(Box::new(or_expression)));
        Ok(())
    }

    /// Handle an `AND` popped at the outermost boolean scope: the
    /// completed right operand is peeled off as a constraint and no
    /// binary node is formed.
    fn constrain_conjoined_operand_pair(&mut self) -> Result<(), TranslationError> {
        if self.tree_builder.is_empty() {
            return Err(TranslationError::EmptyExpressionStack);
        }

        self.pop_expression_as_constraint()
    }

    pub fn pop_binary_expression(
        &mut self,
        operator: Operator,
    ) -> Result<BinaryExpression, TranslationError> {
        let r_operand = self.pop()?;
        let l_operand = self.pop()?;

        apply_binary_expression_type_hints(BinaryExpression {
            l_operand,
            operator,
            r_operand,
        })
    }

    pub fn pop_push_binary_expression(
        &mut self,
        scope: &Scope,
        operator: Operator,
    ) -> Result<(), TranslationError> {
        let mut expression = self.pop_binary_expression(operator)?;
        rewrite_identity_operands(scope, &mut expression)?;
        self.rewrite_binary_expression(expression)
    }

    pub fn push_parenthetical(&mut self) {
        self.push(Expression::Parenthetical(Box::new(Parenthetical::default())));
        self.parenthetical_depth += 1;
    }

    pub fn pop_parenthetical(&mut self) -> Result<Parenthetical, TranslationError> {
        self.parenthetical_depth -= 1;

        match self.tree_builder.pop()? {
            Expression::Parenthetical(parenthetical) => Ok(*parenthetical),
            _ => Err(TranslationError::UnexpectedExpression("parenthetical")),
        }
    }

    /// Track a boolean operator the walker is entering.
    pub fn push_operator(&mut self, operator: Operator) {
        match operator {
            Operator::And => self.conjunction_depth += 1,
            Operator::Or => self.disjunction_depth += 1,
            _ => {}
        }
    }

    /// Pop operands for an operator, first checking whether this
    /// operator is a candidate for constraint extraction.
    pub fn pop_push_operator(
        &mut self,
        scope: &Scope,
        operator: Operator,
    ) -> Result<(), TranslationError> {
        match operator {
            Operator::And => {
                self.conjunction_depth -= 1;

                if self.parenthetical_depth == 0 && self.disjunction_depth == 0 {
                    return self.constrain_conjoined_operand_pair();
                }
            }

            Operator::Or => {
                self.disjunction_depth -= 1;

                if self.parenthetical_depth == 0 && self.conjunction_depth == 0 {
                    return self.constrain_disjoint_operand_pair();
                }
            }

            _ => {}
        }

        self.pop_push_binary_expression(scope, operator)
    }

    /// Verify the depth counters returned to zero at the end of a
    /// clause.
    pub fn assert_balanced(&self) -> Result<(), TranslationError> {
        if self.parenthetical_depth != 0
            || self.conjunction_depth != 0
            || self.disjunction_depth != 0
        {
            return Err(TranslationError::UnbalancedClause {
                parenthetical: self.parenthetical_depth,
                conjunction: self.conjunction_depth,
                disjunction: self.disjunction_depth,
            });
        }

        Ok(())
    }

    fn rewrite_string_pattern(
        &mut self,
        expression: BinaryExpression,
        placement: WildcardPlacement,
    ) -> Result<(), TranslationError> {
        let BinaryExpression {
            l_operand,
            operator: _,
            r_operand,
        } = expression;

        // The left side must be a value: a property lookup, or any
        // non-binary expression
        if let Expression::Binary(left) = &l_operand {
            if !left.operator.is_property_lookup() {
                return Err(TranslationError::InvalidPatternLeftOperand {
                    found: left.operator,
                    operator: Operator::Like,
                });
            }
        }

        let r_operand = match r_operand {
            Expression::Literal(literal) => {
                if literal.cast_type != DataType::Text {
                    return Err(TranslationError::InvalidPatternOperand {
                        expected: DataType::Text,
                        found: literal.cast_type,
                        operator: Operator::Like,
                    });
                }

                let Value::Text(value) = literal.value else {
                    return Err(TranslationError::InvalidPatternOperand {
                        expected: DataType::Text,
                        found: literal.cast_type,
                        operator: Operator::Like,
                    });
                };

                // Bake the wildcards into the literal
                let pattern = match placement {
                    WildcardPlacement::Both => format!("%{}%", value),
                    WildcardPlacement::Trailing => format!("{}%", value),
                    WildcardPlacement::Leading => format!("%{}", value),
                };

                Expression::Literal(Literal::text(pattern))
            }

            Expression::Parenthetical(parenthetical) => {
                let casted = type_cast_expression(
                    Expression::Parenthetical(parenthetical),
                    DataType::Text,
                )?;

                wrap_with_wildcards(placement, casted)
            }

            Expression::Binary(mut binary) => {
                if binary.operator.is_property_lookup() {
                    binary.operator = Operator::JSONTextField;
                }

                let wrapped = Expression::Parenthetical(Box::new(Parenthetical {
                    expression: Some(Expression::Binary(binary)),
                }));

                Expression::type_cast(wrap_with_wildcards(placement, wrapped), DataType::Text)
            }

            other => wrap_with_wildcards(placement, other),
        };

        self.push(Expression::binary(l_operand, Operator::Like, r_operand));
        Ok(())
    }

    /// Route a freshly formed binary expression through the source
    /// dialect rewrite rules, then push the result.
    fn rewrite_binary_expression(
        &mut self,
        mut expression: BinaryExpression,
    ) -> Result<(), TranslationError> {
        match expression.operator {
            Operator::CypherAdd => {
                // The source `+` is ambiguous between addition and
                // concatenation until the operands are typed
                let left = infer_expression_type(&expression.l_operand)?;
                let right = infer_expression_type(&expression.r_operand)?;

                let concatenation = left.is_array_type()
                    || right.is_array_type()
                    || (left == DataType::Text && right == DataType::Text);

                expression.operator = if concatenation {
                    Operator::Concatenate
                } else {
                    Operator::Add
                };

                self.push(Expression::Binary(Box::new(expression)));
                Ok(())
            }

            Operator::CypherContains => {
                self.rewrite_string_pattern(expression, WildcardPlacement::Both)
            }

            Operator::CypherStartsWith => {
                self.rewrite_string_pattern(expression, WildcardPlacement::Trailing)
            }

            Operator::CypherEndsWith => {
                self.rewrite_string_pattern(expression, WildcardPlacement::Leading)
            }

            Operator::CypherRegexMatch => {
                expression.operator = Operator::RegexMatch;
                self.push(Expression::Binary(Box::new(expression)));
                Ok(())
            }

            Operator::Is | Operator::IsNot => {
                let BinaryExpression {
                    l_operand,
                    operator,
                    r_operand,
                } = expression;

                let null_check =
                    matches!(&r_operand, Expression::Literal(literal) if literal.is_null());

                match l_operand {
                    // A null check against a property is a key-absence
                    // check: missing properties are absent keys, not
                    // JSON nulls
                    Expression::Binary(lookup)
                        if null_check && lookup.operator.is_property_lookup() =>
                    {
                        let lookup = *lookup;
                        let exists = Expression::binary(
                            lookup.l_operand,
                            Operator::JSONBFieldExists,
                            lookup.r_operand,
                        );

                        if operator == Operator::Is {
                            self.push(Expression::unary(Operator::Not, exists));
                        } else {
                            self.push(exists);
                        }
                    }

                    l_operand => {
                        self.push(Expression::binary(l_operand, operator, r_operand));
                    }
                }

                Ok(())
            }

            Operator::In => {
                let BinaryExpression {
                    l_operand,
                    operator: _,
                    r_operand,
                } = expression;

                let (operator, r_operand) = match r_operand {
                    // `<value> IN <property>`: the list lives in the
                    // property bag as a JSON array
                    Expression::TypeCast(cast)
                        if as_property_lookup(&cast.expression).is_some() =>
                    {
                        let left_hint = infer_expression_type(&l_operand)?;
                        let left_array_hint = to_array(left_hint)?;

                        let mut lookup = into_property_lookup(cast.expression)?;
                        lookup.operator = Operator::JSONField;

                        let conversion = Expression::FunctionCall(FunctionCall::new(
                            functions::JSONB_TO_TEXT_ARRAY,
                            vec![Expression::Binary(Box::new(lookup))],
                            left_array_hint,
                        ));

                        (
                            Operator::Equals,
                            Expression::Any(Box::new(AnyExpression::hinted(conversion))),
                        )
                    }

                    r_operand if r_operand.type_hint().is_some() => {
                        let left_hint = infer_expression_type(&l_operand)?;

                        if left_hint.is_array_type() {
                            // array IN array is an overlap test
                            (Operator::PGArrayOverlap, r_operand)
                        } else {
                            let hint = r_operand.type_hint().unwrap_or(DataType::Unknown);
                            (Operator::Equals, Expression::any(r_operand, hint))
                        }
                    }

                    r_operand => {
                        let left_hint = infer_expression_type(&l_operand)?;
                        (Operator::Equals, Expression::any(r_operand, left_hint))
                    }
                };

                self.push(Expression::Binary(Box::new(BinaryExpression {
                    l_operand,
                    operator,
                    r_operand,
                })));
                Ok(())
            }

            _ => {
                self.push(Expression::Binary(Box::new(expression)));
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pgsql::columns;

    fn lookup(root: &str, field: &str) -> Expression {
        Expression::binary(
            Expression::CompoundIdentifier(CompoundIdentifier::column_ref(
                Identifier::from(root),
                columns::PROPERTIES,
            )),
            Operator::JSONTextField,
            Expression::Literal(Literal::text(field)),
        )
    }

    #[test]
    fn test_pop_on_empty_stack_fails() {
        let mut builder = ExpressionTreeBuilder::new();
        assert_eq!(builder.pop(), Err(TranslationError::EmptyExpressionStack));
    }

    #[test]
    fn test_pop_preserves_lifo_order() {
        let mut builder = ExpressionTreeBuilder::new();
        builder.push(Expression::Literal(Literal::int8(1)));
        builder.push(Expression::Literal(Literal::int8(2)));

        assert_eq!(builder.pop().unwrap().to_string(), "2");
        assert_eq!(builder.pop().unwrap().to_string(), "1");
        assert!(builder.is_empty());
    }

    #[test]
    fn test_fresh_property_lookup_becomes_text_field() {
        let formed = apply_binary_expression_type_hints(BinaryExpression {
            l_operand: Expression::CompoundIdentifier(CompoundIdentifier::column_ref(
                Identifier::from("n"),
                columns::PROPERTIES,
            )),
            operator: Operator::PropertyLookup,
            r_operand: Expression::Literal(Literal::text("name")),
        })
        .unwrap();

        assert_eq!(formed.operator, Operator::JSONTextField);
    }

    #[test]
    fn test_lookup_comparison_casts_by_peer_type() {
        let rewritten = apply_binary_expression_type_hints(BinaryExpression {
            l_operand: lookup("n", "age"),
            operator: Operator::GreaterThan,
            r_operand: Expression::Literal(Literal::int8(30)),
        })
        .unwrap();

        assert_eq!(
            Expression::Binary(Box::new(rewritten)).to_string(),
            "(n.properties ->> 'age')::int8 > 30"
        );
    }

    #[test]
    fn test_lookup_comparison_against_text_stays_uncast() {
        let rewritten = apply_binary_expression_type_hints(BinaryExpression {
            l_operand: lookup("n", "name"),
            operator: Operator::Equals,
            r_operand: Expression::Literal(Literal::text("alice")),
        })
        .unwrap();

        assert_eq!(
            Expression::Binary(Box::new(rewritten)).to_string(),
            "(n.properties ->> 'name') = 'alice'"
        );
    }

    #[test]
    fn test_double_lookup_comparison_uses_json_fields() {
        let rewritten = apply_binary_expression_type_hints(BinaryExpression {
            l_operand: lookup("n", "a"),
            operator: Operator::Equals,
            r_operand: lookup("m", "b"),
        })
        .unwrap();

        assert_eq!(
            Expression::Binary(Box::new(rewritten)).to_string(),
            "(n.properties -> 'a') = (m.properties -> 'b')"
        );
    }

    #[test]
    fn test_rewrite_property_lookup_to_array_type() {
        let lookup_expression = lookup("n", "tags");
        let lookup_binary = into_property_lookup(lookup_expression).unwrap();
        let rewritten = rewrite_property_lookup(lookup_binary, DataType::TextArray);

        assert_eq!(
            rewritten.to_string(),
            "jsonb_to_text_array((n.properties -> 'tags'))::text[]"
        );
    }

    #[test]
    fn test_unary_operand_lookup_forced_boolean() {
        let mut builder = ExpressionTreeBuilder::new();
        builder.push(Expression::unary(Operator::Not, lookup("n", "enabled")));

        let popped = builder.pop().unwrap();
        assert_eq!(popped.to_string(), "NOT (n.properties ->> 'enabled')::bool");
    }

    #[test]
    fn test_infer_well_known_columns() {
        let id = Expression::CompoundIdentifier(CompoundIdentifier::column_ref(
            Identifier::from("n"),
            columns::ID,
        ));
        assert_eq!(infer_expression_type(&id), Ok(DataType::Int8));

        let kind_ids = Expression::CompoundIdentifier(CompoundIdentifier::column_ref(
            Identifier::from("n"),
            columns::KIND_IDS,
        ));
        assert_eq!(infer_expression_type(&kind_ids), Ok(DataType::Int2Array));

        let other = Expression::CompoundIdentifier(CompoundIdentifier::column_ref(
            Identifier::from("n"),
            "anything",
        ));
        assert_eq!(infer_expression_type(&other), Ok(DataType::Unknown));
    }

    #[test]
    fn test_infer_rejects_long_compound_identifiers() {
        let compound = Expression::CompoundIdentifier(CompoundIdentifier(vec![
            Identifier::from("a"),
            Identifier::from("b"),
            Identifier::from("c"),
        ]));

        assert_eq!(
            infer_expression_type(&compound),
            Err(TranslationError::InvalidCompoundIdentifierArity(3))
        );
    }

    #[test]
    fn test_infer_comparator_binary_is_boolean() {
        let comparison = BinaryExpression {
            l_operand: Expression::Literal(Literal::int8(1)),
            operator: Operator::NotEquals,
            r_operand: Expression::Literal(Literal::int8(2)),
        };

        assert_eq!(
            infer_expression_type(&Expression::Binary(Box::new(comparison))),
            Ok(DataType::Boolean)
        );
    }

    #[test]
    fn test_infer_incompatible_known_types_fails() {
        let addition = BinaryExpression {
            l_operand: Expression::Literal(Literal::boolean(true)),
            operator: Operator::Add,
            r_operand: Expression::Literal(Literal::int8(2)),
        };

        assert!(matches!(
            infer_expression_type(&Expression::Binary(Box::new(addition))),
            Err(TranslationError::IncompatibleOperands { .. })
        ));
    }

    #[test]
    fn test_function_like_hinting_fills_unknown_call_type() {
        let call = Expression::FunctionCall(FunctionCall::new(
            functions::COALESCE,
            vec![lookup("n", "name")],
            DataType::Unknown,
        ));

        let hinted = apply_binary_expression_type_hints(BinaryExpression {
            l_operand: call,
            operator: Operator::Equals,
            r_operand: Expression::Literal(Literal::text("alice")),
        })
        .unwrap();

        assert_eq!(hinted.l_operand.type_hint(), Some(DataType::Text));
    }

    #[test]
    fn test_coalesce_mismatch_has_targeted_error() {
        let call = Expression::FunctionCall(FunctionCall::new(
            functions::COALESCE,
            vec![lookup("n", "age")],
            DataType::Int8,
        ));

        let result = apply_binary_expression_type_hints(BinaryExpression {
            l_operand: call,
            operator: Operator::Equals,
            r_operand: Expression::Literal(Literal::text("alice")),
        });

        assert_eq!(
            result,
            Err(TranslationError::CoalesceComparison {
                signature: DataType::Int8,
                other: DataType::Text,
            })
        );
    }

    #[test]
    fn test_extract_references_skips_reserved_identifiers() {
        let extract = Expression::FunctionCall(FunctionCall::new(
            functions::EXTRACT,
            vec![Expression::ProjectionFrom(Box::new(
                crate::pgsql::ProjectionFrom {
                    projection: vec![Expression::Identifier(Identifier::from(crate::pgsql::EPOCH))],
                    from: vec![Expression::FunctionCall(FunctionCall::new(
                        functions::NOW,
                        Vec::new(),
                        DataType::TimestampWithTimeZone,
                    ))],
                },
            ))],
            DataType::Numeric,
        ));

        let comparison = Expression::binary(
            lookup("n", "when"),
            Operator::GreaterThan,
            extract,
        );

        let references = extract_identifier_references(&comparison);
        assert_eq!(references, IdentifierSet::of(Identifier::from("n")));
    }

    #[test]
    fn test_conjoin_preserves_order() {
        let conjoined = conjoin_expressions(vec![
            Expression::Literal(Literal::boolean(true)),
            Expression::Literal(Literal::boolean(false)),
        ])
        .unwrap()
        .unwrap();

        assert_eq!(conjoined.to_string(), "true AND false");
        assert!(conjoin_expressions(Vec::new()).unwrap().is_none());
    }

    #[test]
    fn test_decompose_property_lookup() {
        let decomposed = decompose_property_lookup(&lookup("n", "name")).unwrap();
        assert_eq!(decomposed.field, "name");
        assert_eq!(decomposed.reference.to_string(), "n.properties");

        let not_text = Expression::binary(
            Expression::CompoundIdentifier(CompoundIdentifier::column_ref(
                Identifier::from("n"),
                columns::PROPERTIES,
            )),
            Operator::JSONTextField,
            Expression::Literal(Literal::int8(1)),
        );
        assert_eq!(
            decompose_property_lookup(&not_text),
            Err(TranslationError::InvalidPropertyLookupField)
        );
    }

    #[test]
    fn test_parenthetical_placeholder_round_trip() {
        let mut translator = ExpressionTreeTranslator::new();

        translator.push_parenthetical();
        translator.push(Expression::Literal(Literal::int8(1)));

        let inner = translator.pop().unwrap();
        let mut parenthetical = translator.pop_parenthetical().unwrap();
        parenthetical.expression = Some(inner);
        translator.push(Expression::Parenthetical(Box::new(parenthetical)));

        assert_eq!(translator.pop().unwrap().to_string(), "(1)");
        assert!(translator.assert_balanced().is_ok());
    }

    #[test]
    fn test_consume_all_merges_projection_constraints() {
        let mut translator = ExpressionTreeTranslator::new();

        let filter = apply_binary_expression_type_hints(BinaryExpression {
            l_operand: lookup("n", "a"),
            operator: Operator::Equals,
            r_operand: Expression::Literal(Literal::int8(1)),
        })
        .unwrap();
        translator
            .constrain_identifier(Identifier::from("n"), Expression::Binary(Box::new(filter)))
            .unwrap();

        let projected = apply_binary_expression_type_hints(BinaryExpression {
            l_operand: lookup("p", "b"),
            operator: Operator::Equals,
            r_operand: Expression::Literal(Literal::int8(2)),
        })
        .unwrap();
        translator.add_projection_constraint(Constraint {
            dependencies: IdentifierSet::of(Identifier::from("p")),
            expression: Some(Expression::Binary(Box::new(projected))),
        });

        let constraint = translator.consume_all().unwrap();

        let expected: IdentifierSet = [Identifier::from("n"), Identifier::from("p")]
            .into_iter()
            .collect();
        assert_eq!(constraint.dependencies, expected);
        assert_eq!(
            constraint.expression.unwrap().to_string(),
            "(n.properties ->> 'a')::int8 = 1 AND (p.properties ->> 'b')::int8 = 2"
        );
    }

    #[test]
    fn test_identity_rewrite_for_node_bindings() {
        let mut scope = Scope::new();
        scope.bind("n", DataType::NodeComposite);
        scope.bind("m", DataType::NodeComposite);

        let mut expression = BinaryExpression {
            l_operand: Expression::Identifier(Identifier::from("n")),
            operator: Operator::NotEquals,
            r_operand: Expression::Identifier(Identifier::from("m")),
        };

        rewrite_identity_operands(&scope, &mut expression).unwrap();
        assert_eq!(
            Expression::Binary(Box::new(expression)).to_string(),
            "n.id <> m.id"
        );
    }

    #[test]
    fn test_identity_rewrite_rejects_cross_family_comparison() {
        let mut scope = Scope::new();
        scope.bind("n", DataType::NodeComposite);
        scope.bind("e", DataType::EdgeComposite);

        let mut expression = BinaryExpression {
            l_operand: Expression::Identifier(Identifier::from("n")),
            operator: Operator::Equals,
            r_operand: Expression::Identifier(Identifier::from("e")),
        };

        assert_eq!(
            rewrite_identity_operands(&scope, &mut expression),
            Err(TranslationError::InvalidEntityComparison(
                DataType::NodeComposite,
                DataType::EdgeComposite
            ))
        );
    }

    #[test]
    fn test_identity_rewrite_rejects_paths_and_composite_arrays() {
        let mut scope = Scope::new();
        scope.bind("p", DataType::PathComposite);
        scope.bind("n", DataType::NodeComposite);
        scope.bind("ns", DataType::NodeCompositeArray);

        let mut path_comparison = BinaryExpression {
            l_operand: Expression::Identifier(Identifier::from("p")),
            operator: Operator::Equals,
            r_operand: Expression::Identifier(Identifier::from("n")),
        };
        assert_eq!(
            rewrite_identity_operands(&scope, &mut path_comparison),
            Err(TranslationError::UnsupportedPathComparison)
        );

        let mut array_comparison = BinaryExpression {
            l_operand: Expression::Identifier(Identifier::from("ns")),
            operator: Operator::Equals,
            r_operand: Expression::Identifier(Identifier::from("n")),
        };
        assert_eq!(
            rewrite_identity_operands(&scope, &mut array_comparison),
            Err(TranslationError::UnsupportedCompositeArray(
                DataType::NodeCompositeArray
            ))
        );
    }

    #[test]
    fn test_scalar_identifier_comparison_is_untouched() {
        let mut scope = Scope::new();
        scope.bind("a", DataType::Int8);
        scope.bind("b", DataType::Int8);

        let mut expression = BinaryExpression {
            l_operand: Expression::Identifier(Identifier::from("a")),
            operator: Operator::Equals,
            r_operand: Expression::Identifier(Identifier::from("b")),
        };

        rewrite_identity_operands(&scope, &mut expression).unwrap();
        assert_eq!(
            Expression::Binary(Box::new(expression)).to_string(),
            "a = b"
        );
    }
}
