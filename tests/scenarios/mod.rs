//! End-to-end translation scenarios: WHERE clauses in, identifier
//! scoped constraints out.

use std::collections::HashMap;

use anyhow::Result;

use pgcypher::cypher::{self, Expression as Cypher};
use pgcypher::pgsql::{DataType, Expression, Identifier, IdentifierSet};
use pgcypher::translate::{
    extract_identifier_references, ExpressionTreeTranslator, KindMapper, KindMapperError, Scope,
    Translator,
};

/// Kind mapper over a fixed name table.
struct MapKindMapper(HashMap<String, i16>);

impl MapKindMapper {
    fn with(pairs: &[(&str, i16)]) -> Self {
        MapKindMapper(
            pairs
                .iter()
                .map(|(kind, id)| (kind.to_string(), *id))
                .collect(),
        )
    }

    fn empty() -> Self {
        MapKindMapper(HashMap::new())
    }
}

impl KindMapper for MapKindMapper {
    fn map_kinds(&self, kinds: &[String]) -> Result<Vec<i16>, KindMapperError> {
        kinds
            .iter()
            .map(|kind| {
                self.0
                    .get(kind)
                    .copied()
                    .ok_or_else(|| KindMapperError::UnknownKinds(vec![kind.clone()]))
            })
            .collect()
    }
}

fn graph_scope() -> Scope {
    let mut scope = Scope::new();
    scope.bind("n", DataType::NodeComposite);
    scope.bind("m", DataType::NodeComposite);
    scope.bind("e", DataType::EdgeComposite);
    scope
}

fn translate_where(
    scope: &Scope,
    mapper: &dyn KindMapper,
    clause: Cypher,
) -> Result<ExpressionTreeTranslator> {
    let mut translator = Translator::new(scope, mapper);
    translator.translate_where_clause(&clause);

    let tree = translator.finish()?;
    tree.assert_balanced()?;
    Ok(tree)
}

fn int(value: i64) -> Cypher {
    Cypher::Literal(cypher::Literal::Integer(value))
}

fn text(value: &str) -> Cypher {
    Cypher::Literal(cypher::Literal::String(value.to_string()))
}

fn ids(names: &[&str]) -> IdentifierSet {
    names.iter().map(|name| Identifier::from(*name)).collect()
}

/// No source-dialect operator may survive translation.
fn assert_no_cypher_operators(expression: &Expression) {
    match expression {
        Expression::Literal(_)
        | Expression::Identifier(_)
        | Expression::CompoundIdentifier(_)
        | Expression::RowColumnReference(_) => {}

        Expression::Unary(unary) => {
            assert!(!unary.operator.is_cypher_originated());
            assert_no_cypher_operators(&unary.operand);
        }

        Expression::Binary(binary) => {
            assert!(
                !binary.operator.is_cypher_originated(),
                "operator {} leaked into the output tree",
                binary.operator
            );
            assert_no_cypher_operators(&binary.l_operand);
            assert_no_cypher_operators(&binary.r_operand);
        }

        Expression::Parenthetical(parenthetical) => {
            if let Some(inner) = &parenthetical.expression {
                assert_no_cypher_operators(inner);
            }
        }

        Expression::TypeCast(cast) => assert_no_cypher_operators(&cast.expression),

        Expression::FunctionCall(call) => {
            for parameter in &call.parameters {
                assert_no_cypher_operators(parameter);
            }
        }

        Expression::Any(any) => assert_no_cypher_operators(&any.expression),

        Expression::ProjectionFrom(projection) => {
            for item in &projection.projection {
                assert_no_cypher_operators(item);
            }
            for source in &projection.from {
                assert_no_cypher_operators(source);
            }
        }
    }
}

#[test]
fn test_property_equality_with_literal() -> Result<()> {
    // WHERE n.name = 'alice'
    let scope = graph_scope();
    let mut tree = translate_where(
        &scope,
        &MapKindMapper::empty(),
        Cypher::binary(
            Cypher::property("n", "name"),
            cypher::Operator::Equal,
            text("alice"),
        ),
    )?;

    let constraint = tree.consume(&Identifier::from("n"))?;
    assert_eq!(constraint.dependencies, ids(&["n"]));
    assert_eq!(
        constraint.expression.unwrap().to_string(),
        "(n.properties ->> 'name') = 'alice'"
    );
    Ok(())
}

#[test]
fn test_kind_matcher_over_node() -> Result<()> {
    // WHERE n:Admin with Admin mapped to kind id 42
    let scope = graph_scope();
    let mut tree = translate_where(
        &scope,
        &MapKindMapper::with(&[("Admin", 42)]),
        Cypher::kind_matcher("n", vec!["Admin"]),
    )?;

    let constraint = tree.consume(&Identifier::from("n"))?;
    assert_eq!(
        constraint.expression.unwrap().to_string(),
        "n.kind_ids && ARRAY[42]::int2[]"
    );
    Ok(())
}

#[test]
fn test_in_with_literal_list() -> Result<()> {
    // WHERE n.id IN [1, 2, 3]
    let scope = graph_scope();
    let mut tree = translate_where(
        &scope,
        &MapKindMapper::empty(),
        Cypher::binary(
            Cypher::property("n", "id"),
            cypher::Operator::In,
            Cypher::List(vec![int(1), int(2), int(3)]),
        ),
    )?;

    let constraint = tree.consume(&Identifier::from("n"))?;
    assert_eq!(
        constraint.expression.unwrap().to_string(),
        "(n.properties ->> 'id')::int8 = ANY(ARRAY[1,2,3]::int8[])"
    );
    Ok(())
}

#[test]
fn test_starts_with_rewrite() -> Result<()> {
    // WHERE n.name STARTS WITH 'a'
    let scope = graph_scope();
    let mut tree = translate_where(
        &scope,
        &MapKindMapper::empty(),
        Cypher::binary(
            Cypher::property("n", "name"),
            cypher::Operator::StartsWith,
            text("a"),
        ),
    )?;

    let constraint = tree.consume(&Identifier::from("n"))?;
    assert_eq!(
        constraint.expression.unwrap().to_string(),
        "(n.properties ->> 'name') LIKE 'a%'"
    );
    Ok(())
}

#[test]
fn test_contains_and_ends_with_rewrites() -> Result<()> {
    let scope = graph_scope();

    let mut tree = translate_where(
        &scope,
        &MapKindMapper::empty(),
        Cypher::binary(
            Cypher::property("n", "name"),
            cypher::Operator::Contains,
            text("li"),
        ),
    )?;
    assert_eq!(
        tree.consume(&Identifier::from("n"))?
            .expression
            .unwrap()
            .to_string(),
        "(n.properties ->> 'name') LIKE '%li%'"
    );

    let mut tree = translate_where(
        &scope,
        &MapKindMapper::empty(),
        Cypher::binary(
            Cypher::property("n", "name"),
            cypher::Operator::EndsWith,
            text("ce"),
        ),
    )?;
    assert_eq!(
        tree.consume(&Identifier::from("n"))?
            .expression
            .unwrap()
            .to_string(),
        "(n.properties ->> 'name') LIKE '%ce'"
    );
    Ok(())
}

#[test]
fn test_null_check_on_property() -> Result<()> {
    // WHERE n.name IS NULL
    let scope = graph_scope();
    let mut tree = translate_where(
        &scope,
        &MapKindMapper::empty(),
        Cypher::binary(
            Cypher::property("n", "name"),
            cypher::Operator::Is,
            Cypher::Literal(cypher::Literal::Null),
        ),
    )?;

    let constraint = tree.consume(&Identifier::from("n"))?;
    assert_eq!(
        constraint.expression.unwrap().to_string(),
        "NOT (n.properties ? 'name')"
    );
    Ok(())
}

#[test]
fn test_not_null_check_on_property() -> Result<()> {
    // WHERE n.name IS NOT NULL
    let scope = graph_scope();
    let mut tree = translate_where(
        &scope,
        &MapKindMapper::empty(),
        Cypher::binary(
            Cypher::property("n", "name"),
            cypher::Operator::IsNot,
            Cypher::Literal(cypher::Literal::Null),
        ),
    )?;

    let constraint = tree.consume(&Identifier::from("n"))?;
    assert_eq!(
        constraint.expression.unwrap().to_string(),
        "(n.properties ? 'name')"
    );
    Ok(())
}

#[test]
fn test_entity_identity_comparison() -> Result<()> {
    // WHERE n <> m over two node bindings
    let scope = graph_scope();
    let mut tree = translate_where(
        &scope,
        &MapKindMapper::empty(),
        Cypher::binary(
            Cypher::variable("n"),
            cypher::Operator::NotEqual,
            Cypher::variable("m"),
        ),
    )?;

    let constraint = tree.consume_set(&ids(&["n", "m"]))?;
    assert_eq!(constraint.dependencies, ids(&["n", "m"]));
    assert_eq!(constraint.expression.unwrap().to_string(), "n.id <> m.id");
    Ok(())
}

#[test]
fn test_disjunction_across_identifiers_stays_whole() -> Result<()> {
    // WHERE n.a = 1 OR m.b = 2
    let scope = graph_scope();
    let mut tree = translate_where(
        &scope,
        &MapKindMapper::empty(),
        Cypher::binary(
            Cypher::binary(Cypher::property("n", "a"), cypher::Operator::Equal, int(1)),
            cypher::Operator::Or,
            Cypher::binary(Cypher::property("m", "b"), cypher::Operator::Equal, int(2)),
        ),
    )?;

    let constraint = tree.consume_set(&ids(&["n", "m"]))?;
    assert_eq!(constraint.dependencies, ids(&["n", "m"]));
    assert_eq!(
        constraint.expression.unwrap().to_string(),
        "(n.properties ->> 'a')::int8 = 1 OR (m.properties ->> 'b')::int8 = 2"
    );
    Ok(())
}

#[test]
fn test_conjunction_splits_into_one_constraint_per_identifier_set() -> Result<()> {
    // WHERE n.a = 1 AND n.b = 2 AND m.c = 3
    let scope = graph_scope();
    let mut tree = translate_where(
        &scope,
        &MapKindMapper::empty(),
        Cypher::binary(
            Cypher::binary(
                Cypher::binary(Cypher::property("n", "a"), cypher::Operator::Equal, int(1)),
                cypher::Operator::And,
                Cypher::binary(Cypher::property("n", "b"), cypher::Operator::Equal, int(2)),
            ),
            cypher::Operator::And,
            Cypher::binary(Cypher::property("m", "c"), cypher::Operator::Equal, int(3)),
        ),
    )?;

    // One constraint per distinct identifier set, conjoined in a
    // stable order
    let n_constraint = tree.consume(&Identifier::from("n"))?;
    assert_eq!(
        n_constraint.expression.unwrap().to_string(),
        "(n.properties ->> 'b')::int8 = 2 AND (n.properties ->> 'a')::int8 = 1"
    );

    let m_constraint = tree.consume(&Identifier::from("m"))?;
    assert_eq!(
        m_constraint.expression.unwrap().to_string(),
        "(m.properties ->> 'c')::int8 = 3"
    );

    // Nothing left behind
    let rest = tree.consume_all()?;
    assert!(rest.dependencies.is_empty());
    assert!(rest.expression.is_none());
    Ok(())
}

#[test]
fn test_parenthesized_disjunction_under_conjunction() -> Result<()> {
    // WHERE n.a = 1 AND (n.b = 2 OR m.c = 3)
    let scope = graph_scope();
    let mut tree = translate_where(
        &scope,
        &MapKindMapper::empty(),
        Cypher::binary(
            Cypher::binary(Cypher::property("n", "a"), cypher::Operator::Equal, int(1)),
            cypher::Operator::And,
            Cypher::Parenthetical(Box::new(Cypher::binary(
                Cypher::binary(Cypher::property("n", "b"), cypher::Operator::Equal, int(2)),
                cypher::Operator::Or,
                Cypher::binary(Cypher::property("m", "c"), cypher::Operator::Equal, int(3)),
            ))),
        ),
    )?;

    let joint = tree.consume_set(&ids(&["n", "m"]))?;
    assert_eq!(joint.dependencies, ids(&["n", "m"]));
    assert_eq!(
        joint.expression.unwrap().to_string(),
        "((n.properties ->> 'b')::int8 = 2 OR (m.properties ->> 'c')::int8 = 3) AND (n.properties ->> 'a')::int8 = 1"
    );
    Ok(())
}

#[test]
fn test_bare_property_predicate_becomes_boolean() -> Result<()> {
    // WHERE n.enabled
    let scope = graph_scope();
    let mut tree = translate_where(
        &scope,
        &MapKindMapper::empty(),
        Cypher::property("n", "enabled"),
    )?;

    let constraint = tree.consume(&Identifier::from("n"))?;
    assert_eq!(
        constraint.expression.unwrap().to_string(),
        "(n.properties ->> 'enabled')::bool"
    );
    Ok(())
}

#[test]
fn test_negated_property_predicate() -> Result<()> {
    // WHERE NOT n.deleted
    let scope = graph_scope();
    let mut tree = translate_where(
        &scope,
        &MapKindMapper::empty(),
        Cypher::unary(cypher::Operator::Not, Cypher::property("n", "deleted")),
    )?;

    let constraint = tree.consume(&Identifier::from("n"))?;
    assert_eq!(
        constraint.expression.unwrap().to_string(),
        "NOT (n.properties ->> 'deleted')::bool"
    );
    Ok(())
}

#[test]
fn test_no_cypher_operators_survive_translation() -> Result<()> {
    // Run the operators that exist only in the source dialect through
    // a single clause and inspect the finished tree
    let scope = graph_scope();
    let mut tree = translate_where(
        &scope,
        &MapKindMapper::empty(),
        Cypher::binary(
            Cypher::binary(
                Cypher::property("n", "name"),
                cypher::Operator::Contains,
                text("ali"),
            ),
            cypher::Operator::Or,
            Cypher::binary(
                Cypher::binary(
                    Cypher::property("n", "age"),
                    cypher::Operator::Addition,
                    int(1),
                ),
                cypher::Operator::GreaterThan,
                int(21),
            ),
        ),
    )?;

    let constraint = tree.consume_all()?;
    let expression = constraint.expression.expect("one constraint produced");
    assert_no_cypher_operators(&expression);
    Ok(())
}

#[test]
fn test_regex_match_rewrite() -> Result<()> {
    // WHERE n.name =~ 'a.*'
    let scope = graph_scope();
    let mut tree = translate_where(
        &scope,
        &MapKindMapper::empty(),
        Cypher::binary(
            Cypher::property("n", "name"),
            cypher::Operator::RegexMatch,
            text("a.*"),
        ),
    )?;

    let constraint = tree.consume(&Identifier::from("n"))?;
    assert_eq!(
        constraint.expression.unwrap().to_string(),
        "(n.properties ->> 'name') ~ 'a.*'"
    );
    Ok(())
}

#[test]
fn test_constraint_dependencies_equal_free_identifiers() -> Result<()> {
    let scope = graph_scope();
    let mut tree = translate_where(
        &scope,
        &MapKindMapper::empty(),
        Cypher::binary(
            Cypher::binary(Cypher::property("n", "a"), cypher::Operator::Equal, int(1)),
            cypher::Operator::Or,
            Cypher::binary(Cypher::property("m", "b"), cypher::Operator::Equal, int(2)),
        ),
    )?;

    let constraint = tree.consume_all()?;
    let expression = constraint.expression.expect("one constraint produced");
    assert_eq!(
        extract_identifier_references(&expression),
        constraint.dependencies
    );
    Ok(())
}

#[test]
fn test_unknown_kind_fails_translation() {
    let scope = graph_scope();
    let result = translate_where(
        &scope,
        &MapKindMapper::empty(),
        Cypher::kind_matcher("n", vec!["Missing"]),
    );

    assert!(result.is_err());
}

#[test]
fn test_cross_family_entity_comparison_fails() {
    // WHERE n = e mixes node and edge bindings
    let scope = graph_scope();
    let result = translate_where(
        &scope,
        &MapKindMapper::empty(),
        Cypher::binary(
            Cypher::variable("n"),
            cypher::Operator::Equal,
            Cypher::variable("e"),
        ),
    );

    assert!(result.is_err());
}
