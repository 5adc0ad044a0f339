//! Identifier-scoped constraint tracking.
//!
//! Boolean leaves peeled off a WHERE clause are stored here keyed by
//! the set of identifiers they reference. Later join planning consumes
//! them: per-identifier filters push down onto single tables while
//! multi-identifier constraints become join criteria.

use crate::pgsql::{Expression, IdentifierSet};

use super::errors::TranslationError;
use super::expression::conjoin_expressions;

/// A boolean predicate scoped to the identifiers it references. The
/// expression's free identifiers always equal `dependencies`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub dependencies: IdentifierSet,
    pub expression: Option<Expression>,
}

impl Constraint {
    fn empty() -> Self {
        Constraint {
            dependencies: IdentifierSet::new(),
            expression: None,
        }
    }
}

/// Stores one conjoined expression per distinct dependency set, in
/// first-seen order.
#[derive(Debug, Default)]
pub struct ConstraintTracker {
    constraints: Vec<Constraint>,
}

impl ConstraintTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Record `expression` as a constraint over `dependencies`. A
    /// constraint already tracked for the same dependency set is
    /// extended with a conjunction, re-running type-hint application on
    /// the joined expression.
    pub fn constrain(
        &mut self,
        dependencies: IdentifierSet,
        expression: Expression,
    ) -> Result<(), TranslationError> {
        log::debug!(
            "constraining expression to {} identifier(s)",
            dependencies.len()
        );

        if let Some(existing) = self
            .constraints
            .iter_mut()
            .find(|constraint| constraint.dependencies == dependencies)
        {
            let parts: Vec<Expression> = existing
                .expression
                .take()
                .into_iter()
                .chain(std::iter::once(expression))
                .collect();

            existing.expression = conjoin_expressions(parts)?;
            return Ok(());
        }

        self.constraints.push(Constraint {
            dependencies,
            expression: Some(expression),
        });

        Ok(())
    }

    /// Remove and conjoin every constraint whose dependencies are a
    /// subset of `identifiers`. Returns an empty constraint when
    /// nothing matches.
    pub fn consume_set(
        &mut self,
        identifiers: &IdentifierSet,
    ) -> Result<Constraint, TranslationError> {
        let (matched, kept): (Vec<Constraint>, Vec<Constraint>) = self
            .constraints
            .drain(..)
            .partition(|constraint| constraint.dependencies.is_subset_of(identifiers));

        self.constraints = kept;
        Self::conjoin_constraints(matched)
    }

    /// Remove and conjoin every tracked constraint.
    pub fn consume_all(&mut self) -> Result<Constraint, TranslationError> {
        let matched: Vec<Constraint> = self.constraints.drain(..).collect();
        Self::conjoin_constraints(matched)
    }

    fn conjoin_constraints(matched: Vec<Constraint>) -> Result<Constraint, TranslationError> {
        if matched.is_empty() {
            return Ok(Constraint::empty());
        }

        let mut dependencies = IdentifierSet::new();
        let mut expressions = Vec::with_capacity(matched.len());

        for constraint in matched {
            dependencies.merge(&constraint.dependencies);
            if let Some(expression) = constraint.expression {
                expressions.push(expression);
            }
        }

        Ok(Constraint {
            dependencies,
            expression: conjoin_expressions(expressions)?,
        })
    }
}
