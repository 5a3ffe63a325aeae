//! Boolean conditions attached to fields, fragments and model properties.
//!
//! A condition is a [`BooleanExpression`] over one of two kinds of atomic terms:
//! - [`BVariable`]: the value of a `Boolean` variable, decided at runtime by the caller;
//! - [`BPossibleTypes`]: whether the runtime `__typename` is one of a set of object types.
//!
//! Expressions are kept simplified after every combination so that two logically equivalent
//! documents produce identical conditions.
use std::fmt;

use apollo_compiler::Name;
use apollo_compiler::ast;
use serde::Serialize;

use crate::bail;
use crate::error::IrError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum BooleanExpression<T> {
    True,
    False,
    Not(Box<BooleanExpression<T>>),
    Or(Vec<BooleanExpression<T>>),
    And(Vec<BooleanExpression<T>>),
    Element(T),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BVariable {
    pub name: Name,
}

/// Object types, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BPossibleTypes(pub Vec<Name>);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum BTerm {
    Variable(BVariable),
    PossibleTypes(BPossibleTypes),
}

impl<T> Default for BooleanExpression<T> {
    fn default() -> Self {
        Self::True
    }
}

impl<T: Clone + PartialEq> BooleanExpression<T> {
    pub fn element(term: T) -> Self {
        Self::Element(term)
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Self::False)
    }

    pub fn and(self, other: Self) -> Self {
        Self::And(vec![self, other]).simplify()
    }

    pub fn or(self, other: Self) -> Self {
        Self::Or(vec![self, other]).simplify()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self)).simplify()
    }

    /// Conjunction of all `operands`, `true` if there are none.
    pub fn all(operands: impl IntoIterator<Item = Self>) -> Self {
        Self::And(operands.into_iter().collect()).simplify()
    }

    /// Disjunction of all `operands`, `false` if there are none.
    pub fn any(operands: impl IntoIterator<Item = Self>) -> Self {
        Self::Or(operands.into_iter().collect()).simplify()
    }

    /// Evaluates the expression given the truth value of every term.
    pub fn evaluate(&self, term_value: &impl Fn(&T) -> bool) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::Not(inner) => !inner.evaluate(term_value),
            Self::Or(operands) => operands.iter().any(|op| op.evaluate(term_value)),
            Self::And(operands) => operands.iter().all(|op| op.evaluate(term_value)),
            Self::Element(term) => term_value(term),
        }
    }

    /// Returns whether any term satisfies `predicate`.
    pub fn contains(&self, predicate: &impl Fn(&T) -> bool) -> bool {
        match self {
            Self::True | Self::False => false,
            Self::Not(inner) => inner.contains(predicate),
            Self::Or(operands) | Self::And(operands) => {
                operands.iter().any(|op| op.contains(predicate))
            }
            Self::Element(term) => predicate(term),
        }
    }

    /// The terms of the expression, in order of first appearance.
    pub fn terms(&self) -> Vec<&T> {
        fn collect<'a, T: PartialEq>(expr: &'a BooleanExpression<T>, out: &mut Vec<&'a T>) {
            match expr {
                BooleanExpression::True | BooleanExpression::False => {}
                BooleanExpression::Not(inner) => collect(inner, out),
                BooleanExpression::Or(operands) | BooleanExpression::And(operands) => {
                    operands.iter().for_each(|op| collect(op, out))
                }
                BooleanExpression::Element(term) => {
                    if !out.contains(&term) {
                        out.push(term)
                    }
                }
            }
        }
        let mut out = vec![];
        collect(self, &mut out);
        out
    }

    pub fn map<U: Clone + PartialEq>(self, f: &impl Fn(T) -> U) -> BooleanExpression<U> {
        match self {
            Self::True => BooleanExpression::True,
            Self::False => BooleanExpression::False,
            Self::Not(inner) => BooleanExpression::Not(Box::new(inner.map(f))),
            Self::Or(operands) => {
                BooleanExpression::Or(operands.into_iter().map(|op| op.map(f)).collect())
            }
            Self::And(operands) => {
                BooleanExpression::And(operands.into_iter().map(|op| op.map(f)).collect())
            }
            Self::Element(term) => BooleanExpression::Element(f(term)),
        }
    }

    /// Rewrites the expression into its canonical simplified form:
    /// - constants are folded (`x ∧ true = x`, `x ∧ false = false`, ...),
    /// - double negations are removed,
    /// - nested conjunctions (resp. disjunctions) are flattened and their operands de-duplicated,
    /// - `x ∧ ¬x` is `false` and `x ∨ ¬x` is `true`,
    /// - absorbed operands are dropped (`x ∨ (x ∧ y) = x`, `x ∧ (x ∨ y) = x`).
    ///
    /// Operand order is the order of first appearance.
    pub fn simplify(self) -> Self {
        match self {
            Self::True | Self::False | Self::Element(_) => self,
            Self::Not(inner) => match inner.simplify() {
                Self::True => Self::False,
                Self::False => Self::True,
                Self::Not(inner) => *inner,
                other => Self::Not(Box::new(other)),
            },
            Self::And(operands) => Self::simplify_junction(operands, true),
            Self::Or(operands) => Self::simplify_junction(operands, false),
        }
    }

    /// Shared simplification of `And` (`conjunction = true`) and `Or`.
    fn simplify_junction(operands: Vec<Self>, conjunction: bool) -> Self {
        // The neutral element is skipped, the absorbing element short-circuits.
        let (neutral, absorbing) = if conjunction {
            (Self::True, Self::False)
        } else {
            (Self::False, Self::True)
        };
        let mut flattened: Vec<Self> = Vec::with_capacity(operands.len());
        for operand in operands {
            let operand = operand.simplify();
            if operand == neutral {
                continue;
            }
            if operand == absorbing {
                return absorbing;
            }
            let nested = match operand {
                Self::And(nested) if conjunction => nested,
                Self::Or(nested) if !conjunction => nested,
                other => vec![other],
            };
            for operand in nested {
                if !flattened.contains(&operand) {
                    flattened.push(operand);
                }
            }
        }

        // x ∧ ¬x, x ∨ ¬x
        let complementary = flattened.iter().any(|operand| match operand {
            Self::Not(inner) => flattened.contains(inner.as_ref()),
            _ => false,
        });
        if complementary {
            return absorbing;
        }

        // Absorption: in a conjunction, a disjunction containing another operand is implied by
        // that operand (and dually for disjunctions).
        let absorbed: Vec<bool> = flattened
            .iter()
            .map(|operand| {
                let inner = match operand {
                    Self::Or(inner) if conjunction => inner,
                    Self::And(inner) if !conjunction => inner,
                    _ => return false,
                };
                flattened
                    .iter()
                    .any(|other| other != operand && inner.contains(other))
            })
            .collect();
        let mut operands: Vec<Self> = flattened
            .into_iter()
            .zip(absorbed)
            .filter_map(|(operand, absorbed)| (!absorbed).then_some(operand))
            .collect();

        match operands.len() {
            0 => neutral,
            1 => operands.pop().unwrap_or(neutral),
            _ if conjunction => Self::And(operands),
            _ => Self::Or(operands),
        }
    }
}

impl BooleanExpression<BVariable> {
    pub fn variable(name: Name) -> Self {
        Self::Element(BVariable { name })
    }

    /// Builds the inclusion condition of a selection from its `@include(if:)` and `@skip(if:)`
    /// directives. Directives are combined by conjunction in the order they are written and
    /// `@skip` is negated.
    pub fn from_directives(directives: &ast::DirectiveList) -> Result<Self, IrError> {
        let mut condition = Self::True;
        for directive in directives.iter() {
            let negated = match directive.name.as_str() {
                "include" => false,
                "skip" => true,
                _ => continue,
            };
            let Some(value) = directive.specified_argument_by_name("if") else {
                bail!("missing @{}(if:) argument", directive.name);
            };
            let term = match value.as_ref() {
                ast::Value::Boolean(true) => Self::True,
                ast::Value::Boolean(false) => Self::False,
                ast::Value::Variable(name) => Self::variable(name.clone()),
                _ => bail!("expected boolean or variable `if` argument, got {value}"),
            };
            let term = if negated { term.not() } else { term };
            condition = condition.and(term);
        }
        Ok(condition)
    }

    /// Widens the condition to the model property condition type.
    pub fn into_term_expression(self) -> BooleanExpression<BTerm> {
        self.map(&BTerm::Variable)
    }
}

impl BooleanExpression<BTerm> {
    pub fn possible_types(possible_types: Vec<Name>) -> Self {
        Self::Element(BTerm::PossibleTypes(BPossibleTypes(possible_types)))
    }

    /// Whether evaluating this condition requires knowing the runtime type of the object.
    pub fn contains_possible_types(&self) -> bool {
        self.contains(&|term| matches!(term, BTerm::PossibleTypes(_)))
    }
}

impl fmt::Display for BVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.name)
    }
}

impl fmt::Display for BPossibleTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "__typename in ")?;
        fmt::Display::fmt(&crate::display_helpers::DisplaySlice(&self.0), f)
    }
}

impl fmt::Display for BTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(variable) => fmt::Display::fmt(variable, f),
            Self::PossibleTypes(possible_types) => fmt::Display::fmt(possible_types, f),
        }
    }
}

impl<T: fmt::Display> fmt::Display for BooleanExpression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_junction =
            |f: &mut fmt::Formatter<'_>, operands: &[Self], separator: &str| -> fmt::Result {
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {separator} ")?;
                    }
                    match operand {
                        Self::And(_) | Self::Or(_) => write!(f, "({operand})")?,
                        _ => write!(f, "{operand}")?,
                    }
                }
                Ok(())
            };
        match self {
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Not(inner) => match inner.as_ref() {
                Self::And(_) | Self::Or(_) => write!(f, "!({inner})"),
                _ => write!(f, "!{inner}"),
            },
            Self::Or(operands) => write_junction(f, operands, "||"),
            Self::And(operands) => write_junction(f, operands, "&&"),
            Self::Element(term) => fmt::Display::fmt(term, f),
        }
    }
}
