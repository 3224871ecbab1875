//! Propositional formulas over [`Var`]s, and their conversion to [`Cnf`](crate::basic_types::Cnf)
//! through [`tseitin::to_cnf`].
pub mod tseitin;

use crate::basic_types::Literal;
use crate::basic_types::Var;

/// A propositional formula.
///
/// [`Formula::If`] and [`Formula::Iff`] are sugar; [`Formula::desugar`] rewrites them into the
/// other connectives before conversion to CNF.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Formula {
    Var(Var),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    If(Box<Formula>, Box<Formula>),
    Iff(Box<Formula>, Box<Formula>),
}

impl Formula {
    pub fn and(conjuncts: impl IntoIterator<Item = impl Into<Formula>>) -> Formula {
        Formula::And(conjuncts.into_iter().map(Into::into).collect())
    }

    pub fn or(disjuncts: impl IntoIterator<Item = impl Into<Formula>>) -> Formula {
        Formula::Or(disjuncts.into_iter().map(Into::into).collect())
    }

    pub fn implies(antecedent: impl Into<Formula>, consequent: impl Into<Formula>) -> Formula {
        Formula::If(Box::new(antecedent.into()), Box::new(consequent.into()))
    }

    pub fn iff(lhs: impl Into<Formula>, rhs: impl Into<Formula>) -> Formula {
        Formula::Iff(Box::new(lhs.into()), Box::new(rhs.into()))
    }

    /// The conjunction of the given formulas, or the formula itself when there is only one.
    pub fn all_of(mut formulas: Vec<Formula>) -> Formula {
        if formulas.len() == 1 {
            formulas.remove(0)
        } else {
            Formula::And(formulas)
        }
    }

    /// The disjunction of the given formulas, or the formula itself when there is only one.
    pub fn any_of(mut formulas: Vec<Formula>) -> Formula {
        if formulas.len() == 1 {
            formulas.remove(0)
        } else {
            Formula::Or(formulas)
        }
    }

    /// The literal this formula denotes, if it is a (negated) variable.
    pub fn as_literal(&self) -> Option<Literal> {
        match self {
            Formula::Var(var) => Some(var.positive()),
            Formula::Not(inner) => match inner.as_ref() {
                Formula::Var(var) => Some(var.negative()),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        self.as_literal().is_some()
    }

    /// Whether the formula contains [`Formula::If`] or [`Formula::Iff`].
    pub fn is_complex(&self) -> bool {
        match self {
            Formula::Var(_) => false,
            Formula::Not(inner) => inner.is_complex(),
            Formula::And(children) | Formula::Or(children) => {
                children.iter().any(Formula::is_complex)
            }
            Formula::If(..) | Formula::Iff(..) => true,
        }
    }

    /// Rewrite `If(p, q)` into `Or(Not(p), q)` and `Iff(p, q)` into `And(If(p, q), If(q, p))`.
    pub fn desugar(self) -> Formula {
        match self {
            Formula::Var(_) => self,
            Formula::Not(inner) => !(*inner).desugar(),
            Formula::And(children) => {
                Formula::And(children.into_iter().map(Formula::desugar).collect())
            }
            Formula::Or(children) => {
                Formula::Or(children.into_iter().map(Formula::desugar).collect())
            }
            Formula::If(p, q) => Formula::Or(vec![!(*p).desugar(), (*q).desugar()]),
            Formula::Iff(p, q) => {
                let p = (*p).desugar();
                let q = (*q).desugar();
                Formula::And(vec![
                    Formula::Or(vec![!p.clone(), q.clone()]),
                    Formula::Or(vec![!q, p]),
                ])
            }
        }
    }

    /// The number of nodes of the desugared formula which are not literals. This is exactly the
    /// number of auxiliary variables the Tseitin conversion introduces.
    pub fn compound_node_count(&self) -> usize {
        fn count(formula: &Formula) -> usize {
            if formula.is_literal() {
                return 0;
            }
            match formula {
                Formula::Var(_) => 0,
                Formula::Not(inner) => 1 + count(inner),
                Formula::And(children) | Formula::Or(children) => {
                    1 + children.iter().map(count).sum::<usize>()
                }
                Formula::If(..) | Formula::Iff(..) => {
                    unreachable!("counted on desugared formulas only")
                }
            }
        }

        if self.is_complex() {
            count(&self.clone().desugar())
        } else {
            count(self)
        }
    }
}

impl From<Var> for Formula {
    fn from(var: Var) -> Self {
        Formula::Var(var)
    }
}

impl From<Literal> for Formula {
    fn from(literal: Literal) -> Self {
        if literal.is_positive() {
            Formula::Var(literal.variable())
        } else {
            !Formula::Var(literal.variable())
        }
    }
}

impl std::ops::Not for Formula {
    type Output = Formula;

    fn not(self) -> Formula {
        Formula::Not(Box::new(self))
    }
}

impl std::fmt::Display for Formula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn write_all(
            f: &mut std::fmt::Formatter<'_>,
            name: &str,
            children: &[Formula],
        ) -> std::fmt::Result {
            write!(f, "{name}(")?;
            for (index, child) in children.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{child}")?;
            }
            write!(f, ")")
        }

        match self {
            Formula::Var(var) => write!(f, "{var}"),
            Formula::Not(inner) => write!(f, "Not({inner})"),
            Formula::And(children) => write_all(f, "And", children),
            Formula::Or(children) => write_all(f, "Or", children),
            Formula::If(p, q) => write!(f, "If({p}, {q})"),
            Formula::Iff(p, q) => write!(f, "Iff({p}, {q})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(id: u32) -> Formula {
        Formula::Var(Var::new(id))
    }

    #[test]
    fn implication_desugars_to_disjunction() {
        let formula = Formula::implies(var(1), var(2)).desugar();

        assert_eq!(Formula::Or(vec![!var(1), var(2)]), formula);
    }

    #[test]
    fn biconditional_desugars_to_two_implications() {
        let formula = Formula::iff(var(1), Formula::and([var(2), var(3)])).desugar();

        let and = Formula::And(vec![var(2), var(3)]);
        assert_eq!(
            Formula::And(vec![
                Formula::Or(vec![!var(1), and.clone()]),
                Formula::Or(vec![!and, var(1)]),
            ]),
            formula
        );
    }

    #[test]
    fn negated_variables_are_literals() {
        assert_eq!(Some(Var::new(3).negative()), (!var(3)).as_literal());
        assert!(!(!!var(3)).is_literal());
        assert_eq!(1, (!!var(3)).compound_node_count());
    }

    #[test]
    fn compound_nodes_are_counted_after_desugaring() {
        // And(Or(-1, And(2, 3)), Or(Not(And(2, 3)), 1))
        let formula = Formula::iff(var(1), Formula::and([var(2), var(3)]));

        assert_eq!(6, formula.compound_node_count());
    }

    #[test]
    fn formulas_display_with_variable_names() {
        let formula = Formula::implies(Formula::and([var(1), !var(2)]), var(3));

        assert_eq!("If(And(v1, Not(v2)), v3)", formula.to_string());
    }
}
