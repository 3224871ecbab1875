//! Conversion of arbitrary [`Formula`]s into equisatisfiable [`Cnf`] through the Tseitin
//! transformation.
//!
//! Every node which is not a literal is replaced by a fresh auxiliary variable `z`, together with
//! the clauses stating `z <-> node`. Children are converted before their parent and in argument
//! order, so converting the same formula from the same fresh variable always produces the same
//! clauses. Shared subformulas are not detected; every occurrence gets its own variable.
//!
//! # Example
//! ```
//! # use sweetpea_core::basic_types::Var;
//! # use sweetpea_core::formula::Formula;
//! # use sweetpea_core::formula::tseitin;
//! let a = Var::new(1);
//! let b = Var::new(2);
//!
//! let mut fresh = 3;
//! let cnf = tseitin::to_cnf(&Formula::or([a, b]), &mut fresh);
//!
//! // The auxiliary variable 3 stands for `Or(1, 2)` and is asserted to be true.
//! assert_eq!(
//!     vec![vec![3], vec![-3, 1, 2], vec![3, -1], vec![3, -2]],
//!     cnf.to_integer_lists()
//! );
//! assert_eq!(4, fresh);
//! ```
use log::trace;

use super::Formula;
use crate::basic_types::Clause;
use crate::basic_types::Cnf;
use crate::basic_types::FreshVariables;
use crate::basic_types::Literal;

/// Convert `formula` to CNF, allocating auxiliary variables from `fresh`.
///
/// The result contains the unit clause asserting the root, followed by the defining clauses of
/// every auxiliary variable in allocation order. A formula which is a single literal converts to
/// the unit clause of that literal.
pub fn to_cnf(formula: &Formula, fresh: &mut impl FreshVariables) -> Cnf {
    let first_fresh = fresh.peek_fresh();

    let mut encoder = TseitinEncoder {
        fresh: &mut *fresh,
        definitions: vec![],
    };
    let root = encoder.encode(formula);
    let definitions = encoder.definitions;

    trace!(
        "Tseitin conversion introduced {} auxiliary variables and {} clauses",
        fresh.peek_fresh().id() - first_fresh.id(),
        definitions.len() + 1
    );

    std::iter::once(vec![root]).chain(definitions).collect()
}

struct TseitinEncoder<'fresh, Fresh> {
    fresh: &'fresh mut Fresh,
    definitions: Vec<Clause>,
}

impl<Fresh: FreshVariables> TseitinEncoder<'_, Fresh> {
    /// Returns the literal which is equivalent to `formula`.
    fn encode(&mut self, formula: &Formula) -> Literal {
        match formula {
            Formula::Var(var) => var.positive(),
            Formula::Not(inner) => {
                if let Formula::Var(var) = inner.as_ref() {
                    return var.negative();
                }

                let input = self.encode(inner);
                let output = self.fresh.fresh_variable().positive();

                self.definitions.push(vec![!output, !input]);
                self.definitions.push(vec![output, input]);

                output
            }
            Formula::And(children) => {
                let inputs = self.encode_all(children);
                let output = self.fresh.fresh_variable().positive();

                for &input in inputs.iter() {
                    self.definitions.push(vec![!output, input]);
                }
                self.definitions.push(
                    std::iter::once(output)
                        .chain(inputs.iter().map(|&input| !input))
                        .collect(),
                );

                output
            }
            Formula::Or(children) => {
                let inputs = self.encode_all(children);
                let output = self.fresh.fresh_variable().positive();

                self.definitions
                    .push(std::iter::once(!output).chain(inputs.iter().copied()).collect());
                for &input in inputs.iter() {
                    self.definitions.push(vec![output, !input]);
                }

                output
            }
            Formula::If(..) | Formula::Iff(..) => self.encode(&formula.clone().desugar()),
        }
    }

    fn encode_all(&mut self, children: &[Formula]) -> Vec<Literal> {
        children.iter().map(|child| self.encode(child)).collect()
    }
}
