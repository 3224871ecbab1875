use log::debug;

use super::level_holds;
use super::Constraint;
use crate::backend::BackendRequest;
use crate::basic_types::LookupError;
use crate::basic_types::Var;
use crate::design::Factor;
use crate::formula::tseitin;
use crate::formula::Formula;
use crate::Block;

/// Ties the variables of a derived level to the base levels which make it hold.
///
/// `derived_index` is the 0-based index of the derived level's variable in the first trial its
/// factor applies to. Each group of `dependent_indices` lists 0-based base variables, relative to
/// the first trial of the window, whose conjunction makes the level hold. These records are
/// produced by the [`DerivationProcessor`](crate::derivation_processor::DerivationProcessor).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Derivation {
    derived_index: usize,
    dependent_indices: Vec<Vec<usize>>,
    factor: String,
}

impl Derivation {
    pub fn new(derived_index: usize, dependent_indices: Vec<Vec<usize>>, factor: &Factor) -> Self {
        Derivation {
            derived_index,
            dependent_indices,
            factor: factor.name().to_owned(),
        }
    }

    pub fn derived_index(&self) -> usize {
        self.derived_index
    }

    pub fn dependent_indices(&self) -> &[Vec<usize>] {
        &self.dependent_indices
    }

    pub fn factor(&self) -> &str {
        &self.factor
    }
}

impl Constraint for Derivation {
    /// For every trial in which the derived factor applies, adds
    /// `Iff(derived, Or(And(group) for group in dependent_indices))` with the groups moved to the
    /// window ending in that trial. All trials are converted to CNF together.
    fn apply(&self, block: &Block, request: &mut BackendRequest) -> Result<(), LookupError> {
        let tracker = block.variable_tracker();
        let factor = block
            .get_factor(&self.factor)
            .ok_or_else(|| LookupError::Factor(self.factor.clone()))?;

        let derived_var = Var::from_index(self.derived_index);
        let label = tracker.variable_label(derived_var)?;
        if label.factor != self.factor {
            return Err(LookupError::Variable(derived_var.id()));
        }

        let trials = tracker.applicable_trials(&self.factor)?;
        let derived_variables = tracker.level_variables(&self.factor, &label.level)?;
        let trial_size = tracker.variables_per_trial();
        let width = factor.width();

        let equivalences = trials
            .iter()
            .zip(derived_variables.iter())
            .map(|(&trial, derived)| {
                let shift = (trial + 1 - width) * trial_size;
                let groups = self
                    .dependent_indices
                    .iter()
                    .map(|group| {
                        Formula::And(
                            group
                                .iter()
                                .map(|&index| Formula::Var(Var::from_index(index + shift)))
                                .collect(),
                        )
                    })
                    .collect();
                Formula::iff(level_holds(derived), Formula::Or(groups))
            })
            .collect();

        let cnf = tseitin::to_cnf(&Formula::And(equivalences), request);
        debug!(
            "Derivation of {}.{} added {} clauses",
            self.factor,
            label.level,
            cnf.num_clauses()
        );
        request.add_cnf(cnf);

        Ok(())
    }
}
