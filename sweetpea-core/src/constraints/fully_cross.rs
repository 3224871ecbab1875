use log::debug;

use super::level_holds;
use super::Constraint;
use crate::backend::BackendRequest;
use crate::backend::LowLevelRequest;
use crate::basic_types::FreshVariables;
use crate::basic_types::LookupError;
use crate::formula::tseitin;
use crate::formula::Formula;
use crate::Block;

/// Every combination of the crossed levels occurs across the trials of a block.
///
/// The first `crossing_size` trials in which all crossed factors apply are used. For every such
/// trial and every combination which is not excluded, a fresh state variable is tied to the
/// conjunction of the combination's levels in that trial. Each combination then gets a request
/// that at least one of its state variables holds; together with [`Consistency`](super::Consistency)
/// this makes every combination occur exactly once.
#[derive(Clone, Copy, Debug, Default)]
pub struct FullyCross;

impl Constraint for FullyCross {
    fn apply(&self, block: &Block, request: &mut BackendRequest) -> Result<(), LookupError> {
        let tracker = block.variable_tracker();
        let crossing = block.crossing();
        let combinations = block.crossing_combinations();

        let trials = (0..tracker.num_trials())
            .filter(|&trial| {
                crossing
                    .iter()
                    .all(|factor| factor.applies_to_trial(trial + 1))
            })
            .take(block.crossing_size())
            .collect::<Vec<_>>();

        let mut equivalences = vec![];
        let mut states = vec![vec![]; combinations.len()];

        for &trial in trials.iter() {
            for (combination_index, combination) in combinations.iter().enumerate() {
                let conjuncts = crossing
                    .iter()
                    .zip(combination.iter())
                    .map(|(factor, &level)| {
                        let level = factor.levels()[level].name();
                        tracker
                            .level_variables_in_trial(factor.name(), level, trial)
                            .map(|variables| level_holds(&variables))
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                let state = request.fresh_variable();
                equivalences.push(Formula::iff(state, Formula::And(conjuncts)));
                states[combination_index].push(state);
            }
        }

        let cnf = tseitin::to_cnf(&Formula::And(equivalences), request);
        debug!(
            "FullyCross crossed {} combinations over {} trials with {} clauses",
            combinations.len(),
            trials.len(),
            cnf.num_clauses()
        );
        request.add_cnf(cnf);

        for combination_states in states {
            request.add_ll_request(LowLevelRequest::more_than(0, combination_states));
        }

        Ok(())
    }
}
