use log::debug;

use super::Constraint;
use crate::backend::BackendRequest;
use crate::backend::LowLevelRequest;
use crate::basic_types::LookupError;
use crate::Block;

/// Exactly one level of every factor holds in every trial in which the factor applies.
///
/// The requests cover the grid first, trial by trial and factor by factor in design order, followed
/// by the factors with a complex window, one request per applicable trial.
#[derive(Clone, Copy, Debug, Default)]
pub struct Consistency;

impl Constraint for Consistency {
    fn apply(&self, block: &Block, request: &mut BackendRequest) -> Result<(), LookupError> {
        let tracker = block.variable_tracker();
        let num_requests_before = request.ll_requests().len();

        let grid = block
            .design()
            .iter()
            .filter(|factor| !factor.has_complex_window())
            .map(|factor| tracker.factor_variables(factor.name()))
            .collect::<Result<Vec<_>, _>>()?;

        for trial in 0..tracker.num_trials() {
            for factor_variables in grid.iter() {
                request.add_ll_request(LowLevelRequest::exactly(
                    1,
                    factor_variables[trial].iter().copied(),
                ));
            }
        }

        for factor in block
            .design()
            .iter()
            .filter(|factor| factor.has_complex_window())
        {
            for variables in tracker.factor_variables(factor.name())? {
                request.add_ll_request(LowLevelRequest::exactly(1, variables));
            }
        }

        debug!(
            "Consistency added {} requests",
            request.ll_requests().len() - num_requests_before
        );
        Ok(())
    }
}
