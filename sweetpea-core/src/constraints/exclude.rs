use log::debug;

use super::Constraint;
use crate::backend::BackendRequest;
use crate::basic_types::Cnf;
use crate::basic_types::DesignError;
use crate::basic_types::LookupError;
use crate::design::Factor;
use crate::Block;

/// A level never holds, in any trial in which its factor applies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exclude {
    factor: String,
    level: String,
}

impl Exclude {
    pub fn new(factor: &Factor, level: &str) -> Result<Self, DesignError> {
        if factor.level(level).is_none() {
            return Err(DesignError::InvalidLevelSelector {
                factor: factor.name().to_owned(),
                level: level.to_owned(),
            });
        }

        Ok(Exclude {
            factor: factor.name().to_owned(),
            level: level.to_owned(),
        })
    }

    pub fn factor(&self) -> &str {
        &self.factor
    }

    pub fn level(&self) -> &str {
        &self.level
    }
}

impl Constraint for Exclude {
    /// Adds one CNF with a negative unit clause per variable of the level.
    fn apply(&self, block: &Block, request: &mut BackendRequest) -> Result<(), LookupError> {
        let cnf = block
            .variable_tracker()
            .level_variables(&self.factor, &self.level)?
            .into_iter()
            .flatten()
            .map(|var| vec![var.negative()])
            .collect::<Cnf>();

        debug!(
            "Excluding {}.{} added {} clauses",
            self.factor,
            self.level,
            cnf.num_clauses()
        );
        request.add_cnf(cnf);

        Ok(())
    }
}
