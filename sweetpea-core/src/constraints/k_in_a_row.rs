use log::debug;
use log::warn;

use super::level_holds;
use super::Constraint;
use super::LevelSelector;
use crate::backend::BackendRequest;
use crate::backend::LowLevelRequest;
use crate::basic_types::DesignError;
use crate::basic_types::LookupError;
use crate::formula::tseitin;
use crate::formula::Formula;
use crate::Block;

/// A selected level holds in at most `k` consecutive trials in which its factor applies.
///
/// Selecting a factor constrains each of its levels separately.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtMostKInARow {
    k: usize,
    selector: LevelSelector,
}

impl AtMostKInARow {
    pub fn new(k: usize, selector: impl Into<LevelSelector>) -> Result<Self, DesignError> {
        if k == 0 {
            return Err(DesignError::InvalidRunLength(k));
        }

        Ok(AtMostKInARow {
            k,
            selector: selector.into(),
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn selector(&self) -> &LevelSelector {
        &self.selector
    }

    /// One constraint per selected level.
    pub fn desugar(&self) -> Vec<AtMostKInARow> {
        self.selector
            .split()
            .into_iter()
            .map(|selector| AtMostKInARow {
                k: self.k,
                selector,
            })
            .collect()
    }
}

impl Constraint for AtMostKInARow {
    /// Adds a request that fewer than `k + 1` of the level's variables hold, for every window of
    /// `k + 1` consecutive applicable trials.
    fn apply(&self, block: &Block, request: &mut BackendRequest) -> Result<(), LookupError> {
        let tracker = block.variable_tracker();

        for level in self.selector.levels() {
            let trials = tracker.level_variables(self.selector.factor(), level)?;

            for window in trials.windows(self.k + 1) {
                request.add_ll_request(LowLevelRequest::fewer_than(
                    self.k + 1,
                    window.iter().flatten().copied(),
                ));
            }

            debug!(
                "At most {} in a row of {}.{} added {} requests",
                self.k,
                self.selector.factor(),
                level,
                trials.len().saturating_sub(self.k)
            );
        }

        Ok(())
    }
}

/// Every run of a selected level, over the trials in which its factor applies, has length exactly
/// `k`.
///
/// Selecting a factor constrains each of its levels separately.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExactlyKInARow {
    k: usize,
    selector: LevelSelector,
}

impl ExactlyKInARow {
    pub fn new(k: usize, selector: impl Into<LevelSelector>) -> Result<Self, DesignError> {
        if k == 0 {
            return Err(DesignError::InvalidRunLength(k));
        }

        Ok(ExactlyKInARow {
            k,
            selector: selector.into(),
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn selector(&self) -> &LevelSelector {
        &self.selector
    }

    /// One constraint per selected level.
    pub fn desugar(&self) -> Vec<ExactlyKInARow> {
        self.selector
            .split()
            .into_iter()
            .map(|selector| ExactlyKInARow {
                k: self.k,
                selector,
            })
            .collect()
    }

    /// The implications stating that a run which starts in a window of `k` trials fills the
    /// window and stops right after it, plus the implications which keep a run that reaches the
    /// last trial from being shorter than `k`.
    fn run_implications(&self, trials: &[Formula]) -> Vec<Formula> {
        let k = self.k;
        if trials.len() < k {
            return vec![];
        }

        let num_windows = trials.len() - k + 1;
        let mut implications = vec![];

        for start in 0..num_windows {
            let has_next = start + 1 < num_windows;
            if k == 1 && !has_next {
                break;
            }

            let window = &trials[start..start + k];
            let antecedent = if start == 0 {
                window[0].clone()
            } else {
                Formula::and([!trials[start - 1].clone(), window[0].clone()])
            };

            let mut consequent = window[1..].to_vec();
            if has_next {
                consequent.push(!trials[start + k].clone());
            }

            implications.push(Formula::implies(antecedent, Formula::all_of(consequent)));
        }

        if k > 1 {
            let last_window = &trials[trials.len() - k..];
            for position in (1..k).rev() {
                implications.push(Formula::implies(
                    last_window[position].clone(),
                    last_window[position - 1].clone(),
                ));
            }
        }

        implications
    }
}

impl Constraint for ExactlyKInARow {
    fn apply(&self, block: &Block, request: &mut BackendRequest) -> Result<(), LookupError> {
        let tracker = block.variable_tracker();

        for level in self.selector.levels() {
            let trials = tracker
                .level_variables(self.selector.factor(), level)?
                .iter()
                .map(|variables| level_holds(variables))
                .collect::<Vec<_>>();

            if trials.len() < self.k {
                warn!(
                    "Level {}.{} applies to {} trials, which is fewer than the run length {}.",
                    self.selector.factor(),
                    level,
                    trials.len(),
                    self.k
                );
            }

            let implications = self.run_implications(&trials);
            if implications.is_empty() {
                continue;
            }

            let cnf = tseitin::to_cnf(&Formula::And(implications), request);
            debug!(
                "Exactly {} in a row of {}.{} added {} clauses",
                self.k,
                self.selector.factor(),
                level,
                cnf.num_clauses()
            );
            request.add_cnf(cnf);
        }

        Ok(())
    }
}
