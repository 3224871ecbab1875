//! Allocation of the propositional variables which represent the levels of a design.
//!
//! The variables are laid out in two regions. The *grid* holds every factor which has a value in
//! every trial: trial by trial, factor by factor in design order, level by level, with `weight`
//! consecutive replicate variables per level. After the grid come the factors with a complex
//! window, factor by factor, then trial by trial over the trials the factor applies to, then level
//! by level.
use std::fmt::Display;

use crate::basic_types::FreshVariables;
use crate::basic_types::LookupError;
use crate::basic_types::Var;
use crate::containers::HashMap;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::design::Factor;
use crate::sweetpea_assert_moderate;

/// Identifies a factor of the design within a [`VariableTracker`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactorId {
    id: u32,
}

impl StorageKey for FactorId {
    fn index(&self) -> usize {
        self.id as usize
    }

    fn create_from_index(index: usize) -> Self {
        FactorId { id: index as u32 }
    }
}

#[derive(Clone, Debug)]
struct TrackedLevel {
    name: String,
    /// Position of the first replicate within the variables of one occurrence of the factor.
    offset: usize,
    weight: usize,
}

#[derive(Clone, Copy, Debug)]
enum Placement {
    /// The factor occupies `[offset, offset + size)` within every trial of the grid.
    Grid { offset: usize },
    /// The factor occupies `size` consecutive variables per applicable trial, starting at the
    /// 0-based variable index `first`.
    Window { first: usize },
}

#[derive(Clone, Debug)]
struct TrackedFactor {
    name: String,
    levels: Vec<TrackedLevel>,
    /// Number of variables of one occurrence of the factor; the sum of the level weights.
    size: usize,
    placement: Placement,
    /// 0-based trials in which the factor has a value.
    trials: Vec<usize>,
}

impl TrackedFactor {
    /// The 0-based index of the first variable of the `occurrence`-th applicable trial.
    fn occurrence_start(&self, occurrence: usize, variables_per_trial: usize) -> usize {
        match self.placement {
            Placement::Grid { offset } => self.trials[occurrence] * variables_per_trial + offset,
            Placement::Window { first } => first + occurrence * self.size,
        }
    }

    fn level(&self, name: &str) -> Result<&TrackedLevel, LookupError> {
        self.levels
            .iter()
            .find(|level| level.name == name)
            .ok_or_else(|| LookupError::Level {
                factor: self.name.clone(),
                level: name.to_owned(),
            })
    }
}

/// What a variable allocated for a level stands for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableLabel {
    pub factor: String,
    pub level: String,
    /// 1-based trial.
    pub trial: usize,
    /// The replicate index, for weighted levels.
    pub replicate: Option<usize>,
}

impl Display for VariableLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.factor, self.level)?;
        if let Some(replicate) = self.replicate {
            write!(f, ".w{replicate}")?;
        }
        write!(f, ".t{}", self.trial)
    }
}

/// The single source of truth mapping `(factor, level, trial, replicate)` to a [`Var`].
///
/// After the level variables have been laid out, the tracker hands out fresh unlabeled variables
/// through [`FreshVariables`].
#[derive(Clone, Debug)]
pub struct VariableTracker {
    factors: KeyedVec<FactorId, TrackedFactor>,
    factor_ids: HashMap<String, FactorId>,
    variables_per_trial: usize,
    num_trials: usize,
    num_level_variables: usize,
    next_free: u32,
}

impl VariableTracker {
    /// Lay out the level variables of `design` over `num_trials` trials.
    pub fn new(design: &[Factor], num_trials: usize) -> VariableTracker {
        let mut factors = KeyedVec::default();
        let mut factor_ids = HashMap::default();

        let mut variables_per_trial = 0;
        for factor in design.iter().filter(|factor| !factor.has_complex_window()) {
            let tracked = track_factor(
                factor,
                Placement::Grid {
                    offset: variables_per_trial,
                },
                (0..num_trials).collect(),
            );
            variables_per_trial += tracked.size;
            let _ = factor_ids.insert(factor.name().to_owned(), factors.push(tracked));
        }

        let mut next_index = variables_per_trial * num_trials;
        for factor in design.iter().filter(|factor| factor.has_complex_window()) {
            let trials = (0..num_trials)
                .filter(|&trial| factor.applies_to_trial(trial + 1))
                .collect::<Vec<_>>();
            let tracked = track_factor(factor, Placement::Window { first: next_index }, trials);
            next_index += tracked.size * tracked.trials.len();
            let _ = factor_ids.insert(factor.name().to_owned(), factors.push(tracked));
        }

        sweetpea_assert_moderate!(
            factor_ids.len() == design.len(),
            "Factor names in a design are unique."
        );

        VariableTracker {
            factors,
            factor_ids,
            variables_per_trial,
            num_trials,
            num_level_variables: next_index,
            next_free: next_index as u32 + 1,
        }
    }

    /// The number of grid variables in a single trial.
    pub fn variables_per_trial(&self) -> usize {
        self.variables_per_trial
    }

    pub fn num_trials(&self) -> usize {
        self.num_trials
    }

    /// The number of grid variables over all trials.
    pub fn grid_size(&self) -> usize {
        self.variables_per_trial * self.num_trials
    }

    /// The number of variables allocated for levels, over all trials.
    pub fn num_level_variables(&self) -> usize {
        self.num_level_variables
    }

    /// The next variable which has not been handed out.
    pub fn next_free(&self) -> Var {
        Var::new(self.next_free)
    }

    pub fn factor_id(&self, factor: &str) -> Result<FactorId, LookupError> {
        self.factor_ids
            .get(factor)
            .copied()
            .ok_or_else(|| LookupError::Factor(factor.to_owned()))
    }

    /// The 0-based trials in which `factor` has a value.
    pub fn applicable_trials(&self, factor: &str) -> Result<&[usize], LookupError> {
        let id = self.factor_id(factor)?;
        Ok(&self.factors[id].trials)
    }

    /// The variables of `factor`, one list per applicable trial, holding every replicate of every
    /// level in level order.
    pub fn factor_variables(&self, factor: &str) -> Result<Vec<Vec<Var>>, LookupError> {
        let tracked = &self.factors[self.factor_id(factor)?];

        Ok((0..tracked.trials.len())
            .map(|occurrence| {
                let start = tracked.occurrence_start(occurrence, self.variables_per_trial);
                (start..start + tracked.size).map(Var::from_index).collect()
            })
            .collect())
    }

    /// The replicate variables of `level`, one list per trial in which its factor applies.
    pub fn level_variables(&self, factor: &str, level: &str) -> Result<Vec<Vec<Var>>, LookupError> {
        let tracked = &self.factors[self.factor_id(factor)?];
        let tracked_level = tracked.level(level)?;

        Ok((0..tracked.trials.len())
            .map(|occurrence| {
                let start = tracked.occurrence_start(occurrence, self.variables_per_trial)
                    + tracked_level.offset;
                (start..start + tracked_level.weight)
                    .map(Var::from_index)
                    .collect()
            })
            .collect())
    }

    /// The replicate variables of `level` in the 0-based `trial`; empty if its factor does not
    /// apply to that trial.
    pub fn level_variables_in_trial(
        &self,
        factor: &str,
        level: &str,
        trial: usize,
    ) -> Result<Vec<Var>, LookupError> {
        let tracked = &self.factors[self.factor_id(factor)?];
        let tracked_level = tracked.level(level)?;

        let Ok(occurrence) = tracked.trials.binary_search(&trial) else {
            return Ok(vec![]);
        };
        let start =
            tracked.occurrence_start(occurrence, self.variables_per_trial) + tracked_level.offset;

        Ok((start..start + tracked_level.weight)
            .map(Var::from_index)
            .collect())
    }

    /// The 0-based indices of the replicate variables of `level` in the first trial its factor
    /// applies to. Fails when the factor applies to no trial at all.
    pub fn first_level_indices(
        &self,
        factor: &str,
        level: &str,
    ) -> Result<Vec<usize>, LookupError> {
        let tracked = &self.factors[self.factor_id(factor)?];
        let tracked_level = tracked.level(level)?;
        if tracked.trials.is_empty() {
            return Err(LookupError::NoApplicableTrial(factor.to_owned()));
        }
        let start = tracked.occurrence_start(0, self.variables_per_trial) + tracked_level.offset;

        Ok((start..start + tracked_level.weight).collect())
    }

    /// Describe the level variable `var`. Fails for fresh variables, which do not stand for a
    /// level.
    pub fn variable_label(&self, var: Var) -> Result<VariableLabel, LookupError> {
        let index = var.index();
        if index >= self.num_level_variables {
            return Err(LookupError::Variable(var.id()));
        }

        let grid_size = self.grid_size();
        let (tracked, trial, position) = if index < grid_size {
            let trial = index / self.variables_per_trial;
            let position = index % self.variables_per_trial;
            let tracked = self
                .factors
                .iter()
                .find(|tracked| match tracked.placement {
                    Placement::Grid { offset } => (offset..offset + tracked.size).contains(&position),
                    Placement::Window { .. } => false,
                })
                .ok_or(LookupError::Variable(var.id()))?;
            let Placement::Grid { offset } = tracked.placement else {
                return Err(LookupError::Variable(var.id()));
            };
            (tracked, trial, position - offset)
        } else {
            let tracked = self
                .factors
                .iter()
                .find(|tracked| match tracked.placement {
                    Placement::Grid { .. } => false,
                    Placement::Window { first } => {
                        (first..first + tracked.size * tracked.trials.len()).contains(&index)
                    }
                })
                .ok_or(LookupError::Variable(var.id()))?;
            let Placement::Window { first } = tracked.placement else {
                return Err(LookupError::Variable(var.id()));
            };
            let occurrence = (index - first) / tracked.size;
            (tracked, tracked.trials[occurrence], (index - first) % tracked.size)
        };

        let level = tracked
            .levels
            .iter()
            .find(|level| (level.offset..level.offset + level.weight).contains(&position))
            .ok_or(LookupError::Variable(var.id()))?;

        Ok(VariableLabel {
            factor: tracked.name.clone(),
            level: level.name.clone(),
            trial: trial + 1,
            replicate: (level.weight > 1).then_some(position - level.offset),
        })
    }
}

impl FreshVariables for VariableTracker {
    fn fresh_variable(&mut self) -> Var {
        self.next_free.fresh_variable()
    }

    fn peek_fresh(&self) -> Var {
        self.next_free.peek_fresh()
    }
}

fn track_factor(factor: &Factor, placement: Placement, trials: Vec<usize>) -> TrackedFactor {
    let mut size = 0;
    let levels = factor
        .levels()
        .iter()
        .map(|level| {
            let tracked = TrackedLevel {
                name: level.name().to_owned(),
                offset: size,
                weight: level.weight(),
            };
            size += level.weight();
            tracked
        })
        .collect();

    TrackedFactor {
        name: factor.name().to_owned(),
        levels,
        size,
        placement,
        trials,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::Level;
    use crate::design::Window;

    fn ids(variables: Vec<Vec<Var>>) -> Vec<Vec<u32>> {
        variables
            .into_iter()
            .map(|trial| trial.into_iter().map(Var::id).collect())
            .collect()
    }

    fn stroop() -> Vec<Factor> {
        let color = Factor::new("color", ["red", "blue"]);
        let text = Factor::new("text", ["red", "blue"]);
        let repeated = Factor::new(
            "repeated color?",
            [
                Level::derived(
                    "yes",
                    Window::transition(|colors| colors[0][0] == colors[0][1], [color.clone()]),
                ),
                Level::derived(
                    "no",
                    Window::transition(|colors| colors[0][0] != colors[0][1], [color.clone()]),
                ),
            ],
        );
        vec![color, text, repeated]
    }

    #[test]
    fn grid_is_laid_out_trial_major() {
        let tracker = VariableTracker::new(&stroop(), 4);

        assert_eq!(4, tracker.variables_per_trial());
        assert_eq!(
            vec![vec![1], vec![5], vec![9], vec![13]],
            ids(tracker.level_variables("color", "red").expect("known level"))
        );
        assert_eq!(
            vec![vec![3, 4], vec![7, 8], vec![11, 12], vec![15, 16]],
            ids(tracker.factor_variables("text").expect("known factor"))
        );
    }

    #[test]
    fn complex_factors_follow_the_grid() {
        let tracker = VariableTracker::new(&stroop(), 4);

        assert_eq!(
            vec![1, 2, 3],
            tracker
                .applicable_trials("repeated color?")
                .expect("known factor")
                .to_vec()
        );
        assert_eq!(
            vec![vec![17, 18], vec![19, 20], vec![21, 22]],
            ids(tracker.factor_variables("repeated color?").expect("known factor"))
        );
        assert_eq!(22, tracker.num_level_variables());
        assert_eq!(Var::new(23), tracker.next_free());
    }

    #[test]
    fn weighted_levels_own_replicate_variables() {
        let design = vec![Factor::new(
            "color",
            [Level::weighted("red", 2), Level::simple("blue")],
        )];
        let tracker = VariableTracker::new(&design, 2);

        assert_eq!(
            vec![vec![1, 2], vec![4, 5]],
            ids(tracker.level_variables("color", "red").expect("known level"))
        );
        assert_eq!(vec![2], tracker.first_level_indices("color", "blue").expect("known"));
        assert_eq!(
            "color.red.w1.t2",
            tracker
                .variable_label(Var::new(5))
                .expect("level variable")
                .to_string()
        );
    }

    #[test]
    fn labels_describe_level_variables() {
        let tracker = VariableTracker::new(&stroop(), 4);

        assert_eq!(
            VariableLabel {
                factor: "text".to_owned(),
                level: "blue".to_owned(),
                trial: 3,
                replicate: None,
            },
            tracker.variable_label(Var::new(12)).expect("level variable")
        );
        assert_eq!(
            "repeated color?.no.t3",
            tracker
                .variable_label(Var::new(20))
                .expect("level variable")
                .to_string()
        );
        assert_eq!(
            Err(LookupError::Variable(23)),
            tracker.variable_label(Var::new(23))
        );
    }

    #[test]
    fn level_variables_are_found_per_trial() {
        let tracker = VariableTracker::new(&stroop(), 4);

        assert_eq!(
            vec![Var::new(10)],
            tracker
                .level_variables_in_trial("color", "blue", 2)
                .expect("known level")
        );
        assert_eq!(
            vec![Var::new(21)],
            tracker
                .level_variables_in_trial("repeated color?", "yes", 3)
                .expect("known level")
        );
        assert!(tracker
            .level_variables_in_trial("repeated color?", "yes", 0)
            .expect("known level")
            .is_empty());
    }

    #[test]
    fn fresh_variables_continue_after_the_levels() {
        let mut tracker = VariableTracker::new(&stroop(), 2);

        // 8 grid variables and a single transition occurrence.
        assert_eq!(Var::new(11), tracker.fresh_variable());
        assert_eq!(Var::new(12), tracker.peek_fresh());
    }

    #[test]
    fn factor_wider_than_the_block_has_no_variables() {
        let tracker = VariableTracker::new(&stroop(), 1);

        assert!(tracker
            .applicable_trials("repeated color?")
            .expect("known factor")
            .is_empty());
        assert_eq!(4, tracker.num_level_variables());
        assert_eq!(
            Err(LookupError::NoApplicableTrial("repeated color?".to_owned())),
            tracker.first_level_indices("repeated color?", "yes")
        );
    }

    #[test]
    fn unknown_keys_are_reported() {
        let tracker = VariableTracker::new(&stroop(), 4);

        assert_eq!(
            Err(LookupError::Factor("shape".to_owned())),
            tracker.factor_id("shape")
        );
        assert_eq!(
            Err(LookupError::Level {
                factor: "color".to_owned(),
                level: "green".to_owned()
            }),
            tracker.level_variables("color", "green")
        );
    }
}
