use itertools::Itertools;
use log::debug;
use log::warn;

use crate::backend::BackendRequest;
use crate::backend::DimacsOptions;
use crate::basic_types::DesignError;
use crate::basic_types::LookupError;
use crate::basic_types::Var;
use crate::constraints::Consistency;
use crate::constraints::Constraint;
use crate::constraints::Derivation;
use crate::constraints::Exclude;
use crate::constraints::FullyCross;
use crate::constraints::SequenceConstraint;
use crate::containers::HashSet;
use crate::derivation_processor::DerivationProcessor;
use crate::design::Factor;
use crate::variable_tracker::VariableTracker;

/// Options which influence how a [`Block`] is compiled.
#[derive(Clone, Copy, Debug)]
pub struct BlockOptions {
    /// Whether every combination of the crossing must occur, even those which an [`Exclude`]
    /// constraint rules out. When unset, the excluded combinations are dropped and the block
    /// becomes shorter accordingly.
    pub require_complete_crossing: bool,
}

impl Default for BlockOptions {
    fn default() -> Self {
        Self {
            require_complete_crossing: true,
        }
    }
}

/// A sequence of trials over a design, in which every combination of the levels of the crossed
/// factors occurs once.
///
/// Everything which depends only on the design is computed at construction: the number of trials,
/// the variable layout, and the derivations of the derived levels. The block is immutable
/// afterwards; [`Block::build_backend_request`] compiles it.
#[derive(Clone, Debug)]
pub struct Block {
    design: Vec<Factor>,
    crossing: Vec<Factor>,
    constraints: Vec<SequenceConstraint>,
    options: BlockOptions,

    variable_tracker: VariableTracker,
    derivations: Vec<Derivation>,
    crossing_combinations: Vec<Vec<usize>>,
    exclusions: usize,
    crossing_size: usize,
    trials_per_sample: usize,
    is_complex: bool,
}

impl Block {
    pub fn new(
        design: Vec<Factor>,
        crossing: Vec<Factor>,
        constraints: Vec<SequenceConstraint>,
        options: BlockOptions,
    ) -> Result<Block, DesignError> {
        check_design(&design)?;

        if crossing.is_empty() {
            return Err(DesignError::EmptyCrossing);
        }
        let crossing = crossing
            .iter()
            .map(|factor| {
                design
                    .iter()
                    .find(|design_factor| design_factor.name() == factor.name())
                    .cloned()
                    .ok_or_else(|| DesignError::UnknownFactor(factor.name().to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut crossed: HashSet<&str> = HashSet::default();
        if let Some(duplicate) = crossing.iter().find(|factor| !crossed.insert(factor.name())) {
            return Err(DesignError::DuplicateFactor(duplicate.name().to_owned()));
        }

        check_constraints(&design, &constraints)?;

        let (crossing_combinations, exclusions) =
            enumerate_crossing(&design, &crossing, &constraints);
        let full_crossing_size = crossing_combinations.len() + exclusions;

        let crossing_size = if options.require_complete_crossing {
            if exclusions > 0 {
                warn!(
                    "{} crossing combinations are excluded, but the complete crossing of {} \
                     combinations is required; the excluded combinations will not be crossed.",
                    exclusions, full_crossing_size
                );
            }
            full_crossing_size
        } else {
            crossing_combinations.len()
        };
        if crossing_size == 0 {
            return Err(DesignError::EmptyCrossing);
        }

        let trials_per_sample = crossing
            .iter()
            .map(|factor| factor.trials_required_for(crossing_size))
            .max()
            .unwrap_or(crossing_size)
            .max(crossing_size);

        let variable_tracker = VariableTracker::new(&design, trials_per_sample);
        let derivations = DerivationProcessor::generate_derivations(&design, &variable_tracker)?;

        let is_complex = !constraints.is_empty()
            || design.iter().any(Factor::has_complex_window)
            || crossing.iter().any(Factor::is_derived);

        debug!(
            "Block of {} trials with {} variables per trial and {} level variables",
            trials_per_sample,
            variable_tracker.variables_per_trial(),
            variable_tracker.num_level_variables()
        );

        Ok(Block {
            design,
            crossing,
            constraints,
            options,
            variable_tracker,
            derivations,
            crossing_combinations,
            exclusions,
            crossing_size,
            trials_per_sample,
            is_complex,
        })
    }

    /// A block with default [`BlockOptions`], which requires the complete crossing.
    pub fn fully_cross(
        design: Vec<Factor>,
        crossing: Vec<Factor>,
        constraints: Vec<SequenceConstraint>,
    ) -> Result<Block, DesignError> {
        Block::new(design, crossing, constraints, BlockOptions::default())
    }

    /// Compile the block: applies [`Consistency`], [`FullyCross`], the constraints of the block
    /// and finally the derivations, in that order, to a request whose fresh variables start
    /// after the level variables.
    pub fn build_backend_request(&self) -> Result<BackendRequest, LookupError> {
        let mut request = BackendRequest::new(self.variable_tracker.next_free());

        Consistency.apply(self, &mut request)?;
        FullyCross.apply(self, &mut request)?;
        for constraint in self.constraints.iter().flat_map(SequenceConstraint::desugar) {
            constraint.apply(self, &mut request)?;
        }
        for derivation in self.derivations.iter() {
            derivation.apply(self, &mut request)?;
        }

        debug!(
            "Compiled block into {} variables, {} clauses and {} cardinality requests",
            request.num_variables(),
            request.num_clauses(),
            request.ll_requests().len()
        );
        Ok(request)
    }

    /// DIMACS options which project samples onto the level variables of this block.
    pub fn dimacs_options(&self) -> DimacsOptions {
        DimacsOptions {
            sampling_set: (0..self.variables_per_sample())
                .map(Var::from_index)
                .collect(),
        }
    }

    pub fn design(&self) -> &[Factor] {
        &self.design
    }

    pub fn crossing(&self) -> &[Factor] {
        &self.crossing
    }

    pub fn constraints(&self) -> &[SequenceConstraint] {
        &self.constraints
    }

    pub fn options(&self) -> BlockOptions {
        self.options
    }

    pub fn variable_tracker(&self) -> &VariableTracker {
        &self.variable_tracker
    }

    pub fn derivations(&self) -> &[Derivation] {
        &self.derivations
    }

    /// The combinations of crossed levels which must occur, as level indices in crossing order.
    /// Excluded combinations are left out.
    pub fn crossing_combinations(&self) -> &[Vec<usize>] {
        &self.crossing_combinations
    }

    /// The number of crossing combinations which are ruled out by [`Exclude`] constraints.
    pub fn exclusions(&self) -> usize {
        self.exclusions
    }

    pub fn crossing_size(&self) -> usize {
        self.crossing_size
    }

    pub fn trials_per_sample(&self) -> usize {
        self.trials_per_sample
    }

    /// Whether the block has constraints, factors with a complex window, or crosses a derived
    /// factor.
    pub fn is_complex(&self) -> bool {
        self.is_complex
    }

    pub fn get_factor(&self, name: &str) -> Option<&Factor> {
        self.design.iter().find(|factor| factor.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_factor(name).is_some()
    }

    pub fn variables_per_trial(&self) -> usize {
        self.variable_tracker.variables_per_trial()
    }

    /// The number of level variables in a sample, complex windows included.
    pub fn variables_per_sample(&self) -> usize {
        self.variable_tracker.num_level_variables()
    }

    /// The number of variables of the factors which apply to every trial.
    pub fn grid_variables(&self) -> usize {
        self.variable_tracker.grid_size()
    }

    /// The number of variables allocated for `factor` over all trials.
    pub fn variables_for_factor(&self, factor: &str) -> Result<usize, LookupError> {
        Ok(self
            .variable_tracker
            .factor_variables(factor)?
            .iter()
            .map(Vec::len)
            .sum())
    }

    /// The variable of `level` in the first trial its factor applies to. For a weighted level,
    /// this is its first replicate.
    pub fn first_variable_for_level(&self, factor: &str, level: &str) -> Result<Var, LookupError> {
        self.variable_tracker
            .first_level_indices(factor, level)?
            .first()
            .copied()
            .map(Var::from_index)
            .ok_or_else(|| LookupError::Level {
                factor: factor.to_owned(),
                level: level.to_owned(),
            })
    }
}

fn check_design(design: &[Factor]) -> Result<(), DesignError> {
    if design.is_empty() {
        return Err(DesignError::EmptyDesign);
    }

    let mut names = HashSet::default();
    for factor in design {
        if factor.levels().is_empty() {
            return Err(DesignError::EmptyFactor(factor.name().to_owned()));
        }
        if !names.insert(factor.name()) {
            return Err(DesignError::DuplicateFactor(factor.name().to_owned()));
        }

        for level in factor.levels() {
            if level.weight() == 0 || (level.is_derived() && level.weight() != 1) {
                return Err(DesignError::InvalidWeight {
                    factor: factor.name().to_owned(),
                    level: level.name().to_owned(),
                    weight: level.weight(),
                });
            }
        }

        if let Some(window) = factor.window() {
            let shared_shape = factor
                .levels()
                .iter()
                .all(|level| level.window().is_some_and(|other| other.has_same_shape(window)));
            if !shared_shape {
                return Err(DesignError::MixedWindows(factor.name().to_owned()));
            }
        }
    }

    let mut undefined = vec![];
    for factor in design {
        collect_undefined_factors(factor, &names, &mut undefined);
    }
    if !undefined.is_empty() {
        return Err(DesignError::UndefinedFactors(undefined));
    }

    for factor in design {
        for level in factor.levels() {
            let Some(window) = level.window() else {
                continue;
            };
            for dependency in window.factors() {
                let is_complex = design
                    .iter()
                    .find(|design_factor| design_factor.name() == dependency.name())
                    .is_some_and(Factor::has_complex_window);
                if is_complex {
                    return Err(DesignError::ComplexDependency {
                        factor: factor.name().to_owned(),
                        level: level.name().to_owned(),
                        dependency: dependency.name().to_owned(),
                    });
                }
            }
        }
    }

    Ok(())
}

/// Collects the factors, reachable through the windows of derived levels, which are not part of
/// the design.
fn collect_undefined_factors(factor: &Factor, design: &HashSet<&str>, undefined: &mut Vec<String>) {
    for level in factor.levels() {
        let Some(window) = level.window() else {
            continue;
        };
        for dependency in window.factors() {
            if !design.contains(dependency.name())
                && !undefined.iter().any(|name| name == dependency.name())
            {
                undefined.push(dependency.name().to_owned());
            }
            collect_undefined_factors(dependency, design, undefined);
        }
    }
}

fn check_constraints(
    design: &[Factor],
    constraints: &[SequenceConstraint],
) -> Result<(), DesignError> {
    for constraint in constraints {
        let factor = design
            .iter()
            .find(|factor| factor.name() == constraint.factor())
            .ok_or_else(|| DesignError::UnknownFactor(constraint.factor().to_owned()))?;

        for level in constraint.levels() {
            if factor.level(level).is_none() {
                return Err(DesignError::UnknownLevel {
                    factor: factor.name().to_owned(),
                    level: level.to_owned(),
                });
            }
        }
    }

    Ok(())
}

/// Splits the crossing into the combinations which must occur and the number of excluded ones.
fn enumerate_crossing(
    design: &[Factor],
    crossing: &[Factor],
    constraints: &[SequenceConstraint],
) -> (Vec<Vec<usize>>, usize) {
    let excludes = constraints
        .iter()
        .filter_map(|constraint| match constraint {
            SequenceConstraint::Exclude(exclude) => Some(exclude),
            _ => None,
        })
        .collect::<Vec<_>>();

    let (excluded, included): (Vec<_>, Vec<_>) = crossing
        .iter()
        .map(|factor| 0..factor.levels().len())
        .multi_cartesian_product()
        .partition(|combination| {
            excludes
                .iter()
                .any(|exclude| excludes_combination(design, crossing, exclude, combination))
        });

    (included, excluded.len())
}

/// Whether `exclude` rules out a combination of crossed levels. That is the case when it names a
/// level of the combination, or a within-trial derived level whose dependencies are all crossed
/// and which holds for the combination.
fn excludes_combination(
    design: &[Factor],
    crossing: &[Factor],
    exclude: &Exclude,
    combination: &[usize],
) -> bool {
    let crossed_level = |factor: &str| {
        crossing
            .iter()
            .position(|crossed| crossed.name() == factor)
            .map(|position| crossing[position].levels()[combination[position]].name())
    };

    if let Some(level) = crossed_level(exclude.factor()) {
        return level == exclude.level();
    }

    let Some(window) = design
        .iter()
        .find(|factor| factor.name() == exclude.factor())
        .and_then(|factor| factor.level(exclude.level()))
        .and_then(|level| level.window())
    else {
        return false;
    };
    if window.is_complex() {
        return false;
    }

    window
        .factors()
        .iter()
        .map(|dependency| crossed_level(dependency.name()))
        .collect::<Option<Vec<_>>>()
        .is_some_and(|names| window.evaluate(&names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LowLevelRequest;
    use crate::constraints::AtMostKInARow;
    use crate::constraints::LevelSelector;
    use crate::design::Level;
    use crate::design::Window;

    fn color() -> Factor {
        Factor::new("color", ["red", "blue"])
    }

    fn text() -> Factor {
        Factor::new("text", ["red", "blue"])
    }

    fn stimulus_design() -> (Factor, Factor, Factor) {
        let color = Factor::new("color", ["red", "blue", "green"]);
        let text = text();
        let illegal = |names: &[&str]| names[0] == "green" && names[1] == "blue";
        let configuration = Factor::new(
            "stimulus configuration",
            [
                Level::derived(
                    "legal",
                    Window::within_trial(move |names| !illegal(names), [color.clone(), text.clone()]),
                ),
                Level::derived(
                    "illegal",
                    Window::within_trial(illegal, [color.clone(), text.clone()]),
                ),
            ],
        );
        (color, text, configuration)
    }

    #[test]
    fn simple_block_has_one_trial_per_combination() {
        let block = Block::fully_cross(vec![color(), text()], vec![color(), text()], vec![])
            .expect("valid block");

        assert_eq!(4, block.crossing_size());
        assert_eq!(4, block.trials_per_sample());
        assert_eq!(4, block.variables_per_trial());
        assert_eq!(16, block.variables_per_sample());
        assert_eq!(16, block.grid_variables());
        assert_eq!(8, block.variables_for_factor("color").expect("known factor"));
        assert!(!block.is_complex());
        assert!(block.contains("text"));
        assert!(block.get_factor("shape").is_none());
    }

    #[test]
    fn transition_in_design_does_not_lengthen_the_block() {
        let repeats = Factor::new(
            "color repeats?",
            [
                Level::derived(
                    "yes",
                    Window::transition(|colors| colors[0][0] == colors[0][1], [color()]),
                ),
                Level::derived(
                    "no",
                    Window::transition(|colors| colors[0][0] != colors[0][1], [color()]),
                ),
            ],
        );
        let block = Block::fully_cross(
            vec![color(), text(), repeats],
            vec![color(), text()],
            vec![],
        )
        .expect("valid block");

        assert_eq!(4, block.trials_per_sample());
        assert_eq!(22, block.variables_per_sample());
        assert_eq!(6, block.variables_for_factor("color repeats?").expect("known"));
        assert_eq!(
            Var::new(17),
            block
                .first_variable_for_level("color repeats?", "yes")
                .expect("known level")
        );
        assert!(block.is_complex());
        assert_eq!(2, block.derivations().len());
    }

    #[test]
    fn reduced_crossing_drops_excluded_combinations() {
        let (color, text, configuration) = stimulus_design();
        let exclude = Exclude::new(&configuration, "illegal").expect("level of configuration");

        let block = Block::new(
            vec![color.clone(), text.clone(), configuration],
            vec![color, text],
            vec![exclude.into()],
            BlockOptions {
                require_complete_crossing: false,
            },
        )
        .expect("valid block");

        assert_eq!(1, block.exclusions());
        assert_eq!(5, block.crossing_size());
        assert_eq!(5, block.trials_per_sample());
        assert!(!block.crossing_combinations().contains(&vec![2, 1]));
    }

    #[test]
    fn complete_crossing_keeps_the_trial_count() {
        let _ = env_logger::builder().is_test(true).try_init();

        let (color, text, configuration) = stimulus_design();
        let exclude = Exclude::new(&configuration, "illegal").expect("level of configuration");

        let block = Block::fully_cross(
            vec![color.clone(), text.clone(), configuration],
            vec![color, text],
            vec![exclude.into()],
        )
        .expect("valid block");

        assert_eq!(6, block.crossing_size());
        assert_eq!(6, block.trials_per_sample());
        assert_eq!(5, block.crossing_combinations().len());
    }

    #[test]
    fn excluding_a_crossed_level_removes_its_combinations() {
        let exclude = Exclude::new(&color(), "red").expect("level of color");

        let block = Block::new(
            vec![color(), text()],
            vec![color(), text()],
            vec![exclude.into()],
            BlockOptions {
                require_complete_crossing: false,
            },
        )
        .expect("valid block");

        assert_eq!(vec![vec![1, 0], vec![1, 1]], block.crossing_combinations());
        assert_eq!(2, block.trials_per_sample());
    }

    #[test]
    fn invalid_designs_are_rejected() {
        assert_eq!(
            Some(DesignError::EmptyDesign),
            Block::fully_cross(vec![], vec![color()], vec![]).err()
        );
        assert_eq!(
            Some(DesignError::EmptyCrossing),
            Block::fully_cross(vec![color()], vec![], vec![]).err()
        );
        assert_eq!(
            Some(DesignError::DuplicateFactor("color".to_owned())),
            Block::fully_cross(vec![color(), color()], vec![color()], vec![]).err()
        );
        assert_eq!(
            Some(DesignError::EmptyFactor("empty".to_owned())),
            Block::fully_cross(
                vec![color(), Factor::new("empty", Vec::<Level>::new())],
                vec![color()],
                vec![]
            )
            .err()
        );
        assert_eq!(
            Some(DesignError::UnknownFactor("text".to_owned())),
            Block::fully_cross(vec![color()], vec![text()], vec![]).err()
        );
    }

    #[test]
    fn derived_levels_must_depend_on_factors_in_the_design() {
        let congruent = Factor::new(
            "congruent?",
            [
                Level::derived(
                    "con",
                    Window::within_trial(|names| names[0] == names[1], [color(), text()]),
                ),
                Level::derived(
                    "inc",
                    Window::within_trial(|names| names[0] != names[1], [color(), text()]),
                ),
            ],
        );

        assert_eq!(
            Some(DesignError::UndefinedFactors(vec!["text".to_owned()])),
            Block::fully_cross(vec![color(), congruent], vec![color()], vec![]).err()
        );
    }

    #[test]
    fn windows_cannot_depend_on_transitions() {
        let repeats = Factor::new(
            "color repeats?",
            [Level::derived(
                "yes",
                Window::transition(|colors| colors[0][0] == colors[0][1], [color()]),
            )],
        );
        let repeats_twice = Factor::new(
            "repeats twice?",
            [Level::derived(
                "yes",
                Window::transition(|repeats| repeats[0][0] == repeats[0][1], [repeats.clone()]),
            )],
        );

        assert!(matches!(
            Block::fully_cross(
                vec![color(), repeats, repeats_twice],
                vec![color()],
                vec![]
            ),
            Err(DesignError::ComplexDependency { .. })
        ));
    }

    #[test]
    fn levels_of_a_derived_factor_share_their_window() {
        let mixed = Factor::new(
            "mixed",
            [
                Level::derived("same", Window::within_trial(|_| true, [color()])),
                Level::derived(
                    "repeat",
                    Window::transition(|colors| colors[0][0] == colors[0][1], [color()]),
                ),
            ],
        );

        assert_eq!(
            Some(DesignError::MixedWindows("mixed".to_owned())),
            Block::fully_cross(vec![color(), mixed], vec![color()], vec![]).err()
        );
    }

    #[test]
    fn constraints_must_refer_to_the_design() {
        let shape = Factor::new("shape", ["circle", "square"]);
        let constraint = AtMostKInARow::new(2, LevelSelector::level(&shape, "circle").expect("level"))
            .expect("positive run length");

        assert_eq!(
            Some(DesignError::UnknownFactor("shape".to_owned())),
            Block::fully_cross(vec![color()], vec![color()], vec![constraint.into()]).err()
        );
    }

    #[test]
    fn crossing_a_factor_twice_is_rejected() {
        assert_eq!(
            Some(DesignError::DuplicateFactor("color".to_owned())),
            Block::fully_cross(vec![color(), text()], vec![color(), text(), color()], vec![])
                .err()
        );
    }

    #[test]
    fn window_wider_than_the_block_is_not_derived() {
        let _ = env_logger::builder().is_test(true).try_init();

        let bookend = Factor::new(
            "bookend?",
            [
                Level::derived(
                    "yes",
                    Window::general(|colors| colors[0][0] == colors[0][2], [color()], 3, 1)
                        .expect("valid window"),
                ),
                Level::derived(
                    "no",
                    Window::general(|colors| colors[0][0] != colors[0][2], [color()], 3, 1)
                        .expect("valid window"),
                ),
            ],
        );
        let block =
            Block::fully_cross(vec![color(), bookend], vec![color()], vec![]).expect("valid block");

        assert_eq!(2, block.trials_per_sample());
        assert_eq!(4, block.variables_per_sample());
        assert!(block.derivations().is_empty());

        let request = block.build_backend_request().expect("compilable block");
        assert_eq!(2 + 2, request.ll_requests().len());
    }

    #[test]
    fn weight_of_zero_is_rejected() {
        let weighted = Factor::new("color", [Level::weighted("red", 0), Level::simple("blue")]);

        assert!(matches!(
            Block::fully_cross(vec![weighted.clone()], vec![weighted], vec![]),
            Err(DesignError::InvalidWeight { weight: 0, .. })
        ));
    }

    #[test]
    fn crossing_states_are_numbered_after_the_levels() {
        let block = Block::fully_cross(vec![color(), text()], vec![color(), text()], vec![])
            .expect("valid block");
        let request = block.build_backend_request().expect("compilable block");

        // One pair of level variables per factor and trial.
        let consistency = (0..8_u32)
            .map(|pair| LowLevelRequest::exactly(1, [Var::new(2 * pair + 1), Var::new(2 * pair + 2)]));
        let crossing = (0..4_u32).map(|combination| {
            LowLevelRequest::more_than(
                0,
                (0..4_u32).map(|trial| Var::new(17 + 4 * trial + combination)),
            )
        });
        assert_eq!(
            consistency.chain(crossing).collect::<Vec<_>>(),
            request.ll_requests()
        );
        assert_eq!(1, request.cnfs().len());
        assert_eq!(
            (1..=16).map(Var::new).collect::<Vec<_>>(),
            block.dimacs_options().sampling_set
        );
    }
}
