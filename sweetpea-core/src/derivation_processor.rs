//! Computes, for every derived level, which combinations of base levels make it hold.
use itertools::Itertools;
use log::debug;
use log::warn;

use crate::basic_types::DesignError;
use crate::constraints::Derivation;
use crate::containers::HashMap;
use crate::design::Factor;
use crate::design::Window;
use crate::variable_tracker::VariableTracker;

/// Generates the [`Derivation`]s of a design.
#[derive(Clone, Copy, Debug, Default)]
pub struct DerivationProcessor;

impl DerivationProcessor {
    /// Create one [`Derivation`] per level of every derived factor in `design`, in design order.
    ///
    /// For the level `con` of a factor `congruent?` with `WithinTrial(eq, [color, text])`, in a
    /// design `[color, text, congruent?]` of binary factors, the derivation reads
    /// `(4, [[0, 2], [1, 3]])`: variable 4 (`congruent?.con`) holds iff `color.red` and
    /// `text.red` hold, or `color.blue` and `text.blue` hold. All indices are 0-based and refer to
    /// the first trial the derived factor applies to.
    ///
    /// Fails when an assignment of the dependent levels satisfies two levels of the same factor.
    /// A level which no assignment satisfies is reported as a warning; it can never hold.
    pub fn generate_derivations(
        design: &[Factor],
        tracker: &VariableTracker,
    ) -> Result<Vec<Derivation>, DesignError> {
        let mut derivations = vec![];

        for factor in design.iter().filter(|factor| factor.is_derived()) {
            let mut according_level: HashMap<Vec<usize>, &str> = HashMap::default();

            let applies = !tracker.applicable_trials(factor.name())?.is_empty();
            if !applies {
                warn!(
                    "Factor {} spans {} trials, but the block has only {}; it is not derived.",
                    factor.name(),
                    factor.width(),
                    tracker.num_trials()
                );
            }

            for level in factor.levels() {
                let Some(window) = level.window() else {
                    continue;
                };

                let mut valid_indices = vec![];
                let mut num_valid_assignments = 0;

                for assignment in Self::dependent_cross_product(window) {
                    let names = Self::argument_names(window, &assignment);
                    if !window.evaluate(&names) {
                        continue;
                    }

                    if let Some(first) = according_level.insert(assignment.clone(), level.name())
                    {
                        return Err(DesignError::AmbiguousDerivation {
                            factor: factor.name().to_owned(),
                            first: first.to_owned(),
                            second: level.name().to_owned(),
                            assignment: names.iter().map(|name| (*name).to_owned()).collect(),
                        });
                    }

                    num_valid_assignments += 1;
                    valid_indices.extend(Self::assignment_indices(window, &assignment, tracker)?);
                }

                if num_valid_assignments == 0 {
                    warn!(
                        "There is no assignment that matches factor {} with level {}.",
                        factor.name(),
                        level.name()
                    );
                }

                if !applies {
                    continue;
                }

                let derived_index = tracker
                    .first_level_indices(factor.name(), level.name())?
                    .first()
                    .copied()
                    .ok_or_else(|| DesignError::InvalidWeight {
                        factor: factor.name().to_owned(),
                        level: level.name().to_owned(),
                        weight: 0,
                    })?;

                derivations.push(Derivation::new(
                    derived_index,
                    Self::shift_window(valid_indices, window, tracker.variables_per_trial()),
                    factor,
                ));
            }
        }

        debug!("Generated {} derivations", derivations.len());
        Ok(derivations)
    }

    /// Every assignment of levels to the trial slots of the window, as level indices. The slots
    /// are ordered factor by factor, and within a factor trial by trial.
    fn dependent_cross_product(window: &Window) -> impl Iterator<Item = Vec<usize>> {
        let width = window.width();
        window
            .factors()
            .iter()
            .flat_map(|factor| std::iter::repeat(factor.levels().len()).take(width))
            .map(|num_levels| 0..num_levels)
            .multi_cartesian_product()
    }

    fn argument_names<'window>(window: &'window Window, assignment: &[usize]) -> Vec<&'window str> {
        let width = window.width();
        assignment
            .iter()
            .enumerate()
            .map(|(slot, &level)| window.factors()[slot / width].levels()[level].name())
            .collect()
    }

    /// The index groups of an assignment in the first trial of the window. A group lists one
    /// variable per slot; weighted levels contribute one group per combination of replicates.
    fn assignment_indices(
        window: &Window,
        assignment: &[usize],
        tracker: &VariableTracker,
    ) -> Result<Vec<Vec<usize>>, DesignError> {
        let width = window.width();
        let replicates = assignment
            .iter()
            .enumerate()
            .map(|(slot, &level)| {
                let factor = &window.factors()[slot / width];
                tracker.first_level_indices(factor.name(), factor.levels()[level].name())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(replicates.into_iter().multi_cartesian_product().collect())
    }

    /// Move the indices of every slot after the first into the trial they inspect.
    ///
    /// The groups are built as if every slot lived in the first trial of the window. In a group,
    /// the slots of each dependent factor form a chunk of `width` indices; the `j`-th index of a
    /// chunk is shifted by `j * trial_size`. For `Transition(eq, [color])` with four variables per
    /// trial, `[[0, 0], [1, 1]]` becomes `[[0, 4], [1, 5]]`.
    pub fn shift_window(
        indices: Vec<Vec<usize>>,
        window: &Window,
        trial_size: usize,
    ) -> Vec<Vec<usize>> {
        if window.width() == 1 {
            return indices;
        }

        let factor_count = window.initial_factor_count();
        indices
            .into_iter()
            .map(|group| {
                let chunk_size = group.len() / factor_count;
                group
                    .chunks(chunk_size)
                    .flat_map(|chunk| {
                        chunk
                            .iter()
                            .enumerate()
                            .map(|(slot, index)| index + slot * trial_size)
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::Level;

    fn color() -> Factor {
        Factor::new("color", ["red", "blue"])
    }

    fn text() -> Factor {
        Factor::new("text", ["red", "blue"])
    }

    fn congruence() -> Factor {
        Factor::new(
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
        )
    }

    fn color_repeats() -> Factor {
        Factor::new(
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
        )
    }

    fn summary(derivations: &[Derivation]) -> Vec<(usize, Vec<Vec<usize>>)> {
        derivations
            .iter()
            .map(|derivation| {
                (
                    derivation.derived_index(),
                    derivation.dependent_indices().to_vec(),
                )
            })
            .collect()
    }

    #[test]
    fn within_trial_derivations_pair_dependent_levels() {
        let design = vec![color(), text(), congruence()];
        let tracker = VariableTracker::new(&design, 4);

        let derivations =
            DerivationProcessor::generate_derivations(&design, &tracker).expect("valid design");

        assert_eq!(
            vec![(4, vec![vec![0, 2], vec![1, 3]]), (5, vec![vec![0, 3], vec![1, 2]])],
            summary(&derivations)
        );
    }

    #[test]
    fn transition_derivations_are_shifted_into_the_next_trial() {
        let design = vec![color(), text(), color_repeats()];
        let tracker = VariableTracker::new(&design, 5);

        let derivations =
            DerivationProcessor::generate_derivations(&design, &tracker).expect("valid design");

        assert_eq!(
            vec![(20, vec![vec![0, 4], vec![1, 5]]), (21, vec![vec![0, 5], vec![1, 4]])],
            summary(&derivations)
        );
    }

    #[test]
    fn shifting_moves_each_factor_chunk_separately() {
        let window = Window::transition(|_| true, [color(), text()]);

        assert_eq!(
            vec![vec![0, 4, 2, 6]],
            DerivationProcessor::shift_window(vec![vec![0, 0, 2, 2]], &window, 4)
        );
    }

    #[test]
    fn weighted_dependencies_expand_into_replicate_groups() {
        let weighted_color = Factor::new("color", [Level::weighted("red", 2), Level::simple("blue")]);
        let is_red = Factor::new(
            "is red?",
            [
                Level::derived(
                    "yes",
                    Window::within_trial(|names| names[0] == "red", [weighted_color.clone()]),
                ),
                Level::derived(
                    "no",
                    Window::within_trial(|names| names[0] != "red", [weighted_color.clone()]),
                ),
            ],
        );
        let design = vec![weighted_color, is_red];
        let tracker = VariableTracker::new(&design, 3);

        let derivations =
            DerivationProcessor::generate_derivations(&design, &tracker).expect("valid design");

        assert_eq!(
            vec![(3, vec![vec![0], vec![1]]), (4, vec![vec![2]])],
            summary(&derivations)
        );
    }

    #[test]
    fn overlapping_levels_are_ambiguous() {
        let overlapping = Factor::new(
            "overlapping",
            [
                Level::derived("any", Window::within_trial(|_| true, [color()])),
                Level::derived(
                    "red",
                    Window::within_trial(|names| names[0] == "red", [color()]),
                ),
            ],
        );
        let design = vec![color(), overlapping];
        let tracker = VariableTracker::new(&design, 2);

        let result = DerivationProcessor::generate_derivations(&design, &tracker);

        assert_eq!(
            Err(DesignError::AmbiguousDerivation {
                factor: "overlapping".to_owned(),
                first: "any".to_owned(),
                second: "red".to_owned(),
                assignment: vec!["red".to_owned()],
            }),
            result.map(|derivations| derivations.len())
        );
    }

    #[test]
    fn window_wider_than_the_block_produces_no_derivations() {
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
        let design = vec![color(), bookend];
        let tracker = VariableTracker::new(&design, 2);

        let derivations =
            DerivationProcessor::generate_derivations(&design, &tracker).expect("valid design");

        assert!(derivations.is_empty());
    }

    #[test]
    fn unreachable_level_has_no_index_groups() {
        let _ = env_logger::builder().is_test(true).try_init();

        let never = Factor::new(
            "never",
            [
                Level::derived("yes", Window::within_trial(|_| false, [color()])),
                Level::derived("no", Window::within_trial(|_| true, [color()])),
            ],
        );
        let design = vec![color(), never];
        let tracker = VariableTracker::new(&design, 2);

        let derivations =
            DerivationProcessor::generate_derivations(&design, &tracker).expect("valid design");

        assert!(derivations[0].dependent_indices().is_empty());
        assert_eq!(2, derivations[1].dependent_indices().len());
    }
}
