use super::Level;
use super::Window;

/// A named, ordered set of [`Level`]s.
///
/// A factor is *derived* when its levels are derived levels; all of them then share the shape of
/// a single [`Window`]. Factors are identified by their name.
#[derive(Clone, Debug)]
pub struct Factor {
    name: String,
    levels: Vec<Level>,
}

impl Factor {
    pub fn new<L: Into<Level>>(name: impl Into<String>, levels: impl IntoIterator<Item = L>) -> Self {
        Factor {
            name: name.into(),
            levels: levels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, name: &str) -> Option<&Level> {
        self.levels.iter().find(|level| level.name() == name)
    }

    pub fn level_index(&self, name: &str) -> Option<usize> {
        self.levels.iter().position(|level| level.name() == name)
    }

    pub fn is_derived(&self) -> bool {
        self.levels.iter().any(Level::is_derived)
    }

    /// The window of the first derived level, if any.
    pub fn window(&self) -> Option<&Window> {
        self.levels.iter().find_map(Level::window)
    }

    pub fn width(&self) -> usize {
        self.window().map_or(1, Window::width)
    }

    pub fn stride(&self) -> usize {
        self.window().map_or(1, Window::stride)
    }

    /// Whether this factor inspects more than one trial, or skips trials. Such factors do not
    /// have variables in every trial.
    pub fn has_complex_window(&self) -> bool {
        self.window().is_some_and(Window::is_complex)
    }

    /// Whether the factor has a value in the given 1-based trial.
    pub fn applies_to_trial(&self, trial: usize) -> bool {
        let width = self.width();
        trial >= width && (trial - width) % self.stride() == 0
    }

    /// The number of trials, out of `num_trials`, in which this factor has a value.
    pub fn applicable_trial_count(&self, num_trials: usize) -> usize {
        (1..=num_trials)
            .filter(|&trial| self.applies_to_trial(trial))
            .count()
    }

    /// The number of trials needed before this factor has had a value `occurrences` times.
    pub fn trials_required_for(&self, occurrences: usize) -> usize {
        if occurrences == 0 {
            return 0;
        }
        self.width() + (occurrences - 1) * self.stride()
    }
}

impl PartialEq for Factor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Factor {}
