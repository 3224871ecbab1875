use super::Window;

/// A level of a [`Factor`](super::Factor).
///
/// Simple levels are atomic. Derived levels hold whenever the predicate of their [`Window`] holds
/// for the levels of the factors it inspects. A simple level may be weighted, in which case it is
/// backed by `weight` replicate variables per trial.
#[derive(Clone, Debug)]
pub struct Level {
    name: String,
    weight: usize,
    window: Option<Window>,
}

impl Level {
    pub fn simple(name: impl Into<String>) -> Self {
        Level {
            name: name.into(),
            weight: 1,
            window: None,
        }
    }

    pub fn weighted(name: impl Into<String>, weight: usize) -> Self {
        Level {
            name: name.into(),
            weight,
            window: None,
        }
    }

    pub fn derived(name: impl Into<String>, window: Window) -> Self {
        Level {
            name: name.into(),
            weight: 1,
            window: Some(window),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> usize {
        self.weight
    }

    pub fn window(&self) -> Option<&Window> {
        self.window.as_ref()
    }

    pub fn is_derived(&self) -> bool {
        self.window.is_some()
    }
}

impl From<&str> for Level {
    fn from(name: &str) -> Self {
        Level::simple(name)
    }
}

impl From<String> for Level {
    fn from(name: String) -> Self {
        Level::simple(name)
    }
}

impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.weight == other.weight
    }
}

impl Eq for Level {}
