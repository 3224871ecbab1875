use std::fmt::Debug;
use std::sync::Arc;

use super::Factor;
use crate::basic_types::DesignError;

/// Predicate of a [`Window::WithinTrial`]: receives one level name per dependent factor.
pub type WithinTrialPredicate = Arc<dyn Fn(&[&str]) -> bool + Send + Sync>;
/// Predicate of a [`Window::Transition`]: receives, per dependent factor, the level names of the
/// previous and the current trial.
pub type TransitionPredicate = Arc<dyn Fn(&[[&str; 2]]) -> bool + Send + Sync>;
/// Predicate of a [`Window::General`]: receives, per dependent factor, `width` level names in
/// trial order.
pub type WindowPredicate = Arc<dyn Fn(&[&[&str]]) -> bool + Send + Sync>;

/// Describes which trials and which factors a derived level inspects.
#[derive(Clone)]
pub enum Window {
    WithinTrial {
        factors: Vec<Factor>,
        predicate: WithinTrialPredicate,
    },
    Transition {
        factors: Vec<Factor>,
        predicate: TransitionPredicate,
    },
    General {
        factors: Vec<Factor>,
        width: usize,
        stride: usize,
        predicate: WindowPredicate,
    },
}

impl Window {
    pub fn within_trial(
        predicate: impl Fn(&[&str]) -> bool + Send + Sync + 'static,
        factors: impl IntoIterator<Item = Factor>,
    ) -> Self {
        Window::WithinTrial {
            factors: factors.into_iter().collect(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn transition(
        predicate: impl Fn(&[[&str; 2]]) -> bool + Send + Sync + 'static,
        factors: impl IntoIterator<Item = Factor>,
    ) -> Self {
        Window::Transition {
            factors: factors.into_iter().collect(),
            predicate: Arc::new(predicate),
        }
    }

    /// Create a window inspecting `width` consecutive trials, which is re-evaluated every
    /// `stride` trials.
    pub fn general(
        predicate: impl Fn(&[&[&str]]) -> bool + Send + Sync + 'static,
        factors: impl IntoIterator<Item = Factor>,
        width: usize,
        stride: usize,
    ) -> Result<Self, DesignError> {
        if width == 0 || stride == 0 {
            return Err(DesignError::InvalidWindow { width, stride });
        }

        Ok(Window::General {
            factors: factors.into_iter().collect(),
            width,
            stride,
            predicate: Arc::new(predicate),
        })
    }

    pub fn factors(&self) -> &[Factor] {
        match self {
            Window::WithinTrial { factors, .. }
            | Window::Transition { factors, .. }
            | Window::General { factors, .. } => factors,
        }
    }

    /// The number of distinct factors the window depends on.
    pub fn initial_factor_count(&self) -> usize {
        self.factors().len()
    }

    pub fn width(&self) -> usize {
        match self {
            Window::WithinTrial { .. } => 1,
            Window::Transition { .. } => 2,
            Window::General { width, .. } => *width,
        }
    }

    pub fn stride(&self) -> usize {
        match self {
            Window::WithinTrial { .. } | Window::Transition { .. } => 1,
            Window::General { stride, .. } => *stride,
        }
    }

    pub fn is_complex(&self) -> bool {
        self.width() > 1 || self.stride() > 1
    }

    /// Whether both windows inspect the same trials of the same factors.
    pub fn has_same_shape(&self, other: &Window) -> bool {
        self.width() == other.width()
            && self.stride() == other.stride()
            && self.factors() == other.factors()
    }

    /// Evaluate the predicate on level names laid out per factor: the `width` names of the first
    /// factor in trial order, followed by those of the second factor, and so on.
    pub fn evaluate(&self, names: &[&str]) -> bool {
        match self {
            Window::WithinTrial { predicate, .. } => predicate(names),
            Window::Transition { predicate, .. } => {
                let pairs = names
                    .chunks(2)
                    .map(|pair| [pair[0], pair[1]])
                    .collect::<Vec<_>>();
                predicate(&pairs)
            }
            Window::General {
                predicate, width, ..
            } => {
                let per_factor = names.chunks(*width).collect::<Vec<_>>();
                predicate(&per_factor)
            }
        }
    }
}

impl Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Window::WithinTrial { .. } => "WithinTrial",
            Window::Transition { .. } => "Transition",
            Window::General { .. } => "Window",
        };
        f.debug_struct(kind)
            .field(
                "factors",
                &self.factors().iter().map(Factor::name).collect::<Vec<_>>(),
            )
            .field("width", &self.width())
            .field("stride", &self.stride())
            .finish_non_exhaustive()
    }
}
