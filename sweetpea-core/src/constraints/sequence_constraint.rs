use super::AtMostKInARow;
use super::Constraint;
use super::ExactlyKInARow;
use super::Exclude;
use crate::backend::BackendRequest;
use crate::basic_types::LookupError;
use crate::Block;

/// A constraint on the trial sequence, supplied with a [`Block`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SequenceConstraint {
    AtMostKInARow(AtMostKInARow),
    ExactlyKInARow(ExactlyKInARow),
    Exclude(Exclude),
}

impl SequenceConstraint {
    /// The factor the constraint is about.
    pub fn factor(&self) -> &str {
        match self {
            SequenceConstraint::AtMostKInARow(constraint) => constraint.selector().factor(),
            SequenceConstraint::ExactlyKInARow(constraint) => constraint.selector().factor(),
            SequenceConstraint::Exclude(constraint) => constraint.factor(),
        }
    }

    /// The levels the constraint is about.
    pub fn levels(&self) -> Vec<&str> {
        match self {
            SequenceConstraint::AtMostKInARow(constraint) => constraint.selector().levels(),
            SequenceConstraint::ExactlyKInARow(constraint) => constraint.selector().levels(),
            SequenceConstraint::Exclude(constraint) => vec![constraint.level()],
        }
    }

    /// Split the constraint into constraints about a single level each.
    pub fn desugar(&self) -> Vec<SequenceConstraint> {
        match self {
            SequenceConstraint::AtMostKInARow(constraint) => constraint
                .desugar()
                .into_iter()
                .map(SequenceConstraint::AtMostKInARow)
                .collect(),
            SequenceConstraint::ExactlyKInARow(constraint) => constraint
                .desugar()
                .into_iter()
                .map(SequenceConstraint::ExactlyKInARow)
                .collect(),
            SequenceConstraint::Exclude(_) => vec![self.clone()],
        }
    }
}

impl Constraint for SequenceConstraint {
    fn apply(&self, block: &Block, request: &mut BackendRequest) -> Result<(), LookupError> {
        match self {
            SequenceConstraint::AtMostKInARow(constraint) => constraint.apply(block, request),
            SequenceConstraint::ExactlyKInARow(constraint) => constraint.apply(block, request),
            SequenceConstraint::Exclude(constraint) => constraint.apply(block, request),
        }
    }
}

impl From<AtMostKInARow> for SequenceConstraint {
    fn from(constraint: AtMostKInARow) -> Self {
        SequenceConstraint::AtMostKInARow(constraint)
    }
}

impl From<ExactlyKInARow> for SequenceConstraint {
    fn from(constraint: ExactlyKInARow) -> Self {
        SequenceConstraint::ExactlyKInARow(constraint)
    }
}

impl From<Exclude> for SequenceConstraint {
    fn from(constraint: Exclude) -> Self {
        SequenceConstraint::Exclude(constraint)
    }
}
