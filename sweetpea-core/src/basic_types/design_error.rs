use thiserror::Error;

use super::LookupError;

/// Configuration errors; a design or constraint which cannot be compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DesignError {
    #[error("Design must specify at least one factor.")]
    EmptyDesign,
    #[error("Factor {0} must have at least one level.")]
    EmptyFactor(String),
    #[error("Factor {0} appears more than once in the design.")]
    DuplicateFactor(String),
    #[error(
        "Derived levels in design include factors that are not listed in the design: {}. Either \
         these factors should be included in the design, or the derived levels should be adjusted.",
        .0.join(", ")
    )]
    UndefinedFactors(Vec<String>),
    #[error(
        "Level {level} of factor {factor} depends on {dependency}, which does not occur in every \
         trial."
    )]
    ComplexDependency {
        factor: String,
        level: String,
        dependency: String,
    },
    #[error("A window needs a width and stride of at least 1, got width {width} and stride {stride}.")]
    InvalidWindow { width: usize, stride: usize },
    #[error("The levels of derived factor {0} do not share the same window shape.")]
    MixedWindows(String),
    #[error("Level {factor}.{level} has invalid weight {weight}.")]
    InvalidWeight {
        factor: String,
        level: String,
        weight: usize,
    },
    #[error("Factor {factor} matches {first} and {second} with assignment {assignment:?}.")]
    AmbiguousDerivation {
        factor: String,
        first: String,
        second: String,
        assignment: Vec<String>,
    },
    #[error("A block must cross at least one factor.")]
    EmptyCrossing,
    #[error("Factor {0} is not part of the design.")]
    UnknownFactor(String),
    #[error("Level {level} is not a level of factor {factor}.")]
    UnknownLevel { factor: String, level: String },
    #[error("The run length of a k-in-a-row constraint must be at least 1, got {0}.")]
    InvalidRunLength(usize),
    #[error("Level {level} does not belong to factor {factor}.")]
    InvalidLevelSelector { factor: String, level: String },
    #[error(transparent)]
    Lookup(#[from] LookupError),
}
