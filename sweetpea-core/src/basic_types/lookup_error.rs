use thiserror::Error;

/// A key that is not known to the [`Block`](crate::Block) or the
/// [`VariableTracker`](crate::VariableTracker) it was looked up in.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("No such factor in the design: {0}.")]
    Factor(String),
    #[error("No such level in the design: {factor}.{level}.")]
    Level { factor: String, level: String },
    #[error("No such variable in the tracker: {0}.")]
    Variable(u32),
    #[error("Factor {0} does not apply to any trial of the block.")]
    NoApplicableTrial(String),
}
