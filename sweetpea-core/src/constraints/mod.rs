//! The constraints which are compiled into a [`BackendRequest`].
//!
//! Every block is compiled by applying, in this order, [`Consistency`], [`FullyCross`], the
//! [`SequenceConstraint`]s of the block in declaration order, and finally the [`Derivation`] of
//! every derived level. Each constraint appends CNF fragments and cardinality requests to the
//! shared [`BackendRequest`]; later constraints continue numbering fresh variables where earlier
//! ones stopped.
mod consistency;
mod derivation;
mod exclude;
mod fully_cross;
mod k_in_a_row;
mod level_selector;
mod sequence_constraint;

use std::fmt::Debug;

pub use consistency::*;
pub use derivation::*;
pub use exclude::*;
pub use fully_cross::*;
pub use k_in_a_row::*;
pub use level_selector::*;
pub use sequence_constraint::*;

use crate::backend::BackendRequest;
use crate::basic_types::LookupError;
use crate::basic_types::Var;
use crate::formula::Formula;
use crate::Block;

/// A constraint over the trial sequence of a [`Block`].
pub trait Constraint: Debug {
    /// Append the encoding of this constraint for `block` to `request`.
    ///
    /// Fails when the constraint refers to a factor or level which is not part of the block.
    fn apply(&self, block: &Block, request: &mut BackendRequest) -> Result<(), LookupError>;
}

/// The formula stating that a level holds, given its replicate variables in one trial.
fn level_holds(variables: &[Var]) -> Formula {
    Formula::any_of(variables.iter().copied().map(Formula::from).collect())
}
