use super::Literal;
use crate::sweetpea_assert_simple;

/// A propositional variable. Identifiers are 1-based and dense; `0` is never a variable, matching
/// the DIMACS convention where it terminates a clause.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var {
    id: u32,
}

impl Var {
    pub fn new(id: u32) -> Var {
        sweetpea_assert_simple!(id != 0, "Variable identifiers start at 1.");
        Var { id }
    }

    /// The variable with the given 0-based index, i.e. `index + 1`.
    pub fn from_index(index: usize) -> Var {
        Var::new(index as u32 + 1)
    }

    pub fn id(self) -> u32 {
        self.id
    }

    /// The 0-based index of this variable.
    pub fn index(self) -> usize {
        self.id as usize - 1
    }

    pub fn positive(self) -> Literal {
        Literal::new(self, true)
    }

    pub fn negative(self) -> Literal {
        Literal::new(self, false)
    }

    /// The variable `offset` places further along.
    pub fn shifted(self, offset: usize) -> Var {
        Var::new(self.id + offset as u32)
    }
}

impl std::fmt::Display for Var {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.id)
    }
}

/// Hands out variables that have not been used before.
///
/// Both the [`VariableTracker`](crate::VariableTracker) and the
/// [`BackendRequest`](crate::backend::BackendRequest) implement this, the latter continuing the
/// numbering where the tracker stopped.
pub trait FreshVariables {
    fn fresh_variable(&mut self) -> Var;

    /// The variable that the next call to [`FreshVariables::fresh_variable`] returns.
    fn peek_fresh(&self) -> Var;
}

impl FreshVariables for u32 {
    fn fresh_variable(&mut self) -> Var {
        let var = Var::new(*self);
        *self += 1;
        var
    }

    fn peek_fresh(&self) -> Var {
        Var::new(*self)
    }
}
