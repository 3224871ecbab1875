use std::fmt::Display;

use crate::basic_types::Var;

/// How the number of true variables of a [`LowLevelRequest`] relates to its bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Lt,
    Gt,
}

impl Comparison {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparison::Eq => "EQ",
            Comparison::Lt => "LT",
            Comparison::Gt => "GT",
        }
    }
}

impl Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cardinality constraint over a set of variables, left to the solver front-end to encode
/// natively: the number of true `variables` compares to `bound` according to `comparison`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LowLevelRequest {
    pub comparison: Comparison,
    pub bound: usize,
    pub variables: Vec<Var>,
}

impl LowLevelRequest {
    pub fn new(
        comparison: Comparison,
        bound: usize,
        variables: impl IntoIterator<Item = Var>,
    ) -> LowLevelRequest {
        LowLevelRequest {
            comparison,
            bound,
            variables: variables.into_iter().collect(),
        }
    }

    /// Exactly `bound` of the variables are true.
    pub fn exactly(bound: usize, variables: impl IntoIterator<Item = Var>) -> LowLevelRequest {
        LowLevelRequest::new(Comparison::Eq, bound, variables)
    }

    /// Fewer than `bound` of the variables are true.
    pub fn fewer_than(bound: usize, variables: impl IntoIterator<Item = Var>) -> LowLevelRequest {
        LowLevelRequest::new(Comparison::Lt, bound, variables)
    }

    /// More than `bound` of the variables are true.
    pub fn more_than(bound: usize, variables: impl IntoIterator<Item = Var>) -> LowLevelRequest {
        LowLevelRequest::new(Comparison::Gt, bound, variables)
    }

    pub fn variable_ids(&self) -> Vec<u32> {
        self.variables.iter().map(|var| var.id()).collect()
    }

    /// Whether the given truth values, indexed by 0-based variable index, satisfy the request.
    pub fn is_satisfied_by(&self, assignment: &[bool]) -> bool {
        let num_true = self
            .variables
            .iter()
            .filter(|var| assignment[var.index()])
            .count();

        match self.comparison {
            Comparison::Eq => num_true == self.bound,
            Comparison::Lt => num_true < self.bound,
            Comparison::Gt => num_true > self.bound,
        }
    }
}

impl Display for LowLevelRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {:?}",
            self.comparison,
            self.bound,
            self.variable_ids()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_count_true_variables() {
        let variables = [Var::new(1), Var::new(2), Var::new(3)];
        let assignment = [true, false, true];

        assert!(LowLevelRequest::exactly(2, variables).is_satisfied_by(&assignment));
        assert!(!LowLevelRequest::fewer_than(2, variables).is_satisfied_by(&assignment));
        assert!(LowLevelRequest::more_than(0, variables).is_satisfied_by(&assignment));
    }

    #[test]
    fn requests_display_their_kind() {
        let request = LowLevelRequest::fewer_than(3, [Var::new(1), Var::new(5)]);

        assert_eq!("LT 3 [1, 5]", request.to_string());
    }
}
