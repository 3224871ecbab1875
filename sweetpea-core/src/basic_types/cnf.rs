use super::Literal;

/// A disjunction of literals.
pub type Clause = Vec<Literal>;

/// A formula in conjunctive normal form: a conjunction of [`Clause`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cnf {
    clauses: Vec<Clause>,
}

impl Cnf {
    pub fn new() -> Cnf {
        Cnf::default()
    }

    pub fn add_clause(&mut self, clause: impl IntoIterator<Item = Literal>) {
        self.clauses.push(clause.into_iter().collect());
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The clauses as lists of signed integers.
    pub fn to_integer_lists(&self) -> Vec<Vec<i32>> {
        self.clauses
            .iter()
            .map(|clause| clause.iter().map(|literal| literal.to_i32()).collect())
            .collect()
    }
}

impl FromIterator<Clause> for Cnf {
    fn from_iter<T: IntoIterator<Item = Clause>>(iter: T) -> Self {
        Cnf {
            clauses: iter.into_iter().collect(),
        }
    }
}
