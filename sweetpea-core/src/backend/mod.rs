//! The output of compilation: CNF fragments and cardinality requests, ready to be handed to a
//! solver front-end.
mod dimacs;
mod low_level_request;

use std::fmt::Display;

pub use dimacs::*;
pub use low_level_request::*;

use crate::basic_types::Cnf;
use crate::basic_types::FreshVariables;
use crate::basic_types::Var;

/// Accumulates the result of applying constraints to a [`Block`](crate::Block).
///
/// Constraints only ever append to a request; the order of `cnfs` and `ll_requests`, together
/// with the numbering of the fresh variables, is part of the compiled output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendRequest {
    fresh: u32,
    cnfs: Vec<Cnf>,
    ll_requests: Vec<LowLevelRequest>,
}

impl BackendRequest {
    /// Create an empty request whose first fresh variable is `fresh`.
    pub fn new(fresh: Var) -> BackendRequest {
        BackendRequest {
            fresh: fresh.id(),
            cnfs: vec![],
            ll_requests: vec![],
        }
    }

    pub fn add_cnf(&mut self, cnf: Cnf) {
        self.cnfs.push(cnf);
    }

    pub fn add_ll_request(&mut self, request: LowLevelRequest) {
        self.ll_requests.push(request);
    }

    pub fn cnfs(&self) -> &[Cnf] {
        &self.cnfs
    }

    pub fn ll_requests(&self) -> &[LowLevelRequest] {
        &self.ll_requests
    }

    /// The id of the next unused variable.
    pub fn fresh(&self) -> u32 {
        self.fresh
    }

    /// The number of variables in use, level and auxiliary variables alike.
    pub fn num_variables(&self) -> usize {
        self.fresh as usize - 1
    }

    pub fn num_clauses(&self) -> usize {
        self.cnfs.iter().map(Cnf::num_clauses).sum()
    }

    /// All clauses of all CNF fragments, in the order they were added.
    pub fn combined_cnf(&self) -> Cnf {
        self.cnfs
            .iter()
            .flat_map(|cnf| cnf.clauses().iter().cloned())
            .collect()
    }
}

impl FreshVariables for BackendRequest {
    fn fresh_variable(&mut self) -> Var {
        self.fresh.fresh_variable()
    }

    fn peek_fresh(&self) -> Var {
        self.fresh.peek_fresh()
    }
}

impl Display for BackendRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "fresh: {}", self.fresh)?;
        for cnf in self.cnfs.iter() {
            writeln!(f, "cnf: {:?}", cnf.to_integer_lists())?;
        }
        for request in self.ll_requests.iter() {
            writeln!(f, "request: {request}")?;
        }
        Ok(())
    }
}
