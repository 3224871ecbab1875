//! # SweetPea Core
//! Compiles factorial experimental designs into propositional formulas, so that uniformly
//! sampling satisfying assignments yields uniformly sampled trial sequences.
//!
//! A design is a list of [`design::Factor`]s. A [`Block`] combines a design with the factors
//! which are to be fully crossed and a list of sequencing constraints; compiling the block
//! produces a [`backend::BackendRequest`]: CNF fragments together with cardinality requests
//! which a sampler (such as Unigen, see [`tools::unigen`]) consumes.
//!
//! # Example
//! ```
//! # use sweetpea_core::design::Factor;
//! # use sweetpea_core::Block;
//! let color = Factor::new("color", ["red", "blue"]);
//! let text = Factor::new("text", ["red", "blue"]);
//!
//! let block = Block::fully_cross(
//!     vec![color.clone(), text.clone()],
//!     vec![color, text],
//!     vec![],
//! )
//! .expect("a valid design");
//!
//! let request = block.build_backend_request().expect("all lookups succeed");
//!
//! // Four trials of four level variables each.
//! assert_eq!(16, block.variables_per_sample());
//! // Exactly one level of each factor in each trial.
//! assert_eq!(8 + 4, request.ll_requests().len());
//! ```
#[doc(hidden)]
pub mod asserts;

pub mod backend;
pub mod basic_types;
pub mod constraints;
pub mod containers;
pub mod derivation_processor;
pub mod design;
pub mod formula;
pub mod tools;
pub mod variable_tracker;

mod block;

pub use block::*;

pub use crate::derivation_processor::DerivationProcessor;
pub use crate::variable_tracker::VariableTracker;
