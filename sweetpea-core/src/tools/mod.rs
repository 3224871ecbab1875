//! Invocation of the external tools which consume the compiled CNF.
mod tool_error;
pub mod unigen;

pub use tool_error::*;
