mod cnf;
mod design_error;
mod literal;
mod lookup_error;
mod variable;

pub use cnf::*;
pub use design_error::*;
pub use literal::*;
pub use lookup_error::*;
pub use variable::*;
