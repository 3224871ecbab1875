use std::io::Write;

use super::BackendRequest;
use crate::basic_types::Var;

/// Options for writing a [`BackendRequest`] in DIMACS format.
#[derive(Clone, Debug, Default)]
pub struct DimacsOptions {
    /// The variables the sampler should project on, written as a `c ind` line. Nothing is written
    /// when empty.
    pub sampling_set: Vec<Var>,
}

/// Write the CNF of `request` in DIMACS format.
///
/// The header is `p cnf <variables> <clauses>`, where the variable count covers every variable
/// allocated so far, auxiliary ones included. The cardinality requests are not clauses; they are
/// written as `c <kind> <bound> <variables> 0` directives for front-ends which encode them
/// natively.
pub fn write_dimacs(
    writer: &mut impl Write,
    request: &BackendRequest,
    options: &DimacsOptions,
) -> std::io::Result<()> {
    writeln!(
        writer,
        "p cnf {} {}",
        request.num_variables(),
        request.num_clauses()
    )?;

    if !options.sampling_set.is_empty() {
        write!(writer, "c ind")?;
        for var in options.sampling_set.iter() {
            write!(writer, " {}", var.id())?;
        }
        writeln!(writer, " 0")?;
    }

    for ll_request in request.ll_requests() {
        write!(writer, "c {} {}", ll_request.comparison, ll_request.bound)?;
        for var in ll_request.variables.iter() {
            write!(writer, " {}", var.id())?;
        }
        writeln!(writer, " 0")?;
    }

    for cnf in request.cnfs() {
        for clause in cnf.clauses() {
            for literal in clause.iter() {
                write!(writer, "{literal} ")?;
            }
            writeln!(writer, "0")?;
        }
    }

    Ok(())
}

/// Render the CNF of `request` in DIMACS format; see [`write_dimacs`].
pub fn to_dimacs_string(request: &BackendRequest, options: &DimacsOptions) -> String {
    let mut buffer = vec![];
    // Writing to a `Vec` cannot fail.
    let _ = write_dimacs(&mut buffer, request, options);
    String::from_utf8_lossy(&buffer).into_owned()
}
