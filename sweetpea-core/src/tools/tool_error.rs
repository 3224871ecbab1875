use std::time::Duration;

use thiserror::Error;

/// An external tool could not be run, or did not succeed.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Failed to run tool: {0}")]
    Io(#[from] std::io::Error),
    #[error("{tool} exited with code {exit_code:?}.\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    Failed {
        tool: String,
        /// `None` when the tool was terminated by a signal.
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    #[error("{tool} did not finish within {timeout:?}.")]
    Timeout { tool: String, timeout: Duration },
}
