//! Sampling with [Unigen](https://github.com/meelgroup/unigen).
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::process::Child;
use std::process::Command;
use std::process::Stdio;
use std::thread::JoinHandle;
use std::time::Duration;

use log::debug;
use wait_timeout::ChildExt;

use super::ToolError;

/// How to run Unigen.
#[derive(Clone, Debug)]
pub struct UnigenOptions {
    pub executable: PathBuf,
    /// Passed before the input file.
    pub arguments: Vec<String>,
    /// The tool is killed when it runs longer than this.
    pub timeout: Option<Duration>,
}

impl Default for UnigenOptions {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("unigen"),
            arguments: vec![],
            timeout: None,
        }
    }
}

/// Run Unigen on a DIMACS file and return what it wrote to standard output.
///
/// A non-zero exit code results in [`ToolError::Failed`], which carries both output streams as
/// they were written. The call is not retried.
pub fn call_unigen(input_file: &Path, options: &UnigenOptions) -> Result<String, ToolError> {
    let tool = options.executable.display().to_string();

    let mut command = Command::new(&options.executable);
    let _ = command
        .args(&options.arguments)
        .arg(input_file)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    debug!("Running {command:?}");

    let mut child = command.spawn()?;
    let stdout = read_in_background(child.stdout.take());
    let stderr = read_in_background(child.stderr.take());

    let status = match options.timeout {
        Some(timeout) => match child.wait_timeout(timeout)? {
            Some(status) => status,
            None => {
                kill(&mut child)?;
                return Err(ToolError::Timeout { tool, timeout });
            }
        },
        None => child.wait()?,
    };

    let stdout = join_output(stdout)?;
    let stderr = join_output(stderr)?;

    if status.success() {
        Ok(stdout)
    } else {
        Err(ToolError::Failed {
            tool,
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

/// Drain a pipe on another thread, so that the child never blocks on a full pipe while it is
/// being waited for.
fn read_in_background(
    pipe: Option<impl Read + Send + 'static>,
) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buffer = vec![];
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer)?;
        }
        Ok(buffer)
    })
}

fn join_output(handle: JoinHandle<std::io::Result<Vec<u8>>>) -> Result<String, ToolError> {
    let bytes = handle
        .join()
        .map_err(|_| std::io::Error::other("reading tool output panicked"))??;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn kill(child: &mut Child) -> std::io::Result<()> {
    child.kill()?;
    let _ = child.wait()?;
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str, timeout: Option<Duration>) -> UnigenOptions {
        UnigenOptions {
            executable: PathBuf::from("sh"),
            arguments: vec!["-c".to_owned(), script.to_owned()],
            timeout,
        }
    }

    fn input_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "sweetpea-unigen-{}-{name}.cnf",
            std::process::id()
        ));
        std::fs::write(&path, contents).expect("writable temporary directory");
        path
    }

    #[test]
    fn output_is_returned_on_success() {
        let input = input_file("success", "p cnf 1 1\n1 0\n");

        // `sh -c script file` binds the file to `$0`.
        let result = call_unigen(&input, &shell("cat \"$0\"", None));
        let _ = std::fs::remove_file(&input);

        assert_eq!("p cnf 1 1\n1 0\n", result.expect("successful run"));
    }

    #[test]
    fn failure_carries_exit_code_and_streams() {
        let input = input_file("failure", "");

        let result = call_unigen(
            &input,
            &shell("echo sampled; echo broken >&2; exit 3", None),
        );
        let _ = std::fs::remove_file(&input);

        match result {
            Err(ToolError::Failed {
                exit_code,
                stdout,
                stderr,
                ..
            }) => {
                assert_eq!(Some(3), exit_code);
                assert_eq!("sampled\n", stdout);
                assert_eq!("broken\n", stderr);
            }
            other => panic!("expected a failed run, got {other:?}"),
        }
    }

    #[test]
    fn slow_tool_is_killed() {
        let input = input_file("timeout", "");

        let result = call_unigen(&input, &shell("sleep 5", Some(Duration::from_millis(100))));
        let _ = std::fs::remove_file(&input);

        assert!(matches!(result, Err(ToolError::Timeout { .. })));
    }

    #[test]
    fn missing_executable_is_an_io_error() {
        let options = UnigenOptions {
            executable: PathBuf::from("sweetpea-no-such-sampler"),
            ..UnigenOptions::default()
        };

        let result = call_unigen(Path::new("unused.cnf"), &options);

        assert!(matches!(result, Err(ToolError::Io(_))));
    }
}
